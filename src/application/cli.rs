#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use owo_colors::OwoColorize;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::application::ui::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::configuration::MAX_MESSAGE_COUNT_LIMIT;
use crate::domain::models::ExecutorName;
use crate::domain::models::ProviderName;
use crate::infrastructure::providers::ProviderManager;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file(config_file_path_str: &str) -> Result<()> {
    let config_file_path = path::PathBuf::from(config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn print_models(config: &Config) -> Result<()> {
    let name = config.provider()?;
    let settings = config.provider_settings(name);
    let selected = settings.model.to_string();
    let provider = ProviderManager::get(name, settings);

    println!("{}:", name.label());
    for (idx, model) in provider.list_models().iter().enumerate() {
        let is_selected = model.id == selected || (selected.is_empty() && idx == 0);
        let marker = if is_selected { "*" } else { "-" };
        println!("{marker} {} ({})", model.id, model.display_name);
    }

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the path for the configuration file.")
        );
}

fn config_arg(key: ConfigKey) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(key.env_var())
        .num_args(1)
        .global(true);
}

fn bool_arg(key: ConfigKey, help: &str) -> Arg {
    return config_arg(key)
        .help(format!(
            "{help} [default: {}]",
            Config::default_value(key)
        ))
        .value_parser(PossibleValuesParser::new(["true", "false"]));
}

fn provider_args(name: ProviderName, api_key: ConfigKey, model: ConfigKey, url: ConfigKey) -> Vec<Arg> {
    let label = name.label();
    return vec![
        config_arg(api_key)
            .hide_env_values(true)
            .help(format!("{label} API key when using the {name} provider.")),
        config_arg(model).help(format!(
            "{label} model id, e.g. {name}/model-name. Defaults to the first listed model if not set."
        )),
        config_arg(url).help(format!(
            "{label} API URL. Can be swapped to a compatible proxy. [default: {}]",
            Config::default_value(url)
        )),
    ];
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('/') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return format!("CHAT {line}").bold().underline().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    let mut cmd = Command::new("meshchat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start chatting. This is the default command."))
        .subcommand(Command::new("models").about("List the models of the configured provider."))
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .arg(
            config_arg(ConfigKey::ConfigFile)
                .short('c')
                .help(format!("Path to configuration file [default: {}]", Config::default_value(ConfigKey::ConfigFile))),
        )
        .arg(
            config_arg(ConfigKey::Provider)
                .short('p')
                .help(format!("The LLM provider to send prompts to. [default: {}]", Config::default_value(ConfigKey::Provider)))
                .value_parser(PossibleValuesParser::new(ProviderName::VARIANTS)),
        );

    for args in [
        provider_args(
            ProviderName::Anthropic,
            ConfigKey::AnthropicApiKey,
            ConfigKey::AnthropicModel,
            ConfigKey::AnthropicUrl,
        ),
        provider_args(
            ProviderName::Google,
            ConfigKey::GoogleApiKey,
            ConfigKey::GoogleModel,
            ConfigKey::GoogleUrl,
        ),
        provider_args(
            ProviderName::DeepSeek,
            ConfigKey::DeepSeekApiKey,
            ConfigKey::DeepSeekModel,
            ConfigKey::DeepSeekUrl,
        ),
        provider_args(
            ProviderName::OpenAI,
            ConfigKey::OpenAiApiKey,
            ConfigKey::OpenAiModel,
            ConfigKey::OpenAiUrl,
        ),
    ] {
        cmd = cmd.args(args);
    }

    return cmd
        .arg(
            config_arg(ConfigKey::MaxMessageCount)
                .help(format!(
                    "Messages kept per chat session, oldest dropped first. 0 keeps everything, at most {MAX_MESSAGE_COUNT_LIMIT}. [default: {}]",
                    Config::default_value(ConfigKey::MaxMessageCount)
                )),
        )
        .arg(bool_arg(ConfigKey::AutoScroll, "Move to the newest message when sending."))
        .arg(bool_arg(ConfigKey::ShowTimestamps, "Print message timestamps."))
        .arg(bool_arg(ConfigKey::ConfirmExecution, "Ask before running extracted code."))
        .arg(
            config_arg(ConfigKey::Executor)
                .short('e')
                .help(format!("Where /run sends extracted code. [default: {}]", Config::default_value(ConfigKey::Executor)))
                .value_parser(PossibleValuesParser::new(ExecutorName::VARIANTS)),
        )
        .arg(
            config_arg(ConfigKey::ExecCommand)
                .help("Program that receives code on stdin when using the command executor, e.g. \"blender --background --python-use-system-env --python -\"."),
        )
        .arg(
            config_arg(ConfigKey::ContextFile)
                .help("JSON file describing the current scene, re-read before every prompt."),
        )
        .arg(
            config_arg(ConfigKey::StoreFile)
                .help(format!("Where chat sessions are saved. [default: {}]", Config::default_value(ConfigKey::StoreFile))),
        );
}

/// Parses arguments, running any one-shot subcommand. Returns the loaded
/// config when the chat should start.
pub async fn parse() -> Result<Option<Config>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            let config = Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(config));
        }
        Some(("models", subcmd_matches)) => {
            let config = Config::load(build(), vec![&matches, subcmd_matches]).await?;
            print_models(&config)?;
            return Ok(None);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => {
            let config = Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("create", _)) => {
                    create_config_file(&config.get(ConfigKey::ConfigFile)).await?;
                }
                Some(("default", _)) => {
                    println!("{}", Config::serialize_default(build()));
                }
                Some(("path", _)) => {
                    println!("{}", config.get(ConfigKey::ConfigFile));
                }
                _ => {
                    subcommand_config().print_long_help()?;
                }
            }
            return Ok(None);
        }
        _ => {
            let config = Config::load(build(), vec![&matches]).await?;
            return Ok(Some(config));
        }
    }
}
