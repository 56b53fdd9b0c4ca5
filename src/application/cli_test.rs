use anyhow::Result;
use clap::error::ErrorKind;

use super::build;
use crate::configuration::ConfigKey;

#[test]
fn it_builds_a_valid_command() {
    build().debug_assert();
}

#[test]
fn it_exposes_every_config_key() {
    let cmd = build();
    for key in [
        ConfigKey::Provider,
        ConfigKey::AnthropicApiKey,
        ConfigKey::GoogleModel,
        ConfigKey::DeepSeekUrl,
        ConfigKey::OpenAiApiKey,
        ConfigKey::MaxMessageCount,
        ConfigKey::ConfirmExecution,
        ConfigKey::Executor,
        ConfigKey::ExecCommand,
        ConfigKey::ContextFile,
        ConfigKey::StoreFile,
        ConfigKey::ConfigFile,
    ] {
        let arg = cmd
            .get_arguments()
            .find(|e| return e.get_long() == Some(key.to_string().as_str()));
        assert!(arg.is_some(), "missing argument for {key}");
        assert_eq!(
            arg.unwrap().get_env().map(|e| return e.to_string_lossy().to_string()),
            Some(key.env_var())
        );
    }
}

#[test]
fn it_parses_global_arguments_after_subcommands() -> Result<()> {
    let matches = build().try_get_matches_from(vec![
        "meshchat",
        "chat",
        "--provider",
        "deepseek",
        "--executor",
        "command",
    ])?;
    let (name, subcmd_matches) = matches.subcommand().unwrap();

    assert_eq!(name, "chat");
    assert_eq!(
        subcmd_matches.get_one::<String>("provider"),
        Some(&"deepseek".to_string())
    );
    assert_eq!(
        subcmd_matches.get_one::<String>("executor"),
        Some(&"command".to_string())
    );
    return Ok(());
}

#[test]
fn it_rejects_unknown_providers() {
    let err = build()
        .try_get_matches_from(vec!["meshchat", "--provider", "ollama"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn it_rejects_non_boolean_flags() {
    let err = build()
        .try_get_matches_from(vec!["meshchat", "--show-timestamps", "maybe"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn it_lists_chat_commands_in_help() {
    let help = build().render_long_help().to_string();
    assert!(help.contains("  /run (/r) [CODE_NUMBER?]"));
    assert!(help.contains("  /quit /exit (/q) - Exit Meshchat."));
}
