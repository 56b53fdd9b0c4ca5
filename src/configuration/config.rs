#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::collections::HashMap;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::ChatPolicy;
use crate::domain::models::ExecutorName;
use crate::domain::models::ProviderName;
use crate::domain::models::ProviderSettings;
use crate::infrastructure::providers::anthropic;
use crate::infrastructure::providers::deepseek;
use crate::infrastructure::providers::google;
use crate::infrastructure::providers::openai;

/// Largest accepted `max-message-count`.
pub const MAX_MESSAGE_COUNT_LIMIT: usize = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    Provider,
    AnthropicApiKey,
    AnthropicModel,
    AnthropicUrl,
    GoogleApiKey,
    GoogleModel,
    GoogleUrl,
    #[strum(to_string = "deepseek-api-key")]
    DeepSeekApiKey,
    #[strum(to_string = "deepseek-model")]
    DeepSeekModel,
    #[strum(to_string = "deepseek-url")]
    DeepSeekUrl,
    #[strum(to_string = "openai-api-key")]
    OpenAiApiKey,
    #[strum(to_string = "openai-model")]
    OpenAiModel,
    #[strum(to_string = "openai-url")]
    OpenAiUrl,
    MaxMessageCount,
    AutoScroll,
    ShowTimestamps,
    ConfirmExecution,
    Executor,
    ExecCommand,
    ContextFile,
    StoreFile,
    ConfigFile,
}

impl ConfigKey {
    /// Environment variable that can set the key, e.g. `MESHCHAT_OPENAI_API_KEY`.
    pub fn env_var(&self) -> String {
        return format!(
            "MESHCHAT_{}",
            self.to_string().to_uppercase().replace('-', "_")
        );
    }
}

/// Resolved configuration. Built once at startup and passed by reference to
/// whatever needs it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    values: HashMap<ConfigKey, String>,
}

impl Default for Config {
    fn default() -> Config {
        let values = ConfigKey::iter()
            .map(|key| return (key, Config::default_value(key)))
            .collect::<HashMap<ConfigKey, String>>();

        return Config { values };
    }
}

impl Config {
    pub fn get(&self, key: ConfigKey) -> String {
        if let Some(val) = self.values.get(&key) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(&mut self, key: ConfigKey, value: &str) {
        self.values.insert(key, value.to_string());
    }

    pub fn default_value(key: ConfigKey) -> String {
        let config_path = dirs::config_dir()
            .unwrap_or_default()
            .join("meshchat")
            .join("config.toml");
        let store_path = dirs::cache_dir()
            .unwrap_or_default()
            .join("meshchat")
            .join("store.yaml");

        let res = match key {
            ConfigKey::Provider => ProviderName::Anthropic.to_string(),
            ConfigKey::AnthropicUrl => anthropic::DEFAULT_URL.to_string(),
            ConfigKey::GoogleUrl => google::DEFAULT_URL.to_string(),
            ConfigKey::DeepSeekUrl => deepseek::DEFAULT_URL.to_string(),
            ConfigKey::OpenAiUrl => openai::DEFAULT_URL.to_string(),
            ConfigKey::MaxMessageCount => ChatPolicy::default().max_message_count.to_string(),
            ConfigKey::AutoScroll | ConfigKey::ShowTimestamps | ConfigKey::ConfirmExecution => {
                "true".to_string()
            }
            ConfigKey::Executor => ExecutorName::None.to_string(),
            ConfigKey::StoreFile => store_path.to_string_lossy().to_string(),
            ConfigKey::ConfigFile => config_path.to_string_lossy().to_string(),
            ConfigKey::AnthropicApiKey
            | ConfigKey::AnthropicModel
            | ConfigKey::GoogleApiKey
            | ConfigKey::GoogleModel
            | ConfigKey::DeepSeekApiKey
            | ConfigKey::DeepSeekModel
            | ConfigKey::OpenAiApiKey
            | ConfigKey::OpenAiModel
            | ConfigKey::ExecCommand
            | ConfigKey::ContextFile => "".to_string(),
        };

        return res;
    }

    /// Layers defaults, the TOML config file and parsed CLI arguments (which
    /// already include `MESHCHAT_*` environment variables), in that order.
    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<Config> {
        let mut config = Config::default();

        let mut config_file = Config::default_value(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }
        config.set(ConfigKey::ConfigFile, &config_file);

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if key == ConfigKey::ConfigFile {
                    continue;
                }

                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    {
                        possible_values = arg
                            .get_possible_values()
                            .iter()
                            .map(|e| return e.get_name().to_string())
                            .collect::<Vec<String>>();
                    }

                    let val_str = if let Some(val_int) = val.as_integer() {
                        val_int.to_string()
                    } else if let Some(val_bool) = val.as_bool() {
                        val_bool.to_string()
                    } else if let Some(val_str) = val.as_str() {
                        val_str.to_string()
                    } else {
                        bail!(format!("config.toml has an unsupported value type for key '{key}'"));
                    };

                    if val_str.is_empty() {
                        continue;
                    }
                    if !possible_values.is_empty() && !possible_values.contains(&val_str) {
                        bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                    }
                    config.set(key, &val_str);
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    config.set(key, val)
                }
            }
        }

        tracing::debug!(
            provider = config.get(ConfigKey::Provider),
            max_message_count = config.get(ConfigKey::MaxMessageCount),
            executor = config.get(ConfigKey::Executor),
            context_file = config.get(ConfigKey::ContextFile),
            store_file = config.get(ConfigKey::StoreFile),
            "config"
        );

        return Ok(config);
    }

    /// Commented TOML with every key and its default, for `config default`.
    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|e| return e.to_string())
                    .unwrap_or_default();
                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default_value(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() || val.parse::<bool>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }

    pub fn provider(&self) -> Result<ProviderName> {
        let name = self.get(ConfigKey::Provider);
        if let Some(provider) = ProviderName::parse(&name) {
            return Ok(provider);
        }

        bail!(format!("No provider implemented for {name}"));
    }

    /// The key, model and URL for one provider.
    pub fn provider_settings(&self, name: ProviderName) -> ProviderSettings {
        let (api_key, model, url) = match name {
            ProviderName::Anthropic => (
                ConfigKey::AnthropicApiKey,
                ConfigKey::AnthropicModel,
                ConfigKey::AnthropicUrl,
            ),
            ProviderName::Google => (
                ConfigKey::GoogleApiKey,
                ConfigKey::GoogleModel,
                ConfigKey::GoogleUrl,
            ),
            ProviderName::DeepSeek => (
                ConfigKey::DeepSeekApiKey,
                ConfigKey::DeepSeekModel,
                ConfigKey::DeepSeekUrl,
            ),
            ProviderName::OpenAI => (
                ConfigKey::OpenAiApiKey,
                ConfigKey::OpenAiModel,
                ConfigKey::OpenAiUrl,
            ),
        };

        return ProviderSettings {
            api_key: self.get(api_key),
            model: self.get(model),
            url: self.get(url),
        };
    }

    pub fn chat_policy(&self) -> Result<ChatPolicy> {
        let raw_count = self.get(ConfigKey::MaxMessageCount);
        let max_message_count = match raw_count.parse::<usize>() {
            Ok(count) => count,
            Err(_) => bail!(format!(
                "Invalid value for '{}': {raw_count}",
                ConfigKey::MaxMessageCount
            )),
        };
        if max_message_count > MAX_MESSAGE_COUNT_LIMIT {
            bail!(format!(
                "'{}' must be between 0 and {MAX_MESSAGE_COUNT_LIMIT}, got {max_message_count}",
                ConfigKey::MaxMessageCount
            ));
        }

        return Ok(ChatPolicy {
            max_message_count,
            auto_scroll: self.get_bool(ConfigKey::AutoScroll)?,
            show_timestamps: self.get_bool(ConfigKey::ShowTimestamps)?,
            confirm_execution: self.get_bool(ConfigKey::ConfirmExecution)?,
        });
    }

    pub fn executor(&self) -> Result<ExecutorName> {
        let name = self.get(ConfigKey::Executor);
        if let Some(executor) = ExecutorName::parse(&name) {
            return Ok(executor);
        }

        bail!(format!("No executor implemented for {name}"));
    }

    pub fn store_path(&self) -> path::PathBuf {
        return path::PathBuf::from(self.get(ConfigKey::StoreFile));
    }

    pub fn context_path(&self) -> Option<path::PathBuf> {
        let file = self.get(ConfigKey::ContextFile);
        if file.is_empty() {
            return None;
        }

        return Some(path::PathBuf::from(file));
    }

    fn get_bool(&self, key: ConfigKey) -> Result<bool> {
        let raw = self.get(key);
        match raw.parse::<bool>() {
            Ok(val) => return Ok(val),
            Err(_) => bail!(format!("Invalid value for '{key}': {raw}")),
        }
    }
}
