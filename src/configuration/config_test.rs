use std::path::PathBuf;

use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;
use crate::domain::models::ChatPolicy;
use crate::domain::models::ExecutorName;
use crate::domain::models::ProviderName;
use crate::infrastructure::providers::deepseek;

#[test]
fn it_serializes_to_valid_toml() -> Result<()> {
    let res = Config::serialize_default(cli::build());
    let doc = res.parse::<toml_edit::Document>()?;

    assert_eq!(doc["provider"].as_str(), Some("anthropic"));
    assert_eq!(doc["max-message-count"].as_integer(), Some(20));
    assert_eq!(doc["confirm-execution"].as_bool(), Some(true));
    assert_eq!(doc["executor"].as_str(), Some("none"));
    assert!(res.contains("# anthropic-api-key = \"\""));
    assert!(res.contains("[possible values: anthropic, google, deepseek, openai]"));
    assert!(!res.contains("config-file"));
    return Ok(());
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["meshchat", "-c", "./config.example.toml"])?;
    let config = Config::load(cli::build(), vec![&matches]).await?;

    assert_eq!(config.provider()?, ProviderName::OpenAI);
    assert_eq!(
        config.provider_settings(ProviderName::OpenAI).model,
        "openai/gpt-4o-mini"
    );
    assert_eq!(config.executor()?, ExecutorName::Clipboard);

    let policy = config.chat_policy()?;
    assert_eq!(policy.max_message_count, 30);
    assert!(!policy.show_timestamps);
    assert!(policy.auto_scroll);
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["meshchat", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;

    let err = res.err().unwrap();
    assert!(err
        .to_string()
        .starts_with("config.toml has an invalid value for key 'provider': ollama"));
    return Ok(());
}

#[tokio::test]
async fn it_prefers_arguments_over_the_config_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec![
        "meshchat",
        "chat",
        "-c",
        "./config.example.toml",
        "--provider",
        "google",
        "--max-message-count",
        "5",
    ])?;
    let (_, subcmd_matches) = matches.subcommand().unwrap();
    let config = Config::load(cli::build(), vec![&matches, subcmd_matches]).await?;

    assert_eq!(config.provider()?, ProviderName::Google);
    assert_eq!(config.chat_policy()?.max_message_count, 5);
    assert_eq!(config.get(ConfigKey::ConfigFile), "./config.example.toml");
    return Ok(());
}

#[tokio::test]
async fn it_uses_defaults_without_a_config_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec![
        "meshchat",
        "-c",
        "./test/missing-config.toml",
    ])?;
    let config = Config::load(cli::build(), vec![&matches]).await?;

    assert_eq!(config.provider()?, ProviderName::Anthropic);
    assert_eq!(config.chat_policy()?, ChatPolicy::default());
    assert_eq!(config.executor()?, ExecutorName::None);
    assert_eq!(config.context_path(), None);
    return Ok(());
}

#[test]
fn it_names_environment_variables() {
    assert_eq!(ConfigKey::Provider.env_var(), "MESHCHAT_PROVIDER");
    assert_eq!(ConfigKey::DeepSeekApiKey.env_var(), "MESHCHAT_DEEPSEEK_API_KEY");
    assert_eq!(ConfigKey::OpenAiUrl.env_var(), "MESHCHAT_OPENAI_URL");
    assert_eq!(ConfigKey::MaxMessageCount.env_var(), "MESHCHAT_MAX_MESSAGE_COUNT");
}

#[test]
fn it_maps_provider_settings() {
    let mut config = Config::default();
    config.set(ConfigKey::DeepSeekApiKey, "sk-0123456789");
    config.set(ConfigKey::DeepSeekModel, "deepseek/deepseek-chat");

    let settings = config.provider_settings(ProviderName::DeepSeek);
    assert_eq!(settings.api_key, "sk-0123456789");
    assert_eq!(settings.model, "deepseek/deepseek-chat");
    assert_eq!(settings.url, deepseek::DEFAULT_URL);
    assert!(config.provider_settings(ProviderName::Google).api_key.is_empty());
}

#[test]
fn it_rejects_out_of_range_message_counts() {
    let mut config = Config::default();
    config.set(ConfigKey::MaxMessageCount, "101");
    let err = config.chat_policy().unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"'max-message-count' must be between 0 and 100, got 101");

    config.set(ConfigKey::MaxMessageCount, "lots");
    let err = config.chat_policy().unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Invalid value for 'max-message-count': lots");

    config.set(ConfigKey::MaxMessageCount, "0");
    assert_eq!(config.chat_policy().unwrap().max_message_count, 0);
}

#[test]
fn it_rejects_invalid_booleans() {
    let mut config = Config::default();
    config.set(ConfigKey::ShowTimestamps, "sometimes");

    let err = config.chat_policy().unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Invalid value for 'show-timestamps': sometimes");
}

#[test]
fn it_rejects_unknown_names() {
    let mut config = Config::default();
    config.set(ConfigKey::Provider, "ollama");
    config.set(ConfigKey::Executor, "neovim");

    insta::assert_snapshot!(config.provider().unwrap_err().to_string(), @"No provider implemented for ollama");
    insta::assert_snapshot!(config.executor().unwrap_err().to_string(), @"No executor implemented for neovim");
}

#[test]
fn it_resolves_paths() {
    let mut config = Config::default();
    config.set(ConfigKey::ContextFile, "/tmp/scene.json");
    config.set(ConfigKey::StoreFile, "/tmp/meshchat/store.yaml");

    assert_eq!(config.context_path(), Some(PathBuf::from("/tmp/scene.json")));
    assert_eq!(config.store_path(), PathBuf::from("/tmp/meshchat/store.yaml"));
}
