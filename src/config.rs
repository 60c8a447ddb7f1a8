use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::jid::to_jid;
use crate::platform::RegisteredGroup;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub zapmeow: ZapMeowConfig,
    #[serde(default)]
    pub registered_chats: Vec<RegisteredChatConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    /// Display name; also the prefix used to mark the assistant's own messages
    #[serde(default = "default_assistant_name")]
    pub name: String,
    /// Whether the assistant runs on its own WhatsApp number.
    /// When false, outbound messages are prefixed with "<name>: " and
    /// inbound messages carrying that prefix are treated as the bot's own.
    #[serde(default)]
    pub has_own_number: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZapMeowConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_instance_id")]
    pub instance_id: String,
    #[serde(default = "default_webhook_port")]
    pub webhook_port: u16,
    #[serde(default = "default_webhook_bind")]
    pub webhook_bind: String,
}

/// A chat the standalone binary forwards content for.
#[derive(Debug, Deserialize, Clone)]
pub struct RegisteredChatConfig {
    pub jid: String,
    pub name: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub trigger: Option<String>,
}

fn default_assistant_name() -> String {
    "Andy".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8900".to_string()
}

fn default_instance_id() -> String {
    "1".to_string()
}

fn default_webhook_port() -> u16 {
    8001
}

fn default_webhook_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            has_own_number: false,
        }
    }
}

impl Default for ZapMeowConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            instance_id: default_instance_id(),
            webhook_port: default_webhook_port(),
            webhook_bind: default_webhook_bind(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig::default(),
            zapmeow: ZapMeowConfig::default(),
            registered_chats: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Parse config text and normalize registered chat addresses to JIDs.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        for chat in &mut config.registered_chats {
            chat.jid = to_jid(&chat.jid);
        }
        Ok(config)
    }

    /// Apply environment-style overrides on top of the file values.
    /// `lookup` returns the value of a variable if it is set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("ASSISTANT_NAME") {
            self.assistant.name = name;
        }
        if let Some(flag) = lookup("ASSISTANT_HAS_OWN_NUMBER") {
            self.assistant.has_own_number = matches!(flag.trim(), "true" | "1");
        }
        if let Some(url) = lookup("ZAPMEOW_BASE_URL") {
            self.zapmeow.base_url = url;
        }
        if let Some(id) = lookup("ZAPMEOW_INSTANCE_ID") {
            self.zapmeow.instance_id = id;
        }
        if let Some(port) = lookup("ZAPMEOW_WEBHOOK_PORT") {
            self.zapmeow.webhook_port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid ZAPMEOW_WEBHOOK_PORT: {}", port))?;
        }
        Ok(())
    }

    /// Registry snapshot built from the configured chats.
    pub fn registered_groups(&self) -> HashMap<String, RegisteredGroup> {
        self.registered_chats
            .iter()
            .map(|chat| {
                (
                    chat.jid.clone(),
                    RegisteredGroup {
                        name: chat.name.clone(),
                        folder: chat.folder.clone(),
                        trigger: chat.trigger.clone(),
                        added_at: None,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.assistant.name, "Andy");
        assert!(!config.assistant.has_own_number);
        assert_eq!(config.zapmeow.base_url, "http://localhost:8900");
        assert_eq!(config.zapmeow.instance_id, "1");
        assert_eq!(config.zapmeow.webhook_port, 8001);
        assert_eq!(config.zapmeow.webhook_bind, "0.0.0.0");
        assert!(config.registered_chats.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
[assistant]
name = "Rusty"
has_own_number = true

[zapmeow]
base_url = "http://zapmeow:8900"
instance_id = "7"
webhook_port = 9001
webhook_bind = "127.0.0.1"

[[registered_chats]]
jid = "447906616842"
name = "Me"
folder = "main"
trigger = "@Rusty"

[[registered_chats]]
jid = "120363000000000000@g.us"
name = "Family"
"#,
        )
        .unwrap();

        assert_eq!(config.assistant.name, "Rusty");
        assert!(config.assistant.has_own_number);
        assert_eq!(config.zapmeow.base_url, "http://zapmeow:8900");
        assert_eq!(config.zapmeow.instance_id, "7");
        assert_eq!(config.zapmeow.webhook_port, 9001);
        assert_eq!(config.zapmeow.webhook_bind, "127.0.0.1");

        // Bare numbers are normalized at load time
        assert_eq!(config.registered_chats[0].jid, "447906616842@s.whatsapp.net");
        assert_eq!(config.registered_chats[1].jid, "120363000000000000@g.us");
        assert_eq!(config.registered_chats[1].folder, "");

        let groups = config.registered_groups();
        assert_eq!(groups.len(), 2);
        let me = &groups["447906616842@s.whatsapp.net"];
        assert_eq!(me.name, "Me");
        assert_eq!(me.trigger.as_deref(), Some("@Rusty"));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = Config::parse("[assistant]\nname = \"Andy\"\n").unwrap();
        let env: HashMap<&str, &str> = [
            ("ASSISTANT_NAME", "Bob"),
            ("ASSISTANT_HAS_OWN_NUMBER", "1"),
            ("ZAPMEOW_BASE_URL", "http://gw:1234"),
            ("ZAPMEOW_INSTANCE_ID", "42"),
            ("ZAPMEOW_WEBHOOK_PORT", "8123"),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.assistant.name, "Bob");
        assert!(config.assistant.has_own_number);
        assert_eq!(config.zapmeow.base_url, "http://gw:1234");
        assert_eq!(config.zapmeow.instance_id, "42");
        assert_eq!(config.zapmeow.webhook_port, 8123);
    }

    #[test]
    fn test_override_has_own_number_false() {
        let mut config = Config::parse("[assistant]\nhas_own_number = true\n").unwrap();
        config
            .apply_overrides(|key| (key == "ASSISTANT_HAS_OWN_NUMBER").then(|| "no".to_string()))
            .unwrap();
        assert!(!config.assistant.has_own_number);
    }

    #[test]
    fn test_invalid_port_override_fails() {
        let mut config = Config::default();
        let result = config
            .apply_overrides(|key| (key == "ZAPMEOW_WEBHOOK_PORT").then(|| "eighty".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Config::load(Path::new("/definitely/not/here/config.toml"));
        assert!(result.is_err());
    }
}
