//! ZapMeow bridge setup wizard.
//!
//! Asks for the assistant identity, the gateway location and an optional
//! first registered chat, then writes `config.toml` to the project root
//! (`ZAPMEOW_BRIDGE_ROOT`, default the current directory).

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use zapmeow_bridge::jid::to_jid;

// ── Config formatting ──────────────────────────────────────────────────────────

struct ConfigParams<'a> {
    assistant_name: &'a str,
    has_own_number: bool,
    base_url: &'a str,
    instance_id: &'a str,
    webhook_port: u16,
    /// Bare number or JID of the first chat to forward; empty for none.
    main_chat: &'a str,
}

/// TOML basic string with quotes and escapes, e.g. `"Andy"`.
fn quoted(value: &str) -> String {
    toml::Value::String(value.to_owned()).to_string()
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> String {
    let assistant_name = quoted(p.assistant_name);
    let has_own_number = p.has_own_number;
    let base_url = quoted(p.base_url.trim_end_matches('/'));
    let instance_id = quoted(p.instance_id);
    let webhook_port = p.webhook_port;

    let chat_section = if p.main_chat.is_empty() {
        "# [[registered_chats]]\n# jid = \"447906616842@s.whatsapp.net\"\n# name = \"Main\"\n# folder = \"main\"\n"
            .to_owned()
    } else {
        format!(
            "[[registered_chats]]\njid = {}\nname = \"Main\"\nfolder = \"main\"\n",
            quoted(&to_jid(p.main_chat))
        )
    };

    format!(
        r#"[assistant]
name = {assistant_name}
has_own_number = {has_own_number}

[zapmeow]
base_url = {base_url}
instance_id = {instance_id}
webhook_port = {webhook_port}
webhook_bind = "0.0.0.0"

{chat_section}"#
    )
}

// ── CLI wizard ─────────────────────────────────────────────────────────────────

fn run_cli(project_root: &Path) -> Result<()> {
    println!("=== ZapMeow Bridge Setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let or_default = |s: String, default: &str| {
        if s.is_empty() {
            default.to_owned()
        } else {
            s
        }
    };

    let assistant_name = or_default(read_line("Assistant name [Andy]: ")?, "Andy");
    let own_number = read_line("Does the assistant have its own WhatsApp number? [y/N]: ")?;
    let has_own_number = matches!(own_number.to_lowercase().as_str(), "y" | "yes");
    let base_url = or_default(
        read_line("ZapMeow URL [http://localhost:8900]: ")?,
        "http://localhost:8900",
    );
    let instance_id = or_default(read_line("ZapMeow instance id [1]: ")?, "1");
    let webhook_port: u16 = or_default(read_line("Webhook port [8001]: ")?, "8001")
        .parse()
        .context("Webhook port must be a number between 0 and 65535")?;
    let main_chat = read_line("Main chat number (optional): ")?;

    let config = format_config(&ConfigParams {
        assistant_name: &assistant_name,
        has_own_number,
        base_url: &base_url,
        instance_id: &instance_id,
        webhook_port,
        main_chat: &main_chat,
    });

    let config_path = project_root.join("config.toml");
    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("   Point ZapMeow's webhook at http://<this-host>:{webhook_port}/webhook");
    println!("   Run the bridge with:  cargo run");
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let project_root =
        PathBuf::from(std::env::var("ZAPMEOW_BRIDGE_ROOT").unwrap_or_else(|_| ".".to_string()));
    run_cli(&project_root)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
