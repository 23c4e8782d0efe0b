//! Add a folder to monitor

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use settle_backends::{
    Backend, DiscordConfig, GotifyConfig, MatrixConfig, NtfyConfig, PushoverConfig, TelegramConfig,
};
use settle_core::FolderSpec;
use std::path::Path;

use crate::{util, AddArgs, BackendArgs};

pub async fn run(config_dir: &Path, args: AddArgs) -> Result<()> {
    let spec = build_spec(args.path.as_path(), &args)?;

    util::store(config_dir)
        .add_folder(&args.name, &spec)
        .with_context(|| format!("Failed to add folder '{}'", args.name))?;

    println!("{} {}", "Added".green(), args.name.bold());
    println!("  Path:        {}", spec.path.display().to_string().cyan());
    println!(
        "  Notify via:  {} ({})",
        spec.notification.kind(),
        spec.notification.destination()
    );
    println!(
        "  Quiet after: {}",
        util::format_period(spec.inactivity_period)
    );
    if !crate::daemon::is_running(config_dir) {
        println!("  {}", "Tip: Start monitoring with 'settle start'".dimmed());
    }
    Ok(())
}

fn build_spec(path: &Path, args: &AddArgs) -> Result<FolderSpec> {
    let path = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;
    if !path.is_dir() {
        anyhow::bail!("Not a directory: {}", path.display());
    }

    let mut spec = FolderSpec::new(path, backend(&args.backend));
    if let Some(secs) = args.inactivity {
        spec = spec.with_inactivity(secs);
    }
    if let Some(ref message) = args.message {
        spec = spec.with_template(message.clone());
    }
    spec.title = args.title.clone();
    spec.ignore = args.ignore.clone();
    Ok(spec)
}

fn backend(args: &BackendArgs) -> Backend {
    match args {
        BackendArgs::Ntfy { topic, server } => Backend::Ntfy(NtfyConfig {
            topic: topic.clone(),
            server: server.clone(),
        }),
        BackendArgs::Pushover { api_token, user_key } => {
            Backend::Pushover(PushoverConfig::new(api_token.clone(), user_key.clone()))
        }
        BackendArgs::Discord { webhook_url } => {
            Backend::Discord(DiscordConfig::new(webhook_url.clone()))
        }
        BackendArgs::Telegram { bot_token, chat_id } => {
            Backend::Telegram(TelegramConfig::new(bot_token.clone(), chat_id.clone()))
        }
        BackendArgs::Gotify { server, token } => {
            Backend::Gotify(GotifyConfig::new(server.clone(), token.clone()))
        }
        BackendArgs::Matrix {
            homeserver,
            access_token,
            room_id,
        } => Backend::Matrix(MatrixConfig::new(
            homeserver.clone(),
            access_token.clone(),
            room_id.clone(),
        )),
    }
}
