use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use log::info;

mod models;
mod repositories;
pub mod services;
pub mod settings;

use repositories::fallback::FallbackStore;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: String,
    #[arg(long, default_value = "log4rs.yaml")]
    log4rs: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = settings::Settings::load(&args.config).expect("Could not load config file.");

    init_logging(&args.log4rs).expect("Failed to initialize logging.");
    info!("Starting stockroom data service.");

    let dir = fallback_dir(settings.fallback.dir.as_deref());
    let fallback = FallbackStore::open(&dir).expect("Could not open fallback store.");

    services::start_services(fallback, settings, args.listen)
        .await
        .expect("Could not start services.");

    Ok(())
}

fn fallback_dir(configured: Option<&str>) -> PathBuf {
    match configured {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => directories::ProjectDirs::from("app", "stockroom", "stockroom")
            .map(|dirs| dirs.data_dir().join("fallback"))
            .unwrap_or_else(|| PathBuf::from("fallback")),
    }
}

fn init_logging(path: &str) -> Result<(), anyhow::Error> {
    if !Path::new("logs").exists() {
        fs::create_dir("logs")?;
    }

    match log4rs::init_file(path, Default::default()) {
        Ok(_) => {
            println!("[*] Logging initialized successfully.");
            Ok(())
        }
        Err(e) => {
            println!("[ERROR] Failed to initialize logging: {}", e);
            Err(anyhow::anyhow!("Could not initialize logging: {}", e))
        }
    }
}
