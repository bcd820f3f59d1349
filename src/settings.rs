use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Store {
    pub url: String,
    pub master_key: String,
    pub seed_on_start: bool,
}

#[derive(Debug, Deserialize)]
pub struct Fallback {
    pub dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub store: Store,
    pub fallback: Fallback,
}

impl Settings {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .build()?;

        config.try_deserialize()
    }
}
