use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

fn default_network_name() -> String {
    "Monad Testnet".to_string()
}

fn default_wallet_address() -> String {
    "0x95723432b6a145b658995881b0576d1e16850b02".to_string()
}

fn default_suggestions() -> Vec<String> {
    vec![
        "What's my wallet balance?".to_string(),
        "Show my token positions".to_string(),
        "What's the current price of MON?".to_string(),
        "Which DeFi operations can you perform?".to_string(),
    ]
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub window: WindowConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub base_url: String,
    #[serde(default = "default_network_name")]
    pub network_name: String,
    #[serde(default = "default_wallet_address")]
    pub wallet_address: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UiConfig {
    #[serde(default = "default_suggestions")]
    pub suggestions: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            suggestions: default_suggestions(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                base_url: "http://localhost:5000".to_string(),
                network_name: default_network_name(),
                wallet_address: default_wallet_address(),
            },
            window: WindowConfig {
                width: 1200,
                height: 800,
                min_width: 400,
                min_height: 300,
            },
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        if config_path.exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Error parsing config.toml: {}. Using defaults.", e),
                },
                Err(e) => tracing::warn!("Error reading config.toml: {}. Using defaults.", e),
            }
        } else {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
        }

        Config::default()
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    pub fn get_config_dir() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/evm-chat")
        } else {
            PathBuf::from(".")
        }
    }
}
