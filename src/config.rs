//! Configuration management

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    #[serde(default)]
    pub external_player: String,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub custom_user_agent: String,
    #[serde(default = "default_true")]
    pub pass_user_agent_to_player: bool,
}

fn default_catalog_url() -> String { "channels.json".to_string() }
fn default_font_size() -> u32 { 12 }
fn default_volume() -> f32 { 1.0 }
fn default_true() -> bool { true }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            external_player: String::new(),
            dark_mode: true,
            font_size: 12,
            volume: 1.0,
            muted: false,
            custom_user_agent: String::new(),
            pass_user_agent_to_player: true,
        }
    }
}

impl AppConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("planb_tv");
        fs::create_dir_all(&path).ok();
        path.push("config.json");
        path
    }

    pub fn load() -> Self {
        let path = Self::config_path();

        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(config) = serde_json::from_str(&content) {
                    return config;
                }
            }
        }

        Self::default()
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Ok(content) = serde_json::to_string_pretty(self) {
            let _ = fs::write(path, content);
        }
    }

    pub fn user_agent(&self) -> String {
        if self.custom_user_agent.is_empty() {
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
        } else {
            self.custom_user_agent.clone()
        }
    }
}
