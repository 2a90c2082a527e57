use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{Authenticator, Credentials},
    game::{Rules, Timings},
    registry::PlantGeneration,
    spatial::{MapBounds, Position},
};

fn default_map_size() -> f64 {
    3000.0
}

fn default_interaction_radius() -> f64 {
    200.0
}

fn default_move_speed() -> f64 {
    25.0
}

fn default_spawn() -> Position {
    Position::new(1500.0, 2500.0)
}

fn default_generated_plants() -> usize {
    40
}

fn default_margin() -> f64 {
    200.0
}

fn default_rare_probability() -> f64 {
    0.1
}

fn default_login_verify_ms() -> u64 {
    1200
}

fn default_login_welcome_ms() -> u64 {
    800
}

fn default_capture_identify_ms() -> u64 {
    1000
}

fn default_capture_celebrate_ms() -> u64 {
    3000
}

fn default_identifier() -> String {
    "explorer@plantgo.demo".to_string()
}

fn default_secret() -> String {
    "sprout-2024".to_string()
}

fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Fixed seed for plant placement; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub plants: PlantConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub identification: IdentificationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_map_size")]
    pub size: f64,
    #[serde(default = "default_interaction_radius")]
    pub interaction_radius: f64,
    #[serde(default = "default_move_speed")]
    pub move_speed: f64,
    #[serde(default = "default_spawn")]
    pub spawn: Position,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            size: default_map_size(),
            interaction_radius: default_interaction_radius(),
            move_speed: default_move_speed(),
            spawn: default_spawn(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantConfig {
    #[serde(default = "default_generated_plants")]
    pub generated: usize,
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default = "default_rare_probability")]
    pub rare_probability: f64,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            generated: default_generated_plants(),
            margin: default_margin(),
            rare_probability: default_rare_probability(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_login_verify_ms")]
    pub login_verify_ms: u64,
    #[serde(default = "default_login_welcome_ms")]
    pub login_welcome_ms: u64,
    #[serde(default = "default_capture_identify_ms")]
    pub capture_identify_ms: u64,
    #[serde(default = "default_capture_celebrate_ms")]
    pub capture_celebrate_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            login_verify_ms: default_login_verify_ms(),
            login_welcome_ms: default_login_welcome_ms(),
            capture_identify_ms: default_capture_identify_ms(),
            capture_celebrate_ms: default_capture_celebrate_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_identifier")]
    pub identifier: String,
    #[serde(default = "default_secret")]
    pub secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identifier: default_identifier(),
            secret: default_secret(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IdentificationConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl IdentificationConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("map size must be positive, got {0}")]
    MapSize(f64),
    #[error("interaction radius must not be negative, got {0}")]
    Radius(f64),
    #[error("move speed must be positive, got {0}")]
    MoveSpeed(f64),
    #[error("spawn point ({x}, {y}) lies outside the map")]
    Spawn { x: f64, y: f64 },
    #[error("rare probability must be within [0, 1], got {0}")]
    RareProbability(f64),
    #[error("plant margin must not be negative, got {0}")]
    Margin(f64),
    #[error("demo credentials must not be empty")]
    EmptyCredentials,
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let map = &self.map;
        if !(map.size > 0.0) {
            return Err(ConfigError::MapSize(map.size));
        }
        if !(map.interaction_radius >= 0.0) {
            return Err(ConfigError::Radius(map.interaction_radius));
        }
        if !(map.move_speed > 0.0) {
            return Err(ConfigError::MoveSpeed(map.move_speed));
        }
        if !MapBounds::new(map.size).contains(map.spawn) {
            return Err(ConfigError::Spawn {
                x: map.spawn.x,
                y: map.spawn.y,
            });
        }
        if !(0.0..=1.0).contains(&self.plants.rare_probability) {
            return Err(ConfigError::RareProbability(self.plants.rare_probability));
        }
        if !(self.plants.margin >= 0.0) {
            return Err(ConfigError::Margin(self.plants.margin));
        }
        if self.auth.identifier.is_empty() || self.auth.secret.is_empty() {
            return Err(ConfigError::EmptyCredentials);
        }
        Ok(())
    }

    pub fn rules(&self) -> Rules {
        Rules {
            bounds: MapBounds::new(self.map.size),
            interaction_radius: self.map.interaction_radius,
            move_speed: self.map.move_speed,
            timings: Timings {
                login_verify: Duration::from_millis(self.timing.login_verify_ms),
                login_welcome: Duration::from_millis(self.timing.login_welcome_ms),
                capture_identify: Duration::from_millis(self.timing.capture_identify_ms),
                capture_celebrate: Duration::from_millis(self.timing.capture_celebrate_ms),
            },
            authenticator: Authenticator::new(Credentials::new(
                self.auth.identifier.clone(),
                self.auth.secret.clone(),
            )),
        }
    }

    pub fn plant_generation(&self) -> PlantGeneration {
        PlantGeneration {
            count: self.plants.generated,
            margin: self.plants.margin,
            rare_probability: self.plants.rare_probability,
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: GameConfig =
            serde_yaml::from_str(text).context("Failed to parse game config")?;
        config.validate()?;
        Ok(config)
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<GameConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: GameConfig = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_campus() {
        let config = GameConfig::default();

        assert_eq!(config.map.size, 3000.0);
        assert_eq!(config.map.interaction_radius, 200.0);
        assert_eq!(config.map.move_speed, 25.0);
        assert_eq!(config.map.spawn, Position::new(1500.0, 2500.0));
        assert_eq!(config.plants.generated, 40);
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = GameConfig::from_yaml_str(
            "seed: 9\nmap:\n  interaction_radius: 150\ntiming:\n  capture_identify_ms: 10\n",
        )
        .unwrap();

        assert_eq!(config.seed, Some(9));
        assert_eq!(config.map.interaction_radius, 150.0);
        assert_eq!(config.map.size, 3000.0);
        assert_eq!(config.timing.capture_identify_ms, 10);
        assert_eq!(config.timing.capture_celebrate_ms, 3000);

        let rules = config.rules();
        assert_eq!(rules.interaction_radius, 150.0);
        assert_eq!(rules.timings.capture_identify, Duration::from_millis(10));
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: GameConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = GameConfig::default();
        config.map.spawn = Position::new(3500.0, 10.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Spawn {
                x: 3500.0,
                y: 10.0
            })
        );

        let mut config = GameConfig::default();
        config.plants.rare_probability = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::RareProbability(1.5)));

        let mut config = GameConfig::default();
        config.map.move_speed = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::MoveSpeed(0.0)));

        let mut config = GameConfig::default();
        config.auth.secret.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyCredentials));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert!(GameConfig::from_yaml_str("map:\n  size: -1\n").is_err());
        assert!(GameConfig::from_yaml_str("map: [").is_err());
    }
}
