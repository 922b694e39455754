use std::{fs, path::Path};

use serde::Deserialize;

use crate::{GateflowError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// store config
    pub store: StoreConfig,
    /// notification channel config
    pub channel: ChannelConfig,
    /// engine config
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// store type
    pub store_type: StoreType,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    #[default]
    Mem,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// capacity of the broadcast queue behind `Channel::subscribe`, defaults to 2048
    pub event_queue_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// max number of live process instances held by the engine, defaults to 2048
    pub process_cache_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            event_queue_size: 2048,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            process_cache_size: 2048,
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())
            .map_err(|e| GateflowError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.channel.event_queue_size == 0 {
            return Err(GateflowError::Config("channel.event_queue_size must be positive".into()));
        }
        if self.engine.process_cache_size == 0 {
            return Err(GateflowError::Config("engine.process_cache_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{Config, GateflowError, StoreType};

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        [store]
        store_type = "mem"

        [channel]
        event_queue_size = 16

        [engine]
        process_cache_size = 8
        "#;
        let config = Config::load_from_str(toml_str).unwrap();
        assert_eq!(config.store.store_type, StoreType::Mem);
        assert_eq!(config.channel.event_queue_size, 16);
        assert_eq!(config.engine.process_cache_size, 8);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config.channel.event_queue_size, 2048);
        assert_eq!(config.engine.process_cache_size, 2048);
    }

    #[test]
    fn test_config_rejects_zero_queue() {
        let err = Config::load_from_str("[channel]\nevent_queue_size = 0").unwrap_err();
        assert!(matches!(err, GateflowError::Config(_)));
        assert!(Config::create("/nonexistent/gateflow.toml").is_err());
    }
}
