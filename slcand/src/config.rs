use std::path::Path;

use serde::Deserialize;
use slcan_gateway::GatewayConfig;

pub const DEFAULT_REMOTE: &str = "192.168.131.2";

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    /// MCU address, the port defaults to the well known SLCAN port.
    pub remote: String,
    pub gateway: GatewayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            remote: DEFAULT_REMOTE.to_owned(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                let config = toml::from_str(&text)?;
                log::debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config() {
        let config: Config = toml::from_str(
            r#"
            remote = "10.0.0.2:4000"

            [gateway]
            local = "10.0.0.1:4000"
            queue_capacity = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.remote, "10.0.0.2:4000");
        assert_eq!(config.gateway.local, "10.0.0.1:4000".parse().unwrap());
        assert_eq!(config.gateway.queue_capacity, 8);
        assert_eq!(
            config.gateway.read_buffer,
            slcan_gateway::DEFAULT_READ_BUFFER
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.remote, DEFAULT_REMOTE);
        assert_eq!(config.gateway.local.port(), slcan_gateway::CAN_PORT);
        assert_eq!(config.gateway.queue_capacity, 32);
    }

    #[test]
    fn rejects_bad_addresses() {
        assert!(toml::from_str::<Config>("[gateway]\nlocal = \"nope\"").is_err());
    }
}
