use std::time::Duration;
use std::{env, fs};

use dtu2mqtt::mqtt_config::MqttConfig;
use log::warn;
use serde_derive::Deserialize;

const DEFAULT_DTU_PORT: u16 = 502;
const DEFAULT_POLLING_INTERVAL_SECS: u64 = 35;
// floor protecting the DTU from excessive Modbus polling load
const MIN_POLLING_INTERVAL_SECS: u64 = 30;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    pub dtu_host: String,
    pub dtu_port: Option<u16>,
    pub polling_interval: Option<u64>,
    pub mqtt: Option<MqttConfig>,
}

impl Config {
    pub fn is_valid(&self) -> bool {
        !self.dtu_host.is_empty() && self.mqtt.as_ref().is_some_and(|m| m.is_valid())
    }

    pub fn dtu_port(&self) -> u16 {
        self.dtu_port.unwrap_or(DEFAULT_DTU_PORT)
    }

    pub fn polling_interval(&self) -> Duration {
        let secs = self
            .polling_interval
            .unwrap_or(DEFAULT_POLLING_INTERVAL_SECS)
            .max(MIN_POLLING_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    pub fn load() -> Config {
        // parse config from TOML file if present
        let filename = "config.toml";
        let contents = match fs::read_to_string(filename) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Could not read config.toml: {e}");
                "".into()
            }
        };
        let mut config = match toml::from_str::<Config>(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("toml config unparsable: {e}");
                Config::default()
            }
        };

        // overwrite config if environment variables are set
        // $DTU_HOST
        if let Ok(dtu_host) = env::var("DTU_HOST") {
            config.dtu_host = dtu_host;
        }
        // $DTU_PORT (optional)
        if let Ok(port) = env::var("DTU_PORT") {
            match port.parse() {
                Ok(port) => config.dtu_port = Some(port),
                Err(e) => warn!("ignoring unparsable $DTU_PORT {port:?}: {e}"),
            }
        }
        // $POLLING_INTERVAL (optional, seconds)
        if let Ok(interval) = env::var("POLLING_INTERVAL") {
            match interval.parse() {
                Ok(interval) => config.polling_interval = Some(interval),
                Err(e) => warn!("ignoring unparsable $POLLING_INTERVAL {interval:?}: {e}"),
            }
        }
        // $MQTT_BROKER_HOST
        if let Ok(host) = env::var("MQTT_BROKER_HOST") {
            config.mqtt.get_or_insert(MqttConfig::default()).host = host;
        }
        // $MQTT_USERNAME (optional)
        if let Ok(username) = env::var("MQTT_USERNAME") {
            config.mqtt.get_or_insert(MqttConfig::default()).username = Some(username);
        }
        // $MQTT_PASSWORD (optional)
        if let Ok(password) = env::var("MQTT_PASSWORD") {
            config.mqtt.get_or_insert(MqttConfig::default()).password = Some(password);
        }
        // $MQTT_PORT (optional)
        if let Ok(port) = env::var("MQTT_PORT") {
            match port.parse() {
                Ok(port) => config.mqtt.get_or_insert(MqttConfig::default()).port = Some(port),
                Err(e) => warn!("ignoring unparsable $MQTT_PORT {port:?}: {e}"),
            }
        }
        config
    }
}
