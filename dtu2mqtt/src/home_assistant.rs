//! Home Assistant MQTT discovery and the publish cycle.
//!
//! Discovery configs are retained so a restarting Home Assistant finds
//! every sensor immediately; telemetry documents are not retained.
//! More on the discovery protocol:
//! https://www.home-assistant.io/docs/mqtt/discovery/

use std::time::{Duration, Instant};

use log::{debug, info};
use serde::Serialize;

use crate::error::CycleError;
use crate::identity::Device;
use crate::mqtt_config::MqttConfig;
use crate::mqtt_wrapper::{MqttWrapper, QoS};
use crate::plant_data::PlantData;
use crate::sensors::{SensorDescriptor, PLANT_SENSORS, PORT_SENSORS};

/// How often the retained discovery set is republished.
pub const DISCOVERY_INTERVAL: Duration = Duration::from_secs(300);

/// `DeviceInfo` groups the sensor entities of one logical device in
/// the discovery registry. Exactly one identifier per device: devices
/// sharing an identifier get merged by Home Assistant, and each port
/// is meant to stay its own device, tied to the DTU via `via_device`.
#[derive(Serialize, Clone)]
pub struct DeviceInfo {
    name: String,
    identifiers: Vec<String>,
    manufacturer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    via_device: Option<String>,
}

impl DeviceInfo {
    pub fn new(
        name: String,
        identifier: String,
        model: Option<String>,
        via_device: Option<String>,
    ) -> Self {
        Self {
            name,
            identifiers: vec![identifier],
            manufacturer: "Hoymiles".to_string(),
            model,
            via_device,
        }
    }
}

/// Discovery config for a single sensor entity. Optional fields are
/// left out of the serialized document entirely when unset.
#[derive(Serialize)]
pub struct DiscoveryPayload {
    name: String,
    unique_id: String,
    object_id: String,
    state_topic: String,
    value_template: String, // extracts this sensor's field from the telemetry document
    icon: String,
    device: DeviceInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expire_after: Option<u32>,
}

impl DiscoveryPayload {
    /// Built once per (sensor, device) pair each discovery round. Pure
    /// derivation from the identity triple, so republishing yields the
    /// identical retained message.
    pub fn new(
        sensor: &SensorDescriptor,
        device: &Device<'_>,
        device_info: DeviceInfo,
        expire_after: u32,
    ) -> Self {
        Self {
            name: sensor.name.to_string(),
            unique_id: device.unique_id(sensor.key),
            object_id: device.object_id(sensor.key),
            state_topic: device.state_topic(),
            value_template: format!("{{{{ value_json.{} }}}}", sensor.key),
            icon: sensor.icon.to_string(),
            device: device_info,
            device_class: sensor.device_class.map(str::to_string),
            unit_of_measurement: sensor.unit.map(str::to_string),
            state_class: sensor.state_class.map(str::to_string),
            expire_after: (expire_after > 0).then_some(expire_after),
        }
    }
}

/// Owns the MQTT side of the bridge: publishes the discovery set when
/// due, then the telemetry documents, once per poll cycle.
pub struct HomeAssistant<MQTT: MqttWrapper> {
    client: MQTT,
    expire_after: u32,
    last_discovery: Option<Instant>,
}

impl<MQTT: MqttWrapper> HomeAssistant<MQTT> {
    pub fn new(config: &MqttConfig, expire_after: u32) -> Self {
        Self::with_client(MQTT::new(config), expire_after)
    }

    pub fn with_client(client: MQTT, expire_after: u32) -> Self {
        Self {
            client,
            expire_after,
            last_discovery: None,
        }
    }

    /// One publish phase of a poll cycle. The first failed publish
    /// aborts the rest of the cycle; `last_discovery` only advances
    /// once the full discovery set went out, so a failed round is
    /// retried on the next cycle.
    pub fn publish_cycle(&mut self, plant: &PlantData, now: Instant) -> Result<(), CycleError> {
        // discovery goes out first so freshly appeared ports are
        // registered before their telemetry arrives
        if self.discovery_due(now) {
            self.publish_discovery(plant).map_err(CycleError::Publish)?;
            self.last_discovery = Some(now);
        }
        self.publish_data(plant).map_err(CycleError::Publish)
    }

    fn discovery_due(&self, now: Instant) -> bool {
        self.last_discovery
            .map_or(true, |last| now.duration_since(last) >= DISCOVERY_INTERVAL)
    }

    fn publish_discovery(&mut self, plant: &PlantData) -> anyhow::Result<()> {
        let plant_device = Device::Plant {
            dtu_sn: &plant.dtu_sn,
        };
        let dtu_info = DeviceInfo::new(
            plant_device.display_name(),
            plant_device.identifier(),
            Some("DTU-Pro-S".to_string()),
            None,
        );
        for sensor in PLANT_SENSORS {
            self.publish_config(&plant_device, sensor, dtu_info.clone())?;
        }

        // derived from the current reading, so there is no stale
        // "known ports" set to maintain
        for inverter in &plant.inverters {
            let port_device = Device::Port {
                inverter_sn: &inverter.serial_number,
                port_number: inverter.port_number,
            };
            let port_info = DeviceInfo::new(
                port_device.display_name(),
                port_device.identifier(),
                None,
                Some(plant.dtu_sn.clone()),
            );
            for sensor in PORT_SENSORS {
                self.publish_config(&port_device, sensor, port_info.clone())?;
            }
        }
        debug!(
            "discovery published for DTU {} with {} ports",
            plant.dtu_sn,
            plant.inverters.len()
        );
        Ok(())
    }

    fn publish_config(
        &mut self,
        device: &Device<'_>,
        sensor: &SensorDescriptor,
        device_info: DeviceInfo,
    ) -> anyhow::Result<()> {
        let payload = DiscoveryPayload::new(sensor, device, device_info, self.expire_after);
        let topic = device.discovery_topic(sensor.key);
        self.publish_json(&topic, &serde_json::to_value(&payload)?, true)
    }

    fn publish_data(&mut self, plant: &PlantData) -> anyhow::Result<()> {
        let plant_device = Device::Plant {
            dtu_sn: &plant.dtu_sn,
        };
        self.publish_json(&plant_device.state_topic(), &plant.plant_payload(), false)?;

        for inverter in &plant.inverters {
            let port_device = Device::Port {
                inverter_sn: &inverter.serial_number,
                port_number: inverter.port_number,
            };
            self.publish_json(&port_device.state_topic(), &inverter.port_payload(), false)?;
        }
        info!(
            "published telemetry: pv_power={:.1} W over {} ports",
            plant.pv_power,
            plant.inverters.len()
        );
        Ok(())
    }

    fn publish_json(
        &mut self,
        topic: &str,
        payload: &serde_json::Value,
        retain: bool,
    ) -> anyhow::Result<()> {
        debug!("publishing to {topic} with payload {payload}");
        let body = serde_json::to_string(payload)?;
        self.client.publish(topic, QoS::AtMostOnce, retain, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant_device() -> Device<'static> {
        Device::Plant {
            dtu_sn: "112345678901",
        }
    }

    fn dtu_info() -> DeviceInfo {
        DeviceInfo::new(
            "Hoymiles DTU 8901".to_string(),
            "112345678901".to_string(),
            Some("DTU-Pro-S".to_string()),
            None,
        )
    }

    #[test]
    fn discovery_payload_has_required_fields() {
        let payload =
            DiscoveryPayload::new(&PLANT_SENSORS[0], &plant_device(), dtu_info(), 105);
        let json = serde_json::to_value(&payload).unwrap();
        for key in [
            "name",
            "unique_id",
            "object_id",
            "state_topic",
            "value_template",
            "icon",
            "device",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["value_template"], "{{ value_json.pv_power }}");
        assert_eq!(json["expire_after"], 105);
        assert_eq!(json["device_class"], "power");
        assert_eq!(json["unit_of_measurement"], "W");
        assert_eq!(json["state_class"], "measurement");
    }

    #[test]
    fn optional_fields_are_omitted_when_unset() {
        // alarm_code has no class, unit or state class
        let sensor = PORT_SENSORS.last().unwrap();
        let device = Device::Port {
            inverter_sn: "992345678901",
            port_number: 1,
        };
        let payload = DiscoveryPayload::new(sensor, &device, dtu_info(), 0);
        let json = serde_json::to_value(&payload).unwrap();
        for key in [
            "device_class",
            "unit_of_measurement",
            "state_class",
            "expire_after",
        ] {
            assert!(json.get(key).is_none(), "unexpected {key}");
        }
    }

    #[test]
    fn device_info_has_single_identifier_and_optional_via_device() {
        let info = DeviceInfo::new(
            "Inverter 8901 Port 1".to_string(),
            "992345678901_port1".to_string(),
            None,
            Some("112345678901".to_string()),
        );
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["identifiers"], serde_json::json!(["992345678901_port1"]));
        assert_eq!(json["manufacturer"], "Hoymiles");
        assert_eq!(json["via_device"], "112345678901");
        assert!(json.get("model").is_none());

        let dtu = serde_json::to_value(&dtu_info()).unwrap();
        assert!(dtu.get("via_device").is_none());
        assert_eq!(dtu["model"], "DTU-Pro-S");
    }
}
