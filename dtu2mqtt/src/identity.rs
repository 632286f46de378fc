//! Stable names for devices, topics and discovery ids.
//!
//! Everything in here is a pure function of serial numbers and port
//! index, so re-deriving a name across cycles or process restarts
//! yields the same bytes and republishing retained discovery configs
//! converges instead of multiplying entities.

/// Topic prefix watched by Home Assistant for discovery configs.
pub const DISCOVERY_PREFIX: &str = "homeassistant";
/// Base topic under which all state topics live.
pub const BASE_TOPIC: &str = "hoymiles_dtu";
/// Product tag namespacing every unique id.
pub const SHORT_NAME: &str = "hmdtu";

/// Last four characters of a serial number, for compact display names
/// and object ids. Serials shorter than four characters are used as-is.
pub fn short_serial(serial: &str) -> &str {
    match serial.char_indices().nth_back(3) {
        Some((pos, _)) => &serial[pos..],
        None => serial,
    }
}

/// A logical device as the discovery registry sees it: the plant
/// behind a DTU, or one micro-inverter port. Each port is kept as a
/// distinct device, joined to its DTU only through `via_device`.
#[derive(Clone, Copy, Debug)]
pub enum Device<'a> {
    Plant {
        dtu_sn: &'a str,
    },
    Port {
        inverter_sn: &'a str,
        port_number: u16,
    },
}

impl Device<'_> {
    /// Globally unique id for one sensor on this device. Namespaced by
    /// the product tag and the full serial, so two physical devices
    /// cannot collide even when their serials share a suffix.
    pub fn unique_id(&self, key: &str) -> String {
        match self {
            Device::Plant { dtu_sn } => format!("{SHORT_NAME}_{dtu_sn}_{key}"),
            Device::Port {
                inverter_sn,
                port_number,
            } => format!("{SHORT_NAME}_{inverter_sn}_port{port_number}_{key}"),
        }
    }

    /// Human-scoped id used for default entity naming. Only the serial
    /// suffix goes in here; a suffix collision is cosmetic, the unique
    /// id above stays distinct.
    pub fn object_id(&self, key: &str) -> String {
        match self {
            Device::Plant { dtu_sn } => format!("dtu_{}_{key}", short_serial(dtu_sn)),
            Device::Port {
                inverter_sn,
                port_number,
            } => format!(
                "inverter_{}_port_{port_number}_{key}",
                short_serial(inverter_sn)
            ),
        }
    }

    /// Topic carrying this device's telemetry document.
    pub fn state_topic(&self) -> String {
        match self {
            Device::Plant { dtu_sn } => format!("{BASE_TOPIC}/{dtu_sn}/plant"),
            Device::Port {
                inverter_sn,
                port_number,
            } => format!("{BASE_TOPIC}/{inverter_sn}/port_{port_number}"),
        }
    }

    /// Discovery config topic for one sensor on this device.
    pub fn discovery_topic(&self, key: &str) -> String {
        format!(
            "{DISCOVERY_PREFIX}/sensor/{BASE_TOPIC}/{}/config",
            self.unique_id(key)
        )
    }

    /// Identifier registering this device in the discovery registry.
    pub fn identifier(&self) -> String {
        match self {
            Device::Plant { dtu_sn } => dtu_sn.to_string(),
            Device::Port {
                inverter_sn,
                port_number,
            } => format!("{inverter_sn}_port{port_number}"),
        }
    }

    /// Display name shown in the frontend.
    pub fn display_name(&self) -> String {
        match self {
            Device::Plant { dtu_sn } => format!("Hoymiles DTU {}", short_serial(dtu_sn)),
            Device::Port {
                inverter_sn,
                port_number,
            } => format!(
                "Inverter {} Port {port_number}",
                short_serial(inverter_sn)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_serial_takes_last_four() {
        assert_eq!(short_serial("112345678901"), "8901");
        assert_eq!(short_serial("1234"), "1234");
    }

    #[test]
    fn short_serial_degrades_on_short_input() {
        assert_eq!(short_serial("901"), "901");
        assert_eq!(short_serial("1"), "1");
    }

    #[test]
    fn state_topics_match_contract() {
        let plant = Device::Plant {
            dtu_sn: "112345678901",
        };
        let port = Device::Port {
            inverter_sn: "992345678901",
            port_number: 1,
        };
        assert_eq!(plant.state_topic(), "hoymiles_dtu/112345678901/plant");
        assert_eq!(port.state_topic(), "hoymiles_dtu/992345678901/port_1");
    }

    #[test]
    fn discovery_topic_embeds_unique_id() {
        let plant = Device::Plant {
            dtu_sn: "112345678901",
        };
        assert_eq!(
            plant.discovery_topic("pv_power"),
            "homeassistant/sensor/hoymiles_dtu/hmdtu_112345678901_pv_power/config"
        );
    }

    #[test]
    fn unique_id_is_deterministic() {
        let port = Device::Port {
            inverter_sn: "992345678901",
            port_number: 2,
        };
        assert_eq!(port.unique_id("dc_power"), port.unique_id("dc_power"));
        assert_eq!(
            port.unique_id("dc_power"),
            "hmdtu_992345678901_port2_dc_power"
        );
    }

    #[test]
    fn unique_id_differs_per_component() {
        let a = Device::Port {
            inverter_sn: "992345678901",
            port_number: 1,
        };
        let other_serial = Device::Port {
            inverter_sn: "882345678901",
            port_number: 1,
        };
        let other_port = Device::Port {
            inverter_sn: "992345678901",
            port_number: 2,
        };
        assert_ne!(a.unique_id("dc_power"), other_serial.unique_id("dc_power"));
        assert_ne!(a.unique_id("dc_power"), other_port.unique_id("dc_power"));
        assert_ne!(a.unique_id("dc_power"), a.unique_id("dc_voltage"));
    }

    #[test]
    fn plant_and_port_object_ids_use_serial_suffix() {
        let plant = Device::Plant {
            dtu_sn: "112345678901",
        };
        let port = Device::Port {
            inverter_sn: "992345678901",
            port_number: 3,
        };
        assert_eq!(plant.object_id("pv_power"), "dtu_8901_pv_power");
        assert_eq!(port.object_id("dc_power"), "inverter_8901_port_3_dc_power");
    }
}
