//! Static catalog of the measurements the bridge exposes.
//!
//! One descriptor per field of the telemetry documents. The catalogs
//! are fixed at compile time; their order only affects the order in
//! which discovery configs go out.

pub struct SensorDescriptor {
    /// Field name inside the telemetry JSON document.
    pub key: &'static str,
    pub name: &'static str,
    pub device_class: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub state_class: Option<&'static str>,
    pub icon: &'static str,
}

/// Plant-level sensors, aggregated over all ports of one DTU.
pub static PLANT_SENSORS: &[SensorDescriptor] = &[
    SensorDescriptor {
        key: "pv_power",
        name: "PV Power",
        device_class: Some("power"),
        unit: Some("W"),
        state_class: Some("measurement"),
        icon: "mdi:solar-power",
    },
    SensorDescriptor {
        key: "today_production",
        name: "Today Production",
        device_class: Some("energy"),
        unit: Some("Wh"),
        state_class: Some("total_increasing"),
        icon: "mdi:solar-power-variant",
    },
    SensorDescriptor {
        key: "total_production",
        name: "Total Production",
        device_class: Some("energy"),
        unit: Some("kWh"),
        state_class: Some("total_increasing"),
        icon: "mdi:counter",
    },
];

/// Per-port sensors. Status and alarm codes are plain ordinals and
/// deliberately carry no class, unit or state class.
pub static PORT_SENSORS: &[SensorDescriptor] = &[
    SensorDescriptor {
        key: "dc_voltage",
        name: "DC Voltage",
        device_class: Some("voltage"),
        unit: Some("V"),
        state_class: Some("measurement"),
        icon: "mdi:solar-panel",
    },
    SensorDescriptor {
        key: "dc_current",
        name: "DC Current",
        device_class: Some("current"),
        unit: Some("A"),
        state_class: Some("measurement"),
        icon: "mdi:current-dc",
    },
    SensorDescriptor {
        key: "dc_power",
        name: "DC Power",
        device_class: Some("power"),
        unit: Some("W"),
        state_class: Some("measurement"),
        icon: "mdi:solar-power",
    },
    SensorDescriptor {
        key: "grid_voltage",
        name: "Grid Voltage",
        device_class: Some("voltage"),
        unit: Some("V"),
        state_class: Some("measurement"),
        icon: "mdi:flash-triangle",
    },
    SensorDescriptor {
        key: "grid_frequency",
        name: "Grid Frequency",
        device_class: Some("frequency"),
        unit: Some("Hz"),
        state_class: Some("measurement"),
        icon: "mdi:sine-wave",
    },
    SensorDescriptor {
        key: "temperature",
        name: "Temperature",
        device_class: Some("temperature"),
        unit: Some("°C"),
        state_class: Some("measurement"),
        icon: "mdi:thermometer",
    },
    SensorDescriptor {
        key: "today_production",
        name: "Today Production",
        device_class: Some("energy"),
        unit: Some("Wh"),
        state_class: Some("total_increasing"),
        icon: "mdi:solar-power-variant",
    },
    SensorDescriptor {
        key: "total_production",
        name: "Total Production",
        device_class: Some("energy"),
        unit: Some("kWh"),
        state_class: Some("total_increasing"),
        icon: "mdi:counter",
    },
    SensorDescriptor {
        key: "operating_status",
        name: "Operating Status",
        device_class: None,
        unit: None,
        state_class: None,
        icon: "mdi:information-outline",
    },
    SensorDescriptor {
        key: "alarm_code",
        name: "Alarm Code",
        device_class: None,
        unit: None,
        state_class: None,
        icon: "mdi:alert-circle-outline",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unique_keys(catalog: &[SensorDescriptor]) {
        let mut keys: Vec<_> = catalog.iter().map(|s| s.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), catalog.len());
    }

    #[test]
    fn catalog_keys_are_unique() {
        assert_unique_keys(PLANT_SENSORS);
        assert_unique_keys(PORT_SENSORS);
    }

    #[test]
    fn catalog_sizes() {
        assert_eq!(PLANT_SENSORS.len(), 3);
        assert_eq!(PORT_SENSORS.len(), 10);
    }
}
