//! Snapshot types returned by one DTU poll and their telemetry
//! documents. A snapshot is consumed within the cycle that fetched it.

use serde_json::{json, Value};

/// Everything one poll learned about the plant behind a DTU.
#[derive(Clone, Debug)]
pub struct PlantData {
    pub dtu_sn: String,
    /// Instantaneous PV power in W, summed over all ports.
    pub pv_power: f64,
    /// Energy produced today in Wh.
    pub today_production: u32,
    /// Lifetime energy in Wh.
    pub total_production: u64,
    pub inverters: Vec<MicroinverterData>,
}

/// Readings for a single micro-inverter port. Voltages, currents,
/// power, frequency and temperature are already scaled to engineering
/// units; energy counters are raw Wh.
#[derive(Clone, Debug)]
pub struct MicroinverterData {
    pub serial_number: String,
    /// 1-based port index on the micro-inverter.
    pub port_number: u16,
    pub pv_voltage: f64,
    pub pv_current: f64,
    pub pv_power: f64,
    pub grid_voltage: f64,
    pub grid_frequency: f64,
    pub temperature: f64,
    pub today_production: u32,
    pub total_production: u64,
    pub operating_status: u16,
    pub alarm_code: u16,
}

fn wh_to_kwh(wh: u64) -> f64 {
    (wh as f64 / 1000.0 * 100.0).round() / 100.0
}

impl PlantData {
    /// Telemetry document for the plant device, all values in one
    /// object so subscribers observe them atomically.
    pub fn plant_payload(&self) -> Value {
        json!({
            "pv_power": self.pv_power,
            "today_production": self.today_production,
            "total_production": wh_to_kwh(self.total_production),
        })
    }
}

impl MicroinverterData {
    /// Telemetry document for one port device.
    pub fn port_payload(&self) -> Value {
        json!({
            "dc_voltage": self.pv_voltage,
            "dc_current": self.pv_current,
            "dc_power": self.pv_power,
            "grid_voltage": self.grid_voltage,
            "grid_frequency": self.grid_frequency,
            "temperature": self.temperature,
            "today_production": self.today_production,
            "total_production": wh_to_kwh(self.total_production),
            "operating_status": self.operating_status,
            "alarm_code": self.alarm_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_port() -> MicroinverterData {
        MicroinverterData {
            serial_number: "992345678901".to_string(),
            port_number: 1,
            pv_voltage: 33.2,
            pv_current: 1.87,
            pv_power: 62.1,
            grid_voltage: 231.4,
            grid_frequency: 50.02,
            temperature: 41.3,
            today_production: 210,
            total_production: 1_234_567,
            operating_status: 3,
            alarm_code: 0,
        }
    }

    #[test]
    fn plant_payload_matches_expected_values() {
        let plant = PlantData {
            dtu_sn: "112345678901".to_string(),
            pv_power: 125.4,
            today_production: 340,
            total_production: 1_234_000,
            inverters: vec![],
        };
        assert_eq!(
            plant.plant_payload(),
            json!({
                "pv_power": 125.4,
                "today_production": 340,
                "total_production": 1234.0,
            })
        );
    }

    #[test]
    fn lifetime_energy_rounds_to_two_decimals() {
        let payload = sample_port().port_payload();
        assert_eq!(payload["total_production"], json!(1234.57));
    }

    #[test]
    fn port_payload_carries_all_fields() {
        let payload = sample_port().port_payload();
        for key in [
            "dc_voltage",
            "dc_current",
            "dc_power",
            "grid_voltage",
            "grid_frequency",
            "temperature",
            "today_production",
            "total_production",
            "operating_status",
            "alarm_code",
        ] {
            assert!(payload.get(key).is_some(), "missing {key}");
        }
        assert_eq!(payload["dc_voltage"], json!(33.2));
        assert_eq!(payload["operating_status"], json!(3));
    }
}
