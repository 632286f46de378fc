//! Modbus TCP reader for the DTU gateway.
//!
//! The DTU exposes one fixed-stride block of holding registers per
//! micro-inverter port, plus its own serial number. One call reads the
//! whole plant; plant-level figures are sums over the ports.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use log::{debug, info};
use tokio_modbus::client::sync::Reader;
use tokio_modbus::prelude::*;

use crate::plant_data::{MicroinverterData, PlantData};

const DTU_SERIAL_ADDR: u16 = 0x2000;
const PORT_DATA_ADDR: u16 = 0x1000;
const PORT_BLOCK_STRIDE: u16 = 0x28;
const PORT_BLOCK_LEN: u16 = 0x14;
// a DTU-Pro chains up to 99 micro-inverter ports
const MAX_PORTS: u16 = 99;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NetworkState {
    Unknown,
    Online,
    Offline,
}

pub struct Dtu {
    host: String,
    port: u16,
    state: NetworkState,
}

impl Dtu {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            state: NetworkState::Unknown,
        }
    }

    fn set_state(&mut self, new_state: NetworkState) {
        if self.state != new_state {
            self.state = new_state;
            info!("DTU is {new_state:?}");
        }
    }

    /// Read a full plant snapshot. Any failure leaves no partial
    /// state behind; the caller abandons the cycle and tries again on
    /// the next one.
    pub fn read_plant(&mut self) -> Result<PlantData> {
        let result = self.try_read();
        match result {
            Ok(_) => self.set_state(NetworkState::Online),
            Err(_) => self.set_state(NetworkState::Offline),
        }
        result
    }

    fn try_read(&self) -> Result<PlantData> {
        let address: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid DTU address {}:{}", self.host, self.port))?;
        let mut ctx = sync::tcp::connect_slave(address, Slave(1))
            .with_context(|| format!("connecting to DTU at {address}"))?;

        let serial_regs = ctx
            .read_holding_registers(DTU_SERIAL_ADDR, 3)
            .context("reading DTU serial number")?;
        let dtu_sn = serial_from_bytes(serial_regs.iter().flat_map(|r| r.to_be_bytes()));

        let mut inverters = Vec::new();
        for slot in 0..MAX_PORTS {
            let block_addr = PORT_DATA_ADDR + slot * PORT_BLOCK_STRIDE;
            let block = ctx
                .read_holding_registers(block_addr, PORT_BLOCK_LEN)
                .with_context(|| format!("reading port block at {block_addr:#06x}"))?;
            match decode_port_block(&block) {
                Some(inverter) => inverters.push(inverter),
                None => break, // first empty slot ends the list
            }
        }
        debug!("read {} ports from DTU {dtu_sn}", inverters.len());

        Ok(PlantData {
            dtu_sn,
            pv_power: inverters.iter().map(|i| i.pv_power).sum(),
            today_production: inverters.iter().map(|i| i.today_production).sum(),
            total_production: inverters.iter().map(|i| i.total_production).sum(),
            inverters,
        })
    }
}

/// Serial numbers are stored as six raw bytes and conventionally
/// printed as their hex digits, e.g. `0x11 0x23 ...` -> "1123...".
fn serial_from_bytes(bytes: impl IntoIterator<Item = u8>) -> String {
    bytes.into_iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode one per-port register block. Layout: data type and serial
/// (regs 0-3), scaled electrical readings (4-8), energy counters
/// (9-11), temperature (12) and status/alarm words (13-14). A zero
/// data type marks an unused slot.
fn decode_port_block(regs: &[u16]) -> Option<MicroinverterData> {
    if regs.len() < 15 || regs[0] >> 8 == 0 {
        return None;
    }
    let serial_bytes = [
        (regs[0] & 0xff) as u8,
        (regs[1] >> 8) as u8,
        (regs[1] & 0xff) as u8,
        (regs[2] >> 8) as u8,
        (regs[2] & 0xff) as u8,
        (regs[3] >> 8) as u8,
    ];
    Some(MicroinverterData {
        serial_number: serial_from_bytes(serial_bytes),
        port_number: regs[3] & 0xff,
        pv_voltage: regs[4] as f64 / 10.0,
        pv_current: regs[5] as f64 / 100.0,
        grid_voltage: regs[6] as f64 / 10.0,
        grid_frequency: regs[7] as f64 / 100.0,
        pv_power: regs[8] as f64 / 10.0,
        today_production: regs[9] as u32,
        total_production: ((regs[10] as u64) << 16) | regs[11] as u64,
        temperature: (regs[12] as i16) as f64 / 10.0,
        operating_status: regs[13],
        alarm_code: regs[14],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_is_hex_printed_bytes() {
        let regs = [0x1123u16, 0x4567, 0x8901];
        let sn = serial_from_bytes(regs.iter().flat_map(|r| r.to_be_bytes()));
        assert_eq!(sn, "112345678901");
    }

    #[test]
    fn decodes_port_block() {
        let mut regs = [0u16; 20];
        regs[0] = 0x0199; // data type 1, serial starts 0x99
        regs[1] = 0x2345;
        regs[2] = 0x6789;
        regs[3] = 0x0102; // serial ends 0x01, port 2
        regs[4] = 332; // 33.2 V
        regs[5] = 187; // 1.87 A
        regs[6] = 2314; // 231.4 V
        regs[7] = 5002; // 50.02 Hz
        regs[8] = 621; // 62.1 W
        regs[9] = 210;
        regs[10] = 0x0012;
        regs[11] = 0xd687; // 0x0012d687 = 1234567 Wh
        regs[12] = 413; // 41.3 C
        regs[13] = 3;
        regs[14] = 0;

        let inverter = decode_port_block(&regs).unwrap();
        assert_eq!(inverter.serial_number, "992345678901");
        assert_eq!(inverter.port_number, 2);
        assert_eq!(inverter.pv_voltage, 33.2);
        assert_eq!(inverter.pv_current, 1.87);
        assert_eq!(inverter.grid_voltage, 231.4);
        assert_eq!(inverter.grid_frequency, 50.02);
        assert_eq!(inverter.pv_power, 62.1);
        assert_eq!(inverter.today_production, 210);
        assert_eq!(inverter.total_production, 1_234_567);
        assert_eq!(inverter.temperature, 41.3);
        assert_eq!(inverter.operating_status, 3);
        assert_eq!(inverter.alarm_code, 0);
    }

    #[test]
    fn empty_slot_ends_the_list() {
        let regs = [0u16; 20];
        assert!(decode_port_block(&regs).is_none());
        assert!(decode_port_block(&[]).is_none());
    }
}
