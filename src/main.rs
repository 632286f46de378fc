// Hoymiles DTU (Pro / Pro-S) Modbus TCP to MQTT bridge with Home
// Assistant auto-discovery.

mod config;
mod logging;
mod rumqttc_wrapper;

use std::thread;
use std::time::Instant;

use config::Config;
use dtu2mqtt::dtu::Dtu;
use dtu2mqtt::error::CycleError;
use dtu2mqtt::home_assistant::HomeAssistant;
use log::{error, info, warn};
use rumqttc_wrapper::RumqttcWrapper;

fn main() {
    logging::init_logger();
    info!("Running revision: {}", env!("GIT_HASH"));
    if std::env::args().len() > 1 {
        error!("Arguments passed. Tool is configured by config.toml in its path");
    }

    let config = Config::load();
    if !config.is_valid() {
        error!("config is incomplete: dtu_host and an [mqtt] section with a host are required");
        std::process::exit(1);
    }

    let polling_interval = config.polling_interval();
    // consumers may treat a sensor as unavailable after three missed cycles
    let expire_after = polling_interval.as_secs() as u32 * 3;
    info!(
        "DTU host: {}, polling every {}s",
        config.dtu_host,
        polling_interval.as_secs()
    );

    let mqtt_config = config.mqtt.as_ref().expect("checked by is_valid");
    let mut dtu = Dtu::new(&config.dtu_host, config.dtu_port());
    let mut home_assistant = HomeAssistant::<RumqttcWrapper>::new(mqtt_config, expire_after);

    loop {
        // a failed cycle is abandoned wholesale and retried next time;
        // transient bus or broker trouble must never stop the loop
        let outcome = dtu
            .read_plant()
            .map_err(CycleError::Read)
            .and_then(|plant| home_assistant.publish_cycle(&plant, Instant::now()));
        if let Err(e) = outcome {
            warn!("cycle abandoned: {e}");
        }

        thread::sleep(polling_interval);
    }
}
