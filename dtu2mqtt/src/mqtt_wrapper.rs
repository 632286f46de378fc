use crate::mqtt_config::MqttConfig;

#[derive(Clone, Copy)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

pub trait MqttWrapper {
    // Decouples the publishing pipeline from the concrete MQTT client.
    // The bridge only publishes; subscriptions are out of scope. An
    // error from publish means the rest of this cycle's publishes are
    // pointless, nothing more - the session recovers on its own.

    fn publish<S, V>(&mut self, topic: S, qos: QoS, retain: bool, payload: V) -> anyhow::Result<()>
    where
        S: Clone + Into<String>,
        V: Clone + Into<Vec<u8>>;

    fn new(config: &MqttConfig) -> Self;
}
