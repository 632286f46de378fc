use thiserror::Error;

/// Failure of a single poll/publish cycle. The cycle is abandoned and
/// the loop carries on; the variant records which phase gave up.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("DTU read failed: {0}")]
    Read(anyhow::Error),
    #[error("MQTT publish failed: {0}")]
    Publish(anyhow::Error),
}
