// externally visible interfaces
pub mod dtu;
pub mod error;
pub mod home_assistant;
pub mod identity;
pub mod mqtt_config;
pub mod mqtt_wrapper;
pub mod plant_data;
pub mod sensors;
