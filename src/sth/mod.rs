pub mod client;
pub mod models;

pub use client::SthClient;
pub use models::SensorSample;
