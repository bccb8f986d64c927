//! STH Dashboard - live charts of FIWARE STH luminosity, humidity and temperature
//!
//! This library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod error;
pub mod poller;
pub mod render;
pub mod routes;
pub mod series;
pub mod signals;
pub mod sth;
pub mod timeconv;
