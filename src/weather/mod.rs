//! Weather proxy module
//!
//! Thin pass-through to the upstream weather API: current conditions with
//! an optional multi-day forecast, and city search suggestions filtered
//! to the configured country.

pub mod client;
pub mod handlers;

pub use client::{CitySuggestion, WeatherClient, WeatherPayload};
