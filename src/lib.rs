//! Spotly — onboarding wizard and review backend.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod onboarding;
pub mod server;
pub mod store;
