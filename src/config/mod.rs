/// Application settings loaded from config.toml and the environment
pub mod app;

/// Local store connection and table creation
pub mod database;

/// Default menu catalog
pub mod menu;

pub use app::{AppConfig, load_app_configuration};
