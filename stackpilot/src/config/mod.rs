//! Layered settings: built-in defaults, an optional JSON file, then CLI flags.

mod settings;

pub use settings::Settings;
