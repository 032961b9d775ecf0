//! Shared start-up for the edurag binaries.

use anyhow::Context;

use edurag_core::config::{Config, Settings};

/// Install logging and load layered settings.
pub fn init() -> anyhow::Result<Settings> {
    edurag_core::logging::init();
    let config = Config::load().context("Error loading config")?;
    config.settings()
}

/// Shorten `text` to `max` characters on one line.
pub fn preview(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}…")
    }
}
