pub const APP_NAME: &str = "Potion Craft Calculator";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version_label() -> String {
    format!("v{APP_VERSION}")
}

/// Identifies us to the price API.
pub fn user_agent() -> String {
    format!("potion-craft-calculator/{APP_VERSION}")
}
