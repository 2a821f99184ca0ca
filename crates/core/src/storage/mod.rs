pub mod loader;
pub mod preferences;
