pub mod registry;
pub mod traits;

// Data sources
pub mod file;
pub mod http;
