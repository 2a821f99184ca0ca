pub mod chart;
pub mod range;
pub mod series;
pub mod settings;
pub mod snapshot;
pub mod state;
pub mod transaction;
