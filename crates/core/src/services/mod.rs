pub mod analytics_service;
pub mod animation_service;
pub mod chart_service;
pub mod currency_service;
pub mod date_range_service;
pub mod snapshot_service;
pub mod table_service;
pub mod terminal_service;
