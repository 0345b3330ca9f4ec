pub mod crosshair_service;
pub mod metrics_service;
pub mod series_service;
