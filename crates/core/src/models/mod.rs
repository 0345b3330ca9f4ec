pub mod analytics;
pub mod chart;
pub mod holding;
pub mod intraday;
pub mod market;
pub mod portfolio;
pub mod report;
pub mod settings;
pub mod statistics;
