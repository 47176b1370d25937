// Engine library root: loader, aggregator, settings and the reporting layer.

pub mod analytics;
pub mod config;
pub mod data;
pub mod error;
pub mod services;

pub use error::EngineError;
