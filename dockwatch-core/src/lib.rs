pub mod error;
pub mod model;

// Telemetry pipeline
pub mod aggregate;
pub mod frame;
pub mod metrics;
pub mod runtime;

// Producer -> renderer handoff
pub mod feed;

// Dashboard state controller
pub mod state;
pub mod view;

pub mod config;
