pub mod authentication;
pub mod configuration;
pub mod error_handling;
pub mod lifecycle;
pub mod pipeline;
pub mod routes;
pub mod startup;
pub mod telemetry;
