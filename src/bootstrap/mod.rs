//! Bootstrap layer: modules that run before the router and channels start.
//!
//! - **logger**: tracing-subscriber initialisation.

pub mod logger;
