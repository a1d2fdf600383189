//! Observability setup for Kindred.

pub mod tracing_setup;
