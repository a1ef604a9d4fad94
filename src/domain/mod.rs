pub mod common;
pub mod metrics;
pub mod session;
