//! Lockout reconciliation engine.

pub mod ports;
pub mod service;

pub use service::{LockoutPolicy, LockoutService};
