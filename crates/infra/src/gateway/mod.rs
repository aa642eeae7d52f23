//! Device directory gateway.
//!
//! Implementation of the `DeviceGateway` port against the external
//! device-management backend. The vendor locks devices by swapping the
//! configuration profile assigned to them, so "lock" and "unlock" translate
//! to profile assignments.

mod client;
mod session;

pub use client::DirectoryClient;
