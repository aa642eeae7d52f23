//! HTTP client plumbing shared by external integrations.

mod client;

pub use client::{HttpClient, HttpClientBuilder};
