//! # CrediLock API
//!
//! Administrative HTTP surface for the lockout engine: cycle/pass triggers,
//! read endpoints and manual per-device overrides. Handlers stay thin -
//! deserialize, call the service, serialize - with no business logic of
//! their own.

pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
