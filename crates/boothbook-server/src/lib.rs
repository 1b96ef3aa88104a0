//! HTTP front end for boothbook.
//!
//! Exposes the booth operations as JSON endpoints:
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `POST /api/submit` | register a vendor for a booth and date |
//! | `POST /api/update` | relocate an existing booking |
//! | `POST /api/cleanup` | purge bookings past the retention window |
//! | `GET /v1/health` | liveness check |
//!
//! Handlers hold no state between requests; every call reads the documents
//! fresh from the repository branch.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use handler::AppState;
pub use server::BoothServer;
