//! API Module
//!
//! HTTP handlers and routing for the cache service.
//!
//! # Endpoints
//! - `GET /get?key=`, `POST /set`, `POST /delete`, `POST /clear`, `GET /stats` -
//!   the shared store boundary
//! - `POST /invalidate` - Content-change trigger
//! - `GET /cms/*path` - Read-through CMS proxy
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
