//! Reporter accounts.
//!
//! Identity comes from the access token; this feature keeps the matching
//! `users` row that accidents reference as their reporter.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users/me` | Get the caller's reporter account |
//! | PUT | `/api/users/me` | Register the caller as a reporter |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::UserService;
