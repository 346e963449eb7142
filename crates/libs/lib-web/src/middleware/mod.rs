//! # Middleware
//!
//! Axum middleware for CORS, request stamping, request logging and response mapping.
//!
//! ## Modules
//!
//! - **[`mw_cors`]**: preflight answers and CORS headers
//! - **[`mw_req_stamp`]**: request id stamping (`X-Request-ID`)
//! - **[`mw_logging`]**: request/response logging with header redaction
//! - **[`mw_res_map`]**: server error logging

// region: --- Modules
pub mod mw_cors;
pub mod mw_logging;
pub mod mw_req_stamp;
pub mod mw_res_map;
// endregion: --- Modules

// region: --- Re-exports
pub use mw_cors::apply_cors;
pub use mw_logging::log_requests;
pub use mw_req_stamp::{stamp_req, RequestStamp};
pub use mw_res_map::map_res;
// endregion: --- Re-exports
