//! Request handler module
//!
//! Maps HTTP requests onto catalog operations and errors onto status codes.

pub mod error;
pub mod products;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
