//! HTTP protocol layer module
//!
//! Response builders and query-string parsing, independent of catalog logic.

pub mod query;
pub mod response;

// Re-export commonly used types
pub use query::QueryParams;
pub use response::{
    build_error_response, build_json_response, build_options_response, with_common_headers,
    HttpResponse,
};
