//! Core layer: pure parsing, planning and header formatting.

pub mod headers;
pub mod range;

pub use headers::{content_disposition, http_date, if_range_matches};
pub use range::{parse_range, plan_response};
