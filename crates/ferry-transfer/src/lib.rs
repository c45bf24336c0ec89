//! Range-aware file download and streaming multipart upload over HTTP.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable request, plan, session and configuration types
//! - [`core`] - Pure range parsing, planning and header formatting
//! - [`effects`] - axum handlers driving the `ferry-stream` adapter chains
//!
//! # Key Features
//!
//! - **Range responses**: single `bytes=` ranges with 206/416, anything else served whole
//! - **Bounded memory**: downloads flow through a rendezvous pipe, one chunk in flight
//! - **Single-pass hashing**: a tee feeds SHA-256 while bytes move
//! - **Atomic placement**: uploads land in a staged file renamed into place on success

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{parse_range, plan_response};
pub use self::data::{
    RangeRequest, RangeSpec, ResponsePlan, ServerConfig, TransferKind, TransferReport,
    TransferSession, UploadReport,
};
pub use self::effects::{AppState, router};
pub use self::error::{Result, TransferError};
