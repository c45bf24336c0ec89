//! Data layer: immutable request, plan, session and configuration types.

pub mod config;
pub mod range;
pub mod session;

pub use config::ServerConfig;
pub use range::{RangeRequest, RangeSpec, ResponsePlan};
pub use session::{TransferKind, TransferReport, TransferSession, UploadReport};
