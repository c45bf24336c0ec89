//! Effects layer: HTTP handlers and the state they share.

pub mod download;
pub mod router;
pub mod state;
pub mod upload;

pub use download::download;
pub use router::router;
pub use state::AppState;
pub use upload::upload;
