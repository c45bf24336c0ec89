//! Filesystem side of the transfer service.
//!
//! - [`UploadRoot`] confines every client-supplied name to one flat directory
//! - [`StagedFile`] writes an upload to a hidden staging file and places it
//!   with an atomic rename, removing it on drop if never committed
//! - [`FileRegionSource`] streams a file from an offset for range responses

pub use self::error::{Error, Result, from_io};
pub use self::region::{FileRegionSource, StoredFile};
pub use self::root::{UploadRoot, sanitize_file_name};
pub use self::staged::{FileSink, StagedFile};

mod error;
mod region;
mod root;
mod staged;
