use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid file name {0:?}")]
    InvalidName(String),

    #[error("{name:?} resolves outside the upload root ({resolved:?})")]
    Escape { name: String, resolved: PathBuf },

    #[error("file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Error {
    let path = path.into();
    match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path),
        _ => Error::Io { path, source: err },
    }
}
