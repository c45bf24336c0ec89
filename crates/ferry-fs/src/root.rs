use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result, from_io};
use crate::region::StoredFile;
use crate::staged::StagedFile;

/// The single flat directory that uploads land in and downloads come from.
///
/// Every user-supplied name is reduced to a bare file name and resolved
/// under the root; nothing outside it is ever opened or created.
#[derive(Debug, Clone)]
pub struct UploadRoot {
    root: PathBuf,
}

impl UploadRoot {
    /// Create `dir` if missing and pin it to its canonical form.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| from_io(dir, e))?;
        let root = dir.canonicalize().map_err(|e| from_io(dir, e))?;
        tracing::debug!(root = %root.display(), "upload root ready");
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path { &self.root }

    /// Resolve `raw` to a path directly inside the root.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf> {
        let name = sanitize_file_name(raw)?;
        self.resolve_sanitized(&name)
    }

    fn resolve_sanitized(&self, name: &str) -> Result<PathBuf> {
        let resolved = normalize_path(&self.root.join(name));
        if resolved == self.root || !resolved.starts_with(&self.root) {
            return Err(Error::Escape {
                name: name.to_string(),
                resolved,
            });
        }
        Ok(resolved)
    }

    /// Open an existing regular file for reading.
    ///
    /// The file is canonicalized before opening, so a symlink inside the root
    /// that points elsewhere is rejected as an escape.
    pub async fn open_existing(&self, raw: &str) -> Result<StoredFile> {
        let name = sanitize_file_name(raw)?;
        let path = self.resolve_sanitized(&name)?;

        let canonical = tokio::fs::canonicalize(&path)
            .await
            .map_err(|e| from_io(&path, e))?;
        if !canonical.starts_with(&self.root) {
            tracing::warn!(file = %name, resolved = %canonical.display(), "symlink escapes upload root");
            return Err(Error::Escape {
                name,
                resolved: canonical,
            });
        }

        StoredFile::open(name, canonical).await
    }

    /// Create a staging file for `raw`; it becomes `<root>/<name>` only on commit.
    pub async fn stage(&self, raw: &str) -> Result<StagedFile> {
        let name = sanitize_file_name(raw)?;
        let destination = self.resolve_sanitized(&name)?;
        let staging = self
            .root
            .join(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()));
        StagedFile::create(staging, destination).await
    }
}

/// Reduce a client-supplied name to a bare file name.
///
/// Keeps the last segment after `/` or `\`, trims whitespace and rejects
/// empty names, `.`, `..` and names with NUL or other control characters.
pub fn sanitize_file_name(raw: &str) -> Result<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();

    if last.is_empty() || last == "." || last == ".." || last.chars().any(char::is_control) {
        return Err(Error::InvalidName(raw.to_string()));
    }
    Ok(last.to_string())
}

/// Resolve `.` and `..` lexically, without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir => result.push(Component::RootDir.as_os_str()),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::CurDir => {}
        }
    }

    result
}
