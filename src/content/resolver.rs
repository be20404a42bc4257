//! Maps request paths onto files below the content root.
//!
//! Resolution order for a request path `p`:
//!
//! 1. `root/p` is a directory: serve `root/p/index.gmi` if it exists, else nothing
//! 2. `root/p` exists: serve it as-is
//! 3. `root/p.gmi` exists and is not a directory: serve it
//! 4. otherwise the resource is absent
//!
//! Paths containing `..` segments, and symlinks that lead outside the root,
//! resolve to nothing.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use crate::gemini::response::Response;
use crate::gemini::status::StatusCode;

/// File served when a directory is requested.
pub const INDEX_FILE: &str = "index.gmi";

/// Extension tried when the requested path does not exist.
pub const GEMTEXT_EXTENSION: &str = ".gmi";

// `io::ErrorKind::FilesystemLoop` is not stable; match the errno instead.
#[cfg(any(target_os = "linux", target_os = "android"))]
const ELOOP: Option<i32> = Some(40);
#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
const ELOOP: Option<i32> = Some(62);
#[cfg(not(unix))]
const ELOOP: Option<i32> = None;

/// Outcome of a lookup. Absence is an ordinary result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedResource {
    /// Path of the resource relative to the content root
    Found(PathBuf),
    Absent,
}

impl ResolvedResource {
    pub fn is_found(&self) -> bool {
        matches!(self, ResolvedResource::Found(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ResolvedResource::Found(path) => Some(path),
            ResolvedResource::Absent => None,
        }
    }
}

/// A filesystem fault other than "does not exist".
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("content root {path:?} is unusable: {source}")]
    Root { path: PathBuf, source: io::Error },

    #[error("cannot access {path:?}: {source}")]
    Access { path: PathBuf, source: io::Error },
}

impl ResolveError {
    fn source_kind(&self) -> io::ErrorKind {
        match self {
            ResolveError::Root { source, .. } | ResolveError::Access { source, .. } => {
                source.kind()
            }
        }
    }

    fn is_symlink_loop(&self) -> bool {
        match self {
            ResolveError::Root { source, .. } | ResolveError::Access { source, .. } => {
                ELOOP.is_some() && source.raw_os_error() == ELOOP
            }
        }
    }

    /// Status to report: permission problems, symlink loops and directories
    /// where a file was expected will not go away on retry, a file vanishing
    /// between lookup and read is a plain miss, anything else may be transient.
    pub fn status(&self) -> StatusCode {
        if self.is_symlink_loop() {
            return StatusCode::PermanentFailure;
        }

        match self.source_kind() {
            io::ErrorKind::PermissionDenied | io::ErrorKind::IsADirectory => {
                StatusCode::PermanentFailure
            }
            io::ErrorKind::NotFound => StatusCode::NotFound,
            _ => StatusCode::TemporaryFailure,
        }
    }

    pub fn response(&self) -> Response {
        let message = match self.status() {
            StatusCode::NotFound => "Not found",
            StatusCode::PermanentFailure => "Resource is not accessible",
            _ => "Resource temporarily unavailable",
        };
        Response::new(self.status(), message)
    }
}

/// Resolves request paths against one read-only content root.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
}

impl Resolver {
    /// Creates a resolver for `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let path = root.as_ref();
        let root = std::fs::canonicalize(path).map_err(|source| ResolveError::Root {
            path: path.to_path_buf(),
            source,
        })?;

        if !root.is_dir() {
            return Err(ResolveError::Root {
                path: root,
                source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            });
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn resolve(&self, request_path: &str) -> Result<ResolvedResource, ResolveError> {
        let Some(relative) = confine(request_path) else {
            tracing::debug!(path = request_path, "Rejected path escaping the content root");
            return Ok(ResolvedResource::Absent);
        };

        match self.metadata(&relative).await? {
            Some(meta) if meta.is_dir() => {
                let index = relative.join(INDEX_FILE);
                match self.metadata(&index).await? {
                    Some(meta) if !meta.is_dir() => self.within_root(index).await,
                    _ => Ok(ResolvedResource::Absent),
                }
            }

            Some(_) => self.within_root(relative).await,

            None => {
                if relative.as_os_str().is_empty() {
                    return Ok(ResolvedResource::Absent);
                }

                let mut gemtext = relative.into_os_string();
                gemtext.push(GEMTEXT_EXTENSION);
                let gemtext = PathBuf::from(gemtext);

                match self.metadata(&gemtext).await? {
                    Some(meta) if !meta.is_dir() => self.within_root(gemtext).await,
                    _ => Ok(ResolvedResource::Absent),
                }
            }
        }
    }

    /// Reads a resolved resource in full.
    pub async fn read(&self, relative: &Path) -> Result<Vec<u8>, ResolveError> {
        let full = self.root.join(relative);
        tokio::fs::read(&full)
            .await
            .map_err(|source| ResolveError::Access { path: full, source })
    }

    async fn metadata(&self, relative: &Path) -> Result<Option<Metadata>, ResolveError> {
        let full = self.root.join(relative);
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if is_absent(&e) => Ok(None),
            Err(source) => Err(ResolveError::Access { path: full, source }),
        }
    }

    // Symlinks may point anywhere; only accept targets still under the root.
    async fn within_root(&self, relative: PathBuf) -> Result<ResolvedResource, ResolveError> {
        let full = self.root.join(&relative);
        let real = match tokio::fs::canonicalize(&full).await {
            Ok(real) => real,
            Err(e) if is_absent(&e) => return Ok(ResolvedResource::Absent),
            Err(source) => return Err(ResolveError::Access { path: full, source }),
        };

        if real.starts_with(&self.root) {
            Ok(ResolvedResource::Found(relative))
        } else {
            tracing::warn!(path = ?relative, resolved = ?real, "Symlink points outside the content root");
            Ok(ResolvedResource::Absent)
        }
    }
}

/// Resolves `request_path` against `root` with a one-off [`Resolver`].
pub async fn resolve(root: &Path, request_path: &str) -> Result<ResolvedResource, ResolveError> {
    Resolver::new(root)?.resolve(request_path).await
}

fn is_absent(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Turns a request path into a relative path, or `None` if it tries to
/// climb out of the root.
fn confine(request_path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();

    for segment in request_path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains(['\0', '\\']) => return None,
            s => relative.push(s),
        }
    }

    Some(relative)
}
