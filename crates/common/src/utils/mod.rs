use crate::error::ErrorContext;
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("file not found: {context}")]
    NotFound { context: ErrorContext },
    #[error("I/O error: {context}")]
    Io {
        context: ErrorContext,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    #[track_caller]
    pub fn not_found(path: impl AsRef<str>) -> Self {
        Self::NotFound {
            context: ErrorContext::new(path.as_ref().to_string()),
        }
    }

    #[track_caller]
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: ErrorContext::new(message.into()),
            source,
        }
    }
}

static SEGMENT_SPACE_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" .*$").expect("segment space pattern"));

/// Locate `file_path` on disk and return it as a string path.
///
/// Network paths (`hdfs://`) are returned untouched. Local paths are tried
/// as given, then under the current directory, then as a bare filename;
/// anything else is an error. With `abs_path` the result is absolutized.
pub fn resolve_file(file_path: &str, abs_path: bool) -> Result<String, ResolveError> {
    if file_path.to_lowercase().starts_with("hdfs://") {
        // the engine resolves these itself
        return Ok(file_path.to_string());
    }

    let mut resolved = PathBuf::from(file_path);
    if !resolved.exists() {
        let under_cwd = env::current_dir()
            .map_err(|e| ResolveError::io("current directory is not accessible", e))?
            .join(file_path);
        let bare = Path::new(file_path).file_name().map(PathBuf::from);
        if under_cwd.exists() {
            resolved = under_cwd;
        } else if let Some(bare) = bare.filter(|name| name.exists()) {
            resolved = bare;
        } else {
            return Err(ResolveError::not_found(file_path));
        }
    }

    if abs_path {
        resolved = std::path::absolute(&resolved)
            .map_err(|e| ResolveError::io(format!("cannot absolutize {}", resolved.display()), e))?;
    }

    let resolved = resolved.to_string_lossy().into_owned();
    if resolved.contains(' ') {
        // Spark rejects paths containing spaces. Each segment is truncated at
        // its first space; a link from the truncated path to the real one
        // must exist on disk.
        return Ok(strip_segment_spaces(&resolved));
    }
    Ok(resolved)
}

/// Resolve a comma-separated list of paths, dropping empty entries.
pub fn resolve_files(files_path: &str, abs_path: bool) -> Result<String, ResolveError> {
    let resolved: Vec<String> = files_path
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| resolve_file(f, abs_path))
        .collect::<Result<_, _>>()?;
    Ok(resolved.join(","))
}

fn strip_segment_spaces(path: &str) -> String {
    path.split('/')
        .map(|part| SEGMENT_SPACE_TAIL.replace(part, "").into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
