//! Picking the first readable configuration file.

use std::path::{Path, PathBuf};

/// A value together with the file it came from.
#[derive(Debug)]
pub struct Located<T> {
    /// The value.
    pub value: T,

    /// The file it was read from.
    pub path: PathBuf,
}

/// Errors returned by [`read_first`].
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    /// None of the candidates exists.
    #[error("no config file found, tried: {candidates:?}")]
    NotFound {
        /// The candidates, in the order they were tried.
        candidates: Vec<PathBuf>,
    },

    /// A candidate exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// The unreadable file.
        path: PathBuf,

        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Read the first candidate that exists.
///
/// Missing files are skipped. Any other I/O failure stops the search, so a
/// broken file is reported instead of silently falling through to the next
/// location.
pub async fn read_first<P>(candidates: &[P]) -> Result<Located<String>, LocateError>
where
    P: AsRef<Path>,
{
    for candidate in candidates.iter().map(AsRef::as_ref) {
        let error = match tokio::fs::read_to_string(candidate).await {
            Ok(value) => {
                return Ok(Located {
                    value,
                    path: candidate.to_owned(),
                });
            }
            Err(error) => error,
        };

        if error.kind() != std::io::ErrorKind::NotFound {
            return Err(LocateError::Read {
                path: candidate.to_owned(),
                source: error,
            });
        }

        tracing::debug!(path = %candidate.display(), "no config file here");
    }

    Err(LocateError::NotFound {
        candidates: candidates
            .iter()
            .map(|candidate| candidate.as_ref().to_owned())
            .collect(),
    })
}
