//! Artifact loading and the fingerprint ledger.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use scantegrity_core::base::sha1_hex;

/// Errors raised while loading an artifact file.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The artifact file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// An append-only record of `label: sha1_hex` lines, one per loaded artifact, in load order.
///
/// Grounded on `base.py`'s module-level `FINGERPRINTS` list and `fingerprint_report`.
#[derive(Debug, Default)]
pub struct FingerprintLedger {
    entries: Vec<(String, String)>,
}

impl FingerprintLedger {
    /// An empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fingerprint for `label`.
    pub fn record(&mut self, label: impl Into<String>, sha1_hex: impl Into<String>) {
        self.entries.push((label.into(), sha1_hex.into()));
    }

    /// All recorded `(label, sha1_hex)` pairs, in load order.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Render the ledger as `label: sha1_hex` lines, one per entry, in load order.
    #[must_use]
    pub fn report(&self) -> String {
        self.entries
            .iter()
            .map(|(label, hash)| format!("{label}: {hash}\n"))
            .collect()
    }
}

/// If `contents` has no `\r` byte anywhere, rewrite every `\n` to `\r\n`.
///
/// Grounded on `base.py::file_in_dir`'s `correct_windows` fixup: the canonical release
/// fingerprints and commits against the Windows-newline form of a handful of artifacts, so a
/// checkout with bare `\n` line endings must be normalized back before hashing or the
/// fingerprint and any commitment over the raw file bytes would disagree with the reference.
fn normalize_windows_newlines(contents: &str) -> String {
    if contents.contains('\r') {
        contents.to_string()
    } else {
        contents.replace('\n', "\r\n")
    }
}

/// Load a text artifact (XML or raw), optionally applying the Windows-newline fixup, and
/// record its SHA-1 fingerprint under `label`.
///
/// # Errors
/// Returns [`ArtifactError::Io`] if `dir.join(file)` cannot be read as UTF-8 text.
pub fn load_text(
    dir: &Path,
    file: &str,
    label: &str,
    windows_style: bool,
    ledger: &mut FingerprintLedger,
) -> Result<String, ArtifactError> {
    let path = dir.join(file);
    let raw = fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;
    let contents = if windows_style {
        normalize_windows_newlines(&raw)
    } else {
        raw
    };
    ledger.record(label, sha1_hex(contents.as_bytes()));
    Ok(contents)
}
