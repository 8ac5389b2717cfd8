//! Signature-info sidecar files.
//!
//! A record is written as `<signature>.info` next to the signature file and
//! describes it for humans; verification never reads it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, SecondsFormat};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::fsutil::write_atomic;
pub use crate::types::record::SignatureRecord;

/// Extension appended to a signature path to name its sidecar.
pub const INFO_EXTENSION: &str = "info";

impl SignatureRecord {
    /// Parse `created_at` as an ISO 8601 timestamp.
    ///
    /// Timestamps without an offset are accepted and interpreted as UTC.
    pub fn created_at_datetime(&self) -> Result<DateTime<FixedOffset>> {
        parse_timestamp(&self.created_at)
    }
}

/// Describe a signature of `original` stored at `signature`.
///
/// Only the base names of the two paths are kept; the timestamp is taken now.
pub fn build_record(
    original: impl AsRef<Path>,
    signature: impl AsRef<Path>,
    creator: &str,
) -> SignatureRecord {
    SignatureRecord {
        original_artifact_name: base_name(original.as_ref()),
        signature_artifact_name: base_name(signature.as_ref()),
        created_at: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
        creator: creator.to_string(),
    }
}

/// Sidecar path for a signature file: `doc.sig` becomes `doc.sig.info`.
pub fn info_path_for(signature_path: impl AsRef<Path>) -> PathBuf {
    let mut path = signature_path.as_ref().as_os_str().to_owned();
    path.push(".");
    path.push(INFO_EXTENSION);
    PathBuf::from(path)
}

/// Write `record` as indented JSON to `path`.
pub fn persist_record(record: &SignatureRecord, path: impl AsRef<Path>) -> Result<()> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    record.serialize(&mut ser)?;
    write_atomic(path.as_ref(), &out)?;
    log::debug!("wrote signature record {}", path.as_ref().display());
    Ok(())
}

/// Read a record written by [`persist_record`].
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be read, [`Error::Format`] if it is not a
/// record or its `creation_time` is not an ISO 8601 timestamp.
pub fn load_record(path: impl AsRef<Path>) -> Result<SignatureRecord> {
    let text = fs::read_to_string(path.as_ref())?;
    let record: SignatureRecord =
        serde_json::from_str(&text).map_err(|e| Error::Format(e.to_string()))?;
    record.created_at_datetime()?;
    Ok(record)
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|e| Error::Format(format!("invalid creation_time '{}': {}", s, e)))
}
