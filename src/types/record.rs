use serde::{Deserialize, Serialize};

/// Descriptive metadata written next to a signature file.
///
/// Never consulted by verification, which only needs the payload, the
/// public key and the signature bytes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    /// Base name of the signed artifact
    #[serde(rename = "original_file")]
    pub original_artifact_name: String,
    /// Base name of the signature file
    #[serde(rename = "signature_file")]
    pub signature_artifact_name: String,
    /// ISO 8601 timestamp when the signature was persisted
    #[serde(rename = "creation_time")]
    pub created_at: String,
    /// Optional label identifying who created the signature
    #[serde(default)]
    pub creator: String,
}
