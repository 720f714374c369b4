//! Content fingerprints for detecting meaningful changes between observations.
//!
//! A fingerprint is computed by serializing a value into canonical JSON and
//! hashing the bytes with SHA-256. Serialization is deterministic as long as
//! the value itself is: struct fields serialize in declaration order and all
//! maps in our resource types are [`BTreeMap`]s, so no map iteration order or
//! other non-determinism leaks into the digest. Inputs must not contain
//! timestamps or similarly volatile data.
//!
//! [`BTreeMap`]: std::collections::BTreeMap

use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use snafu::{ResultExt, Snafu};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to serialize value into canonical JSON"))]
    Serialize { source: serde_json::Error },
}

/// Number of hex characters kept in the short fingerprint form.
pub const SHORT_FORM_LENGTH: usize = 7;

/// The short (7 hex character, git-style) form of a SHA-256 content digest.
///
/// The truncation keeps stored fingerprints and diffs human-readable but
/// leaves a non-zero collision probability. That is acceptable for the
/// "avoid redundant work" signals this type backs; decisions that cannot
/// tolerate a collision must use [`full_fingerprint`] instead.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the short fingerprint of any serializable value.
pub fn fingerprint<T>(value: &T) -> Result<Fingerprint>
where
    T: Serialize + ?Sized,
{
    let mut hex = digest_hex(value)?;
    hex.truncate(SHORT_FORM_LENGTH);
    Ok(Fingerprint(hex))
}

/// Computes the full 64 character SHA-256 digest of a serializable value.
///
/// Use this over [`fingerprint`] when a fingerprint collision would corrupt a
/// decision instead of merely causing redundant work.
pub fn full_fingerprint<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    digest_hex(value)
}

/// Returns whether `current` differs from the last recorded fingerprint and
/// the pending action therefore has to run.
///
/// An absent `last_recorded` fingerprint always signals a change, covering the
/// first reconciliation of a fresh resource. Callers must persist `current`
/// only after the triggered action has been durably initiated. A crash between
/// decision and action then re-triggers the action on the next observation
/// instead of silently skipping it (at-least-once semantics).
#[must_use]
pub fn changed(current: &Fingerprint, last_recorded: Option<&Fingerprint>) -> bool {
    last_recorded.is_none_or(|last| last != current)
}

fn digest_hex<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let canonical = serde_json::to_vec(value).context(SerializeSnafu)?;
    let digest = Sha256::digest(&canonical);

    Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
}
