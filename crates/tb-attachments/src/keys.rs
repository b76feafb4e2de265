//! Storage key helpers.
//!
//! A storage key is the host's path for a file, `<prefix>/<filename>`. The
//! prefix groups every object belonging to one host entity so the group
//! can be looked up and removed in one call.

use crate::storage::{StorageError, StorageResult};

/// Split a host path into its filename and prefix components.
///
/// The final path segment becomes the filename and the remaining segments
/// the prefix; a leading separator on the prefix is dropped. Keys that
/// leave either component empty are malformed.
pub fn derive_key(host_path: &str) -> StorageResult<(String, String)> {
    let (raw_prefix, filename) = match host_path.rsplit_once('/') {
        Some(parts) => parts,
        None => ("", host_path),
    };
    let prefix = raw_prefix.trim_start_matches('/');

    if filename.is_empty() || prefix.is_empty() {
        return Err(StorageError::MalformedKey(host_path.to_string()));
    }

    Ok((filename.to_string(), prefix.to_string()))
}

/// Build a human-traceable key from a destination identifier and the
/// original filename. Separators and spaces in the name are substituted
/// so the name stays a single segment.
pub fn compose_display_key(original_filename: &str, destination_id: &str) -> String {
    let sanitized = original_filename.replace('/', "-").replace(' ', "_");
    format!("{}/{}", destination_id, sanitized)
}
