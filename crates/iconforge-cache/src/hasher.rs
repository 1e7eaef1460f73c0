//! Content fingerprints for staleness detection.

use crate::error::CacheError;
use crate::key::AssetType;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Version of the cache format. Bumping it invalidates every fingerprint and
/// discards existing manifests.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Fingerprint of the file at `path` when previewed as `asset_type`.
///
/// Format: `"<version>:<asset type>:<blake3 hex>"`. The same bytes declared
/// as a different type produce a different fingerprint.
pub fn fingerprint(asset_type: AssetType, path: &Path) -> Result<String, CacheError> {
    let file = File::open(path).map_err(|e| CacheError::io(path, e))?;
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut BufReader::new(file), &mut hasher).map_err(|e| CacheError::io(path, e))?;
    Ok(format_fingerprint(asset_type, &hasher.finalize()))
}

fn format_fingerprint(asset_type: AssetType, digest: &blake3::Hash) -> String {
    format!("{}:{}:{}", CACHE_FORMAT_VERSION, asset_type, digest.to_hex())
}
