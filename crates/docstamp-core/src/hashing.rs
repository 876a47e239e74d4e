use std::path::Path;

use alloy::primitives::{keccak256, B256};

use crate::ports::PortError;

pub fn keccak256_bytes(data: &[u8]) -> B256 {
    keccak256(data)
}

/// Document fingerprint stamped on chain.
pub fn keccak256_file(path: impl AsRef<Path>) -> Result<B256, PortError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PortError::NotFound(path.display().to_string()),
        _ => PortError::Transport(format!("failed to read {}: {e}", path.display())),
    })?;
    tracing::debug!(path = %path.display(), size = bytes.len(), "hashing file");
    Ok(keccak256(&bytes))
}

/// Size in whole kilobytes (1 kB = 1000 bytes), rounded half up.
pub fn format_file_size(size: u64) -> String {
    format!("{} kB", size.saturating_add(500) / 1000)
}
