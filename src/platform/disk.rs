//! Filesystem capacity probing for the record target and the removable volume.

use std::path::Path;

use nix::sys::statvfs::statvfs;

use crate::core::errors::{Result, WvdError};

/// Whether the target mount path is present. Presence of the directory is the
/// mount signal on this appliance; the poller owns the staleness window.
#[must_use]
pub fn is_mounted(path: &Path) -> bool {
    path.exists()
}

/// Total capacity of the filesystem behind `path`, in bytes.
pub fn total_bytes(path: &Path) -> Result<u64> {
    let stat = statvfs(path).map_err(|e| WvdError::FsStats {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    Ok(stat.blocks() as u64 * stat.fragment_size() as u64)
}

/// Bytes available to unprivileged writers on the filesystem behind `path`.
pub fn free_bytes(path: &Path) -> Result<u64> {
    let stat = statvfs(path).map_err(|e| WvdError::FsStats {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    Ok(stat.blocks_available() as u64 * stat.fragment_size() as u64)
}
