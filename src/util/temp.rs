//! Temporary-file collaborator
//!
//! Hands out collision-free paths for temporary backing files and sweeps
//! abandoned ones. Files created through here are removed by the mapped
//! allocator on close (`delete_on_close`); the sweep exists for files a
//! crashed process left behind. Nothing here runs automatically — callers
//! decide if and when to sweep.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Filename prefix of temporary backing files
pub const TEMP_FILE_PREFIX: &str = "arenakv-";

/// Filename suffix of temporary backing files
pub const TEMP_FILE_SUFFIX: &str = ".map";

/// Per-process sequence number, part of the generated filename
static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(0);

/// Create a fresh path in the system temp directory
///
/// The name combines the process id, a per-process counter and the
/// current sub-second clock, so concurrent maps in one process and maps
/// in different processes never collide. The file itself is not created
/// here; the mapped allocator does that.
pub fn create_temp_path() -> PathBuf {
    let sequence = NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);

    env::temp_dir().join(format!(
        "{}{}-{}-{:09}{}",
        TEMP_FILE_PREFIX,
        process::id(),
        sequence,
        nanos,
        TEMP_FILE_SUFFIX
    ))
}

/// Remove temporary backing files older than `max_age`
///
/// Best-effort housekeeping for files left behind by crashed processes:
/// entries that cannot be inspected or removed are skipped. Returns the
/// number of files removed.
pub fn sweep_stale(max_age: Duration) -> usize {
    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return 0;
    };

    let Ok(entries) = fs::read_dir(env::temp_dir()) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(TEMP_FILE_PREFIX) || !name.ends_with(TEMP_FILE_SUFFIX) {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        if modified >= cutoff {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::debug!("Swept stale temporary file {}", entry.path().display());
                removed += 1;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to sweep temporary file {}: {}",
                    entry.path().display(),
                    e
                );
            }
        }
    }
    removed
}
