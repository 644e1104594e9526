//! Origin file preparation.
//!
//! Before anything reads the legacy database it is copied to `<origin>.bak`
//! and then moved to a scratch location, so the original bytes survive any
//! later failure and the new store never collides with the old file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Files produced by [`prepare_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedFiles {
    /// Untouched copy of the origin file.
    pub backup: PathBuf,
    /// Where the origin file now lives and is read from.
    pub working: PathBuf,
}

/// Returns `<origin>.bak`.
#[must_use]
pub fn backup_path(origin: &Path) -> PathBuf {
    let mut name = OsString::from(origin.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

/// Backs up `origin` and moves it to `scratch`.
///
/// Nothing is touched if `origin` is missing. A failed backup leaves the
/// origin in place. A failed move leaves a complete `.bak` copy behind.
///
/// # Errors
///
/// [`Error::SourceNotFound`], [`Error::BackupFailed`] or [`Error::PrepareFailed`].
pub async fn prepare_files(origin: &Path, scratch: &Path) -> Result<PreparedFiles> {
    match fs::metadata(origin).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(Error::SourceNotFound(origin.to_path_buf())),
    }

    let backup = backup_path(origin);
    copy_durably(origin, &backup)
        .await
        .map_err(|e| Error::BackupFailed {
            path: backup.clone(),
            reason: e.to_string(),
        })?;
    info!("Created original database backup at {}", backup.display());

    let prepare_failed = |e: std::io::Error| Error::PrepareFailed {
        path: scratch.to_path_buf(),
        reason: e.to_string(),
    };
    if let Some(parent) = scratch.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(prepare_failed)?;
    }
    fs::rename(origin, scratch).await.map_err(prepare_failed)?;
    debug!("Moved {} to {}", origin.display(), scratch.display());

    Ok(PreparedFiles {
        backup,
        working: scratch.to_path_buf(),
    })
}

async fn copy_durably(from: &Path, to: &Path) -> std::io::Result<u64> {
    let mut reader = fs::File::open(from).await?;
    let mut writer = fs::File::create(to).await?;
    let copied = tokio::io::copy(&mut reader, &mut writer).await?;
    writer.sync_all().await?;
    Ok(copied)
}
