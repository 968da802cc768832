//! Filesystem helpers for moving finished clips.
//!
//! Work directories and the final output may live on different filesystems,
//! so a plain rename can fail with EXDEV.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Move a file from `src` to `dst`, falling back to copy-and-delete across devices.
///
/// The fallback copies to a temporary file next to `dst` and renames it into
/// place so the destination never holds a partial file.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                "Cross-device rename, copying instead: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// EXDEV is 18 on Linux and macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

async fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    let tmp_dst = dst.with_extension("part");

    fs::copy(src, &tmp_dst).await.map_err(|e| {
        tracing::error!(
            "Failed to copy {} -> {}: {}",
            src.display(),
            tmp_dst.display(),
            e
        );
        MediaError::from(e)
    })?;

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = fs::remove_file(&tmp_dst).await;
        return Err(MediaError::from(e));
    }

    // Best effort; the clip is already in place
    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!("Failed to remove {} after copy: {}", src.display(), e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_move_file_same_filesystem() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("segment_0000.mp4");
        let dst = dir.path().join("output.mp4");

        fs::write(&src, b"clip bytes").await.unwrap();

        move_file(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"clip bytes");
    }

    #[tokio::test]
    async fn test_move_file_creates_parent() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("segment_0000.mp4");
        let dst = dir.path().join("out").join("output.mp4");

        fs::write(&src, b"clip bytes").await.unwrap();

        move_file(&src, &dst).await.unwrap();

        assert!(dst.exists());
    }

    #[tokio::test]
    async fn test_move_file_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = move_file(dir.path().join("missing.mp4"), dir.path().join("out.mp4")).await;
        assert!(matches!(result, Err(MediaError::Io(_))));
    }

    #[test]
    fn test_is_cross_device_error() {
        assert!(is_cross_device_error(&std::io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device_error(&std::io::Error::from_raw_os_error(2)));
    }
}
