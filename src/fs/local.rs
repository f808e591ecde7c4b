//! Local disk access through `tokio::fs`

use super::{EntryKind, FileSystem};
use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::Path;

/// [`FileSystem`] backed by the local disk
///
/// Directory entries are sorted by name, so crawl results are
/// deterministic regardless of the order the OS returns them in.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl FileSystem for LocalFs {
    async fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        let meta = tokio::fs::metadata(path).await?;
        Ok(EntryKind::from_metadata(&meta))
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let mut dir = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            names.push(entry.file_name());
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_stat_and_sorted_listing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("c")).unwrap();

        let fs = LocalFs;
        assert_eq!(fs.stat(dir.path()).await.unwrap(), EntryKind::Directory);
        assert_eq!(
            fs.stat(&dir.path().join("a.txt")).await.unwrap(),
            EntryKind::File
        );

        let names = fs.read_dir(dir.path()).await.unwrap();
        assert_eq!(names, vec!["a.txt", "b.txt", "c"]);
    }

    #[tokio::test]
    async fn test_missing_path() {
        let dir = tempdir().unwrap();
        let err = LocalFs.stat(&dir.path().join("nope")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
