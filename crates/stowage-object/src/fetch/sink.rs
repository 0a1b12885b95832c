//! Atomic destination files.
//!
//! Bytes are written to a temporary file next to the destination and renamed
//! over it only once everything was written and synced. Dropping a
//! [`Destination`] without [`commit`](Destination::commit) removes the
//! temporary file and leaves the destination untouched.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::types::{Error, Result, base_name};

/// Resolves the file a retrieval of `key` writes to.
///
/// A `path` that is an existing directory, or ends in `/`, gets the key's
/// base name appended. Missing parent directories are created.
pub(crate) async fn resolve_destination(path: &Path, key: &str) -> Result<PathBuf> {
    let names_directory = path.as_os_str().to_string_lossy().ends_with(['/', '\\'])
        || tokio::fs::metadata(path)
            .await
            .is_ok_and(|meta| meta.is_dir());

    let resolved = if names_directory {
        let name = base_name(key);
        if name.is_empty() {
            return Err(Error::invalid_request(format!(
                "key '{key}' has no file name to write into '{}'",
                path.display()
            )));
        }
        path.join(name)
    } else {
        path.to_path_buf()
    };

    if let Some(parent) = resolved.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io(parent, e))?;
    }
    Ok(resolved)
}

/// Pending write to a destination file.
pub(crate) struct Destination {
    path: PathBuf,
    temp: NamedTempFile,
    file: tokio::fs::File,
    written: u64,
}

impl Destination {
    /// Creates a temporary file in the directory of `path`.
    ///
    /// File creation runs on the blocking pool.
    pub async fn create(path: PathBuf) -> Result<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let parent = dir.clone();
        let (temp, file) = blocking(&dir, move || {
            let temp = tempfile::Builder::new()
                .prefix(".stowage-")
                .suffix(".part")
                .tempfile_in(&parent)
                .map_err(|e| Error::io(&parent, e))?;
            let file = temp.reopen().map_err(|e| Error::io(temp.path(), e))?;
            Ok((temp, file))
        })
        .await?;

        Ok(Self {
            path,
            temp,
            file: tokio::fs::File::from_std(file),
            written: 0,
        })
    }

    /// Appends `chunk`.
    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| Error::io(&self.path, e))?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Syncs the data and renames the file over the destination.
    ///
    /// Returns the final path and the number of bytes written.
    pub async fn commit(self) -> Result<(PathBuf, u64)> {
        let Self {
            path,
            temp,
            mut file,
            written,
        } = self;

        file.flush().await.map_err(|e| Error::io(&path, e))?;
        file.sync_all().await.map_err(|e| Error::io(&path, e))?;
        drop(file);

        let target = path.clone();
        blocking(&path, move || {
            temp.persist(&target)
                .map(drop)
                .map_err(|e| Error::io(&target, e.error))
        })
        .await?;
        Ok((path, written))
    }
}

/// Runs blocking file-system work off the async runtime.
async fn blocking<T, F>(path: &Path, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::io(path, std::io::Error::other(e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commit_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, b"old").unwrap();

        let mut dest = Destination::create(path.clone()).await.unwrap();
        dest.write(b"new ").await.unwrap();
        dest.write(b"content").await.unwrap();
        let (written_to, bytes) = dest.commit().await.unwrap();

        assert_eq!(written_to, path);
        assert_eq!(bytes, 11);
        assert_eq!(std::fs::read(&path).unwrap(), b"new content");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn dropped_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let mut dest = Destination::create(path.clone()).await.unwrap();
        dest.write(b"partial").await.unwrap();
        drop(dest);

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn directory_destinations_get_base_name() {
        let dir = tempfile::tempdir().unwrap();

        let resolved = resolve_destination(dir.path(), "a/b/report.csv").await.unwrap();
        assert_eq!(resolved, dir.path().join("report.csv"));

        let missing = format!("{}/new/", dir.path().display());
        let resolved = resolve_destination(Path::new(&missing), "x.txt").await.unwrap();
        assert_eq!(resolved, dir.path().join("new").join("x.txt"));
        assert!(dir.path().join("new").is_dir());

        let file = dir.path().join("deep/er/file.bin");
        let resolved = resolve_destination(&file, "ignored.bin").await.unwrap();
        assert_eq!(resolved, file);
        assert!(dir.path().join("deep/er").is_dir());
    }
}
