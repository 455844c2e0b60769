use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::store::{SecureStore, StoreError};

/// One file per key under a private directory.
///
/// Keys are hex encoded into file names since they are usually URLs. Each
/// write goes to its own temporary file which is then renamed over the
/// previous record, so concurrent writers never share a partial file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        FileStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name = key.bytes().map(|b| format!("{:02x}", b)).collect::<String>();
        self.dir.join(name)
    }

    fn create_dir(&self) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            fs::DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(&self.dir)
        }

        #[cfg(not(unix))]
        {
            fs::create_dir_all(&self.dir)
        }
    }

    /// Writes `data` to a fresh 0600 temporary file next to the records.
    fn write_private(&self, data: &[u8]) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(data)?;
        file.as_file().sync_all()?;
        Ok(file)
    }
}

impl SecureStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::read(key, e)),
        }
    }

    fn set(&self, key: &str, data: &[u8], label: &str) -> Result<(), StoreError> {
        self.create_dir().map_err(|e| StoreError::write(key, e))?;

        let path = self.path_for(key);
        let file = self
            .write_private(data)
            .map_err(|e| StoreError::write(key, e))?;
        file.persist(&path).map_err(|e| StoreError::write(key, e))?;

        debug!("stored {} at {:?}", label, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_reads_back_records() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("keys"));

        assert!(store.get("https://example/start").unwrap().is_none());

        store
            .set("https://example/start", b"{\"a\":1}", "label")
            .unwrap();
        store
            .set("https://example/start", b"{\"a\":2}", "label")
            .unwrap();

        assert_eq!(
            store.get("https://example/start").unwrap(),
            Some(b"{\"a\":2}".to_vec())
        );
        assert!(store.get("https://example/other").unwrap().is_none());
    }

    #[test]
    fn distinct_keys_do_not_collide() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.set("a/b", b"slash", "label").unwrap();
        store.set("a_b", b"underscore", "label").unwrap();

        assert_eq!(store.get("a/b").unwrap(), Some(b"slash".to_vec()));
        assert_eq!(store.get("a_b").unwrap(), Some(b"underscore".to_vec()));
    }

    #[test]
    fn concurrent_writers_never_tear_a_record() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = std::sync::Arc::new(FileStore::new(dir.path()));
        let size = 256 * 1024;
        store.set("k", &vec![b'a'; size], "label").unwrap();

        let writers = [b'a', b'b']
            .into_iter()
            .map(|fill| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let record = vec![fill; size];
                    (0..50)
                        .filter(|_| store.set("k", &record, "label").is_err())
                        .count()
                })
            })
            .collect::<Vec<_>>();

        for _ in 0..200 {
            let data = store.get("k").unwrap().unwrap();
            assert_eq!(data.len(), size);
            assert!(data.iter().all(|&b| b == data[0]), "torn record");
        }

        for writer in writers {
            assert_eq!(writer.join().unwrap(), 0, "failed writes");
        }
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn records_are_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("keys"));
        store.set("profile", b"{}", "label").unwrap();

        let mode = fs::metadata(store.path_for("profile"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
