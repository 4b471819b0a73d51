//! Caching of merged definitions.
//!
//! Reading and merging all definition files on every startup can be costly, so a
//! [CachedDefinitionReader] stores the resulting [Container] as a versioned JSON snapshot and
//! loads it directly on subsequent reads. The snapshot contains every (interface, definition)
//! pair, so the loaded container is equal to the one which was written. There are no staleness
//! checks - the cache should be cleared with [CachedDefinitionReader::clear_cache] whenever
//! definitions change.

use crate::reader::{DefinitionReader, ReaderError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use springwire_di::container::Container;
use springwire_di::definition::Definition;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Current snapshot format version. Snapshots with other versions are ignored.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error for {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Cannot serialize definitions: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// [DefinitionReader] which reads definitions from a snapshot file, if one exists, or delegates
/// to the inner reader and writes its result to the snapshot file.
#[derive(Debug)]
pub struct CachedDefinitionReader<R: DefinitionReader> {
    inner: R,
    path: PathBuf,
    lock: Mutex<()>,
}

impl<R: DefinitionReader> CachedDefinitionReader<R> {
    pub fn new<P: Into<PathBuf>>(inner: R, path: P) -> Self {
        Self {
            inner,
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the snapshot file, forcing the next read to use the inner reader.
    pub fn clear_cache(&self) -> Result<(), CacheError> {
        let _guard = self.lock.lock();
        clear_cache(&self.path)
    }

    fn load(&self) -> Option<Container> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return None,
            Err(error) => {
                debug!(path = %self.path.display(), %error, "Cannot read definition cache");
                return None;
            }
        };

        match serde_json::from_str::<Snapshot>(&content) {
            Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => {
                info!(path = %self.path.display(), "Using cached definitions");
                Some(snapshot.into_container())
            }
            Ok(snapshot) => {
                debug!(
                    path = %self.path.display(),
                    version = snapshot.version,
                    "Ignoring definition cache with unsupported version"
                );
                None
            }
            Err(error) => {
                debug!(path = %self.path.display(), %error, "Ignoring unreadable definition cache");
                None
            }
        }
    }

    fn persist(&self, container: &Container) -> Result<(), CacheError> {
        let content = serde_json::to_string(&SnapshotRef::new(container))?;

        let io_error = |source| CacheError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        fs::write(&temp_path, content).map_err(io_error)?;
        fs::rename(&temp_path, &self.path).map_err(io_error)
    }
}

impl<R: DefinitionReader> DefinitionReader for CachedDefinitionReader<R> {
    fn read_container(&self) -> Result<Container, ReaderError> {
        if let Some(container) = self.load() {
            return Ok(container);
        }

        let _guard = self.lock.lock();

        // another thread might have written the cache in the meantime
        if let Some(container) = self.load() {
            return Ok(container);
        }

        let container = self.inner.read_container()?;

        match self.persist(&container) {
            Ok(()) => info!(path = %self.path.display(), "Written definition cache"),
            Err(error) => warn!(%error, "Cannot write definition cache"),
        }

        Ok(container)
    }
}

/// Removes the snapshot file at given path. A missing file is not an error.
pub fn clear_cache(path: &Path) -> Result<(), CacheError> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "Cleared definition cache");
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CacheError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    fn into_container(self) -> Container {
        let mut container = Container::default();
        for entry in self.entries {
            container.add_definition(entry.interface, entry.definition);
        }

        container
    }
}

#[derive(Deserialize)]
struct SnapshotEntry {
    interface: String,
    definition: Definition,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    entries: Vec<SnapshotEntryRef<'a>>,
}

impl<'a> SnapshotRef<'a> {
    fn new(container: &'a Container) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            entries: container
                .entries()
                .map(|(interface, definition)| SnapshotEntryRef {
                    interface,
                    definition,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct SnapshotEntryRef<'a> {
    interface: &'a str,
    definition: &'a Definition,
}

#[cfg(test)]
mod tests {
    use crate::cache::{CachedDefinitionReader, SNAPSHOT_VERSION};
    use crate::reader::{DefinitionReader, MockDefinitionReader, ReaderError};
    use springwire_di::container::Container;
    use springwire_di::definition::{Argument, Call, Definition};
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn create_container() -> Container {
        let mut container = Container::default();
        container.register(
            Definition::new("Logger", None)
                .unwrap()
                .with_interfaces(["LoggerInterface", "Psr\\Log"])
                .with_call(
                    Call::constructor().with_argument(
                        Argument::new("level", "scalar")
                            .with_property("value", "10")
                            .with_property("type", "int"),
                    ),
                )
                .with_call(
                    Call::new("setName")
                        .with_call_id("name")
                        .with_argument(Argument::new("name", "null")),
                ),
        );
        container.add_definition(
            "LoggerInterface",
            Definition::new("FileLogger", Some("file".to_string())).unwrap(),
        );
        container
    }

    fn inner_reader(times: usize) -> MockDefinitionReader {
        let mut reader = MockDefinitionReader::new();
        reader
            .expect_read_container()
            .times(times)
            .returning(|| Ok(create_container()));
        reader
    }

    #[test]
    fn should_write_and_read_equivalent_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("var").join("cache").join("dependencies.json");

        let writer = CachedDefinitionReader::new(inner_reader(1), &path);
        let written = writer.read_container().unwrap();
        assert!(path.is_file());

        let reader = CachedDefinitionReader::new(inner_reader(0), &path);
        assert_eq!(reader.read_container().unwrap(), written);
        assert_eq!(written, create_container());
    }

    #[test]
    fn should_bypass_inner_reader_when_cached() {
        let dir = tempfile::tempdir().unwrap();
        let reader =
            CachedDefinitionReader::new(inner_reader(1), dir.path().join("dependencies.json"));

        reader.read_container().unwrap();
        reader.read_container().unwrap();
    }

    #[test]
    fn should_ignore_invalid_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependencies.json");

        fs::write(&path, "definitely not json").unwrap();
        let reader = CachedDefinitionReader::new(inner_reader(1), &path);
        assert_eq!(reader.read_container().unwrap(), create_container());

        fs::write(
            &path,
            format!(r#"{{ "version": {}, "entries": [] }}"#, SNAPSHOT_VERSION + 1),
        )
        .unwrap();
        let reader = CachedDefinitionReader::new(inner_reader(1), &path);
        assert_eq!(reader.read_container().unwrap(), create_container());
    }

    #[test]
    fn should_return_container_when_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let reader = CachedDefinitionReader::new(inner_reader(2), blocker.join("dependencies.json"));
        assert_eq!(reader.read_container().unwrap(), create_container());
        assert_eq!(reader.read_container().unwrap(), create_container());
    }

    #[test]
    fn should_propagate_inner_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependencies.json");

        let mut inner = MockDefinitionReader::new();
        inner.expect_read_container().times(1).returning(|| {
            Err(ReaderError::Io {
                path: PathBuf::from("dependencies.json"),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            })
        });

        let reader = CachedDefinitionReader::new(inner, &path);
        assert!(matches!(
            reader.read_container().unwrap_err(),
            ReaderError::Io { .. }
        ));
        assert!(!path.exists());
    }

    #[test]
    fn should_clear_cache() {
        let dir = tempfile::tempdir().unwrap();
        let reader =
            CachedDefinitionReader::new(inner_reader(2), dir.path().join("dependencies.json"));

        reader.clear_cache().unwrap();
        reader.read_container().unwrap();
        assert!(reader.path().is_file());

        reader.clear_cache().unwrap();
        assert!(!reader.path().exists());
        reader.read_container().unwrap();
    }

    #[derive(Default)]
    struct CountingReader {
        reads: AtomicUsize,
    }

    impl DefinitionReader for CountingReader {
        fn read_container(&self) -> Result<Container, ReaderError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            Ok(create_container())
        }
    }

    #[test]
    fn should_build_once_on_concurrent_cold_reads() {
        let dir = tempfile::tempdir().unwrap();
        let reader = CachedDefinitionReader::new(
            CountingReader::default(),
            dir.path().join("dependencies.json"),
        );

        thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| reader.read_container()))
                .collect::<Vec<_>>();

            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap(), create_container());
            }
        });

        assert_eq!(reader.inner.reads.load(Ordering::SeqCst), 1);
    }
}
