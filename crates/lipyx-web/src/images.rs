//! Output directory and sequential file names for depictions.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out `molecule_<n>.png` paths, `n` counting from 1 for the life of
/// the process. Safe to share across request threads.
#[derive(Debug)]
pub struct ImageStore {
    dir: PathBuf,
    counter: AtomicU64,
}

impl ImageStore {
    /// Create `dir` if needed and resolve it to an absolute path.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.canonicalize()?,
            counter: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserve the next file name. Every call returns a distinct path.
    pub fn next_path(&self) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        self.dir.join(format!("molecule_{n}.png"))
    }

    /// How many names have been handed out.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn creates_directory_and_counts_from_one() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::open(tmp.path().join("images")).unwrap();
        assert!(store.dir().is_dir());
        assert!(store.dir().is_absolute());

        assert_eq!(store.next_path(), store.dir().join("molecule_1.png"));
        assert_eq!(store.next_path(), store.dir().join("molecule_2.png"));
        assert_eq!(store.issued(), 2);
    }

    #[test]
    fn concurrent_callers_get_distinct_names() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(ImageStore::open(tmp.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || (0..50).map(|_| store.next_path()).collect::<Vec<_>>())
            })
            .collect();
        let names: HashSet<PathBuf> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(names.len(), 400);
        assert_eq!(store.issued(), 400);
    }
}
