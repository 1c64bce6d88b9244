use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::{log, LogLevel};

pub const INIT_FILE: &str = "__init__.py";

/// Names directly inside one directory, split by kind. Sorted, so walks and
/// diagnostics are deterministic.
#[derive(Debug, Default)]
pub struct DirEntries {
    pub files: Vec<String>,
    pub subdirs: Vec<String>,
}

/// An immutable snapshot of the project tree, captured once before any
/// resolution begins. All paths are root-relative; the filesystem is assumed
/// unchanged for the lifetime of the snapshot.
#[derive(Debug)]
pub struct TreeSnapshot {
    root: PathBuf,
    dirs: FxHashMap<PathBuf, DirEntries>,
    files: FxHashSet<PathBuf>,
}

impl TreeSnapshot {
    pub fn build(root: &Path) -> io::Result<Self> {
        let mut snapshot = TreeSnapshot {
            root: root.to_path_buf(),
            dirs: FxHashMap::default(),
            files: FxHashSet::default(),
        };
        snapshot.visit(Path::new(""))?;
        log(LogLevel::Debug, || {
            format!(
                "tree snapshot: {} dirs, {} files under {}",
                snapshot.dirs.len(),
                snapshot.files.len(),
                snapshot.root.display()
            )
        });
        Ok(snapshot)
    }

    fn visit(&mut self, rel_dir: &Path) -> io::Result<()> {
        let mut entries = DirEntries::default();
        for entry in fs::read_dir(self.root.join(rel_dir))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type()?.is_dir() {
                entries.subdirs.push(name);
            } else {
                entries.files.push(name);
            }
        }
        entries.files.sort();
        entries.subdirs.sort();

        for name in &entries.files {
            self.files.insert(rel_dir.join(name));
        }
        let subdirs: Vec<PathBuf> = entries.subdirs.iter().map(|n| rel_dir.join(n)).collect();
        self.dirs.insert(rel_dir.to_path_buf(), entries);

        for subdir in subdirs {
            self.visit(&subdir)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_file(&self, rel_path: &Path) -> bool {
        self.files.contains(rel_path)
    }

    pub fn is_dir(&self, rel_path: &Path) -> bool {
        self.dirs.contains_key(rel_path)
    }

    pub fn entries(&self, rel_dir: &Path) -> Option<&DirEntries> {
        self.dirs.get(rel_dir)
    }

    /// Every source file in the tree, sorted for a deterministic walk order.
    pub fn py_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .files
            .iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "py"))
            .cloned()
            .collect();
        files.sort();
        files
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Creates the listed root-relative files (with empty content unless a
    /// `=text` suffix is given) and snapshots the resulting tree.
    pub(crate) fn fixture(files: &[&str]) -> (tempfile::TempDir, TreeSnapshot) {
        let tmp = tempfile::tempdir().expect("tempdir");
        for entry in files {
            let (rel, content) = match entry.split_once('=') {
                Some((rel, content)) => (rel, content),
                None => (*entry, ""),
            };
            let path = tmp.path().join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent dirs");
            }
            fs::write(path, content).expect("write fixture file");
        }
        let snapshot = TreeSnapshot::build(tmp.path()).expect("snapshot");
        (tmp, snapshot)
    }

    #[test]
    fn classifies_files_and_dirs() {
        let (_tmp, tree) = fixture(&["pkg/__init__.py", "pkg/util.py", "app.py", "README.md"]);

        assert!(tree.is_file(Path::new("app.py")));
        assert!(tree.is_file(Path::new("pkg/util.py")));
        assert!(tree.is_dir(Path::new("pkg")));
        assert!(!tree.is_dir(Path::new("app.py")));
        assert!(!tree.is_file(Path::new("missing.py")));
    }

    #[test]
    fn entries_are_sorted_per_directory() {
        let (_tmp, tree) = fixture(&["pkg/b.py", "pkg/a.py", "pkg/sub/x.py", "pkg/other/y.py"]);

        let entries = tree.entries(Path::new("pkg")).expect("pkg entries");
        assert_eq!(entries.files, vec!["a.py", "b.py"]);
        assert_eq!(entries.subdirs, vec!["other", "sub"]);
    }

    #[test]
    fn py_files_filters_and_sorts() {
        let (_tmp, tree) = fixture(&["b.py", "a.py", "notes.txt", "pkg/mod.py"]);

        assert_eq!(
            tree.py_files(),
            vec![
                PathBuf::from("a.py"),
                PathBuf::from("b.py"),
                PathBuf::from("pkg/mod.py"),
            ]
        );
    }
}
