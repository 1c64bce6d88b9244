use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::analysis::collector::FileUsage;

/// Run-scoped aggregation of per-file usage, keyed by resolved module file.
/// Built once per run and threaded through the walk; consumed by the
/// reconciler.
#[derive(Debug, Default)]
pub struct Aggregator {
    from_imports: FxHashMap<PathBuf, FxHashSet<String>>,
    attr_access: FxHashMap<PathBuf, FxHashSet<String>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, usage: FileUsage) {
        for (path, names) in usage.from_imports {
            self.from_imports.entry(path).or_default().extend(names);
        }
        for (attr, path) in usage.attr_access {
            self.attr_access.entry(path).or_default().insert(attr);
        }
    }

    /// Module files needing reconciliation: everything imported-from or
    /// attribute-accessed anywhere in the tree, sorted for stable output.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates: FxHashSet<&PathBuf> = self.from_imports.keys().collect();
        candidates.extend(self.attr_access.keys());
        let mut candidates: Vec<PathBuf> = candidates.into_iter().cloned().collect();
        candidates.sort();
        candidates
    }

    pub fn from_imports(&self, path: &Path) -> Option<&FxHashSet<String>> {
        self.from_imports.get(path)
    }

    pub fn attr_access(&self, path: &Path) -> Option<&FxHashSet<String>> {
        self.attr_access.get(path)
    }
}
