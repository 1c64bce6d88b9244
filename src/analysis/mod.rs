//! The analysis pass: an immutable tree snapshot, the module-reference
//! resolver, the per-file usage collector, the run-scoped aggregator, and the
//! export-list reconciler, driven end to end by [`run`].

mod aggregator;
mod collector;
mod reconciler;
mod resolver;
mod run;
mod tree;

pub use aggregator::Aggregator;
pub use collector::{Collector, FileUsage};
pub use reconciler::{find_export_list, EditorHook, ExportListError, ReconcileOutcome, Reconciler};
pub use resolver::Resolver;
pub use run::{run, RunError, RunOptions, RunOutcome};
pub use tree::{DirEntries, TreeSnapshot, INIT_FILE};
