use std::{
    fmt::{Display, Error, Formatter},
    path::Path,
};

/// A dotted module reference, e.g. `pkg.util`. Unlike a runtime module name,
/// this may be empty: `from . import x` carries no textual target and borrows
/// the referencing directory's own dotted path instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ModuleName(Vec<String>);

impl ModuleName {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        Self(segments.iter().map(|s| s.as_ref().to_string()).collect())
    }

    pub fn from_dotted(s: &str) -> Self {
        if s.is_empty() {
            return Self::default();
        }
        Self(s.split('.').map(|s| s.to_string()).collect())
    }

    /// The dotted path of a root-relative directory: `pkg/sub` becomes
    /// `pkg.sub`. The root directory itself yields the empty name.
    pub fn from_dir(dir: &Path) -> Self {
        let segments = dir
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Self(segments)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> String {
        self.0.join(".")
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn head(&self) -> Option<&str> {
        self.0.first().map(|s| s.as_str())
    }

    /// Joins an additional symbol onto the name: `pkg.util` + `thing` gives
    /// `pkg.util.thing`. Used to probe whether a from-imported symbol is
    /// itself a submodule.
    pub fn child(&self, symbol: &str) -> ModuleName {
        let mut segments = self.0.clone();
        segments.push(symbol.to_string());
        ModuleName(segments)
    }
}

impl Display for ModuleName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.as_str())
    }
}
