//! Project-root configuration (`pyproject.toml`, `[tool.exportsync]` table).

use std::{
    io,
    path::{Path, PathBuf},
};

use regex::Regex;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use thiserror::Error;

const MARKER_FILE: &str = "pyproject.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, #[source] io::Error),

    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid exclude pattern {0:?}: {1}")]
    Pattern(String, #[source] regex::Error),
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: ToolTable,
}

#[derive(Debug, Default, Deserialize)]
struct ToolTable {
    #[serde(default)]
    exportsync: RawConfig,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    /// Root-relative path-prefix patterns (regex, implicitly anchored at the
    /// start of the path).
    #[serde(default)]
    exclude: Vec<String>,

    /// Top-level module names taken out of resolution entirely.
    #[serde(default)]
    exclude_toplevel_module: Vec<String>,
}

/// Exclusion predicates supplied to the resolver and reconciler.
#[derive(Debug, Default)]
pub struct Config {
    exclude: Vec<Regex>,
    exclude_toplevel: FxHashSet<String>,
}

impl Config {
    /// Locates the project root for `scan_dir` and loads its configuration.
    ///
    /// The root is the *topmost* ancestor of the scan directory (the scan
    /// directory included) that carries a `pyproject.toml`; with no marker
    /// anywhere, the scan directory itself is the root.
    pub fn discover(scan_dir: &Path) -> Result<(PathBuf, Config), ConfigError> {
        let mut root = scan_dir.to_path_buf();
        for dir in scan_dir.ancestors() {
            if dir.join(MARKER_FILE).is_file() {
                root = dir.to_path_buf();
            }
        }

        let marker = root.join(MARKER_FILE);
        let config = if marker.is_file() {
            Self::from_marker_file(&marker)?
        } else {
            Config::default()
        };
        Ok((root, config))
    }

    pub fn from_marker_file(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let project: PyProject =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        Self::from_raw(project.tool.exportsync)
    }

    fn from_raw(raw: RawConfig) -> Result<Config, ConfigError> {
        let exclude = raw
            .exclude
            .into_iter()
            .map(|pat| {
                Regex::new(&format!("^{pat}")).map_err(|e| ConfigError::Pattern(pat, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Config {
            exclude,
            exclude_toplevel: raw.exclude_toplevel_module.into_iter().collect(),
        })
    }

    /// Whether a root-relative path matches any exclusion pattern.
    pub fn is_excluded(&self, rel_path: &Path) -> bool {
        let text = rel_path.to_string_lossy();
        self.exclude.iter().any(|pat| pat.is_match(&text))
    }

    pub fn excludes_toplevel(&self, module: &str) -> bool {
        self.exclude_toplevel.contains(module)
    }

    #[cfg(test)]
    pub fn for_tests(exclude: &[&str], exclude_toplevel: &[&str]) -> Config {
        Self::from_raw(RawConfig {
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
            exclude_toplevel_module: exclude_toplevel.iter().map(|s| s.to_string()).collect(),
        })
        .expect("test patterns must be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_excludes_nothing() {
        let config = Config::default();
        assert!(!config.is_excluded(Path::new("pkg/mod.py")));
        assert!(!config.excludes_toplevel("pkg"));
    }

    #[test]
    fn parses_tool_table() {
        let raw: PyProject = toml::from_str(
            r#"
[tool.exportsync]
exclude = ["build/", "scripts/gen"]
exclude_toplevel_module = ["vendor"]
"#,
        )
        .unwrap();
        let config = Config::from_raw(raw.tool.exportsync).unwrap();

        assert!(config.is_excluded(Path::new("build/lib/x.py")));
        assert!(config.is_excluded(Path::new("scripts/genfoo.py")));
        assert!(!config.is_excluded(Path::new("src/build/x.py")));
        assert!(config.excludes_toplevel("vendor"));
    }

    #[test]
    fn missing_table_yields_default() {
        let raw: PyProject = toml::from_str("[project]\nname = \"x\"\n").unwrap();
        let config = Config::from_raw(raw.tool.exportsync).unwrap();
        assert!(!config.is_excluded(Path::new("anything.py")));
    }

    #[test]
    fn bad_pattern_is_an_error() {
        let raw = RawConfig {
            exclude: vec!["[".to_string()],
            exclude_toplevel_module: vec![],
        };
        assert!(matches!(
            Config::from_raw(raw),
            Err(ConfigError::Pattern(_, _))
        ));
    }

    #[test]
    fn discover_prefers_topmost_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::write(root.join("pyproject.toml"), "").unwrap();
        let nested = root.join("inner/deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join("inner/pyproject.toml"), "").unwrap();

        let (found, _) = Config::discover(&nested).unwrap();
        assert_eq!(found, root);
    }

    #[test]
    fn discover_without_marker_uses_scan_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let (found, _) = Config::discover(tmp.path()).unwrap();
        assert_eq!(found, tmp.path());
    }
}
