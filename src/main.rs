use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;

use exportsync::analysis::{run, EditorHook, RunOptions};

/// Reconcile each module's __all__ declaration with how the module is
/// actually imported across the tree.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Directory to scan; the project root is discovered from its ancestors.
    #[arg(default_value = ".")]
    scan_dir: PathBuf,

    /// Reserved; accepted for compatibility but unused.
    #[arg(short, long, default_value = ".", hide = true)]
    #[allow(dead_code)]
    out_dir: PathBuf,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let options = RunOptions {
        scan_dir: cli.scan_dir,
        editor: Some(EditorHook::from_env()),
    };
    let outcome = run(&options).context("analysis failed")?;
    if outcome.failures > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
