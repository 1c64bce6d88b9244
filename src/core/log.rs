use std::{env, sync::OnceLock};

/// Verbosity levels for the `EXPORTSYNC_LOG` env var, in increasing order of
/// noise. Unknown values fall back to `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn from_env() -> Self {
        match env::var("EXPORTSYNC_LOG").as_deref() {
            Ok("warn") => Self::Warn,
            Ok("info") => Self::Info,
            Ok("debug") => Self::Debug,
            Ok("trace") => Self::Trace,
            _ => Self::Off,
        }
    }
}

fn configured_level() -> LogLevel {
    static LEVEL: OnceLock<LogLevel> = OnceLock::new();
    *LEVEL.get_or_init(LogLevel::from_env)
}

/// Log lazily: the closure is only evaluated when the level is enabled. Use
/// this on hot paths (the parser calls this per token).
pub fn log<F>(level: LogLevel, msg: F)
where
    F: FnOnce() -> String,
{
    if level <= configured_level() && level != LogLevel::Off {
        eprintln!("[{level:?}] {}", msg());
    }
}
