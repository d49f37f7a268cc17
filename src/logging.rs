use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Where log lines go. The TUI owns the terminal, so it logs to a file.
#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

/// Pick the default level from the command-line switches. `RUST_LOG`
/// still wins when set.
pub fn level(verbose: bool, quiet: bool) -> LevelFilter {
    match (verbose, quiet) {
        (true, _) => LevelFilter::DEBUG,
        (false, true) => LevelFilter::ERROR,
        (false, false) => LevelFilter::WARN,
    }
}

/// Install the global subscriber. Failure to open the log file or a
/// subscriber that is already installed is reported on stderr and
/// otherwise ignored.
pub fn init(target: LogTarget<'_>, level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let result = match target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .try_init(),
                Err(e) => {
                    eprintln!("lanes: cannot open log file {}: {e}", path.display());
                    return;
                }
            }
        }
    };
    if let Err(e) = result {
        eprintln!("lanes: logging disabled: {e}");
    }
}
