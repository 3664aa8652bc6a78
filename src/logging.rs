use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};

/// Directory of the append-only log, relative to `$HOME`.
const LOG_DIR: &str = ".local/share/sh-syntax";

/// Install the process logger.
///
/// With `verbose`, debug records go to stderr. Otherwise warnings are
/// appended to ~/.local/share/sh-syntax/sh-syntax.log.
/// Best-effort: failures are silently ignored (stdout carries the result and
/// must never be polluted by logging).
pub fn init(verbose: bool) {
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if verbose {
        let _ = TermLogger::init(LevelFilter::Debug, config, TerminalMode::Stderr, ColorChoice::Auto);
        return;
    }

    let Some(home) = std::env::var_os("HOME") else {
        return;
    };
    let log_dir = std::path::Path::new(&home).join(LOG_DIR);
    let _ = std::fs::create_dir_all(&log_dir);

    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("sh-syntax.log"))
    else {
        return;
    };
    let _ = WriteLogger::init(LevelFilter::Warn, config, file);
}
