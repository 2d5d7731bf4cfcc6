//! Logging setup and the failure debug log
//!
//! Records at debug level and above are kept in memory for the whole run
//! so a failing command can dump them to the debug log, whatever the
//! terminal verbosity was.

use chrono::Utc;
use log::LevelFilter;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Terminal log level for `-v` count and `-q`
pub fn level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn capture(line: String) {
    match CAPTURED.lock() {
        Ok(mut captured) => captured.push(line),
        Err(poisoned) => poisoned.into_inner().push(line),
    }
}

fn captured() -> Vec<String> {
    match CAPTURED.lock() {
        Ok(captured) => captured.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Initialize env_logger, printing at `display` and capturing at debug
pub fn init(display: LevelFilter) {
    let capture_level = display.max(LevelFilter::Debug);

    env_logger::Builder::new()
        .filter_level(capture_level)
        .filter_module("rustls", LevelFilter::Info)
        .filter_module("ureq_proto", LevelFilter::Info)
        .format(move |buf, record| {
            capture(format!(
                "{} {:<5} {}: {}",
                Utc::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            ));
            if record.level() <= display {
                writeln!(buf, "{:<5} {}", record.level(), record.args())
            } else {
                Ok(())
            }
        })
        .init();
}

/// Write the failure, its cause chain, and every captured record to `path`
pub fn write_debug_log(path: &Path, command: &str, error: &anyhow::Error) -> std::io::Result<()> {
    let mut out = String::new();
    out.push_str(&format!(
        "sprinter {} debug log ({})\n",
        env!("CARGO_PKG_VERSION"),
        Utc::now().to_rfc3339()
    ));
    out.push_str(&format!("command: {command}\n\n"));
    out.push_str(&format!("error: {error:?}\n\n"));
    out.push_str("log:\n");
    for line in captured() {
        out.push_str(&line);
        out.push('\n');
    }
    fs::write(path, out)
}
