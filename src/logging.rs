use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Path of the dashboard's own log file. Empty disables file logging.
pub const LOG_FILE_ENV: &str = "LAVADASH_LOG_FILE";

const DEFAULT_LOG_FILE: &str = "lavalink_dashboard.log";

/// Initialise `env_logger` (default level `info`, `RUST_LOG` overrides).
///
/// Records go to stderr and, unless disabled, are appended to the log file.
pub fn init() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    let mut open_error = None;
    if let Some(path) = log_file_path(std::env::var(LOG_FILE_ENV).ok()) {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(Tee {
                    primary: std::io::stderr(),
                    secondary: file,
                })));
            }
            Err(e) => open_error = Some((path, e)),
        }
    }

    builder.init();

    if let Some((path, e)) = open_error {
        log::warn!("Failed to open log file {}: {}", path.display(), e);
    }
}

fn log_file_path(configured: Option<String>) -> Option<PathBuf> {
    match configured {
        Some(v) if v.trim().is_empty() => None,
        Some(v) => Some(PathBuf::from(v)),
        None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
    }
}

/// Writes every record to both sinks. A failing secondary sink does not
/// stop console output.
struct Tee<A, B> {
    primary: A,
    secondary: B,
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = self.secondary.write_all(buf);
        self.primary.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.secondary.flush();
        self.primary.flush()
    }
}
