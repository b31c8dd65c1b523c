use lavadash_core::SystemInfo;
use std::path::PathBuf;
use std::time::Duration;
use sysinfo::System;

/// Returned by [`HostInfo::tail_log`] when the node's log file does not exist.
pub const LOG_NOT_FOUND: &str = "Log file not found";

/// Compiler that built this binary, captured by the build script.
pub const RUNTIME_VERSION: &str = env!("LAVADASH_RUSTC_VERSION");

const BYTES_PER_GB: f64 = 1_073_741_824.0;

/// Host metrics and the node's log tail.
#[derive(Clone, Debug)]
pub struct HostInfo {
    log_path: PathBuf,
    read_timeout: Duration,
}

impl HostInfo {
    pub fn new(log_path: impl Into<PathBuf>, read_timeout: Duration) -> Self {
        Self {
            log_path: log_path.into(),
            read_timeout,
        }
    }

    /// Point-in-time snapshot of the host (not the container).
    pub fn system_info(&self) -> SystemInfo {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();

        SystemInfo {
            os: os_family(std::env::consts::OS),
            os_release: System::kernel_version().unwrap_or_default(),
            language_runtime_version: RUNTIME_VERSION.to_string(),
            cpu_cores: system.cpus().len(),
            total_memory: format_gb(system.total_memory()),
            available_memory: format_gb(system.available_memory()),
        }
    }

    /// Last `lines` lines of the node log. Errors come back as text.
    pub async fn tail_log(&self, lines: usize) -> String {
        let read = tokio::time::timeout(self.read_timeout, tokio::fs::read(&self.log_path)).await;
        match read {
            Ok(Ok(bytes)) => last_lines(&String::from_utf8_lossy(&bytes), lines).to_string(),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => LOG_NOT_FOUND.to_string(),
            Ok(Err(e)) => {
                log::error!("Error reading logs: {}", e);
                format!("Error reading logs: {}", e)
            }
            Err(_) => {
                log::error!(
                    "Error reading logs: timed out after {:?} on {}",
                    self.read_timeout,
                    self.log_path.display()
                );
                format!("Error reading logs: timed out after {:?}", self.read_timeout)
            }
        }
    }
}

/// Kernel family name (`Linux`, `Darwin`, ...), the same thing `os_release`
/// versions.
fn os_family(os: &str) -> String {
    match os {
        "linux" => "Linux".to_string(),
        "macos" => "Darwin".to_string(),
        "windows" => "Windows".to_string(),
        "freebsd" => "FreeBSD".to_string(),
        "openbsd" => "OpenBSD".to_string(),
        "netbsd" => "NetBSD".to_string(),
        other => other.to_string(),
    }
}

fn format_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / BYTES_PER_GB)
}

/// The trailing `n` lines of `content`, line endings kept.
pub fn last_lines(content: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let body = content.strip_suffix('\n').unwrap_or(content);
    match body.rmatch_indices('\n').nth(n - 1) {
        Some((idx, _)) => &content[idx + 1..],
        None => content,
    }
}
