//! Disk capacity probes
//!
//! Best-effort host disk capacity via platform commands, behind the
//! [`DiskProbe`] trait. Probes are tried in order until one returns a
//! validated reading; every invocation runs under a hard timeout so a
//! hung command cannot stall the usage report.

use async_trait::async_trait;
use log::warn;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::ProbeError;

/// Hard ceiling on a single probe command.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Host disk capacity in bytes for the filesystem containing the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskSpace {
    pub total: u64,
    pub free: u64,
    pub available: u64,
}

/// A platform strategy for reading host disk capacity.
#[async_trait]
pub trait DiskProbe: Send + Sync {
    /// Probe label used in logs.
    fn name(&self) -> &'static str;

    /// Query capacity for the filesystem containing `path`.
    async fn probe(&self, path: &Path) -> Result<DiskSpace, ProbeError>;
}

/// Probe strategies for the current platform, in priority order.
pub fn platform_probes() -> Vec<Box<dyn DiskProbe>> {
    #[cfg(unix)]
    {
        vec![Box::new(DfBytesProbe), Box::new(DfKibiProbe)]
    }
    #[cfg(windows)]
    {
        vec![Box::new(WmicProbe), Box::new(FsutilProbe)]
    }
    #[cfg(not(any(unix, windows)))]
    {
        Vec::new()
    }
}

/// Try each probe in order; the first validated reading wins. Failures
/// are logged and the next strategy gets its turn.
pub async fn query(probes: &[Box<dyn DiskProbe>], path: &Path) -> Option<DiskSpace> {
    for probe in probes {
        match probe.probe(path).await {
            Ok(space) => return Some(space),
            Err(e) => warn!("Disk probe {} failed: {}", probe.name(), e),
        }
    }
    None
}

/// Run a probe command under the hard timeout and return its stdout.
async fn run_probe_command(program: &str, args: &[&str]) -> Result<String, ProbeError> {
    let output = timeout(PROBE_TIMEOUT, Command::new(program).args(args).output())
        .await
        .map_err(|_| ProbeError::Timeout)?
        .map_err(ProbeError::CommandFailed)?;

    if !output.status.success() {
        return Err(ProbeError::BadExit(format!(
            "{} exited with {}",
            program, output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Reject readings that cannot be right before trusting them.
fn validated(total: u64, free: u64, available: u64) -> Result<DiskSpace, ProbeError> {
    if total == 0 || free == 0 || free > total {
        return Err(ProbeError::Implausible { total, free });
    }
    Ok(DiskSpace {
        total,
        free,
        available,
    })
}

// ── POSIX probes ─────────────────────────────────────────────────────

/// Primary POSIX strategy: `df -B1`, values already in bytes (GNU df).
#[cfg(unix)]
struct DfBytesProbe;

#[cfg(unix)]
#[async_trait]
impl DiskProbe for DfBytesProbe {
    fn name(&self) -> &'static str {
        "df -B1"
    }

    async fn probe(&self, path: &Path) -> Result<DiskSpace, ProbeError> {
        let path = path.to_string_lossy();
        let output = run_probe_command("df", &["-B1", path.as_ref()]).await?;
        let (total, available) = parse_df_fields(&output)?;
        validated(total, available, available)
    }
}

/// Fallback POSIX strategy for df builds without `-B1`: `df -k`,
/// kibibytes normalized to bytes.
#[cfg(unix)]
struct DfKibiProbe;

#[cfg(unix)]
#[async_trait]
impl DiskProbe for DfKibiProbe {
    fn name(&self) -> &'static str {
        "df -k"
    }

    async fn probe(&self, path: &Path) -> Result<DiskSpace, ProbeError> {
        let path = path.to_string_lossy();
        let output = run_probe_command("df", &["-k", path.as_ref()]).await?;
        let (total_kib, available_kib) = parse_df_fields(&output)?;
        let total = total_kib.saturating_mul(1024);
        let available = available_kib.saturating_mul(1024);
        validated(total, available, available)
    }
}

/// Parse a `df` body: a header line, then one data line per filesystem.
/// The last line is the mount covering the queried path. Expected
/// columns: filesystem, total, used, available, use%, mountpoint.
#[cfg(unix)]
fn parse_df_fields(output: &str) -> Result<(u64, u64), ProbeError> {
    let line = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("Filesystem"))
        .next_back()
        .ok_or_else(|| ProbeError::ParseFailed("empty df output".to_string()))?;

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(ProbeError::ParseFailed(format!("short df line: {}", line)));
    }

    let total = fields[1]
        .parse()
        .map_err(|_| ProbeError::ParseFailed(format!("bad total in: {}", line)))?;
    let available = fields[3]
        .parse()
        .map_err(|_| ProbeError::ParseFailed(format!("bad available in: {}", line)))?;

    Ok((total, available))
}

// ── Windows probes ───────────────────────────────────────────────────

/// Primary Windows strategy: `wmic logicaldisk`, reporting the drive's
/// Size and FreeSpace in bytes.
#[cfg(windows)]
struct WmicProbe;

#[cfg(windows)]
#[async_trait]
impl DiskProbe for WmicProbe {
    fn name(&self) -> &'static str {
        "wmic logicaldisk"
    }

    async fn probe(&self, path: &Path) -> Result<DiskSpace, ProbeError> {
        let letter = drive_letter(path).ok_or_else(|| {
            ProbeError::ParseFailed(format!("no drive letter in {}", path.display()))
        })?;

        let clause = format!("DeviceID='{}:'", letter);
        let output = run_probe_command(
            "wmic",
            &[
                "logicaldisk",
                "where",
                clause.as_str(),
                "get",
                "Size,FreeSpace",
                "/format:value",
            ],
        )
        .await?;

        let total = parse_keyed_value(&output, "Size=")?;
        let free = parse_keyed_value(&output, "FreeSpace=")?;
        validated(total, free, free)
    }
}

/// Fallback Windows strategy: `fsutil volume diskfree`.
#[cfg(windows)]
struct FsutilProbe;

#[cfg(windows)]
#[async_trait]
impl DiskProbe for FsutilProbe {
    fn name(&self) -> &'static str {
        "fsutil diskfree"
    }

    async fn probe(&self, path: &Path) -> Result<DiskSpace, ProbeError> {
        let path = path.to_string_lossy();
        let output = run_probe_command("fsutil", &["volume", "diskfree", path.as_ref()]).await?;

        let free = parse_labeled_bytes(&output, "Total free bytes")?;
        let total = parse_labeled_bytes(&output, "Total bytes")?;
        validated(total, free, free)
    }
}

#[cfg(windows)]
fn drive_letter(path: &Path) -> Option<char> {
    use std::path::{Component, Prefix};

    match path.components().next() {
        Some(Component::Prefix(prefix)) => match prefix.kind() {
            Prefix::Disk(letter) | Prefix::VerbatimDisk(letter) => Some(letter as char),
            _ => None,
        },
        _ => None,
    }
}

/// Parse `Key=123` lines from wmic `/format:value` output.
#[cfg(windows)]
fn parse_keyed_value(output: &str, key: &str) -> Result<u64, ProbeError> {
    output
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(key))
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| ProbeError::ParseFailed(format!("missing {} in wmic output", key)))
}

/// Parse `Label : 123 (1.2 GB)` lines from fsutil output. Newer Windows
/// builds insert thousands separators in the byte count.
#[cfg(windows)]
fn parse_labeled_bytes(output: &str, label: &str) -> Result<u64, ProbeError> {
    output
        .lines()
        .filter(|line| line.trim_start().starts_with(label))
        .find_map(|line| {
            let value = line.split(':').nth(1)?;
            let digits: String = value
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == ',')
                .filter(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        })
        .ok_or_else(|| ProbeError::ParseFailed(format!("missing {} in fsutil output", label)))
}
