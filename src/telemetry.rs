use anyhow::{Context, Result, ensure};
use log::warn;
use std::time::Instant;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

/// Fixed, small remote asset fetched once per probe to estimate throughput.
pub const SPEED_PROBE_URL: &str =
    "https://www.google.com/images/branding/googlelogo/2x/googlelogo_light_color_92x30dp.png";

/// Placeholder shown when a probe cannot produce a number.
pub const NOT_AVAILABLE: &str = "N/A";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Time-in-state counters summed across all cores, in clock ticks since boot.
#[derive(Debug, Default, PartialEq)]
struct CpuTimes {
    user: u64,
    nice: u64,
    system: u64,
    idle: u64,
    irq: u64,
}

impl CpuTimes {
    fn busy(&self) -> u64 {
        self.user + self.nice + self.system + self.irq
    }

    /// Busy share of all accounted time, as a percentage.
    ///
    /// The counters are cumulative since boot, so this is a whole-uptime
    /// average rather than a current-load figure.
    fn usage_percent(&self) -> f64 {
        let total = self.busy() + self.idle;
        if total == 0 {
            return 0.0;
        }
        self.busy() as f64 / total as f64 * 100.0
    }
}

/// CPU utilization since boot, from the OS time-in-state counters.
#[cfg(target_os = "linux")]
pub fn cpu_percent() -> Result<f64> {
    let stat = std::fs::read_to_string("/proc/stat").context("can't read /proc/stat")?;
    Ok(parse_cpu_times(&stat)?.usage_percent())
}

#[cfg(not(target_os = "linux"))]
pub fn cpu_percent() -> Result<f64> {
    anyhow::bail!("cpu time-in-state counters are not readable on this platform")
}

/// Sum the per-core `cpuN` lines of a `/proc/stat` dump.
///
/// Only the categories the probe reports on are kept: user, nice, system,
/// idle and irq. The aggregate `cpu` line is skipped so every tick is counted
/// exactly once.
fn parse_cpu_times(stat: &str) -> Result<CpuTimes> {
    let mut times = CpuTimes::default();
    let mut cores = 0;
    for line in stat.lines() {
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else {
            continue;
        };
        if label == "cpu" || !label.starts_with("cpu") {
            continue;
        }
        let mut next = || -> Result<u64> {
            fields
                .next()
                .with_context(|| format!("{label}: truncated cpu stat line"))?
                .parse::<u64>()
                .with_context(|| format!("{label}: bad cpu stat field"))
        };
        times.user += next()?;
        times.nice += next()?;
        times.system += next()?;
        times.idle += next()?;
        let _iowait = next()?;
        times.irq += next()?;
        cores += 1;
    }
    ensure!(cores > 0, "no per-core lines in cpu stat");
    Ok(times)
}

/// One-shot RAM reading, all figures in megabytes.
#[derive(Debug, Clone, Copy)]
pub struct MemorySnapshot {
    pub total_mb: f64,
    pub used_mb: f64,
    pub free_mb: f64,
}

/// Read total and free physical memory; used is their difference.
pub fn memory_snapshot() -> MemorySnapshot {
    let sys = System::new_with_specifics(
        RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
    );
    let total_mb = sys.total_memory() as f64 / BYTES_PER_MB;
    let free_mb = sys.free_memory() as f64 / BYTES_PER_MB;
    MemorySnapshot {
        total_mb,
        used_mb: total_mb - free_mb,
        free_mb,
    }
}

/// Measure download throughput in megabits per second.
///
/// One GET of [`SPEED_PROBE_URL`], timed from just before the request to the
/// full body being in memory. Any connection error or non-200 status yields
/// `None`; the caller renders [`NOT_AVAILABLE`] instead of a number.
pub async fn network_speed_mbps(client: &reqwest::Client) -> Option<f64> {
    let started = Instant::now();
    let response = match client.get(SPEED_PROBE_URL).send().await {
        Ok(response) => response,
        Err(err) => {
            warn!("network speed probe failed: {err}");
            return None;
        }
    };
    if response.status() != reqwest::StatusCode::OK {
        warn!("network speed probe got status {}", response.status());
        return None;
    }
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(err) => {
            warn!("network speed probe lost the response body: {err}");
            return None;
        }
    };
    Some(mbps(body.len() as u64, started.elapsed().as_secs_f64()))
}

/// Megabits per second for `bytes` transferred over `seconds`.
fn mbps(bytes: u64, seconds: f64) -> f64 {
    (bytes as f64 * 8.0) / BYTES_PER_MB / seconds
}

/// Render the three-line report shown for `sys info`.
///
/// Each measurement is taken fresh and independently; a failed CPU or network
/// probe degrades to the [`NOT_AVAILABLE`] sentinel without affecting the
/// other lines.
pub async fn report(client: &reqwest::Client) -> String {
    let cpu = match cpu_percent() {
        Ok(percent) => format!("{percent:.2}%"),
        Err(err) => {
            warn!("cpu probe failed: {err}");
            NOT_AVAILABLE.to_string()
        }
    };
    let ram = memory_snapshot();
    let network = match network_speed_mbps(client).await {
        Some(speed) => format!("{speed:.2}"),
        None => NOT_AVAILABLE.to_string(),
    };
    format!(
        "\nCurrent CPU Usage: {cpu}\nCurrent RAM Usage: {used:.2} MB used / {total:.2} MB total\nCurrent Network Speed: {network} Mbps\n",
        used = ram.used_mb,
        total = ram.total_mb,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sums_per_core_lines_and_skips_the_aggregate() {
        let stat = "\
cpu  999 999 999 999 999 999 999 0 0 0
cpu0 10 2 30 400 9 5 7 0 0 0
cpu1 20 3 40 500 9 8 7 0 0 0
intr 12345 0 0
ctxt 67890
btime 1700000000
";
        let times = parse_cpu_times(stat).unwrap();
        assert_eq!(
            times,
            CpuTimes {
                user: 30,
                nice: 5,
                system: 70,
                idle: 900,
                irq: 13,
            }
        );
    }

    #[test]
    fn usage_percent_is_busy_over_busy_plus_idle() {
        let times = CpuTimes {
            user: 30,
            nice: 5,
            system: 70,
            idle: 900,
            irq: 13,
        };
        let expected = 118.0 / 1018.0 * 100.0;
        assert!((times.usage_percent() - expected).abs() < 1e-9);
    }

    #[test]
    fn usage_percent_with_no_ticks_is_zero() {
        assert_eq!(CpuTimes::default().usage_percent(), 0.0);
    }

    #[test]
    fn parse_rejects_a_truncated_core_line() {
        assert!(parse_cpu_times("cpu0 10 2 30\n").is_err());
    }

    #[test]
    fn parse_rejects_stat_without_core_lines() {
        assert!(parse_cpu_times("cpu  1 2 3 4 5 6 7 0 0 0\nintr 5\n").is_err());
    }

    #[test]
    fn mbps_is_bits_over_megabit_seconds() {
        // 1.25 MiB in one second is exactly 10 Mbps.
        assert!((mbps(1_310_720, 1.0) - 10.0).abs() < 1e-9);
        // Half the time doubles the rate.
        assert!((mbps(1_310_720, 0.5) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn memory_snapshot_used_is_total_minus_free() {
        let snapshot = memory_snapshot();
        assert!(snapshot.total_mb > 0.0);
        assert!((snapshot.used_mb - (snapshot.total_mb - snapshot.free_mb)).abs() < 0.01);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn cpu_percent_reads_a_sane_ratio() {
        let percent = cpu_percent().unwrap();
        assert!((0.0..=100.0).contains(&percent), "got {percent}");
    }
}
