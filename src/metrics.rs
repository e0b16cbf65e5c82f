use crate::config::MonitorConfig;
use crate::error::SensorError;
use std::ffi::CString;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tracing::debug;

/// Shown in place of the IP when no routed address could be found.
pub const IP_SENTINEL: &str = "N/A";
/// Shown in place of the CPU temperature when the sensor cannot be read.
pub const TEMP_SENTINEL: f32 = 0.0;

/// One complete set of readings, captured once per loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub ip: String,
    pub cpu_percent: f32,
    pub mem_percent: f32,
    pub disk_percent: f32,
    pub cpu_temp_c: f32,
    pub uptime: Duration,
}

/// Source of snapshots for the main loop.
pub trait Telemetry {
    fn collect(&mut self) -> Snapshot;
}

#[derive(Debug)]
pub struct MetricsCollector {
    system: System,
    ip_probe: SocketAddr,
    thermal_path: PathBuf,
    disk_mount: PathBuf,
    cpu_sample: Duration,
}

impl MetricsCollector {
    pub fn new(config: &MonitorConfig) -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::new().with_cpu_usage())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );

        MetricsCollector {
            system,
            ip_probe: config.ip_probe,
            thermal_path: config.thermal_path.clone(),
            disk_mount: config.disk_mount.clone(),
            cpu_sample: config.cpu_sample,
        }
    }

    /// Global CPU usage over the sample window. Blocks for the whole window.
    fn cpu_percent(&mut self) -> f32 {
        self.system.refresh_cpu_usage();
        thread::sleep(self.cpu_sample.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.system.refresh_cpu_usage();
        self.system.global_cpu_usage()
    }

    fn mem_percent(&mut self) -> f32 {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        let used = total.saturating_sub(self.system.available_memory());
        usage_percent(used, total)
    }
}

impl Telemetry for MetricsCollector {
    fn collect(&mut self) -> Snapshot {
        let ip = local_ip(self.ip_probe)
            .map(|addr| addr.to_string())
            .unwrap_or_else(|err| {
                debug!(sensor = "ip", %err, "using sentinel");
                IP_SENTINEL.to_string()
            });
        let cpu_percent = self.cpu_percent();
        let mem_percent = self.mem_percent();
        let disk_percent = disk_usage_percent(&self.disk_mount).unwrap_or_else(|err| {
            debug!(sensor = "disk", %err, "using sentinel");
            0.0
        });
        let cpu_temp_c = read_cpu_temp(&self.thermal_path).unwrap_or_else(|err| {
            debug!(sensor = "temp", %err, "using sentinel");
            TEMP_SENTINEL
        });

        Snapshot {
            ip,
            cpu_percent,
            mem_percent,
            disk_percent,
            cpu_temp_c,
            uptime: uptime(),
        }
    }
}

/// The local address the OS would route through to reach `probe`.
///
/// Connecting a UDP socket only selects a route; nothing is sent. Loopback is
/// never the answer unless the probe itself is local.
pub fn local_ip(probe: SocketAddr) -> Result<std::net::IpAddr, SensorError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(probe)?;
    let local = socket.local_addr()?.ip();
    if local.is_unspecified() {
        return Err(SensorError::Unroutable);
    }
    Ok(local)
}

/// Reads a thermal zone file. The kernel reports millidegrees Celsius.
pub fn read_cpu_temp(path: &Path) -> Result<f32, SensorError> {
    let content = std::fs::read_to_string(path).map_err(|e| SensorError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let content = content.trim();
    let millidegrees: f32 = content.parse().map_err(|_| SensorError::Parse {
        path: path.display().to_string(),
        detail: format!("expected millidegrees, got '{content}'"),
    })?;
    Ok(millidegrees / 1000.0)
}

/// Percentage of the filesystem at `mount` in use, as seen by unprivileged
/// users (reserved blocks are excluded from the total).
pub fn disk_usage_percent(mount: &Path) -> Result<f32, SensorError> {
    let c_path = CString::new(mount.as_os_str().as_bytes()).map_err(|_| SensorError::Parse {
        path: mount.display().to_string(),
        detail: "path contains a NUL byte".to_string(),
    })?;

    // SAFETY: statvfs is plain old data and fully written on success.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(SensorError::Io {
            path: mount.display().to_string(),
            source: io::Error::last_os_error(),
        });
    }

    let frsize = stat.f_frsize as u64;
    let used = (stat.f_blocks as u64).saturating_sub(stat.f_bfree as u64) * frsize;
    let avail = stat.f_bavail as u64 * frsize;
    Ok(usage_percent(used, used + avail))
}

fn uptime() -> Duration {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Duration::from_secs(now.saturating_sub(System::boot_time()))
}

fn usage_percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::{Ipv6Addr, SocketAddrV6};

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("oledmon_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{content}").unwrap();
        path
    }

    fn unreachable_probe() -> SocketAddr {
        // An IPv4 socket cannot connect to an IPv6 peer.
        SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::LOCALHOST, 80, 0, 0))
    }

    #[test]
    fn test_parse_millidegrees() {
        let p = write_temp("temp_41200", "41200\n");
        let temp = read_cpu_temp(&p).unwrap();
        assert!((temp - 41.2).abs() < 0.001);
        let _ = std::fs::remove_file(&p);
    }

    #[test]
    fn test_missing_thermal_file() {
        let result = read_cpu_temp(Path::new("/nonexistent/thermal_zone0/temp"));
        assert!(matches!(result, Err(SensorError::Io { .. })));
    }

    #[test]
    fn test_invalid_thermal_content() {
        let p = write_temp("temp_garbage", "hot");
        let result = read_cpu_temp(&p);
        assert!(matches!(result, Err(SensorError::Parse { .. })));
        let _ = std::fs::remove_file(&p);
    }

    #[test]
    fn test_local_ip_socket_error() {
        assert!(local_ip(unreachable_probe()).is_err());
    }

    #[test]
    fn test_local_ip_loopback_probe() {
        let probe = SocketAddr::from((Ipv4Addr::LOCALHOST, 80));
        let ip = local_ip(probe).unwrap();
        assert!(ip.is_loopback());
    }

    #[test]
    fn test_disk_usage_root() {
        let percent = disk_usage_percent(Path::new("/")).unwrap();
        assert!((0.0..=100.0).contains(&percent));
    }

    #[test]
    fn test_disk_usage_missing_mount() {
        let result = disk_usage_percent(Path::new("/nonexistent/mount"));
        assert!(matches!(result, Err(SensorError::Io { .. })));
    }

    #[test]
    fn test_usage_percent() {
        assert_eq!(usage_percent(0, 0), 0.0);
        assert_eq!(usage_percent(50, 200), 25.0);
        assert_eq!(usage_percent(200, 200), 100.0);
    }

    #[test]
    fn test_collect_substitutes_sentinels() {
        let config = MonitorConfig {
            ip_probe: unreachable_probe(),
            thermal_path: PathBuf::from("/nonexistent/thermal_zone0/temp"),
            disk_mount: PathBuf::from("/nonexistent/mount"),
            cpu_sample: Duration::ZERO,
            ..MonitorConfig::default()
        };
        let mut collector = MetricsCollector::new(&config);

        let snapshot = collector.collect();
        assert_eq!(snapshot.ip, IP_SENTINEL);
        assert_eq!(snapshot.cpu_temp_c, TEMP_SENTINEL);
        assert_eq!(snapshot.disk_percent, 0.0);
        assert!((0.0..=100.0).contains(&snapshot.mem_percent));
    }
}
