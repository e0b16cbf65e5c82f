use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

/// Fixed settings for the monitor. Nothing here is read from disk or the
/// command line; the struct exists so every component gets its values
/// explicitly.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub i2c_bus: PathBuf,
    pub i2c_address: u8,
    pub font_path: PathBuf,
    pub font_size: f32,
    /// Vertical origin of each of the three lines on the panel.
    pub line_offsets: [i32; 3],
    pub thermal_path: PathBuf,
    /// Address used to discover the routed local IP. No packet is sent.
    pub ip_probe: SocketAddr,
    pub disk_mount: PathBuf,
    pub cpu_sample: Duration,
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            i2c_bus: PathBuf::from("/dev/i2c-1"),
            i2c_address: 0x3C,
            font_path: PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf"),
            font_size: 12.0,
            line_offsets: [0, 18, 36],
            thermal_path: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            ip_probe: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(8, 8, 8, 8), 80)),
            disk_mount: PathBuf::from("/"),
            cpu_sample: Duration::from_secs(1),
            interval: Duration::from_secs(5),
        }
    }
}
