use crate::metrics::Snapshot;
use std::fmt;
use std::time::Duration;

/// Which set of three fields is shown. Pages cycle `Load -> Health -> Load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    /// IP, CPU, RAM
    #[default]
    Load,
    /// Disk, temperature, uptime
    Health,
}

impl Page {
    pub fn next(self) -> Self {
        match self {
            Page::Load => Page::Health,
            Page::Health => Page::Load,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Page::Load => 0,
            Page::Health => 1,
        }
    }
}

/// A labelled value. Displays as the label padded to six columns followed by
/// the value, e.g. `CPU:   12.5%`.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub label: &'static str,
    pub value: String,
}

impl Line {
    fn new(label: &'static str, value: String) -> Self {
        Line { label, value }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6}{}", self.label, self.value)
    }
}

pub fn render(snapshot: &Snapshot, page: Page) -> [Line; 3] {
    match page {
        Page::Load => [
            Line::new("IP:", snapshot.ip.clone()),
            Line::new("CPU:", format!("{:>5.1}%", snapshot.cpu_percent)),
            Line::new("RAM:", format!("{:>5.1}%", snapshot.mem_percent)),
        ],
        Page::Health => [
            Line::new("Disk:", format!("{:>5.1}%", snapshot.disk_percent)),
            Line::new("Temp:", format!("{:>5.1}°C", snapshot.cpu_temp_c)),
            Line::new("Up:", format_uptime(snapshot.uptime)),
        ],
    }
}

/// `HH:MM:SS` of the time of day the duration reaches. Whole days are
/// dropped, so 25 hours reads `01:00:00`.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs() % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
