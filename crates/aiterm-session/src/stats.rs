use crate::protocol::SystemInfo;

/// Latest resource snapshot reported by the server.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionStats {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub memory_used_gb: Option<u64>,
    pub memory_total_gb: Option<u64>,
    pub disk_used_gb: Option<u64>,
    pub disk_total_gb: Option<u64>,
}

impl SessionStats {
    /// Builds a snapshot when all three percentages are present.
    pub fn from_system_info(info: &SystemInfo) -> Option<Self> {
        Some(Self {
            cpu_percent: info.cpu_percent?,
            memory_percent: info.memory_percent?,
            disk_percent: info.disk_percent?,
            memory_used_gb: info.memory_used,
            memory_total_gb: info.memory_total,
            disk_used_gb: info.disk_used,
            disk_total_gb: info.disk_total,
        })
    }

    pub fn cpu_label(&self) -> String {
        format!("CPU: {:.1}%", self.cpu_percent)
    }

    pub fn memory_label(&self) -> String {
        match (self.memory_used_gb, self.memory_total_gb) {
            (Some(used), Some(total)) => {
                format!("RAM: {:.1}% ({used}/{total}GB)", self.memory_percent)
            }
            _ => format!("RAM: {:.1}%", self.memory_percent),
        }
    }

    pub fn disk_label(&self) -> String {
        match (self.disk_used_gb, self.disk_total_gb) {
            (Some(used), Some(total)) => {
                format!("Disk: {:.1}% ({used}/{total}GB)", self.disk_percent)
            }
            _ => format!("Disk: {:.1}%", self.disk_percent),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{}  {}  {}",
            self.cpu_label(),
            self.memory_label(),
            self.disk_label()
        )
    }
}
