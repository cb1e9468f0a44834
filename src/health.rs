//! System health snapshots for the `health-monitor` binary.
//!
//! Sampling goes through `sysinfo`; threshold checks and report formatting are
//! plain functions over [`HealthSnapshot`] so they can be tested without a host.

use std::fmt;
use std::path::Path;
use std::thread;

use chrono::NaiveTime;
use sysinfo::{Components, Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};

use crate::config::HealthConfig;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum CpuTemperature {
    Celsius(f32),
    NoSensor,
}

impl fmt::Display for CpuTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuTemperature::Celsius(c) => write!(f, "{:.1}°C", c),
            CpuTemperature::NoSensor => write!(f, "No CPU sensor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthSnapshot {
    pub cpu_temperature: CpuTemperature,
    pub cpu_usage_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub disk_used_bytes: u64,
    pub disk_total_bytes: u64,
}

impl HealthSnapshot {
    pub fn memory_percent(&self) -> f32 {
        percent(self.memory_used_bytes, self.memory_total_bytes)
    }

    pub fn disk_percent(&self) -> f32 {
        percent(self.disk_used_bytes, self.disk_total_bytes)
    }
}

fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthWarning {
    CpuHot,
    HighCpuUsage,
    LowMemory,
}

impl fmt::Display for HealthWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            HealthWarning::CpuHot => "CPU running hot",
            HealthWarning::HighCpuUsage => "High CPU usage",
            HealthWarning::LowMemory => "Low memory",
        };
        write!(f, "{}", text)
    }
}

/// Warnings for readings strictly above their thresholds.
pub fn warnings(snapshot: &HealthSnapshot, config: &HealthConfig) -> Vec<HealthWarning> {
    let mut found = Vec::new();
    if let CpuTemperature::Celsius(c) = snapshot.cpu_temperature {
        if c > config.cpu_temp_warn_c {
            found.push(HealthWarning::CpuHot);
        }
    }
    if snapshot.cpu_usage_percent > config.cpu_usage_warn_percent {
        found.push(HealthWarning::HighCpuUsage);
    }
    if snapshot.memory_percent() > config.memory_warn_percent {
        found.push(HealthWarning::LowMemory);
    }
    found
}

/// Render one report block, warnings included.
pub fn format_report(snapshot: &HealthSnapshot, time: NaiveTime, config: &HealthConfig) -> String {
    let rule = "=".repeat(50);
    let mut lines = vec![
        rule.clone(),
        "RASPBERRY PI HEALTH MONITOR".to_string(),
        rule,
        format!("⏰ Time: {}", time.format("%H:%M:%S")),
        format!("🌡️  CPU Temperature: {}", snapshot.cpu_temperature),
        format!("⚡ CPU Usage: {:.1}%", snapshot.cpu_usage_percent),
        format!(
            "🧠 Memory Usage: {:.1}% ({}MB used)",
            snapshot.memory_percent(),
            snapshot.memory_used_bytes / MIB
        ),
        format!(
            "💾 Disk Usage: {:.1}% ({}GB used)",
            snapshot.disk_percent(),
            snapshot.disk_used_bytes / GIB
        ),
    ];
    lines.extend(warnings(snapshot, config).iter().map(|w| w.to_string()));
    lines.join("\n")
}

/// Live metric source.
pub struct HealthSampler {
    system: System,
    sensor_label: String,
    disk_mount: String,
}

impl HealthSampler {
    pub fn new(config: &HealthConfig) -> Self {
        Self {
            system: System::new(),
            sensor_label: config.sensor_label.clone(),
            disk_mount: config.disk_mount.clone(),
        }
    }

    /// Take a snapshot. Blocks for the CPU measurement window (about a second).
    pub fn sample(&mut self) -> HealthSnapshot {
        self.system.refresh_cpu();
        thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL.max(std::time::Duration::from_secs(1)));
        self.system.refresh_cpu();
        self.system.refresh_memory();

        let (disk_used_bytes, disk_total_bytes) = self.disk_usage();

        HealthSnapshot {
            cpu_temperature: self.cpu_temperature(),
            cpu_usage_percent: self.system.global_cpu_info().cpu_usage(),
            memory_used_bytes: self.system.used_memory(),
            memory_total_bytes: self.system.total_memory(),
            disk_used_bytes,
            disk_total_bytes,
        }
    }

    fn cpu_temperature(&self) -> CpuTemperature {
        let components = Components::new_with_refreshed_list();
        let wanted = self.sensor_label.to_lowercase();
        components
            .list()
            .iter()
            .find(|c| c.label().to_lowercase().starts_with(&wanted))
            .map(|c| CpuTemperature::Celsius(c.temperature()))
            .unwrap_or(CpuTemperature::NoSensor)
    }

    fn disk_usage(&self) -> (u64, u64) {
        let disks = Disks::new_with_refreshed_list();
        let mount = Path::new(&self.disk_mount);
        match disks.list().iter().find(|d| d.mount_point() == mount) {
            Some(disk) => {
                let total = disk.total_space();
                (total.saturating_sub(disk.available_space()), total)
            }
            None => {
                log::warn!("No disk mounted at {:?}", mount);
                (0, 0)
            }
        }
    }
}
