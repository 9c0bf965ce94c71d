// Integration test utilities
//
// Builds fleet fixture directories: one JSON fact file per machine, in the
// `[category, instance, key, value]` list format the loader reads.

#![allow(dead_code)]

use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const CPU_MODEL: &str = "Intel(R) Xeon(R) CPU E5-2650 0 @ 2.00GHz";

/// One machine's fact list under construction
#[derive(Debug, Clone, Default)]
pub struct MachineFacts {
    rows: Vec<Value>,
}

impl MachineFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fact(
        mut self,
        category: &str,
        instance: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.rows.push(json!([category, instance, key, value.into()]));
        self
    }

    /// A rack server with one disk, one NIC and two logical CPUs
    pub fn server(serial: &str, product: &str, disk_kbps: i64) -> Self {
        Self::new()
            .fact("system", "product", "serial", serial)
            .fact("system", "product", "name", product)
            .fact("firmware", "bios", "version", "P70")
            .fact("disk", "sda", "size", 1000)
            .fact("disk", "sda", "standalone_read_1M_KBps", disk_kbps)
            .fact("network", "eth0", "bandwidth", 940.5)
            .fact("cpu", "physical_0", "product", CPU_MODEL)
            .fact("cpu", "logical", "number", 2)
            .fact("cpu", "logical_0", "bogomips", 4000.12)
            .fact("cpu", "logical_1", "bogomips", 4000.12)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(&self.rows)?)?;
        Ok(())
    }
}

/// Write each machine as `<name>.json` into a fresh temporary directory
pub fn fleet_dir(machines: &[(&str, MachineFacts)]) -> Result<TempDir> {
    let dir = tempfile::tempdir()?;
    for (name, facts) in machines {
        facts.write(&dir.path().join(format!("{}.json", name)))?;
    }
    Ok(dir)
}

/// `count` identical servers; the last one reads `odd_kbps` from its disk
pub fn rack(count: usize, odd_kbps: i64) -> Result<TempDir> {
    let machines: Vec<(String, MachineFacts)> = (1..=count)
        .map(|i| {
            let serial = format!("SN{:03}", i);
            let kbps = if i == count { odd_kbps } else { 100_000 };
            (format!("host{:02}", i), MachineFacts::server(&serial, "ProLiant DL360p Gen8", kbps))
        })
        .collect();
    let borrowed: Vec<(&str, MachineFacts)> = machines
        .iter()
        .map(|(name, facts)| (name.as_str(), facts.clone()))
        .collect();
    fleet_dir(&borrowed)
}
