//! Plot sample sinks for ramp-up runs
//!
//! Each analysis run at load level `x` appends one `<x> <y>` point per stream
//! (deviance, deviance_percentage, mean, sum) so repeated runs build a
//! gnuplot-ready curve.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Destination for `(x, y)` samples of named streams
pub trait PlotSink {
    fn emit_sample(&self, stream: &str, x: f64, y: f64) -> io::Result<()>;
}

/// Appends `<x> <y>` lines to `<dir>/<stream>.plot`
#[derive(Debug, Clone)]
pub struct GnuplotDir {
    dir: PathBuf,
}

impl GnuplotDir {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn stream_path(&self, stream: &str) -> PathBuf {
        self.dir.join(format!("{}.plot", stream))
    }
}

impl PlotSink for GnuplotDir {
    fn emit_sample(&self, stream: &str, x: f64, y: f64) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.stream_path(stream))?;
        writeln!(file, "{} {}", x, y)
    }
}

/// Keeps samples in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    samples: Mutex<Vec<(String, f64, f64)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<(String, f64, f64)> {
        self.samples
            .lock()
            .map(|samples| samples.clone())
            .unwrap_or_default()
    }
}

impl PlotSink for MemorySink {
    fn emit_sample(&self, stream: &str, x: f64, y: f64) -> io::Result<()> {
        let mut samples = self
            .samples
            .lock()
            .map_err(|_| io::Error::other("plot sample buffer poisoned"))?;
        samples.push((stream.to_string(), x, y));
        Ok(())
    }
}
