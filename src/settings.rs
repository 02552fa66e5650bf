use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_RECENT_COUNT: usize = 2;
pub const DEFAULT_MIN_DURATION_SEC: f64 = 60.0;
pub const DEFAULT_CHUNK_BYTES: usize = 4 * 1024 * 1024;
pub const MIN_LINE_CAPACITY_BYTES: usize = 20 * 1024 * 1024;
pub const MIN_TAIL_WINDOW_BYTES: u64 = 256 * 1024;

const LOG_FILE_CANDIDATES: [&str; 2] = ["ee.log", "EE.log"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    pub count: usize,
    pub min_duration_sec: f64,
    pub chunk_bytes: usize,
    pub max_line_bytes: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_RECENT_COUNT,
            min_duration_sec: DEFAULT_MIN_DURATION_SEC,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            max_line_bytes: MIN_LINE_CAPACITY_BYTES,
        }
    }
}

impl AnalysisOptions {
    pub fn new(count: usize, min_duration_sec: f64) -> Self {
        Self {
            count,
            min_duration_sec,
            ..Self::default()
        }
    }

    pub fn normalized(&self) -> Self {
        let count = if self.count == 0 {
            DEFAULT_RECENT_COUNT
        } else {
            self.count
        };

        let min_duration_sec = if self.min_duration_sec.is_finite() && self.min_duration_sec >= 0.0
        {
            self.min_duration_sec
        } else {
            DEFAULT_MIN_DURATION_SEC
        };

        let chunk_bytes = if self.chunk_bytes == 0 {
            DEFAULT_CHUNK_BYTES
        } else {
            self.chunk_bytes
        };

        Self {
            count,
            min_duration_sec,
            chunk_bytes,
            max_line_bytes: self.max_line_bytes.max(MIN_LINE_CAPACITY_BYTES),
        }
    }
}

pub fn resolve_log_path(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    if path.is_dir() {
        return LOG_FILE_CANDIDATES
            .iter()
            .map(|file_name| path.join(file_name))
            .find(|candidate| candidate.is_file());
    }

    None
}

pub fn default_log_directory() -> Option<PathBuf> {
    std::env::var_os("LOCALAPPDATA")
        .filter(|value| !value.is_empty())
        .map(|value| Path::new(&value).join("Warframe"))
}
