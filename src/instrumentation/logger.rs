use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallLog {
    pub tool: String,
    pub query: String,
    pub num_results: u32,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnLog {
    pub id: String,
    pub timestamp: String,
    pub session_id: String,
    pub query: String,
    pub tool_calls: Vec<ToolCallLog>,
    pub model_calls: u32,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_cost: f64,
    pub total_latency_ms: u64,
    pub answer: String,
}

impl TurnLog {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    pub fn summary(&self) -> String {
        format!(
            "Searches: {} | Results read: {} | Model calls: {} | Latency: {:.1}s | Tokens: {} | Cost: ${:.4}",
            self.tool_calls.len(),
            self.tool_calls.iter().map(|c| c.num_results).sum::<u32>(),
            self.model_calls,
            self.total_latency_ms as f64 / 1000.0,
            self.total_tokens(),
            self.total_cost,
        )
    }
}

/// Appends one JSON line per completed turn to `<dir>/turns.jsonl`.
///
/// The file is opened once; concurrent writers are serialised so lines never
/// interleave.
pub struct TurnLogger {
    path: PathBuf,
    file: Mutex<File>,
}

impl TurnLogger {
    pub const FILE_NAME: &'static str = "turns.jsonl";

    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let path = dir.join(Self::FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, turn_log: &TurnLog) -> Result<()> {
        let mut line = serde_json::to_vec(turn_log).context("Failed to serialize turn log")?;
        line.push(b'\n');

        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        file.write_all(&line)
            .and_then(|_| file.flush())
            .with_context(|| format!("Failed to append to {}", self.path.display()))
    }
}
