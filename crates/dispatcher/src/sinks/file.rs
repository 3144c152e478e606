//! FileSink - appends events to JSON Lines files

use contracts::{ContractError, DataSink, SyncEvent};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory
    pub base_path: PathBuf,
    /// Also write the per-tick statistics
    pub include_stats: bool,
}

impl FileSinkConfig {
    /// `base_path` (default `./output`) and `include_stats` (default false)
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));
        let include_stats = params
            .get("include_stats")
            .is_some_and(|value| value == "true");

        Self {
            base_path,
            include_stats,
        }
    }
}

/// Sink that appends one JSON object per line:
/// `joints.jsonl`, `skips.jsonl` and optionally `stats.jsonl`.
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writers: HashMap<&'static str, BufWriter<File>>,
}

impl FileSink {
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            writers: HashMap::new(),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    fn file_stem(event: &SyncEvent) -> &'static str {
        match event {
            SyncEvent::Joints(_) => "joints",
            SyncEvent::Stats(_) => "stats",
            SyncEvent::Skip(_) => "skips",
        }
    }

    fn writer(&mut self, stem: &'static str) -> std::io::Result<&mut BufWriter<File>> {
        if !self.writers.contains_key(stem) {
            let path = self.config.base_path.join(format!("{stem}.jsonl"));
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            debug!(sink = %self.name, path = %path.display(), "opened output file");
            self.writers.insert(stem, BufWriter::new(file));
        }
        self.writers
            .get_mut(stem)
            .ok_or_else(|| std::io::Error::other("writer missing after open"))
    }

    fn append(&mut self, event: &SyncEvent) -> std::io::Result<()> {
        // The file already says which kind it holds
        let mut record = serde_json::to_value(event).map_err(std::io::Error::other)?;
        if let Value::Object(map) = &mut record {
            map.remove("kind");
        }

        let writer = self.writer(Self::file_stem(event))?;
        serde_json::to_writer(&mut *writer, &record).map_err(std::io::Error::other)?;
        writer.write_all(b"\n")
    }

    fn persist(&mut self, event: &SyncEvent) -> Result<(), ContractError> {
        if matches!(event, SyncEvent::Stats(_)) && !self.config.include_stats {
            return Ok(());
        }
        self.append(event).map_err(|e| {
            error!(sink = %self.name, kind = event.kind(), error = %e, "write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    fn flush_all(&mut self) -> Result<(), ContractError> {
        for writer in self.writers.values_mut() {
            writer
                .flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        Ok(())
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        level = "trace",
        skip(self, event),
        fields(sink = %self.name, kind = event.kind())
    )]
    async fn write(&mut self, event: &SyncEvent) -> Result<(), ContractError> {
        self.persist(event)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.flush_all()
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush_all()?;
        self.writers.clear();
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}
