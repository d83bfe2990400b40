//! File sink: packets written back to back (an Annex B stream for H.264)

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::{info, warn};

use crate::config::SinkConfig;
use crate::error::CapabilityError;
use crate::pipeline::types::EncodedPacket;
use crate::sink::UnitSink;

pub struct FileSink {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    written: u64,
}

impl FileSink {
    pub fn new() -> Self {
        Self {
            writer: None,
            path: PathBuf::new(),
            written: 0,
        }
    }

    /// Strip the optional `file://` prefix from a destination
    fn path_of(destination: &str) -> PathBuf {
        let destination = destination.trim();
        PathBuf::from(destination.strip_prefix("file://").unwrap_or(destination))
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitSink for FileSink {
    fn open(&mut self, config: &SinkConfig) -> Result<(), CapabilityError> {
        let path = Self::path_of(&config.destination);
        let append = config.flag("append").unwrap_or(false);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .map_err(|e| {
                CapabilityError::fatal(format!("cannot open {}: {}", path.display(), e))
            })?;

        info!("FileSink: writing to {}", path.display());
        self.writer = Some(BufWriter::new(file));
        self.path = path;
        self.written = 0;
        Ok(())
    }

    fn deliver(&mut self, packet: EncodedPacket) -> Result<(), CapabilityError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| CapabilityError::fatal("file sink used before open"))?;
        writer.write_all(&packet.data)?;
        self.written += packet.size() as u64;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("FileSink: flush of {} failed: {}", self.path.display(), e);
            }
            info!(
                "FileSink: closed {} after {} bytes",
                self.path.display(),
                self.written
            );
        }
    }
}
