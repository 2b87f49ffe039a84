use async_trait::async_trait;
use log::info;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use super::StateSink;
use crate::controller::state::{ControllerState, CSV_HEADER};
use crate::utils::error::MonitorError;

/// Append-only CSV log of controller snapshots, one row per poll.
///
/// Each row is flushed immediately; a crash never loses more than the row
/// being written.
pub struct CsvLogSink {
    file: File,
    path: String,
    needs_header: bool,
}

impl CsvLogSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, MonitorError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;

        // An empty store gets the header row ahead of the first data row.
        let needs_header = file.metadata()?.len() == 0;

        let path = path.as_ref().to_string_lossy().to_string();
        info!("📝 CSV log at {} ({})", path, if needs_header { "new" } else { "appending" });

        Ok(Self {
            file,
            path,
            needs_header,
        })
    }
}

#[async_trait]
impl StateSink for CsvLogSink {
    async fn deliver(&mut self, state: &ControllerState) -> Result<(), MonitorError> {
        if self.needs_header {
            writeln!(self.file, "{}", CSV_HEADER)?;
            self.needs_header = false;
        }

        writeln!(self.file, "{}", state.csv_row())?;
        self.file.flush()?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), MonitorError> {
        self.file.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_state() -> ControllerState {
        ControllerState {
            temperature: 25.0,
            pv_voltage: 18.4,
            pv_current: 0.95,
            pv_power: 17.0,
            battery_voltage: 13.2,
            battery_soc: 87.0,
            charging_current: 1.2,
        }
    }

    #[tokio::test]
    async fn empty_store_gets_header_before_first_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("solar.csv");

        let mut sink = CsvLogSink::new(&path).unwrap();
        sink.deliver(&sample_state()).await.unwrap();
        sink.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(lines.next(), Some("25,18.4,0.95,17,13.2,87,1.2"));
        assert_eq!(lines.next(), None);
    }

    #[tokio::test]
    async fn reopening_a_non_empty_store_appends_without_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("solar.csv");

        {
            let mut sink = CsvLogSink::new(&path).unwrap();
            sink.deliver(&sample_state()).await.unwrap();
        }

        let mut sink = CsvLogSink::new(&path).unwrap();
        sink.deliver(&sample_state()).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let headers = content
            .lines()
            .filter(|line| *line == CSV_HEADER)
            .count();
        assert_eq!(headers, 1);
        assert_eq!(content.lines().count(), 3);
    }
}
