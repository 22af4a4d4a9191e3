use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::types::RunMetadata;

/// Local time written in the `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Header of the ambient controller column.
pub const AMBIENT_HEADER: &str = "Arduino_Temp";

pub fn local_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
/// CSV log of one run: metadata line, blank line, header, then one row per tick.
pub struct DataRecorder {
    writer: Option<csv::Writer<File>>,
    path: Option<PathBuf>,
    ambient_column: bool,
}
impl DataRecorder {
    pub fn new() -> Self {
        Self {
            writer: None,
            path: None,
            ambient_column: false,
        }
    }
    pub fn start(
        &mut self,
        path: &Path,
        metadata: &RunMetadata,
        ambient_setpoint: Option<f64>,
        channel_names: &[String],
    ) -> Result<()> {
        let mut file = File::create(path)
            .with_context(|| format!("could not open {} for writing", path.display()))?;
        {
            let mut meta = csv::Writer::from_writer(&mut file);
            meta.write_record([metadata_line(metadata, ambient_setpoint)])?;
            meta.flush()?;
        }
        writeln!(file)?;

        let mut header = vec!["timestamp".to_owned()];
        if ambient_setpoint.is_some() {
            header.push(AMBIENT_HEADER.to_owned());
        }
        header.extend(channel_names.iter().map(|name| format!("{name}_C")));
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&header)?;
        writer.flush()?;

        self.writer = Some(writer);
        self.path = Some(path.to_path_buf());
        self.ambient_column = ambient_setpoint.is_some();
        log::info!("recording started: {}", path.display());
        Ok(())
    }
    /// Closes the file and returns its path.
    pub fn stop(&mut self) -> Option<PathBuf> {
        if let Some(mut w) = self.writer.take() {
            if let Err(err) = w.flush() {
                log::warn!("flushing log file failed: {err}");
            }
            log::info!("recording saved");
        }
        self.path.take()
    }
    /// `ambient` is `Some` only for runs with an ambient column.
    pub fn write_record(
        &mut self,
        timestamp: &str,
        ambient: Option<Option<f64>>,
        values: &[Option<f64>],
    ) -> Result<()> {
        let Some(w) = &mut self.writer else {
            return Ok(());
        };
        let mut row = vec![timestamp.to_owned()];
        if let Some(ambient) = ambient {
            row.push(fmt_val(ambient));
        }
        row.extend(values.iter().copied().map(fmt_val));
        w.write_record(&row)?;
        w.flush()?;
        Ok(())
    }
    pub fn has_ambient_column(&self) -> bool {
        self.ambient_column
    }
    #[cfg(test)]
    pub fn is_recording(&self) -> bool {
        self.writer.is_some()
    }
}
/// `<folder>/<base>.csv`, or `<base>_1.csv`, `<base>_2.csv`, ... if taken.
pub fn unique_csv_path(folder: &Path, base_name: &str) -> PathBuf {
    let path = folder.join(format!("{base_name}.csv"));
    if !path.exists() {
        return path;
    }
    (1..)
        .map(|i| folder.join(format!("{base_name}_{i}.csv")))
        .find(|alt| !alt.exists())
        .unwrap_or(path)
}
/// Two decimals, empty for missing or NaN readings.
pub fn fmt_val(val: Option<f64>) -> String {
    match val {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => String::new(),
    }
}
fn metadata_line(metadata: &RunMetadata, ambient_setpoint: Option<f64>) -> String {
    let or = |s: &str, fallback: &str| {
        let s = s.trim();
        if s.is_empty() {
            fallback.to_owned()
        } else {
            s.to_owned()
        }
    };
    let mut line = format!(
        "Test: {} | Tester: {} | Fixture: {} | Notes: {}",
        or(&metadata.test_name, "Untitled Test"),
        or(&metadata.tester, "Unknown"),
        or(&metadata.fixture, "N/A"),
        metadata.notes.trim()
    );
    if let Some(sp) = ambient_setpoint {
        line.push_str(&format!(" | Ambient setpoint: {sp:.2} °C"));
    }
    line
}
#[cfg(test)]
mod tests {
    use super::*;
    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("thermoview-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
    #[test]
    fn formats_values_like_the_logger() {
        assert_eq!(fmt_val(Some(21.456)), "21.46");
        assert_eq!(fmt_val(None), "");
        assert_eq!(fmt_val(Some(f64::NAN)), "");
    }
    #[test]
    fn timestamp_is_local_wall_clock() {
        let ts = local_timestamp();
        assert_eq!(ts.len(), 19);
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
    }
    #[test]
    fn unique_path_appends_counter() {
        let dir = temp_dir("unique");
        let first = unique_csv_path(&dir, "Run");
        assert_eq!(first, dir.join("Run.csv"));
        std::fs::write(&first, "").unwrap();
        assert_eq!(unique_csv_path(&dir, "Run"), dir.join("Run_1.csv"));
        std::fs::write(dir.join("Run_1.csv"), "").unwrap();
        assert_eq!(unique_csv_path(&dir, "Run"), dir.join("Run_2.csv"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
    #[test]
    fn writes_header_and_rows() {
        let dir = temp_dir("rows");
        let path = dir.join("log.csv");
        let metadata = RunMetadata {
            test_name: "Oven, soak".to_owned(),
            ..RunMetadata::default()
        };
        let mut recorder = DataRecorder::new();
        recorder
            .start(&path, &metadata, Some(25.0), &["CJ".to_owned(), "CH1".to_owned()])
            .unwrap();
        assert!(recorder.is_recording());
        assert!(recorder.has_ambient_column());
        recorder
            .write_record("2024-05-01 09:30:00", Some(Some(24.9)), &[Some(22.0), None])
            .unwrap();
        assert_eq!(recorder.stop(), Some(path.clone()));
        assert!(!recorder.is_recording());
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("\"Test: Oven, soak | Tester: Unknown"));
        assert!(lines[0].ends_with("Ambient setpoint: 25.00 °C\""));
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "timestamp,Arduino_Temp,CJ_C,CH1_C");
        assert_eq!(lines[3], "2024-05-01 09:30:00,24.90,22.00,");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
