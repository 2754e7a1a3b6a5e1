// Tempdash - Temperature history dashboard for rotated logger output
//
// Copyright 2024 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::config::HistoryConfig;
use crate::history::core::{LogLine, Sample};
use chrono::{Local, NaiveDateTime};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Abstraction around the filesystem to allow for easier testing.
pub trait LogSource {
    fn exists(&self, path: &Path) -> bool;
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>>;
}

/// `LogSource` implementation that reads log files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLogSource;

impl LogSource for FileLogSource {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read temperature samples from a log file and its numbered rotated backups.
#[derive(Debug, Clone)]
pub struct LogHistory<S = FileLogSource> {
    source: S,
    log_file: PathBuf,
    backup_count: usize,
    window: chrono::Duration,
}

impl LogHistory<FileLogSource> {
    pub fn new(config: &HistoryConfig) -> Self {
        Self::with_source(FileLogSource, config)
    }
}

impl<S> LogHistory<S>
where
    S: LogSource,
{
    pub fn with_source(source: S, config: &HistoryConfig) -> Self {
        Self {
            source,
            log_file: config.log_file.clone(),
            backup_count: config.backup_count,
            window: config.window,
        }
    }

    /// Paths of the primary log file and each backup that currently exists, primary
    /// first then backups by ascending suffix (`.1`, `.2`, ...).
    pub fn log_files(&self) -> Vec<PathBuf> {
        let backups = (1..=self.backup_count).map(|i| backup_path(&self.log_file, i));

        std::iter::once(self.log_file.clone())
            .chain(backups)
            .filter(|p| self.source.exists(p))
            .collect()
    }

    /// Samples from the trailing window, relative to the current local time. A window
    /// reaching back before the earliest representable time includes every sample.
    pub fn recent_samples(&self) -> Vec<Sample> {
        let cutoff = Local::now()
            .naive_local()
            .checked_sub_signed(self.window)
            .unwrap_or(NaiveDateTime::MIN);
        self.samples_since(cutoff)
    }

    /// Samples at or after `cutoff` from all log files, sorted by their display
    /// timestamp. Lines that can't be parsed and files that can't be read are
    /// skipped. Samples that appear in more than one file are all kept.
    pub fn samples_since(&self, cutoff: NaiveDateTime) -> Vec<Sample> {
        let mut samples = Vec::new();

        for path in self.log_files() {
            let before = samples.len();
            self.read_file(&path, cutoff, &mut samples);

            tracing::debug!(
                message = "read samples from log file",
                path = %path.display(),
                samples = samples.len() - before,
            );
        }

        // Stable so that equal display timestamps keep file order
        samples.sort_by_key(Sample::display_key);
        samples
    }

    fn read_file(&self, path: &Path, cutoff: NaiveDateTime, out: &mut Vec<Sample>) {
        let reader = match self.source.open(path) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(message = "skipping unreadable log file", path = %path.display(), error = %e);
                return;
            }
        };

        for (i, bytes) in reader.split(b'\n').enumerate() {
            let bytes = match bytes {
                Ok(b) => b,
                Err(e) => {
                    tracing::debug!(message = "stopped reading log file", path = %path.display(), error = %e);
                    return;
                }
            };

            let line = match String::from_utf8(bytes) {
                Ok(l) => l,
                Err(_) => {
                    tracing::trace!(message = "skipping line with invalid UTF-8", path = %path.display(), line = i + 1);
                    continue;
                }
            };

            let parsed = match LogLine::parse(&line) {
                Some(l) => l,
                None => {
                    tracing::trace!(message = "skipping line without separator", path = %path.display(), line = i + 1);
                    continue;
                }
            };

            match parsed.sample() {
                Some(sample) if sample.timestamp() >= cutoff => out.push(sample),
                Some(_) => {}
                None => {
                    tracing::trace!(
                        message = "skipping line without sample",
                        path = %path.display(),
                        line = i + 1,
                        timestamp = parsed.timestamp_text(),
                        text = parsed.message(),
                    );
                }
            }
        }
    }
}

/// Path of the `n`th rotated backup of `path`, e.g. `temp_monitor.log.2`.
fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}", n));
    PathBuf::from(name)
}

#[cfg(test)]
mod test {
    use super::{backup_path, FileLogSource, LogHistory};
    use crate::config::HistoryConfig;
    use crate::history::test::MemoryLogSource;
    use crate::sensor::TemperatureCelsius;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fs;
    use std::path::{Path, PathBuf};

    const LOG_FILE: &str = "/var/log/temp_monitor.log";

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    fn config(backup_count: usize) -> HistoryConfig {
        HistoryConfig {
            log_file: PathBuf::from(LOG_FILE),
            backup_count,
            window: chrono::Duration::days(7),
        }
    }

    fn history(source: MemoryLogSource) -> LogHistory<MemoryLogSource> {
        LogHistory::with_source(source, &config(5))
    }

    fn points(history: &LogHistory<MemoryLogSource>, cutoff: NaiveDateTime) -> Vec<(String, f64)> {
        history
            .samples_since(cutoff)
            .iter()
            .map(|s| (s.display_timestamp(), f64::from(s.temperature())))
            .collect()
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            Path::new("/var/log/temp_monitor.log.3"),
            backup_path(Path::new(LOG_FILE), 3)
        );
    }

    #[test]
    fn test_log_files_order() {
        let source = MemoryLogSource::new()
            .with_file("/var/log/temp_monitor.log.2", "")
            .with_file(LOG_FILE, "")
            .with_file("/var/log/temp_monitor.log.1", "");

        assert_eq!(
            vec![
                PathBuf::from(LOG_FILE),
                PathBuf::from("/var/log/temp_monitor.log.1"),
                PathBuf::from("/var/log/temp_monitor.log.2"),
            ],
            history(source).log_files()
        );
    }

    #[test]
    fn test_log_files_beyond_backup_count_ignored() {
        let source = MemoryLogSource::new()
            .with_file(LOG_FILE, "")
            .with_file("/var/log/temp_monitor.log.1", "")
            .with_file("/var/log/temp_monitor.log.6", "");

        assert_eq!(2, history(source).log_files().len());
    }

    #[test]
    fn test_log_files_missing_primary() {
        let source = MemoryLogSource::new().with_file("/var/log/temp_monitor.log.1", "");
        assert_eq!(
            vec![PathBuf::from("/var/log/temp_monitor.log.1")],
            history(source).log_files()
        );
    }

    #[test]
    fn test_samples_window() {
        let source = MemoryLogSource::new().with_file(
            LOG_FILE,
            "2024-05-01 10:00:00 - Temperature: 21.3°C\n\
             2023-01-01 10:00:00 - Temperature: 99.9°C\n",
        );

        assert_eq!(
            vec![("01-05 10:00".to_owned(), 21.3)],
            points(&history(source), datetime(2024, 4, 28, 12, 0))
        );
    }

    #[test]
    fn test_samples_at_cutoff_included() {
        let source = MemoryLogSource::new().with_file(
            LOG_FILE,
            "2024-05-01 10:00:00 - Temperature: 21.3°C\n\
             2024-05-01 09:59:59 - Temperature: 20.0°C\n",
        );

        assert_eq!(
            vec![("01-05 10:00".to_owned(), 21.3)],
            points(&history(source), datetime(2024, 5, 1, 10, 0))
        );
    }

    #[test]
    fn test_samples_malformed_lines_skipped() {
        let source = MemoryLogSource::new().with_file(
            LOG_FILE,
            "2024-05-01 10:00:00 Temperature: 1.0°C\n\
             2024-05-01 10:01:00 - Humidity: 40.0%\n\
             2024-05-01 10:02:00 - Temperature: warm°C\n\
             sometime - Temperature: 2.0°C\n\
             \n\
             2024-05-01 10:05:00 - Temperature: 22.0°C\n",
        );

        assert_eq!(
            vec![("01-05 10:05".to_owned(), 22.0)],
            points(&history(source), datetime(2024, 4, 28, 0, 0))
        );
    }

    #[test]
    fn test_samples_invalid_utf8_skipped() {
        let mut contents = b"2024-05-01 10:00:00 - Temperature: 21.3\xb0C\n".to_vec();
        contents.extend_from_slice("2024-05-01 10:05:00 - Temperature: 22.0°C\n".as_bytes());
        let source = MemoryLogSource::new().with_bytes(LOG_FILE, contents);

        assert_eq!(
            vec![("01-05 10:05".to_owned(), 22.0)],
            points(&history(source), datetime(2024, 4, 28, 0, 0))
        );
    }

    #[test]
    fn test_samples_across_files_sorted() {
        let source = MemoryLogSource::new()
            .with_file(
                LOG_FILE,
                "2024-05-03 08:00:00 - Temperature: 23.0°C\n\
                 2024-05-03 09:00:00 - Temperature: 24.0°C\n",
            )
            .with_file(
                "/var/log/temp_monitor.log.1",
                "2024-05-02 08:00:00 - Temperature: 22.0°C\n",
            )
            .with_file(
                "/var/log/temp_monitor.log.2",
                "2024-05-01 08:00:00 - Temperature: 21.0°C\n",
            );

        assert_eq!(
            vec![
                ("01-05 08:00".to_owned(), 21.0),
                ("02-05 08:00".to_owned(), 22.0),
                ("03-05 08:00".to_owned(), 23.0),
                ("03-05 09:00".to_owned(), 24.0),
            ],
            points(&history(source), datetime(2024, 4, 28, 0, 0))
        );
    }

    #[test]
    fn test_samples_sorted_by_display_timestamp() {
        // Ordering is by day-month hour:minute, so December sorts after January
        // even when it belongs to the previous year.
        let source = MemoryLogSource::new().with_file(
            LOG_FILE,
            "2024-01-02 08:00:00 - Temperature: 2.0°C\n\
             2023-12-31 08:00:00 - Temperature: 1.0°C\n",
        );

        assert_eq!(
            vec![("02-01 08:00".to_owned(), 2.0), ("31-12 08:00".to_owned(), 1.0)],
            points(&history(source), datetime(2023, 12, 28, 0, 0))
        );
    }

    #[test]
    fn test_samples_duplicates_kept() {
        let line = "2024-05-01 10:00:00 - Temperature: 21.3°C\n";
        let source = MemoryLogSource::new()
            .with_file(LOG_FILE, line)
            .with_file("/var/log/temp_monitor.log.1", line);

        assert_eq!(2, history(source).samples_since(datetime(2024, 4, 28, 0, 0)).len());
    }

    #[test]
    fn test_samples_missing_backups() {
        let primary = "2024-05-03 08:00:00 - Temperature: 23.0°C\n";
        let first = "2024-05-02 08:00:00 - Temperature: 22.0°C\n";
        let second = "2024-05-01 08:00:00 - Temperature: 21.0°C\n";

        let with_two = MemoryLogSource::new()
            .with_file(LOG_FILE, primary)
            .with_file("/var/log/temp_monitor.log.1", first)
            .with_file("/var/log/temp_monitor.log.2", second);
        let cutoff = datetime(2024, 4, 28, 0, 0);
        let limited = LogHistory::with_source(with_two.clone(), &config(2));

        assert_eq!(points(&limited, cutoff), points(&history(with_two), cutoff));
    }

    #[test]
    fn test_samples_unreadable_file_skipped() {
        let source = MemoryLogSource::new()
            .with_file(LOG_FILE, "2024-05-03 08:00:00 - Temperature: 23.0°C\n")
            .with_unreadable("/var/log/temp_monitor.log.1");

        assert_eq!(
            vec![("03-05 08:00".to_owned(), 23.0)],
            points(&history(source), datetime(2024, 4, 28, 0, 0))
        );
    }

    #[test]
    fn test_samples_no_files() {
        let source = MemoryLogSource::new();
        assert!(history(source).samples_since(datetime(2024, 4, 28, 0, 0)).is_empty());
    }

    #[test]
    fn test_samples_idempotent() {
        let source = MemoryLogSource::new().with_file(
            LOG_FILE,
            "2024-05-01 10:00:00 - Temperature: 21.3°C\n\
             2024-05-01 11:00:00 - Temperature: 21.8°C\n",
        );
        let history = history(source);
        let cutoff = datetime(2024, 4, 28, 0, 0);

        assert_eq!(history.samples_since(cutoff), history.samples_since(cutoff));
    }

    #[test]
    fn test_recent_samples_uses_current_time() {
        let now = chrono::Local::now().naive_local();
        let recent = now - chrono::Duration::hours(1);
        let old = now - chrono::Duration::days(8);
        let contents = format!(
            "{} - Temperature: 20.5°C\n{} - Temperature: 30.5°C\n",
            recent.format("%Y-%m-%d %H:%M:%S"),
            old.format("%Y-%m-%d %H:%M:%S"),
        );
        let source = MemoryLogSource::new().with_file(LOG_FILE, &contents);
        let samples = history(source).recent_samples();

        assert_eq!(1, samples.len());
        assert_eq!(TemperatureCelsius::from(20.5), samples[0].temperature());
    }

    #[test]
    fn test_recent_samples_huge_window() {
        let source = MemoryLogSource::new().with_file(
            LOG_FILE,
            "1970-01-01 00:00:00 - Temperature: 10.0°C\n\
             2024-05-01 10:00:00 - Temperature: 21.3°C\n",
        );
        let history = LogHistory::with_source(
            source,
            &HistoryConfig {
                window: chrono::Duration::days(1_000_000_000),
                ..config(5)
            },
        );

        assert_eq!(2, history.recent_samples().len());
    }

    #[test]
    fn test_file_source_reads_disk() {
        let dir = std::env::temp_dir().join(format!("tempdash-history-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let log_file = dir.join("temp_monitor.log");
        fs::write(&log_file, "2024-05-03 08:00:00 - Temperature: 23.0°C\n").unwrap();
        fs::write(
            dir.join("temp_monitor.log.2"),
            "2024-05-01 08:00:00 - Temperature: 21.0°C\n",
        )
        .unwrap();

        let history = LogHistory::with_source(
            FileLogSource,
            &HistoryConfig {
                log_file: log_file.clone(),
                backup_count: 5,
                window: chrono::Duration::days(7),
            },
        );
        let files = history.log_files();
        let samples = history.samples_since(datetime(2024, 4, 28, 0, 0));
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(vec![log_file, dir.join("temp_monitor.log.2")], files);
        assert_eq!(2, samples.len());
        assert_eq!("01-05 08:00", samples[0].display_timestamp());
        assert_eq!("03-05 08:00", samples[1].display_timestamp());
    }
}
