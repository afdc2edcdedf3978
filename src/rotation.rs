//! Time-based log file rotation.
//!
//! # Responsibilities
//! - Keep one active file at `<dir>/<prefix>.<YYYY-MM-DD>`
//! - Roll to a new file when the rotation interval elapses
//! - Delete the oldest rotations beyond the retained count
//!
//! # Design Decisions
//! - Periods are aligned on local wall-clock time, so a 24h interval rolls
//!   at local midnight
//! - Intervals shorter than a day reuse the date and add a generation
//!   suffix (`svc.2024-01-01.1`); the generation is the period's index
//!   within its local day, so a restart reopens the same file
//! - The period is resolved under the same lock as the write, so a write
//!   issued on a boundary lands in exactly one file
//! - No buffering: every record goes straight to the file

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, NaiveDate};

use crate::error::{LogError, LogResult};
use crate::INTERNAL_TARGET;

const DATE_LAYOUT: &str = "%Y-%m-%d";
const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Source of wall-clock time for rotation and record timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The host's local clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if let Ok(step) = chrono::Duration::from_std(by) {
            *now += step;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// How often to rotate and how many files to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub interval: Duration,
    /// Files kept on disk, the active one included.
    pub max_retained: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            max_retained: 7,
        }
    }
}

struct ActiveFile {
    period_start: i64,
    path: PathBuf,
    file: File,
}

/// A writer whose target file changes with the wall clock.
pub struct RotatingWriter {
    dir: PathBuf,
    prefix: String,
    interval_secs: i64,
    max_retained: usize,
    clock: Arc<dyn Clock>,
    active: Mutex<ActiveFile>,
}

impl fmt::Debug for RotatingWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingWriter")
            .field("dir", &self.dir)
            .field("prefix", &self.prefix)
            .field("interval_secs", &self.interval_secs)
            .field("max_retained", &self.max_retained)
            .finish()
    }
}

impl RotatingWriter {
    /// Open (or create) the file for the current period.
    ///
    /// Fails if the directory cannot be created or the file cannot be opened.
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        policy: RotationPolicy,
        clock: Arc<dyn Clock>,
    ) -> LogResult<Self> {
        let dir = dir.into();
        let prefix = prefix.into();

        let interval_secs = i64::try_from(policy.interval.as_secs()).unwrap_or(i64::MAX);
        if interval_secs == 0 {
            return Err(LogError::Io {
                path: dir,
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "rotation interval must be at least one second",
                ),
            });
        }

        fs::create_dir_all(&dir).map_err(|source| LogError::Io {
            path: dir.clone(),
            source,
        })?;

        let period_start = period_start(clock.now(), interval_secs);
        let path = period_path(&dir, &prefix, period_start, interval_secs);
        let file = open_append(&path).map_err(|source| LogError::Io {
            path: path.clone(),
            source,
        })?;

        let writer = Self {
            dir,
            prefix,
            interval_secs,
            max_retained: policy.max_retained.max(1),
            clock,
            active: Mutex::new(ActiveFile {
                period_start,
                path,
                file,
            }),
        };
        writer.prune();
        Ok(writer)
    }

    /// Path of the file currently receiving writes.
    pub fn current_path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Write one encoded record to the active rotation.
    pub fn write_record(&self, buf: &[u8]) -> io::Result<()> {
        let mut active = self.lock();
        let now = period_start(self.clock.now(), self.interval_secs);
        if now != active.period_start {
            self.rotate(&mut active, now)?;
        }
        active.file.write_all(buf)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.lock().file.sync_data()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ActiveFile> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rotate(&self, active: &mut ActiveFile, period_start: i64) -> io::Result<()> {
        let path = period_path(&self.dir, &self.prefix, period_start, self.interval_secs);

        fs::create_dir_all(&self.dir)?;
        let file = open_append(&path)?;

        tracing::debug!(
            target: INTERNAL_TARGET,
            from = %active.path.display(),
            to = %path.display(),
            "Log file rotated"
        );

        *active = ActiveFile {
            period_start,
            path,
            file,
        };
        self.prune();
        Ok(())
    }

    /// Remove the oldest rotations so at most `max_retained` remain.
    fn prune(&self) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    target: INTERNAL_TARGET,
                    dir = %self.dir.display(),
                    error = %e,
                    "Cannot list log directory"
                );
                return;
            }
        };

        let mut rotations: Vec<(NaiveDate, u32, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name();
                let (date, generation) = parse_rotation_name(name.to_str()?, &self.prefix)?;
                Some((date, generation, entry.path()))
            })
            .collect();

        if rotations.len() <= self.max_retained {
            return;
        }

        rotations.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
        for (_, _, path) in rotations.into_iter().skip(self.max_retained) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(target: INTERNAL_TARGET, path = %path.display(), "Pruned old log file")
                }
                Err(e) => tracing::warn!(
                    target: INTERNAL_TARGET,
                    path = %path.display(),
                    error = %e,
                    "Failed to prune log file"
                ),
            }
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Start of the period containing `now`, in local wall-clock seconds.
fn period_start(now: DateTime<FixedOffset>, interval_secs: i64) -> i64 {
    let wall = now.naive_local().and_utc().timestamp();
    wall - wall.rem_euclid(interval_secs)
}

fn period_date(period_start: i64) -> NaiveDate {
    DateTime::from_timestamp(period_start, 0)
        .map(|t| t.date_naive())
        .unwrap_or(NaiveDate::MIN)
}

/// Index of the period within its local day; 0 for intervals of a day or more.
fn period_generation(period_start: i64, interval_secs: i64) -> u32 {
    if interval_secs >= SECS_PER_DAY {
        return 0;
    }
    let since_midnight = period_start.rem_euclid(SECS_PER_DAY);
    u32::try_from(since_midnight / interval_secs).unwrap_or(0)
}

fn period_path(dir: &Path, prefix: &str, period_start: i64, interval_secs: i64) -> PathBuf {
    file_path(
        dir,
        prefix,
        period_date(period_start),
        period_generation(period_start, interval_secs),
    )
}

fn file_path(dir: &Path, prefix: &str, date: NaiveDate, generation: u32) -> PathBuf {
    let mut name = format!("{}.{}", prefix, date.format(DATE_LAYOUT));
    if generation > 0 {
        name.push_str(&format!(".{}", generation));
    }
    dir.join(name)
}

/// Parse `<prefix>.<YYYY-MM-DD>[.<generation>]`.
fn parse_rotation_name(name: &str, prefix: &str) -> Option<(NaiveDate, u32)> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('.')?;
    let (date, generation) = match rest.split_once('.') {
        Some((date, generation)) => (date, generation.parse().ok()?),
        None => (rest, 0),
    };
    if date.len() != 10 {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, DATE_LAYOUT).ok()?;
    Some((date, generation))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn start() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-01T10:00:00+00:00").unwrap()
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_file_named_after_local_date() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(
            DateTime::parse_from_rfc3339("2024-05-31T23:30:00-05:00").unwrap(),
        ));
        let writer = RotatingWriter::new(dir.path(), "svc", RotationPolicy::default(), clock).unwrap();
        assert_eq!(writer.current_path(), dir.path().join("svc.2024-05-31"));
    }

    #[test]
    fn test_retention_keeps_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let policy = RotationPolicy {
            interval: DAY,
            max_retained: 2,
        };
        let writer = RotatingWriter::new(dir.path(), "svc", policy, clock.clone()).unwrap();
        writer.write_record(b"day0\n").unwrap();

        for _ in 0..4 {
            clock.advance(DAY);
            writer.write_record(b"next\n").unwrap();
        }

        assert_eq!(file_names(dir.path()), ["svc.2024-01-04", "svc.2024-01-05"]);
        assert_eq!(writer.current_path(), dir.path().join("svc.2024-01-05"));
    }

    #[test]
    fn test_writes_within_period_share_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let writer = RotatingWriter::new(dir.path(), "svc", RotationPolicy::default(), clock.clone()).unwrap();

        writer.write_record(b"a\n").unwrap();
        clock.advance(Duration::from_secs(3600));
        writer.write_record(b"b\n").unwrap();

        let content = fs::read_to_string(dir.path().join("svc.2024-01-01")).unwrap();
        assert_eq!(content, "a\nb\n");
        assert_eq!(file_names(dir.path()).len(), 1);
    }

    #[test]
    fn test_sub_day_interval_adds_generation() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let policy = RotationPolicy {
            interval: Duration::from_secs(6 * 3600),
            max_retained: 10,
        };
        let writer = RotatingWriter::new(dir.path(), "svc", policy, clock.clone()).unwrap();
        writer.write_record(b"one\n").unwrap();
        clock.advance(Duration::from_secs(6 * 3600));
        writer.write_record(b"two\n").unwrap();

        assert_eq!(file_names(dir.path()), ["svc.2024-01-01.1", "svc.2024-01-01.2"]);
        assert_eq!(fs::read_to_string(dir.path().join("svc.2024-01-01.2")).unwrap(), "two\n");
    }

    #[test]
    fn test_restart_mid_day_continues_with_period_file() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(
            DateTime::parse_from_rfc3339("2024-01-01T01:00:00+00:00").unwrap(),
        ));
        let policy = RotationPolicy {
            interval: Duration::from_secs(6 * 3600),
            max_retained: 10,
        };
        let six_hours = Duration::from_secs(6 * 3600);

        let writer = RotatingWriter::new(dir.path(), "svc", policy, clock.clone()).unwrap();
        writer.write_record(b"00-06\n").unwrap();
        clock.advance(six_hours);
        writer.write_record(b"06-12\n").unwrap();
        drop(writer);

        clock.advance(six_hours);
        let writer = RotatingWriter::new(dir.path(), "svc", policy, clock.clone()).unwrap();
        writer.write_record(b"12-18\n").unwrap();
        clock.advance(six_hours);
        writer.write_record(b"18-24\n").unwrap();

        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("svc.2024-01-01"), "00-06\n");
        assert_eq!(read("svc.2024-01-01.1"), "06-12\n");
        assert_eq!(read("svc.2024-01-01.2"), "12-18\n");
        assert_eq!(read("svc.2024-01-01.3"), "18-24\n");
    }

    #[test]
    fn test_period_generation() {
        let hour = 3600;
        assert_eq!(period_generation(0, SECS_PER_DAY), 0);
        assert_eq!(period_generation(18 * hour, 6 * hour), 3);
        // 5h periods drift across midnight: 25h and 45h are both on day two.
        assert_eq!(period_generation(25 * hour, 5 * hour), 0);
        assert_eq!(period_generation(45 * hour, 5 * hour), 4);
    }

    #[test]
    fn test_prune_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("svc.notes"), "keep").unwrap();
        fs::write(dir.path().join("other.2023-01-01"), "keep").unwrap();
        fs::write(dir.path().join("svc.2023-01-01"), "old").unwrap();

        let clock = Arc::new(ManualClock::new(start()));
        let policy = RotationPolicy {
            interval: DAY,
            max_retained: 1,
        };
        let _writer = RotatingWriter::new(dir.path(), "svc", policy, clock).unwrap();

        assert_eq!(
            file_names(dir.path()),
            ["other.2023-01-01", "svc.2024-01-01", "svc.notes"]
        );
    }

    #[test]
    fn test_unwritable_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let err = RotatingWriter::new(
            blocker.join("logs"),
            "svc",
            RotationPolicy::default(),
            Arc::new(SystemClock),
        )
        .unwrap_err();
        assert!(matches!(err, LogError::Io { .. }));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let policy = RotationPolicy {
            interval: Duration::ZERO,
            max_retained: 1,
        };
        assert!(RotatingWriter::new(dir.path(), "svc", policy, Arc::new(SystemClock)).is_err());
    }

    #[test]
    fn test_parse_rotation_name() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(parse_rotation_name("svc.2024-02-29", "svc"), Some((day, 0)));
        assert_eq!(parse_rotation_name("svc.2024-02-29.3", "svc"), Some((day, 3)));
        assert_eq!(parse_rotation_name("svc.2024-02-29.x", "svc"), None);
        assert_eq!(parse_rotation_name("svcx.2024-02-29", "svc"), None);
        assert_eq!(parse_rotation_name("svc.log", "svc"), None);
    }
}
