//! Plain-text audit trail of accepted operations.
//!
//! One line per entry: `[YYYY-MM-DD HH:MM:SS] <summary>`. The file is only
//! ever appended to.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDateTime;

pub const STARTED: &str = "system started";

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug)]
pub struct ActivityLog {
    path: PathBuf,
    append: Mutex<()>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, at: NaiveDateTime, summary: &str) -> io::Result<()> {
        let _guard = self
            .append
            .lock()
            .map_err(|_| io::Error::other("activity log lock poisoned"))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // Keep one entry per line even if a summary carries a newline.
        let summary = summary.replace(['\r', '\n'], " ");
        writeln!(file, "[{}] {}", at.format(STAMP_FORMAT), summary)
    }

    /// The last `limit` lines, oldest first. A missing file has no lines.
    pub fn tail(&self, limit: usize) -> io::Result<Vec<String>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e),
        };
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        let skip = lines.len().saturating_sub(limit);
        Ok(lines[skip..].iter().map(|l| l.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(8, minute, 5)
            .unwrap()
    }

    #[test]
    fn appends_stamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("logs").join("activity.log"));

        log.append(at(0), STARTED).unwrap();
        log.append(at(1), "Registered product 1 'Bread'\nextra").unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            text,
            "[2026-10-16 08:00:05] system started\n\
             [2026-10-16 08:01:05] Registered product 1 'Bread' extra\n"
        );
    }

    #[test]
    fn tail_returns_latest_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("activity.log"));
        assert!(log.tail(10).unwrap().is_empty());

        for minute in 0..5 {
            log.append(at(minute), &format!("entry {minute}")).unwrap();
        }

        let tail = log.tail(2).unwrap();
        assert_eq!(tail.len(), 2);
        assert!(tail[0].ends_with("entry 3"));
        assert!(tail[1].ends_with("entry 4"));
        assert_eq!(log.tail(50).unwrap().len(), 5);
    }
}
