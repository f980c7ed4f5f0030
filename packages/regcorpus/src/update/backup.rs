//! Timestamped backups and the retention sweep.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, TimeZone};

use crate::config::{BACKUP_MARKER, BACKUP_TIMESTAMP_FORMAT};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Backup path for `target` taken at `timestamp`.
///
/// # Examples
/// ```
/// use chrono::{Local, TimeZone};
/// use regcorpus::update::backup_path_for;
/// use std::path::Path;
///
/// let at = Local.with_ymd_and_hms(2025, 3, 1, 9, 5, 7).unwrap();
/// let backup = backup_path_for(Path::new("regulations/3-1-9.md"), &at);
/// assert_eq!(backup, Path::new("regulations/3-1-9.md.backup.20250301_090507"));
/// ```
#[must_use]
pub fn backup_path_for<Tz: TimeZone>(target: &Path, timestamp: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let mut name = target.as_os_str().to_os_string();
    name.push(BACKUP_MARKER);
    name.push(timestamp.format(BACKUP_TIMESTAMP_FORMAT).to_string());
    PathBuf::from(name)
}

/// Whether a file name follows the backup naming convention.
#[must_use]
pub fn is_backup_file(file_name: &str) -> bool {
    file_name.contains(BACKUP_MARKER)
}

/// All existing backups of `target`, sorted by name (oldest timestamp first).
pub fn list_backups(target: &Path) -> std::io::Result<Vec<PathBuf>> {
    let Some(file_name) = target.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Ok(Vec::new());
    };
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let prefix = format!("{file_name}{BACKUP_MARKER}");

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut backups: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.len() > prefix.len() && name.starts_with(&prefix)
        })
        .map(|entry| entry.path())
        .collect();
    backups.sort();
    Ok(backups)
}

/// Delete backups of `target` last modified more than `max_age_days` ago.
///
/// Best effort: failures to list, inspect or delete a backup are logged and
/// skipped. Returns the number of backups removed.
pub fn sweep_backups(target: &Path, max_age_days: u64) -> usize {
    sweep_backups_at(target, max_age_days, SystemTime::now())
}

/// [`sweep_backups`] measured against an explicit current time.
pub fn sweep_backups_at(target: &Path, max_age_days: u64, now: SystemTime) -> usize {
    let max_age = Duration::from_secs(max_age_days.saturating_mul(SECONDS_PER_DAY));

    let backups = match list_backups(target) {
        Ok(backups) => backups,
        Err(e) => {
            tracing::debug!(path = %target.display(), error = %e, "failed to list backups");
            return 0;
        }
    };

    let mut removed = 0;
    for backup in backups {
        let age = fs::metadata(&backup)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        let Some(age) = age else {
            tracing::debug!(path = %backup.display(), "cannot determine backup age, keeping");
            continue;
        };
        if age <= max_age {
            continue;
        }
        match fs::remove_file(&backup) {
            Ok(()) => {
                tracing::debug!(path = %backup.display(), "removed expired backup");
                removed += 1;
            }
            Err(e) => {
                tracing::debug!(path = %backup.display(), error = %e, "failed to remove backup");
            }
        }
    }

    if removed > 0 {
        tracing::info!(path = %target.display(), removed, days = max_age_days, "swept old backups");
    }
    removed
}
