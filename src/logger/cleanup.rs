use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

fn is_expired(path: &Path, now: SystemTime, retention_period: Duration) -> std::io::Result<bool> {
    let modified_time = fs::metadata(path)?.modified()?;
    // Files from the future are kept.
    Ok(now
        .duration_since(modified_time)
        .map(|elapsed| elapsed >= retention_period)
        .unwrap_or(false))
}

/// Removes `.log` files in `logs_dir` older than `retention_period`.
/// Returns how many files were removed.
pub fn cleanup_old_logs(logs_dir: &str, retention_period: Duration) -> usize {
    let entries = match fs::read_dir(logs_dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("[cleanup_old_logs] Unable to read logs dir: {:?}", e);
            return 0;
        }
    };
    let now = SystemTime::now();
    let mut removed = 0;
    for entry_res in entries {
        let path = match entry_res {
            Ok(entry) => entry.path(),
            Err(e) => {
                log::error!("[cleanup_old_logs] Error in getting dir entry: {:?}", e);
                continue;
            }
        };
        if path.extension().and_then(|ext| ext.to_str()) != Some("log") {
            continue;
        }
        match is_expired(&path, now, retention_period) {
            Ok(false) => {}
            Ok(true) => match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log::error!("[cleanup_old_logs] Unable to remove old log file {:?}: {:?}", path, e),
            },
            Err(e) => log::error!("[cleanup_old_logs] Unable to read metadata of {:?}: {:?}", path, e),
        }
    }
    if removed > 0 {
        log::info!("[cleanup_old_logs] Removed {} old log files from {}", removed, logs_dir);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("pr-gate-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    #[test]
    fn test_cleanup_only_touches_expired_logs() {
        let dir = scratch_dir("cleanup");
        fs::write(dir.join("old.log"), "x").expect("write");
        fs::write(dir.join("notes.txt"), "x").expect("write");
        let dir_str = dir.to_str().expect("utf8 path");
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cleanup_old_logs(dir_str, Duration::from_secs(3600)), 0);
        assert_eq!(cleanup_old_logs(dir_str, Duration::ZERO), 1);
        assert!(!dir.join("old.log").exists());
        assert!(dir.join("notes.txt").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_dir_is_tolerated() {
        assert_eq!(cleanup_old_logs("/nonexistent/pr-gate-logs", Duration::ZERO), 0);
    }
}
