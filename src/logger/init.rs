use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use fern::log_file;
use log::LevelFilter;

use crate::logger::cleanup::cleanup_old_logs;

const RETENTION_DAYS: u64 = 60;

fn parse_level(log_level: &str) -> LevelFilter {
    LevelFilter::from_str(log_level).unwrap_or_else(|_| {
        eprintln!("[parse_level] Unknown log level {:?}, falling back to info", log_level);
        LevelFilter::Info
    })
}

/// Logs to stdout and to a per-start file under `log_dir`. Old files are
/// cleaned up in the background.
pub fn init_logger(log_dir: &str, log_level: &str) -> bool {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("[init_logger] Unable to create logs dir {}: {:?}", log_dir, e);
        return false;
    }
    let log_file_path = format!("{}/{}.log", log_dir, Utc::now().format("%Y-%m-%d_%H-%M-%S"));
    let file_config = match log_file(&log_file_path) {
        Ok(file_config) => file_config,
        Err(e) => {
            eprintln!("[init_logger] Unable to create log file {}: {:?}", log_file_path, e);
            return false;
        }
    };
    let dispatcher_res = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(parse_level(log_level))
        .chain(std::io::stdout())
        .chain(file_config)
        .apply();
    if let Err(e) = dispatcher_res {
        eprintln!("[init_logger] Unable to create logs file dispatcher: {:?}", e);
        return false;
    }
    let logs_dir = log_dir.to_string();
    let retention = Duration::from_secs(RETENTION_DAYS * 24 * 60 * 60);
    tokio::spawn(async move {
        loop {
            cleanup_old_logs(&logs_dir, retention);
            tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
        }
    });
    true
}
