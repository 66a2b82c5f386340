use chrono::{NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "wrf_eval_cache";

pub fn get_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join(CACHE_DIR_NAME))
}

pub async fn ensure_cache_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Cache path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

/// Resolves a wall-clock time in `zone` to a naive UTC instant.
///
/// Ambiguous times (DST fall-back) resolve to the earliest instant; times that
/// do not exist (DST spring-forward gap) give `None`.
pub fn local_to_utc(zone: Tz, local: &NaiveDateTime) -> Option<NaiveDateTime> {
    zone.from_local_datetime(local)
        .earliest()
        .map(|dt| dt.naive_utc())
}

pub fn utc_to_local(zone: Tz, utc: &NaiveDateTime) -> NaiveDateTime {
    zone.from_utc_datetime(utc).naive_local()
}
