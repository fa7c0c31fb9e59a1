//! One handler per button of the control panel. Handlers never touch the
//! screen; they report through the event sender and every call issues at most
//! one request. Nothing is retried.

use crate::api::{ApiError, BridgeClient, OpResponse};
use crate::event::{AppEvent, Emit, EventSender, Transfer};
use crate::progress::Progress;
use crate::table::{self, ExportError, Row};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn download_file_name(db: &str) -> String {
    format!("export-{db}.bin")
}

pub async fn upload(client: &BridgeClient, tx: &EventSender, file: Option<&Path>, db: &str) {
    let Some(path) = file else {
        tx.failure("Please select a file");
        return;
    };

    let progress_tx = tx.clone();
    let result = client
        .upload(db, path, move |loaded, total| {
            progress_tx.progress(Transfer::Upload, Progress::new(loaded, total));
        })
        .await;

    match result {
        Ok(status) if status.is_success() => {
            info!(db, file = %path.display(), status = status.as_u16(), "upload finished");
            tx.success("Upload successful");
        }
        Ok(status) => {
            warn!(db, status = status.as_u16(), "upload rejected");
            tx.failure(format!("Upload failed: {}", status.as_u16()));
        }
        Err(ApiError::Io(e)) => {
            warn!(file = %path.display(), error = %e, "upload file unreadable");
            tx.failure(format!("Could not read {}: {e}", path.display()));
        }
        Err(e) => {
            warn!(db, error = %e, "upload failed");
            tx.failure("Network error during upload");
        }
    }

    tx.progress(Transfer::Upload, Progress::idle());
}

/// Saves the export of `db` as `export-<db>.bin` inside `dir`.
pub async fn download(client: &BridgeClient, tx: &EventSender, db: &str, dir: &Path) {
    let dest = dir.join(download_file_name(db));
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        tx.failure(format!("Could not create {}: {e}", dir.display()));
        return;
    }

    let progress_tx = tx.clone();
    let result = client
        .download(db, &dest, move |loaded, total| {
            progress_tx.progress(Transfer::Download, Progress::new(loaded, total));
        })
        .await;

    match result {
        Ok(status) if status.is_success() => {
            info!(db, file = %dest.display(), "download finished");
            tx.success(format!("Download ready: {}", dest.display()));
        }
        Ok(status) => {
            warn!(db, status = status.as_u16(), "download rejected");
            tx.failure(format!("Download failed: {}", status.as_u16()));
        }
        Err(ApiError::Io(e)) => {
            warn!(file = %dest.display(), error = %e, "download not written");
            tx.failure(format!("Could not write {}: {e}", dest.display()));
        }
        Err(e) => {
            warn!(db, error = %e, "download failed");
            tx.failure("Network error during download");
        }
    }

    tx.progress(Transfer::Download, Progress::idle());
}

pub async fn relocate(client: &BridgeClient, tx: &EventSender, from: &str, to: &str) {
    if from == to {
        tx.failure("Source and target must differ");
        return;
    }
    let result = client.relocate(from, to).await;
    report_admin("Relocate", tx, result);
}

pub async fn sync(client: &BridgeClient, tx: &EventSender, db: &str) {
    let result = client.sync(db).await;
    report_admin("Sync", tx, result);
}

fn report_admin(action: &str, tx: &EventSender, result: Result<OpResponse, ApiError>) {
    match result {
        Ok(resp) => {
            info!(action, status = resp.status, "admin call answered");
            tx.emit(AppEvent::OpsInfo(
                format!("{action}: {} {}", resp.status, resp.message)
                    .trim_end()
                    .to_string(),
            ));
            if resp.is_success() {
                tx.success(format!("{action} OK"));
            } else {
                tx.failure(format!("{action} failed"));
            }
        }
        Err(e) => {
            warn!(action, error = %e, "admin call failed");
            tx.failure(format!("{action} network error"));
        }
    }
}

/// Replaces the shown rows only when the call succeeded.
pub async fn load_data(client: &BridgeClient, tx: &EventSender, db: &str, filter: Option<&str>) {
    match client.load_data(db, filter).await {
        Ok(rows) => {
            info!(db, rows = rows.len(), "data loaded");
            tx.emit(AppEvent::DataLoaded(rows));
            tx.success("Data loaded");
        }
        Err(e) => {
            warn!(db, error = %e, "loading data failed");
            tx.failure("Failed to load data");
        }
    }
}

pub async fn load_schema(client: &BridgeClient, tx: &EventSender, db: &str) {
    match client.schema(db).await {
        Ok(tables) => {
            tx.emit(AppEvent::SchemaLoaded(tables));
        }
        Err(e) => {
            warn!(db, error = %e, "loading schema failed");
            tx.failure("Failed to load schema");
        }
    }
}

pub async fn check_health(client: &BridgeClient, tx: &EventSender) {
    match client.health().await {
        Ok(status) => {
            tx.emit(AppEvent::Health(status.clone()));
            if status.eq_ignore_ascii_case("up") {
                tx.success(format!("Backend {status}"));
            } else {
                tx.failure(format!("Backend {status}"));
            }
        }
        Err(e) => {
            warn!(error = %e, "health check failed");
            tx.emit(AppEvent::Health("unreachable".to_string()));
            tx.failure("Backend unreachable");
        }
    }
}

/// Writes the given rows as `export.csv` into `dir`.
pub fn export(tx: &EventSender, rows: &[Row], dir: &Path) -> Option<PathBuf> {
    match table::export_csv(rows, dir) {
        Ok(path) => {
            info!(file = %path.display(), rows = rows.len(), "csv exported");
            tx.success(format!("Exported {}", path.display()));
            Some(path)
        }
        Err(ExportError::Empty) => {
            tx.failure("No data to export");
            None
        }
        Err(e) => {
            warn!(error = %e, "csv export failed");
            tx.failure(e.to_string());
            None
        }
    }
}
