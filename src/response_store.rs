//! Saves raw forecast response bodies to `{root}/{endpoint}/{timestamp}.json`
//! for offline analysis.
//!
//! Errors are logged and swallowed: saving is best-effort and must never
//! interrupt a refresh.
use std::path::Path;

use tokio::fs;
use tracing::warn;

/// Write `bytes` to `{root}/{endpoint}/{timestamp}.json`.
///
/// - `endpoint`: sub-directory name, e.g. `"forecast"`.
/// - `bytes`: the raw HTTP response body as received.
pub async fn save(root: &Path, endpoint: &str, bytes: &[u8]) {
    let ts = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let dir = root.join(endpoint);
    let path = dir.join(format!("{ts}.json"));

    if let Err(e) = fs::create_dir_all(&dir).await {
        warn!(path = %path.display(), error = %e, "response_store: failed to create directory");
        return;
    }

    // Pretty-print the JSON if valid; fall back to raw bytes otherwise.
    let content = serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()
        .and_then(|v| serde_json::to_vec_pretty(&v).ok())
        .unwrap_or_else(|| bytes.to_vec());

    if let Err(e) = fs::write(&path, &content).await {
        warn!(path = %path.display(), error = %e, "response_store: failed to write response file");
    } else {
        tracing::debug!(path = %path.display(), bytes = content.len(), "response_store: saved");
    }
}
