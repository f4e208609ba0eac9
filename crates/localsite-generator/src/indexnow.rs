//! IndexNow key file.
//!
//! Search engines that speak IndexNow fetch `/<key>.txt` to confirm ownership
//! of the key used when pinging them.

use std::{fs, path::Path};

use localsite_core::{CoreError, config::validate_indexnow_key};
use tracing::info;

/// Environment variable that takes precedence over `seo.indexnow_key`.
pub const INDEXNOW_ENV: &str = "INDEXNOW_KEY";

/// Pick the key from the environment value or the configured one.
///
/// Blank values count as unset.
#[must_use]
pub fn resolve_key(env_value: Option<String>, configured: Option<&str>) -> Option<String> {
    env_value
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| {
            configured
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToString::to_string)
        })
}

/// Write `<root>/<key>.txt` and return its file name.
pub fn write_key_file(root: &Path, key: &str) -> Result<String, CoreError> {
    validate_indexnow_key(key)?;
    let name = format!("{key}.txt");
    fs::write(root.join(&name), format!("{key}\n"))?;
    info!(file = %name, "wrote IndexNow key file");
    Ok(name)
}
