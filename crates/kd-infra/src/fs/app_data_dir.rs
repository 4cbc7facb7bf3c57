use anyhow::{Context, Result};
use std::path::PathBuf;

#[cfg(target_os = "linux")]
const APP_DIR_NAME: &str = "kindred";
#[cfg(not(target_os = "linux"))]
const APP_DIR_NAME: &str = "Kindred";

/// Kindred application data root.
///
/// - macOS: ~/Library/Application Support/Kindred
/// - Windows: %APPDATA%\Kindred
/// - Linux: $XDG_DATA_HOME/kindred or ~/.local/share/kindred
///
/// Nothing is created here; callers create directories when they first write.
pub fn app_data_dir() -> Result<PathBuf> {
    let base_dir =
        get_platform_data_dir().context("Failed to get platform-specific data directory")?;

    Ok(base_dir.join(APP_DIR_NAME))
}

fn get_platform_data_dir() -> Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        if let Some(xdg_data_home) = std::env::var_os("XDG_DATA_HOME") {
            return Ok(PathBuf::from(xdg_data_home));
        }
    }

    dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Unable to get platform data directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_data_dir_ends_with_app_name() {
        if let Ok(root) = app_data_dir() {
            assert!(root.ends_with(APP_DIR_NAME));
        }
    }
}
