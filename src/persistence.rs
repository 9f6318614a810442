use {
    crate::{error::StoreError, pipeline::dedup::MonitorState},
    std::{fs, path::Path},
};

/// Save run state to a JSON file
///
/// Writes to a sibling temp file first and renames it over the target so an
/// interrupted write never leaves a truncated state file behind.
pub fn save_state(state: &MonitorState, file_path: impl AsRef<Path>) -> Result<(), StoreError> {
    let file_path = file_path.as_ref();
    let json = serde_json::to_string_pretty(state)?;

    let tmp_path = file_path.with_extension("json.tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, file_path)?;

    log::debug!("Saved {} processed keys to {}", state.len(), file_path.display());
    Ok(())
}

/// Load run state from a JSON file
///
/// A missing, unreadable or corrupt file yields an empty state; the run
/// continues and the file is rewritten at the end.
pub fn load_state(file_path: impl AsRef<Path>) -> MonitorState {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        log::info!("No existing state file found: {}", file_path.display());
        return MonitorState::new();
    }

    let loaded = fs::read_to_string(file_path)
        .map_err(StoreError::from)
        .and_then(|json| serde_json::from_str::<MonitorState>(&json).map_err(StoreError::from));

    match loaded {
        Ok(state) => {
            log::info!("Loaded {} processed keys from {}", state.len(), file_path.display());
            state
        }
        Err(e) => {
            log::warn!("{} corrupted ({}), resetting...", file_path.display(), e);
            MonitorState::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("last_state.json");

        let mut state = MonitorState::new();
        state.record("Ethereum:USDT:0x1");
        state.record("Ethereum:USDT:0x2");
        save_state(&state, &path).unwrap();

        let loaded = load_state(&path);
        assert_eq!(loaded, state);
        assert!(!dir.path().join("last_state.json.tmp").exists());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(load_state(dir.path().join("absent.json")).is_empty());
    }

    #[test]
    fn test_corrupt_file_resets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("last_state.json");
        fs::write(&path, "{ processed_tx: [ oops").unwrap();

        assert!(load_state(&path).is_empty());
    }

    #[test]
    fn test_reads_legacy_state_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("last_state.json");
        fs::write(&path, r#"{"processed_tx": ["BSC:CAKE:0xaa", "BSC:CAKE:0xbb"]}"#).unwrap();

        let state = load_state(&path);
        assert_eq!(state.len(), 2);
        assert!(!state.is_novel("BSC:CAKE:0xbb"));
    }
}
