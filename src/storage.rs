use crate::errors::StoreError;
use crate::models::AppData;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

/// Loads the state document. A missing file is an empty document; an
/// unreadable or unparsable one is an error and the file is left untouched.
pub async fn load_data(path: &Path) -> Result<AppData, StoreError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no data file yet, starting empty");
            return Ok(AppData::default());
        }
        Err(err) => {
            error!(path = %path.display(), "failed to read data file: {err}");
            return Err(err.into());
        }
    };
    serde_json::from_slice(&bytes).map_err(|err| {
        error!(path = %path.display(), "failed to parse data file: {err}");
        StoreError::Corrupt {
            path: path.display().to_string(),
            source: err,
        }
    })
}

/// Writes the whole document to a sibling temp file, then renames it into place.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

pub async fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_actions;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("civic_score_{name}_{}_{nanos}.json", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_loads_empty_document() {
        let data = load_data(&temp_path("missing")).await.unwrap();
        assert!(data.actions.is_empty());
        assert!(data.challenges.is_empty());
    }

    #[tokio::test]
    async fn persisted_document_loads_back() {
        let path = temp_path("persist");
        let mut data = AppData::default();
        seed_actions(&mut data);
        persist_data(&path, &data).await.unwrap();

        let loaded = load_data(&path).await.unwrap();
        assert_eq!(loaded.actions.len(), data.actions.len());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported_and_left_in_place() {
        let path = temp_path("corrupt");
        let truncated = br#"{"users": {"u1": {"id": "u1", "username": "Kluge Eule""#;
        std::fs::write(&path, truncated).unwrap();

        let err = load_data(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), truncated.to_vec());
        let _ = std::fs::remove_file(&path);
    }
}
