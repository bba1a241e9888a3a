//! JSON export of scrape results
//!
//! Results are written as a JSON array with one object per result, using the
//! field names of [`ScrapeResult`]. There is no envelope or schema version.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::info;

use super::ScrapeResult;
use crate::error::Result;

/// Serialize `results` as pretty-printed JSON
pub fn to_json<T: Serialize + ?Sized>(results: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

/// Write `results` to `path` as JSON, creating parent directories as needed
pub async fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, results: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, to_json(results)?).await?;
    info!("Results saved to {}", path.display());
    Ok(())
}

/// Load results previously written with [`write_json`]
pub async fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Load a result list previously written with [`write_json`]
pub async fn read_results(path: impl AsRef<Path>) -> Result<Vec<ScrapeResult>> {
    read_json(path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::Link;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn sample() -> Vec<ScrapeResult> {
        vec![
            ScrapeResult {
                url: "https://example.com".to_string(),
                status_code: Some(200),
                title: Some("Example".to_string()),
                text_content: Some("Hello".to_string()),
                links: vec![Link {
                    url: "https://example.com/a".to_string(),
                    anchor_text: "A".to_string(),
                    title: None,
                }],
                images: Vec::new(),
                metadata: BTreeMap::from([("description".to_string(), "d".to_string())]),
                error: None,
            },
            ScrapeResult::failed(
                "https://down.example",
                &crate::scrape::ScrapeError::RobotsBlocked,
            ),
        ]
    }

    #[test]
    fn test_json_field_names() {
        let json = to_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let first = &value[0];
        for field in [
            "url",
            "status_code",
            "title",
            "text_content",
            "links",
            "images",
            "metadata",
            "error",
        ] {
            assert!(first.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(first["links"][0]["anchor_text"], "A");
        assert_eq!(value[1]["error"], "Blocked by robots.txt");
        assert!(value[1]["status_code"].is_null());
    }

    #[tokio::test]
    async fn test_write_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("results.json");

        write_json(&path, &sample()).await.unwrap();
        let loaded = read_results(&path).await.unwrap();

        assert_eq!(loaded, sample());
    }
}
