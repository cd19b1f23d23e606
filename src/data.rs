use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::models::ShowcaseData;

/// Name of the data file expected inside a showcase directory.
pub const DATA_FILE: &str = "units.json";

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("showcase data file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed showcase data in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load and parse `units.json` from a showcase directory.
pub fn load_showcase(dir: &Path) -> Result<ShowcaseData, DataError> {
    let path = dir.join(DATA_FILE);
    if !path.is_file() {
        return Err(DataError::Missing(path));
    }

    let bytes = std::fs::read(&path).map_err(|source| DataError::Read {
        path: path.clone(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| DataError::Parse { path, source })
}

/// Resolve an image reference from the data file against the showcase
/// directory. Absolute references are taken as-is.
pub fn resolve_image(dir: &Path, reference: &str) -> anyhow::Result<PathBuf> {
    let candidate = Path::new(reference);
    let resolved = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        dir.join(candidate)
    };
    if resolved.is_file() {
        Ok(resolved)
    } else {
        Err(anyhow::anyhow!("no such image: {}", resolved.display()))
            .with_context(|| format!("resolving image reference {:?}", reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "heroImage": "img/hero.webp",
        "aboutImages": [
            { "src": "img/about_1.webp", "alt": "garden", "tall": true }
        ],
        "units": [
            {
                "name": "Fewo Eins",
                "meta": "2 Zimmer",
                "description": "Hell und ruhig.",
                "folder": "fewo1",
                "totalImages": 7,
                "tags": ["WLAN", "Balkon"],
                "hiddenTags": [],
                "cta": { "label": "Buchen", "href": "https://example.test/fewo1" }
            }
        ]
    }"#;

    #[test]
    fn test_load_showcase_parses_sample() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DATA_FILE), SAMPLE).unwrap();

        let data = load_showcase(dir.path()).unwrap();
        assert_eq!(data.hero_image, "img/hero.webp");
        assert_eq!(data.about_images.len(), 1);
        assert!(data.about_images[0].tall);
        assert_eq!(data.units.len(), 1);
        assert_eq!(data.units[0].total_images, 7);
    }

    #[test]
    fn test_load_showcase_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        match load_showcase(dir.path()) {
            Err(DataError::Missing(path)) => assert!(path.ends_with(DATA_FILE)),
            other => panic!("expected Missing, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_load_showcase_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DATA_FILE), "{ not json").unwrap();
        assert!(matches!(
            load_showcase(dir.path()),
            Err(DataError::Parse { .. })
        ));
    }

    #[test]
    fn test_resolve_image_relative_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let img_dir = dir.path().join("img");
        std::fs::create_dir_all(&img_dir).unwrap();
        std::fs::write(img_dir.join("hero.webp"), b"x").unwrap();

        let resolved = resolve_image(dir.path(), "img/hero.webp").unwrap();
        assert!(resolved.ends_with("img/hero.webp"));
        assert!(resolve_image(dir.path(), "img/absent.webp").is_err());
    }
}
