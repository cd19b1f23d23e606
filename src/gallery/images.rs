use std::path::{Path, PathBuf};

/// Image files for a unit live under `img/{folder}/` and follow a fixed
/// naming convention: `{folder}_{i}.webp`, 1-based, grid position = display
/// order.
const IMAGE_EXT: &str = "webp";

/// Resolve the ordered image list for a unit.
///
/// Returns an empty vector when the folder name is empty, the folder does not
/// exist under `{base_dir}/img`, or `total` is zero. Callers treat empty as
/// "nothing to show".
pub fn unit_image_paths(base_dir: &Path, folder: &str, total: u32) -> Vec<PathBuf> {
    if folder.is_empty() || total == 0 {
        return Vec::new();
    }

    let folder_dir = base_dir.join("img").join(folder);
    if !folder_dir.is_dir() {
        tracing::debug!(folder = %folder_dir.display(), "Unit image folder missing");
        return Vec::new();
    }

    (1..=total)
        .map(|i| folder_dir.join(format!("{}_{}.{}", folder, i, IMAGE_EXT)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn showcase_dir_with(folder: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("img").join(folder)).unwrap();
        dir
    }

    #[test]
    fn test_paths_follow_naming_convention() {
        let dir = showcase_dir_with("fewo1");
        let paths = unit_image_paths(dir.path(), "fewo1", 3);

        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("img/fewo1/fewo1_1.webp"));
        assert!(paths[1].ends_with("img/fewo1/fewo1_2.webp"));
        assert!(paths[2].ends_with("img/fewo1/fewo1_3.webp"));
    }

    #[test]
    fn test_missing_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(unit_image_paths(dir.path(), "fewo1", 3).is_empty());
    }

    #[test]
    fn test_zero_total_is_empty() {
        let dir = showcase_dir_with("fewo1");
        assert!(unit_image_paths(dir.path(), "fewo1", 0).is_empty());
    }

    #[test]
    fn test_empty_folder_name_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(unit_image_paths(dir.path(), "", 5).is_empty());
    }
}
