use serde::Deserialize;

/// Number of photo-grid cells shown per unit panel. Units with more images
/// than this get an "All N photos" button on the last cell.
pub const GRID_CELLS: usize = 5;

/// Top-level shape of `units.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowcaseData {
    pub hero_image: String,
    #[serde(default)]
    pub about_images: Vec<AboutImage>,
    #[serde(default)]
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AboutImage {
    pub src: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub tall: bool,
}

/// One rental unit: the photo folder plus the info-card content.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub name: String,
    #[serde(default)]
    pub meta: String,
    #[serde(default)]
    pub description: String,
    pub folder: String,
    pub total_images: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub hidden_tags: Vec<String>,
    pub cta: Option<Cta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cta {
    pub label: String,
    pub href: String,
}

impl Unit {
    /// Number of grid cells this unit's panel shows.
    pub fn grid_count(&self) -> usize {
        (self.total_images as usize).min(GRID_CELLS)
    }

    /// Whether the last grid cell carries the "All N photos" button.
    pub fn has_more_photos(&self) -> bool {
        self.total_images as usize > self.grid_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_count_caps_at_five() {
        let mut unit = sample_unit(12);
        assert_eq!(unit.grid_count(), 5);
        assert!(unit.has_more_photos());

        unit.total_images = 3;
        assert_eq!(unit.grid_count(), 3);
        assert!(!unit.has_more_photos());

        unit.total_images = 5;
        assert_eq!(unit.grid_count(), 5);
        assert!(!unit.has_more_photos());
    }

    #[test]
    fn test_unit_deserializes_camel_case() {
        let json = r#"{
            "name": "Fewo Eins",
            "meta": "2 Zimmer | 45 m²",
            "description": "Helle Wohnung.",
            "folder": "fewo1",
            "totalImages": 8,
            "tags": ["WLAN"],
            "hiddenTags": ["Parkplatz"],
            "cta": { "label": "Buchen", "href": "https://example.test" }
        }"#;
        let unit: Unit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.folder, "fewo1");
        assert_eq!(unit.total_images, 8);
        assert_eq!(unit.hidden_tags, vec!["Parkplatz"]);
        assert_eq!(unit.cta.unwrap().label, "Buchen");
    }

    fn sample_unit(total: u32) -> Unit {
        Unit {
            name: "Unit".into(),
            meta: String::new(),
            description: String::new(),
            folder: "unit".into(),
            total_images: total,
            tags: Vec::new(),
            hidden_tags: Vec::new(),
            cta: None,
        }
    }
}
