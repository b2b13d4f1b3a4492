use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

/// Static metadata for one prefecture, as listed in `prefectures.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prefecture {
    #[serde(rename = "prefecture")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub population: Option<u64>,
    pub lat: f64,
    pub lng: f64,
    /// Leader line angle in degrees, clockwise from north
    #[serde(rename = "lr")]
    pub leader_angle: f64,
    /// Leader line length in pixels at the reference zoom
    #[serde(rename = "ll")]
    pub leader_length: f64,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse prefecture list: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate prefecture id {0:?}")]
    Duplicate(String),
}

/// The set of entities the tracker knows about, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    prefectures: BTreeMap<String, Prefecture>,
}

impl Catalog {
    pub fn new(prefectures: impl IntoIterator<Item = Prefecture>) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for prefecture in prefectures {
            let id = prefecture.id.clone();
            if map.insert(id.clone(), prefecture).is_some() {
                return Err(CatalogError::Duplicate(id));
            }
        }
        Ok(Self { prefectures: map })
    }

    pub fn from_json(body: &[u8]) -> Result<Self, CatalogError> {
        let prefectures: Vec<Prefecture> = serde_json::from_slice(body)?;
        Self::new(prefectures)
    }

    pub fn get(&self, id: &str) -> Option<&Prefecture> {
        self.prefectures.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.prefectures.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.prefectures.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prefecture> {
        self.prefectures.values()
    }

    pub fn len(&self) -> usize {
        self.prefectures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefectures.is_empty()
    }

    /// Sum of known populations. Prefectures without one are skipped.
    pub fn total_population(&self) -> u64 {
        self.prefectures.values().filter_map(|p| p.population).sum()
    }
}

pub async fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let body = fs::read(path).await.map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Catalog::from_json(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"prefecture": "13", "name": "東京都", "population": 14047594, "lat": 35.69, "lng": 139.69, "lr": 120, "ll": 80},
        {"prefecture": "01", "name": "北海道", "lat": 43.06, "lng": 141.35, "lr": -30, "ll": 60}
    ]"#;

    #[test]
    fn parses_metadata_and_orders_by_id() {
        let catalog = Catalog::from_json(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["01", "13"]);

        let tokyo = catalog.get("13").unwrap();
        assert_eq!(tokyo.name, "東京都");
        assert_eq!(tokyo.leader_angle, 120.0);
        assert_eq!(tokyo.leader_length, 80.0);
        assert_eq!(catalog.get("01").unwrap().population, None);
        assert_eq!(catalog.total_population(), 14_047_594);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let body = r#"[
            {"prefecture": "13", "name": "a", "lat": 0, "lng": 0, "lr": 0, "ll": 0},
            {"prefecture": "13", "name": "b", "lat": 0, "lng": 0, "lr": 0, "ll": 0}
        ]"#;
        assert!(matches!(
            Catalog::from_json(body.as_bytes()),
            Err(CatalogError::Duplicate(id)) if id == "13"
        ));
    }
}
