use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use crate::error::{Error, Result};
use crate::topology::SkiAreaTopology;

/// Directory (under the data dir) that holds one JSON document per ski area.
const SKI_AREA_DIR: &str = "ski_areas";

/// Maximum number of fuzzy suggestions attached to an unknown-id error.
const MAX_SUGGESTIONS: usize = 3;

/// Minimum similarity for an id to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// Topology lookup by ski-area id.
pub trait TopologySource {
    fn load(&self, ski_area_id: &str) -> Result<SkiAreaTopology>;
}

/// Resolve the default topology store using platform-specific project directories.
pub fn default_topology_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "skisun", "skisun").ok_or(Error::ProjectDirsUnavailable)?;
    Ok(dirs.data_dir().join(SKI_AREA_DIR))
}

/// File-backed store reading `<root>/<ski_area_id>.json`.
#[derive(Debug, Clone)]
pub struct JsonTopologyStore {
    root: PathBuf,
}

impl JsonTopologyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `data_dir/ski_areas`, or the platform default.
    pub fn from_data_dir(data_dir: Option<&Path>) -> Result<Self> {
        let root = match data_dir {
            Some(dir) => dir.join(SKI_AREA_DIR),
            None => default_topology_dir()?,
        };
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, ski_area_id: &str) -> PathBuf {
        self.root.join(format!("{ski_area_id}.json"))
    }

    /// Ids of every ski area in the store, sorted.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn suggestions(&self, ski_area_id: &str) -> Vec<String> {
        let mut scored: Vec<(f64, String)> = self
            .list_ids()
            .unwrap_or_default()
            .into_iter()
            .map(|id| (strsim::jaro_winkler(ski_area_id, &id), id))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, id)| id)
            .collect()
    }
}

impl TopologySource for JsonTopologyStore {
    fn load(&self, ski_area_id: &str) -> Result<SkiAreaTopology> {
        let valid_id = !ski_area_id.is_empty()
            && ski_area_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        let path = self.path_for(ski_area_id);
        if !valid_id || !path.exists() {
            return Err(Error::UnknownSkiArea {
                id: ski_area_id.to_string(),
                suggestions: self.suggestions(ski_area_id),
            });
        }

        debug!(path = %path.display(), "loading ski area topology");
        let topology = SkiAreaTopology::from_path(&path)?;
        if topology.id != ski_area_id {
            return Err(Error::invalid_topology(format!(
                "{} declares id {}",
                path.display(),
                topology.id
            )));
        }
        Ok(topology)
    }
}
