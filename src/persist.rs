//! Versioned JSON artifact for team tendency tables, so a later run can join
//! tendencies fitted on a different season range.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::tendency::TeamTendencies;

pub const TENDENCY_ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TendencyArtifact {
    pub version: u32,
    pub generated_at: String,
    pub seasons: Vec<i32>,
    pub tendencies: TeamTendencies,
}

impl TendencyArtifact {
    pub fn new(tendencies: TeamTendencies) -> Self {
        let mut seasons: Vec<i32> = tendencies
            .tables()
            .iter()
            .flat_map(|t| t.seasons())
            .collect();
        seasons.sort_unstable();
        seasons.dedup();
        Self {
            version: TENDENCY_ARTIFACT_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            seasons,
            tendencies,
        }
    }
}

/// Writes through a temp file and renames it over `path`.
pub fn save_tendencies(path: &Path, tendencies: &TeamTendencies) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let artifact = TendencyArtifact::new(tendencies.clone());
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(&artifact).context("serialize tendencies")?;
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).context("swap tendency artifact")?;
    Ok(())
}

pub fn load_tendencies(path: &Path) -> Result<TendencyArtifact> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let artifact: TendencyArtifact =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    if artifact.version != TENDENCY_ARTIFACT_VERSION {
        bail!(
            "tendency artifact {} has version {}, expected {}",
            path.display(),
            artifact.version,
            TENDENCY_ARTIFACT_VERSION
        );
    }
    Ok(artifact)
}
