//! Persistence for created eval ids.
//!
//! Eval configurations are created once and reused across runs; their ids
//! live in a small JSON file next to the datasets.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

pub const EVAL_IDS_FILE: &str = "eval-ids.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalIds {
    #[serde(rename = "imageQuality", skip_serializing_if = "Option::is_none")]
    pub image_quality: Option<String>,
    #[serde(rename = "videoIdentity", skip_serializing_if = "Option::is_none")]
    pub video_identity: Option<String>,
    #[serde(rename = "remixBW", skip_serializing_if = "Option::is_none")]
    pub remix_bw: Option<String>,
}

pub struct EvalIdStore {
    path: PathBuf,
}

impl EvalIdStore {
    pub fn new(evals_dir: &Path) -> Self {
        Self {
            path: evals_dir.join(EVAL_IDS_FILE),
        }
    }

    /// Load stored ids, treating a missing or unreadable file as empty.
    pub fn load(&self) -> EvalIds {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Load ids for a run, requiring that setup has already happened.
    pub fn load_required(&self) -> AppResult<EvalIds> {
        let ids = self.load();
        if ids.image_quality.is_none() && ids.video_identity.is_none() && ids.remix_bw.is_none() {
            return Err(AppError::ConfigurationError(
                "Eval IDs not found. Run `eval setup` first.".to_string(),
            ));
        }
        Ok(ids)
    }

    pub fn save(&self, ids: &EvalIds) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(ids)?)?;
        Ok(())
    }
}
