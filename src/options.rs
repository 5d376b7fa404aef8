use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options for one taroize run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaroizeOptions {
    /// Project root that `/`-prefixed `src` paths resolve against.
    pub root_path: PathBuf,
}

impl Default for TaroizeOptions {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("."),
        }
    }
}

impl TaroizeOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_root(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }
}
