use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::NodeMeta;

#[derive(Debug, Error)]
pub enum NodeMapError {
    #[error("failed to read node map {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse node map {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn read_node_map(path: &Path) -> Result<HashMap<String, NodeMeta>, NodeMapError> {
    let raw_json = std::fs::read_to_string(path).map_err(|source| NodeMapError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_node_map(&raw_json).map_err(|source| NodeMapError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_node_map(raw_json: &str) -> Result<HashMap<String, NodeMeta>, serde_json::Error> {
    let mut nodes = serde_json::from_str::<HashMap<String, NodeMeta>>(raw_json)?;
    for (node_id, meta) in nodes.iter_mut() {
        if meta.node_id.is_empty() {
            meta.node_id = node_id.clone();
        }
    }
    Ok(nodes)
}
