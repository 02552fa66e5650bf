use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StartKind {
    MissionName,
    HostLoading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissionStatus {
    Ok,
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlushReason {
    NextMissionStart,
    EndOfStream,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeMeta {
    pub node_id: String,
    pub node_name: String,
    pub system_name: String,
    pub mission_type: String,
    pub faction: String,
}

impl NodeMeta {
    pub fn display_line(&self) -> Option<String> {
        let parts = [
            self.node_name.as_str(),
            self.system_name.as_str(),
            self.mission_type.as_str(),
            self.faction.as_str(),
        ]
        .into_iter()
        .filter(|value| !value.trim().is_empty())
        .collect::<Vec<&str>>();

        if parts.is_empty() {
            return None;
        }

        Some(parts.join(" · "))
    }
}

pub trait NodeLookup {
    fn lookup(&self, node_id: &str) -> Option<&NodeMeta>;
}

impl NodeLookup for HashMap<String, NodeMeta> {
    fn lookup(&self, node_id: &str) -> Option<&NodeMeta> {
        self.get(node_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    /// 1-based position in the result; zero until assembled.
    pub index: usize,
    pub node_id: String,
    pub mission_name: String,
    pub start_kind: StartKind,
    pub start_line: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enemy_spawned: Option<u64>,
    pub drones: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drones_per_min: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_started_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_ending_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_duration_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_on_agent_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_on_agent_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_agent_span_sec: Option<f64>,

    pub status: MissionStatus,
    pub flush_reason: FlushReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeMeta>,
}

impl Mission {
    pub fn location_label(&self) -> Option<String> {
        if self.node_id.is_empty() {
            return None;
        }

        self.node
            .as_ref()
            .and_then(NodeMeta::display_line)
            .or_else(|| Some(self.node_id.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub missions: Vec<Mission>,
    pub warnings: Vec<String>,
}

impl AnalysisResult {
    pub fn attach_node_metadata(&mut self, nodes: &dyn NodeLookup) {
        for mission in &mut self.missions {
            if mission.node_id.is_empty() {
                continue;
            }
            mission.node = nodes.lookup(&mission.node_id).cloned();
        }
    }
}
