use regex::Regex;

const SCRIPT_INFO_TAG: &str = "Script [Info]:";
const GAME_RULES_TAG: &str = "GameRulesImpl - changing state";
const ON_AGENT_CREATED_TAG: &str = "OnAgentCreated";
const SPAWNED_TAG: &str = "Spawned";

lazy_static::lazy_static! {
    static ref TIME_PREFIX: Regex =
        Regex::new(r"^([0-9]+(?:\.[0-9]+)?)\s+").expect("static pattern is valid");
    static ref START_BY_NAME: Regex = Regex::new(
        r"Script \[Info\]: ThemedSquadOverlay\.lua: Mission name:\s*(.+?)\s*-\s*仲裁"
    )
    .expect("static pattern is valid");
    static ref START_BY_HOST: Regex = Regex::new(
        r#"Script \[Info\]: ThemedSquadOverlay\.lua: Host loading .*"name":"([^"]+)_EliteAlert""#
    )
    .expect("static pattern is valid");
    static ref END_MARKER: Regex = Regex::new(
        r"Script \[Info\]: Background\.lua: EliteAlertMission at ([A-Za-z0-9_]+)(?-u:\b)"
    )
    .expect("static pattern is valid");
    static ref ON_AGENT_CREATED: Regex =
        Regex::new(r"AI \[Info\]: OnAgentCreated(?-u:\b)").expect("static pattern is valid");
    static ref SHIELD_DRONE: Regex = Regex::new(
        r"AI \[Info\]: OnAgentCreated /Npc/CorpusEliteShieldDroneAgent[0-9]*(?-u:\b)"
    )
    .expect("static pattern is valid");
    static ref SPAWNED: Regex =
        Regex::new(r"(?-u:\b)Spawned\s+([0-9]+)(?-u:\b)").expect("static pattern is valid");
}

const STATE_STARTED: &str =
    "GameRulesImpl - changing state from SS_WAITING_FOR_PLAYERS to SS_STARTED";
const STATE_ENDING: &str = "GameRulesImpl - changing state from SS_STARTED to SS_ENDING";

#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    StartByName { name: String },
    StartByHost { node_id: String },
    End { node_id: String },
    StateStarted,
    StateEnding,
    OnAgentCreated,
    ShieldDrone,
    Spawned { count: u64 },
}

impl LogEvent {
    pub fn is_start(&self) -> bool {
        matches!(self, Self::StartByName { .. } | Self::StartByHost { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedLine {
    pub timestamp: Option<f64>,
    pub events: Vec<LogEvent>,
}

impl ClassifiedLine {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn start_by_name(&self) -> Option<&str> {
        self.events.iter().find_map(|event| match event {
            LogEvent::StartByName { name } => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn start_by_host(&self) -> Option<&str> {
        self.events.iter().find_map(|event| match event {
            LogEvent::StartByHost { node_id } => Some(node_id.as_str()),
            _ => None,
        })
    }

    pub fn has_start(&self) -> bool {
        self.events.iter().any(LogEvent::is_start)
    }
}

pub fn classify_line(line: &str) -> ClassifiedLine {
    let mut events = Vec::new();

    if line.contains(SCRIPT_INFO_TAG) {
        if let Some(captures) = START_BY_NAME.captures(line) {
            events.push(LogEvent::StartByName {
                name: captures[1].trim().to_string(),
            });
        }
        if let Some(captures) = START_BY_HOST.captures(line) {
            events.push(LogEvent::StartByHost {
                node_id: captures[1].to_string(),
            });
        }
    }

    if line.contains(GAME_RULES_TAG) {
        if line.contains(STATE_STARTED) {
            events.push(LogEvent::StateStarted);
        }
        if line.contains(STATE_ENDING) {
            events.push(LogEvent::StateEnding);
        }
    }

    if line.contains(ON_AGENT_CREATED_TAG) {
        if ON_AGENT_CREATED.is_match(line) {
            events.push(LogEvent::OnAgentCreated);
        }
        if SHIELD_DRONE.is_match(line) {
            events.push(LogEvent::ShieldDrone);
        }
    }

    if line.contains(SPAWNED_TAG) {
        if let Some(count) = SPAWNED
            .captures(line)
            .and_then(|captures| captures[1].parse::<u64>().ok())
        {
            events.push(LogEvent::Spawned { count });
        }
    }

    if line.contains(SCRIPT_INFO_TAG) {
        if let Some(captures) = END_MARKER.captures(line) {
            events.push(LogEvent::End {
                node_id: captures[1].to_string(),
            });
        }
    }

    if events.is_empty() {
        return ClassifiedLine::default();
    }

    ClassifiedLine {
        timestamp: parse_leading_timestamp(line),
        events,
    }
}

pub fn parse_leading_timestamp(line: &str) -> Option<f64> {
    let captures = TIME_PREFIX.captures(line)?;
    captures[1]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::{classify_line, parse_leading_timestamp, LogEvent};

    #[test]
    fn parses_leading_timestamps_only() {
        assert_eq!(parse_leading_timestamp("123.456 Sys [Info]: x"), Some(123.456));
        assert_eq!(parse_leading_timestamp("42\tGame [Info]: x"), Some(42.0));
        assert_eq!(parse_leading_timestamp("Sys [Info]: 12.0 later"), None);
        assert_eq!(parse_leading_timestamp("12.5"), None);
        assert_eq!(parse_leading_timestamp("1.2.3 x"), None);
    }

    #[test]
    fn classifies_mission_name_start_with_trimmed_name() {
        let line = classify_line(
            "100.000 Script [Info]: ThemedSquadOverlay.lua: Mission name:   兰麦地亚 (海王星)  - 仲裁",
        );
        assert_eq!(line.timestamp, Some(100.0));
        assert_eq!(line.start_by_name(), Some("兰麦地亚 (海王星)"));
        assert!(line.has_start());
    }

    #[test]
    fn ignores_mission_names_without_the_arbitration_suffix() {
        let line = classify_line(
            "100.000 Script [Info]: ThemedSquadOverlay.lua: Mission name: Hydron (Sedna) - Defense",
        );
        assert!(line.is_empty());
        assert_eq!(line.timestamp, None);
    }

    #[test]
    fn classifies_host_loading_start() {
        let line = classify_line(
            r#"100.050 Script [Info]: ThemedSquadOverlay.lua: Host loading {"name":"SolNode401_EliteAlert","other":1}"#,
        );
        assert_eq!(line.start_by_host(), Some("SolNode401"));
        assert_eq!(line.start_by_name(), None);
    }

    #[test]
    fn classifies_end_marker_node() {
        let line =
            classify_line("320.000 Script [Info]: Background.lua: EliteAlertMission at SolNode401");
        assert_eq!(
            line.events,
            vec![LogEvent::End {
                node_id: "SolNode401".to_string()
            }]
        );
    }

    #[test]
    fn classifies_state_transitions() {
        let started = classify_line(
            "110.000 Game [Info]: GameRulesImpl - changing state from SS_WAITING_FOR_PLAYERS to SS_STARTED",
        );
        assert_eq!(started.events, vec![LogEvent::StateStarted]);

        let ending = classify_line(
            "310.000 Game [Info]: GameRulesImpl - changing state from SS_STARTED to SS_ENDING",
        );
        assert_eq!(ending.events, vec![LogEvent::StateEnding]);
    }

    #[test]
    fn shield_drone_line_is_also_an_agent_creation_with_spawn_count() {
        let line = classify_line(
            "250.000 AI [Info]: OnAgentCreated /Npc/CorpusEliteShieldDroneAgent2 Spawned 42",
        );
        assert_eq!(
            line.events,
            vec![
                LogEvent::OnAgentCreated,
                LogEvent::ShieldDrone,
                LogEvent::Spawned { count: 42 }
            ]
        );
    }

    #[test]
    fn other_agents_are_not_shield_drones() {
        let line = classify_line("200.000 AI [Info]: OnAgentCreated /Npc/CorpusEliteShieldDroneAgentX");
        assert_eq!(line.events, vec![LogEvent::OnAgentCreated]);

        let line = classify_line("200.000 AI [Info]: OnAgentCreatedLater /Npc/Grineer");
        assert!(line.is_empty());
    }

    #[test]
    fn word_boundaries_are_ascii_only() {
        let line = classify_line(
            "250.000 AI [Info]: OnAgentCreated /Npc/CorpusEliteShieldDroneAgent1护盾 Spawned 7个",
        );
        assert_eq!(
            line.events,
            vec![
                LogEvent::OnAgentCreated,
                LogEvent::ShieldDrone,
                LogEvent::Spawned { count: 7 }
            ]
        );

        let line =
            classify_line("320.000 Script [Info]: Background.lua: EliteAlertMission at SolNode401结束");
        assert_eq!(
            line.events,
            vec![LogEvent::End {
                node_id: "SolNode401".to_string()
            }]
        );

        assert_eq!(parse_leading_timestamp("١٢٣ Sys [Info]: x"), None);
    }

    #[test]
    fn unparseable_spawn_count_is_dropped() {
        let line = classify_line(
            "1.0 AI [Info]: OnAgentCreated /Npc/Foo Spawned 99999999999999999999999",
        );
        assert_eq!(line.events, vec![LogEvent::OnAgentCreated]);
    }

    #[test]
    fn untimestamped_marker_still_classifies() {
        let line = classify_line("Script [Info]: Background.lua: EliteAlertMission at SolNode1");
        assert_eq!(line.timestamp, None);
        assert_eq!(line.events.len(), 1);
    }
}
