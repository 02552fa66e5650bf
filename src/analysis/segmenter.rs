use super::events::{ClassifiedLine, LogEvent};
use super::model::{FlushReason, Mission, MissionStatus, StartKind};

#[derive(Debug)]
struct Run {
    start_line: u64,
    start_kind: StartKind,
    start_time: Option<f64>,
    end_time: Option<f64>,
    end_line: Option<u64>,
    mission_name: Option<String>,
    node_id: Option<String>,
    drones: u64,
    last_spawned: Option<u64>,
    first_on_agent_time: Option<f64>,
    last_on_agent_time: Option<f64>,
    state_started_time: Option<f64>,
    state_ending_time: Option<f64>,
    in_started_state: bool,
    has_seen_ending: bool,
}

impl Run {
    fn open(line_number: u64, line: &ClassifiedLine) -> Option<Self> {
        let mission_name = line.start_by_name().map(str::to_string);
        let node_id = line.start_by_host().map(str::to_string);

        let start_kind = if mission_name.is_some() {
            StartKind::MissionName
        } else if node_id.is_some() {
            StartKind::HostLoading
        } else {
            return None;
        };

        Some(Self {
            start_line: line_number,
            start_kind,
            start_time: line.timestamp,
            end_time: None,
            end_line: None,
            mission_name,
            node_id,
            drones: 0,
            last_spawned: None,
            first_on_agent_time: None,
            last_on_agent_time: None,
            state_started_time: None,
            state_ending_time: None,
            in_started_state: false,
            has_seen_ending: false,
        })
    }

    fn in_counting_window(&self) -> bool {
        self.in_started_state && !self.has_seen_ending
    }

    fn apply(&mut self, line_number: u64, line: &ClassifiedLine) {
        let timestamp = line.timestamp;

        for event in &line.events {
            match event {
                // Only reachable for the opening line; later starts are boundaries.
                LogEvent::StartByName { name } => {
                    if self.mission_name.is_none() {
                        self.mission_name = Some(name.clone());
                    }
                }
                LogEvent::StartByHost { node_id } => {
                    if self.node_id.is_none() {
                        self.node_id = Some(node_id.clone());
                    }
                }
                LogEvent::StateStarted => {
                    self.in_started_state = true;
                    if self.state_started_time.is_none() {
                        self.state_started_time = timestamp;
                    }
                }
                LogEvent::StateEnding => {
                    self.has_seen_ending = true;
                    if timestamp.is_some() {
                        self.state_ending_time = timestamp;
                    }
                }
                LogEvent::OnAgentCreated if self.in_counting_window() => {
                    self.record_on_agent_created(timestamp);
                }
                LogEvent::ShieldDrone if self.in_counting_window() => {
                    self.drones = self.drones.saturating_add(1);
                }
                LogEvent::Spawned { count } if self.in_counting_window() => {
                    self.last_spawned = Some(*count);
                }
                LogEvent::End { node_id } => {
                    self.accept_end_marker(node_id, timestamp, line_number);
                }
                _ => {}
            }
        }
    }

    fn record_on_agent_created(&mut self, timestamp: Option<f64>) {
        let Some(timestamp) = timestamp else {
            return;
        };

        match self.first_on_agent_time {
            None => {
                self.first_on_agent_time = Some(timestamp);
                self.last_on_agent_time = Some(timestamp);
            }
            Some(first) if timestamp >= first => {
                self.last_on_agent_time = Some(timestamp);
            }
            Some(_) => {}
        }
    }

    fn accept_end_marker(&mut self, end_node_id: &str, timestamp: Option<f64>, line_number: u64) {
        if let Some(node_id) = self.node_id.as_deref() {
            if node_id != end_node_id {
                tracing::debug!(
                    line_number,
                    run_node_id = %node_id,
                    end_node_id = %end_node_id,
                    "Ignoring end marker for a different node"
                );
                return;
            }
        }

        if let (Some(start_time), Some(end_time)) = (self.start_time, timestamp) {
            if end_time < start_time {
                tracing::debug!(
                    line_number,
                    start_time,
                    end_time,
                    "Ignoring end marker timestamped before the run start"
                );
                return;
            }
        }

        if self.node_id.is_none() {
            self.node_id = Some(end_node_id.to_string());
        }
        self.end_line = Some(line_number);
        if timestamp.is_some() {
            self.end_time = timestamp;
        }
    }

    fn into_mission(self, flush_reason: FlushReason) -> Mission {
        let duration_sec = positive_span(self.start_time, self.end_time);
        let on_agent_span_sec = positive_span(self.first_on_agent_time, self.last_on_agent_time);
        let state_duration_sec = positive_span(self.state_started_time, self.state_ending_time);
        let total_sec = pick_total_sec(state_duration_sec, on_agent_span_sec, duration_sec);

        let status = if self.end_line.is_some() || self.has_seen_ending {
            MissionStatus::Ok
        } else {
            MissionStatus::Incomplete
        };
        let note = diagnostic_note(
            status,
            flush_reason,
            self.node_id.as_deref(),
            self.first_on_agent_time.is_some(),
        );

        Mission {
            index: 0,
            node_id: self.node_id.unwrap_or_default(),
            mission_name: self.mission_name.unwrap_or_default(),
            start_kind: self.start_kind,
            start_line: self.start_line,
            end_line: self.end_line,
            total_sec,
            enemy_spawned: self.last_spawned,
            drones: self.drones,
            drones_per_min: per_minute(self.drones, total_sec),
            start_time: self.start_time,
            end_time: self.end_time,
            duration_sec,
            state_started_time: self.state_started_time,
            state_ending_time: self.state_ending_time,
            state_duration_sec,
            first_on_agent_time: self.first_on_agent_time,
            last_on_agent_time: self.last_on_agent_time,
            on_agent_span_sec,
            status,
            flush_reason,
            note,
            node: None,
        }
    }
}

fn diagnostic_note(
    status: MissionStatus,
    flush_reason: FlushReason,
    node_id: Option<&str>,
    saw_on_agent: bool,
) -> Option<String> {
    match status {
        MissionStatus::Ok if saw_on_agent => None,
        MissionStatus::Ok => Some("区间内未找到 OnAgentCreated".to_string()),
        MissionStatus::Incomplete => {
            let boundary = match flush_reason {
                FlushReason::NextMissionStart => "边界：下一个任务开始",
                FlushReason::EndOfStream => "文件结束",
            };
            Some(match node_id {
                Some(node_id) => format!("{boundary}（NodeID: {node_id}）"),
                None => format!("{boundary}（NodeID 为空，无法匹配结束标记）"),
            })
        }
    }
}

fn positive_span(from: Option<f64>, to: Option<f64>) -> Option<f64> {
    let span = to? - from?;
    (span.is_finite() && span > 0.0).then_some(span)
}

// State duration, then on-agent span, then raw start/end.
pub(crate) fn pick_total_sec(
    state_duration_sec: Option<f64>,
    on_agent_span_sec: Option<f64>,
    duration_sec: Option<f64>,
) -> Option<f64> {
    [state_duration_sec, on_agent_span_sec, duration_sec]
        .into_iter()
        .flatten()
        .find(|value| value.is_finite() && *value > 0.0)
}

pub(crate) fn per_minute(count: u64, span_sec: Option<f64>) -> Option<f64> {
    let span_sec = span_sec.filter(|value| value.is_finite() && *value > 0.0)?;
    let rate = count as f64 / (span_sec / 60.0);
    rate.is_finite().then_some(rate)
}

#[derive(Debug, Default)]
pub struct Segmenter {
    current: Option<Run>,
    runs_flushed: u64,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs_flushed(&self) -> u64 {
        self.runs_flushed
    }

    pub fn has_open_run(&self) -> bool {
        self.current.is_some()
    }

    /// Feeds one line; returns the previous run when this line starts a new one.
    pub fn consume(&mut self, line_number: u64, line: &ClassifiedLine) -> Option<Mission> {
        if line.is_empty() {
            return None;
        }

        if let Some(run) = self.current.as_mut() {
            if !line.has_start() || run.start_line == line_number {
                run.apply(line_number, line);
                return None;
            }
        }

        let flushed = self.flush(FlushReason::NextMissionStart);
        self.current = Run::open(line_number, line);
        flushed
    }

    pub fn finish(&mut self) -> Option<Mission> {
        self.flush(FlushReason::EndOfStream)
    }

    fn flush(&mut self, reason: FlushReason) -> Option<Mission> {
        let run = self.current.take()?;
        let mission = run.into_mission(reason);
        self.runs_flushed += 1;

        tracing::debug!(
            start_line = mission.start_line,
            node_id = %mission.node_id,
            reason = ?reason,
            total_sec = ?mission.total_sec,
            drones = mission.drones,
            "Flushed mission run"
        );

        Some(mission)
    }
}
