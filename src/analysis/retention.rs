use std::collections::VecDeque;

use super::model::Mission;

#[derive(Debug)]
pub struct RetentionBuffer {
    capacity: usize,
    min_duration_sec: f64,
    missions: VecDeque<Mission>,
}

impl RetentionBuffer {
    pub fn new(capacity: usize, min_duration_sec: f64) -> Self {
        Self {
            capacity,
            min_duration_sec,
            missions: VecDeque::with_capacity(capacity.saturating_add(1)),
        }
    }

    pub fn qualifies(&self, mission: &Mission) -> bool {
        mission
            .total_sec
            .is_some_and(|total_sec| total_sec >= self.min_duration_sec)
    }

    pub fn offer(&mut self, mission: Mission) -> bool {
        if self.capacity == 0 || !self.qualifies(&mission) {
            return false;
        }

        self.missions.push_back(mission);
        while self.missions.len() > self.capacity {
            self.missions.pop_front();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.missions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    pub fn into_missions(self) -> Vec<Mission> {
        self.missions.into()
    }
}

#[cfg(test)]
mod tests {
    use super::RetentionBuffer;
    use crate::analysis::model::{FlushReason, Mission, MissionStatus, StartKind};

    fn mission(node_id: &str, total_sec: Option<f64>) -> Mission {
        Mission {
            index: 0,
            node_id: node_id.to_string(),
            mission_name: String::new(),
            start_kind: StartKind::HostLoading,
            start_line: 1,
            end_line: None,
            total_sec,
            enemy_spawned: None,
            drones: 0,
            drones_per_min: None,
            start_time: None,
            end_time: None,
            duration_sec: None,
            state_started_time: None,
            state_ending_time: None,
            state_duration_sec: None,
            first_on_agent_time: None,
            last_on_agent_time: None,
            on_agent_span_sec: None,
            status: MissionStatus::Ok,
            flush_reason: FlushReason::EndOfStream,
            note: None,
            node: None,
        }
    }

    #[test]
    fn keeps_the_last_n_qualifying_missions_in_order() {
        let mut buffer = RetentionBuffer::new(2, 60.0);
        assert!(buffer.offer(mission("A", Some(100.0))));
        assert!(!buffer.offer(mission("short", Some(45.0))));
        assert!(buffer.offer(mission("B", Some(60.0))));
        assert!(!buffer.offer(mission("none", None)));
        assert!(buffer.offer(mission("C", Some(900.0))));

        let kept = buffer
            .into_missions()
            .into_iter()
            .map(|mission| mission.node_id)
            .collect::<Vec<String>>();
        assert_eq!(kept, vec!["B", "C"]);
    }

    #[test]
    fn zero_threshold_still_requires_a_duration() {
        let mut buffer = RetentionBuffer::new(3, 0.0);
        assert!(!buffer.offer(mission("none", None)));
        assert!(buffer.offer(mission("A", Some(0.5))));
        assert_eq!(buffer.len(), 1);
    }
}
