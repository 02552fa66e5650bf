use std::fmt::Write as _;

use crate::analysis::{AnalysisResult, Mission};

pub const NO_MISSIONS_MESSAGE: &str = "暂无有效记录（可能都 < 1 分钟或未找到仲裁标记）";

pub fn format_duration(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|value| value.is_finite()) else {
        return "-".to_string();
    };

    if seconds < 60.0 {
        return format!("{seconds:.1}s");
    }

    let whole_seconds = seconds as u64;
    let minutes = whole_seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m {}s", whole_seconds % 60);
    }

    format!("{}h {}m", minutes / 60, minutes % 60)
}

fn format_optional_count(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |count| count.to_string())
}

fn format_optional_rate(value: Option<f64>) -> String {
    value
        .filter(|rate| rate.is_finite())
        .map_or_else(|| "-".to_string(), |rate| format!("{rate:.2}"))
}

pub fn render_mission(position: usize, mission: &Mission) -> String {
    let mut block = String::new();
    let _ = writeln!(block, "最近有效第 {position} 把");
    if let Some(location) = mission.location_label() {
        let _ = writeln!(block, "{location}");
    }
    let _ = writeln!(block, "总时间：{}", format_duration(mission.total_sec));
    let _ = writeln!(block, "敌人生成：{}", format_optional_count(mission.enemy_spawned));
    let _ = writeln!(block, "无人机生成：{}", mission.drones);
    let _ = writeln!(
        block,
        "无人机生成/分钟：{}",
        format_optional_rate(mission.drones_per_min)
    );
    block
}

pub fn render_report(result: &AnalysisResult) -> String {
    let mut report = String::new();

    for warning in &result.warnings {
        let _ = writeln!(report, "提示：{warning}");
    }

    if result.missions.is_empty() {
        let _ = writeln!(report, "{NO_MISSIONS_MESSAGE}");
        return report;
    }

    for (position, mission) in result.missions.iter().enumerate() {
        report.push('\n');
        report.push_str(&render_mission(position + 1, mission));
    }

    report
}
