mod error;
mod events;
mod model;
mod reader;
mod retention;
mod segmenter;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;

use crate::settings::{AnalysisOptions, MIN_TAIL_WINDOW_BYTES};
use reader::LineReader;

pub use error::AnalysisError;
pub use events::{classify_line, parse_leading_timestamp, ClassifiedLine, LogEvent};
pub use model::{
    AnalysisResult, FlushReason, Mission, MissionStatus, NodeLookup, NodeMeta, StartKind,
};
pub use retention::RetentionBuffer;
pub use segmenter::Segmenter;

struct ScanOutcome {
    retained: RetentionBuffer,
    lines_read: u64,
    runs_flushed: u64,
}

pub fn analyze_reader<R: Read>(
    reader: R,
    total_bytes: Option<u64>,
    options: &AnalysisOptions,
    mut progress: Option<&mut dyn FnMut(f64)>,
) -> Result<AnalysisResult, AnalysisError> {
    let options = options.normalized();
    let mut report_progress = |fraction: f64| {
        if let Some(sink) = progress.as_mut() {
            sink(fraction);
        }
    };

    let outcome = scan(reader, total_bytes, &options, false, &mut report_progress)?;
    Ok(assemble_result(outcome, &options))
}

pub fn analyze_file(
    path: &Path,
    options: &AnalysisOptions,
    progress: Option<&mut dyn FnMut(f64)>,
) -> Result<AnalysisResult, AnalysisError> {
    let file = File::open(path).map_err(|error| AnalysisError::open(path, error))?;
    let metadata = file
        .metadata()
        .map_err(|error| AnalysisError::metadata(path, error))?;
    let total_bytes = metadata.is_file().then(|| metadata.len());

    tracing::debug!(
        log_path = %path.display(),
        file_size_bytes = ?total_bytes,
        "Analyzing log file"
    );

    analyze_reader(file, total_bytes, options, progress)
}

// Line numbers in the result are relative to the window that produced it.
pub fn analyze_file_tail(
    path: &Path,
    options: &AnalysisOptions,
    initial_tail_bytes: u64,
    mut progress: Option<&mut dyn FnMut(f64)>,
) -> Result<AnalysisResult, AnalysisError> {
    let options = options.normalized();
    let file_size = std::fs::metadata(path)
        .map_err(|error| AnalysisError::metadata(path, error))?
        .len();

    let mut report_progress = |fraction: f64| {
        if let Some(sink) = progress.as_mut() {
            sink(fraction);
        }
    };

    let mut tail_bytes = initial_tail_bytes
        .max(MIN_TAIL_WINDOW_BYTES)
        .min(file_size.max(MIN_TAIL_WINDOW_BYTES));

    loop {
        let window_start = file_size.saturating_sub(tail_bytes);
        let mut file = File::open(path).map_err(|error| AnalysisError::open(path, error))?;

        // Start one byte early and drop the first line so the window begins
        // on a line boundary.
        let skip_first_line = window_start > 0;
        let seek_to = window_start.saturating_sub(1);
        file.seek(SeekFrom::Start(seek_to))
            .map_err(|error| AnalysisError::seek(path, error))?;

        let outcome = scan(
            file,
            Some(file_size - seek_to),
            &options,
            skip_first_line,
            &mut report_progress,
        )?;

        let covers_whole_file = window_start == 0;
        if outcome.retained.len() >= options.count || covers_whole_file {
            tracing::debug!(
                log_path = %path.display(),
                tail_bytes,
                covers_whole_file,
                "Tail analysis settled"
            );
            return Ok(assemble_result(outcome, &options));
        }

        tracing::debug!(
            log_path = %path.display(),
            tail_bytes,
            found = outcome.retained.len(),
            wanted = options.count,
            "Widening tail window"
        );
        tail_bytes = tail_bytes.saturating_mul(2).min(file_size);
    }
}

fn scan<R: Read>(
    reader: R,
    total_bytes: Option<u64>,
    options: &AnalysisOptions,
    skip_first_line: bool,
    progress: &mut dyn FnMut(f64),
) -> Result<ScanOutcome, AnalysisError> {
    let started_at = Instant::now();
    let total_bytes = total_bytes.filter(|total| *total > 0);

    let mut lines = LineReader::new(reader, options.chunk_bytes, options.max_line_bytes);
    let mut segmenter = Segmenter::new();
    let mut retained = RetentionBuffer::new(options.count, options.min_duration_sec);
    let mut skip_pending = skip_first_line;

    loop {
        let pending_line_number = lines.line_number() + 1;
        let next_line = lines.next_line().map_err(|source| AnalysisError::Read {
            line_number: pending_line_number,
            source,
        })?;
        let Some(line) = next_line else {
            break;
        };

        if skip_pending {
            skip_pending = false;
        } else {
            let classified = classify_line(line);
            let line_number = lines.line_number();
            if let Some(mission) = segmenter.consume(line_number, &classified) {
                retained.offer(mission);
            }
        }

        if lines.last_line_truncated() {
            tracing::warn!(
                line_number = lines.line_number(),
                max_line_bytes = options.max_line_bytes,
                "Truncated overlong log line"
            );
        }

        if let Some(total) = total_bytes {
            progress((lines.bytes_read() as f64 / total as f64).min(1.0));
        }
    }

    if let Some(mission) = segmenter.finish() {
        retained.offer(mission);
    }

    tracing::info!(
        lines_read = lines.line_number(),
        bytes_read = lines.bytes_read(),
        runs_flushed = segmenter.runs_flushed(),
        missions_retained = retained.len(),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "Finished log scan"
    );

    Ok(ScanOutcome {
        retained,
        lines_read: lines.line_number(),
        runs_flushed: segmenter.runs_flushed(),
    })
}

fn assemble_result(outcome: ScanOutcome, options: &AnalysisOptions) -> AnalysisResult {
    let ScanOutcome {
        retained,
        lines_read,
        runs_flushed,
    } = outcome;

    let mut warnings = Vec::new();
    if retained.len() < options.count {
        tracing::debug!(
            lines_read,
            runs_flushed,
            found = retained.len(),
            wanted = options.count,
            "Not enough qualifying missions"
        );
        warnings.push(insufficient_missions_warning(
            retained.len(),
            options.min_duration_sec,
        ));
    }

    let mut missions = retained.into_missions();
    for (position, mission) in missions.iter_mut().enumerate() {
        mission.index = position + 1;
    }

    AnalysisResult { missions, warnings }
}

pub fn insufficient_missions_warning(found: usize, min_duration_sec: f64) -> String {
    format!("有效记录不足：仅找到 {found} 把（过滤阈值 {min_duration_sec:.0}s）。")
}
