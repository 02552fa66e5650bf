use anyhow::{bail, Context, Result};
use arbitration_log_lib::logging::init_logging;
use arbitration_log_lib::nodes::read_node_map;
use arbitration_log_lib::report::render_report;
use arbitration_log_lib::settings::{default_log_directory, resolve_log_path};
use arbitration_log_lib::watch::watch_log_file;
use arbitration_log_lib::{analyze_file, analyze_file_tail, AnalysisOptions, NodeMeta};
use chrono::Local;
use clap::Parser;
use std::collections::HashMap;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "arbitration-log",
    version,
    about = "Summarizes the most recent Arbitration missions found in EE.log"
)]
struct Cli {
    /// Path to ee.log/EE.log, or the directory that contains it
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Same as PATH; takes precedence when both are given
    #[arg(long = "file", value_name = "PATH")]
    file: Option<PathBuf>,

    /// How many recent qualifying missions to show
    #[arg(long, default_value_t = 2)]
    count: usize,

    /// Missions shorter than this many seconds are excluded
    #[arg(long = "min", value_name = "SECONDS", default_value_t = 60.0)]
    min_duration_sec: f64,

    /// JSON file with node display names, keyed by node id
    #[arg(long, value_name = "JSON")]
    node_map: Option<PathBuf>,

    /// Print the result as JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Only scan the end of the log, widening the window as needed
    #[arg(long, value_name = "BYTES")]
    tail_bytes: Option<u64>,

    /// Keep running and re-analyze whenever the log changes
    #[arg(long)]
    watch: bool,

    /// Do not draw the progress indicator
    #[arg(long)]
    no_progress: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let exit_code = if error.use_stderr() { 1 } else { 0 };
            let _ = error.print();
            std::process::exit(exit_code);
        }
    };

    init_logging();

    if let Err(error) = run(&cli) {
        eprintln!("错误：{error:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let log_path = locate_log_file(cli)?;
    let options = AnalysisOptions::new(cli.count, cli.min_duration_sec);
    let nodes = match cli.node_map.as_deref() {
        Some(node_map_path) => read_node_map(node_map_path)?,
        None => HashMap::new(),
    };

    if !cli.json {
        eprintln!("开始解析：{}", log_path.display());
    }
    print_analysis(cli, &log_path, &options, &nodes)?;

    if cli.watch {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start watch runtime")?;

        runtime.block_on(watch_log_file(&log_path, || {
            eprintln!(
                "\n[{}] 日志已更新，重新解析",
                Local::now().format("%H:%M:%S")
            );
            if let Err(error) = print_analysis(cli, &log_path, &options, &nodes) {
                tracing::warn!(log_path = %log_path.display(), "Re-analysis failed: {error:#}");
                eprintln!("错误：{error:#}");
            }
        }))?;
    }

    Ok(())
}

fn locate_log_file(cli: &Cli) -> Result<PathBuf> {
    let requested = cli
        .file
        .as_deref()
        .or(cli.path.as_deref())
        .filter(|path| !path.as_os_str().is_empty());

    if let Some(requested) = requested {
        return resolve_log_path(requested)
            .with_context(|| format!("找不到日志文件：{}", requested.display()));
    }

    if let Some(default_directory) = default_log_directory() {
        if let Some(log_path) = resolve_log_path(&default_directory) {
            return Ok(log_path);
        }
        bail!(
            "未提供文件路径（ee.log 默认路径：{}）",
            default_directory.display()
        );
    }

    bail!("未提供文件路径")
}

fn print_analysis(
    cli: &Cli,
    log_path: &Path,
    options: &AnalysisOptions,
    nodes: &HashMap<String, NodeMeta>,
) -> Result<()> {
    let show_progress = !cli.no_progress && !cli.json && std::io::stderr().is_terminal();
    let mut progress_line = ProgressLine::default();
    let mut draw_progress = |fraction: f64| progress_line.update(fraction);
    let progress: Option<&mut dyn FnMut(f64)> = if show_progress {
        Some(&mut draw_progress)
    } else {
        None
    };

    let analysis = match cli.tail_bytes {
        Some(tail_bytes) => analyze_file_tail(log_path, options, tail_bytes, progress),
        None => analyze_file(log_path, options, progress),
    };
    if show_progress {
        eprintln!();
    }

    let mut result = analysis?;
    result.attach_node_metadata(nodes);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_report(&result));
    }

    Ok(())
}

/// Redraws `进度：NN%` on stderr when the whole percentage changes.
#[derive(Default)]
struct ProgressLine {
    last_percent: Option<u32>,
}

impl ProgressLine {
    fn update(&mut self, fraction: f64) {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).floor() as u32;
        if self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);

        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r进度：{percent:3}%");
        let _ = stderr.flush();
    }
}
