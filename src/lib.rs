pub mod analysis;
pub mod logging;
pub mod nodes;
pub mod report;
pub mod settings;
pub mod watch;

pub use analysis::{
    analyze_file, analyze_file_tail, analyze_reader, AnalysisError, AnalysisResult, Mission,
    NodeLookup, NodeMeta,
};
pub use settings::AnalysisOptions;
