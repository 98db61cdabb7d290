//! savescope CLI
//!
//! Command-line tool for decoding, analyzing and comparing save files.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use savescope::{
    analyze_decoded, analyze_structure_with_options, compare_corpus_with_options,
    decode_container_with_options, AnalyzerOptions, HumanFormatter, JsonFormatter,
    ReportFormatter, ReportLimits, SampleFile,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Save file format discovery tool.
///
/// Unwraps DZIP containers, scans save files for structure and compares
/// several saves to find which bytes hold game state.
#[derive(Parser, Debug)]
#[command(name = "savescope")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output format
    #[arg(short, long, default_value = "human", global = true)]
    format: OutputFormat,

    /// Analysis mode
    #[arg(short, long, default_value = "normal", global = true)]
    mode: AnalysisMode,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (only output essential info)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Bytes shown in the hex dump
    #[arg(long, global = true)]
    hex_bytes: Option<usize>,

    /// Shortest printable run reported as a string
    #[arg(long, global = true)]
    min_string_len: Option<usize>,

    /// Prefix searched for embedded signatures
    #[arg(long, global = true)]
    signature_window: Option<usize>,

    /// Prefix over which static offsets are computed
    #[arg(long, global = true)]
    static_prefix: Option<usize>,

    /// Maximum variable offsets listed in comparison output
    #[arg(long, global = true)]
    max_variable: Option<usize>,

    /// Allowed gap between declared and actual payload size for passthrough
    #[arg(long, global = true)]
    tolerance: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode DZIP containers and report how the payload was recovered
    Decode {
        /// Container file(s) to decode
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Run the structural scans over each file
    Analyze {
        /// File(s) to analyze
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Decode the container first and analyze the payload
        #[arg(short, long)]
        payload: bool,
    },
    /// Compare a set of save files
    Compare {
        /// Files or directories (searched recursively)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// File extension to pick up from directories
        #[arg(short, long, default_value = "sav")]
        extension: String,

        /// Number of files to analyze in detail
        #[arg(long, default_value_t = 3)]
        detail_limit: usize,

        /// Number of files to include in the comparison
        #[arg(long, default_value_t = 5)]
        compare_limit: usize,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Analysis mode options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum AnalysisMode {
    /// Default caps and windows
    Normal,
    /// Smaller dumps and listings
    Fast,
    /// Larger dumps and listings
    Thorough,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "savescope=debug"
    } else {
        "savescope=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = match build_options(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let formatter = make_formatter(&args, &options);

    let result = match &args.command {
        Command::Decode { files } => run_decode(files, &options, formatter.as_ref(), &args),
        Command::Analyze { files, payload } => {
            run_analyze(files, *payload, &options, formatter.as_ref(), &args)
        }
        Command::Compare {
            paths,
            extension,
            detail_limit,
            compare_limit,
        } => run_compare(
            paths,
            extension,
            *detail_limit,
            *compare_limit,
            &options,
            formatter.as_ref(),
            &args,
        ),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            if !args.quiet {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

/// Start from the `--mode` preset and apply per-field overrides.
fn build_options(args: &Args) -> savescope::Result<AnalyzerOptions> {
    let mut options = match args.mode {
        AnalysisMode::Normal => AnalyzerOptions::new(),
        AnalysisMode::Fast => AnalyzerOptions::fast(),
        AnalysisMode::Thorough => AnalyzerOptions::thorough(),
    };

    if let Some(n) = args.hex_bytes {
        options.hex_dump_bytes = n;
    }
    if let Some(n) = args.min_string_len {
        options.min_string_len = n;
    }
    if let Some(n) = args.signature_window {
        options.signature_window = n;
    }
    if let Some(n) = args.static_prefix {
        options.static_prefix = n;
    }
    if let Some(n) = args.max_variable {
        options.max_variable_report = n;
    }
    if let Some(n) = args.tolerance {
        options.passthrough_tolerance = n;
    }

    options.validate()?;
    Ok(options)
}

fn make_formatter(args: &Args, options: &AnalyzerOptions) -> Box<dyn ReportFormatter> {
    let human = |formatter: HumanFormatter| -> Box<dyn ReportFormatter> {
        Box::new(formatter.with_limits(ReportLimits::from_options(options)))
    };
    match args.format {
        OutputFormat::Json => Box::new(JsonFormatter::new().with_options(options)),
        OutputFormat::Human if args.quiet => human(HumanFormatter::quiet()),
        OutputFormat::Human if args.verbose => human(HumanFormatter::verbose()),
        OutputFormat::Human => human(HumanFormatter::new()),
    }
}

fn report_error(path: &Path, err: &anyhow::Error, args: &Args) {
    if !args.quiet {
        eprintln!("Error analyzing {}: {:#}", path.display(), err);
    }
}

fn load(path: &Path) -> anyhow::Result<SampleFile> {
    SampleFile::load(path).with_context(|| format!("failed to read {}", path.display()))
}

fn run_decode(
    files: &[PathBuf],
    options: &AnalyzerOptions,
    formatter: &dyn ReportFormatter,
    args: &Args,
) -> anyhow::Result<bool> {
    let mut success = true;

    for path in files {
        let sample = match load(path) {
            Ok(sample) => sample,
            Err(e) => {
                report_error(path, &e, args);
                success = false;
                continue;
            }
        };

        let outcome = decode_container_with_options(&sample.bytes, options);
        success &= outcome.is_success();
        print!("{}", formatter.format_decode(&outcome, &sample.metadata));
    }

    Ok(success)
}

fn run_analyze(
    files: &[PathBuf],
    payload: bool,
    options: &AnalyzerOptions,
    formatter: &dyn ReportFormatter,
    args: &Args,
) -> anyhow::Result<bool> {
    let mut success = true;

    for path in files {
        let sample = match load(path) {
            Ok(sample) => sample,
            Err(e) => {
                report_error(path, &e, args);
                success = false;
                continue;
            }
        };

        if payload {
            let (outcome, findings) = analyze_decoded(&sample.bytes, options);
            match findings {
                Some(findings) => print!("{}", formatter.format_findings(&findings, &sample.metadata)),
                None => {
                    success = false;
                    print!("{}", formatter.format_decode(&outcome, &sample.metadata));
                }
            }
        } else {
            let findings = analyze_structure_with_options(&sample.bytes, options);
            print!("{}", formatter.format_findings(&findings, &sample.metadata));
        }
    }

    Ok(success)
}

fn run_compare(
    paths: &[PathBuf],
    extension: &str,
    detail_limit: usize,
    compare_limit: usize,
    options: &AnalyzerOptions,
    formatter: &dyn ReportFormatter,
    args: &Args,
) -> anyhow::Result<bool> {
    let mut success = true;
    let mut samples = Vec::new();

    for path in collect_files(paths, extension) {
        match load(&path) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                report_error(&path, &e, args);
                success = false;
            }
        }
    }

    if samples.is_empty() {
        bail!("no .{} files found", extension.trim_start_matches('.'));
    }

    samples.sort_by_key(|s| s.metadata.modified);
    debug!(count = samples.len(), "collected sample files");

    for sample in samples.iter().take(detail_limit) {
        let findings = analyze_structure_with_options(&sample.bytes, options);
        print!("{}", formatter.format_findings(&findings, &sample.metadata));
    }

    if samples.len() < options.min_samples {
        warn!(count = samples.len(), "not enough files to compare");
        return Ok(success);
    }

    samples.truncate(compare_limit);
    let comparison = compare_corpus_with_options(samples, options)?;
    print!("{}", formatter.format_comparison(&comparison));

    Ok(success)
}

/// Expand directories into the matching files below them.
fn collect_files(paths: &[PathBuf], extension: &str) -> Vec<PathBuf> {
    let wanted = extension.trim_start_matches('.');
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|entry| entry.file_type().is_file())
                    .filter(|entry| has_extension(entry.path(), wanted))
                    .map(walkdir::DirEntry::into_path),
            );
        } else {
            files.push(path.clone());
        }
    }

    files
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::try_parse_from(["savescope", "decode", "slot1.sav"]).unwrap();
        assert!(matches!(args.command, Command::Decode { ref files } if files.len() == 1));
        assert!(!args.verbose);
    }

    #[test]
    fn test_analyze_payload_flag() {
        let args =
            Args::try_parse_from(["savescope", "analyze", "--payload", "a.sav", "b.sav"]).unwrap();
        match args.command {
            Command::Analyze { files, payload } => {
                assert_eq!(files.len(), 2);
                assert!(payload);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_compare_defaults() {
        let args = Args::try_parse_from(["savescope", "compare", "saves/"]).unwrap();
        match args.command {
            Command::Compare {
                extension,
                detail_limit,
                compare_limit,
                ..
            } => {
                assert_eq!(extension, "sav");
                assert_eq!(detail_limit, 3);
                assert_eq!(compare_limit, 5);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_options() {
        let args =
            Args::try_parse_from(["savescope", "decode", "-f", "json", "-m", "fast", "x.sav"])
                .unwrap();
        assert!(matches!(args.format, OutputFormat::Json));
        assert!(matches!(args.mode, AnalysisMode::Fast));
    }

    #[test]
    fn test_mode_presets() {
        let options = |mode: &str| {
            let args = Args::try_parse_from(["savescope", "compare", "-m", mode, "saves/"]).unwrap();
            build_options(&args).unwrap()
        };
        assert_eq!(options("normal").max_variable_report, 50);
        assert_eq!(options("fast").max_variable_report, 20);
        assert_eq!(options("thorough").max_variable_report, 500);
    }

    #[test]
    fn test_field_overrides() {
        let args = Args::try_parse_from([
            "savescope",
            "compare",
            "-m",
            "fast",
            "--max-variable",
            "7",
            "--tolerance",
            "0",
            "--static-prefix",
            "1024",
            "saves/",
        ])
        .unwrap();
        let options = build_options(&args).unwrap();

        assert_eq!(options.max_variable_report, 7);
        assert_eq!(options.passthrough_tolerance, 0);
        assert_eq!(options.static_prefix, 1024);
        // untouched fields keep the preset value
        assert_eq!(options.hex_dump_bytes, AnalyzerOptions::fast().hex_dump_bytes);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args =
            Args::try_parse_from(["savescope", "analyze", "--min-string-len", "0", "a.sav"]).unwrap();
        assert!(build_options(&args).is_err());
    }

    #[test]
    fn test_requires_files() {
        assert!(Args::try_parse_from(["savescope", "decode"]).is_err());
    }

    #[test]
    fn test_collect_files_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.sav"), b"a").unwrap();
        std::fs::write(dir.path().join("b.SAV"), b"b").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"c").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.sav"), b"c").unwrap();

        let mut files = collect_files(&[dir.path().to_path_buf()], ".sav");
        files.sort();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"a.sav"));
        assert!(names.contains(&"b.SAV"));
        assert!(names.contains(&"c.sav"));
    }
}
