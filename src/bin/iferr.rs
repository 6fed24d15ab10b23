//! iferr CLI binary entry point.
//!
//! ## Usage
//!
//! ```bash
//! # Print the file with the call at byte 90 expanded
//! iferr main.go:#90
//!
//! # Line and column, rewriting the file in place
//! iferr --write main.go:9:2
//!
//! # Structured edit for an editor
//! iferr --format json main.go:#69,#81
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use iferr::cli::{default_search_paths, run_expand, ExpandRequest, OutputFormat, PositionSpec};
use iferr::error::{IferrError, OutputErrorCode};
use iferr::go::{BuildContext, ExpandOptions};
use iferr::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Expand a Go call into an if-err-return block.
#[derive(Parser, Debug)]
#[command(name = "iferr", version, about = "Expand a Go call into an if-err-return block")]
struct Cli {
    /// Position of the call: path:#offset, path:#start,#end or path:line:col.
    position: String,

    /// Output format.
    #[arg(long, value_enum, default_value = "source")]
    format: Format,

    /// Rewrite the file in place.
    #[arg(long)]
    write: bool,

    /// Workspace root holding packages under src/ (repeatable; default: GOPATH).
    #[arg(long = "search-path", value_name = "DIR")]
    search_paths: Vec<PathBuf>,

    /// Do not look for imports in vendor/ directories.
    #[arg(long)]
    no_vendor: bool,

    /// Statement to run first in every failure branch, e.g. 'log.Println(err)'.
    #[arg(long, value_name = "STMT")]
    on_error: Option<String>,

    /// Panic with the failure when the function cannot return it.
    #[arg(long)]
    panic: bool,

    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// The whole re-formatted file.
    Source,
    /// Structured line edit as JSON.
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Source => OutputFormat::Source,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level);

    let format = cli.format;
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            match format {
                // Errors go to stdout as JSON per agent contract
                Format::Json => {
                    let _ = emit_response(&ErrorResponse::from_error(&err), &mut io::stdout());
                    let _ = io::stdout().flush();
                }
                Format::Source => eprintln!("iferr: {}", err),
            }
            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<(), IferrError> {
    let search_paths = if cli.search_paths.is_empty() {
        default_search_paths()
    } else {
        cli.search_paths
    };
    let request = ExpandRequest {
        spec: PositionSpec::parse(&cli.position)?,
        format: cli.format.into(),
        write: cli.write,
        ctx: BuildContext {
            search_paths,
            use_vendor: !cli.no_vendor,
        },
        options: ExpandOptions {
            on_error: cli.on_error,
            panic_fallback: cli.panic,
            ..ExpandOptions::default()
        },
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_expand(&request, &mut out)?;
    out.flush()
        .map_err(|e| IferrError::internal(format!("failed to flush output: {}", e)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn defaults() {
            let cli = Cli::try_parse_from(["iferr", "main.go:#90"]).unwrap();
            assert_eq!(cli.position, "main.go:#90");
            assert_eq!(cli.format, Format::Source);
            assert!(!cli.write && !cli.no_vendor && !cli.panic);
            assert!(cli.search_paths.is_empty());
            assert!(cli.on_error.is_none());
        }

        #[test]
        fn all_flags() {
            let cli = Cli::try_parse_from([
                "iferr",
                "--format",
                "json",
                "--write",
                "--search-path",
                "/a",
                "--search-path",
                "/b",
                "--no-vendor",
                "--on-error",
                "log.Println(err)",
                "--panic",
                "--log-level",
                "debug",
                "main.go:9:2",
            ])
            .unwrap();
            assert_eq!(cli.format, Format::Json);
            assert_eq!(cli.search_paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
            assert_eq!(cli.on_error.as_deref(), Some("log.Println(err)"));
            assert!(cli.write && cli.no_vendor && cli.panic);
        }

        #[test]
        fn position_is_required() {
            assert!(Cli::try_parse_from(["iferr"]).is_err());
        }
    }

    mod log_level {
        use super::*;

        #[test]
        fn converts_to_tracing_level() {
            assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
            assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
            assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        }
    }
}
