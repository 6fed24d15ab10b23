//! CLI front door.
//!
//! Turns a position specifier and flags into an engine request and writes
//! the result in the requested format:
//!
//! - `source`: the whole re-formatted file, to stdout or back to the file
//! - `json`: the structured line edit, for editor integrations
//!
//! ## Position specifiers
//!
//! - `path:#start` a byte offset
//! - `path:#start,#end` a byte interval
//! - `path:line:col` 1-based line and column
//!
//! ## Error Handling
//!
//! Every function returns `Result<T, IferrError>`. Engine errors convert
//! through the bridges in `iferr-go`; the caller renders the error and picks
//! the exit code from it.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{error, info};

use iferr_core::error::IferrError;
use iferr_core::output::{emit_response, ExpandResponse};
use iferr_core::patch::ContentHash;
use iferr_core::text::position_to_byte_offset;
use iferr_go::files::read_file;
use iferr_go::{expand_source, BuildContext, ExpandError, ExpandOptions};

static OFFSET_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<path>.+):#(?P<start>\d+)(?:,#(?P<end>\d+))?$").unwrap());
static LINE_COL_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<path>.+):(?P<line>\d+):(?P<col>\d+)$").unwrap());

// ============================================================================
// Position specifiers
// ============================================================================

/// Where in the file the call is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Byte interval; a cursor is an empty interval.
    Offsets { start: usize, end: usize },
    /// 1-based line and column.
    LineCol { line: u32, col: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSpec {
    pub path: PathBuf,
    pub position: Position,
}

impl PositionSpec {
    /// Parse `path:#start`, `path:#start,#end` or `path:line:col`.
    pub fn parse(spec: &str) -> Result<PositionSpec, IferrError> {
        let number = |text: &str| {
            text.parse::<usize>()
                .map_err(|_| IferrError::invalid_args(format!("number out of range in position '{}'", spec)))
        };
        if let Some(caps) = OFFSET_SPEC.captures(spec) {
            let start = number(&caps["start"])?;
            let end = match caps.name("end") {
                Some(end) => number(end.as_str())?,
                None => start,
            };
            if end < start {
                return Err(IferrError::invalid_args(format!(
                    "position '{}' ends before it starts",
                    spec
                )));
            }
            return Ok(PositionSpec {
                path: PathBuf::from(&caps["path"]),
                position: Position::Offsets { start, end },
            });
        }
        if let Some(caps) = LINE_COL_SPEC.captures(spec) {
            let line = number(&caps["line"])?;
            let col = number(&caps["col"])?;
            if line == 0 || col == 0 {
                return Err(IferrError::invalid_args(format!(
                    "line and column in '{}' are 1-based",
                    spec
                )));
            }
            let narrow =
                |n: usize| u32::try_from(n).map_err(|_| IferrError::invalid_args(format!("position '{}' is out of range", spec)));
            return Ok(PositionSpec {
                path: PathBuf::from(&caps["path"]),
                position: Position::LineCol {
                    line: narrow(line)?,
                    col: narrow(col)?,
                },
            });
        }
        Err(IferrError::invalid_args(format!(
            "invalid position '{}', expected path:#offset, path:#start,#end or path:line:col",
            spec
        )))
    }

    /// The byte interval this specifier names in `source`.
    pub fn offsets(&self, source: &str) -> Result<(usize, usize), IferrError> {
        match self.position {
            Position::Offsets { start, end } => Ok((start, end)),
            Position::LineCol { line, col } => {
                let offset = position_to_byte_offset(source.as_bytes(), line, col).ok_or_else(|| {
                    IferrError::invalid_args(format!(
                        "{} has no line {}",
                        self.path.display(),
                        line
                    ))
                })?;
                Ok((offset, offset))
            }
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// The whole re-formatted file.
    #[default]
    Source,
    /// The structured line edit as JSON.
    Json,
}

/// Everything one invocation needs, collected from the command line.
#[derive(Debug, Clone)]
pub struct ExpandRequest {
    pub spec: PositionSpec,
    pub format: OutputFormat,
    /// Write the result back to the file instead of printing it.
    pub write: bool,
    pub ctx: BuildContext,
    pub options: ExpandOptions,
}

/// Search roots named by `GOPATH`, in order.
pub fn default_search_paths() -> Vec<PathBuf> {
    search_paths_from(env::var_os("GOPATH"))
}

fn search_paths_from(gopath: Option<OsString>) -> Vec<PathBuf> {
    gopath
        .map(|value| {
            env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Run one expansion and write its result.
///
/// Nothing is written unless the expansion succeeded.
pub fn run_expand(request: &ExpandRequest, out: &mut impl Write) -> Result<(), IferrError> {
    let path = &request.spec.path;
    let source = read_file(path)?;
    let (start, end) = request.spec.offsets(&source)?;

    let expansion = expand_source(path, &source, start, end, &request.ctx, &request.options)
        .map_err(|err| {
            if let ExpandError::Parse { snippet, .. } = &err {
                error!("{}", snippet);
            }
            IferrError::from(err)
        })?;

    if request.write {
        write_back(path, &expansion.formatted)?;
        info!(file = %path.display(), "wrote expansion");
    }

    match request.format {
        OutputFormat::Source => {
            if !request.write {
                out.write_all(expansion.formatted.as_bytes())
                    .map_err(|e| IferrError::internal(format!("failed to write output: {}", e)))?;
            }
        }
        OutputFormat::Json => {
            let response = ExpandResponse::new(
                path.display().to_string(),
                expansion.edit,
                expansion.warnings,
                ContentHash::compute(source.as_bytes()),
            );
            emit_response(&response, out)
                .map_err(|e| IferrError::internal(format!("failed to write output: {}", e)))?;
        }
    }
    Ok(())
}

fn write_back(path: &Path, contents: &str) -> Result<(), IferrError> {
    fs::write(path, contents).map_err(|e| IferrError::ApplyError {
        message: e.to_string(),
        file: Some(path.display().to_string()),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use iferr_core::error::OutputErrorCode;
    use tempfile::TempDir;

    const SOURCE: &str = "package main\n\nimport \"os\"\n\nfunc f() error {\n\tos.Remove(\"a\")\n\treturn nil\n}\n";

    mod position_spec {
        use super::*;

        #[test]
        fn single_offset() {
            let spec = PositionSpec::parse("a/b.go:#90").unwrap();
            assert_eq!(spec.path, PathBuf::from("a/b.go"));
            assert_eq!(spec.position, Position::Offsets { start: 90, end: 90 });
        }

        #[test]
        fn offset_interval() {
            let spec = PositionSpec::parse("b.go:#69,#81").unwrap();
            assert_eq!(spec.position, Position::Offsets { start: 69, end: 81 });
        }

        #[test]
        fn line_and_column() {
            let spec = PositionSpec::parse("C:/src/b.go:9:2").unwrap();
            assert_eq!(spec.path, PathBuf::from("C:/src/b.go"));
            assert_eq!(spec.position, Position::LineCol { line: 9, col: 2 });
        }

        #[test]
        fn malformed_specs_are_invalid_arguments() {
            for bad in ["b.go", "b.go:#", "b.go:9", "b.go:#9,#3", "b.go:0:1", ":#"] {
                let err = PositionSpec::parse(bad).unwrap_err();
                assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments, "{bad}");
            }
        }

        #[test]
        fn line_col_converts_to_offset() {
            let spec = PositionSpec::parse("b.go:6:2").unwrap();
            let at = SOURCE.find("os.Remove").unwrap();
            assert_eq!(spec.offsets(SOURCE).unwrap(), (at, at));
            let past = PositionSpec::parse("b.go:40:1").unwrap();
            assert!(past.offsets(SOURCE).is_err());
        }
    }

    mod search_paths {
        use super::*;

        #[test]
        fn gopath_entries_in_order() {
            let joined = env::join_paths(["/one", "/two"]).unwrap();
            assert_eq!(
                search_paths_from(Some(joined)),
                vec![PathBuf::from("/one"), PathBuf::from("/two")]
            );
            assert!(search_paths_from(None).is_empty());
        }
    }

    mod run {
        use super::*;

        fn request(dir: &TempDir, format: OutputFormat, write: bool) -> ExpandRequest {
            let path = dir.path().join("main.go");
            fs::write(&path, SOURCE).unwrap();
            ExpandRequest {
                spec: PositionSpec {
                    path,
                    position: Position::LineCol { line: 6, col: 5 },
                },
                format,
                write,
                ctx: BuildContext::default(),
                options: ExpandOptions::default(),
            }
        }

        #[test]
        fn source_goes_to_output() {
            let dir = TempDir::new().unwrap();
            let req = request(&dir, OutputFormat::Source, false);
            let mut out = Vec::new();
            run_expand(&req, &mut out).unwrap();
            let text = String::from_utf8(out).unwrap();
            assert!(text.contains("\tif err := os.Remove(\"a\"); err != nil {\n\t\treturn err\n\t}\n"));
            assert_eq!(fs::read_to_string(&req.spec.path).unwrap(), SOURCE);
        }

        #[test]
        fn write_replaces_the_file() {
            let dir = TempDir::new().unwrap();
            let req = request(&dir, OutputFormat::Source, true);
            let mut out = Vec::new();
            run_expand(&req, &mut out).unwrap();
            assert!(out.is_empty());
            let written = fs::read_to_string(&req.spec.path).unwrap();
            assert!(written.contains("if err := os.Remove(\"a\"); err != nil {"));
        }

        #[test]
        fn json_describes_the_edit() {
            let dir = TempDir::new().unwrap();
            let req = request(&dir, OutputFormat::Json, false);
            let mut out = Vec::new();
            run_expand(&req, &mut out).unwrap();
            let response: serde_json::Value = serde_json::from_slice(&out).unwrap();
            assert_eq!(response["status"], "ok");
            assert_eq!(response["start_line"], 6);
            assert_eq!(response["end_line"], 6);
            assert_eq!(response["replacement_lines"].as_array().unwrap().len(), 3);
            assert_eq!(
                response["content_hash"],
                ContentHash::compute(SOURCE.as_bytes()).0.as_str()
            );
        }

        #[test]
        fn failure_leaves_the_file_alone() {
            let dir = TempDir::new().unwrap();
            let mut req = request(&dir, OutputFormat::Source, true);
            // On the import: nothing to expand there.
            req.spec.position = Position::LineCol { line: 3, col: 1 };
            let mut out = Vec::new();
            let err = run_expand(&req, &mut out).unwrap_err();
            assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
            assert!(out.is_empty());
            assert_eq!(fs::read_to_string(&req.spec.path).unwrap(), SOURCE);
        }

        #[test]
        fn missing_file() {
            let dir = TempDir::new().unwrap();
            let req = ExpandRequest {
                spec: PositionSpec::parse(&format!("{}:#1", dir.path().join("gone.go").display())).unwrap(),
                format: OutputFormat::Source,
                write: false,
                ctx: BuildContext::default(),
                options: ExpandOptions::default(),
            };
            let err = run_expand(&req, &mut Vec::new()).unwrap_err();
            assert!(matches!(err, IferrError::FileNotFound { .. }));
        }
    }
}
