//! Golden tests for the iferr binary.
//!
//! Each fixture under `tests/fixtures/<case>/` is a GOPATH-style tree
//! (`src/<package>/...`) next to the expected output: `expected.go` for the
//! source format, `expected*.json` for the structured edit or an error
//! response. The fixture is copied to a temporary directory, the binary runs
//! there with `--search-path .`, and its stdout is compared to the
//! expectation.
//!
//! ## Updating Golden Files
//!
//! When making intentional output changes:
//! ```bash
//! IFERR_UPDATE_GOLDEN=1 cargo nextest run -p iferr golden
//! git diff tests/fixtures/  # Review changes
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use difference::Changeset;
use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// Test Infrastructure
// ============================================================================

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn update_mode() -> bool {
    std::env::var("IFERR_UPDATE_GOLDEN").is_ok()
}

/// Copy the fixture tree, leaving the expectations behind.
fn copy_tree(from: &Path, to: &Path) -> Result<(), String> {
    for entry in fs::read_dir(from).map_err(|e| format!("Failed to read {:?}: {}", from, e))? {
        let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with("expected") {
            continue;
        }
        let dest = to.join(&name);
        if entry.path().is_dir() {
            fs::create_dir_all(&dest).map_err(|e| format!("Failed to create {:?}: {}", dest, e))?;
            copy_tree(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest).map_err(|e| format!("Failed to copy fixture file: {}", e))?;
        }
    }
    Ok(())
}

struct Run {
    stdout: String,
    exit_code: i32,
    workspace: TempDir,
}

fn run_iferr(case: &str, args: &[&str]) -> Result<Run, String> {
    let workspace = TempDir::new().map_err(|e| format!("Failed to create temp dir: {}", e))?;
    copy_tree(&fixtures_dir().join(case), workspace.path())?;

    let output = Command::new(env!("CARGO_BIN_EXE_iferr"))
        .current_dir(workspace.path())
        .env_remove("GOPATH")
        .env_remove("RUST_LOG")
        .args(["--search-path", "."])
        .args(args)
        .output()
        .map_err(|e| format!("Failed to run iferr: {}", e))?;

    Ok(Run {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
        workspace,
    })
}

/// Compare the source output of `args` on `case` with `expected.go`.
fn golden_source(case: &str, args: &[&str]) -> Result<(), String> {
    let run = run_iferr(case, args)?;
    if run.exit_code != 0 {
        return Err(format!("iferr exited with {}", run.exit_code));
    }
    let golden_path = fixtures_dir().join(case).join("expected.go");
    if update_mode() {
        fs::write(&golden_path, &run.stdout).map_err(|e| format!("Failed to write golden file: {}", e))?;
        eprintln!("Updated golden file: {:?}", golden_path);
        return Ok(());
    }
    let expected = fs::read_to_string(&golden_path)
        .map_err(|e| format!("Failed to read golden file {:?}: {}", golden_path, e))?;
    if expected == run.stdout {
        Ok(())
    } else {
        Err(format!("output differs:\n{}", Changeset::new(&expected, &run.stdout, "\n")))
    }
}

/// Compare the JSON output of `args` on `case` with `golden`.
///
/// Error responses must exit with their error code, successes with 0.
fn golden_json(case: &str, args: &[&str], golden: &str) -> Result<(), String> {
    let mut full = vec!["--format", "json"];
    full.extend_from_slice(args);
    let run = run_iferr(case, &full)?;
    let actual: Value = serde_json::from_str(&run.stdout)
        .map_err(|e| format!("Failed to parse output as JSON: {}\nOutput: {}", e, run.stdout))?;

    let expected_code = if actual["status"] == "error" {
        actual["error"]["code"].as_i64().unwrap_or(-1) as i32
    } else {
        0
    };
    if run.exit_code != expected_code {
        return Err(format!("exit code {} but response says {}", run.exit_code, expected_code));
    }

    let golden_path = fixtures_dir().join(case).join(golden);
    if update_mode() {
        let pretty = serde_json::to_string_pretty(&actual)
            .map_err(|e| format!("Failed to serialize JSON: {}", e))?;
        fs::write(&golden_path, pretty + "\n").map_err(|e| format!("Failed to write golden file: {}", e))?;
        eprintln!("Updated golden file: {:?}", golden_path);
        return Ok(());
    }
    let golden_content = fs::read_to_string(&golden_path)
        .map_err(|e| format!("Failed to read golden file {:?}: {}", golden_path, e))?;
    let expected: Value =
        serde_json::from_str(&golden_content).map_err(|e| format!("Failed to parse golden file: {}", e))?;
    if expected == actual {
        Ok(())
    } else {
        Err(format!(
            "JSON mismatch:\n--- expected ---\n{}\n--- actual ---\n{}",
            serde_json::to_string_pretty(&expected).unwrap_or_default(),
            serde_json::to_string_pretty(&actual).unwrap_or_default()
        ))
    }
}

fn check(result: Result<(), String>) {
    if let Err(e) = result {
        panic!("Golden test failed: {}", e);
    }
}

// ============================================================================
// Source output
// ============================================================================

mod source {
    use super::*;

    const SINGLE: &str = "src/singleerror/singleerror.go";

    #[test]
    fn single_error_cursor_before_call() {
        check(golden_source("singleerror", &[&format!("{SINGLE}:#68")]));
    }

    #[test]
    fn single_error_cursor_inside_call() {
        check(golden_source("singleerror", &[&format!("{SINGLE}:#81")]));
    }

    #[test]
    fn single_error_cursor_after_call() {
        check(golden_source("singleerror", &[&format!("{SINGLE}:#89")]));
    }

    #[test]
    fn single_error_selection() {
        check(golden_source("singleerror", &[&format!("{SINGLE}:#68,#89")]));
    }

    #[test]
    fn single_error_line_and_column() {
        check(golden_source("singleerror", &[&format!("{SINGLE}:9:5")]));
    }

    #[test]
    fn inline_comments() {
        check(golden_source("commentinline", &["src/commentinline/commentinline.go:9:2"]));
    }

    #[test]
    fn discard_only_assignment() {
        check(golden_source("nointroduce", &["src/nointroduce/nointroduce.go:13:6"]));
    }

    #[test]
    fn failure_declared_before_check() {
        check(golden_source("introduceerr", &["src/introduceerr/introduceerr.go:14:6"]));
    }

    #[test]
    fn declaring_assignment_split() {
        check(golden_source("presentdouble", &["src/presentdouble/presentdouble.go:9:7"]));
    }

    #[test]
    fn panic_without_failure_result() {
        check(golden_source("noerrreturn", &["--panic", "src/noerrreturn/noerrreturn.go:9:2"]));
    }

    #[test]
    fn panic_without_results() {
        check(golden_source("noreturncaller", &["--panic", "src/noreturncaller/noreturncaller.go:9:2"]));
    }

    #[test]
    fn custom_result_types() {
        check(golden_source("customtypes", &["src/customtypes/customtypes.go:18:2"]));
    }
}

// ============================================================================
// Packages and imports
// ============================================================================

mod packages {
    use super::*;

    #[test]
    fn imported_from_search_path() {
        check(golden_source("multipkg", &["src/multipkg/multipkg.go:9:7"]));
    }

    #[test]
    fn imported_from_vendor() {
        check(golden_source("multipkgvendor", &["src/multipkg/multipkg.go:9:7"]));
    }

    #[test]
    fn vendor_ignored_with_no_vendor() {
        let run = run_iferr(
            "multipkgvendor",
            &["--no-vendor", "src/multipkg/multipkg.go:9:7"],
        )
        .unwrap();
        assert_eq!(run.exit_code, 3);
        assert!(run.stdout.is_empty());
    }

    #[test]
    fn callee_in_sibling_file() {
        check(golden_source("twofiles", &["src/pkg/pkg2.go:4:9"]));
    }
}

// ============================================================================
// Structured edits and errors
// ============================================================================

mod json {
    use super::*;

    #[test]
    fn on_error_statement() {
        check(golden_json(
            "returnerrcall",
            &[
                "--on-error",
                "log.Fatal(err.Error())",
                "src/returnerrcall/returnerrcall.go:9:7",
            ],
            "expected.json",
        ));
    }

    #[test]
    fn dropped_failure_is_warned() {
        check(golden_json(
            "returnerrcall",
            &["src/returnerrcall/returnerrcall.go:9:7"],
            "expected_dropped.json",
        ));
    }

    #[test]
    fn builtin_call_rejected() {
        check(golden_json("builtin", &["src/builtin/builtin.go:4:7"], "expected.json"));
    }

    #[test]
    fn no_return_values() {
        check(golden_json(
            "noreturncaller",
            &["src/noreturncaller/noreturncaller.go:9:2"],
            "expected.json",
        ));
    }

    #[test]
    fn malformed_position_is_invalid_arguments() {
        let run = run_iferr("singleerror", &["--format", "json", "singleerror.go"]).unwrap();
        assert_eq!(run.exit_code, 2);
        let response: Value = serde_json::from_str(&run.stdout).unwrap();
        assert_eq!(response["error"]["code"], 2);
    }
}

// ============================================================================
// Writing in place
// ============================================================================

mod write {
    use super::*;

    #[test]
    fn rewrites_the_file() {
        let file = "src/singleerror/singleerror.go";
        let run = run_iferr("singleerror", &["--write", &format!("{file}:9:2")]).unwrap();
        assert_eq!(run.exit_code, 0);
        assert!(run.stdout.is_empty());
        let written = fs::read_to_string(run.workspace.path().join(file)).unwrap();
        let expected = fs::read_to_string(fixtures_dir().join("singleerror/expected.go")).unwrap();
        assert_eq!(written, expected);
    }

    #[test]
    fn failure_leaves_the_file_untouched() {
        let file = "src/noreturncaller/noreturncaller.go";
        let run = run_iferr("noreturncaller", &["--write", &format!("{file}:9:2")]).unwrap();
        assert_eq!(run.exit_code, 3);
        let after = fs::read_to_string(run.workspace.path().join(file)).unwrap();
        let before = fs::read_to_string(fixtures_dir().join("noreturncaller").join(file)).unwrap();
        assert_eq!(after, before);
    }
}
