//! Import resolution.
//!
//! An import path is looked up in this order:
//!
//! 1. `vendor/<path>` in the importing directory or any of its ancestors
//! 2. `<root>/src/<path>` for each search root of the [`BuildContext`]
//! 3. the embedded standard-library stubs
//!
//! Imported packages are checked declaration-only: their function bodies
//! are never looked at. Results are cached for the lifetime of one
//! [`Importer`], which is one request.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use iferr_go_cst::parse_file;
use thiserror::Error;
use tracing::debug;

use crate::checker::{check_package, CheckMode};
use crate::files::{go_files_in, read_file, FileError};
use crate::program::Program;
use crate::types::PkgId;

// ============================================================================
// Build Context
// ============================================================================

/// Where imports are looked for. Passed explicitly to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Workspace roots, each holding packages under `src/`.
    pub search_paths: Vec<PathBuf>,
    /// Consult `vendor/` directories above the importing file.
    pub use_vendor: bool,
}

impl BuildContext {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        BuildContext {
            search_paths,
            use_vendor: true,
        }
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        BuildContext::new(Vec::new())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot find package {path:?}")]
    NotFound { path: String },

    #[error("import cycle through {path:?}")]
    Cycle { path: String },

    #[error("package {path:?} has no parsable files")]
    NoFiles { path: String },

    #[error(transparent)]
    File(#[from] FileError),
}

pub type ImportResult<T> = Result<T, ImportError>;

// ============================================================================
// Embedded standard library
// ============================================================================

/// Declaration-only sources for commonly used standard packages.
const STDLIB: &[(&str, &str)] = &[
    ("bufio", include_str!("stdlib/bufio.go")),
    ("bytes", include_str!("stdlib/bytes.go")),
    ("context", include_str!("stdlib/context.go")),
    ("encoding/json", include_str!("stdlib/json.go")),
    ("errors", include_str!("stdlib/errors.go")),
    ("fmt", include_str!("stdlib/fmt.go")),
    ("io", include_str!("stdlib/io.go")),
    ("io/fs", include_str!("stdlib/fs.go")),
    ("io/ioutil", include_str!("stdlib/ioutil.go")),
    ("log", include_str!("stdlib/log.go")),
    ("net/http", include_str!("stdlib/http.go")),
    ("net/url", include_str!("stdlib/url.go")),
    ("os", include_str!("stdlib/os.go")),
    ("path/filepath", include_str!("stdlib/filepath.go")),
    ("strconv", include_str!("stdlib/strconv.go")),
    ("strings", include_str!("stdlib/strings.go")),
    ("sync", include_str!("stdlib/sync.go")),
    ("time", include_str!("stdlib/time.go")),
];

fn embedded(path: &str) -> Option<&'static str> {
    STDLIB
        .iter()
        .find(|(import, _)| *import == path)
        .map(|(_, source)| *source)
}

// ============================================================================
// Importer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Location {
    Dir(PathBuf),
    Embedded(String),
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    InProgress,
    Done(PkgId),
}

/// Loads imported packages into a [`Program`].
#[derive(Debug)]
pub struct Importer<'a> {
    ctx: &'a BuildContext,
    cache: HashMap<Location, Slot>,
}

impl<'a> Importer<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        Importer {
            ctx,
            cache: HashMap::new(),
        }
    }

    fn locate(&self, path: &str, from_dir: &Path) -> Option<Location> {
        if self.ctx.use_vendor {
            for dir in from_dir.ancestors() {
                let candidate = dir.join("vendor").join(path);
                if candidate.is_dir() {
                    return Some(Location::Dir(candidate));
                }
            }
        }
        for root in &self.ctx.search_paths {
            let candidate = root.join("src").join(path);
            if candidate.is_dir() {
                return Some(Location::Dir(candidate));
            }
        }
        embedded(path).map(|_| Location::Embedded(path.to_string()))
    }

    /// Import `path` as seen from a file in `from_dir`.
    pub fn import(&mut self, prog: &mut Program, path: &str, from_dir: &Path) -> ImportResult<PkgId> {
        let location = self.locate(path, from_dir).ok_or_else(|| ImportError::NotFound {
            path: path.to_string(),
        })?;
        match self.cache.get(&location) {
            Some(Slot::Done(pkg)) => return Ok(*pkg),
            Some(Slot::InProgress) => {
                return Err(ImportError::Cycle {
                    path: path.to_string(),
                })
            }
            None => {}
        }

        self.cache.insert(location.clone(), Slot::InProgress);
        let loaded = self.load(prog, path, &location);
        match loaded {
            Ok(pkg) => {
                self.cache.insert(location, Slot::Done(pkg));
                Ok(pkg)
            }
            Err(e) => {
                self.cache.remove(&location);
                Err(e)
            }
        }
    }

    fn load(&mut self, prog: &mut Program, path: &str, location: &Location) -> ImportResult<PkgId> {
        let sources = match location {
            Location::Dir(dir) => {
                let mut sources = Vec::new();
                for file in go_files_in(dir)? {
                    let text = read_file(&file)?;
                    sources.push((file, text));
                }
                sources
            }
            Location::Embedded(import) => {
                let text = embedded(import).unwrap_or_default();
                let file = PathBuf::from(import).join(format!("{}.go", last_element(import)));
                vec![(file, text.to_string())]
            }
        };

        let mut trees = Vec::new();
        for (file, text) in sources {
            match parse_file(&text) {
                Ok(tree) => trees.push((file, tree)),
                Err(e) => debug!(file = %file.display(), error = %e, "skipping unparsable file"),
            }
        }

        // The first file decides the package name; strays such as
        // `package main` helpers are left out.
        let Some(name) = trees.first().map(|(_, tree)| tree.package_name().to_string()) else {
            return Err(ImportError::NoFiles {
                path: path.to_string(),
            });
        };
        let pkg = prog.add_package(path, &name);
        for (file, tree) in trees {
            if tree.package_name() != name {
                debug!(file = %file.display(), package = tree.package_name(), "skipping file of another package");
                continue;
            }
            prog.add_file(pkg, file, tree);
        }

        debug!(path, package = %name, "imported package");
        check_package(prog, self, pkg, CheckMode::Declarations);
        Ok(pkg)
    }
}

fn last_element(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

// ============================================================================
// Tests
// ============================================================================
