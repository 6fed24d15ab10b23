//! iferr: expand a Go call into an if-err block.
//!
//! Given a Go file and a cursor on a call whose result includes an `error`,
//! iferr rewrites the call so the error is checked and returned from the
//! enclosing function together with zero values for the other results.

// Core infrastructure - re-exported from iferr-core
pub use iferr_core::error;
pub use iferr_core::output;
pub use iferr_core::patch;
pub use iferr_core::text;

// The engine
pub use iferr_go as go;

// Front door
pub mod cli;
