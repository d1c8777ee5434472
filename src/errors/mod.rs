// src/errors/mod.rs
//! Structured error reporting for the Stoat core.
//!
//! This module provides error types using miette for fancy diagnostics.
//! Only caller-contract failures are represented here; defect-class
//! conditions (the type layer and value layer drifting out of agreement)
//! panic at the point of detection instead of returning an error.

pub mod report;
pub mod runtime;
pub mod sema;

pub use report::{render_to_stderr, render_to_string, render_to_writer};
pub use runtime::RuntimeError;
pub use sema::SemaError;
