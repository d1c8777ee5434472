// src/errors/runtime.rs
//! Runtime value errors (E3xxx).

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("index {index} out of range for array of length {len}")]
    #[diagnostic(code(E3001))]
    OutOfRange { index: usize, len: usize },
}
