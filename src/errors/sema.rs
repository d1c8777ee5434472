// src/errors/sema.rs
//! Type arena errors (E2xxx).

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum SemaError {
    #[error("type '{name}' was never interned in this arena")]
    #[diagnostic(
        code(E2001),
        help("intern the descriptor before looking it up")
    )]
    DescriptorNotFound { name: String },

    #[error("type id {id} was not issued by this arena")]
    #[diagnostic(
        code(E2002),
        help("type ids are only valid against the arena instance that issued them")
    )]
    UnknownTypeId { id: u32 },
}
