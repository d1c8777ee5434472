// src/lib.rs
//! Stoat core: interned types and runtime value representation.
//!
//! This crate is the memory model the rest of the Stoat toolchain agrees
//! on. The compiler interns structural type descriptions into a
//! [`sema::TypeArena`] and threads the resulting [`sema::TypeId`]s through
//! its output; the execution layers convert between tree-shaped
//! [`runtime::OwnedValue`]s and compact [`runtime::RtValue`] cells at the
//! [`runtime::to_runtime`] / [`runtime::from_runtime`] boundary. Vector
//! values are backed by a structurally-shared [`runtime::PersistentArray`],
//! optionally fronted by a [`runtime::WriteCache`] during bursts of
//! sequential writes.

pub mod errors;
pub mod identity;
pub mod runtime;
pub mod sema;
