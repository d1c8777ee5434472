// src/sema/mod.rs
pub mod type_arena;

pub use type_arena::{MemberVec, ParamVec, ScalarType, TypeArena, TypeDesc, TypeId, TypeKind};
