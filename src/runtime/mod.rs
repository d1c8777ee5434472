// src/runtime/mod.rs
pub mod convert;
pub mod persistent;
pub mod value;
pub mod write_cache;

pub use convert::{OwnedValue, from_runtime, to_runtime};
pub use persistent::PersistentArray;
pub use value::{
    DictBody, ElementMode, FunctionBody, HeapValue, INLINE_STR_MAX, RtValue, StringBody,
    StructBody, VectorBody, rt_value_eq,
};
pub use write_cache::{PAGE, WriteCache};
