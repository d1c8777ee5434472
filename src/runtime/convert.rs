// src/runtime/convert.rs
//
// The boundary between tree-shaped values and cell form.
//
// This is the sole legal crossing: the compiler and native bindings hand
// values over as OwnedValue trees, the execution layers operate on
// (RtValue, TypeId) pairs, and nothing constructs a composite cell any
// other way. The type id drives every encoding decision; a value whose
// shape disagrees with its descriptor means the type layer and value
// layer have drifted apart, which is a defect, not a runtime condition.

use crate::identity::FunctionId;
use crate::runtime::persistent::PersistentArray;
use crate::runtime::value::{
    DictBody, ElementMode, FunctionBody, HeapValue, RtValue, StructBody, VectorBody,
};
use crate::sema::{ScalarType, TypeArena, TypeDesc, TypeId};

/// A value in tree form: every node owned, no sharing, no cells.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedValue {
    Undefined,
    Void,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Json(String),
    Type(TypeId),
    /// Member values in declaration order.
    Struct(Vec<OwnedValue>),
    Vector(Vec<OwnedValue>),
    /// String-keyed entries in insertion order.
    Dict(Vec<(String, OwnedValue)>),
    Function(FunctionId),
}

/// Encode a tree value into cell form under the type interned as `id`.
///
/// The resulting cell's encoding is exactly what the descriptor mandates;
/// callers must never infer the mode from the cell alone. Panics when the
/// value's shape does not match the descriptor, and for `any`, which has
/// no runtime encoding.
pub fn to_runtime(value: &OwnedValue, id: TypeId, arena: &TypeArena) -> RtValue {
    let desc = arena
        .lookup_desc(id)
        .expect("conversion requires an id issued by this arena");
    match (desc, value) {
        (TypeDesc::Scalar(ScalarType::Undefined), OwnedValue::Undefined) => RtValue::unit(),
        (TypeDesc::Scalar(ScalarType::Void), OwnedValue::Void) => RtValue::unit(),
        (TypeDesc::Scalar(ScalarType::Bool), OwnedValue::Bool(v)) => RtValue::from_bool(*v),
        (TypeDesc::Scalar(ScalarType::Int), OwnedValue::Int(v)) => RtValue::from_int(*v),
        (TypeDesc::Scalar(ScalarType::Double), OwnedValue::Double(v)) => RtValue::from_double(*v),
        (TypeDesc::Scalar(ScalarType::String), OwnedValue::Str(s)) => RtValue::from_str(s),
        (TypeDesc::Scalar(ScalarType::Json), OwnedValue::Json(s)) => RtValue::from_str(s),
        (TypeDesc::Scalar(ScalarType::MetaType), OwnedValue::Type(t)) => RtValue::from_type_id(*t),
        (TypeDesc::Scalar(ScalarType::Any), _) => {
            panic!("`any` has no runtime encoding; the checker must resolve it first")
        }
        (TypeDesc::Struct { members }, OwnedValue::Struct(values)) => {
            assert_eq!(
                members.len(),
                values.len(),
                "struct value arity disagrees with its type"
            );
            let fields = members
                .iter()
                .zip(values)
                .map(|((_, member), value)| to_runtime(value, member_id(member, arena), arena))
                .collect();
            RtValue::from_body(HeapValue::Struct(StructBody::new(fields)))
        }
        (TypeDesc::Vector { element }, OwnedValue::Vector(items)) => {
            let element_id = member_id(element, arena);
            let elems: PersistentArray = items
                .iter()
                .map(|item| to_runtime(item, element_id, arena))
                .collect();
            debug_assert!(
                ElementMode::of(element_id).is_external()
                    || elems.iter().all(|cell| cell.is_inline()),
                "in-place vector holds a heap handle"
            );
            RtValue::from_body(HeapValue::Vector(VectorBody::new(elems)))
        }
        (TypeDesc::Dict { value: value_ty }, OwnedValue::Dict(entries)) => {
            let value_id = member_id(value_ty, arena);
            let entries = entries
                .iter()
                .map(|(key, value)| {
                    (key.as_str().into(), to_runtime(value, value_id, arena))
                })
                .collect();
            RtValue::from_body(HeapValue::Dict(DictBody::new(entries)))
        }
        (TypeDesc::Function { .. }, OwnedValue::Function(func)) => {
            RtValue::from_body(HeapValue::Function(FunctionBody::new(*func)))
        }
        (desc, value) => panic!("value {:?} does not match the shape of type {}", value, desc),
    }
}

/// Decode a cell back into tree form: the structural inverse of
/// [`to_runtime`]. Doubles are bit-preserved, strings byte-preserved,
/// member order preserved.
pub fn from_runtime(cell: &RtValue, id: TypeId, arena: &TypeArena) -> OwnedValue {
    let desc = arena
        .lookup_desc(id)
        .expect("conversion requires an id issued by this arena");
    match desc {
        TypeDesc::Scalar(s) => match s {
            ScalarType::Undefined => OwnedValue::Undefined,
            ScalarType::Void => OwnedValue::Void,
            ScalarType::Bool => OwnedValue::Bool(cell.bool_payload()),
            ScalarType::Int => OwnedValue::Int(cell.int_payload()),
            ScalarType::Double => OwnedValue::Double(cell.double_payload()),
            ScalarType::String => OwnedValue::Str(cell.string_text()),
            ScalarType::Json => OwnedValue::Json(cell.string_text()),
            ScalarType::MetaType => OwnedValue::Type(cell.type_id_payload()),
            ScalarType::Any => panic!("`any` has no runtime encoding"),
        },
        TypeDesc::Struct { members } => {
            let HeapValue::Struct(body) = &**cell.heap() else {
                panic!("struct-typed cell must hold a struct body");
            };
            assert_eq!(
                body.field_count(),
                members.len(),
                "struct body arity disagrees with its type"
            );
            OwnedValue::Struct(
                members
                    .iter()
                    .enumerate()
                    .map(|(slot, (_, member))| {
                        from_runtime(body.field(slot), member_id(member, arena), arena)
                    })
                    .collect(),
            )
        }
        TypeDesc::Vector { element } => {
            let HeapValue::Vector(body) = &**cell.heap() else {
                panic!("vector-typed cell must hold a vector body");
            };
            let element_id = member_id(element, arena);
            OwnedValue::Vector(
                body.elems()
                    .iter()
                    .map(|elem| from_runtime(&elem, element_id, arena))
                    .collect(),
            )
        }
        TypeDesc::Dict { value } => {
            let HeapValue::Dict(body) = &**cell.heap() else {
                panic!("dict-typed cell must hold a dict body");
            };
            let value_id = member_id(value, arena);
            OwnedValue::Dict(
                body.entries()
                    .iter()
                    .map(|(key, cell)| {
                        (key.to_string(), from_runtime(cell, value_id, arena))
                    })
                    .collect(),
            )
        }
        TypeDesc::Function { .. } => {
            let HeapValue::Function(body) = &**cell.heap() else {
                panic!("function-typed cell must hold a function body");
            };
            OwnedValue::Function(body.func())
        }
    }
}

/// Component types are registered as a side effect of interning their
/// composite, so this resolution can only fail if the layers drifted.
fn member_id(desc: &TypeDesc, arena: &TypeArena) -> TypeId {
    arena
        .lookup_id(desc)
        .expect("component type is interned with its composite")
}
