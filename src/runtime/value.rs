// src/runtime/value.rs
//
// Fixed-size runtime value cells and their reference-counted heap bodies.
//
// A cell on its own is meaningless: the paired TypeId decides how its
// payload is read. Consumers thread (cell, type id) pairs everywhere and
// never infer an encoding from the cell alone.

use std::sync::Arc;

use crate::identity::FunctionId;
use crate::runtime::persistent::PersistentArray;
use crate::sema::{ScalarType, TypeArena, TypeDesc, TypeId};

/// Longest string stored inline: one length byte plus up to seven data
/// bytes in the 64-bit payload.
pub const INLINE_STR_MAX: usize = 7;

/// One runtime value in cell form.
///
/// Inline cells carry the value bits directly; heap cells carry a shared
/// handle to external storage. Cloning a heap cell bumps the refcount;
/// dropping the last handle frees the body. Values are trees at the
/// language level, so handles can never form a cycle.
#[derive(Debug, Clone)]
pub enum RtValue {
    Inline(u64),
    Heap(Arc<HeapValue>),
}

impl Default for RtValue {
    fn default() -> Self {
        RtValue::Inline(0)
    }
}

impl RtValue {
    /// The encoding for `undefined` and `void`.
    pub fn unit() -> Self {
        RtValue::Inline(0)
    }

    pub fn from_bool(v: bool) -> Self {
        RtValue::Inline(v as u64)
    }

    pub fn from_int(v: i64) -> Self {
        RtValue::Inline(v as u64)
    }

    /// Bit-preserving: NaN payloads and signed zeros survive a round trip.
    pub fn from_double(v: f64) -> Self {
        RtValue::Inline(v.to_bits())
    }

    pub fn from_type_id(id: TypeId) -> Self {
        RtValue::Inline(id.index() as u64)
    }

    /// The canonical string encoding: inline when the bytes fit, a heap
    /// body otherwise. All string cells must be built here so that equal
    /// strings always share one representation.
    pub fn from_str(s: &str) -> Self {
        if s.len() <= INLINE_STR_MAX {
            RtValue::Inline(pack_inline_str(s.as_bytes()))
        } else {
            RtValue::Heap(Arc::new(HeapValue::String(StringBody::new(s))))
        }
    }

    pub(crate) fn from_body(body: HeapValue) -> Self {
        RtValue::Heap(Arc::new(body))
    }

    /// Raw payload of an inline cell. Panics on a heap cell: that means
    /// the caller's type id disagrees with the cell's encoding.
    pub fn raw_payload(&self) -> u64 {
        match self {
            RtValue::Inline(p) => *p,
            RtValue::Heap(_) => panic!("expected an inline cell, found a heap handle"),
        }
    }

    pub fn bool_payload(&self) -> bool {
        self.raw_payload() != 0
    }

    pub fn int_payload(&self) -> i64 {
        self.raw_payload() as i64
    }

    pub fn double_payload(&self) -> f64 {
        f64::from_bits(self.raw_payload())
    }

    pub fn type_id_payload(&self) -> TypeId {
        let raw = self.raw_payload();
        u32::try_from(raw)
            .map(TypeId::from_raw)
            .expect("typeid payload exceeds 32 bits")
    }

    /// Shared handle of a heap cell. Panics on an inline cell.
    pub fn heap(&self) -> &Arc<HeapValue> {
        match self {
            RtValue::Heap(h) => h,
            RtValue::Inline(_) => panic!("expected a heap cell, found an inline payload"),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, RtValue::Inline(_))
    }

    /// Text of a string- or json-typed cell, whichever encoding it uses.
    /// This is the accessor native bindings must go through; it panics on
    /// any other cell shape.
    pub fn string_text(&self) -> String {
        match self {
            RtValue::Inline(p) => {
                let raw = p.to_le_bytes();
                let len = raw[0] as usize;
                assert!(len <= INLINE_STR_MAX, "inline payload is not a packed string");
                String::from_utf8(raw[1..1 + len].to_vec())
                    .expect("string payloads hold valid UTF-8")
            }
            RtValue::Heap(h) => match &**h {
                HeapValue::String(s) => s.as_str().to_string(),
                _ => panic!("cell does not hold a string body"),
            },
        }
    }
}

/// Pack a short byte string into a 64-bit payload: length in the low
/// byte, data in the following bytes, zero padding above.
pub(crate) fn pack_inline_str(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= INLINE_STR_MAX);
    let mut raw = [0u8; 8];
    raw[0] = bytes.len() as u8;
    raw[1..1 + bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(raw)
}

/// Heap-allocated backing for values too large for inline storage.
#[derive(Debug)]
pub enum HeapValue {
    String(StringBody),
    Struct(StructBody),
    Vector(VectorBody),
    Dict(DictBody),
    Function(FunctionBody),
}

/// Body of a heap-allocated string: text plus a hash computed once at
/// construction and used as a cheap mismatch reject in comparisons.
#[derive(Debug)]
pub struct StringBody {
    hash: u64,
    text: Box<str>,
}

impl StringBody {
    pub(crate) fn new(s: &str) -> Self {
        Self {
            hash: fnv1a(s.as_bytes()),
            text: s.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for StringBody {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.text == other.text
    }
}

impl Eq for StringBody {}

/// Simple FNV-1a hash
pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Body of a struct value: one cell per member, in declaration order.
#[derive(Debug)]
pub struct StructBody {
    fields: Box<[RtValue]>,
}

impl StructBody {
    pub(crate) fn new(fields: Vec<RtValue>) -> Self {
        Self {
            fields: fields.into_boxed_slice(),
        }
    }

    /// Member cell by declaration-order slot.
    pub fn field(&self, slot: usize) -> &RtValue {
        &self.fields[slot]
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Body of a vector value: a persistent array of element cells.
#[derive(Debug)]
pub struct VectorBody {
    elems: PersistentArray,
}

impl VectorBody {
    pub(crate) fn new(elems: PersistentArray) -> Self {
        Self { elems }
    }

    pub fn elems(&self) -> &PersistentArray {
        &self.elems
    }
}

/// Body of a dict value: string-keyed entries in insertion order.
#[derive(Debug)]
pub struct DictBody {
    entries: Box<[(Box<str>, RtValue)]>,
}

impl DictBody {
    pub(crate) fn new(entries: Vec<(Box<str>, RtValue)>) -> Self {
        Self {
            entries: entries.into_boxed_slice(),
        }
    }

    pub fn entries(&self) -> &[(Box<str>, RtValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Body of a function value: the reference to its compiled code.
/// Capture environments are execution-layer state and live behind the
/// native registry, not in the value core.
#[derive(Debug)]
pub struct FunctionBody {
    func: FunctionId,
}

impl FunctionBody {
    pub(crate) fn new(func: FunctionId) -> Self {
        Self { func }
    }

    pub fn func(&self) -> FunctionId {
        self.func
    }
}

/// How a vector/dict stores its elements, fixed at type-registration time
/// by the element type id alone - never by inspecting values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementMode {
    /// Raw inline payloads; dropping the container touches no refcounts.
    InPlace,
    /// Cells that may hold refcounted handles.
    External,
}

impl ElementMode {
    /// Classify by id: a pure constant/range test, no table lookup.
    pub fn of(element: TypeId) -> ElementMode {
        match element {
            TypeId::UNDEFINED
            | TypeId::VOID
            | TypeId::BOOL
            | TypeId::INT
            | TypeId::DOUBLE
            | TypeId::METATYPE => ElementMode::InPlace,
            _ => ElementMode::External,
        }
    }

    pub fn is_external(self) -> bool {
        matches!(self, ElementMode::External)
    }
}

/// Typed structural equality over cells.
///
/// Inline payloads compare raw. Heap payloads short-circuit on handle
/// identity, then compare structurally, so two values built
/// independently from equal inputs always compare equal. Panics if the
/// cells' encodings disagree with `id`: that is drift between the type
/// layer and the value layer, not a runtime condition.
pub fn rt_value_eq(a: &RtValue, b: &RtValue, id: TypeId, arena: &TypeArena) -> bool {
    let desc = arena
        .lookup_desc(id)
        .expect("equality requires an id issued by this arena");
    match desc {
        TypeDesc::Scalar(s) => match s {
            ScalarType::String | ScalarType::Json => string_eq(a, b),
            ScalarType::Any => panic!("`any` has no runtime encoding"),
            _ => a.raw_payload() == b.raw_payload(),
        },
        TypeDesc::Struct { members } => {
            let (x, y) = (a.heap(), b.heap());
            if Arc::ptr_eq(x, y) {
                return true;
            }
            let (HeapValue::Struct(sa), HeapValue::Struct(sb)) = (&**x, &**y) else {
                panic!("struct-typed cells must hold struct bodies");
            };
            members.iter().enumerate().all(|(slot, (_, member))| {
                let member_id = arena
                    .lookup_id(member)
                    .expect("struct member types are interned with their struct");
                rt_value_eq(sa.field(slot), sb.field(slot), member_id, arena)
            })
        }
        TypeDesc::Vector { element } => {
            let (x, y) = (a.heap(), b.heap());
            if Arc::ptr_eq(x, y) {
                return true;
            }
            let (HeapValue::Vector(va), HeapValue::Vector(vb)) = (&**x, &**y) else {
                panic!("vector-typed cells must hold vector bodies");
            };
            let element_id = arena
                .lookup_id(element)
                .expect("vector element types are interned with their vector");
            let (ea, eb) = (va.elems(), vb.elems());
            ea.len() == eb.len()
                && (0..ea.len()).all(|i| {
                    let (va, vb) = (
                        ea.get(i).expect("index within len"),
                        eb.get(i).expect("index within len"),
                    );
                    rt_value_eq(&va, &vb, element_id, arena)
                })
        }
        TypeDesc::Dict { value } => {
            let (x, y) = (a.heap(), b.heap());
            if Arc::ptr_eq(x, y) {
                return true;
            }
            let (HeapValue::Dict(da), HeapValue::Dict(db)) = (&**x, &**y) else {
                panic!("dict-typed cells must hold dict bodies");
            };
            let value_id = arena
                .lookup_id(value)
                .expect("dict value types are interned with their dict");
            da.len() == db.len()
                && da
                    .entries()
                    .iter()
                    .zip(db.entries())
                    .all(|((ka, va), (kb, vb))| ka == kb && rt_value_eq(va, vb, value_id, arena))
        }
        TypeDesc::Function { .. } => {
            let (x, y) = (a.heap(), b.heap());
            if Arc::ptr_eq(x, y) {
                return true;
            }
            let (HeapValue::Function(fa), HeapValue::Function(fb)) = (&**x, &**y) else {
                panic!("function-typed cells must hold function bodies");
            };
            fa.func() == fb.func()
        }
    }
}

/// String cells compare without consulting the arena: equal strings share
/// one encoding, so a mixed inline/heap pair can only mean different
/// lengths.
fn string_eq(a: &RtValue, b: &RtValue) -> bool {
    match (a, b) {
        (RtValue::Inline(x), RtValue::Inline(y)) => x == y,
        (RtValue::Heap(x), RtValue::Heap(y)) => {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            let (HeapValue::String(sa), HeapValue::String(sb)) = (&**x, &**y) else {
                panic!("string-typed cells must hold string bodies");
            };
            sa == sb
        }
        _ => false,
    }
}
