// src/sema/type_arena.rs
//
// Interned structural type system using TypeId handles for O(1) equality
// and minimal allocations.
//
// This module provides the canonical type representation for Stoat:
// - TypeDesc: recursive structural description of a type (pure data)
// - TypeId: u32 handle partitioned into per-category id ranges
// - TypeArena: per-compilation storage with automatic deduplication

use std::fmt;

use hashbrown::HashMap;

use crate::errors::SemaError;

/// The nine built-in scalar kinds, in canonical pre-registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Undefined,
    Any,
    Void,
    Bool,
    Int,
    Double,
    String,
    Json,
    MetaType,
}

impl ScalarType {
    /// All scalar kinds, in the order their fixed ids are assigned.
    pub const ALL: [ScalarType; 9] = [
        ScalarType::Undefined,
        ScalarType::Any,
        ScalarType::Void,
        ScalarType::Bool,
        ScalarType::Int,
        ScalarType::Double,
        ScalarType::String,
        ScalarType::Json,
        ScalarType::MetaType,
    ];

    /// Get the source-syntax name for diagnostics
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Undefined => "undefined",
            ScalarType::Any => "any",
            ScalarType::Void => "void",
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Double => "double",
            ScalarType::String => "string",
            ScalarType::Json => "json",
            ScalarType::MetaType => "typeid",
        }
    }
}

/// Growable list of struct members, held by value.
///
/// A heap-backed `Vec` (rather than an inline `SmallVec`) is required
/// here: members hold `TypeDesc` by value, so inline element storage
/// would make `TypeDesc` recursively embed itself and become infinitely
/// sized. The `Vec` pointer breaks that layout cycle.
pub type MemberVec = Vec<(String, TypeDesc)>;

/// Growable list of function parameters, held by value. Heap-backed for
/// the same recursion-breaking reason as [`MemberVec`].
pub type ParamVec = Vec<TypeDesc>;

/// Structural description of a type.
///
/// Composite descriptors hold their component descriptors by value, so a
/// descriptor is a self-contained tree with deep structural equality.
/// Consumers that need a component's id re-resolve it through
/// [`TypeArena::lookup_id`]; interning a composite registers every
/// component as a side effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    Scalar(ScalarType),
    /// Named members in declaration order. Member names are part of the
    /// type's structural identity.
    Struct { members: MemberVec },
    Vector { element: Box<TypeDesc> },
    /// String-keyed dictionary; only the value type varies.
    Dict { value: Box<TypeDesc> },
    Function { ret: Box<TypeDesc>, params: ParamVec },
}

impl TypeDesc {
    pub fn vector(element: TypeDesc) -> Self {
        TypeDesc::Vector {
            element: Box::new(element),
        }
    }

    pub fn dict(value: TypeDesc) -> Self {
        TypeDesc::Dict {
            value: Box::new(value),
        }
    }

    pub fn struct_type<I>(members: I) -> Self
    where
        I: IntoIterator<Item = (String, TypeDesc)>,
    {
        TypeDesc::Struct {
            members: members.into_iter().collect(),
        }
    }

    pub fn function<I>(ret: TypeDesc, params: I) -> Self
    where
        I: IntoIterator<Item = TypeDesc>,
    {
        TypeDesc::Function {
            ret: Box::new(ret),
            params: params.into_iter().collect(),
        }
    }

    /// The id-range category this descriptor registers under.
    pub fn kind(&self) -> TypeKind {
        match self {
            TypeDesc::Scalar(_) => TypeKind::Simple,
            TypeDesc::Struct { .. } => TypeKind::Struct,
            TypeDesc::Vector { .. } => TypeKind::Vector,
            TypeDesc::Dict { .. } => TypeKind::Dict,
            TypeDesc::Function { .. } => TypeKind::Function,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Scalar(s) => f.write_str(s.name()),
            TypeDesc::Struct { members } => {
                if members.is_empty() {
                    return f.write_str("struct {}");
                }
                f.write_str("struct { ")?;
                for (i, (name, ty)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                f.write_str(" }")
            }
            TypeDesc::Vector { element } => write!(f, "[{}]", element),
            TypeDesc::Dict { value } => write!(f, "dict<{}>", value),
            TypeDesc::Function { ret, params } => {
                f.write_str("func(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
        }
    }
}

/// Category of a type id, recoverable from the id alone by a range test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Simple,
    Struct,
    Vector,
    Dict,
    Function,
}

/// Concrete type identity in the TypeArena.
///
/// The u32 value space is partitioned into five disjoint ranges, one per
/// category, so classifying an id never needs a table lookup. Ids are
/// assigned sequentially within each range starting at the range base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    // ========================================================================
    // Range bases. Simple ids start at 0.
    // ========================================================================

    pub const STRUCT_BASE: u32 = 100_000_000;
    pub const VECTOR_BASE: u32 = 200_000_000;
    pub const DICT_BASE: u32 = 300_000_000;
    pub const FUNCTION_BASE: u32 = 400_000_000;

    // ========================================================================
    // Reserved TypeIds for the scalar kinds.
    // These are guaranteed to be interned at these indices by TypeArena::new()
    // ========================================================================

    pub const UNDEFINED: TypeId = TypeId(0);
    pub const ANY: TypeId = TypeId(1);
    pub const VOID: TypeId = TypeId(2);
    pub const BOOL: TypeId = TypeId(3);
    pub const INT: TypeId = TypeId(4);
    pub const DOUBLE: TypeId = TypeId(5);
    pub const STRING: TypeId = TypeId(6);
    pub const JSON: TypeId = TypeId(7);
    pub const METATYPE: TypeId = TypeId(8);

    /// Get the raw index (for debugging/serialization)
    pub fn index(self) -> u32 {
        self.0
    }

    /// Reconstruct an id from its raw index (cell payload decoding).
    pub(crate) fn from_raw(raw: u32) -> Self {
        TypeId(raw)
    }

    /// Classify this id by its range. Every u32 falls in exactly one range.
    #[inline]
    pub fn kind(self) -> TypeKind {
        match self.0 {
            x if x < Self::STRUCT_BASE => TypeKind::Simple,
            x if x < Self::VECTOR_BASE => TypeKind::Struct,
            x if x < Self::DICT_BASE => TypeKind::Vector,
            x if x < Self::FUNCTION_BASE => TypeKind::Dict,
            _ => TypeKind::Function,
        }
    }

    #[inline]
    pub fn is_simple(self) -> bool {
        self.kind() == TypeKind::Simple
    }

    #[inline]
    pub fn is_struct(self) -> bool {
        self.kind() == TypeKind::Struct
    }

    #[inline]
    pub fn is_vector(self) -> bool {
        self.kind() == TypeKind::Vector
    }

    #[inline]
    pub fn is_dict(self) -> bool {
        self.kind() == TypeKind::Dict
    }

    #[inline]
    pub fn is_function(self) -> bool {
        self.kind() == TypeKind::Function
    }
}

/// Per-compilation type arena with automatic interning/deduplication.
///
/// Grows monotonically; ids handed out are stable for the arena's
/// lifetime and never valid against another arena instance. Interning
/// requires exclusive access; lookups may be shared freely once no
/// writer is active.
pub struct TypeArena {
    /// Canonical tables, one per id range, indexed by (id - range base)
    simple: Vec<TypeDesc>,
    structs: Vec<TypeDesc>,
    vectors: Vec<TypeDesc>,
    dicts: Vec<TypeDesc>,
    functions: Vec<TypeDesc>,
    /// Structural deduplication index - hashbrown for better perf
    intern_map: HashMap<TypeDesc, TypeId>,
}

impl fmt::Debug for TypeArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeArena")
            .field("types_count", &self.len())
            .finish_non_exhaustive()
    }
}

impl TypeArena {
    /// Create a new TypeArena with the scalar kinds pre-interned at their
    /// fixed ids, so every arena instance agrees on them.
    pub fn new() -> Self {
        let mut arena = Self {
            simple: Vec::new(),
            structs: Vec::new(),
            vectors: Vec::new(),
            dicts: Vec::new(),
            functions: Vec::new(),
            intern_map: HashMap::new(),
        };

        // Pre-intern the scalars in the order defined by the TypeId
        // constants. The debug_asserts verify the constants match the
        // actual interned indices.
        for scalar in ScalarType::ALL {
            arena.intern(&TypeDesc::Scalar(scalar));
        }
        debug_assert_eq!(arena.lookup_id(&TypeDesc::Scalar(ScalarType::Undefined)), Ok(TypeId::UNDEFINED));
        debug_assert_eq!(arena.lookup_id(&TypeDesc::Scalar(ScalarType::Int)), Ok(TypeId::INT));
        debug_assert_eq!(arena.lookup_id(&TypeDesc::Scalar(ScalarType::String)), Ok(TypeId::STRING));
        debug_assert_eq!(arena.lookup_id(&TypeDesc::Scalar(ScalarType::MetaType)), Ok(TypeId::METATYPE));

        arena
    }

    /// Intern a type, returning the existing TypeId if already interned.
    ///
    /// The composite's own id is reserved and recorded before its
    /// components are interned, so a descriptor that reaches a type of
    /// its own shape through a member can never collide with the
    /// reservation in progress. Component ids are not returned; callers
    /// that need them re-resolve via [`Self::lookup_id`].
    pub fn intern(&mut self, desc: &TypeDesc) -> TypeId {
        if let Some(&id) = self.intern_map.get(desc) {
            return id;
        }

        let id = self.reserve(desc);
        tracing::debug!(id = id.index(), ty = %desc, "registered type");

        match desc {
            TypeDesc::Scalar(_) => {}
            TypeDesc::Struct { members } => {
                for (_, member) in members {
                    self.intern(member);
                }
            }
            TypeDesc::Vector { element } => {
                self.intern(element);
            }
            TypeDesc::Dict { value } => {
                self.intern(value);
            }
            TypeDesc::Function { ret, params } => {
                self.intern(ret);
                for param in params {
                    self.intern(param);
                }
            }
        }

        id
    }

    /// Reserve the next id in the descriptor's category and record the
    /// (id, descriptor) pair in the canonical table and dedup index.
    fn reserve(&mut self, desc: &TypeDesc) -> TypeId {
        let (table, base) = match desc.kind() {
            TypeKind::Simple => (&mut self.simple, 0),
            TypeKind::Struct => (&mut self.structs, TypeId::STRUCT_BASE),
            TypeKind::Vector => (&mut self.vectors, TypeId::VECTOR_BASE),
            TypeKind::Dict => (&mut self.dicts, TypeId::DICT_BASE),
            TypeKind::Function => (&mut self.functions, TypeId::FUNCTION_BASE),
        };
        let id = TypeId(base + table.len() as u32);
        table.push(desc.clone());
        self.intern_map.insert(desc.clone(), id);
        id
    }

    /// Structural lookup without registration.
    pub fn lookup_id(&self, desc: &TypeDesc) -> Result<TypeId, SemaError> {
        self.intern_map
            .get(desc)
            .copied()
            .ok_or_else(|| SemaError::DescriptorNotFound {
                name: desc.to_string(),
            })
    }

    /// Reverse lookup by id: range classification plus direct index.
    pub fn lookup_desc(&self, id: TypeId) -> Result<&TypeDesc, SemaError> {
        let (table, base) = match id.kind() {
            TypeKind::Simple => (&self.simple, 0),
            TypeKind::Struct => (&self.structs, TypeId::STRUCT_BASE),
            TypeKind::Vector => (&self.vectors, TypeId::VECTOR_BASE),
            TypeKind::Dict => (&self.dicts, TypeId::DICT_BASE),
            TypeKind::Function => (&self.functions, TypeId::FUNCTION_BASE),
        };
        table
            .get((id.index() - base) as usize)
            .ok_or(SemaError::UnknownTypeId { id: id.index() })
    }

    /// Total number of registered types, across all categories.
    pub fn len(&self) -> usize {
        self.simple.len()
            + self.structs.len()
            + self.vectors.len()
            + self.dicts.len()
            + self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}
