// tests/runtime_scenarios.rs
//! End-to-end scenarios across the type arena, value encoding, persistent
//! arrays, and the write cache.

use stoat_core::identity::FunctionId;
use stoat_core::runtime::{
    OwnedValue, PersistentArray, RtValue, WriteCache, from_runtime, rt_value_eq, to_runtime,
};
use stoat_core::sema::{ScalarType, TypeArena, TypeDesc, TypeId};

fn int() -> TypeDesc {
    TypeDesc::Scalar(ScalarType::Int)
}

fn string() -> TypeDesc {
    TypeDesc::Scalar(ScalarType::String)
}

#[test]
fn interning_scalars_and_a_struct() {
    let mut arena = TypeArena::new();
    let int_id = arena.intern(&int());
    let string_id = arena.intern(&string());
    let point = TypeDesc::struct_type([
        ("x".to_string(), int()),
        ("y".to_string(), string()),
    ]);
    let struct_id = arena.intern(&point);

    // The scalars keep their fixed pre-registration ids.
    assert_eq!(int_id, TypeId::INT);
    assert_eq!(int_id.index(), 4);
    assert_eq!(string_id, TypeId::STRING);
    assert_eq!(string_id.index(), 6);
    assert!(struct_id.index() >= TypeId::STRUCT_BASE);
    assert_ne!(int_id, string_id);
    assert_ne!(string_id, struct_id);

    // Interning the same structural type again changes nothing.
    let table_size = arena.len();
    assert_eq!(arena.intern(&point), struct_id);
    assert_eq!(arena.len(), table_size);
}

#[test]
fn ids_are_only_valid_against_their_own_arena() {
    let mut first = TypeArena::new();
    let id = first.intern(&TypeDesc::vector(int()));
    let second = TypeArena::new();
    assert!(second.lookup_desc(id).is_err());
}

#[test]
fn sixteen_buffered_appends_then_a_page_crossing() {
    let base = PersistentArray::empty();
    let mut cache = WriteCache::new(base.clone());
    for i in 0..16 {
        cache.push_back(RtValue::from_int(i));
    }
    assert_eq!(cache.len(), 16);
    for i in 0..16 {
        assert_eq!(cache.load_element(i as usize).unwrap().int_payload(), i);
    }
    // Nothing committed yet.
    assert_eq!(base.len(), 0);

    // The seventeenth append crosses the page boundary.
    cache.push_back(RtValue::from_int(16));
    assert_eq!(cache.len(), 17);
    for i in 0..17 {
        assert_eq!(cache.load_element(i as usize).unwrap().int_payload(), i);
    }
    let array = cache.commit();
    assert_eq!(array.len(), 17);
    for i in 0..17 {
        assert_eq!(array.get(i as usize).unwrap().int_payload(), i);
    }
}

#[test]
fn persistent_array_versions_do_not_alias() {
    let a: PersistentArray = (0..50).map(RtValue::from_int).collect();
    let b = a.push_back(RtValue::from_int(50));
    let c = b.set(10, RtValue::from_int(-10)).unwrap();

    assert_eq!(a.len(), 50);
    for i in 0..50 {
        assert_eq!(a.get(i).unwrap().int_payload(), i as i64);
    }
    assert_eq!(b.len(), 51);
    assert_eq!(b.get(10).unwrap().int_payload(), 10);
    assert_eq!(c.get(10).unwrap().int_payload(), -10);
}

#[test]
fn write_cache_is_observationally_transparent() {
    let base: PersistentArray = (0..30).map(RtValue::from_int).collect();
    let mut cache = WriteCache::new(base.clone());
    let mut direct = base;

    // A burst of appends, local updates, and one far write.
    for v in 30..70 {
        cache.push_back(RtValue::from_int(v));
        direct = direct.push_back(RtValue::from_int(v));
    }
    for (index, v) in [(69, -69), (2, -2), (35, -35), (68, -68)] {
        cache.set(index, RtValue::from_int(v)).unwrap();
        direct = direct.set(index, RtValue::from_int(v)).unwrap();
    }
    cache.push_back(RtValue::from_int(70));
    direct = direct.push_back(RtValue::from_int(70));

    let committed = cache.commit();
    assert_eq!(committed.len(), direct.len());
    for i in 0..direct.len() {
        assert_eq!(
            committed.get(i).unwrap().int_payload(),
            direct.get(i).unwrap().int_payload(),
            "index {}",
            i
        );
    }
}

#[test]
fn values_roundtrip_through_the_cell_boundary() {
    let mut arena = TypeArena::new();
    let record = TypeDesc::struct_type([
        ("title".to_string(), string()),
        ("tags".to_string(), TypeDesc::vector(string())),
        ("weights".to_string(), TypeDesc::vector(TypeDesc::Scalar(ScalarType::Double))),
        ("meta".to_string(), TypeDesc::dict(int())),
        ("callback".to_string(), TypeDesc::function(TypeDesc::Scalar(ScalarType::Void), [int()])),
    ]);
    let id = arena.intern(&record);

    let value = OwnedValue::Struct(vec![
        OwnedValue::Str("a title long enough for the heap".into()),
        OwnedValue::Vector(vec![OwnedValue::Str("a".into()), OwnedValue::Str("b".into())]),
        OwnedValue::Vector(vec![OwnedValue::Double(0.5), OwnedValue::Double(-0.0)]),
        OwnedValue::Dict(vec![
            ("hits".to_string(), OwnedValue::Int(3)),
            ("misses".to_string(), OwnedValue::Int(1)),
        ]),
        OwnedValue::Function(FunctionId::new(9)),
    ]);

    let cell = to_runtime(&value, id, &arena);
    assert_eq!(from_runtime(&cell, id, &arena), value);

    // Two independent conversions are equal by value, not by handle.
    let again = to_runtime(&value, id, &arena);
    assert!(rt_value_eq(&cell, &again, id, &arena));
}

#[test]
fn vector_cells_share_storage_when_cloned() {
    let mut arena = TypeArena::new();
    let id = arena.intern(&TypeDesc::vector(int()));
    let cell = to_runtime(
        &OwnedValue::Vector((0..100).map(OwnedValue::Int).collect()),
        id,
        &arena,
    );
    let shared = cell.clone();
    // Equality takes the identity fast path, and the decoded trees match.
    assert!(rt_value_eq(&cell, &shared, id, &arena));
    assert_eq!(
        from_runtime(&cell, id, &arena),
        from_runtime(&shared, id, &arena)
    );
}
