use rustc_hash::FxHashSet;

use super::*;
use crate::types::{AbstractType, ClassId, PrimitiveKind, TypeData, TypeId, TypeListId, VarId};

#[test]
fn well_known_ids_are_stable() {
    let types = TypeInterner::new();
    assert_eq!(types.intern(TypeData::Null), TypeId::NULL);
    assert_eq!(
        types.intern(TypeData::Primitive(PrimitiveKind::Boolean)),
        TypeId::BOOLEAN
    );
    assert_eq!(
        types.intern(TypeData::Primitive(PrimitiveKind::Int)),
        TypeId::INT
    );
    assert_eq!(
        types.intern(TypeData::Primitive(PrimitiveKind::Double)),
        TypeId::DOUBLE
    );
    assert_eq!(types.intern_list(&[]), TypeListId::EMPTY);
}

#[test]
fn interning_deduplicates() {
    let types = TypeInterner::new();
    let a = types.array(TypeId::INT);
    let b = types.array(TypeId::INT);
    let c = types.array(TypeId::LONG);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(types.data(a), TypeData::Array(TypeId::INT));
}

#[test]
fn intersection_is_order_insensitive_and_collapses() {
    let types = TypeInterner::new();
    let a = types.class(ClassId(1), &[]);
    let b = types.class(ClassId(2), &[]);
    assert_eq!(types.intersection(&[a, b]), types.intersection(&[b, a]));
    assert_eq!(types.intersection(&[a, a]), a);
}

#[test]
fn fresh_types_are_distinct() {
    let types = TypeInterner::new();
    let obj = types.class(ClassId(0), &[]);
    let f1 = types.fresh(obj, None);
    let f2 = types.fresh(obj, None);
    assert_ne!(f1, f2);
}

#[test]
fn variable_mentions_and_classification() {
    let types = TypeInterner::new();
    let v = VarId(0);
    let alpha = types.use_of(v);
    let list_alpha = types.class(ClassId(7), &[alpha]);
    let proper = types.class(ClassId(7), &[TypeId::NULL]);

    assert!(types.mentions_vars(alpha));
    assert!(types.mentions_vars(list_alpha));
    assert!(!types.mentions_vars(proper));

    assert_eq!(types.classify(alpha), AbstractType::Variable(v));
    assert_eq!(types.classify(list_alpha), AbstractType::Inference(list_alpha));
    assert_eq!(types.classify(proper), AbstractType::Proper(proper));

    let mut vars = FxHashSet::default();
    types.collect_vars(list_alpha, &mut vars);
    assert_eq!(vars.len(), 1);
    assert!(vars.contains(&v));
}

#[test]
fn wildcard_parameterization_detection() {
    let types = TypeInterner::new();
    let wild = types.wildcard();
    let with_wild = types.class(ClassId(3), &[wild]);
    let without = types.class(ClassId(3), &[TypeId::NULL]);
    assert!(types.is_wildcard_parameterized(with_wild));
    assert!(!types.is_wildcard_parameterized(without));
    assert!(!types.is_wildcard_parameterized(wild));
}
