use jinfer_common::Interner;

use super::*;
use crate::bounds::BoundKind;
use crate::constraint::{Constraint, QualKind};

fn concrete(names: &Interner, s: &str) -> AbstractQualifier {
    AbstractQualifier::Concrete(Qualifier(names.intern(s)))
}

#[test]
fn equal_concrete_bound_instantiates() {
    let names = Interner::new();
    let mut vb = QualVarBounds::default();
    assert!(vb.add_bound(BoundKind::Equal, concrete(&names, "NonNull")));
    assert_eq!(
        vb.instantiation,
        Some(Qualifier(names.intern("NonNull")))
    );
}

#[test]
fn duplicate_bounds_are_ignored() {
    let names = Interner::new();
    let mut vb = QualVarBounds::default();
    let q = concrete(&names, "Nullable");
    assert!(vb.add_bound(BoundKind::Upper, q));
    let before = vb.constraints.len();
    assert!(!vb.add_bound(BoundKind::Upper, q));
    assert_eq!(vb.constraints.len(), before);
}

#[test]
fn complementary_bounds_imply_constraints() {
    let names = Interner::new();
    let mut vb = QualVarBounds::default();
    vb.add_bound(BoundKind::Lower, concrete(&names, "NonNull"));
    assert!(vb.constraints.is_empty());
    vb.add_bound(BoundKind::Upper, concrete(&names, "Nullable"));
    // lower <: upper
    assert_eq!(vb.constraints.len(), 1);
    assert!(matches!(
        vb.constraints[0],
        Constraint::QualifierTyping {
            kind: QualKind::Subqualifier,
            ..
        }
    ));
}

#[test]
fn concrete_bounds_skip_variables() {
    let names = Interner::new();
    let mut vb = QualVarBounds::default();
    vb.add_bound(BoundKind::Lower, concrete(&names, "NonNull"));
    vb.add_bound(BoundKind::Lower, AbstractQualifier::Variable(QualVarId(9)));
    assert_eq!(vb.concrete_bounds(BoundKind::Lower).len(), 1);
}

#[test]
fn save_and_restore_round_trip() {
    let names = Interner::new();
    let mut vb = QualVarBounds::default();
    vb.save();
    vb.add_bound(BoundKind::Equal, concrete(&names, "NonNull"));
    assert!(vb.instantiation.is_some());
    vb.restore();
    assert!(vb.instantiation.is_none());
    assert!(vb.bounds(BoundKind::Equal).is_empty());
    assert!(vb.constraints.is_empty());
}

#[test]
fn store_allocates_dense_ids() {
    let mut store = QualVarStore::new();
    let a = store.alloc();
    let b = store.alloc();
    assert_eq!(a, QualVarId(0));
    assert_eq!(b, QualVarId(1));
    assert_eq!(store.len(), 2);
    assert_eq!(store.ids().count(), 2);
}
