use super::*;
use crate::constraint::{Constraint, TypingKind};
use crate::fixtures::World;
use crate::types::TypeId;

#[test]
fn proper_equal_bound_instantiates_with_boxing() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    ctx.add_bound(v, BoundKind::Equal, TypeId::INT);
    assert_eq!(ctx.vars.get(v).instantiation, Some(w.ty(w.integer, &[])));
}

#[test]
fn self_bounds_are_ignored() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    ctx.add_bound(v, BoundKind::Upper, w.types.use_of(v));
    assert!(ctx.vars.get(v).bounds(BoundKind::Upper).is_empty());
}

#[test]
fn duplicate_bounds_produce_no_new_constraints() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    let number = w.ty(w.number, &[]);
    ctx.add_bound(v, BoundKind::Upper, number);
    ctx.vars.take_pending();
    ctx.add_bound(v, BoundKind::Upper, number);
    assert!(!ctx.vars.has_pending());
}

#[test]
fn lower_and_upper_bounds_imply_a_subtype_check() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    let string = w.ty(w.string, &[]);
    let char_seq = w.ty(w.char_sequence, &[]);
    ctx.add_bound(v, BoundKind::Lower, string);
    ctx.add_bound(v, BoundKind::Upper, char_seq);
    let pending = ctx.vars.take_pending();
    assert!(pending.contains(&Constraint::subtype(string, char_seq)));
}

#[test]
fn same_class_bounds_equate_type_arguments() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    let x = ctx.new_var(w.fn_t);
    let string = w.ty(w.string, &[]);
    let list_string = w.ty(w.list, &[string]);
    let list_beta = w.ty(w.list, &[w.types.use_of(x)]);
    ctx.add_bound(v, BoundKind::Lower, list_string);
    ctx.add_bound(v, BoundKind::Upper, list_beta);
    let pending = ctx.vars.take_pending();
    assert!(pending.contains(&Constraint::equality(string, w.types.use_of(x))));
}

#[test]
fn proper_bounds_apply_instantiations_and_filter() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    let x = ctx.new_var(w.fn_t);
    let string = w.ty(w.string, &[]);
    let list_beta = w.ty(w.list, &[w.types.use_of(x)]);
    ctx.add_bound(v, BoundKind::Upper, list_beta);
    // Unresolved beta: the bound is not proper yet.
    assert!(ctx.proper_bounds(v, BoundKind::Upper).is_empty());
    ctx.vars.get_mut(x).instantiation = Some(string);
    assert_eq!(
        ctx.proper_bounds(v, BoundKind::Upper),
        vec![w.ty(w.list, &[string])]
    );
}

#[test]
fn save_and_restore_roll_back_bounds() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    let number = w.ty(w.number, &[]);
    ctx.add_bound(v, BoundKind::Lower, number);
    ctx.vars.save_all([v]);
    assert!(ctx.vars.get(v).has_saved());
    ctx.add_bound(v, BoundKind::Equal, w.ty(w.string, &[]));
    ctx.vars.restore_all([v]);
    let vb = ctx.vars.get(v);
    assert!(vb.bounds(BoundKind::Equal).is_empty());
    assert_eq!(vb.bounds(BoundKind::Lower).len(), 1);
    assert_eq!(vb.instantiation, None);
}

#[test]
fn restore_without_additions_keeps_bounds_intact() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    let number = w.ty(w.number, &[]);
    ctx.add_bound(v, BoundKind::Lower, number);
    ctx.vars.save_all([v]);
    ctx.vars.restore_all([v]);
    let vb = ctx.vars.get(v);
    assert_eq!(vb.bounds(BoundKind::Lower).len(), 1);
    assert!(vb.bounds(BoundKind::Lower).contains(&number));
    assert!(vb.bounds(BoundKind::Upper).is_empty());
    assert_eq!(vb.instantiation, None);
    assert!(!vb.has_saved());
}

#[test]
fn applying_instantiations_twice_changes_nothing() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    let string = w.ty(w.string, &[]);
    let list_alpha = w.ty(w.list, &[w.types.use_of(v)]);
    ctx.vars.get_mut(v).instantiation = Some(string);
    let once = ctx.apply_instantiations(list_alpha);
    assert_eq!(once, w.ty(w.list, &[string]));
    assert_eq!(ctx.apply_instantiations(once), once);
}

#[test]
fn incorporation_constraints_are_typing_shaped() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    ctx.add_bound(v, BoundKind::Equal, w.ty(w.string, &[]));
    ctx.add_bound(v, BoundKind::Upper, w.ty(w.char_sequence, &[]));
    let pending = ctx.vars.take_pending();
    assert!(pending.iter().all(|c| matches!(
        c,
        Constraint::Typing {
            kind: TypingKind::Subtype | TypingKind::Equality,
            ..
        }
    )));
    assert!(!pending.is_empty());
}
