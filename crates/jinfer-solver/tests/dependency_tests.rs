use indexmap::IndexSet;

use super::*;
use crate::bounds::BoundKind;
use crate::constraint::{Constraint, ConstraintSet};
use crate::expression::ExprKind;
use crate::fixtures::World;
use crate::types::VarId;

#[test]
fn every_variable_depends_on_itself() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    let vars: IndexSet<VarId> = [v].into_iter().collect();
    let deps = Dependencies::build(&ctx, &vars, &ConstraintSet::new());
    let expected: IndexSet<VarId> = [v].into_iter().collect();
    assert_eq!(deps.dependencies_of(v), expected);
}

#[test]
fn bound_mentions_create_edges_transitively() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let a = ctx.new_var(w.id_t);
    let b = ctx.new_var(w.fn_t);
    let c = ctx.new_var(w.fn_r);
    ctx.add_bound(a, BoundKind::Upper, w.ty(w.list, &[w.types.use_of(b)]));
    ctx.add_bound(b, BoundKind::Upper, w.ty(w.list, &[w.types.use_of(c)]));

    let vars: IndexSet<VarId> = [a, b, c].into_iter().collect();
    let deps = Dependencies::build(&ctx, &vars, &ConstraintSet::new());
    let of_a = deps.dependencies_of(a);
    assert!(of_a.contains(&b));
    assert!(of_a.contains(&c));
    assert!(!deps.dependencies_of(c).contains(&a));
}

#[test]
fn deferred_constraints_link_outputs_to_inputs() {
    let mut w = World::new();
    let lam = w.exprs.alloc(ExprKind::Lambda {
        param_types: None,
        param_count: 1,
        returns: vec![],
        thrown: vec![],
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let t = ctx.new_var(w.fn_t);
    let r = ctx.new_var(w.fn_r);
    let target = w.ty(w.function, &[w.types.use_of(t), w.types.use_of(r)]);
    let deferred = ConstraintSet::of([Constraint::Expression { expr: lam, target }]);

    let vars: IndexSet<VarId> = [t, r].into_iter().collect();
    let deps = Dependencies::build(&ctx, &vars, &deferred);
    assert!(deps.dependencies_of(r).contains(&t));
    assert!(!deps.dependencies_of(t).contains(&r));
}

#[test]
fn smallest_group_prefers_singletons() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let a = ctx.new_var(w.id_t);
    let b = ctx.new_var(w.fn_t);
    let c = ctx.new_var(w.fn_r);
    // a depends on b; c stands alone.
    ctx.add_bound(a, BoundKind::Upper, w.ty(w.list, &[w.types.use_of(b)]));

    let vars: IndexSet<VarId> = [a, b, c].into_iter().collect();
    let deps = Dependencies::build(&ctx, &vars, &ConstraintSet::new());
    let group = deps
        .smallest_group([a, b, c])
        .expect("non-empty candidate set");
    assert_eq!(group.len(), 1);
    assert!(deps.smallest_group(std::iter::empty()).is_none());
}

#[test]
fn dependencies_ignore_variables_outside_the_set() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let a = ctx.new_var(w.id_t);
    let outsider = ctx.new_var(w.fn_t);
    ctx.add_bound(a, BoundKind::Upper, w.ty(w.list, &[w.types.use_of(outsider)]));

    let vars: IndexSet<VarId> = [a].into_iter().collect();
    let deps = Dependencies::build(&ctx, &vars, &ConstraintSet::new());
    let expected: IndexSet<VarId> = [a].into_iter().collect();
    assert_eq!(deps.dependencies_of(a), expected);
}
