use super::*;
use crate::dependencies::Dependencies;
use crate::expression::ExprKind;
use crate::fixtures::World;

#[test]
fn worklist_deduplicates_and_preserves_order() {
    let mut set = ConstraintSet::new();
    let a = Constraint::subtype(crate::types::TypeId::INT, crate::types::TypeId::LONG);
    let b = Constraint::subtype(crate::types::TypeId::BYTE, crate::types::TypeId::INT);
    set.push(a.clone());
    set.push(b.clone());
    set.push(a.clone());
    assert_eq!(set.len(), 2);
    assert_eq!(set.pop_front(), Some(a));
    assert_eq!(set.pop_front(), Some(b));
    assert_eq!(set.pop_front(), None);
}

#[test]
fn typing_constraints_have_only_output_vars() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let v = ctx.new_var(w.id_t);
    let alpha = w.types.use_of(v);
    let c = Constraint::subtype(alpha, w.ty(w.number, &[]));
    assert!(c.input_vars(&ctx).is_empty());
    let outputs = c.output_vars(&ctx);
    assert_eq!(outputs.len(), 1);
    assert!(outputs.contains(&v));
}

#[test]
fn lambda_constraints_take_function_params_as_inputs() {
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
    let target = w.ty(
        w.function,
        &[w.types.use_of(t), w.types.use_of(r)],
    );
    let c = Constraint::Expression { expr: lam, target };
    let inputs = c.input_vars(&ctx);
    assert!(inputs.contains(&t));
    assert!(!inputs.contains(&r));
    let outputs = c.output_vars(&ctx);
    assert!(outputs.contains(&r));
    assert!(!outputs.contains(&t));
}

#[test]
fn closed_subset_defers_blocked_constraints() {
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
    let target = w.ty(
        w.function,
        &[w.types.use_of(t), w.types.use_of(r)],
    );

    // The lambda needs the function-type parameter variable; the typing
    // constraint produces it.
    let blocked = Constraint::Expression { expr: lam, target };
    let producer = Constraint::subtype(w.ty(w.integer, &[]), w.types.use_of(t));
    let mut set = ConstraintSet::new();
    set.push(blocked.clone());
    set.push(producer.clone());

    let vars = [t, r].into_iter().collect();
    let deps = Dependencies::build(&ctx, &vars, &set);
    let subset = set.closed_subset(&ctx, &deps);
    assert_eq!(subset, vec![producer]);
}

#[test]
fn single_constraint_cycles_still_make_progress() {
    let mut w = World::new();
    let lam_a = w.exprs.alloc(ExprKind::Lambda {
        param_types: None,
        param_count: 1,
        returns: vec![],
        thrown: vec![],
    });
    let lam_b = w.exprs.alloc(ExprKind::Lambda {
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
    // Each lambda's input variable is the other's output.
    let target_a = w.ty(w.function, &[w.types.use_of(t), w.types.use_of(r)]);
    let target_b = w.ty(w.function, &[w.types.use_of(r), w.types.use_of(t)]);
    let mut set = ConstraintSet::new();
    set.push(Constraint::Expression { expr: lam_a, target: target_a });
    set.push(Constraint::Expression { expr: lam_b, target: target_b });

    let vars = [t, r].into_iter().collect();
    let deps = Dependencies::build(&ctx, &vars, &set);
    let subset = set.closed_subset(&ctx, &deps);
    assert_eq!(subset.len(), 1);
}

#[test]
fn describe_renders_operands() {
    let w = World::new();
    let oracle = w.oracle();
    let quals = w.lattice();
    let ctx = w.context(&oracle, &quals);
    let c = Constraint::subtype(w.ty(w.integer, &[]), w.ty(w.number, &[]));
    assert_eq!(c.describe(&ctx), "Integer <: Number");
    let e = Constraint::equality(w.ty(w.string, &[]), w.ty(w.string, &[]));
    assert_eq!(e.describe(&ctx), "String = String");
}
