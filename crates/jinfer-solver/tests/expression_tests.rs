use super::*;
use crate::bounds::BoundKind;
use crate::constraint::{Constraint, ReductionResult};
use crate::fixtures::World;
use crate::oracle::TypeOracle;
use crate::types::TypeId;

#[test]
fn pertinence_classification() {
    let mut w = World::new();
    let typed = w.exprs.typed(TypeId::INT);
    let implicit = w.exprs.alloc(ExprKind::Lambda {
        param_types: None,
        param_count: 1,
        returns: vec![],
        thrown: vec![],
    });
    let explicit = w.exprs.alloc(ExprKind::Lambda {
        param_types: Some(vec![TypeId::INT]),
        param_count: 1,
        returns: vec![typed],
        thrown: vec![],
    });
    let inexact = w.exprs.alloc(ExprKind::MethodRef {
        decl: w.id_method,
        receiver: None,
        exact: false,
    });
    let paren = w.exprs.alloc(ExprKind::Parenthesized(implicit));
    let cond = w.exprs.alloc(ExprKind::Conditional { then: typed, els: explicit });

    let oracle = w.oracle();
    let quals = w.lattice();
    let ctx = w.context(&oracle, &quals);
    assert!(pertinent_to_applicability(&ctx, typed));
    assert!(!pertinent_to_applicability(&ctx, implicit));
    assert!(pertinent_to_applicability(&ctx, explicit));
    assert!(!pertinent_to_applicability(&ctx, inexact));
    assert!(!pertinent_to_applicability(&ctx, paren));
    assert!(pertinent_to_applicability(&ctx, cond));
}

#[test]
fn typed_expressions_become_compatibility_constraints() {
    let mut w = World::new();
    let typed = w.exprs.typed(TypeId::INT);
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let number = w.ty(w.number, &[]);
    let r = reduce_expression(&mut ctx, typed, number).expect("reducible");
    let ReductionResult::One(c) = r else {
        panic!("expected one constraint");
    };
    assert_eq!(c, Constraint::compatible(TypeId::INT, number));
}

#[test]
fn conditionals_distribute_over_branches() {
    let mut w = World::new();
    let a = w.exprs.typed(TypeId::INT);
    let b = w.exprs.typed(TypeId::LONG);
    let cond = w.exprs.alloc(ExprKind::Conditional { then: a, els: b });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let number = w.ty(w.number, &[]);
    let ReductionResult::Many(out) =
        reduce_expression(&mut ctx, cond, number).expect("reducible")
    else {
        panic!("expected two branch constraints");
    };
    assert_eq!(
        out,
        vec![
            Constraint::Expression { expr: a, target: number },
            Constraint::Expression { expr: b, target: number },
        ]
    );
}

#[test]
fn lambda_against_proper_functional_target() {
    let mut w = World::new();
    let body = w.exprs.typed(TypeId::INT);
    let lam = w.exprs.alloc(ExprKind::Lambda {
        param_types: None,
        param_count: 1,
        returns: vec![body],
        thrown: vec![],
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let string = w.ty(w.string, &[]);
    let integer = w.ty(w.integer, &[]);
    let target = w.ty(w.function, &[string, integer]);

    let ReductionResult::Many(out) =
        reduce_expression(&mut ctx, lam, target).expect("reducible")
    else {
        panic!("expected body constraints");
    };
    assert_eq!(
        out,
        vec![Constraint::Expression { expr: body, target: integer }]
    );
}

#[test]
fn lambda_arity_mismatch_falsifies() {
    let mut w = World::new();
    let lam = w.exprs.alloc(ExprKind::Lambda {
        param_types: None,
        param_count: 2,
        returns: vec![],
        thrown: vec![],
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let target = w.ty(w.function, &[w.ty(w.string, &[]), w.ty(w.integer, &[])]);
    assert!(matches!(
        reduce_expression(&mut ctx, lam, target).expect("reducible"),
        ReductionResult::False(_)
    ));
}

#[test]
fn non_functional_lambda_target_falsifies() {
    let mut w = World::new();
    let lam = w.exprs.alloc(ExprKind::Lambda {
        param_types: None,
        param_count: 0,
        returns: vec![],
        thrown: vec![],
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let string = w.ty(w.string, &[]);
    assert!(matches!(
        reduce_expression(&mut ctx, lam, string).expect("reducible"),
        ReductionResult::False(_)
    ));
}

#[test]
fn implicit_lambda_grounds_wildcard_target() {
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
    let number = w.ty(w.number, &[]);
    let integer = w.ty(w.integer, &[]);
    let target = w.ty(w.function, &[w.types.wildcard_extends(number), integer]);

    let ReductionResult::Many(out) =
        reduce_expression(&mut ctx, lam, target).expect("reducible")
    else {
        panic!("expected grounding constraints");
    };
    let ground = w.ty(w.function, &[number, integer]);
    assert!(out.contains(&Constraint::subtype(ground, target)));
}

#[test]
fn explicit_lambda_infers_wildcard_parameterization() {
    let mut w = World::new();
    let body = w.exprs.typed(TypeId::INT);
    let integer_holder = w.ty(w.integer, &[]);
    let lam = w.exprs.alloc(ExprKind::Lambda {
        param_types: Some(vec![integer_holder]),
        param_count: 1,
        returns: vec![body],
        thrown: vec![],
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let number = w.ty(w.number, &[]);
    let string = w.ty(w.string, &[]);
    let target = w.ty(w.function, &[w.types.wildcard_extends(number), string]);

    let ReductionResult::Many(out) =
        reduce_expression(&mut ctx, lam, target).expect("reducible")
    else {
        panic!("expected grounding constraints");
    };
    // The mini-inference equated the explicit Integer parameter with the
    // declared one, so the ground target is Function<Integer, String>.
    let ground = w.ty(w.function, &[integer_holder, string]);
    assert!(out.contains(&Constraint::subtype(ground, target)));
    assert!(out.contains(&Constraint::equality(integer_holder, integer_holder)));
}

#[test]
fn exact_method_ref_checks_signature_shape() {
    let mut w = World::new();
    let parse = w.table.add_method(crate::class_hierarchy::MethodSig {
        name: w.names.intern("parse"),
        owner: Some(w.integer),
        is_static: true,
        type_params: vec![],
        params: vec![w.types.class(w.string, &[])],
        ret: Some(w.types.class(w.integer, &[])),
        thrown: vec![],
    });
    let mref = w.exprs.alloc(ExprKind::MethodRef {
        decl: parse,
        receiver: None,
        exact: true,
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let string = w.ty(w.string, &[]);
    let integer = w.ty(w.integer, &[]);
    let target = w.ty(w.function, &[string, integer]);

    let ReductionResult::Many(out) =
        reduce_expression(&mut ctx, mref, target).expect("reducible")
    else {
        panic!("expected signature constraints");
    };
    assert!(out.contains(&Constraint::compatible(string, string)));
    assert!(out.contains(&Constraint::compatible(integer, integer)));
}

#[test]
fn unbound_method_ref_consumes_receiver_parameter() {
    let mut w = World::new();
    let length = w.table.add_method(crate::class_hierarchy::MethodSig {
        name: w.names.intern("length"),
        owner: Some(w.string),
        is_static: false,
        type_params: vec![],
        params: vec![],
        ret: Some(w.types.class(w.integer, &[])),
        thrown: vec![],
    });
    let mref = w.exprs.alloc(ExprKind::MethodRef {
        decl: length,
        receiver: None,
        exact: true,
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let string = w.ty(w.string, &[]);
    let integer = w.ty(w.integer, &[]);
    let target = w.ty(w.function, &[string, integer]);

    let ReductionResult::Many(out) =
        reduce_expression(&mut ctx, mref, target).expect("reducible")
    else {
        panic!("expected signature constraints");
    };
    // Receiver compatibility plus return compatibility.
    assert!(out.contains(&Constraint::compatible(string, string)));
    assert!(out.contains(&Constraint::compatible(integer, integer)));
}

#[test]
fn generic_method_ref_runs_nested_inference() {
    let mut w = World::new();
    let mref = w.exprs.alloc(ExprKind::MethodRef {
        decl: w.id_method,
        receiver: None,
        exact: false,
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let string = w.ty(w.string, &[]);
    let target = w.ty(w.function, &[string, string]);

    let ReductionResult::Bounds(bounds) =
        reduce_expression(&mut ctx, mref, target).expect("reducible")
    else {
        panic!("expected a nested bound set");
    };
    assert_eq!(bounds.vars.len(), 1);
    let v = *bounds.vars.first().expect("one variable");
    // String flowed through both the parameter and the return.
    assert!(ctx.vars.get(v).bounds(BoundKind::Lower).contains(&string));
}

#[test]
fn checked_exceptions_flow_into_throws_variables() {
    let mut w = World::new();
    let io = w.ty(w.io_exception, &[]);
    let lam = w.exprs.alloc(ExprKind::Lambda {
        param_types: None,
        param_count: 0,
        returns: vec![],
        thrown: vec![io],
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let x = ctx.new_var(w.call_x);
    let target = w.ty(w.action, &[w.types.use_of(x)]);

    let ReductionResult::Many(out) =
        reduce_checked_exception(&mut ctx, lam, target).expect("reducible")
    else {
        panic!("expected throws constraints");
    };
    assert_eq!(out, vec![Constraint::subtype(io, w.types.use_of(x))]);
    assert!(ctx.vars.get(x).has_throws_bound);
}

#[test]
fn unchecked_exceptions_are_always_allowed() {
    let mut w = World::new();
    let oracle = w.oracle();
    let rte = oracle.runtime_exception();
    drop(oracle);
    let lam = w.exprs.alloc(ExprKind::Lambda {
        param_types: None,
        param_count: 0,
        returns: vec![],
        thrown: vec![rte],
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let string = w.ty(w.string, &[]);
    let target = w.ty(w.supplier, &[string]);

    let ReductionResult::Many(out) =
        reduce_checked_exception(&mut ctx, lam, target).expect("reducible")
    else {
        panic!("expected empty constraint list");
    };
    assert!(out.is_empty());
}

#[test]
fn disallowed_checked_exception_falsifies() {
    let mut w = World::new();
    let io = w.ty(w.io_exception, &[]);
    let lam = w.exprs.alloc(ExprKind::Lambda {
        param_types: None,
        param_count: 0,
        returns: vec![],
        thrown: vec![io],
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let string = w.ty(w.string, &[]);
    let target = w.ty(w.supplier, &[string]);
    assert!(matches!(
        reduce_checked_exception(&mut ctx, lam, target).expect("reducible"),
        ReductionResult::False(_)
    ));
}

#[test]
fn additional_arguments_descend_into_lambda_bodies() {
    let mut w = World::new();
    let body = w.exprs.typed(TypeId::INT);
    let lam = w.exprs.alloc(ExprKind::Lambda {
        param_types: None,
        param_count: 1,
        returns: vec![body],
        thrown: vec![],
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let string = w.ty(w.string, &[]);
    let integer = w.ty(w.integer, &[]);
    let target = w.ty(w.function, &[string, integer]);

    let ReductionResult::Many(out) =
        reduce_additional_argument(&mut ctx, lam, target).expect("reducible")
    else {
        panic!("expected descent constraints");
    };
    assert_eq!(
        out,
        vec![Constraint::AdditionalArgument { expr: body, target: integer }]
    );
}

#[test]
fn nested_calls_merge_their_bounds() {
    let mut w = World::new();
    let five = w.exprs.typed(TypeId::INT);
    let call = w.exprs.alloc(ExprKind::Call {
        method: w.id_method,
        args: vec![five],
    });
    let oracle = w.oracle();
    let quals = w.lattice();
    let mut ctx = w.context(&oracle, &quals);
    let number = w.ty(w.number, &[]);

    let ReductionResult::Bounds(bounds) =
        reduce_expression(&mut ctx, call, number).expect("reducible")
    else {
        panic!("expected a nested bound set");
    };
    assert_eq!(bounds.vars.len(), 1);
    let v = *bounds.vars.first().expect("one variable");
    let integer = w.ty(w.integer, &[]);
    assert!(ctx.vars.get(v).bounds(BoundKind::Lower).contains(&integer));
    assert!(ctx.vars.get(v).bounds(BoundKind::Upper).contains(&number));
}
