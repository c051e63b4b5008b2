//! Argument expressions and expression-constraint reduction.
//!
//! Poly expressions (lambdas, method references, nested generic calls,
//! conditionals) cannot be typed bottom-up; their types flow down from the
//! invocation target. This module holds the expression arena plus the
//! reduction rules for the three expression-shaped constraints:
//!
//! - `Expression`: the expression must be compatible with a target type.
//!   For lambdas this derives the *ground target type* first (JLS 18.5.3),
//!   running a small nested inference when the target is
//!   wildcard-parameterized and the lambda has explicit parameter types.
//! - `CheckedException`: checked exceptions thrown by a lambda or method
//!   reference must be allowed by the target function type's throws clause;
//!   throws-clause inference variables pick up a throws bound here.
//! - `AdditionalArgument`: recursive descent into subexpressions that carry
//!   their own expression constraints (lambda bodies, conditional branches).
//!
//! Nested generic invocations reduce by running the invocation-applicability
//! stages of the inner call in the *same* variable store and handing the
//! resulting bound set back to the enclosing fixed point.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use tracing::trace;

use jinfer_common::limits::MAX_NESTED_INFERENCE_DEPTH;

use crate::bound_set::{BoundSet, reduce_and_incorporate};
use crate::bounds::BoundKind;
use crate::class_hierarchy::MethodId;
use crate::constraint::{Constraint, ConstraintSet, ReductionResult};
use crate::context::InferenceContext;
use crate::error::{FalseBound, InferenceError};
use crate::oracle::FunctionSig;
use crate::types::{AbstractType, TypeData, TypeId, TypeParamId, VarId};

/// An expression in the arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ExprId(pub u32);

/// The expression forms the engine distinguishes. Standalone expressions
/// collapse to [`ExprKind::Typed`]; only poly expressions keep structure.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ExprKind {
    /// A standalone expression whose type is already known.
    Typed(TypeId),
    Parenthesized(ExprId),
    Conditional { then: ExprId, els: ExprId },
    /// A switch expression used as a poly expression; one entry per result
    /// arm.
    Switch { arms: Vec<ExprId> },
    Lambda {
        /// Explicit parameter types, or `None` for an implicitly typed
        /// lambda.
        param_types: Option<Vec<TypeId>>,
        param_count: usize,
        /// The value-bearing result expressions of the body. Empty for a
        /// void-compatible body.
        returns: Vec<ExprId>,
        /// Checked exception types the body can throw.
        thrown: Vec<TypeId>,
    },
    MethodRef {
        decl: MethodId,
        /// Bound receiver type, or `None` for a static or unbound
        /// reference.
        receiver: Option<TypeId>,
        /// An exact method reference names a unique non-generic method;
        /// inexact references need the target to disambiguate.
        exact: bool,
    },
    /// A nested (possibly generic) method invocation.
    Call { method: MethodId, args: Vec<ExprId> },
}

/// Append-only arena of expressions for one batch of call sites. Built up
/// front, read-only during inference.
#[derive(Default, Debug)]
pub struct ExprArena {
    exprs: Vec<ExprKind>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(kind);
        id
    }

    pub fn typed(&mut self, ty: TypeId) -> ExprId {
        self.alloc(ExprKind::Typed(ty))
    }

    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

/// Whether `expr` is pertinent to applicability (JLS 15.12.2.2-style):
/// implicitly typed lambdas and inexact method references are skipped
/// during the applicability stage and handled only once a target is known.
pub fn pertinent_to_applicability(ctx: &InferenceContext<'_>, expr: ExprId) -> bool {
    match ctx.exprs.kind(expr) {
        ExprKind::Lambda {
            param_types: None, ..
        } => false,
        ExprKind::Lambda {
            param_types: Some(_),
            returns,
            ..
        } => returns
            .iter()
            .all(|&r| pertinent_to_applicability(ctx, r)),
        ExprKind::MethodRef { exact, .. } => *exact,
        ExprKind::Parenthesized(inner) => pertinent_to_applicability(ctx, *inner),
        ExprKind::Conditional { then, els } => {
            pertinent_to_applicability(ctx, *then) && pertinent_to_applicability(ctx, *els)
        }
        ExprKind::Switch { arms } => arms.iter().all(|&a| pertinent_to_applicability(ctx, a)),
        ExprKind::Typed(_) | ExprKind::Call { .. } => true,
    }
}

fn falsified(msg: String) -> ReductionResult {
    ReductionResult::False(FalseBound::new(msg))
}

/// Reduces `<expr -> target>`.
pub fn reduce_expression(
    ctx: &mut InferenceContext<'_>,
    expr: ExprId,
    target: TypeId,
) -> Result<ReductionResult, InferenceError> {
    let kind = ctx.exprs.kind(expr).clone();
    match kind {
        ExprKind::Typed(ty) => Ok(ReductionResult::One(Constraint::compatible(ty, target))),
        ExprKind::Parenthesized(inner) => Ok(ReductionResult::One(Constraint::Expression {
            expr: inner,
            target,
        })),
        ExprKind::Conditional { then, els } => Ok(ReductionResult::Many(vec![
            Constraint::Expression { expr: then, target },
            Constraint::Expression { expr: els, target },
        ])),
        ExprKind::Switch { arms } => Ok(ReductionResult::Many(
            arms.into_iter()
                .map(|arm| Constraint::Expression { expr: arm, target })
                .collect(),
        )),
        ExprKind::Call { method, args } => reduce_call(ctx, method, &args, target),
        ExprKind::Lambda {
            param_types,
            param_count,
            returns,
            thrown: _,
        } => reduce_lambda(ctx, target, param_types, param_count, &returns),
        ExprKind::MethodRef {
            decl,
            receiver,
            exact,
        } => reduce_method_ref(ctx, target, decl, receiver, exact),
    }
}

// ============================================================
// Nested invocations
// ============================================================

/// A nested generic invocation as an argument: run the inner call's
/// applicability and target stages in the shared variable store and merge
/// its bound set into the enclosing one.
fn reduce_call(
    ctx: &mut InferenceContext<'_>,
    method: MethodId,
    args: &[ExprId],
    target: TypeId,
) -> Result<ReductionResult, InferenceError> {
    if ctx.depth >= MAX_NESTED_INFERENCE_DEPTH {
        return Err(InferenceError::LimitExceeded {
            what: "nested inference depth",
        });
    }
    ctx.depth += 1;
    trace!(method = method.0, depth = ctx.depth, "nested invocation inference");
    let result: Result<BoundSet, InferenceError> = (|| {
        let (theta, mut bounds) = crate::infer::create_b2(ctx, method, args)?;
        crate::infer::create_b3(ctx, method, &theta, Some(target), &mut bounds)?;
        Ok(bounds)
    })();
    ctx.depth -= 1;
    Ok(ReductionResult::Bounds(result?))
}

// ============================================================
// Lambdas
// ============================================================

fn reduce_lambda(
    ctx: &mut InferenceContext<'_>,
    target: TypeId,
    param_types: Option<Vec<TypeId>>,
    param_count: usize,
    returns: &[ExprId],
) -> Result<ReductionResult, InferenceError> {
    let tgt = ctx.proper_view(target);
    let Some(sig) = ctx.oracle.function_type(tgt) else {
        return Ok(falsified(format!(
            "lambda target {} is not a functional interface",
            ctx.display_type(tgt)
        )));
    };
    if sig.params.len() != param_count {
        return Ok(falsified(format!(
            "lambda has {} parameters, target function type has {}",
            param_count,
            sig.params.len()
        )));
    }

    let ground = if ctx.interner.is_wildcard_parameterized(tgt) {
        match &param_types {
            Some(pt) => explicit_lambda_ground(ctx, tgt, pt)?,
            None => ctx.oracle.non_wildcard_parameterization(tgt),
        }
    } else {
        tgt
    };
    let Some(gsig) = ctx.oracle.function_type(ground) else {
        return Ok(falsified(format!(
            "ground target {} is not a functional interface",
            ctx.display_type(ground)
        )));
    };

    let mut out = Vec::new();
    if let Some(pt) = param_types {
        for (&given, &declared) in pt.iter().zip(gsig.params.iter()) {
            out.push(Constraint::equality(given, declared));
        }
    }
    match gsig.ret {
        Some(ret) => {
            for &r in returns {
                out.push(Constraint::Expression {
                    expr: r,
                    target: ret,
                });
            }
        }
        None => {
            if !returns.is_empty() {
                return Ok(falsified(format!(
                    "lambda body returns a value but {} is void",
                    ctx.display_type(ground)
                )));
            }
        }
    }
    if ground != tgt {
        out.push(Constraint::subtype(ground, target));
    }
    Ok(ReductionResult::Many(out))
}

/// Ground target type for an explicitly typed lambda against a
/// wildcard-parameterized functional interface (JLS 18.5.3): infer a
/// parameterization by equating the explicit parameter types with the
/// declared functional-method parameter types, then resolve; arguments the
/// mini-inference leaves open fall back to the non-wildcard rules.
fn explicit_lambda_ground(
    ctx: &mut InferenceContext<'_>,
    tgt: TypeId,
    param_types: &[TypeId],
) -> Result<TypeId, InferenceError> {
    let TypeData::Class { def, args } = ctx.interner.data(tgt) else {
        return Ok(ctx.oracle.non_wildcard_parameterization(tgt));
    };
    let class = ctx.table.class(def);
    let Some(fm) = class.functional_method else {
        return Ok(ctx.oracle.non_wildcard_parameterization(tgt));
    };
    let declared_params = ctx.table.method(fm).params.clone();
    if declared_params.len() != param_types.len() {
        return Ok(ctx.oracle.non_wildcard_parameterization(tgt));
    }
    let type_params = class.type_params.clone();

    let vars: Vec<VarId> = type_params.iter().map(|&p| ctx.new_var(p)).collect();
    let map: FxHashMap<TypeParamId, TypeId> = type_params
        .iter()
        .zip(vars.iter())
        .map(|(&p, &v)| (p, ctx.interner.use_of(v)))
        .collect();

    let mut set = ConstraintSet::new();
    for (&given, &declared) in param_types.iter().zip(declared_params.iter()) {
        set.push(Constraint::equality(given, ctx.theta_apply(declared, &map)));
    }
    let mut bounds = BoundSet::with_vars(vars.iter().copied());
    reduce_and_incorporate(ctx, &mut set, &mut bounds)?;

    // Only resolve variables that actually picked up bounds; the rest fall
    // back below.
    let bounded: IndexSet<VarId> = vars
        .iter()
        .copied()
        .filter(|&v| {
            let vb = ctx.vars.get(v);
            [BoundKind::Lower, BoundKind::Upper, BoundKind::Equal]
                .iter()
                .any(|&k| !vb.bounds(k).is_empty())
        })
        .collect();
    crate::resolve::resolve(ctx, &bounded, &mut bounds)?;

    let orig_args = ctx.interner.list(args);
    let mut new_args = Vec::with_capacity(orig_args.len());
    for ((&p, &v), &a) in type_params.iter().zip(vars.iter()).zip(orig_args.iter()) {
        if matches!(ctx.interner.data(a), TypeData::Wildcard { .. }) {
            match ctx.vars.get(v).instantiation {
                Some(inst) => new_args.push(inst),
                None => new_args.push(non_wildcard_arg(ctx, p, a)),
            }
        } else {
            new_args.push(a);
        }
    }
    Ok(ctx.interner.class(def, &new_args))
}

/// One wildcard argument under the non-wildcard parameterization rules.
fn non_wildcard_arg(ctx: &InferenceContext<'_>, p: TypeParamId, arg: TypeId) -> TypeId {
    let declared = ctx.oracle.declared_upper(p);
    match ctx.interner.data(arg) {
        TypeData::Wildcard {
            upper: Some(u),
            lower: None,
        } => ctx.oracle.glb(&[u, declared]).unwrap_or(u),
        TypeData::Wildcard {
            lower: Some(l),
            upper: None,
        } => l,
        _ => declared,
    }
}

// ============================================================
// Method references
// ============================================================

fn reduce_method_ref(
    ctx: &mut InferenceContext<'_>,
    target: TypeId,
    decl: MethodId,
    receiver: Option<TypeId>,
    exact: bool,
) -> Result<ReductionResult, InferenceError> {
    let tgt = ctx.proper_view(target);
    let Some(sig) = ctx.oracle.function_type(tgt) else {
        return Ok(falsified(format!(
            "method reference target {} is not a functional interface",
            ctx.display_type(tgt)
        )));
    };
    let method = ctx.table.method(decl).clone();

    // An unbound reference to an instance method consumes the first
    // function-type parameter as the receiver.
    let unbound = !method.is_static && receiver.is_none() && method.owner.is_some();
    let (recv_param, fn_params) = if unbound {
        if sig.params.is_empty() {
            return Ok(falsified(
                "unbound method reference needs a receiver parameter".to_string(),
            ));
        }
        (Some(sig.params[0]), &sig.params[1..])
    } else {
        (None, &sig.params[..])
    };
    if fn_params.len() != method.params.len() {
        return Ok(falsified(format!(
            "method reference arity mismatch: function type has {} parameters, method has {}",
            fn_params.len(),
            method.params.len()
        )));
    }

    if !method.type_params.is_empty() && !exact {
        return reduce_generic_method_ref(ctx, &sig, &method, recv_param, fn_params);
    }

    let mut out = Vec::new();
    if let (Some(recv), Some(owner)) = (recv_param, method.owner) {
        let owner_ty = if ctx.table.class(owner).type_params.is_empty() {
            ctx.interner.class(owner, &[])
        } else {
            ctx.interner.raw(owner)
        };
        out.push(Constraint::compatible(recv, owner_ty));
    }
    for (&f, &p) in fn_params.iter().zip(method.params.iter()) {
        out.push(Constraint::compatible(f, p));
    }
    if let Some(r) = sig.ret {
        let Some(mr) = method.ret else {
            return Ok(falsified(format!(
                "void method referenced where {} is expected",
                ctx.display_type(r)
            )));
        };
        // Inexact references to non-generic methods go through capture of
        // the declared return type.
        let ret = if exact || ctx.interner.mentions_vars(mr) {
            mr
        } else {
            ctx.oracle.capture(mr)
        };
        out.push(Constraint::compatible(ret, r));
    }
    Ok(ReductionResult::Many(out))
}

/// An inexact reference to a generic method: run a mini-inference for the
/// method's own type parameters against the function-type shape, merging
/// the bounds into the enclosing set.
fn reduce_generic_method_ref(
    ctx: &mut InferenceContext<'_>,
    sig: &FunctionSig,
    method: &crate::class_hierarchy::MethodSig,
    recv_param: Option<TypeId>,
    fn_params: &[TypeId],
) -> Result<ReductionResult, InferenceError> {
    let vars: Vec<VarId> = method
        .type_params
        .iter()
        .map(|&p| ctx.new_var(p))
        .collect();
    let map: FxHashMap<TypeParamId, TypeId> = method
        .type_params
        .iter()
        .zip(vars.iter())
        .map(|(&p, &v)| (p, ctx.interner.use_of(v)))
        .collect();
    for (&p, &v) in method.type_params.iter().zip(vars.iter()) {
        let upper = ctx.theta_apply(ctx.oracle.declared_upper(p), &map);
        ctx.add_bound(v, BoundKind::Upper, upper);
    }

    let mut set = ConstraintSet::new();
    if let (Some(recv), Some(owner)) = (recv_param, method.owner) {
        let owner_ty = if ctx.table.class(owner).type_params.is_empty() {
            ctx.interner.class(owner, &[])
        } else {
            ctx.interner.raw(owner)
        };
        set.push(Constraint::compatible(recv, owner_ty));
    }
    for (&f, &p) in fn_params.iter().zip(method.params.iter()) {
        set.push(Constraint::compatible(f, ctx.theta_apply(p, &map)));
    }
    if let Some(r) = sig.ret
        && let Some(mr) = method.ret
    {
        set.push(Constraint::compatible(ctx.theta_apply(mr, &map), r));
    }
    let mut bounds = BoundSet::with_vars(vars);
    reduce_and_incorporate(ctx, &mut set, &mut bounds)?;
    Ok(ReductionResult::Bounds(bounds))
}

// ============================================================
// Checked exceptions
// ============================================================

/// Reduces `<throws(expr) -> target>`: every checked exception the lambda
/// body or referenced method can throw must land inside the target function
/// type's throws clause. Throws-clause inference variables pick up lower
/// bounds plus the throws flag that biases their resolution toward
/// `RuntimeException`.
pub fn reduce_checked_exception(
    ctx: &mut InferenceContext<'_>,
    expr: ExprId,
    target: TypeId,
) -> Result<ReductionResult, InferenceError> {
    let kind = ctx.exprs.kind(expr).clone();
    let thrown: Vec<TypeId> = match kind {
        ExprKind::Lambda { thrown, .. } => thrown,
        ExprKind::MethodRef { decl, .. } => ctx.table.method(decl).thrown.clone(),
        ExprKind::Parenthesized(inner) => {
            return Ok(ReductionResult::One(Constraint::CheckedException {
                expr: inner,
                target,
            }));
        }
        ExprKind::Conditional { then, els } => {
            return Ok(ReductionResult::Many(vec![
                Constraint::CheckedException { expr: then, target },
                Constraint::CheckedException { expr: els, target },
            ]));
        }
        ExprKind::Switch { arms } => {
            return Ok(ReductionResult::Many(
                arms.into_iter()
                    .map(|arm| Constraint::CheckedException { expr: arm, target })
                    .collect(),
            ));
        }
        ExprKind::Typed(_) | ExprKind::Call { .. } => return Ok(ReductionResult::True),
    };
    if thrown.is_empty() {
        return Ok(ReductionResult::True);
    }

    let tgt = ctx.proper_view(target);
    let Some(sig) = ctx.oracle.function_type(tgt) else {
        return Ok(falsified(format!(
            "throws target {} is not a functional interface",
            ctx.display_type(tgt)
        )));
    };

    let mut proper_allowed = Vec::new();
    let mut var_allowed = Vec::new();
    for e in sig.thrown {
        match ctx.interner.classify(e) {
            AbstractType::Variable(v) => var_allowed.push(v),
            _ => proper_allowed.push(e),
        }
    }

    let runtime_exception = ctx.oracle.runtime_exception();
    let mut out = Vec::new();
    for x in thrown {
        if ctx.oracle.is_subtype(x, runtime_exception) {
            continue;
        }
        if proper_allowed.iter().any(|&e| ctx.oracle.is_subtype(x, e)) {
            continue;
        }
        if var_allowed.is_empty() {
            return Ok(falsified(format!(
                "checked exception {} is not allowed by the target throws clause",
                ctx.display_type(x)
            )));
        }
        for &v in &var_allowed {
            out.push(Constraint::subtype(x, ctx.interner.use_of(v)));
        }
    }
    for &v in &var_allowed {
        ctx.vars.get_mut(v).has_throws_bound = true;
    }
    Ok(ReductionResult::Many(out))
}

// ============================================================
// Additional-argument descent
// ============================================================

/// Reduces `<args(expr) -> target>`: descend into subexpressions whose own
/// expression constraints only became reducible once the enclosing target
/// was known (lambda bodies, conditional branches).
pub fn reduce_additional_argument(
    ctx: &mut InferenceContext<'_>,
    expr: ExprId,
    target: TypeId,
) -> Result<ReductionResult, InferenceError> {
    let kind = ctx.exprs.kind(expr).clone();
    match kind {
        ExprKind::Parenthesized(inner) => Ok(ReductionResult::One(
            Constraint::AdditionalArgument {
                expr: inner,
                target,
            },
        )),
        ExprKind::Conditional { then, els } => Ok(ReductionResult::Many(vec![
            Constraint::AdditionalArgument { expr: then, target },
            Constraint::AdditionalArgument { expr: els, target },
        ])),
        ExprKind::Switch { arms } => Ok(ReductionResult::Many(
            arms.into_iter()
                .map(|arm| Constraint::AdditionalArgument { expr: arm, target })
                .collect(),
        )),
        ExprKind::Lambda { returns, .. } => {
            if returns.is_empty() {
                return Ok(ReductionResult::True);
            }
            let tgt = ctx.proper_view(target);
            let Some(sig) = ctx.oracle.function_type(tgt) else {
                return Ok(ReductionResult::True);
            };
            let Some(ret) = sig.ret else {
                return Ok(ReductionResult::True);
            };
            Ok(ReductionResult::Many(
                returns
                    .into_iter()
                    .map(|r| Constraint::AdditionalArgument {
                        expr: r,
                        target: ret,
                    })
                    .collect(),
            ))
        }
        // Nested calls registered their own argument constraints when their
        // Expression constraint reduced; typed expressions and method
        // references carry no subexpressions.
        ExprKind::Typed(_) | ExprKind::MethodRef { .. } | ExprKind::Call { .. } => {
            Ok(ReductionResult::True)
        }
    }
}

#[cfg(test)]
#[path = "../tests/expression_tests.rs"]
mod tests;
