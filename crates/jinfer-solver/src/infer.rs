//! Invocation type inference: the staged driver.
//!
//! One call site flows through four stages, each building on the last:
//!
//! - **B2** (applicability): mint an inference variable per method type
//!   parameter, seed the declared upper bounds, and reduce compatibility
//!   constraints for the arguments pertinent to applicability.
//! - **B3** (target): relate the substituted return type to the call's
//!   target type, with the unchecked-conversion and wildcard-capture
//!   special cases.
//! - **C**: the deferred constraints for the remaining arguments (implicit
//!   lambdas, inexact method references, checked exceptions, subexpression
//!   descent).
//! - **B4**: repeatedly pick the subset of C whose input variables are
//!   unblocked, resolve those inputs, and reduce the subset; then resolve
//!   everything that remains.
//!
//! Nested generic invocations re-enter at B2/B3 through `expression.rs`,
//! sharing the enclosing variable store so their bounds merge naturally.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::bound_set::{BoundSet, reduce_and_incorporate};
use crate::bounds::BoundKind;
use crate::class_hierarchy::MethodId;
use crate::constraint::{Constraint, ConstraintSet};
use crate::context::InferenceContext;
use crate::dependencies::Dependencies;
use crate::error::{FalseBound, InferenceError};
use crate::expression::{ExprId, ExprKind, pertinent_to_applicability};
use crate::resolve::{resolve, resolve_qualifiers, resolve_with_deferred};
use crate::types::{TypeData, TypeId, TypeParamId, VarId};

/// Map from a method's type parameters to the inference variables minted
/// for them, in declaration order.
pub type Theta = IndexMap<TypeParamId, VarId>;

/// One generic method invocation to infer.
#[derive(Clone, Debug)]
pub struct CallSite {
    pub method: MethodId,
    pub args: Vec<ExprId>,
    /// The assignment/invocation target type, or `None` for a statement
    /// context.
    pub target: Option<TypeId>,
}

/// A successful inference: one proper instantiation per method type
/// parameter, plus the advisory flags.
#[derive(Clone, Debug)]
pub struct InferenceResult {
    pub instantiations: IndexMap<TypeParamId, TypeId>,
    /// The call needs an unchecked (raw-type) conversion; warn.
    pub unchecked_conversion: bool,
    /// A qualifier mismatch was tolerated; the host checker decides
    /// severity.
    pub annotation_mismatch: bool,
}

/// Runs the full pipeline for one call site.
pub fn infer_invocation(
    ctx: &mut InferenceContext<'_>,
    call: &CallSite,
) -> Result<InferenceResult, InferenceError> {
    let (theta, mut bounds) = create_b2(ctx, call.method, &call.args)?;
    create_b3(ctx, call.method, &theta, call.target, &mut bounds)?;
    let deferred = create_c(ctx, call.method, &theta, &call.args);
    get_b4(ctx, deferred, &mut bounds)?;

    let vars = bounds.vars.clone();
    resolve(ctx, &vars, &mut bounds)?;
    resolve_qualifiers(ctx, &mut bounds);

    let mut instantiations = IndexMap::new();
    for (&p, &v) in &theta {
        let inst = ctx.vars.get(v).instantiation.ok_or_else(|| {
            InferenceError::from(FalseBound::new(format!(
                "no instantiation found for {}",
                ctx.names.resolve(ctx.table.param(p).name)
            )))
        })?;
        instantiations.insert(p, inst);
    }
    debug!(
        method = call.method.0,
        unchecked = bounds.unchecked_conversion,
        anno_fail = bounds.anno_fail,
        "inference succeeded"
    );
    Ok(InferenceResult {
        instantiations,
        unchecked_conversion: bounds.unchecked_conversion,
        annotation_mismatch: bounds.anno_fail,
    })
}

fn theta_map(ctx: &InferenceContext<'_>, theta: &Theta) -> FxHashMap<TypeParamId, TypeId> {
    theta
        .iter()
        .map(|(&p, &v)| (p, ctx.interner.use_of(v)))
        .collect()
}

/// Stage B2: variables, declared bounds, throws flags, and the pertinent
/// argument constraints.
pub(crate) fn create_b2(
    ctx: &mut InferenceContext<'_>,
    method: MethodId,
    args: &[ExprId],
) -> Result<(Theta, BoundSet), InferenceError> {
    let sig = ctx.table.method(method).clone();
    if args.len() != sig.params.len() {
        return Err(InferenceError::ArityMismatch {
            expected: sig.params.len(),
            found: args.len(),
        });
    }

    let mut theta: Theta = IndexMap::new();
    for &p in &sig.type_params {
        let v = ctx.new_var(p);
        theta.insert(p, v);
    }
    let map = theta_map(ctx, &theta);

    // Declared upper bounds, substituted so mutually recursive parameters
    // (`<T extends Comparable<T>>`) bound each other's variables.
    for (&p, &v) in &theta {
        let upper = ctx.theta_apply(ctx.oracle.declared_upper(p), &map);
        ctx.add_bound(v, BoundKind::Upper, upper);
    }

    // A type parameter named in the throws clause resolves preferentially
    // to RuntimeException when nothing constrains it harder.
    for &thrown in &sig.thrown {
        if let TypeData::TypeVar(p) = ctx.interner.data(thrown)
            && let Some(&v) = theta.get(&p)
        {
            ctx.vars.get_mut(v).has_throws_bound = true;
        }
    }

    let mut set = ConstraintSet::new();
    for (&arg, &param) in args.iter().zip(sig.params.iter()) {
        if pertinent_to_applicability(ctx, arg) {
            set.push(Constraint::Expression {
                expr: arg,
                target: ctx.theta_apply(param, &map),
            });
        }
    }

    let mut bounds = BoundSet::with_vars(theta.values().copied());
    reduce_and_incorporate(ctx, &mut set, &mut bounds)?;
    Ok((theta, bounds))
}

/// Stage B3: the return/target constraint.
pub(crate) fn create_b3(
    ctx: &mut InferenceContext<'_>,
    method: MethodId,
    theta: &Theta,
    target: Option<TypeId>,
    bounds: &mut BoundSet,
) -> Result<(), InferenceError> {
    let sig = ctx.table.method(method).clone();
    let (Some(ret), Some(target)) = (sig.ret, target) else {
        return Ok(());
    };
    let map = theta_map(ctx, theta);
    let r = ctx.theta_apply(ret, &map);

    let constraint = if bounds.unchecked_conversion {
        // Applicability needed an unchecked conversion; the call's return
        // type is the erasure of the declared one.
        Constraint::compatible(ctx.oracle.erasure(ret), target)
    } else if !ctx.interner.mentions_vars(r) && ctx.interner.is_wildcard_parameterized(r) {
        Constraint::compatible(ctx.oracle.capture(r), target)
    } else {
        Constraint::compatible(r, target)
    };

    let mut set = ConstraintSet::of([constraint]);
    reduce_and_incorporate(ctx, &mut set, bounds)
}

/// Stage C: deferred constraints for arguments not pertinent to
/// applicability, plus checked-exception and subexpression-descent
/// constraints for the argument shapes that carry them.
pub(crate) fn create_c(
    ctx: &InferenceContext<'_>,
    method: MethodId,
    theta: &Theta,
    args: &[ExprId],
) -> ConstraintSet {
    let sig = ctx.table.method(method);
    let map = theta_map(ctx, theta);
    let mut set = ConstraintSet::new();
    for (&arg, &param) in args.iter().zip(sig.params.iter()) {
        let target = ctx.theta_apply(param, &map);
        if !pertinent_to_applicability(ctx, arg) {
            set.push(Constraint::Expression { expr: arg, target });
        }
        if throws_shaped(ctx, arg) {
            set.push(Constraint::CheckedException { expr: arg, target });
        }
        if has_subexpressions(ctx, arg) {
            set.push(Constraint::AdditionalArgument { expr: arg, target });
        }
    }
    set
}

fn throws_shaped(ctx: &InferenceContext<'_>, expr: ExprId) -> bool {
    match ctx.exprs.kind(expr) {
        ExprKind::Lambda { .. } | ExprKind::MethodRef { .. } => true,
        ExprKind::Parenthesized(inner) => throws_shaped(ctx, *inner),
        ExprKind::Conditional { then, els } => {
            throws_shaped(ctx, *then) || throws_shaped(ctx, *els)
        }
        ExprKind::Switch { arms } => arms.iter().any(|&a| throws_shaped(ctx, a)),
        ExprKind::Typed(_) | ExprKind::Call { .. } => false,
    }
}

fn has_subexpressions(ctx: &InferenceContext<'_>, expr: ExprId) -> bool {
    match ctx.exprs.kind(expr) {
        ExprKind::Lambda { returns, .. } => !returns.is_empty(),
        ExprKind::Parenthesized(inner) => has_subexpressions(ctx, *inner),
        ExprKind::Conditional { .. } | ExprKind::Switch { .. } => true,
        ExprKind::Typed(_) | ExprKind::MethodRef { .. } | ExprKind::Call { .. } => false,
    }
}

/// Stage B4: drain the deferred constraints in dependency order, resolving
/// the input variables of each reducible subset first.
pub(crate) fn get_b4(
    ctx: &mut InferenceContext<'_>,
    mut deferred: ConstraintSet,
    bounds: &mut BoundSet,
) -> Result<(), InferenceError> {
    while !deferred.is_empty() {
        let deps = Dependencies::build(ctx, &bounds.vars, &deferred);
        let subset = deferred.closed_subset(ctx, &deps);

        // An input variable can only be instantiated together with the
        // variables its bounds mention, so widen the set to the full
        // dependency closure before resolving.
        let mut inputs: IndexSet<VarId> = IndexSet::new();
        for c in &subset {
            for v in c.input_vars(ctx) {
                if bounds.vars.contains(&v) {
                    inputs.extend(deps.dependencies_of(v));
                }
            }
        }
        if !inputs.is_empty() {
            resolve_with_deferred(ctx, &inputs, &deferred, bounds)?;
        }

        for c in subset {
            deferred.remove(&c);
            let mut set = ConstraintSet::of([c]);
            reduce_and_incorporate(ctx, &mut set, bounds)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/infer_tests.rs"]
mod tests;
