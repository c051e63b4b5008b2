//! Resolution: choosing instantiations for inference variables.
//!
//! Variables are resolved group by group in dependency order (smallest
//! group first). Within a group the instantiation precedence is:
//!
//! 1. a proper equality bound wins outright;
//! 2. proper lower bounds -> their least upper bound;
//! 3. a throws-bounded variable whose proper upper bounds all admit
//!    `RuntimeException` resolves to `RuntimeException`;
//! 4. proper upper bounds -> their greatest lower bound (no glb is a
//!    failure, e.g. two unrelated final classes);
//! 5. no bounds at all -> `Object`.
//!
//! Each instantiation is incorporated immediately; if that falsifies, the
//! whole group's bounds are rolled back and retried once with fresh type
//! variables standing in for the chosen instantiations. A second failure
//! fails the inference.

use indexmap::IndexSet;
use tracing::{debug, trace};

use jinfer_common::limits::MAX_RESOLUTION_PASSES;

use crate::bound_set::BoundSet;
use crate::bounds::BoundKind;
use crate::constraint::ConstraintSet;
use crate::context::InferenceContext;
use crate::dependencies::Dependencies;
use crate::error::{FalseBound, InferenceError};
use crate::types::VarId;

/// Resolves every variable in `vars`, folding advisory flags into `bounds`.
pub fn resolve(
    ctx: &mut InferenceContext<'_>,
    vars: &IndexSet<VarId>,
    bounds: &mut BoundSet,
) -> Result<(), InferenceError> {
    resolve_with_deferred(ctx, vars, &ConstraintSet::new(), bounds)
}

/// Like [`resolve`], but dependency edges also account for still-deferred
/// expression constraints.
pub fn resolve_with_deferred(
    ctx: &mut InferenceContext<'_>,
    vars: &IndexSet<VarId>,
    deferred: &ConstraintSet,
    bounds: &mut BoundSet,
) -> Result<(), InferenceError> {
    let mut passes: u32 = 0;
    loop {
        let unresolved: Vec<VarId> = vars
            .iter()
            .copied()
            .filter(|&v| ctx.vars.get(v).instantiation.is_none())
            .collect();
        if unresolved.is_empty() {
            return Ok(());
        }
        passes += 1;
        if passes > MAX_RESOLUTION_PASSES {
            return Err(InferenceError::LimitExceeded {
                what: "resolution passes",
            });
        }
        let deps = Dependencies::build(ctx, vars, deferred);
        let Some(group) = deps.smallest_group(unresolved.iter().copied()) else {
            return Ok(());
        };
        trace!(group = ?group, pass = passes, "resolving dependency group");
        resolve_group(ctx, vars, &group, bounds)?;
    }
}

/// Resolves one dependency group: a plain attempt, and on falsification a
/// rollback plus a single fresh-variable retry.
fn resolve_group(
    ctx: &mut InferenceContext<'_>,
    all: &IndexSet<VarId>,
    group: &IndexSet<VarId>,
    bounds: &mut BoundSet,
) -> Result<(), InferenceError> {
    ctx.vars.save_all(all.iter().copied());

    match attempt_group(ctx, group, bounds, false) {
        Ok(()) => Ok(()),
        Err(first) => {
            debug!(error = %first, "plain resolution failed, retrying with fresh variables");
            ctx.vars.restore_all(all.iter().copied());
            match attempt_group(ctx, group, bounds, true) {
                Ok(()) => Ok(()),
                Err(_) => Err(first),
            }
        }
    }
}

fn attempt_group(
    ctx: &mut InferenceContext<'_>,
    group: &IndexSet<VarId>,
    bounds: &mut BoundSet,
    fresh: bool,
) -> Result<(), InferenceError> {
    for &v in group {
        if ctx.vars.get(v).instantiation.is_some() {
            continue;
        }
        let inst = if fresh {
            instantiate_fresh(ctx, v)?
        } else {
            instantiate_plain(ctx, v)?
        };
        trace!(var = v.0, inst = %ctx.display_type(inst), fresh, "instantiating");
        ctx.vars.get_mut(v).instantiation = Some(inst);
        check_type_var_qualifiers(ctx, v, bounds);
    }

    // Proper bounds were checked against each other when they were added;
    // what remains unverified are the bounds that still mentioned
    // variables. Re-check those against the chosen instantiations.
    let mut set = ConstraintSet::new();
    for &v in group {
        let Some(inst) = ctx.vars.get(v).instantiation else {
            continue;
        };
        for kind in [BoundKind::Lower, BoundKind::Upper, BoundKind::Equal] {
            let checks: Vec<crate::types::TypeId> = ctx
                .vars
                .get(v)
                .bounds(kind)
                .iter()
                .copied()
                .filter(|&b| ctx.interner.mentions_vars(b))
                .map(|b| ctx.apply_instantiations(b))
                .collect();
            for b in checks {
                set.push(match kind {
                    BoundKind::Lower => crate::constraint::Constraint::subtype(b, inst),
                    BoundKind::Upper => crate::constraint::Constraint::subtype(inst, b),
                    BoundKind::Equal => crate::constraint::Constraint::equality(inst, b),
                });
            }
        }
    }
    crate::bound_set::reduce_and_incorporate(ctx, &mut set, bounds)
}

/// Instantiation by the bound-precedence rules.
fn instantiate_plain(
    ctx: &mut InferenceContext<'_>,
    v: VarId,
) -> Result<crate::types::TypeId, InferenceError> {
    if let Some(&eq) = ctx.proper_bounds(v, BoundKind::Equal).first() {
        return Ok(ctx.oracle.box_primitive(eq));
    }
    let lowers = ctx.proper_bounds(v, BoundKind::Lower);
    if !lowers.is_empty() {
        let boxed: Vec<_> = lowers.iter().map(|&l| ctx.oracle.box_primitive(l)).collect();
        return Ok(ctx.oracle.lub(&boxed));
    }
    let uppers = ctx.proper_bounds(v, BoundKind::Upper);
    if ctx.vars.get(v).has_throws_bound {
        let rte = ctx.oracle.runtime_exception();
        if uppers.iter().all(|&u| ctx.oracle.is_subtype(rte, u)) {
            return Ok(rte);
        }
    }
    if !uppers.is_empty() {
        return ctx.oracle.glb(&uppers).ok_or_else(|| {
            let rendered: Vec<String> =
                uppers.iter().map(|&u| ctx.display_type(u)).collect();
            FalseBound::new(format!(
                "upper bounds have no greatest lower bound: {}",
                rendered.join(", ")
            ))
            .into()
        });
    }
    Ok(ctx.oracle.object())
}

/// Fallback instantiation: a fresh type variable bounded by the glb of the
/// proper upper bounds and the lub of the proper lower bounds.
fn instantiate_fresh(
    ctx: &mut InferenceContext<'_>,
    v: VarId,
) -> Result<crate::types::TypeId, InferenceError> {
    let lowers = ctx.proper_bounds(v, BoundKind::Lower);
    let lower = if lowers.is_empty() {
        None
    } else {
        Some(ctx.oracle.lub(&lowers))
    };
    let uppers = ctx.proper_bounds(v, BoundKind::Upper);
    let upper = if uppers.is_empty() {
        ctx.oracle.object()
    } else {
        ctx.oracle.glb(&uppers).ok_or_else(|| {
            InferenceError::from(FalseBound::new(
                "upper bounds have no greatest lower bound".to_string(),
            ))
        })?
    };
    Ok(ctx.interner.fresh(upper, lower))
}

/// Checks the qualifier bounds accumulated on a type variable against each
/// other once it is instantiated; a violated upper bound is advisory.
fn check_type_var_qualifiers(ctx: &InferenceContext<'_>, v: VarId, bounds: &mut BoundSet) {
    let vb = ctx.vars.get(v);
    let concrete = |kind: BoundKind| -> Vec<crate::qualifiers::Qualifier> {
        vb.qual_bounds(kind)
            .iter()
            .filter_map(|q| match q {
                crate::qualifiers::AbstractQualifier::Concrete(c) => Some(*c),
                crate::qualifiers::AbstractQualifier::Variable(_) => None,
            })
            .collect()
    };
    let lowers = concrete(BoundKind::Lower);
    let uppers = concrete(BoundKind::Upper);
    let equals = concrete(BoundKind::Equal);
    let chosen = if let Some(&q) = equals.first() {
        q
    } else if !lowers.is_empty() {
        ctx.quals.lub(&lowers)
    } else if !uppers.is_empty() {
        ctx.quals.glb(&uppers)
    } else {
        return;
    };
    if uppers.iter().any(|&u| !ctx.quals.is_subqualifier(chosen, u)) {
        bounds.anno_fail = true;
    }
}

/// Resolves every qualifier variable: lub of the concrete lower bounds,
/// else glb of the concrete uppers, else the lattice top. Violated upper
/// bounds are advisory.
pub fn resolve_qualifiers(ctx: &mut InferenceContext<'_>, bounds: &mut BoundSet) {
    let ids: Vec<_> = ctx.qual_vars.ids().collect();
    for id in ids {
        let qv = ctx.qual_vars.get(id);
        if qv.instantiation.is_some() {
            continue;
        }
        let lowers = qv.concrete_bounds(BoundKind::Lower);
        let uppers = qv.concrete_bounds(BoundKind::Upper);
        let equals = qv.concrete_bounds(BoundKind::Equal);
        let chosen = if let Some(&q) = equals.first() {
            q
        } else if !lowers.is_empty() {
            ctx.quals.lub(&lowers)
        } else if !uppers.is_empty() {
            ctx.quals.glb(&uppers)
        } else {
            ctx.quals.top()
        };
        if uppers.iter().any(|&u| !ctx.quals.is_subqualifier(chosen, u)) {
            bounds.anno_fail = true;
        }
        trace!(var = id.0, qual = %ctx.display_qual(crate::qualifiers::AbstractQualifier::Concrete(chosen)), "instantiating qualifier variable");
        ctx.qual_vars.get_mut(id).instantiation = Some(chosen);
    }
}

#[cfg(test)]
#[path = "../tests/resolution_tests.rs"]
mod tests;
