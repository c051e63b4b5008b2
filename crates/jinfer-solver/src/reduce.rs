//! Constraint reduction rules for `Typing` and `QualifierTyping`.
//!
//! Reduction is a pure function of the two operands' shapes. The dispatch
//! order is always the same:
//! 1. both sides proper -> ask the oracle, done;
//! 2. either side a variable -> record a bound and return true (the real
//!    checking happens during incorporation and resolution);
//! 3. otherwise recurse structurally on the target's shape.
//!
//! Expression-shaped constraints are reduced in `expression.rs`; this file
//! routes them there from [`reduce_constraint`].

use rustc_hash::FxHashMap;

use crate::constraint::{Constraint, QualKind, ReductionResult, TypingKind};
use crate::context::InferenceContext;
use crate::error::{FalseBound, InferenceError};
use crate::expression;
use crate::qualifiers::AbstractQualifier;
use crate::types::{AbstractType, ClassId, TypeData, TypeId, TypeParamId};

/// Reduces one constraint of any kind.
pub fn reduce_constraint(
    ctx: &mut InferenceContext<'_>,
    c: &Constraint,
) -> Result<ReductionResult, InferenceError> {
    match c {
        Constraint::Typing {
            s,
            t,
            kind,
            covariant_arg,
        } => Ok(match kind {
            TypingKind::Subtype => reduce_subtype(ctx, *s, *t),
            TypingKind::Contained => reduce_contained(ctx, *s, *t, *covariant_arg),
            TypingKind::Equality => reduce_equality(ctx, *s, *t),
            TypingKind::Compatibility => reduce_compatibility(ctx, *s, *t),
        }),
        Constraint::QualifierTyping { s, t, kind } => Ok(reduce_qualifier(ctx, *s, *t, *kind)),
        Constraint::Expression { expr, target } => expression::reduce_expression(ctx, *expr, *target),
        Constraint::CheckedException { expr, target } => {
            expression::reduce_checked_exception(ctx, *expr, *target)
        }
        Constraint::AdditionalArgument { expr, target } => {
            expression::reduce_additional_argument(ctx, *expr, *target)
        }
    }
}

fn falsified(ctx: &InferenceContext<'_>, s: TypeId, op: &str, t: TypeId) -> ReductionResult {
    ReductionResult::False(FalseBound::new(format!(
        "{} {} {}",
        ctx.display_type(s),
        op,
        ctx.display_type(t)
    )))
}

/// `S <: T` (JLS 18.2.3-style).
pub fn reduce_subtype(ctx: &mut InferenceContext<'_>, s: TypeId, t: TypeId) -> ReductionResult {
    let cs = ctx.interner.classify(s);
    let ct = ctx.interner.classify(t);

    if let (AbstractType::Proper(_), AbstractType::Proper(_)) = (cs, ct) {
        return if ctx.oracle.is_subtype(s, t) {
            ReductionResult::True
        } else if ctx.oracle.is_subtype_unchecked(s, t) {
            ReductionResult::UncheckedConversion
        } else {
            falsified(ctx, s, "<:", t)
        };
    }

    // The null type is below every reference type; against a variable it
    // additionally pushes the bottom qualifier as a lower qualifier bound.
    if ctx.interner.data(s) == TypeData::Null {
        if let AbstractType::Variable(v) = ct {
            let bottom = AbstractQualifier::Concrete(ctx.quals.bottom());
            ctx.add_type_var_qual_bound(v, crate::bounds::BoundKind::Lower, bottom);
        }
        return ReductionResult::True;
    }
    if ctx.interner.data(t) == TypeData::Null {
        return falsified(ctx, s, "<:", t);
    }

    match (cs, ct) {
        (AbstractType::Variable(v), AbstractType::Variable(w)) => {
            ctx.add_bound(v, crate::bounds::BoundKind::Upper, t);
            ctx.add_bound(w, crate::bounds::BoundKind::Lower, s);
            ReductionResult::True
        }
        (AbstractType::Variable(v), _) => {
            ctx.add_bound(v, crate::bounds::BoundKind::Upper, t);
            ReductionResult::True
        }
        (_, AbstractType::Variable(w)) => {
            ctx.add_bound(w, crate::bounds::BoundKind::Lower, s);
            ReductionResult::True
        }
        _ => reduce_subtype_shapes(ctx, s, t),
    }
}

/// Subtyping once neither side is a bare variable: dispatch on the target's
/// structural form.
fn reduce_subtype_shapes(ctx: &mut InferenceContext<'_>, s: TypeId, t: TypeId) -> ReductionResult {
    match ctx.interner.data(t) {
        TypeData::Class { def, args } => {
            let Some(mut sup) = super_shape(ctx, s, def) else {
                return falsified(ctx, s, "<:", t);
            };
            if matches!(ctx.interner.data(sup), TypeData::Raw(_)) {
                return ReductionResult::UncheckedConversion;
            }
            let want = ctx.interner.list(args);
            if want.is_empty() {
                return ReductionResult::True;
            }
            // Wildcards in a proper source are captured before pairing
            // type arguments.
            if !ctx.interner.mentions_vars(sup) && ctx.interner.is_wildcard_parameterized(sup) {
                sup = ctx.oracle.capture(sup);
            }
            let TypeData::Class { args: sup_args, .. } = ctx.interner.data(sup) else {
                return falsified(ctx, s, "<:", t);
            };
            let have = ctx.interner.list(sup_args);
            if have.len() != want.len() {
                return falsified(ctx, s, "<:", t);
            }
            let cd = ctx.table.class(def);
            let out: Vec<Constraint> = have
                .iter()
                .zip(want.iter())
                .enumerate()
                .map(|(i, (&h, &w))| {
                    let covariant = cd
                        .type_params
                        .get(i)
                        .is_some_and(|p| cd.covariant_params.contains(p));
                    Constraint::contained(h, w, covariant)
                })
                .collect();
            ReductionResult::Many(out)
        }
        TypeData::Raw(def) => {
            if super_shape(ctx, s, def).is_some() {
                ReductionResult::True
            } else {
                falsified(ctx, s, "<:", t)
            }
        }
        TypeData::Array(t_comp) => {
            let Some(s_comp) = array_component(ctx, s) else {
                return falsified(ctx, s, "<:", t);
            };
            let s_prim = matches!(ctx.interner.data(s_comp), TypeData::Primitive(_));
            let t_prim = matches!(ctx.interner.data(t_comp), TypeData::Primitive(_));
            if s_prim || t_prim {
                if s_comp == t_comp {
                    ReductionResult::True
                } else {
                    falsified(ctx, s, "<:", t)
                }
            } else {
                ReductionResult::One(Constraint::subtype(s_comp, t_comp))
            }
        }
        TypeData::TypeVar(_) => {
            // Only an intersection explicitly listing the variable can be
            // below a declared type variable.
            if intersection_contains(ctx, s, t) {
                ReductionResult::True
            } else {
                falsified(ctx, s, "<:", t)
            }
        }
        TypeData::Fresh { lower, .. } => {
            if intersection_contains(ctx, s, t) {
                ReductionResult::True
            } else if let Some(l) = lower {
                ReductionResult::One(Constraint::subtype(s, l))
            } else {
                falsified(ctx, s, "<:", t)
            }
        }
        TypeData::Intersection(list) => {
            let out: Vec<Constraint> = ctx
                .interner
                .list(list)
                .iter()
                .map(|&m| Constraint::subtype(s, m))
                .collect();
            ReductionResult::Many(out)
        }
        _ => falsified(ctx, s, "<:", t),
    }
}

/// Containment of type argument `s` in type-argument position `t`
/// (JLS 18.2.3's `<S <= T>`).
pub fn reduce_contained(
    ctx: &mut InferenceContext<'_>,
    s: TypeId,
    t: TypeId,
    covariant_arg: bool,
) -> ReductionResult {
    match ctx.interner.data(t) {
        TypeData::Wildcard {
            upper: None,
            lower: None,
        } => ReductionResult::True,
        TypeData::Wildcard {
            upper: Some(u),
            lower: None,
        } => match ctx.interner.data(s) {
            TypeData::Wildcard {
                upper: s_upper,
                lower: None,
            } => {
                let s_upper = s_upper.unwrap_or_else(|| ctx.oracle.object());
                ReductionResult::One(Constraint::subtype(s_upper, u))
            }
            TypeData::Wildcard { lower: Some(_), .. } => {
                ReductionResult::One(Constraint::equality(ctx.oracle.object(), u))
            }
            _ => ReductionResult::One(Constraint::subtype(s, u)),
        },
        TypeData::Wildcard {
            lower: Some(l),
            upper: None,
        } => match ctx.interner.data(s) {
            TypeData::Wildcard {
                lower: Some(sl), ..
            } => ReductionResult::One(Constraint::subtype(l, sl)),
            TypeData::Wildcard { .. } => falsified(ctx, s, "<=", t),
            _ => ReductionResult::One(Constraint::subtype(l, s)),
        },
        _ => {
            // Target is a concrete type argument.
            if matches!(ctx.interner.data(s), TypeData::Wildcard { .. }) {
                falsified(ctx, s, "<=", t)
            } else if covariant_arg {
                ReductionResult::One(Constraint::subtype(s, t))
            } else {
                ReductionResult::One(Constraint::equality(s, t))
            }
        }
    }
}

/// `S = T` (JLS 18.2.4-style).
pub fn reduce_equality(ctx: &mut InferenceContext<'_>, s: TypeId, t: TypeId) -> ReductionResult {
    if s == t {
        return ReductionResult::True;
    }
    let cs = ctx.interner.classify(s);
    let ct = ctx.interner.classify(t);
    if let (AbstractType::Proper(_), AbstractType::Proper(_)) = (cs, ct) {
        return if ctx.oracle.is_same(s, t) {
            ReductionResult::True
        } else {
            falsified(ctx, s, "=", t)
        };
    }
    // Null and primitives can never equal a type that still mentions
    // variables structurally different from them.
    for (side, other) in [(s, ct), (t, cs)] {
        if matches!(
            ctx.interner.data(side),
            TypeData::Null | TypeData::Primitive(_)
        ) && !matches!(other, AbstractType::Proper(_))
        {
            return falsified(ctx, s, "=", t);
        }
    }
    match (cs, ct) {
        (AbstractType::Variable(v), AbstractType::Variable(w)) => {
            ctx.add_bound(v, crate::bounds::BoundKind::Equal, t);
            ctx.add_bound(w, crate::bounds::BoundKind::Equal, s);
            ReductionResult::True
        }
        (AbstractType::Variable(v), _) => {
            ctx.add_bound(v, crate::bounds::BoundKind::Equal, t);
            ReductionResult::True
        }
        (_, AbstractType::Variable(w)) => {
            ctx.add_bound(w, crate::bounds::BoundKind::Equal, s);
            ReductionResult::True
        }
        _ => reduce_equality_shapes(ctx, s, t),
    }
}

fn reduce_equality_shapes(ctx: &mut InferenceContext<'_>, s: TypeId, t: TypeId) -> ReductionResult {
    match (ctx.interner.data(s), ctx.interner.data(t)) {
        (
            TypeData::Class { def: ds, args: ls },
            TypeData::Class { def: dt, args: lt },
        ) => {
            if ds != dt {
                return falsified(ctx, s, "=", t);
            }
            let ls = ctx.interner.list(ls);
            let lt = ctx.interner.list(lt);
            if ls.len() != lt.len() {
                return falsified(ctx, s, "=", t);
            }
            let mut out = Vec::new();
            for (&x, &y) in ls.iter().zip(lt.iter()) {
                match arg_equality(ctx, x, y) {
                    Some(Some(c)) => out.push(c),
                    Some(None) => {}
                    None => return falsified(ctx, s, "=", t),
                }
            }
            ReductionResult::Many(out)
        }
        (TypeData::Array(c1), TypeData::Array(c2)) => {
            ReductionResult::One(Constraint::equality(c1, c2))
        }
        _ => falsified(ctx, s, "=", t),
    }
}

/// Equality between two type-argument positions. `None` means provably
/// unequal; `Some(None)` trivially equal; `Some(Some(c))` requires `c`.
fn arg_equality(ctx: &InferenceContext<'_>, x: TypeId, y: TypeId) -> Option<Option<Constraint>> {
    match (ctx.interner.data(x), ctx.interner.data(y)) {
        (
            TypeData::Wildcard {
                upper: None,
                lower: None,
            },
            TypeData::Wildcard {
                upper: None,
                lower: None,
            },
        ) => Some(None),
        (
            TypeData::Wildcard {
                upper: Some(u1), ..
            },
            TypeData::Wildcard {
                upper: Some(u2), ..
            },
        ) => Some(Some(Constraint::equality(u1, u2))),
        (
            TypeData::Wildcard {
                lower: Some(l1), ..
            },
            TypeData::Wildcard {
                lower: Some(l2), ..
            },
        ) => Some(Some(Constraint::equality(l1, l2))),
        (TypeData::Wildcard { .. }, _) | (_, TypeData::Wildcard { .. }) => None,
        _ => Some(Some(Constraint::equality(x, y))),
    }
}

/// Loose invocation compatibility (JLS 18.2.2-style): boxing plus
/// subtyping, with the raw-supertype unchecked-conversion escape hatch.
pub fn reduce_compatibility(
    ctx: &mut InferenceContext<'_>,
    s: TypeId,
    t: TypeId,
) -> ReductionResult {
    let cs = ctx.interner.classify(s);
    let ct = ctx.interner.classify(t);
    if let (AbstractType::Proper(_), AbstractType::Proper(_)) = (cs, ct) {
        return if ctx.oracle.is_assignable(s, t) {
            ReductionResult::True
        } else if ctx.oracle.is_subtype_unchecked(s, t) {
            ReductionResult::UncheckedConversion
        } else {
            falsified(ctx, s, "->", t)
        };
    }
    if matches!(ctx.interner.data(s), TypeData::Primitive(_)) {
        return ReductionResult::One(Constraint::compatible(ctx.oracle.box_primitive(s), t));
    }
    if matches!(ctx.interner.data(t), TypeData::Primitive(_)) {
        return ReductionResult::One(Constraint::equality(s, ctx.oracle.box_primitive(t)));
    }
    // A proper source with only a raw supertype of a parameterized target
    // is compatible through unchecked conversion.
    if let TypeData::Class { def, args } = ctx.interner.data(t)
        && !ctx.interner.list(args).is_empty()
        && matches!(cs, AbstractType::Proper(_))
        && matches!(
            ctx.oracle.as_super(s, def).map(|sup| ctx.interner.data(sup)),
            Some(TypeData::Raw(_))
        )
    {
        return ReductionResult::UncheckedConversion;
    }
    ReductionResult::One(Constraint::subtype(s, t))
}

/// Qualifier-lattice reduction: the same dispatch as types, but a failed
/// concrete comparison is advisory (`TrueAnnoFail`), never false.
pub fn reduce_qualifier(
    ctx: &mut InferenceContext<'_>,
    s: AbstractQualifier,
    t: AbstractQualifier,
    kind: QualKind,
) -> ReductionResult {
    use crate::bounds::BoundKind;
    match (s, t) {
        (AbstractQualifier::Concrete(qs), AbstractQualifier::Concrete(qt)) => {
            let ok = match kind {
                QualKind::Subqualifier => ctx.quals.is_subqualifier(qs, qt),
                QualKind::Equality => qs == qt,
            };
            if ok {
                ReductionResult::True
            } else {
                ReductionResult::TrueAnnoFail
            }
        }
        (AbstractQualifier::Variable(v), AbstractQualifier::Variable(w)) => {
            match kind {
                QualKind::Subqualifier => {
                    ctx.qual_vars.get_mut(v).add_bound(BoundKind::Upper, t);
                    ctx.qual_vars.get_mut(w).add_bound(BoundKind::Lower, s);
                }
                QualKind::Equality => {
                    ctx.qual_vars.get_mut(v).add_bound(BoundKind::Equal, t);
                    ctx.qual_vars.get_mut(w).add_bound(BoundKind::Equal, s);
                }
            }
            ReductionResult::True
        }
        (AbstractQualifier::Variable(v), _) => {
            let bound_kind = match kind {
                QualKind::Subqualifier => BoundKind::Upper,
                QualKind::Equality => BoundKind::Equal,
            };
            ctx.qual_vars.get_mut(v).add_bound(bound_kind, t);
            ReductionResult::True
        }
        (_, AbstractQualifier::Variable(w)) => {
            let bound_kind = match kind {
                QualKind::Subqualifier => BoundKind::Lower,
                QualKind::Equality => BoundKind::Equal,
            };
            ctx.qual_vars.get_mut(w).add_bound(bound_kind, s);
            ReductionResult::True
        }
    }
}

// ============================================================
// Shape helpers over types that may mention inference variables
// ============================================================

/// Like the oracle's `as_super`, but works structurally on types that
/// mention inference variables (the oracle only speaks proper types).
fn super_shape(ctx: &InferenceContext<'_>, s: TypeId, of: ClassId) -> Option<TypeId> {
    match ctx.interner.data(s) {
        TypeData::Class { def, args } => {
            if def == of {
                return Some(s);
            }
            let cd = ctx.table.class(def);
            let args = ctx.interner.list(args);
            let map: FxHashMap<TypeParamId, TypeId> = cd
                .type_params
                .iter()
                .copied()
                .zip(args.iter().copied())
                .collect();
            let mut supers: Vec<TypeId> = cd
                .superclass
                .iter()
                .chain(cd.interfaces.iter())
                .map(|&sup| ctx.theta_apply(sup, &map))
                .collect();
            if supers.is_empty() && def != ctx.table.object_class() {
                supers.push(ctx.oracle.object());
            }
            supers.into_iter().find_map(|sup| super_shape(ctx, sup, of))
        }
        TypeData::Raw(_) => ctx.oracle.as_super(s, of),
        TypeData::TypeVar(p) => super_shape(ctx, ctx.table.param(p).upper, of),
        TypeData::Fresh { upper, .. } => super_shape(ctx, upper, of),
        TypeData::Intersection(list) => ctx
            .interner
            .list(list)
            .iter()
            .find_map(|&m| super_shape(ctx, m, of)),
        TypeData::Array(_) => ctx.oracle.as_super(s, of),
        _ => None,
    }
}

fn array_component(ctx: &InferenceContext<'_>, s: TypeId) -> Option<TypeId> {
    match ctx.interner.data(s) {
        TypeData::Array(c) => Some(c),
        TypeData::TypeVar(p) => array_component(ctx, ctx.table.param(p).upper),
        TypeData::Fresh { upper, .. } => array_component(ctx, upper),
        TypeData::Intersection(list) => ctx
            .interner
            .list(list)
            .iter()
            .find_map(|&m| array_component(ctx, m)),
        _ => None,
    }
}

fn intersection_contains(ctx: &InferenceContext<'_>, s: TypeId, t: TypeId) -> bool {
    match ctx.interner.data(s) {
        TypeData::Intersection(list) => ctx.interner.list(list).contains(&t),
        _ => false,
    }
}

#[cfg(test)]
#[path = "../tests/reduce_tests.rs"]
mod tests;
