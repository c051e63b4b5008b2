//! Constraint formulas and the reduction worklist.
//!
//! Constraints are immutable values; reduction consumes one and produces
//! bounds and/or simpler constraints (see `reduce.rs` and `expression.rs`
//! for the rules). The [`ConstraintSet`] is an ordered, duplicate-free
//! worklist: reduction drains it front to back, and incorporation appends
//! to it.
//!
//! A constraint also knows its *input* and *output* variables. These are
//! used for exactly one thing: picking an order-independent subset of
//! deferred constraints to reduce next (`closed_subset`), which is how
//! dependency cycles between lambda-shaped arguments are broken.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;

use crate::context::InferenceContext;
use crate::dependencies::Dependencies;
use crate::error::FalseBound;
use crate::expression::{ExprId, ExprKind};
use crate::qualifiers::AbstractQualifier;
use crate::types::{TypeId, VarId};

/// The four type-level relations a `Typing` constraint can assert.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypingKind {
    /// `S <: T`.
    Subtype,
    /// Type argument `S` is contained by type-argument position `T`
    /// (wildcard-aware).
    Contained,
    /// `S = T`.
    Equality,
    /// `S` is compatible with `T` in a loose invocation context (boxing
    /// allowed, unchecked conversion tolerated).
    Compatibility,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum QualKind {
    Subqualifier,
    Equality,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Constraint {
    /// A relation between two types, either of which may mention inference
    /// variables.
    Typing {
        s: TypeId,
        t: TypeId,
        kind: TypingKind,
        /// Set when this constraint came from a covariant type-argument
        /// position; containment then degrades to subtyping instead of
        /// equality.
        covariant_arg: bool,
    },
    /// A relation over the qualifier lattice.
    QualifierTyping {
        s: AbstractQualifier,
        t: AbstractQualifier,
        kind: QualKind,
    },
    /// Expression `expr` must be compatible with target type `target`.
    Expression { expr: ExprId, target: TypeId },
    /// Checked exceptions thrown by the lambda/method-reference `expr` must
    /// be allowed by the throws clause of `target`'s function type.
    CheckedException { expr: ExprId, target: TypeId },
    /// Recursive expansion of `expr`'s subexpressions (lambda bodies,
    /// nested poly expressions) into further constraints.
    AdditionalArgument { expr: ExprId, target: TypeId },
}

impl Constraint {
    pub fn subtype(s: TypeId, t: TypeId) -> Self {
        Constraint::Typing {
            s,
            t,
            kind: TypingKind::Subtype,
            covariant_arg: false,
        }
    }

    pub fn equality(s: TypeId, t: TypeId) -> Self {
        Constraint::Typing {
            s,
            t,
            kind: TypingKind::Equality,
            covariant_arg: false,
        }
    }

    pub fn compatible(s: TypeId, t: TypeId) -> Self {
        Constraint::Typing {
            s,
            t,
            kind: TypingKind::Compatibility,
            covariant_arg: false,
        }
    }

    pub fn contained(s: TypeId, t: TypeId, covariant_arg: bool) -> Self {
        Constraint::Typing {
            s,
            t,
            kind: TypingKind::Contained,
            covariant_arg,
        }
    }

    /// Variables whose resolution could influence how this constraint
    /// reduces. Only expression-shaped constraints against a functional
    /// target have input variables.
    pub fn input_vars(&self, ctx: &InferenceContext<'_>) -> FxHashSet<VarId> {
        let mut out = FxHashSet::default();
        match self {
            Constraint::Typing { .. } | Constraint::QualifierTyping { .. } => {}
            Constraint::Expression { expr, target }
            | Constraint::CheckedException { expr, target }
            | Constraint::AdditionalArgument { expr, target } => {
                match ctx.exprs.kind(*expr) {
                    ExprKind::Lambda { .. } | ExprKind::MethodRef { .. } => {
                        // The function-type parameters (and for implicit
                        // lambdas the whole target) must be known before the
                        // constraint can be reduced.
                        if let Some(sig) = ctx.oracle.function_type(ctx.proper_view(*target)) {
                            for p in sig.params {
                                ctx.interner.collect_vars(p, &mut out);
                            }
                        } else {
                            ctx.interner.collect_vars(*target, &mut out);
                        }
                    }
                    ExprKind::Conditional { .. } | ExprKind::Switch { .. } => {
                        // Branches may themselves be lambdas; conservatively
                        // treat the whole target as input.
                        ctx.interner.collect_vars(*target, &mut out);
                    }
                    _ => {}
                }
            }
        }
        out
    }

    /// Variables this constraint could resolve: everything it mentions that
    /// is not an input variable.
    pub fn output_vars(&self, ctx: &InferenceContext<'_>) -> FxHashSet<VarId> {
        let mut all = FxHashSet::default();
        match self {
            Constraint::Typing { s, t, .. } => {
                ctx.interner.collect_vars(*s, &mut all);
                ctx.interner.collect_vars(*t, &mut all);
            }
            Constraint::QualifierTyping { .. } => {}
            Constraint::Expression { target, .. }
            | Constraint::CheckedException { target, .. }
            | Constraint::AdditionalArgument { target, .. } => {
                ctx.interner.collect_vars(*target, &mut all);
            }
        }
        for input in self.input_vars(ctx) {
            all.remove(&input);
        }
        all
    }

    /// Human-readable rendering for diagnostics and trace logs.
    pub fn describe(&self, ctx: &InferenceContext<'_>) -> String {
        match self {
            Constraint::Typing { s, t, kind, .. } => {
                let op = match kind {
                    TypingKind::Subtype => "<:",
                    TypingKind::Contained => "<=",
                    TypingKind::Equality => "=",
                    TypingKind::Compatibility => "->",
                };
                format!("{} {} {}", ctx.display_type(*s), op, ctx.display_type(*t))
            }
            Constraint::QualifierTyping { s, t, kind } => {
                let op = match kind {
                    QualKind::Subqualifier => "<:",
                    QualKind::Equality => "=",
                };
                format!("{} {} {}", ctx.display_qual(*s), op, ctx.display_qual(*t))
            }
            Constraint::Expression { expr, target } => {
                format!("expr#{} -> {}", expr.0, ctx.display_type(*target))
            }
            Constraint::CheckedException { expr, target } => {
                format!("throws(expr#{}) -> {}", expr.0, ctx.display_type(*target))
            }
            Constraint::AdditionalArgument { expr, target } => {
                format!("args(expr#{}) -> {}", expr.0, ctx.display_type(*target))
            }
        }
    }
}

/// What reducing a single constraint produced.
#[derive(Clone, Debug)]
pub enum ReductionResult {
    /// Satisfied with nothing left to do.
    True,
    /// Satisfied, but a qualifier mismatch was ignored; the caller decides
    /// whether that is an error.
    TrueAnnoFail,
    /// Unsatisfiable.
    False(FalseBound),
    /// Satisfied through an unchecked (raw-type) conversion; advisory.
    UncheckedConversion,
    One(Constraint),
    Many(Vec<Constraint>),
    /// A nested inference ran; its flags merge into the enclosing bound
    /// set (the bounds themselves already live in the shared variable
    /// store).
    Bounds(crate::bound_set::BoundSet),
}

/// Ordered, duplicate-free worklist of constraints.
#[derive(Clone, Default, Debug)]
pub struct ConstraintSet {
    items: IndexSet<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        let mut set = Self::new();
        for c in constraints {
            set.push(c);
        }
        set
    }

    pub fn push(&mut self, c: Constraint) {
        self.items.insert(c);
    }

    pub fn extend(&mut self, cs: impl IntoIterator<Item = Constraint>) {
        for c in cs {
            self.push(c);
        }
    }

    pub fn pop_front(&mut self) -> Option<Constraint> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.shift_remove_index(0).expect("non-empty"))
        }
    }

    pub fn remove(&mut self, c: &Constraint) {
        self.items.shift_remove(c);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.items.iter()
    }

    /// Selects the subset of constraints that can be reduced now without
    /// depending on the output of any other constraint still in the set.
    ///
    /// When every constraint participates in a dependency cycle, a single
    /// constraint is returned so the caller still makes progress rather
    /// than looping forever.
    pub fn closed_subset(
        &self,
        ctx: &InferenceContext<'_>,
        deps: &Dependencies,
    ) -> Vec<Constraint> {
        if self.items.len() <= 1 {
            return self.items.iter().cloned().collect();
        }
        let mut subset = Vec::new();
        for (i, c) in self.items.iter().enumerate() {
            let inputs = c.input_vars(ctx);
            let mut blocked = false;
            'outer: for (j, other) in self.items.iter().enumerate() {
                if i == j {
                    continue;
                }
                let outputs = other.output_vars(ctx);
                for &input in &inputs {
                    // An input variable blocked on another constraint's
                    // output, directly or through the dependency closure.
                    if outputs.contains(&input)
                        || deps
                            .dependencies_of(input)
                            .iter()
                            .any(|d| outputs.contains(d))
                    {
                        blocked = true;
                        break 'outer;
                    }
                }
            }
            if !blocked {
                subset.push(c.clone());
            }
        }
        if subset.is_empty() {
            // Cycle: reduce one constraint to break it.
            subset.push(self.items[0].clone());
        }
        subset
    }
}

#[cfg(test)]
#[path = "../tests/constraint_tests.rs"]
mod tests;
