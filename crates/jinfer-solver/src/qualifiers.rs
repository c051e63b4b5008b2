//! Qualifier representation and qualifier-variable bounds.
//!
//! Qualifiers form a lattice layered over the base type system (nullness,
//! tainting, and similar annotation systems). Inference over qualifiers is
//! structurally identical to inference over types, just smaller: a
//! [`QualVarBounds`] record mirrors `VariableBounds`, and qualifier
//! constraints reduce with lattice comparisons instead of subtyping.
//!
//! The lattice itself (partial order, lub, glb, top, bottom) is supplied by
//! the host through the [`QualifierOracle`](crate::oracle::QualifierOracle).

use indexmap::IndexSet;
use tracing::trace;

use jinfer_common::Atom;

use crate::bounds::BoundKind;
use crate::constraint::{Constraint, QualKind};

/// One concrete qualifier value, e.g. `@NonNull`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Qualifier(pub Atom);

/// A qualifier variable, indexing into the [`QualVarStore`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct QualVarId(pub u32);

/// A qualifier operand: either a concrete qualifier or a variable standing
/// in for a polymorphic qualifier to be solved for.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum AbstractQualifier {
    Concrete(Qualifier),
    Variable(QualVarId),
}

/// Snapshot of a qualifier variable's state for the single-level checkpoint.
#[derive(Clone, Debug)]
struct QualSaved {
    bounds: [IndexSet<AbstractQualifier>; 3],
    instantiation: Option<Qualifier>,
}

/// Mutable bounds record for one qualifier variable.
#[derive(Clone, Debug, Default)]
pub struct QualVarBounds {
    bounds: [IndexSet<AbstractQualifier>; 3],
    pub instantiation: Option<Qualifier>,
    /// Constraints implied by incorporation, drained by the bound-set
    /// fixed-point loop.
    pub constraints: Vec<Constraint>,
    saved: Option<Box<QualSaved>>,
}

impl QualVarBounds {
    /// Records `q` as a bound of `kind` on this variable and derives the
    /// implied constraints from complementary bounds already present.
    ///
    /// Returns `true` if the bound was new.
    pub fn add_bound(&mut self, kind: BoundKind, q: AbstractQualifier) -> bool {
        if !self.bounds[kind as usize].insert(q) {
            return false;
        }
        match kind {
            BoundKind::Equal => {
                if let AbstractQualifier::Concrete(c) = q
                    && self.instantiation.is_none()
                {
                    self.instantiation = Some(c);
                }
                for &other in &self.bounds[BoundKind::Equal as usize] {
                    if other != q {
                        self.constraints.push(Constraint::QualifierTyping {
                            s: q,
                            t: other,
                            kind: QualKind::Equality,
                        });
                    }
                }
                for &lower in &self.bounds[BoundKind::Lower as usize] {
                    self.constraints.push(Constraint::QualifierTyping {
                        s: lower,
                        t: q,
                        kind: QualKind::Subqualifier,
                    });
                }
                for &upper in &self.bounds[BoundKind::Upper as usize] {
                    self.constraints.push(Constraint::QualifierTyping {
                        s: q,
                        t: upper,
                        kind: QualKind::Subqualifier,
                    });
                }
            }
            BoundKind::Lower => {
                for &other in self.bounds[BoundKind::Equal as usize]
                    .iter()
                    .chain(&self.bounds[BoundKind::Upper as usize])
                {
                    self.constraints.push(Constraint::QualifierTyping {
                        s: q,
                        t: other,
                        kind: QualKind::Subqualifier,
                    });
                }
            }
            BoundKind::Upper => {
                for &other in self.bounds[BoundKind::Equal as usize]
                    .iter()
                    .chain(&self.bounds[BoundKind::Lower as usize])
                {
                    self.constraints.push(Constraint::QualifierTyping {
                        s: other,
                        t: q,
                        kind: QualKind::Subqualifier,
                    });
                }
            }
        }
        true
    }

    pub fn bounds(&self, kind: BoundKind) -> &IndexSet<AbstractQualifier> {
        &self.bounds[kind as usize]
    }

    /// Concrete bounds of `kind`, skipping bounds that are themselves
    /// variables.
    pub fn concrete_bounds(&self, kind: BoundKind) -> Vec<Qualifier> {
        self.bounds[kind as usize]
            .iter()
            .filter_map(|b| match b {
                AbstractQualifier::Concrete(q) => Some(*q),
                AbstractQualifier::Variable(_) => None,
            })
            .collect()
    }

    pub fn save(&mut self) {
        self.saved = Some(Box::new(QualSaved {
            bounds: self.bounds.clone(),
            instantiation: self.instantiation,
        }));
    }

    pub fn restore(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.bounds = saved.bounds;
            self.instantiation = saved.instantiation;
            self.constraints.clear();
        }
    }
}

/// Arena of qualifier-variable bounds for one inference run.
#[derive(Default)]
pub struct QualVarStore {
    vars: Vec<QualVarBounds>,
}

impl QualVarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self) -> QualVarId {
        let id = QualVarId(self.vars.len() as u32);
        trace!(var = id.0, "allocating qualifier variable");
        self.vars.push(QualVarBounds::default());
        id
    }

    pub fn get(&self, id: QualVarId) -> &QualVarBounds {
        &self.vars[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: QualVarId) -> &mut QualVarBounds {
        &mut self.vars[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = QualVarId> + use<> {
        (0..self.vars.len() as u32).map(QualVarId)
    }

    /// Drains every variable's pending incorporation constraints.
    pub fn take_pending(&mut self) -> Vec<Constraint> {
        let mut out = Vec::new();
        for v in &mut self.vars {
            out.append(&mut v.constraints);
        }
        out
    }
}

#[cfg(test)]
#[path = "../tests/qualifier_tests.rs"]
mod tests;
