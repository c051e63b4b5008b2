//! Per-variable bound sets and the incorporation rules.
//!
//! Every inference variable owns a [`VariableBounds`] record: three bound
//! sets (LOWER, UPPER, EQUAL), qualifier bounds, an optional resolved
//! instantiation, and a throws-bound flag. Adding a bound *incorporates* it
//! against the complementary bounds already present, appending the implied
//! constraints to the variable's pending list — the bound-set fixed-point
//! loop drains and reduces them later. This deferral is what makes the
//! solver a worklist fixed point rather than a single pass.
//!
//! Each record supports a single level of save/restore used by the
//! resolution fallback; nested checkpoints are not needed.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::constraint::Constraint;
use crate::context::InferenceContext;
use crate::qualifiers::AbstractQualifier;
use crate::types::{AbstractType, TypeData, TypeId, TypeParamId, VarId};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[repr(usize)]
pub enum BoundKind {
    Lower = 0,
    Upper = 1,
    Equal = 2,
}

/// Snapshot for the single-level checkpoint.
#[derive(Clone, Debug)]
struct Saved {
    bounds: [IndexSet<TypeId>; 3],
    qual_bounds: [IndexSet<AbstractQualifier>; 3],
    instantiation: Option<TypeId>,
    has_throws_bound: bool,
}

/// Mutable bounds record for one inference variable.
#[derive(Clone, Debug)]
pub struct VariableBounds {
    /// The type parameter this variable was created for.
    pub param: TypeParamId,
    bounds: [IndexSet<TypeId>; 3],
    qual_bounds: [IndexSet<AbstractQualifier>; 3],
    pub instantiation: Option<TypeId>,
    /// Set when the variable appears in the invoked method's throws
    /// clause; biases upper-bound resolution toward the runtime-exception
    /// type.
    pub has_throws_bound: bool,
    /// Constraints implied by incorporation, drained by the bound-set
    /// fixed-point loop.
    pub constraints: Vec<Constraint>,
    saved: Option<Box<Saved>>,
}

impl VariableBounds {
    pub fn new(param: TypeParamId) -> Self {
        Self {
            param,
            bounds: Default::default(),
            qual_bounds: Default::default(),
            instantiation: None,
            has_throws_bound: false,
            constraints: Vec::new(),
            saved: None,
        }
    }

    pub fn bounds(&self, kind: BoundKind) -> &IndexSet<TypeId> {
        &self.bounds[kind as usize]
    }

    pub fn qual_bounds(&self, kind: BoundKind) -> &IndexSet<AbstractQualifier> {
        &self.qual_bounds[kind as usize]
    }

    pub fn save(&mut self) {
        self.saved = Some(Box::new(Saved {
            bounds: self.bounds.clone(),
            qual_bounds: self.qual_bounds.clone(),
            instantiation: self.instantiation,
            has_throws_bound: self.has_throws_bound,
        }));
    }

    pub fn restore(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.bounds = saved.bounds;
            self.qual_bounds = saved.qual_bounds;
            self.instantiation = saved.instantiation;
            self.has_throws_bound = saved.has_throws_bound;
            self.constraints.clear();
        }
    }

    pub fn has_saved(&self) -> bool {
        self.saved.is_some()
    }
}

/// Arena of [`VariableBounds`], addressed by [`VarId`].
#[derive(Default)]
pub struct VarStore {
    vars: Vec<VariableBounds>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, param: TypeParamId) -> VarId {
        let id = VarId(self.vars.len() as u32);
        trace!(var = id.0, param = param.0, "allocating inference variable");
        self.vars.push(VariableBounds::new(param));
        id
    }

    pub fn get(&self, id: VarId) -> &VariableBounds {
        &self.vars[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: VarId) -> &mut VariableBounds {
        &mut self.vars[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = VarId> + use<> {
        (0..self.vars.len() as u32).map(VarId)
    }

    pub fn save_all(&mut self, vars: impl IntoIterator<Item = VarId>) {
        for v in vars {
            self.get_mut(v).save();
        }
    }

    pub fn restore_all(&mut self, vars: impl IntoIterator<Item = VarId>) {
        for v in vars {
            self.get_mut(v).restore();
        }
    }

    /// Drains every variable's pending incorporation constraints.
    pub fn take_pending(&mut self) -> Vec<Constraint> {
        let mut out = Vec::new();
        for v in &mut self.vars {
            out.append(&mut v.constraints);
        }
        out
    }

    pub fn has_pending(&self) -> bool {
        self.vars.iter().any(|v| !v.constraints.is_empty())
    }
}

impl InferenceContext<'_> {
    /// Records `ty` as a bound of `kind` on `var`, deriving implied
    /// constraints from complementary bounds already present (JLS-style
    /// incorporation). Self-bounds are ignored.
    pub fn add_bound(&mut self, var: VarId, kind: BoundKind, ty: TypeId) {
        if self.interner.data(ty) == TypeData::Use(var) {
            return;
        }
        if !self.vars.get_mut(var).bounds[kind as usize].insert(ty) {
            return;
        }
        trace!(
            var = var.0,
            kind = ?kind,
            bound = %self.display_type(ty),
            "adding bound"
        );

        // An EQUAL bound to a proper type resolves the variable (boxing
        // primitives: a variable never instantiates to a primitive).
        if kind == BoundKind::Equal
            && matches!(self.interner.classify(ty), AbstractType::Proper(_))
            && self.vars.get(var).instantiation.is_none()
        {
            let inst = self.oracle.box_primitive(ty);
            self.vars.get_mut(var).instantiation = Some(inst);
            trace!(var = var.0, inst = %self.display_type(inst), "instantiated");
        }

        let mut implied = Vec::new();
        {
            let vb = self.vars.get(var);
            let equals = vb.bounds(BoundKind::Equal);
            let lowers = vb.bounds(BoundKind::Lower);
            let uppers = vb.bounds(BoundKind::Upper);
            match kind {
                BoundKind::Equal => {
                    for &other in equals {
                        if other != ty {
                            implied.push(Constraint::equality(ty, other));
                        }
                    }
                    for &l in lowers {
                        implied.push(Constraint::subtype(l, ty));
                    }
                    for &u in uppers {
                        implied.push(Constraint::subtype(ty, u));
                    }
                }
                BoundKind::Lower => {
                    for &e in equals {
                        implied.push(Constraint::subtype(ty, e));
                    }
                    for &u in uppers {
                        implied.push(Constraint::subtype(ty, u));
                        self.parameterized_pairs(ty, u, &mut implied);
                    }
                }
                BoundKind::Upper => {
                    for &e in equals {
                        implied.push(Constraint::subtype(e, ty));
                        self.parameterized_pairs(e, ty, &mut implied);
                    }
                    for &l in lowers {
                        implied.push(Constraint::subtype(l, ty));
                        self.parameterized_pairs(l, ty, &mut implied);
                    }
                    for &u in uppers {
                        if u != ty {
                            self.parameterized_pairs(u, ty, &mut implied);
                        }
                    }
                }
            }
        }
        self.vars.get_mut(var).constraints.extend(implied);
    }

    /// When two bounds of one variable are parameterizations of the same
    /// generic class, their corresponding non-wildcard type arguments must
    /// be equal (`alpha <: List<beta>` and `alpha <: List<String>` force
    /// `beta = String`).
    fn parameterized_pairs(&self, a: TypeId, b: TypeId, out: &mut Vec<Constraint>) {
        let (TypeData::Class { def: da, args: la }, TypeData::Class { def: db, args: lb }) =
            (self.interner.data(a), self.interner.data(b))
        else {
            return;
        };
        if da != db {
            return;
        }
        let la = self.interner.list(la);
        let lb = self.interner.list(lb);
        for (&x, &y) in la.iter().zip(lb.iter()) {
            let x_wild = matches!(self.interner.data(x), TypeData::Wildcard { .. });
            let y_wild = matches!(self.interner.data(y), TypeData::Wildcard { .. });
            if !x_wild && !y_wild && x != y {
                out.push(Constraint::equality(x, y));
            }
        }
    }

    /// Records a qualifier bound on a type variable, mirroring the type
    /// bound matrix over the qualifier lattice.
    pub fn add_type_var_qual_bound(&mut self, var: VarId, kind: BoundKind, q: AbstractQualifier) {
        if !self.vars.get_mut(var).qual_bounds[kind as usize].insert(q) {
            return;
        }
        trace!(var = var.0, kind = ?kind, qual = %self.display_qual(q), "adding qualifier bound");
        let mut implied = Vec::new();
        {
            let vb = self.vars.get(var);
            match kind {
                BoundKind::Equal => {
                    for &other in vb.qual_bounds(BoundKind::Lower) {
                        implied.push(Constraint::QualifierTyping {
                            s: other,
                            t: q,
                            kind: crate::constraint::QualKind::Subqualifier,
                        });
                    }
                    for &other in vb.qual_bounds(BoundKind::Upper) {
                        implied.push(Constraint::QualifierTyping {
                            s: q,
                            t: other,
                            kind: crate::constraint::QualKind::Subqualifier,
                        });
                    }
                }
                BoundKind::Lower => {
                    for &other in vb
                        .qual_bounds(BoundKind::Equal)
                        .iter()
                        .chain(vb.qual_bounds(BoundKind::Upper))
                    {
                        implied.push(Constraint::QualifierTyping {
                            s: q,
                            t: other,
                            kind: crate::constraint::QualKind::Subqualifier,
                        });
                    }
                }
                BoundKind::Upper => {
                    for &other in vb
                        .qual_bounds(BoundKind::Equal)
                        .iter()
                        .chain(vb.qual_bounds(BoundKind::Lower))
                    {
                        implied.push(Constraint::QualifierTyping {
                            s: other,
                            t: q,
                            kind: crate::constraint::QualKind::Subqualifier,
                        });
                    }
                }
            }
        }
        self.vars.get_mut(var).constraints.extend(implied);
    }

    /// Proper bounds of `kind` on `var`, with current instantiations
    /// substituted through.
    pub fn proper_bounds(&self, var: VarId, kind: BoundKind) -> Vec<TypeId> {
        self.vars
            .get(var)
            .bounds(kind)
            .iter()
            .map(|&b| self.apply_instantiations(b))
            .filter(|&b| !self.interner.mentions_vars(b))
            .collect()
    }

    /// Every variable mentioned in any bound of `var` (not `var` itself).
    pub fn vars_in_bounds(&self, var: VarId) -> FxHashSet<VarId> {
        let mut out = FxHashSet::default();
        let vb = self.vars.get(var);
        for kind in [BoundKind::Lower, BoundKind::Upper, BoundKind::Equal] {
            for &b in vb.bounds(kind) {
                self.interner.collect_vars(b, &mut out);
            }
        }
        out.remove(&var);
        out
    }
}

#[cfg(test)]
#[path = "../tests/bounds_tests.rs"]
mod tests;
