//! Variable dependency ordering.
//!
//! Resolution must not instantiate a variable while another variable it
//! depends on is still open. [`Dependencies`] records, for each variable,
//! the set of variables whose resolution it depends on — seeded from bound
//! references plus the input/output-variable relation of expression-shaped
//! constraints — then closes the relation transitively by fixed point.
//!
//! Every variable depends on itself, so a dependency group is never empty;
//! a cyclic group must be resolved jointly in one step.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;

use crate::constraint::ConstraintSet;
use crate::context::InferenceContext;
use crate::types::VarId;

#[derive(Clone, Default, Debug)]
pub struct Dependencies {
    deps: FxHashMap<VarId, IndexSet<VarId>>,
}

impl Dependencies {
    /// Builds the dependency relation for `vars` from their current bounds
    /// and the still-deferred constraints.
    pub fn build(
        ctx: &InferenceContext<'_>,
        vars: &IndexSet<VarId>,
        deferred: &ConstraintSet,
    ) -> Self {
        let mut deps: FxHashMap<VarId, IndexSet<VarId>> = FxHashMap::default();
        for &v in vars {
            let mut set: IndexSet<VarId> = IndexSet::new();
            set.insert(v);
            for dep in ctx.vars_in_bounds(v) {
                if vars.contains(&dep) {
                    set.insert(dep);
                }
            }
            deps.insert(v, set);
        }
        // An output variable of a deferred constraint depends on every
        // input variable of that constraint: the constraint cannot produce
        // bounds for its outputs until its inputs are known.
        for c in deferred.iter() {
            let inputs = c.input_vars(ctx);
            if inputs.is_empty() {
                continue;
            }
            for output in c.output_vars(ctx) {
                if let Some(set) = deps.get_mut(&output) {
                    set.extend(inputs.iter().copied().filter(|i| vars.contains(i)));
                }
            }
        }
        let mut result = Self { deps };
        result.close();
        result
    }

    /// Transitive closure by fixed-point iteration.
    fn close(&mut self) {
        loop {
            let mut changed = false;
            let keys: Vec<VarId> = self.deps.keys().copied().collect();
            for v in keys {
                let current: Vec<VarId> = self.deps[&v].iter().copied().collect();
                let mut additions: Vec<VarId> = Vec::new();
                for dep in current {
                    if dep == v {
                        continue;
                    }
                    if let Some(transitive) = self.deps.get(&dep) {
                        for &t in transitive {
                            if !self.deps[&v].contains(&t) {
                                additions.push(t);
                            }
                        }
                    }
                }
                if !additions.is_empty() {
                    changed = true;
                    self.deps.get_mut(&v).expect("known var").extend(additions);
                }
            }
            if !changed {
                return;
            }
        }
    }

    pub fn dependencies_of(&self, v: VarId) -> IndexSet<VarId> {
        self.deps.get(&v).cloned().unwrap_or_default()
    }

    /// The smallest dependency set among `unresolved` variables; this is
    /// the group to resolve next (a set of size 1 is always safe and is
    /// returned eagerly, since every variable depends on itself).
    pub fn smallest_group(
        &self,
        unresolved: impl IntoIterator<Item = VarId>,
    ) -> Option<IndexSet<VarId>> {
        let mut best: Option<IndexSet<VarId>> = None;
        for v in unresolved {
            let group = self.dependencies_of(v);
            if group.len() == 1 {
                return Some(group);
            }
            match &best {
                Some(b) if b.len() <= group.len() => {}
                _ => best = Some(group),
            }
        }
        best
    }
}

#[cfg(test)]
#[path = "../tests/dependency_tests.rs"]
mod tests;
