//! Bound-set accumulation and the reduction/incorporation fixed point.
//!
//! A [`BoundSet`] tracks which variables a (possibly nested) inference
//! covers plus the two advisory flags (unchecked conversion, qualifier
//! mismatch). The bounds themselves live in the shared
//! [`VarStore`](crate::bounds::VarStore); merging bound sets is therefore
//! just flag/variable-set union. Unsatisfiability is not a flag: it
//! propagates immediately as `Err(InferenceError::Falsified)`, which is
//! what makes merge short-circuiting.
//!
//! [`reduce_and_incorporate`] is the engine's main loop: drain the
//! constraint worklist, then drain the incorporation constraints the new
//! bounds implied, and repeat until neither produces work.

use indexmap::IndexSet;
use tracing::{debug, trace};

use jinfer_common::limits::{MAX_INCORPORATION_ROUNDS, MAX_REDUCTION_STEPS};

use crate::constraint::{ConstraintSet, ReductionResult};
use crate::context::InferenceContext;
use crate::error::InferenceError;
use crate::reduce::reduce_constraint;
use crate::types::VarId;

#[derive(Clone, Default, Debug)]
pub struct BoundSet {
    /// The inference variables this bound set ranges over.
    pub vars: IndexSet<VarId>,
    /// An unchecked (raw-type) conversion was needed somewhere; the caller
    /// should warn but the inference succeeds.
    pub unchecked_conversion: bool,
    /// A qualifier comparison was satisfiable only by ignoring a
    /// mismatch; the caller decides severity.
    pub anno_fail: bool,
}

impl BoundSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            vars: vars.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Union of coverage and flags. Associative and commutative;
    /// falsehood short-circuits before ever reaching a merge.
    pub fn merge(&mut self, other: &BoundSet) {
        self.vars.extend(other.vars.iter().copied());
        self.unchecked_conversion |= other.unchecked_conversion;
        self.anno_fail |= other.anno_fail;
    }

}

/// Drains `set`, reducing each constraint and folding the results into
/// `bounds`, then drains the incorporation constraints new bounds implied,
/// until a fixed point is reached.
pub fn reduce_and_incorporate(
    ctx: &mut InferenceContext<'_>,
    set: &mut ConstraintSet,
    bounds: &mut BoundSet,
) -> Result<(), InferenceError> {
    let mut steps: u32 = 0;
    let mut rounds: u32 = 0;
    loop {
        while let Some(c) = set.pop_front() {
            steps += 1;
            if steps > MAX_REDUCTION_STEPS {
                return Err(InferenceError::LimitExceeded {
                    what: "constraint reduction steps",
                });
            }
            trace!(constraint = %c.describe(ctx), "reducing");
            match reduce_constraint(ctx, &c)? {
                ReductionResult::True => {}
                ReductionResult::TrueAnnoFail => bounds.anno_fail = true,
                ReductionResult::UncheckedConversion => bounds.unchecked_conversion = true,
                ReductionResult::False(fb) => {
                    debug!(constraint = %c.describe(ctx), "constraint falsified");
                    return Err(fb.with_trail(c.describe(ctx)).into());
                }
                ReductionResult::One(next) => set.push(next),
                ReductionResult::Many(next) => set.extend(next),
                ReductionResult::Bounds(nested) => bounds.merge(&nested),
            }
        }
        let mut pending = ctx.vars.take_pending();
        pending.extend(ctx.qual_vars.take_pending());
        if pending.is_empty() {
            return Ok(());
        }
        rounds += 1;
        if rounds > MAX_INCORPORATION_ROUNDS {
            return Err(InferenceError::LimitExceeded {
                what: "incorporation rounds",
            });
        }
        trace!(round = rounds, pending = pending.len(), "incorporation round");
        set.extend(pending);
    }
}

#[cfg(test)]
#[path = "../tests/bound_set_tests.rs"]
mod tests;
