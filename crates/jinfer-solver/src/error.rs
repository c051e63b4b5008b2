//! Inference failure types.
//!
//! A falsified constraint aborts the whole solve for the current call site;
//! nothing here retries at a higher level. The falsifying constraint is
//! rendered eagerly (ids are meaningless once the per-call arenas are gone)
//! together with a trail of the constraints it was derived from, so the
//! caller can build a useful diagnostic.

use std::fmt;

/// The unsatisfiable-bound sentinel: which constraint could not be
/// satisfied, and how inference got there.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FalseBound {
    /// Rendering of the constraint that reduced to false.
    pub constraint: String,
    /// Renderings of the constraints this one was derived from, outermost
    /// first. May be empty for directly supplied constraints.
    pub trail: Vec<String>,
}

impl FalseBound {
    pub fn new(constraint: impl Into<String>) -> Self {
        Self {
            constraint: constraint.into(),
            trail: Vec::new(),
        }
    }

    pub fn with_trail(mut self, entry: impl Into<String>) -> Self {
        self.trail.push(entry.into());
        self
    }
}

impl fmt::Display for FalseBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsatisfiable constraint: {}", self.constraint)?;
        for entry in &self.trail {
            write!(f, "\n  derived from: {entry}")?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum InferenceError {
    /// A constraint reduced to false; the call does not type-check.
    Falsified(FalseBound),
    /// The call supplied a different number of arguments than the method
    /// declares parameters.
    ArityMismatch { expected: usize, found: usize },
    /// A fixed-point loop or recursion guard hit its configured limit.
    LimitExceeded { what: &'static str },
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::Falsified(fb) => fb.fmt(f),
            InferenceError::ArityMismatch { expected, found } => {
                write!(f, "expected {expected} arguments, found {found}")
            }
            InferenceError::LimitExceeded { what } => {
                write!(f, "inference limit exceeded: {what}")
            }
        }
    }
}

impl std::error::Error for InferenceError {}

impl From<FalseBound> for InferenceError {
    fn from(fb: FalseBound) -> Self {
        InferenceError::Falsified(fb)
    }
}
