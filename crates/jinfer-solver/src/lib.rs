//! Generic invocation type inference.
//!
//! A constraint-solving engine for inferring the type arguments of generic
//! method invocations, in the style of JLS §18, with a parallel inference
//! layer over a pluggable type-qualifier lattice.
//!
//! The pipeline for one call site:
//!
//! 1. **B2** — mint an inference variable per method type parameter, seed
//!    declared bounds, reduce the arguments pertinent to applicability
//!    ([`infer::create_b2`]).
//! 2. **B3** — relate the substituted return type to the target type.
//! 3. **C/B4** — defer poly-expression arguments (implicit lambdas, inexact
//!    method references) until their input variables resolve, then reduce
//!    them in dependency order.
//! 4. **Resolution** — instantiate variables group by group, with a single
//!    fresh-variable retry on falsification ([`resolve`]).
//!
//! The engine never re-implements the host language's declarative rules for
//! proper types; those are supplied through [`oracle::TypeOracle`] and
//! [`oracle::QualifierOracle`]. A structural implementation backed by a
//! [`class_hierarchy::ClassTable`] is included.

pub mod bound_set;
pub mod bounds;
pub mod class_hierarchy;
pub mod constraint;
pub mod context;
pub mod dependencies;
pub mod error;
pub mod expression;
pub mod infer;
pub mod intern;
pub mod oracle;
pub mod qualifiers;
pub mod reduce;
pub mod resolve;
pub mod substitute;
pub mod types;

pub use bound_set::BoundSet;
pub use bounds::{BoundKind, VarStore, VariableBounds};
pub use class_hierarchy::{
    ClassDef, ClassTable, HierarchyOracle, MethodId, MethodSig, TypeParamDecl,
};
pub use constraint::{Constraint, ConstraintSet, QualKind, ReductionResult, TypingKind};
pub use context::InferenceContext;
pub use error::{FalseBound, InferenceError};
pub use expression::{ExprArena, ExprId, ExprKind};
pub use infer::{CallSite, InferenceResult, Theta, infer_invocation};
pub use intern::TypeInterner;
pub use oracle::{FunctionSig, QualifierOracle, TypeOracle};
pub use qualifiers::{AbstractQualifier, QualVarId, QualVarStore, Qualifier};
pub use resolve::resolve;
pub use types::{
    AbstractType, ClassId, FreshId, PrimitiveKind, TypeData, TypeId, TypeListId, TypeParamId,
    VarId,
};

#[cfg(test)]
#[path = "../tests/fixtures.rs"]
pub(crate) mod fixtures;
