//! Centralized limits and thresholds for the inference engine.
//!
//! This module provides shared constants for iteration counts and recursion
//! depths used throughout the solver. Centralizing these values:
//! - Prevents duplicate definitions with inconsistent values
//! - Makes it easy to tune limits in one place
//! - Documents the rationale for each limit

/// Maximum incorporation rounds for a bound set.
///
/// After new bounds are recorded, incorporation derives follow-up
/// constraints whose reduction may record further bounds. The loop runs to
/// a fixed point; this caps the number of rounds so a pathological
/// hierarchy cannot hang the solver.
///
/// # Example
///
/// ```java
/// // Mutually bounded type parameters keep feeding each other bounds:
/// <A extends Comparable<B>, B extends Comparable<A>> void f(A a, B b) {}
/// ```
pub const MAX_INCORPORATION_ROUNDS: u32 = 100;

/// Maximum constraints reduced while draining one constraint set.
///
/// Reduction replaces one constraint with zero or more simpler ones, so a
/// single worklist drain can expand transiently. Deeply nested generic
/// arguments are the usual cause; at this count the drain stops and the
/// inference fails rather than spinning.
pub const MAX_REDUCTION_STEPS: u32 = 10_000;

/// Maximum nesting depth for inference within inference.
///
/// An argument that is itself a generic invocation (or a lambda returning
/// one) starts a nested inference whose bounds merge into the outer one.
/// Each level adds a full solver frame, so nesting is bounded well below
/// the stack limit.
///
/// # Example
///
/// ```java
/// // Each call nests one more inference:
/// id(id(id(id(Collections.emptyList()))));
/// ```
pub const MAX_NESTED_INFERENCE_DEPTH: u32 = 50;

/// Maximum passes over the dependency graph during resolution.
///
/// Every pass instantiates at least one variable group, so a pass count
/// exceeding the variable count means substitution failed to make
/// progress.
pub const MAX_RESOLUTION_PASSES: u32 = 1_000;

/// Inline capacity for type-argument lists.
///
/// Lists backed by `SmallVec<[TypeId; 4]>` hold up to 4 elements without
/// heap allocation. Real-world generic declarations rarely carry more than
/// four type arguments.
pub const TYPE_ARGS_INLINE: usize = 4;
