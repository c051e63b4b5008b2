//! Host type-system oracles.
//!
//! The engine never re-derives the host language's declarative subtyping
//! rules; it asks an oracle. Everything a reduction or resolution rule needs
//! to know about *proper* types flows through [`TypeOracle`], and everything
//! about the qualifier lattice through [`QualifierOracle`]. Tests substitute
//! small fake oracles; production embedders wrap their real type system.
//!
//! A structural implementation backed by a
//! [`ClassTable`](crate::class_hierarchy::ClassTable) lives in
//! `class_hierarchy.rs`.

use crate::qualifiers::Qualifier;
use crate::types::{ClassId, TypeId, TypeParamId};

/// The functional shape of a functional-interface parameterization: the
/// single abstract method's signature after substituting type arguments.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FunctionSig {
    pub params: Vec<TypeId>,
    /// `None` for a void method.
    pub ret: Option<TypeId>,
    pub thrown: Vec<TypeId>,
}

/// Queries over proper types, answered by the host type system.
///
/// All arguments are proper types unless a method says otherwise; behavior
/// on types mentioning inference variables is unspecified.
pub trait TypeOracle {
    /// Structural identity of two proper types.
    fn is_same(&self, s: TypeId, t: TypeId) -> bool;

    /// `s <: t` under the host's declarative subtyping rules.
    fn is_subtype(&self, s: TypeId, t: TypeId) -> bool;

    /// `s <: t` allowing one unchecked (raw-type) conversion step.
    fn is_subtype_unchecked(&self, s: TypeId, t: TypeId) -> bool;

    /// Loose invocation compatibility: subtyping plus boxing/unboxing.
    fn is_assignable(&self, s: TypeId, t: TypeId) -> bool;

    /// The parameterization of `of` that `s` inherits, if any.
    /// `Raw(of)` is returned when the inheritance path goes through a raw
    /// supertype.
    fn as_super(&self, s: TypeId, of: ClassId) -> Option<TypeId>;

    fn erasure(&self, t: TypeId) -> TypeId;

    /// Boxes a primitive type; identity on everything else.
    fn box_primitive(&self, t: TypeId) -> TypeId;

    /// Least upper bound of a non-empty set of proper types.
    fn lub(&self, ts: &[TypeId]) -> TypeId;

    /// Greatest lower bound, or `None` when the types have no common
    /// subtype (e.g. two unrelated final classes).
    fn glb(&self, ts: &[TypeId]) -> Option<TypeId>;

    /// Capture conversion: wildcard type arguments replaced by fresh
    /// bounded type variables.
    fn capture(&self, t: TypeId) -> TypeId;

    /// The function type of a functional-interface parameterization, or
    /// `None` if `t` is not a functional shape.
    fn function_type(&self, t: TypeId) -> Option<FunctionSig>;

    /// `t` with every wildcard type argument replaced per the non-wildcard
    /// parameterization rules (unbound -> declared bound, extends -> glb of
    /// wildcard and declared bound, super -> the lower bound).
    fn non_wildcard_parameterization(&self, t: TypeId) -> TypeId;

    /// The declared upper bound of a type parameter.
    fn declared_upper(&self, p: TypeParamId) -> TypeId;

    fn object(&self) -> TypeId;

    /// The unchecked-exception root type, used when resolving variables
    /// that carry a throws bound.
    fn runtime_exception(&self) -> TypeId;
}

/// Queries over the qualifier lattice, answered by the host checker.
pub trait QualifierOracle {
    /// `s` is below `t` in the lattice.
    fn is_subqualifier(&self, s: Qualifier, t: Qualifier) -> bool;

    fn lub(&self, qs: &[Qualifier]) -> Qualifier;

    fn glb(&self, qs: &[Qualifier]) -> Qualifier;

    fn top(&self) -> Qualifier;

    fn bottom(&self) -> Qualifier;
}
