//! Structural type representation.
//!
//! Types are interned: each distinct [`TypeData`] value is stored once in the
//! [`TypeInterner`](crate::intern::TypeInterner) and referred to by a copyable
//! [`TypeId`]. Equality of two types is O(1) id comparison.
//!
//! Inference variables appear inside types as [`TypeData::Use`] nodes. A type
//! is classified into one of three shapes (see [`AbstractType`]):
//! - **proper**: mentions no inference variable
//! - **variable**: is itself a single inference-variable use
//! - **inference**: a composite (parameterized type, array, wildcard, ...)
//!   that mentions at least one variable

/// An interned type. Indexes into the [`TypeInterner`](crate::intern::TypeInterner).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The null type. Pre-interned at a fixed index.
    pub const NULL: TypeId = TypeId(0);
    pub const BOOLEAN: TypeId = TypeId(1);
    pub const BYTE: TypeId = TypeId(2);
    pub const SHORT: TypeId = TypeId(3);
    pub const CHAR: TypeId = TypeId(4);
    pub const INT: TypeId = TypeId(5);
    pub const LONG: TypeId = TypeId(6);
    pub const FLOAT: TypeId = TypeId(7);
    pub const DOUBLE: TypeId = TypeId(8);
}

/// An interned list of types (type arguments, intersection members).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeListId(pub u32);

impl TypeListId {
    /// The empty list. Pre-interned at index 0.
    pub const EMPTY: TypeListId = TypeListId(0);
}

/// A class or interface declaration in the [`ClassTable`](crate::class_hierarchy::ClassTable).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ClassId(pub u32);

/// A declared type parameter (of a class or of a method).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeParamId(pub u32);

/// An inference variable, indexing into the per-inference
/// [`VarStore`](crate::bounds::VarStore) arena.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VarId(pub u32);

/// Identity of a fresh type variable minted during capture conversion or
/// the resolution fallback.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FreshId(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }
}

/// The structural forms a type can take. All payloads are small copyable ids,
/// so `TypeData` itself is `Copy` and cheap to pass around.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeData {
    /// The null type.
    Null,
    Primitive(PrimitiveKind),
    /// A class or interface use. `args` is empty for a non-generic class and
    /// carries one entry per declared type parameter otherwise.
    Class { def: ClassId, args: TypeListId },
    /// Raw use of a generic class (`List` rather than `List<String>`).
    Raw(ClassId),
    Array(TypeId),
    /// A wildcard type argument. `(None, None)` is the unbound wildcard `?`.
    /// Only one of `upper`/`lower` is ever set.
    Wildcard {
        upper: Option<TypeId>,
        lower: Option<TypeId>,
    },
    /// A declared type variable (class or method type parameter).
    TypeVar(TypeParamId),
    /// A fresh type variable minted by capture conversion or by the
    /// resolution fallback. Bounds are part of its identity.
    Fresh {
        id: FreshId,
        upper: TypeId,
        lower: Option<TypeId>,
    },
    /// Intersection of the listed types.
    Intersection(TypeListId),
    /// A use of an inference variable.
    Use(VarId),
}

/// Classification of a type by whether and how it mentions inference
/// variables. This is the shape every reduction rule dispatches on first.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AbstractType {
    /// No inference variables anywhere in the type.
    Proper(TypeId),
    /// The type is exactly one inference-variable use.
    Variable(VarId),
    /// A composite type mentioning at least one inference variable.
    Inference(TypeId),
}

impl AbstractType {
    pub fn is_proper(self) -> bool {
        matches!(self, AbstractType::Proper(_))
    }

    pub fn is_variable(self) -> bool {
        matches!(self, AbstractType::Variable(_))
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
