//! Class hierarchy model and the structural oracle built on it.
//!
//! The engine itself only talks to the [`TypeOracle`] trait. This module
//! supplies the in-crate implementation: a [`ClassTable`] describing class
//! and method declarations, and [`HierarchyOracle`], which answers subtype,
//! supertype-search, lub/glb, capture and function-type queries structurally
//! over that table. Tests and simple embedders use it directly; a production
//! host can replace it wholesale.

use rustc_hash::FxHashMap;

use jinfer_common::{Atom, Interner};

use crate::intern::{TypeInterner, TypeList};
use crate::oracle::{FunctionSig, TypeOracle};
use crate::substitute::substitute_params;
use crate::types::{ClassId, PrimitiveKind, TypeData, TypeId, TypeParamId};

/// A method declaration in the [`ClassTable`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct MethodId(pub u32);

/// A declared type parameter. `upper` defaults to `Object` and may mention
/// other type parameters of the same declaration.
#[derive(Clone, Debug)]
pub struct TypeParamDecl {
    pub name: Atom,
    pub upper: TypeId,
}

/// A method signature, written in terms of its own `type_params` and the
/// type parameters of its owner.
#[derive(Clone, Debug)]
pub struct MethodSig {
    pub name: Atom,
    pub owner: Option<ClassId>,
    pub is_static: bool,
    pub type_params: Vec<TypeParamId>,
    pub params: Vec<TypeId>,
    /// `None` for void.
    pub ret: Option<TypeId>,
    pub thrown: Vec<TypeId>,
}

#[derive(Clone, Debug)]
pub struct ClassDef {
    pub name: Atom,
    pub type_params: Vec<TypeParamId>,
    /// Type parameters used only in producer position, whose arguments may
    /// widen in a subtype instead of matching exactly.
    pub covariant_params: Vec<TypeParamId>,
    /// Written in terms of this class's own type parameters.
    pub superclass: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub is_interface: bool,
    pub is_final: bool,
    /// The single abstract method, when this is a functional interface.
    pub functional_method: Option<MethodId>,
}

impl ClassDef {
    pub fn named(name: Atom) -> Self {
        Self {
            name,
            type_params: Vec::new(),
            covariant_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            is_interface: false,
            is_final: false,
            functional_method: None,
        }
    }
}

/// Declarations visible to one inference run: classes, type parameters, and
/// method signatures, all addressed by dense ids.
pub struct ClassTable {
    classes: Vec<ClassDef>,
    params: Vec<TypeParamDecl>,
    methods: Vec<MethodSig>,
    object: ClassId,
    runtime_exception: ClassId,
    boxes: FxHashMap<PrimitiveKind, ClassId>,
}

impl ClassTable {
    /// Creates a table pre-seeded with `Object` and `RuntimeException`.
    pub fn new(names: &Interner) -> Self {
        let mut table = Self {
            classes: Vec::new(),
            params: Vec::new(),
            methods: Vec::new(),
            object: ClassId(0),
            runtime_exception: ClassId(0),
            boxes: FxHashMap::default(),
        };
        table.object = table.add_class(ClassDef::named(names.intern("Object")));
        table.runtime_exception =
            table.add_class(ClassDef::named(names.intern("RuntimeException")));
        table
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(def);
        id
    }

    pub fn add_type_param(&mut self, decl: TypeParamDecl) -> TypeParamId {
        let id = TypeParamId(self.params.len() as u32);
        self.params.push(decl);
        id
    }

    pub fn add_method(&mut self, sig: MethodSig) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(sig);
        id
    }

    pub fn set_box(&mut self, kind: PrimitiveKind, class: ClassId) {
        self.boxes.insert(kind, class);
    }

    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0 as usize]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.0 as usize]
    }

    pub fn param(&self, id: TypeParamId) -> &TypeParamDecl {
        &self.params[id.0 as usize]
    }

    pub fn method(&self, id: MethodId) -> &MethodSig {
        &self.methods[id.0 as usize]
    }

    pub fn object_class(&self) -> ClassId {
        self.object
    }

    pub fn runtime_exception_class(&self) -> ClassId {
        self.runtime_exception
    }
}

/// Structural [`TypeOracle`] over a [`ClassTable`].
pub struct HierarchyOracle<'a> {
    table: &'a ClassTable,
    types: &'a TypeInterner,
}

impl<'a> HierarchyOracle<'a> {
    pub fn new(table: &'a ClassTable, types: &'a TypeInterner) -> Self {
        Self { table, types }
    }

    fn object_type(&self) -> TypeId {
        self.types.class(self.table.object_class(), &[])
    }

    /// The direct supertypes of a class use, with its type arguments
    /// substituted in.
    fn direct_supers(&self, def: ClassId, args: &[TypeId]) -> Vec<TypeId> {
        let cd = self.table.class(def);
        let map: FxHashMap<TypeParamId, TypeId> = cd
            .type_params
            .iter()
            .copied()
            .zip(args.iter().copied())
            .collect();
        let mut out = Vec::new();
        for &sup in cd.superclass.iter().chain(cd.interfaces.iter()) {
            out.push(substitute_params(self.types, sup, &map));
        }
        if out.is_empty() && def != self.table.object_class() {
            out.push(self.object_type());
        }
        out
    }

    /// Erasure-level ancestor test.
    fn is_ancestor(&self, def: ClassId, of: ClassId) -> bool {
        if def == of {
            return true;
        }
        let cd = self.table.class(def);
        let mut heads = Vec::new();
        for &sup in cd.superclass.iter().chain(cd.interfaces.iter()) {
            if let TypeData::Class { def: d, .. } | TypeData::Raw(d) = self.types.data(sup) {
                heads.push(d);
            }
        }
        if heads.is_empty() && def != self.table.object_class() {
            heads.push(self.table.object_class());
        }
        heads.into_iter().any(|d| self.is_ancestor(d, of))
    }

    /// Does type argument `s` satisfy argument position `t` under wildcard
    /// containment rules?
    fn contains(&self, s: TypeId, t: TypeId) -> bool {
        match self.types.data(t) {
            TypeData::Wildcard {
                upper: None,
                lower: None,
            } => true,
            TypeData::Wildcard {
                upper: Some(u),
                lower: None,
            } => match self.types.data(s) {
                TypeData::Wildcard {
                    upper, lower: None, ..
                } => self.is_subtype(upper.unwrap_or_else(|| self.object_type()), u),
                TypeData::Wildcard { lower: Some(_), .. } => u == self.object_type(),
                _ => self.is_subtype(s, u),
            },
            TypeData::Wildcard {
                lower: Some(l),
                upper: None,
            } => match self.types.data(s) {
                TypeData::Wildcard {
                    lower: Some(sl), ..
                } => self.is_subtype(l, sl),
                TypeData::Wildcard { .. } => false,
                _ => self.is_subtype(l, s),
            },
            // Invariant position: exact match.
            _ => s == t,
        }
    }

    /// Is argument position `i` of `cd` compared by subtyping rather than
    /// containment? Wildcards on either side keep the containment rules.
    fn covariant_position(&self, cd: &ClassDef, i: usize, s: TypeId, t: TypeId) -> bool {
        cd.type_params
            .get(i)
            .is_some_and(|p| cd.covariant_params.contains(p))
            && !matches!(self.types.data(s), TypeData::Wildcard { .. })
            && !matches!(self.types.data(t), TypeData::Wildcard { .. })
    }

    fn primitive_widens(&self, s: PrimitiveKind, t: PrimitiveKind) -> bool {
        use PrimitiveKind::*;
        if s == t {
            return true;
        }
        // char is a widening source but never a widening target.
        if matches!(t, Boolean | Byte | Char) || s == Boolean {
            return false;
        }
        let rank = |k: PrimitiveKind| match k {
            Byte => 0,
            Short | Char => 1,
            Int => 2,
            Long => 3,
            Float => 4,
            Double => 5,
            Boolean => 6,
        };
        rank(s) < rank(t)
    }

    fn ancestors_of(&self, t: TypeId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut stack = vec![t];
        while let Some(cur) = stack.pop() {
            match self.types.data(cur) {
                TypeData::Class { def, args } => {
                    if !out.contains(&def) {
                        out.push(def);
                        let args = self.types.list(args);
                        stack.extend(self.direct_supers(def, &args));
                    }
                }
                TypeData::Raw(def) => {
                    if !out.contains(&def) {
                        out.push(def);
                        stack.extend(self.direct_supers(def, &[]).iter().map(|&s| self.erasure(s)));
                    }
                }
                TypeData::TypeVar(p) => stack.push(self.table.param(p).upper),
                TypeData::Fresh { upper, .. } => stack.push(upper),
                TypeData::Intersection(list) => stack.extend(self.types.list(list)),
                TypeData::Array(_) => out.push(self.table.object_class()),
                _ => {}
            }
        }
        out
    }

    fn lub2(&self, a: TypeId, b: TypeId) -> TypeId {
        if self.is_subtype(a, b) {
            return b;
        }
        if self.is_subtype(b, a) {
            return a;
        }
        let a = self.box_primitive(a);
        let b = self.box_primitive(b);
        if self.is_subtype(a, b) {
            return b;
        }
        if self.is_subtype(b, a) {
            return a;
        }
        // First ancestor of `a` that is also an ancestor of `b`, in
        // nearest-first order.
        for anc in self.ancestors_of(a) {
            let (Some(sa), Some(sb)) = (self.as_super(a, anc), self.as_super(b, anc)) else {
                continue;
            };
            if sa == sb {
                return sa;
            }
            match (self.types.data(sa), self.types.data(sb)) {
                (
                    TypeData::Class { def, args: la },
                    TypeData::Class { args: lb, .. },
                ) => {
                    let la = self.types.list(la);
                    let lb = self.types.list(lb);
                    let merged: TypeList = la
                        .iter()
                        .zip(lb.iter())
                        .map(|(&x, &y)| {
                            if x == y {
                                x
                            } else {
                                self.types.wildcard_extends(self.lub2(
                                    self.wildcard_upper_or(x),
                                    self.wildcard_upper_or(y),
                                ))
                            }
                        })
                        .collect();
                    return self.types.class(def, &merged);
                }
                _ => return self.erasure(sa),
            }
        }
        self.object_type()
    }

    fn wildcard_upper_or(&self, t: TypeId) -> TypeId {
        match self.types.data(t) {
            TypeData::Wildcard { upper, .. } => upper.unwrap_or_else(|| self.object_type()),
            _ => t,
        }
    }

    fn glb2(&self, a: TypeId, b: TypeId) -> Option<TypeId> {
        if self.is_subtype(a, b) {
            return Some(a);
        }
        if self.is_subtype(b, a) {
            return Some(b);
        }
        let head = |t: TypeId| match self.types.data(t) {
            TypeData::Class { def, .. } | TypeData::Raw(def) => Some(def),
            _ => None,
        };
        if let (Some(ca), Some(cb)) = (head(a), head(b)) {
            // Two unrelated proper classes (not interfaces) have no common
            // subtype.
            if !self.table.class(ca).is_interface && !self.table.class(cb).is_interface {
                return None;
            }
        }
        Some(self.types.intersection(&[a, b]))
    }
}

impl TypeOracle for HierarchyOracle<'_> {
    fn is_same(&self, s: TypeId, t: TypeId) -> bool {
        s == t
    }

    fn is_subtype(&self, s: TypeId, t: TypeId) -> bool {
        if s == t {
            return true;
        }
        match (self.types.data(s), self.types.data(t)) {
            (TypeData::Null, d) => !matches!(d, TypeData::Primitive(_) | TypeData::Null),
            (TypeData::Primitive(a), TypeData::Primitive(b)) => self.primitive_widens(a, b),
            (TypeData::Primitive(_), _) | (_, TypeData::Primitive(_)) => false,
            (_, TypeData::Intersection(list)) => self
                .types
                .list(list)
                .iter()
                .all(|&m| self.is_subtype(s, m)),
            (TypeData::Intersection(list), _) => self
                .types
                .list(list)
                .iter()
                .any(|&m| self.is_subtype(m, t)),
            (TypeData::TypeVar(p), _) => self.is_subtype(self.table.param(p).upper, t),
            (TypeData::Fresh { upper, .. }, _) => self.is_subtype(upper, t),
            (_, TypeData::Fresh { lower, .. }) => {
                lower.is_some_and(|l| self.is_subtype(s, l))
            }
            (_, TypeData::TypeVar(_)) => false,
            (TypeData::Array(c1), TypeData::Array(c2)) => {
                let prim1 = matches!(self.types.data(c1), TypeData::Primitive(_));
                let prim2 = matches!(self.types.data(c2), TypeData::Primitive(_));
                if prim1 || prim2 {
                    c1 == c2
                } else {
                    self.is_subtype(c1, c2)
                }
            }
            (TypeData::Array(_), TypeData::Class { def, args }) => {
                def == self.table.object_class() && args == crate::types::TypeListId::EMPTY
            }
            (_, TypeData::Class { def, args }) => match self.as_super(s, def) {
                Some(sup) => match self.types.data(sup) {
                    TypeData::Class { args: sup_args, .. } => {
                        let want = self.types.list(args);
                        let have = self.types.list(sup_args);
                        let cd = self.table.class(def);
                        want.is_empty()
                            || (want.len() == have.len()
                                && have.iter().zip(want.iter()).enumerate().all(
                                    |(i, (&h, &w))| {
                                        if self.covariant_position(cd, i, h, w) {
                                            self.is_subtype(h, w)
                                        } else {
                                            self.contains(h, w)
                                        }
                                    },
                                ))
                    }
                    // Raw supertype is only accepted by the unchecked query.
                    TypeData::Raw(_) => self.types.list(args).is_empty(),
                    _ => false,
                },
                None => false,
            },
            (_, TypeData::Raw(def)) => self.as_super(s, def).is_some(),
            _ => false,
        }
    }

    fn is_subtype_unchecked(&self, s: TypeId, t: TypeId) -> bool {
        if self.is_subtype(s, t) {
            return true;
        }
        match self.types.data(t) {
            // A raw supertype reaches a parameterized target via one
            // unchecked conversion step.
            TypeData::Class { def, .. } => {
                matches!(self.as_super(s, def), Some(sup) if matches!(self.types.data(sup), TypeData::Raw(_)))
            }
            TypeData::Array(c2) => match self.types.data(s) {
                TypeData::Array(c1) => self.is_subtype_unchecked(c1, c2),
                _ => false,
            },
            _ => false,
        }
    }

    fn is_assignable(&self, s: TypeId, t: TypeId) -> bool {
        if self.is_subtype(s, t) {
            return true;
        }
        match (self.types.data(s), self.types.data(t)) {
            (TypeData::Primitive(_), _) => self.is_subtype(self.box_primitive(s), t),
            (_, TypeData::Primitive(_)) => s == self.box_primitive(t),
            _ => false,
        }
    }

    fn as_super(&self, s: TypeId, of: ClassId) -> Option<TypeId> {
        match self.types.data(s) {
            TypeData::Class { def, args } => {
                if def == of {
                    return Some(s);
                }
                let args = self.types.list(args);
                self.direct_supers(def, &args)
                    .into_iter()
                    .find_map(|sup| self.as_super(sup, of))
            }
            TypeData::Raw(def) => {
                if self.is_ancestor(def, of) {
                    if self.table.class(of).type_params.is_empty() {
                        Some(self.types.class(of, &[]))
                    } else {
                        Some(self.types.raw(of))
                    }
                } else {
                    None
                }
            }
            TypeData::Array(_) => {
                (of == self.table.object_class()).then(|| self.object_type())
            }
            TypeData::TypeVar(p) => self.as_super(self.table.param(p).upper, of),
            TypeData::Fresh { upper, .. } => self.as_super(upper, of),
            TypeData::Intersection(list) => self
                .types
                .list(list)
                .iter()
                .find_map(|&m| self.as_super(m, of)),
            TypeData::Null => None,
            _ => None,
        }
    }

    fn erasure(&self, t: TypeId) -> TypeId {
        match self.types.data(t) {
            TypeData::Class { def, .. } => {
                if self.table.class(def).type_params.is_empty() {
                    t
                } else {
                    self.types.raw(def)
                }
            }
            TypeData::Array(c) => self.types.array(self.erasure(c)),
            TypeData::TypeVar(p) => self.erasure(self.table.param(p).upper),
            TypeData::Fresh { upper, .. } => self.erasure(upper),
            TypeData::Intersection(list) => {
                let members = self.types.list(list);
                members
                    .first()
                    .map(|&m| self.erasure(m))
                    .unwrap_or_else(|| self.object_type())
            }
            _ => t,
        }
    }

    fn box_primitive(&self, t: TypeId) -> TypeId {
        match self.types.data(t) {
            TypeData::Primitive(kind) => match self.table.boxes.get(&kind) {
                Some(&class) => self.types.class(class, &[]),
                None => t,
            },
            _ => t,
        }
    }

    fn lub(&self, ts: &[TypeId]) -> TypeId {
        let mut relevant: Vec<TypeId> = ts
            .iter()
            .copied()
            .filter(|&t| t != TypeId::NULL)
            .collect();
        relevant.dedup();
        match relevant.len() {
            0 => TypeId::NULL,
            1 => relevant[0],
            _ => {
                let mut acc = relevant[0];
                for &t in &relevant[1..] {
                    acc = self.lub2(acc, t);
                }
                acc
            }
        }
    }

    fn glb(&self, ts: &[TypeId]) -> Option<TypeId> {
        let mut relevant: Vec<TypeId> = ts.to_vec();
        relevant.dedup();
        let mut acc = *relevant.first()?;
        for &t in &relevant[1..] {
            acc = self.glb2(acc, t)?;
        }
        Some(acc)
    }

    fn capture(&self, t: TypeId) -> TypeId {
        let TypeData::Class { def, args } = self.types.data(t) else {
            return t;
        };
        let args = self.types.list(args);
        let cd = self.table.class(def);
        if args.len() != cd.type_params.len() {
            return t;
        }
        // Declared bounds are substituted with the pre-capture arguments,
        // widening wildcard arguments to their upper bound.
        let map: FxHashMap<TypeParamId, TypeId> = cd
            .type_params
            .iter()
            .copied()
            .zip(args.iter().map(|&a| self.wildcard_upper_or(a)))
            .collect();
        let captured: TypeList = cd
            .type_params
            .iter()
            .zip(args.iter())
            .map(|(&p, &a)| match self.types.data(a) {
                TypeData::Wildcard { upper, lower } => {
                    let declared = substitute_params(self.types, self.table.param(p).upper, &map);
                    let cap_upper = match upper {
                        Some(u) if u != self.object_type() => u,
                        _ => declared,
                    };
                    self.types.fresh(cap_upper, lower)
                }
                _ => a,
            })
            .collect();
        self.types.class(def, &captured)
    }

    fn function_type(&self, t: TypeId) -> Option<FunctionSig> {
        match self.types.data(t) {
            TypeData::Class { def, args } => {
                let cd = self.table.class(def);
                let m = self.table.method(cd.functional_method?);
                let args = self.types.list(args);
                let map: FxHashMap<TypeParamId, TypeId> = cd
                    .type_params
                    .iter()
                    .copied()
                    .zip(args.iter().copied())
                    .collect();
                Some(FunctionSig {
                    params: m
                        .params
                        .iter()
                        .map(|&p| substitute_params(self.types, p, &map))
                        .collect(),
                    ret: m.ret.map(|r| substitute_params(self.types, r, &map)),
                    thrown: m
                        .thrown
                        .iter()
                        .map(|&x| substitute_params(self.types, x, &map))
                        .collect(),
                })
            }
            TypeData::Raw(def) => {
                let cd = self.table.class(def);
                let m = self.table.method(cd.functional_method?);
                let map: FxHashMap<TypeParamId, TypeId> = cd
                    .type_params
                    .iter()
                    .map(|&p| (p, self.erasure(self.table.param(p).upper)))
                    .collect();
                Some(FunctionSig {
                    params: m
                        .params
                        .iter()
                        .map(|&p| substitute_params(self.types, p, &map))
                        .collect(),
                    ret: m.ret.map(|r| substitute_params(self.types, r, &map)),
                    thrown: m
                        .thrown
                        .iter()
                        .map(|&x| substitute_params(self.types, x, &map))
                        .collect(),
                })
            }
            TypeData::Intersection(list) => self
                .types
                .list(list)
                .iter()
                .find_map(|&m| self.function_type(m)),
            _ => None,
        }
    }

    fn non_wildcard_parameterization(&self, t: TypeId) -> TypeId {
        let TypeData::Class { def, args } = self.types.data(t) else {
            return t;
        };
        let args = self.types.list(args);
        let cd = self.table.class(def);
        if args.len() != cd.type_params.len() {
            return t;
        }
        let grounded: TypeList = cd
            .type_params
            .iter()
            .zip(args.iter())
            .map(|(&p, &a)| match self.types.data(a) {
                TypeData::Wildcard { upper: None, lower: None } => self.table.param(p).upper,
                TypeData::Wildcard { upper: Some(u), .. } => {
                    let declared = self.table.param(p).upper;
                    if declared == self.object_type() {
                        u
                    } else {
                        self.glb2(u, declared).unwrap_or(u)
                    }
                }
                TypeData::Wildcard { lower: Some(l), .. } => l,
                _ => a,
            })
            .collect();
        self.types.class(def, &grounded)
    }

    fn declared_upper(&self, p: TypeParamId) -> TypeId {
        self.table.param(p).upper
    }

    fn object(&self) -> TypeId {
        self.object_type()
    }

    fn runtime_exception(&self) -> TypeId {
        self.types.class(self.table.runtime_exception_class(), &[])
    }
}

#[cfg(test)]
#[path = "../tests/class_hierarchy_tests.rs"]
mod tests;
