//! Type interning.
//!
//! The [`TypeInterner`] deduplicates [`TypeData`] values and hands out dense
//! [`TypeId`]s. All methods take `&self`: interning is append-only and
//! internally synchronized, so the interner can be shared behind a plain
//! reference for the lifetime of an inference run.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use smallvec::SmallVec;

use jinfer_common::limits::TYPE_ARGS_INLINE;

use crate::types::{
    AbstractType, ClassId, FreshId, PrimitiveKind, TypeData, TypeId, TypeListId, TypeParamId, VarId,
};

pub type TypeList = SmallVec<[TypeId; TYPE_ARGS_INLINE]>;

pub struct TypeInterner {
    map: DashMap<TypeData, TypeId, FxBuildHasher>,
    types: RwLock<Vec<TypeData>>,
    list_map: DashMap<TypeList, TypeListId, FxBuildHasher>,
    lists: RwLock<Vec<TypeList>>,
    fresh_counter: AtomicU32,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        let interner = Self {
            map: DashMap::with_hasher(FxBuildHasher),
            types: RwLock::new(Vec::new()),
            list_map: DashMap::with_hasher(FxBuildHasher),
            lists: RwLock::new(Vec::new()),
            fresh_counter: AtomicU32::new(0),
        };
        // Pre-intern the well-known ids in the order the TypeId constants
        // declare. The unit test below guards this ordering.
        interner.intern(TypeData::Null);
        for kind in PrimitiveKind::ALL {
            interner.intern(TypeData::Primitive(kind));
        }
        interner.intern_list(&[]);
        interner
    }

    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = self.map.get(&data) {
            return *id;
        }
        let mut types = self.types.write().unwrap();
        if let Some(id) = self.map.get(&data) {
            return *id;
        }
        let id = TypeId(types.len() as u32);
        types.push(data);
        self.map.insert(data, id);
        id
    }

    /// The structural form of `id`. `TypeData` is `Copy`, so this hands out
    /// a value, not a guard.
    pub fn data(&self, id: TypeId) -> TypeData {
        self.types.read().unwrap()[id.0 as usize]
    }

    pub fn intern_list(&self, types: &[TypeId]) -> TypeListId {
        let key: TypeList = types.iter().copied().collect();
        if let Some(id) = self.list_map.get(&key) {
            return *id;
        }
        let mut lists = self.lists.write().unwrap();
        if let Some(id) = self.list_map.get(&key) {
            return *id;
        }
        let id = TypeListId(lists.len() as u32);
        lists.push(key.clone());
        self.list_map.insert(key, id);
        id
    }

    pub fn list(&self, id: TypeListId) -> TypeList {
        self.lists.read().unwrap()[id.0 as usize].clone()
    }

    pub fn fresh_id(&self) -> FreshId {
        FreshId(self.fresh_counter.fetch_add(1, Ordering::Relaxed))
    }

    // ============================================================
    // Construction helpers
    // ============================================================

    pub fn class(&self, def: ClassId, args: &[TypeId]) -> TypeId {
        let args = self.intern_list(args);
        self.intern(TypeData::Class { def, args })
    }

    pub fn raw(&self, def: ClassId) -> TypeId {
        self.intern(TypeData::Raw(def))
    }

    pub fn array(&self, component: TypeId) -> TypeId {
        self.intern(TypeData::Array(component))
    }

    pub fn wildcard(&self) -> TypeId {
        self.intern(TypeData::Wildcard {
            upper: None,
            lower: None,
        })
    }

    pub fn wildcard_extends(&self, upper: TypeId) -> TypeId {
        self.intern(TypeData::Wildcard {
            upper: Some(upper),
            lower: None,
        })
    }

    pub fn wildcard_super(&self, lower: TypeId) -> TypeId {
        self.intern(TypeData::Wildcard {
            upper: None,
            lower: Some(lower),
        })
    }

    pub fn type_var(&self, param: TypeParamId) -> TypeId {
        self.intern(TypeData::TypeVar(param))
    }

    pub fn use_of(&self, var: VarId) -> TypeId {
        self.intern(TypeData::Use(var))
    }

    pub fn fresh(&self, upper: TypeId, lower: Option<TypeId>) -> TypeId {
        self.intern(TypeData::Fresh {
            id: self.fresh_id(),
            upper,
            lower,
        })
    }

    pub fn intersection(&self, members: &[TypeId]) -> TypeId {
        let mut sorted: TypeList = members.iter().copied().collect();
        sorted.sort();
        sorted.dedup();
        if sorted.len() == 1 {
            return sorted[0];
        }
        let list = self.intern_list(&sorted);
        self.intern(TypeData::Intersection(list))
    }

    // ============================================================
    // Variable-mention queries
    // ============================================================

    /// Does `id` mention any inference variable anywhere?
    pub fn mentions_vars(&self, id: TypeId) -> bool {
        match self.data(id) {
            TypeData::Use(_) => true,
            TypeData::Null | TypeData::Primitive(_) | TypeData::Raw(_) | TypeData::TypeVar(_) => {
                false
            }
            TypeData::Class { args, .. } => {
                self.list(args).iter().any(|&a| self.mentions_vars(a))
            }
            TypeData::Array(c) => self.mentions_vars(c),
            TypeData::Wildcard { upper, lower } => {
                upper.is_some_and(|u| self.mentions_vars(u))
                    || lower.is_some_and(|l| self.mentions_vars(l))
            }
            TypeData::Fresh { upper, lower, .. } => {
                self.mentions_vars(upper) || lower.is_some_and(|l| self.mentions_vars(l))
            }
            TypeData::Intersection(list) => {
                self.list(list).iter().any(|&m| self.mentions_vars(m))
            }
        }
    }

    /// Collects every inference variable mentioned in `id` into `out`.
    pub fn collect_vars(&self, id: TypeId, out: &mut FxHashSet<VarId>) {
        match self.data(id) {
            TypeData::Use(v) => {
                out.insert(v);
            }
            TypeData::Null | TypeData::Primitive(_) | TypeData::Raw(_) | TypeData::TypeVar(_) => {}
            TypeData::Class { args, .. } => {
                for a in self.list(args) {
                    self.collect_vars(a, out);
                }
            }
            TypeData::Array(c) => self.collect_vars(c, out),
            TypeData::Wildcard { upper, lower } => {
                if let Some(u) = upper {
                    self.collect_vars(u, out);
                }
                if let Some(l) = lower {
                    self.collect_vars(l, out);
                }
            }
            TypeData::Fresh { upper, lower, .. } => {
                self.collect_vars(upper, out);
                if let Some(l) = lower {
                    self.collect_vars(l, out);
                }
            }
            TypeData::Intersection(list) => {
                for m in self.list(list) {
                    self.collect_vars(m, out);
                }
            }
        }
    }

    /// Classifies `id` into proper / variable / inference shape.
    pub fn classify(&self, id: TypeId) -> AbstractType {
        match self.data(id) {
            TypeData::Use(v) => AbstractType::Variable(v),
            _ if self.mentions_vars(id) => AbstractType::Inference(id),
            _ => AbstractType::Proper(id),
        }
    }

    /// Is `id` a parameterized class type with at least one wildcard argument?
    pub fn is_wildcard_parameterized(&self, id: TypeId) -> bool {
        match self.data(id) {
            TypeData::Class { args, .. } => self
                .list(args)
                .iter()
                .any(|&a| matches!(self.data(a), TypeData::Wildcard { .. })),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
