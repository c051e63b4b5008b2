//! Type substitution.
//!
//! Two substitutions run constantly during inference:
//! - theta application: declared type parameters replaced by inference
//!   variable uses when a call's variable map is built, and by concrete
//!   arguments during hierarchy walks;
//! - instantiation application: inference-variable uses replaced by their
//!   resolved proper types as resolution progresses.
//!
//! Both rebuild the type bottom-up through the interner, so an unchanged
//! type substitutes to the identical `TypeId` (which is what makes repeated
//! application a no-op).

use rustc_hash::FxHashMap;

use crate::intern::{TypeInterner, TypeList};
use crate::types::{TypeData, TypeId, TypeParamId, VarId};

/// Replaces declared type-variable uses per `map`.
pub fn substitute_params(
    types: &TypeInterner,
    t: TypeId,
    map: &FxHashMap<TypeParamId, TypeId>,
) -> TypeId {
    if map.is_empty() {
        return t;
    }
    rebuild(types, t, &mut |data| match data {
        TypeData::TypeVar(p) => map.get(&p).copied(),
        _ => None,
    })
}

/// Replaces inference-variable uses by whatever `lookup` returns for them.
/// Variables with no mapping are left in place.
pub fn substitute_vars<F>(types: &TypeInterner, t: TypeId, lookup: &F) -> TypeId
where
    F: Fn(VarId) -> Option<TypeId>,
{
    rebuild(types, t, &mut |data| match data {
        TypeData::Use(v) => lookup(v),
        _ => None,
    })
}

/// Rebuilds `t` bottom-up, letting `leaf` replace whole nodes. `leaf`
/// returning `None` means "recurse structurally".
fn rebuild<F>(types: &TypeInterner, t: TypeId, leaf: &mut F) -> TypeId
where
    F: FnMut(TypeData) -> Option<TypeId>,
{
    let data = types.data(t);
    if let Some(replacement) = leaf(data) {
        return replacement;
    }
    match data {
        TypeData::Null
        | TypeData::Primitive(_)
        | TypeData::Raw(_)
        | TypeData::TypeVar(_)
        | TypeData::Use(_) => t,
        TypeData::Class { def, args } => {
            let list = types.list(args);
            let new: TypeList = list.iter().map(|&a| rebuild(types, a, leaf)).collect();
            if new[..] == list[..] {
                t
            } else {
                types.class(def, &new)
            }
        }
        TypeData::Array(c) => {
            let new = rebuild(types, c, leaf);
            if new == c { t } else { types.array(new) }
        }
        TypeData::Wildcard { upper, lower } => {
            let new_upper = upper.map(|u| rebuild(types, u, leaf));
            let new_lower = lower.map(|l| rebuild(types, l, leaf));
            if new_upper == upper && new_lower == lower {
                t
            } else {
                types.intern(TypeData::Wildcard {
                    upper: new_upper,
                    lower: new_lower,
                })
            }
        }
        TypeData::Fresh { id, upper, lower } => {
            let new_upper = rebuild(types, upper, leaf);
            let new_lower = lower.map(|l| rebuild(types, l, leaf));
            if new_upper == upper && new_lower == lower {
                t
            } else {
                // Identity of the capture variable is preserved; only its
                // bounds are substituted through.
                types.intern(TypeData::Fresh {
                    id,
                    upper: new_upper,
                    lower: new_lower,
                })
            }
        }
        TypeData::Intersection(list_id) => {
            let list = types.list(list_id);
            let new: TypeList = list.iter().map(|&m| rebuild(types, m, leaf)).collect();
            if new[..] == list[..] {
                t
            } else {
                types.intersection(&new)
            }
        }
    }
}
