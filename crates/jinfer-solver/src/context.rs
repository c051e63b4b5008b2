//! Per-call inference context.
//!
//! [`InferenceContext`] bundles everything one inference run needs: the
//! stateless collaborators (type interner, the two host oracles, the
//! expression arena, the declaration table) and the per-call mutable scratch
//! state (the variable stores). Splitting the two means tests can hand in
//! fake oracles while the solver code only ever threads a single `&mut ctx`.

use rustc_hash::FxHashMap;

use jinfer_common::Interner;

use crate::bounds::VarStore;
use crate::class_hierarchy::ClassTable;
use crate::expression::ExprArena;
use crate::intern::TypeInterner;
use crate::oracle::{QualifierOracle, TypeOracle};
use crate::qualifiers::{AbstractQualifier, QualVarStore};
use crate::substitute::substitute_vars;
use crate::types::{TypeData, TypeId, TypeParamId, VarId};

pub struct InferenceContext<'a> {
    pub interner: &'a TypeInterner,
    pub names: &'a Interner,
    pub oracle: &'a dyn TypeOracle,
    pub quals: &'a dyn QualifierOracle,
    pub exprs: &'a ExprArena,
    pub table: &'a ClassTable,
    pub vars: VarStore,
    pub qual_vars: QualVarStore,
    /// Current nesting depth of inference-within-inference.
    pub(crate) depth: u32,
}

impl<'a> InferenceContext<'a> {
    pub fn new(
        interner: &'a TypeInterner,
        names: &'a Interner,
        oracle: &'a dyn TypeOracle,
        quals: &'a dyn QualifierOracle,
        exprs: &'a ExprArena,
        table: &'a ClassTable,
    ) -> Self {
        Self {
            interner,
            names,
            oracle,
            quals,
            exprs,
            table,
            vars: VarStore::new(),
            qual_vars: QualVarStore::new(),
            depth: 0,
        }
    }

    pub fn new_var(&mut self, param: TypeParamId) -> VarId {
        self.vars.alloc(param)
    }

    /// `t` with every instantiated variable replaced by its instantiation.
    pub fn apply_instantiations(&self, t: TypeId) -> TypeId {
        substitute_vars(self.interner, t, &|v| self.vars.get(v).instantiation)
    }

    /// Like [`apply_instantiations`](Self::apply_instantiations); named for
    /// the call sites that need a proper type to hand to the oracle and
    /// accept whatever is resolved so far.
    pub fn proper_view(&self, t: TypeId) -> TypeId {
        self.apply_instantiations(t)
    }

    /// Substitutes `map` (type parameter -> type) through `t`.
    pub fn theta_apply(&self, t: TypeId, map: &FxHashMap<TypeParamId, TypeId>) -> TypeId {
        crate::substitute::substitute_params(self.interner, t, map)
    }

    // ============================================================
    // Display helpers (diagnostics and trace logs)
    // ============================================================

    pub fn display_type(&self, t: TypeId) -> String {
        match self.interner.data(t) {
            TypeData::Null => "null".to_string(),
            TypeData::Primitive(kind) => kind.name().to_string(),
            TypeData::Class { def, args } => {
                let name = self.names.resolve(self.table.class(def).name);
                let args = self.interner.list(args);
                if args.is_empty() {
                    name
                } else {
                    let inner: Vec<String> =
                        args.iter().map(|&a| self.display_type(a)).collect();
                    format!("{}<{}>", name, inner.join(", "))
                }
            }
            TypeData::Raw(def) => self.names.resolve(self.table.class(def).name),
            TypeData::Array(c) => format!("{}[]", self.display_type(c)),
            TypeData::Wildcard { upper: None, lower: None } => "?".to_string(),
            TypeData::Wildcard { upper: Some(u), .. } => {
                format!("? extends {}", self.display_type(u))
            }
            TypeData::Wildcard { lower: Some(l), .. } => {
                format!("? super {}", self.display_type(l))
            }
            TypeData::TypeVar(p) => self.names.resolve(self.table.param(p).name),
            TypeData::Fresh { id, upper, .. } => {
                format!("cap#{}<: {}", id.0, self.display_type(upper))
            }
            TypeData::Intersection(list) => {
                let members: Vec<String> = self
                    .interner
                    .list(list)
                    .iter()
                    .map(|&m| self.display_type(m))
                    .collect();
                members.join(" & ")
            }
            TypeData::Use(v) => format!("\u{3b1}{}", v.0),
        }
    }

    pub fn display_qual(&self, q: AbstractQualifier) -> String {
        match q {
            AbstractQualifier::Concrete(qual) => format!("@{}", self.names.resolve(qual.0)),
            AbstractQualifier::Variable(v) => format!("@poly{}", v.0),
        }
    }
}
