//! String interning for identifier deduplication.
//!
//! Identifiers (class names, type parameter names, qualifier names) are
//! interned once and referred to by a small copyable [`Atom`]. Equality and
//! hashing on an `Atom` are O(1) integer operations, which matters because
//! the solver compares names on every hierarchy walk.

use std::sync::RwLock;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

/// An interned string, represented as an index into the [`Interner`].
///
/// Atoms are only meaningful relative to the interner that produced them.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Atom(pub u32);

/// Thread-safe string interner.
///
/// Interning takes `&self` so the interner can be shared behind a plain
/// reference; the reverse table is append-only.
pub struct Interner {
    map: DashMap<Box<str>, Atom, FxBuildHasher>,
    strings: RwLock<Vec<Box<str>>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(FxBuildHasher),
            strings: RwLock::new(Vec::new()),
        }
    }

    /// Interns `s`, returning the existing atom if it was seen before.
    pub fn intern(&self, s: &str) -> Atom {
        if let Some(atom) = self.map.get(s) {
            return *atom;
        }
        let mut strings = self.strings.write().unwrap();
        // Double-check under the write lock: another thread may have
        // inserted between the lookup above and acquiring the lock.
        if let Some(atom) = self.map.get(s) {
            return *atom;
        }
        let atom = Atom(strings.len() as u32);
        strings.push(s.into());
        self.map.insert(s.into(), atom);
        atom
    }

    /// Returns the string for `atom`.
    ///
    /// # Panics
    ///
    /// Panics if `atom` came from a different interner.
    pub fn resolve(&self, atom: Atom) -> String {
        self.strings.read().unwrap()[atom.0 as usize].to_string()
    }

    pub fn len(&self) -> usize {
        self.strings.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
