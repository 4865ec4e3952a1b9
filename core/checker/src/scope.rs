//! Function-local lexical scopes (spec §4.4). Module- and type-name
//! resolution already happened in Phase A ([`crate::env`]); this only
//! tracks locals introduced by parameters, `let`, and catch bindings
//! within one function or method body.
//!
//! Flow narrowing (`if (x is T)`, `if (x !== null)`) is modeled as an
//! ordinary nested scope: the narrowed branch pushes a frame that
//! shadows the identifier with its narrowed type, and popping the frame
//! on exit from the branch is what "restores" the wider type — no
//! separate undo bookkeeping is needed.

use rustc_hash::FxHashMap;
use zena_types::TypeId;

#[derive(Clone, Copy, Debug)]
pub struct Binding {
    pub ty: TypeId,
    pub is_mut: bool,
}

pub struct Scopes {
    frames: Vec<FxHashMap<String, Binding>>,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![FxHashMap::default()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
        debug_assert!(!self.frames.is_empty(), "popped the function's outermost frame");
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: TypeId, is_mut: bool) {
        self.frames
            .last_mut()
            .expect("at least one frame")
            .insert(name.into(), Binding { ty, is_mut });
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.frames.iter().rev().find_map(|f| f.get(name).copied())
    }

    /// Declares a narrowed binding for `name` in a freshly pushed frame.
    /// The caller pops the frame when the narrowed region ends.
    pub fn narrow(&mut self, name: &str, ty: TypeId) {
        let is_mut = self.lookup(name).is_some_and(|b| b.is_mut);
        self.push();
        self.declare(name, ty, is_mut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zena_types::TypeUniverse;

    #[test]
    fn narrowing_is_undone_when_the_frame_pops() {
        let u = TypeUniverse::new();
        let mut scopes = Scopes::new();
        let wide = u.any();
        let narrow_ty = u.i32();
        scopes.declare("x", wide, false);
        scopes.narrow("x", narrow_ty);
        assert_eq!(scopes.lookup("x").unwrap().ty, narrow_ty);
        scopes.pop();
        assert_eq!(scopes.lookup("x").unwrap().ty, wide);
    }

    #[test]
    fn inner_let_shadows_outer_without_losing_it_on_pop() {
        let u = TypeUniverse::new();
        let mut scopes = Scopes::new();
        let outer = u.i32();
        let inner = u.any();
        scopes.declare("x", outer, false);
        scopes.push();
        scopes.declare("x", inner, true);
        assert_eq!(scopes.lookup("x").unwrap().ty, inner);
        scopes.pop();
        assert_eq!(scopes.lookup("x").unwrap().ty, outer);
    }
}
