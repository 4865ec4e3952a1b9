//! The assignability preorder (spec §3.2 and §4.4's narrowing rules
//! lean on it): "is a value of type `from` usable where `to` is
//! expected".
//!
//! This is a preorder, not an equivalence: `T` is assignable to `T |
//! null` but not the reverse, and `never` is assignable to everything
//! while accepting nothing back.

use crate::ty::{PrimitiveKind, Type, TypeId};
use crate::universe::TypeUniverse;

impl TypeUniverse {
    /// Is a value typed `from` usable wherever `to` is expected?
    #[must_use]
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        if let Some(cached) = self.cached_assignability(from, to) {
            return cached;
        }
        let result = self.is_assignable_uncached(from, to);
        self.cache_assignability(from, to, result);
        result
    }

    fn is_assignable_uncached(&self, from: TypeId, to: TypeId) -> bool {
        // Transparent aliases are structural: unwrap before comparing.
        // Distinct aliases are nominal and only cross via an explicit
        // cast, so they fall through to the identity check already done
        // above and nothing else.
        if let Type::TypeAlias(alias) = self.get(from) {
            if !alias.is_distinct {
                return self.is_assignable(alias.target, to);
            }
        }
        if let Type::TypeAlias(alias) = self.get(to) {
            if !alias.is_distinct {
                return self.is_assignable(from, alias.target);
            }
        }

        if matches!(self.get(from), Type::Primitive(PrimitiveKind::Never)) {
            return true;
        }
        if matches!(self.get(to), Type::Primitive(PrimitiveKind::Any)) {
            return true;
        }
        if matches!(self.get(to), Type::Primitive(PrimitiveKind::AnyRef)) {
            return !self.is_unboxed_scalar(from);
        }

        if let Type::Union(to_members) = self.get(to) {
            return match self.get(from) {
                Type::Union(from_members) => from_members
                    .clone()
                    .into_iter()
                    .all(|m| self.is_assignable(m, to)),
                _ => to_members.iter().any(|&m| self.is_assignable(from, m)),
            };
        }
        if let Type::Union(from_members) = self.get(from) {
            // `to` is not a union (handled above): every member must fit.
            return from_members
                .clone()
                .into_iter()
                .all(|m| self.is_assignable(m, to));
        }

        match (self.get(from).clone(), self.get(to).clone()) {
            (Type::Class(_), Type::Class(_)) => self.class_extends(from, to),
            (Type::Class(_) | Type::Interface(_), Type::Interface(_)) => {
                self.implements_interface(from, to)
            }
            (Type::Function(f), Type::Function(g)) => {
                f.parameters.len() == g.parameters.len()
                    && f.parameters
                        .iter()
                        .zip(g.parameters.iter())
                        .all(|(&fp, &gp)| self.is_assignable(gp, fp))
                    && self.is_assignable(f.return_type, g.return_type)
            }
            _ => false,
        }
    }

    /// Walks `from`'s superclass chain looking for `to` by identity.
    fn class_extends(&self, from: TypeId, to: TypeId) -> bool {
        let mut current = from;
        while let Some(class) = self.as_class(current) {
            match class.super_class {
                Some(parent) if parent == to => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// Does `from` (a class or interface) implement/extend `to` (an
    /// interface), directly or transitively, including through
    /// superclasses?
    fn implements_interface(&self, from: TypeId, to: TypeId) -> bool {
        if let Some(class) = self.as_class(from) {
            if class.implements.iter().any(|&i| i == to || self.interface_extends(i, to)) {
                return true;
            }
            if let Some(parent) = class.super_class {
                return self.implements_interface(parent, to);
            }
            return false;
        }
        if self.as_interface(from).is_some() {
            return from == to || self.interface_extends(from, to);
        }
        false
    }

    fn interface_extends(&self, from: TypeId, to: TypeId) -> bool {
        let Some(interface) = self.as_interface(from) else {
            return false;
        };
        interface
            .parent_interfaces
            .iter()
            .any(|&p| p == to || self.interface_extends(p, to))
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashMap;
    use zena_ast::ModuleId;

    use crate::ty::ClassType;

    use super::*;

    fn empty_class(name: &str, super_class: Option<TypeId>, implements: Vec<TypeId>) -> ClassType {
        ClassType {
            name: name.into(),
            module: ModuleId(0),
            fields: Vec::new(),
            methods: FxHashMap::default(),
            constructor_type: None,
            super_class,
            implements,
            type_parameters: Vec::new(),
            type_arguments: None,
            generic_source: None,
            is_final: false,
            is_extension: false,
            on_type: None,
        }
    }

    #[test]
    fn identity_is_always_assignable() {
        let u = TypeUniverse::new();
        assert!(u.is_assignable(u.i32(), u.i32()));
    }

    #[test]
    fn never_is_bottom_and_any_is_top() {
        let u = TypeUniverse::new();
        assert!(u.is_assignable(u.never(), u.i32()));
        assert!(u.is_assignable(u.i32(), u.any()));
        assert!(!u.is_assignable(u.any(), u.i32()));
    }

    #[test]
    fn scalar_is_not_assignable_to_anyref_without_boxing() {
        let u = TypeUniverse::new();
        assert!(!u.is_assignable(u.i32(), u.primitive(PrimitiveKind::AnyRef)));
        assert!(u.is_assignable(u.string(), u.primitive(PrimitiveKind::AnyRef)));
    }

    #[test]
    fn t_is_assignable_to_t_or_null_but_not_reverse() {
        let mut u = TypeUniverse::new();
        let nullable = u.union_of(vec![u.i32(), u.null()]);
        assert!(u.is_assignable(u.i32(), nullable));
        assert!(!u.is_assignable(nullable, u.i32()));
    }

    #[test]
    fn subclass_is_assignable_to_superclass() {
        let mut u = TypeUniverse::new();
        let base = u.reserve();
        u.populate(base, Type::Class(empty_class("Animal", None, Vec::new())));
        let derived = u.reserve();
        u.populate(derived, Type::Class(empty_class("Dog", Some(base), Vec::new())));
        assert!(u.is_assignable(derived, base));
        assert!(!u.is_assignable(base, derived));
    }

    #[test]
    fn class_is_assignable_to_implemented_interface() {
        let mut u = TypeUniverse::new();
        let iface = u.reserve();
        u.populate(
            iface,
            Type::Interface(crate::ty::InterfaceType {
                name: "Greets".into(),
                module: ModuleId(0),
                methods: FxHashMap::default(),
                properties: FxHashMap::default(),
                parent_interfaces: Vec::new(),
                type_parameters: Vec::new(),
                type_arguments: None,
                generic_source: None,
            }),
        );
        let class = u.reserve();
        u.populate(class, Type::Class(empty_class("Greeter", None, vec![iface])));
        assert!(u.is_assignable(class, iface));
    }

    #[test]
    fn function_parameters_are_contravariant_and_return_is_covariant() {
        let mut u = TypeUniverse::new();
        let base = u.reserve();
        u.populate(base, Type::Class(empty_class("Animal", None, Vec::new())));
        let derived = u.reserve();
        u.populate(derived, Type::Class(empty_class("Dog", Some(base), Vec::new())));

        let narrow_param_fn = u.new_function(vec![derived], derived);
        let wide_param_fn = u.new_function(vec![base], base);
        // `(Animal) -> Animal` fits where `(Dog) -> Dog` is expected:
        // callers only ever pass a `Dog`, and get back something that is
        // at least an `Animal`.
        assert!(u.is_assignable(wide_param_fn, narrow_param_fn));
        assert!(!u.is_assignable(narrow_param_fn, wide_param_fn));
    }
}
