//! [`TypeUniverse`]: the single owner of every [`Type`] in a compile.

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use zena_ast::ModuleId;

use crate::errors::TypeUniverseError;
use crate::ty::{
    ArrayType, ClassType, EnumType, FieldInfo, FunctionType, InterfaceType, PrimitiveKind,
    RecordType, Type, TypeAliasType, TypeId, TypeParameterType,
};

/// Canonical interning key. Two distinct syntactic occurrences that
/// produce the same key are guaranteed to collapse to one [`TypeId`] —
/// this is the table from spec §3.2.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum InternKey {
    Primitive(PrimitiveKind),
    Str,
    ClassInstance(TypeId, Vec<TypeId>),
    InterfaceInstance(TypeId, Vec<TypeId>),
    AliasInstance(TypeId, Vec<TypeId>),
    Record(Vec<(String, TypeId)>),
    Union(Vec<TypeId>),
    Array(TypeId),
    UnboxedTuple(Vec<TypeId>),
}

pub struct TypeUniverse {
    types: Vec<Type>,
    interner: FxHashMap<InternKey, TypeId>,
    primitives: FxHashMap<PrimitiveKind, TypeId>,
    string_id: TypeId,
    null_id: TypeId,
    next_declaration_site: u32,
    assignability_cache: RefCell<FxHashMap<(TypeId, TypeId), bool>>,
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeUniverse {
    #[must_use]
    pub fn new() -> Self {
        let mut universe = Self {
            types: Vec::new(),
            interner: FxHashMap::default(),
            primitives: FxHashMap::default(),
            string_id: TypeId(0),
            null_id: TypeId(0),
            next_declaration_site: 0,
            assignability_cache: RefCell::new(FxHashMap::default()),
        };
        for kind in [
            PrimitiveKind::I32,
            PrimitiveKind::I64,
            PrimitiveKind::F32,
            PrimitiveKind::F64,
            PrimitiveKind::Boolean,
            PrimitiveKind::Void,
            PrimitiveKind::Never,
            PrimitiveKind::Any,
            PrimitiveKind::AnyRef,
            PrimitiveKind::ByteArray,
        ] {
            let id = universe.push(Type::Primitive(kind));
            universe.primitives.insert(kind, id);
        }
        universe.string_id = universe.push(Type::Str);
        universe.null_id = universe.push(Type::Null);
        universe
    }

    fn push(&mut self, ty: Type) -> TypeId {
        let id = TypeId(u32::try_from(self.types.len()).expect("type arena overflowed u32"));
        self.types.push(ty);
        id
    }

    #[must_use]
    pub fn primitive(&self, kind: PrimitiveKind) -> TypeId {
        self.primitives[&kind]
    }

    #[must_use]
    pub fn string(&self) -> TypeId {
        self.string_id
    }

    #[must_use]
    pub fn null(&self) -> TypeId {
        self.null_id
    }

    /// Raw unboxed scalars are not reference kinds: `anyref` is their
    /// top only after codegen boxes them (spec §4.5.3), not structurally.
    #[must_use]
    pub fn is_unboxed_scalar(&self, id: TypeId) -> bool {
        matches!(
            self.get(id),
            Type::Primitive(
                PrimitiveKind::I32
                    | PrimitiveKind::I64
                    | PrimitiveKind::F32
                    | PrimitiveKind::F64
                    | PrimitiveKind::Boolean
            )
        )
    }

    #[must_use]
    pub fn never(&self) -> TypeId {
        self.primitive(PrimitiveKind::Never)
    }

    #[must_use]
    pub fn any(&self) -> TypeId {
        self.primitive(PrimitiveKind::Any)
    }

    #[must_use]
    pub fn void(&self) -> TypeId {
        self.primitive(PrimitiveKind::Void)
    }

    #[must_use]
    pub fn i32(&self) -> TypeId {
        self.primitive(PrimitiveKind::I32)
    }

    #[must_use]
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    /// Two-phase registration step one: allocate the slot so other types
    /// under construction (including this one's own fields, for
    /// self-referential classes) can already hold a reference to it.
    pub fn reserve(&mut self) -> TypeId {
        self.push(Type::Reserved)
    }

    /// Two-phase registration step two: fill in a previously [`reserve`]d
    /// slot.
    ///
    /// # Panics
    /// Panics if `id` was not produced by [`reserve`] or was already
    /// populated — this is an internal-errors-tier bug, not a user error.
    ///
    /// [`reserve`]: TypeUniverse::reserve
    pub fn populate(&mut self, id: TypeId, ty: Type) {
        let slot = &mut self.types[id.0 as usize];
        assert!(
            matches!(slot, Type::Reserved),
            "attempted to populate an already-defined type {id:?}"
        );
        *slot = ty;
    }

    pub fn declare_type_parameter(
        &mut self,
        name: impl Into<String>,
        upper_bound: Option<TypeId>,
        default: Option<TypeId>,
    ) -> TypeId {
        let declaration_site = self.next_declaration_site;
        self.next_declaration_site += 1;
        self.push(Type::TypeParameter(TypeParameterType {
            name: name.into(),
            upper_bound,
            default,
            declaration_site,
        }))
    }

    #[must_use]
    pub fn as_class(&self, id: TypeId) -> Option<&ClassType> {
        match self.get(id) {
            Type::Class(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_interface(&self, id: TypeId) -> Option<&InterfaceType> {
        match self.get(id) {
            Type::Interface(i) => Some(i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function(&self, id: TypeId) -> Option<&FunctionType> {
        match self.get(id) {
            Type::Function(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_enum(&self, id: TypeId) -> Option<&EnumType> {
        match self.get(id) {
            Type::Enum(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_type_alias(&self, id: TypeId) -> Option<&TypeAliasType> {
        match self.get(id) {
            Type::TypeAlias(a) => Some(a),
            _ => None,
        }
    }

    /// Follows transparent (non-distinct) aliases to their target.
    /// Distinct aliases stop the chain — they are nominal and only
    /// crossed with an explicit cast.
    #[must_use]
    pub fn resolve_alias(&self, id: TypeId) -> TypeId {
        let mut current = id;
        loop {
            match self.get(current) {
                Type::TypeAlias(alias) if !alias.is_distinct => current = alias.target,
                _ => return current,
            }
        }
    }

    // ---- interning --------------------------------------------------

    /// Function types are not interned: two syntactically identical
    /// signatures written at different call sites stay distinct
    /// `TypeId`s, matching how closures and method signatures are built
    /// fresh during checking.
    #[must_use]
    pub fn new_function(&mut self, parameters: Vec<TypeId>, return_type: TypeId) -> TypeId {
        self.push(Type::Function(FunctionType {
            parameters,
            return_type,
            type_parameters: Vec::new(),
        }))
    }

    #[must_use]
    pub fn intern_array(&mut self, element_type: TypeId) -> TypeId {
        let key = InternKey::Array(element_type);
        if let Some(id) = self.interner.get(&key) {
            return *id;
        }
        let id = self.push(Type::Array(ArrayType { element_type }));
        self.interner.insert(key, id);
        id
    }

    #[must_use]
    pub fn intern_record(&mut self, mut fields: Vec<(String, TypeId)>) -> TypeId {
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        let key = InternKey::Record(fields.clone());
        if let Some(id) = self.interner.get(&key) {
            return *id;
        }
        let id = self.push(Type::Record(RecordType { fields }));
        self.interner.insert(key, id);
        id
    }

    #[must_use]
    pub fn intern_unboxed_tuple(&mut self, elements: Vec<TypeId>) -> TypeId {
        let key = InternKey::UnboxedTuple(elements.clone());
        if let Some(id) = self.interner.get(&key) {
            return *id;
        }
        let id = self.push(Type::UnboxedTuple(elements));
        self.interner.insert(key, id);
        id
    }

    /// Tuples are *not* interned (spec §9 open question): every call
    /// allocates a fresh `Type::Tuple`, even for structurally identical
    /// element lists.
    #[must_use]
    pub fn new_tuple(&mut self, elements: Vec<TypeId>) -> TypeId {
        self.push(Type::Tuple(elements))
    }

    /// Flattens nested unions, drops `never`, dedupes by identity, and
    /// collapses a singleton result to its one member (spec §4.2).
    #[must_use]
    pub fn union_of(&mut self, members: Vec<TypeId>) -> TypeId {
        let mut flat = Vec::new();
        let mut stack = members;
        while let Some(member) = stack.pop() {
            match self.get(member) {
                Type::Union(inner) => stack.extend(inner.iter().copied()),
                Type::Primitive(PrimitiveKind::Never) => {}
                _ => flat.push(member),
            }
        }
        flat.sort_by_key(|t| t.0);
        flat.dedup();
        if flat.is_empty() {
            return self.never();
        }
        if flat.len() == 1 {
            return flat[0];
        }
        let key = InternKey::Union(flat.clone());
        if let Some(id) = self.interner.get(&key) {
            return *id;
        }
        let id = self.push(Type::Union(flat));
        self.interner.insert(key, id);
        id
    }

    // ---- generic instantiation ---------------------------------------

    /// Instantiates a generic class declaration with concrete type
    /// arguments, interning by `(generic_source, type_arguments)` so
    /// every syntactic occurrence of `Box<i32>` collapses to one
    /// [`TypeId`] (spec §3.2, §4.5.2).
    ///
    /// # Errors
    /// Returns [`TypeUniverseError::NotGeneric`] if `generic_source` does
    /// not name a class, and
    /// [`TypeUniverseError::TypeArgumentCountMismatch`] if the arity is
    /// wrong.
    pub fn instantiate_class(
        &mut self,
        generic_source: TypeId,
        type_arguments: Vec<TypeId>,
    ) -> Result<TypeId, TypeUniverseError> {
        let template = self
            .as_class(generic_source)
            .ok_or(TypeUniverseError::NotGeneric(generic_source))?
            .clone();
        if template.type_parameters.len() != type_arguments.len() {
            return Err(TypeUniverseError::TypeArgumentCountMismatch {
                generic_source,
                expected: template.type_parameters.len(),
                found: type_arguments.len(),
            });
        }
        if template.type_parameters.is_empty() {
            return Ok(generic_source);
        }
        let key = InternKey::ClassInstance(generic_source, type_arguments.clone());
        if let Some(id) = self.interner.get(&key) {
            return Ok(*id);
        }
        let mapping: FxHashMap<TypeId, TypeId> = template
            .type_parameters
            .iter()
            .copied()
            .zip(type_arguments.iter().copied())
            .collect();
        let fields = template
            .fields
            .iter()
            .map(|f| FieldInfo {
                name: f.name.clone(),
                ty: self.substitute(f.ty, &mapping),
                is_mut: f.is_mut,
            })
            .collect();
        let methods = template
            .methods
            .iter()
            .map(|(name, ty)| (name.clone(), self.substitute(*ty, &mapping)))
            .collect();
        let super_class = template.super_class.map(|s| self.substitute(s, &mapping));
        let implements = template
            .implements
            .iter()
            .map(|i| self.substitute(*i, &mapping))
            .collect();
        let constructor_type = template
            .constructor_type
            .map(|c| self.substitute(c, &mapping));
        let instance = ClassType {
            name: template.name.clone(),
            module: template.module,
            fields,
            methods,
            constructor_type,
            super_class,
            implements,
            type_parameters: Vec::new(),
            type_arguments: Some(type_arguments.clone()),
            generic_source: Some(generic_source),
            is_final: template.is_final,
            is_extension: template.is_extension,
            on_type: template.on_type,
        };
        let id = self.push(Type::Class(instance));
        self.interner
            .insert(InternKey::ClassInstance(generic_source, type_arguments), id);
        Ok(id)
    }

    pub fn instantiate_interface(
        &mut self,
        generic_source: TypeId,
        type_arguments: Vec<TypeId>,
    ) -> Result<TypeId, TypeUniverseError> {
        let template = self
            .as_interface(generic_source)
            .ok_or(TypeUniverseError::NotGeneric(generic_source))?
            .clone();
        if template.type_parameters.len() != type_arguments.len() {
            return Err(TypeUniverseError::TypeArgumentCountMismatch {
                generic_source,
                expected: template.type_parameters.len(),
                found: type_arguments.len(),
            });
        }
        if template.type_parameters.is_empty() {
            return Ok(generic_source);
        }
        let key = InternKey::InterfaceInstance(generic_source, type_arguments.clone());
        if let Some(id) = self.interner.get(&key) {
            return Ok(*id);
        }
        let mapping: FxHashMap<TypeId, TypeId> = template
            .type_parameters
            .iter()
            .copied()
            .zip(type_arguments.iter().copied())
            .collect();
        let methods = template
            .methods
            .iter()
            .map(|(name, ty)| (name.clone(), self.substitute(*ty, &mapping)))
            .collect();
        let properties = template
            .properties
            .iter()
            .map(|(name, (ty, is_mut))| (name.clone(), (self.substitute(*ty, &mapping), *is_mut)))
            .collect();
        let parent_interfaces = template
            .parent_interfaces
            .iter()
            .map(|p| self.substitute(*p, &mapping))
            .collect();
        let instance = InterfaceType {
            name: template.name.clone(),
            module: template.module,
            methods,
            properties,
            parent_interfaces,
            type_parameters: Vec::new(),
            type_arguments: Some(type_arguments.clone()),
            generic_source: Some(generic_source),
        };
        let id = self.push(Type::Interface(instance));
        self.interner.insert(
            InternKey::InterfaceInstance(generic_source, type_arguments),
            id,
        );
        Ok(id)
    }

    pub fn instantiate_alias(
        &mut self,
        generic_source: TypeId,
        type_arguments: Vec<TypeId>,
    ) -> Result<TypeId, TypeUniverseError> {
        let template = self
            .as_type_alias(generic_source)
            .ok_or(TypeUniverseError::NotGeneric(generic_source))?
            .clone();
        if template.type_parameters.len() != type_arguments.len() {
            return Err(TypeUniverseError::TypeArgumentCountMismatch {
                generic_source,
                expected: template.type_parameters.len(),
                found: type_arguments.len(),
            });
        }
        if template.type_parameters.is_empty() {
            return Ok(generic_source);
        }
        // Distinct aliases are nominal: every instantiation is its own
        // identity, never collapsed to `target` (spec §3.2 table).
        let key = InternKey::AliasInstance(generic_source, type_arguments.clone());
        if let Some(id) = self.interner.get(&key) {
            return Ok(*id);
        }
        let mapping: FxHashMap<TypeId, TypeId> = template
            .type_parameters
            .iter()
            .copied()
            .zip(type_arguments.iter().copied())
            .collect();
        let target = self.substitute(template.target, &mapping);
        let instance = TypeAliasType {
            name: template.name.clone(),
            module: template.module,
            target,
            is_distinct: template.is_distinct,
            type_parameters: Vec::new(),
            type_arguments: Some(type_arguments.clone()),
            generic_source: Some(generic_source),
        };
        let id = self.push(Type::TypeAlias(instance));
        self.interner
            .insert(InternKey::AliasInstance(generic_source, type_arguments), id);
        Ok(id)
    }

    /// Walks `t`, replacing every `TypeParameter` found in `mapping` with
    /// its image, rebuilding compound types through the interner at each
    /// step so the result shares identity with any other mention of the
    /// same instantiation (spec §4.2).
    ///
    /// Returns `t` unchanged when `mapping` is empty, and always returns
    /// a `TypeId` owned by this universe.
    #[must_use]
    pub fn substitute(&mut self, t: TypeId, mapping: &FxHashMap<TypeId, TypeId>) -> TypeId {
        if mapping.is_empty() {
            return t;
        }
        match self.get(t).clone() {
            Type::TypeParameter(_) => mapping.get(&t).copied().unwrap_or(t),
            Type::Class(c) if c.generic_source.is_some() && c.type_arguments.is_some() => {
                let generic_source = c.generic_source.unwrap();
                let args = c
                    .type_arguments
                    .unwrap()
                    .iter()
                    .map(|a| self.substitute(*a, mapping))
                    .collect();
                self.instantiate_class(generic_source, args)
                    .expect("substitution preserves arity")
            }
            Type::Interface(i) if i.generic_source.is_some() && i.type_arguments.is_some() => {
                let generic_source = i.generic_source.unwrap();
                let args = i
                    .type_arguments
                    .unwrap()
                    .iter()
                    .map(|a| self.substitute(*a, mapping))
                    .collect();
                self.instantiate_interface(generic_source, args)
                    .expect("substitution preserves arity")
            }
            Type::TypeAlias(a) if a.generic_source.is_some() && a.type_arguments.is_some() => {
                let generic_source = a.generic_source.unwrap();
                let args = a
                    .type_arguments
                    .unwrap()
                    .iter()
                    .map(|arg| self.substitute(*arg, mapping))
                    .collect();
                self.instantiate_alias(generic_source, args)
                    .expect("substitution preserves arity")
            }
            Type::Array(arr) => {
                let elem = self.substitute(arr.element_type, mapping);
                self.intern_array(elem)
            }
            Type::Record(rec) => {
                let fields = rec
                    .fields
                    .into_iter()
                    .map(|(name, ty)| (name, self.substitute(ty, mapping)))
                    .collect();
                self.intern_record(fields)
            }
            Type::Tuple(elems) => {
                let elems = elems.into_iter().map(|e| self.substitute(e, mapping)).collect();
                self.new_tuple(elems)
            }
            Type::UnboxedTuple(elems) => {
                let elems: Vec<_> = elems.into_iter().map(|e| self.substitute(e, mapping)).collect();
                self.intern_unboxed_tuple(elems)
            }
            Type::Union(members) => {
                let members = members.into_iter().map(|m| self.substitute(m, mapping)).collect();
                self.union_of(members)
            }
            Type::Function(f) => {
                let parameters = f
                    .parameters
                    .iter()
                    .map(|p| self.substitute(*p, mapping))
                    .collect();
                let return_type = self.substitute(f.return_type, mapping);
                self.push(Type::Function(FunctionType {
                    parameters,
                    return_type,
                    type_parameters: f.type_parameters,
                }))
            }
            // Primitives, strings, enums, non-generic classes/interfaces/
            // aliases, and bare type parameters not in `mapping` have no
            // substitutable structure.
            _ => t,
        }
    }

    pub(crate) fn cache_assignability(&self, from: TypeId, to: TypeId, result: bool) {
        self.assignability_cache
            .borrow_mut()
            .insert((from, to), result);
    }

    pub(crate) fn cached_assignability(&self, from: TypeId, to: TypeId) -> Option<bool> {
        self.assignability_cache.borrow().get(&(from, to)).copied()
    }

    #[must_use]
    pub fn module_of(&self, id: TypeId) -> Option<ModuleId> {
        match self.get(id) {
            Type::Class(c) => Some(c.module),
            Type::Interface(i) => Some(i.module),
            Type::TypeAlias(a) => Some(a.module),
            Type::Enum(e) => Some(e.module),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_of_same_element_interns_to_one_id() {
        let mut u = TypeUniverse::new();
        let a = u.intern_array(u.i32());
        let b = u.intern_array(u.i32());
        assert_eq!(a, b);
    }

    #[test]
    fn record_interning_is_insensitive_to_field_order() {
        let mut u = TypeUniverse::new();
        let a = u.intern_record(vec![("x".into(), u.i32()), ("y".into(), u.i32())]);
        let b = u.intern_record(vec![("y".into(), u.i32()), ("x".into(), u.i32())]);
        assert_eq!(a, b);
    }

    #[test]
    fn tuples_are_never_interned() {
        let mut u = TypeUniverse::new();
        let a = u.new_tuple(vec![u.i32(), u.i32()]);
        let b = u.new_tuple(vec![u.i32(), u.i32()]);
        assert_ne!(a, b, "tuples are an explicit open-question exception to interning");
    }

    #[test]
    fn union_normalizes_never_and_duplicates() {
        let mut u = TypeUniverse::new();
        let never = u.never();
        let i32_ty = u.i32();
        let union = u.union_of(vec![i32_ty, never, i32_ty]);
        assert_eq!(union, i32_ty, "never drops out and the duplicate collapses to a singleton");
    }

    #[test]
    fn union_flattens_nested_members() {
        let mut u = TypeUniverse::new();
        let inner = u.union_of(vec![u.i32(), u.primitive(PrimitiveKind::Boolean)]);
        let outer = u.union_of(vec![inner, u.null()]);
        match u.get(outer) {
            Type::Union(members) => assert_eq!(members.len(), 3),
            other => panic!("expected a flattened union, got {other:?}"),
        }
    }

    #[test]
    fn instantiating_a_non_generic_class_returns_the_same_id() {
        let mut u = TypeUniverse::new();
        let module = ModuleId(0);
        let reserved = u.reserve();
        u.populate(
            reserved,
            Type::Class(ClassType {
                name: "Point".into(),
                module,
                fields: Vec::new(),
                methods: FxHashMap::default(),
                constructor_type: None,
                super_class: None,
                implements: Vec::new(),
                type_parameters: Vec::new(),
                type_arguments: None,
                generic_source: None,
                is_final: false,
                is_extension: false,
                on_type: None,
            }),
        );
        let instantiated = u.instantiate_class(reserved, Vec::new()).unwrap();
        assert_eq!(instantiated, reserved);
    }

    #[test]
    fn instantiating_a_generic_class_twice_with_equal_args_interns() {
        let mut u = TypeUniverse::new();
        let module = ModuleId(0);
        let t = u.declare_type_parameter("T", None, None);
        let reserved = u.reserve();
        u.populate(
            reserved,
            Type::Class(ClassType {
                name: "Box".into(),
                module,
                fields: vec![FieldInfo {
                    name: "value".into(),
                    ty: t,
                    is_mut: false,
                }],
                methods: FxHashMap::default(),
                constructor_type: None,
                super_class: None,
                implements: Vec::new(),
                type_parameters: vec![t],
                type_arguments: None,
                generic_source: None,
                is_final: false,
                is_extension: false,
                on_type: None,
            }),
        );
        let i32_ty = u.i32();
        let a = u.instantiate_class(reserved, vec![i32_ty]).unwrap();
        let b = u.instantiate_class(reserved, vec![i32_ty]).unwrap();
        assert_eq!(a, b);
        let field_ty = u.as_class(a).unwrap().fields[0].ty;
        assert_eq!(field_ty, i32_ty, "substitution replaced T with the concrete argument");
    }

    #[test]
    fn wrong_arity_instantiation_is_an_error() {
        let mut u = TypeUniverse::new();
        let t = u.declare_type_parameter("T", None, None);
        let reserved = u.reserve();
        u.populate(
            reserved,
            Type::Class(ClassType {
                name: "Box".into(),
                module: ModuleId(0),
                fields: Vec::new(),
                methods: FxHashMap::default(),
                constructor_type: None,
                super_class: None,
                implements: Vec::new(),
                type_parameters: vec![t],
                type_arguments: None,
                generic_source: None,
                is_final: false,
                is_extension: false,
                on_type: None,
            }),
        );
        let err = u.instantiate_class(reserved, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            TypeUniverseError::TypeArgumentCountMismatch { .. }
        ));
    }
}
