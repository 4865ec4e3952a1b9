//! Per-class struct/vtable layout (spec §4.5.1) and the generic
//! monomorphization cache (spec §4.5.2).
//!
//! Layout is computed lazily and cached by [`zena_types::TypeId`]
//! directly: `TypeUniverse::instantiate_class` already interns class
//! instantiations by `(generic_source, type_arguments)` identity, so
//! two syntactically different instantiations that end up structurally
//! identical already collapse to the same `TypeId` before layout ever
//! sees them. A separate `(generic_source, args)` cache key at this
//! layer would just re-derive what the universe already guarantees.

use rustc_hash::FxHashMap;
use zena_binary::{BinaryEmitter, ConstExpr, FieldType, HeapType, RefType, StorageType, ValType};
use zena_types::{ClassType, Type, TypeId, TypeUniverse};

use crate::errors::{LayoutError, Result};
use crate::runtime_types::RuntimeTypes;

/// One vtable slot: its index in the vtable struct and the function
/// type every override must conform to.
#[derive(Debug, Clone, Copy)]
pub struct MethodSlot {
    pub slot: u32,
    pub func_type_idx: u32,
}

/// One instance field: its index in the instance struct (slot 0 is
/// always the vtable reference) and its WASM value representation.
#[derive(Debug, Clone, Copy)]
pub struct FieldSlot {
    pub index: u32,
    pub wasm_ty: ValType,
}

#[derive(Debug, Clone)]
pub struct ClassLayout {
    pub struct_type_idx: u32,
    pub vtable_type_idx: u32,
    pub vtable_global_idx: u32,
    pub fields: FxHashMap<String, FieldSlot>,
    pub methods: FxHashMap<String, MethodSlot>,
    pub constructor_func_idx: Option<u32>,
}

impl ClassLayout {
    #[must_use]
    pub fn instance_ref(&self, nullable: bool) -> RefType {
        let heap = HeapType::Concrete(self.struct_type_idx);
        if nullable { RefType::nullable(heap) } else { RefType::non_null(heap) }
    }
}

#[derive(Default)]
pub struct LayoutTable {
    classes: FxHashMap<TypeId, ClassLayout>,
    func_types: FxHashMap<TypeId, u32>,
}

impl LayoutTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout_of(
        &mut self,
        emitter: &mut BinaryEmitter,
        universe: &TypeUniverse,
        runtime: &RuntimeTypes,
        class_id: TypeId,
    ) -> Result<&ClassLayout> {
        if !self.classes.contains_key(&class_id) {
            self.build(emitter, universe, runtime, class_id)?;
        }
        Ok(self.classes.get(&class_id).expect("just inserted"))
    }

    /// Registers a function's WASM signature once per distinct
    /// `FunctionType` `TypeId`, used both for method vtable slots and
    /// for ordinary top-level functions.
    pub fn func_type_of(
        &mut self,
        emitter: &mut BinaryEmitter,
        universe: &TypeUniverse,
        runtime: &RuntimeTypes,
        func_ty: TypeId,
    ) -> Result<u32> {
        if let Some(idx) = self.func_types.get(&func_ty) {
            return Ok(*idx);
        }
        let f = universe
            .as_function(func_ty)
            .ok_or(LayoutError::MissingFunctionIndex(format!("{func_ty:?}")))?
            .clone();
        let params = f
            .parameters
            .iter()
            .map(|p| value_type_for(self, emitter, universe, runtime, *p))
            .collect::<Result<Vec<_>>>()?;
        let results = if matches!(universe.get(f.return_type), Type::Primitive(zena_types::PrimitiveKind::Void)) {
            vec![]
        } else {
            vec![value_type_for(self, emitter, universe, runtime, f.return_type)?]
        };
        let idx = emitter.add_type(params, results);
        self.func_types.insert(func_ty, idx);
        Ok(idx)
    }

    /// Like [`Self::func_type_of`] but prepends an implicit receiver
    /// parameter typed to `receiver_struct_idx`. Every *newly introduced*
    /// vtable slot's function type is built this way — an override
    /// reuses its parent's slot `func_type_idx` unchanged (see
    /// `build`'s `continue` branch), since WASM function types have no
    /// subtyping: the override's compiled function must present
    /// *exactly* the ancestor's receiver type and `ref.cast`s `this`
    /// down to its own class internally (spec §4.5.6, `DESIGN.md`).
    fn method_func_type(
        &mut self,
        emitter: &mut BinaryEmitter,
        universe: &TypeUniverse,
        runtime: &RuntimeTypes,
        receiver_struct_idx: u32,
        method_ty: TypeId,
    ) -> Result<u32> {
        let f = universe
            .as_function(method_ty)
            .ok_or(LayoutError::MissingFunctionIndex(format!("{method_ty:?}")))?
            .clone();
        let mut params = vec![ValType::Ref(RefType::non_null(HeapType::Concrete(receiver_struct_idx)))];
        for p in &f.parameters {
            params.push(value_type_for(self, emitter, universe, runtime, *p)?);
        }
        let results = if matches!(universe.get(f.return_type), Type::Primitive(zena_types::PrimitiveKind::Void)) {
            vec![]
        } else {
            vec![value_type_for(self, emitter, universe, runtime, f.return_type)?]
        };
        Ok(emitter.add_type(params, results))
    }

    /// Builds (and does not cache, since it is only ever asked for once
    /// per class) the WASM signature of a constructor: `(this,
    /// ...params) -> ()`. Constructors are not vtable slots — every
    /// `new C(...)` call site knows `C` statically, so there is never an
    /// indirect call to make type-match against.
    pub fn constructor_func_type(
        &mut self,
        emitter: &mut BinaryEmitter,
        universe: &TypeUniverse,
        runtime: &RuntimeTypes,
        receiver_struct_idx: u32,
        ctor_params: &[TypeId],
    ) -> Result<u32> {
        let mut params = vec![ValType::Ref(RefType::non_null(HeapType::Concrete(receiver_struct_idx)))];
        for p in ctor_params {
            params.push(value_type_for(self, emitter, universe, runtime, *p)?);
        }
        Ok(emitter.add_type(params, vec![]))
    }

    fn build(
        &mut self,
        emitter: &mut BinaryEmitter,
        universe: &TypeUniverse,
        runtime: &RuntimeTypes,
        class_id: TypeId,
    ) -> Result<()> {
        let class = universe
            .as_class(class_id)
            .ok_or(LayoutError::MissingClassLayout(class_id))?
            .clone();

        let parent_layout = match class.super_class {
            Some(parent_id) => {
                self.build_if_missing(emitter, universe, runtime, parent_id)?;
                Some(self.classes.get(&parent_id).expect("just built").clone())
            }
            None => None,
        };

        // Step 1-2: reserve both struct indices up front so either can
        // reference the other (the vtable's method slots reference the
        // instance struct's func types, the instance struct's field 0
        // references the vtable struct).
        let struct_type_idx = emitter.reserve_type();
        let vtable_type_idx = emitter.reserve_type();

        // Step 3: field list, parent fields first (already guaranteed by
        // `ClassType::fields`'s own ordering), own fields after.
        let mut fields = parent_layout.as_ref().map(|p| p.fields.clone()).unwrap_or_default();
        let mut struct_fields = Vec::new();
        struct_fields.push(FieldType::new(
            StorageType::Val(ValType::Ref(RefType::non_null(HeapType::Concrete(vtable_type_idx)))),
            false,
        ));
        let parent_field_count = fields.len();
        // Re-derive the parent's struct field encodings (field types are
        // cheap to recompute; the index bookkeeping above only carries
        // names forward) before appending this class's own fields.
        if let Some(parent) = &parent_layout {
            let mut ordered: Vec<_> = parent.fields.iter().collect();
            ordered.sort_by_key(|(_, slot)| slot.index);
            for (_, slot) in ordered {
                struct_fields.push(FieldType::new(StorageType::Val(slot.wasm_ty), true));
            }
        }
        for field in &class.fields[parent_field_count..] {
            let wasm_ty = value_type_for(self, emitter, universe, runtime, field.ty)?;
            let index = struct_fields.len() as u32;
            // Every instance field is encoded mutable regardless of the
            // source-level `is_mut` flag: `new C(...)` always lowers to
            // `struct.new` with every field filled in by the constructor
            // body's own `this.field = ...` assignments (`struct.set`),
            // so immutable fields would make construction inexpressible.
            // Assignment outside the constructor is still rejected by
            // `zena-checker`, which is the only place `is_mut` needs to
            // be enforced (spec §4.4).
            let _ = field.is_mut;
            struct_fields.push(FieldType::new(StorageType::Val(wasm_ty), true));
            fields.insert(field.name.clone(), FieldSlot { index, wasm_ty });
        }

        // Step 4: vtable field list, one funcref slot per method,
        // parent slots preserved in place so subclass vtables stay
        // struct-subtypes of the parent vtable.
        let mut methods = parent_layout.as_ref().map(|p| p.methods.clone()).unwrap_or_default();
        let mut vtable_fields: Vec<FieldType> =
            vec![FieldType::new(StorageType::Val(ValType::I32), false); methods.len()];
        for (name, slot) in &methods {
            let heap = HeapType::Concrete(slot.func_type_idx);
            vtable_fields[slot.slot as usize] =
                FieldType::new(StorageType::Val(ValType::Ref(RefType::non_null(heap))), false);
            let _ = name;
        }
        for (name, method_ty) in &class.methods {
            if methods.contains_key(name) {
                continue; // override: reuses the parent's slot, not a new one
            }
            let func_type_idx =
                self.method_func_type(emitter, universe, runtime, struct_type_idx, *method_ty)?;
            let slot_index = vtable_fields.len() as u32;
            vtable_fields.push(FieldType::new(
                StorageType::Val(ValType::Ref(RefType::non_null(HeapType::Concrete(func_type_idx)))),
                false,
            ));
            methods.insert(name.clone(), MethodSlot { slot: slot_index, func_type_idx });
        }

        // Step 5: define both reserved slots now that every field/slot
        // type index exists. Neither is final-by-supertype: WASM
        // requires a type to be declared non-final wherever something
        // might subclass it later, so the struct is only final when the
        // source marked the class `final`, and the vtable struct is
        // never final — a further-derived class always needs to extend
        // its parent's vtable shape even when the parent class itself
        // forbids further `extends`.
        emitter.define_struct_type(
            struct_type_idx,
            struct_fields,
            parent_layout.as_ref().map(|p| p.struct_type_idx),
            class.is_final,
        )?;
        emitter.define_struct_type(
            vtable_type_idx,
            vtable_fields,
            parent_layout.as_ref().map(|p| p.vtable_type_idx),
            false,
        )?;

        self.classes.insert(
            class_id,
            ClassLayout {
                struct_type_idx,
                vtable_type_idx,
                vtable_global_idx: u32::MAX, // patched in by `finalize_vtable_global`
                fields,
                methods,
                constructor_func_idx: None,
            },
        );
        Ok(())
    }

    fn build_if_missing(
        &mut self,
        emitter: &mut BinaryEmitter,
        universe: &TypeUniverse,
        runtime: &RuntimeTypes,
        class_id: TypeId,
    ) -> Result<()> {
        if !self.classes.contains_key(&class_id) {
            self.build(emitter, universe, runtime, class_id)?;
        }
        Ok(())
    }

    /// Records the constructor's function index once `generate` has
    /// registered it, so later `new` expressions can call it (`build`
    /// leaves this `None`; a class with no declared constructor keeps
    /// it `None` forever, and `new` expressions simply skip the call).
    pub fn set_constructor_func_idx(&mut self, class_id: TypeId, func_idx: u32) {
        if let Some(layout) = self.classes.get_mut(&class_id) {
            layout.constructor_func_idx = Some(func_idx);
        }
    }

    /// Allocates the singleton vtable global for a class once every
    /// method's function index is known (methods are emitted after
    /// layout, so this runs in a second pass per spec §4.5.1 step 6).
    pub fn finalize_vtable_global(
        &mut self,
        emitter: &mut BinaryEmitter,
        class_id: TypeId,
        method_func_indices: &FxHashMap<String, u32>,
    ) -> Result<u32> {
        let layout = self.classes.get(&class_id).ok_or(LayoutError::MissingClassLayout(class_id))?.clone();
        let mut ordered: Vec<_> = layout.methods.iter().collect();
        ordered.sort_by_key(|(_, slot)| slot.slot);
        let mut fields = Vec::with_capacity(ordered.len());
        for (name, _slot) in ordered {
            let func_idx = *method_func_indices
                .get(name)
                .ok_or_else(|| LayoutError::MissingMethodSlot(name.clone(), class_id))?;
            fields.push(ConstExpr::RefFunc(func_idx));
        }
        let global_idx =
            emitter.add_global(ValType::Ref(RefType::non_null(HeapType::Concrete(layout.vtable_type_idx))), false, ConstExpr::StructNew(layout.vtable_type_idx, fields));
        self.classes.get_mut(&class_id).expect("checked above").vtable_global_idx = global_idx;
        Ok(global_idx)
    }
}

/// Maps a semantic type to its WASM value representation. Classes and
/// interfaces lower to non-null references to their own struct type
/// (computing that class's layout on demand, so forward references
/// between mutually referencing classes resolve through the same
/// reserve/define path as direct fields).
pub fn value_type_for(
    table: &mut LayoutTable,
    emitter: &mut BinaryEmitter,
    universe: &TypeUniverse,
    runtime: &RuntimeTypes,
    ty: TypeId,
) -> Result<ValType> {
    use zena_types::PrimitiveKind as P;
    match universe.get(ty) {
        Type::Primitive(P::I32) | Type::Primitive(P::Boolean) => Ok(ValType::I32),
        Type::Primitive(P::I64) => Ok(ValType::I64),
        Type::Primitive(P::F32) => Ok(ValType::F32),
        Type::Primitive(P::F64) => Ok(ValType::F64),
        Type::Primitive(P::Void) | Type::Primitive(P::Never) => Ok(ValType::I32),
        Type::Primitive(P::Any) | Type::Primitive(P::AnyRef) => {
            Ok(ValType::Ref(RefType::nullable(HeapType::Any)))
        }
        Type::Primitive(P::ByteArray) => Ok(ValType::Ref(runtime.byte_array_ref(false))),
        Type::Str | Type::Null => Ok(ValType::Ref(runtime.string_ref(true))),
        Type::Class(ClassType { .. }) => {
            table.build_if_missing(emitter, universe, runtime, ty)?;
            Ok(ValType::Ref(table.classes[&ty].instance_ref(true)))
        }
        Type::Interface(_) => Ok(ValType::Ref(RefType::nullable(HeapType::Any))),
        Type::Array(arr) => {
            let _ = arr;
            Ok(ValType::Ref(runtime.anyref_array_ref(true)))
        }
        Type::Union(_) => Ok(ValType::Ref(RefType::nullable(HeapType::Any))),
        Type::TypeAlias(alias) => value_type_for(table, emitter, universe, runtime, alias.target),
        Type::Enum(_) => Ok(ValType::I32),
        Type::Function(_) => Ok(ValType::Ref(RefType::nullable(HeapType::Func))),
        Type::Record(_) | Type::Tuple(_) | Type::UnboxedTuple(_) => {
            Ok(ValType::Ref(RefType::nullable(HeapType::Any)))
        }
        Type::TypeParameter(_) | Type::Reserved => Ok(ValType::Ref(RefType::nullable(HeapType::Any))),
    }
}
