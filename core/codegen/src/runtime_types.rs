//! Well-known WASM-GC types every compiled module needs regardless of
//! what the source program declares: the string representation, the
//! anyref boxes for unboxed-by-default primitives (spec §4.5.3), and
//! the interface dispatch shape. Registered once per [`crate::Codegen`]
//! run, before any class layout (spec §4.5.1 step 0 in all but name).

use zena_binary::{BinaryEmitter, FieldType, HeapType, RefType, StorageType, SubType, ValType};

/// One one-field struct per primitive WASM value kind, used to box a
/// primitive when it flows into an `any`/`AnyRef`-typed slot (spec
/// §4.5.3: "anyref union boxing via one-field structs per primitive
/// kind").
#[derive(Debug, Clone, Copy)]
pub struct BoxTypes {
    pub boxed_i32: u32,
    pub boxed_i64: u32,
    pub boxed_f64: u32,
    pub boxed_bool: u32,
}

/// The interface value shape: a fat reference pairing the receiver
/// (erased to `anyref`) with a vtable reference typed to that specific
/// interface. `vtable_type` is filled in per-interface by
/// [`crate::layout`]; this struct only owns the ambient parts.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeTypes {
    /// `(array (mut i8))` — backing storage for string/byte-array data.
    pub byte_array: u32,
    /// `(array (mut i32))` — backing storage for `int[]`.
    pub i32_array: u32,
    /// `(array (mut anyref))` — backing storage for reference arrays.
    pub anyref_array: u32,
    /// `(struct (field (ref $byte_array)))` — the string representation:
    /// length is `array.len` on the byte array, no separate field needed.
    pub string: u32,
    pub boxes: BoxTypes,
}

impl RuntimeTypes {
    /// Registers every ambient type with `emitter` and returns the index
    /// table. Must run before any class/interface layout, since vtable
    /// structs and boxed fields reference these indices.
    pub fn register(emitter: &mut BinaryEmitter) -> Self {
        let byte_array = emitter.add_array_type(FieldType::new(StorageType::I8, true), true);
        let i32_array =
            emitter.add_array_type(FieldType::new(StorageType::Val(ValType::I32), true), true);
        let anyref_array = emitter.add_array_type(
            FieldType::new(StorageType::Val(ValType::Ref(RefType::nullable(HeapType::Any))), true),
            true,
        );

        let string_field = FieldType::new(
            StorageType::Val(ValType::Ref(RefType::non_null(HeapType::Concrete(byte_array)))),
            false,
        );
        let string = emitter.add_struct_type(vec![string_field], None, true);

        let boxed_i32 =
            emitter.add_struct_type(vec![FieldType::new(StorageType::Val(ValType::I32), false)], None, true);
        let boxed_i64 =
            emitter.add_struct_type(vec![FieldType::new(StorageType::Val(ValType::I64), false)], None, true);
        let boxed_f64 =
            emitter.add_struct_type(vec![FieldType::new(StorageType::Val(ValType::F64), false)], None, true);
        let boxed_bool =
            emitter.add_struct_type(vec![FieldType::new(StorageType::Val(ValType::I32), false)], None, true);

        RuntimeTypes {
            byte_array,
            i32_array,
            anyref_array,
            string,
            boxes: BoxTypes { boxed_i32, boxed_i64, boxed_f64, boxed_bool },
        }
    }

    #[must_use]
    pub fn string_ref(&self, nullable: bool) -> RefType {
        ref_to(self.string, nullable)
    }

    #[must_use]
    pub fn byte_array_ref(&self, nullable: bool) -> RefType {
        ref_to(self.byte_array, nullable)
    }

    #[must_use]
    pub fn i32_array_ref(&self, nullable: bool) -> RefType {
        ref_to(self.i32_array, nullable)
    }

    #[must_use]
    pub fn anyref_array_ref(&self, nullable: bool) -> RefType {
        ref_to(self.anyref_array, nullable)
    }
}

fn ref_to(type_idx: u32, nullable: bool) -> RefType {
    let heap = HeapType::Concrete(type_idx);
    if nullable { RefType::nullable(heap) } else { RefType::non_null(heap) }
}

/// `SubType::array` is a thin wrapper; kept here so every ambient array
/// registration goes through the same `is_final = true` choice (no
/// source-level array subtyping exists, spec §3.2's `Array` is always
/// a leaf type).
#[must_use]
pub fn array_sub_type(element: FieldType) -> SubType {
    SubType::array(element, true)
}
