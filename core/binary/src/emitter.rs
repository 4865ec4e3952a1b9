//! `BinaryEmitter` (spec §4.1): one method per section production,
//! assembling a valid WASM-GC / function-references / exceptions
//! binary section by section.

use crate::constexpr::ConstExpr;
use crate::errors::{BinaryEmitError, Result};
use crate::leb;
use crate::module::{CodeEntry, ExportEntry, ExportKind, GlobalEntry, ImportEntry, ImportKind};
use crate::types::{FieldType, StorageType, SubType, ValType};

const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];
const VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

enum TypeSlot {
    Reserved,
    Defined(SubType),
}

/// Assembles the sections of a WASM-GC module. Indices returned by
/// `add*`/`reserve*` methods are stable for the emitter's lifetime and
/// may be embedded immediately in later types/code — this is what
/// lets the code generator lay out mutually recursive class/vtable
/// struct types (spec §4.5.1).
#[derive(Default)]
pub struct BinaryEmitter {
    types: Vec<TypeSlot>,
    imports: Vec<ImportEntry>,
    imported_func_count: u32,
    func_types: Vec<u32>,
    codes: Vec<Option<CodeEntry>>,
    has_table: bool,
    has_memory: bool,
    globals: Vec<GlobalEntry>,
    tags: Vec<u32>,
    exports: Vec<ExportEntry>,
    start: Option<u32>,
    declared_funcs: Vec<u32>,
    data: Vec<Vec<u8>>,
}

impl BinaryEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn type_slot(&self, index: u32) -> Result<&SubType> {
        match self.types.get(index as usize) {
            None => Err(BinaryEmitError::TypeIndexOutOfRange { index, len: self.types.len() as u32 }),
            Some(TypeSlot::Reserved) => Err(BinaryEmitError::TypeNeverDefined(index)),
            Some(TypeSlot::Defined(st)) => Ok(st),
        }
    }

    /// Registers a function type directly (the "pre-rec types" the type
    /// section may begin with, spec §4.1). Returns its type index.
    pub fn add_type(&mut self, params: Vec<ValType>, results: Vec<ValType>) -> u32 {
        let index = self.types.len() as u32;
        self.types.push(TypeSlot::Defined(SubType::func(params, results)));
        index
    }

    /// Reserves a type index without defining it yet, so a struct field
    /// can reference a type that will be defined later (mutual
    /// recursion between a class's struct and its vtable struct, spec
    /// §4.5.1 steps 1-2).
    pub fn reserve_type(&mut self) -> u32 {
        let index = self.types.len() as u32;
        self.types.push(TypeSlot::Reserved);
        index
    }

    /// Fills in a previously `reserve_type`d slot. `is_final` is the
    /// source-level `final` flag (or lack of it), not derived from
    /// whether `super_type` is set — a root class with no supertype of
    /// its own must still be declared non-final when something else
    /// subclasses it later.
    pub fn define_struct_type(
        &mut self,
        index: u32,
        fields: Vec<FieldType>,
        super_type: Option<u32>,
        is_final: bool,
    ) -> Result<()> {
        self.define(index, SubType::structure(fields, super_type, is_final))
    }

    fn define(&mut self, index: u32, sub: SubType) -> Result<()> {
        match self.types.get_mut(index as usize) {
            None => Err(BinaryEmitError::TypeIndexOutOfRange { index, len: self.types.len() as u32 }),
            Some(slot @ TypeSlot::Reserved) => {
                *slot = TypeSlot::Defined(sub);
                Ok(())
            }
            Some(TypeSlot::Defined(_)) => Err(BinaryEmitError::TypeAlreadyDefined(index)),
        }
    }

    /// Reserve-and-define in one call, for struct types with no forward
    /// references to make.
    pub fn add_struct_type(&mut self, fields: Vec<FieldType>, super_type: Option<u32>, is_final: bool) -> u32 {
        let index = self.reserve_type();
        self.define_struct_type(index, fields, super_type, is_final)
            .expect("freshly reserved slot is always definable");
        index
    }

    pub fn add_array_type(&mut self, element: FieldType, is_final: bool) -> u32 {
        let index = self.reserve_type();
        self.define(index, SubType::array(element, is_final))
            .expect("freshly reserved slot is always definable");
        index
    }

    /// Registers a function in the function section against an already
    /// registered function type index, and reserves its code slot.
    /// Returns the function's global index (imported functions occupy
    /// the lower indices).
    pub fn add_function(&mut self, type_index: u32) -> Result<u32> {
        self.type_slot(type_index)?.as_func().ok_or(BinaryEmitError::NotAFunctionType(type_index))?;
        let local_index = self.func_types.len() as u32;
        self.func_types.push(type_index);
        self.codes.push(None);
        Ok(self.imported_func_count + local_index)
    }

    pub fn add_code(&mut self, func_index: u32, locals: Vec<ValType>, body: Vec<u8>) -> Result<()> {
        let local_index = func_index
            .checked_sub(self.imported_func_count)
            .ok_or(BinaryEmitError::FunctionIndexOutOfRange(func_index))? as usize;
        let slot = self
            .codes
            .get_mut(local_index)
            .ok_or(BinaryEmitError::FunctionIndexOutOfRange(func_index))?;
        *slot = Some(CodeEntry { locals, body });
        Ok(())
    }

    /// Registers an import. Function imports occupy function-index-space
    /// slots below every locally defined function, so every import must
    /// be added before the first `add_function` call.
    pub fn add_import(&mut self, module: impl Into<String>, name: impl Into<String>, kind: ImportKind) -> u32 {
        if matches!(kind, ImportKind::Table) {
            self.has_table = true;
        }
        if matches!(kind, ImportKind::Memory) {
            self.has_memory = true;
        }
        let index = match kind {
            ImportKind::Func(_) => {
                let idx = self.imported_func_count;
                self.imported_func_count += 1;
                idx
            }
            ImportKind::Tag(_) => self.tags.len() as u32,
            ImportKind::Table | ImportKind::Memory | ImportKind::Global(..) => 0,
        };
        self.imports.push(ImportEntry { module: module.into(), name: name.into(), kind });
        index
    }

    pub fn declare_memory(&mut self) {
        self.has_memory = true;
    }

    pub fn declare_table(&mut self) {
        self.has_table = true;
    }

    pub fn add_global(&mut self, ty: ValType, mutable: bool, init: ConstExpr) -> u32 {
        let index = self.globals.len() as u32;
        self.globals.push(GlobalEntry { ty, mutable, init });
        index
    }

    pub fn add_tag(&mut self, type_index: u32) -> Result<u32> {
        self.type_slot(type_index)?.as_func().ok_or(BinaryEmitError::NotAFunctionType(type_index))?;
        let index = self.tags.len() as u32;
        self.tags.push(type_index);
        Ok(index)
    }

    /// Registers a passive data segment (byte-array-backed string
    /// literals load from these via `array.new_data`). Returns the data
    /// segment index.
    pub fn add_data(&mut self, bytes: Vec<u8>) -> u32 {
        let index = self.data.len() as u32;
        self.data.push(bytes);
        index
    }

    pub fn add_export(&mut self, name: impl Into<String>, kind: ExportKind, index: u32) {
        self.exports.push(ExportEntry { name: name.into(), kind, index });
    }

    pub fn set_start(&mut self, func_index: u32) {
        self.start = Some(func_index);
    }

    /// Marks a function as taken by reference (`ref.func`, a vtable
    /// slot, a first-class value) so it is listed in the declarative
    /// element segment the validator requires (spec §6.3: "A
    /// declarative element segment lists every function taken by
    /// reference").
    pub fn declare_function(&mut self, func_index: u32) {
        if !self.declared_funcs.contains(&func_index) {
            self.declared_funcs.push(func_index);
        }
    }

    pub fn get_function_type_params(&self, type_index: u32) -> Result<&[ValType]> {
        self.type_slot(type_index)?.as_func().map(|(p, _)| p).ok_or(BinaryEmitError::NotAFunctionType(type_index))
    }

    pub fn get_function_type_results(&self, type_index: u32) -> Result<&[ValType]> {
        self.type_slot(type_index)?.as_func().map(|(_, r)| r).ok_or(BinaryEmitError::NotAFunctionType(type_index))
    }

    pub fn get_struct_field_type(&self, type_index: u32, field_index: u32) -> Result<FieldType> {
        let fields = self.type_slot(type_index)?.as_struct().ok_or(BinaryEmitError::NotAStructType(type_index))?;
        fields
            .get(field_index as usize)
            .copied()
            .ok_or(BinaryEmitError::NoSuchField { type_index, field_index })
    }

    pub fn get_array_element_type(&self, type_index: u32) -> Result<FieldType> {
        self.type_slot(type_index)?.as_array().copied().ok_or(BinaryEmitError::NotAnArrayType(type_index))
    }

    /// Assembles every registered section into a complete binary
    /// module. Consumes the emitter since section order is fixed and
    /// there is nothing left to add to afterward.
    pub fn finish(self) -> Result<Vec<u8>> {
        for (index, slot) in self.types.iter().enumerate() {
            if matches!(slot, TypeSlot::Reserved) {
                return Err(BinaryEmitError::TypeNeverDefined(index as u32));
            }
        }
        for (index, code) in self.codes.iter().enumerate() {
            if code.is_none() {
                return Err(BinaryEmitError::CodeNeverDefined(self.imported_func_count + index as u32));
            }
        }

        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION);

        write_section(&mut out, 1, |buf| self.encode_type_section(buf));
        write_section(&mut out, 2, |buf| self.encode_vec(buf, &self.imports, ImportEntry::encode));
        write_section(&mut out, 3, |buf| {
            leb::write_u32(buf, self.func_types.len() as u32);
            for &t in &self.func_types {
                leb::write_u32(buf, t);
            }
        });
        if self.has_table {
            write_section(&mut out, 4, |buf| {
                leb::write_u32(buf, 1);
                buf.push(0x70); // funcref
                buf.push(0x00);
                leb::write_u32(buf, 0);
            });
        }
        if self.has_memory {
            write_section(&mut out, 5, |buf| {
                leb::write_u32(buf, 1);
                buf.push(0x00);
                leb::write_u32(buf, 1);
            });
        }
        // The exception-handling proposal's tag section sits between
        // memory and global in emission order despite its numerically
        // later section id (13).
        write_section(&mut out, 13, |buf| {
            leb::write_u32(buf, self.tags.len() as u32);
            for &t in &self.tags {
                buf.push(0x00);
                leb::write_u32(buf, t);
            }
        });
        write_section(&mut out, 6, |buf| self.encode_vec(buf, &self.globals, GlobalEntry::encode));
        write_section(&mut out, 7, |buf| self.encode_vec(buf, &self.exports, ExportEntry::encode));
        if let Some(start) = self.start {
            write_section(&mut out, 8, |buf| leb::write_u32(buf, start));
        }
        write_section(&mut out, 9, |buf| self.encode_element_section(buf));
        write_section(&mut out, 12, |buf| leb::write_u32(buf, self.data.len() as u32));
        write_section(&mut out, 10, |buf| self.encode_code_section(buf));
        write_section(&mut out, 11, |buf| self.encode_data_section(buf));

        Ok(out)
    }

    /// Pre-rec types first (a leading run of plain function types),
    /// then exactly one rec group holding every remaining type — which
    /// is every struct/array type plus any function type registered
    /// after the first struct/array (spec §4.1).
    fn encode_type_section(&self, buf: &mut Vec<u8>) {
        let split = self
            .types
            .iter()
            .position(|slot| matches!(slot, TypeSlot::Defined(st) if st.as_func().is_none()))
            .unwrap_or(self.types.len());

        let entry_count = split + usize::from(split < self.types.len());
        leb::write_u32(buf, entry_count as u32);

        for slot in &self.types[..split] {
            match slot {
                TypeSlot::Defined(st) => st.encode(buf),
                TypeSlot::Reserved => unreachable!("pre-rec run only contains defined func types"),
            }
        }

        if split < self.types.len() {
            buf.push(0x4E);
            let rec = &self.types[split..];
            leb::write_u32(buf, rec.len() as u32);
            for slot in rec {
                match slot {
                    TypeSlot::Defined(st) => st.encode(buf),
                    TypeSlot::Reserved => unreachable!("checked by finish() before encoding starts"),
                }
            }
        }
    }

    fn encode_vec<T>(&self, buf: &mut Vec<u8>, items: &[T], encode_one: impl Fn(&T, &mut Vec<u8>)) {
        leb::write_u32(buf, items.len() as u32);
        for item in items {
            encode_one(item, buf);
        }
    }

    fn encode_element_section(&self, buf: &mut Vec<u8>) {
        leb::write_u32(buf, u32::from(!self.declared_funcs.is_empty()));
        if self.declared_funcs.is_empty() {
            return;
        }
        buf.push(0x03); // declarative, funcref, explicit func index vector.
        buf.push(0x00);
        leb::write_u32(buf, self.declared_funcs.len() as u32);
        for &f in &self.declared_funcs {
            leb::write_u32(buf, f);
        }
    }

    fn encode_code_section(&self, buf: &mut Vec<u8>) {
        leb::write_u32(buf, self.codes.len() as u32);
        for code in &self.codes {
            code.as_ref().expect("checked by finish()").encode(buf);
        }
    }

    fn encode_data_section(&self, buf: &mut Vec<u8>) {
        leb::write_u32(buf, self.data.len() as u32);
        for bytes in &self.data {
            buf.push(0x01); // passive segment.
            leb::write_bytes_vec(buf, bytes);
        }
    }
}

fn write_section(out: &mut Vec<u8>, id: u8, body: impl FnOnce(&mut Vec<u8>)) {
    let mut payload = Vec::new();
    body(&mut payload);
    out.push(id);
    leb::write_u32(out, payload.len() as u32);
    out.extend_from_slice(&payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HeapType, RefType};

    #[test]
    fn empty_module_is_just_header() {
        let emitter = BinaryEmitter::new();
        let bytes = emitter.finish().unwrap();
        assert_eq!(&bytes[0..8], &[0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn function_roundtrips_through_type_and_code_sections() {
        let mut emitter = BinaryEmitter::new();
        let ty = emitter.add_type(vec![ValType::I32, ValType::I32], vec![ValType::I32]);
        let func = emitter.add_function(ty).unwrap();
        emitter.add_code(func, vec![], vec![0x20, 0x00, 0x20, 0x01, 0x6A]).unwrap();
        emitter.add_export("add", ExportKind::Func, func);
        let bytes = emitter.finish().unwrap();
        assert!(bytes.len() > 8);
    }

    #[test]
    fn reserved_type_can_be_defined_after_a_forward_reference() {
        let mut emitter = BinaryEmitter::new();
        let vtable_idx = emitter.reserve_type();
        let class_idx = emitter.add_struct_type(
            vec![FieldType::new(
                StorageType::Val(ValType::Ref(RefType::non_null(HeapType::Concrete(vtable_idx)))),
                false,
            )],
            None,
            true,
        );
        emitter
            .define_struct_type(
                vtable_idx,
                vec![FieldType::new(StorageType::Val(ValType::I32), false)],
                None,
                true,
            )
            .unwrap();
        assert!(!emitter.get_struct_field_type(class_idx, 0).unwrap().mutable);
        emitter.finish().unwrap();
    }

    #[test]
    fn finish_rejects_a_never_defined_reserved_type() {
        let mut emitter = BinaryEmitter::new();
        emitter.reserve_type();
        assert!(matches!(emitter.finish(), Err(BinaryEmitError::TypeNeverDefined(0))));
    }

    #[test]
    fn finish_rejects_a_function_with_no_code() {
        let mut emitter = BinaryEmitter::new();
        let ty = emitter.add_type(vec![], vec![]);
        emitter.add_function(ty).unwrap();
        assert!(matches!(emitter.finish(), Err(BinaryEmitError::CodeNeverDefined(0))));
    }

    #[test]
    fn add_function_rejects_a_non_function_type() {
        let mut emitter = BinaryEmitter::new();
        let struct_ty = emitter.add_struct_type(vec![], None, true);
        assert!(matches!(emitter.add_function(struct_ty), Err(BinaryEmitError::NotAFunctionType(_))));
    }

    #[test]
    fn import_precedes_defined_functions_in_the_function_index_space() {
        let mut emitter = BinaryEmitter::new();
        let ty = emitter.add_type(vec![], vec![]);
        let import_idx = emitter.add_import("console", "log_i32", ImportKind::Func(ty));
        let local_idx = emitter.add_function(ty).unwrap();
        assert_eq!(import_idx, 0);
        assert_eq!(local_idx, 1);
    }
}
