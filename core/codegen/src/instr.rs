//! Raw WASM instruction encoding helpers. `zena_binary::BinaryEmitter`
//! only assembles sections around an opaque function body
//! (`addCode(index, locals, body)`, spec §4.1) — the body bytes
//! themselves are this module's job, one function per opcode family,
//! mirroring the teacher's `utils.rs` helper-per-concern shape.

use zena_binary::{ConstExpr, HeapType};

pub fn local_get(buf: &mut Vec<u8>, idx: u32) {
    buf.push(0x20);
    write_u32(buf, idx);
}

pub fn local_set(buf: &mut Vec<u8>, idx: u32) {
    buf.push(0x21);
    write_u32(buf, idx);
}

pub fn local_tee(buf: &mut Vec<u8>, idx: u32) {
    buf.push(0x22);
    write_u32(buf, idx);
}

pub fn global_get(buf: &mut Vec<u8>, idx: u32) {
    buf.push(0x23);
    write_u32(buf, idx);
}

pub fn global_set(buf: &mut Vec<u8>, idx: u32) {
    buf.push(0x24);
    write_u32(buf, idx);
}

pub fn i32_const(buf: &mut Vec<u8>, v: i32) {
    buf.push(0x41);
    write_i32(buf, v);
}

pub fn i64_const(buf: &mut Vec<u8>, v: i64) {
    buf.push(0x42);
    write_i64(buf, v);
}

pub fn f32_const(buf: &mut Vec<u8>, v: f32) {
    buf.push(0x43);
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn f64_const(buf: &mut Vec<u8>, v: f64) {
    buf.push(0x44);
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn call(buf: &mut Vec<u8>, func_idx: u32) {
    buf.push(0x10);
    write_u32(buf, func_idx);
}

/// `call_ref $type` — the function-references proposal's indirect call
/// through a typed function reference already on the stack (used for
/// vtable dispatch, spec §4.5.6).
pub fn call_ref(buf: &mut Vec<u8>, type_idx: u32) {
    buf.push(0x14);
    write_u32(buf, type_idx);
}

pub fn ret(buf: &mut Vec<u8>) {
    buf.push(0x0F);
}

pub fn drop(buf: &mut Vec<u8>) {
    buf.push(0x1A);
}

pub fn unreachable(buf: &mut Vec<u8>) {
    buf.push(0x00);
}

/// `block`/`loop`/`if` all take a blocktype immediate; `0x40` is the
/// empty (void) blocktype, used throughout since this codegen always
/// leaves control-flow results on locals rather than the value stack.
pub fn block_start(buf: &mut Vec<u8>) {
    buf.push(0x02);
    buf.push(0x40);
}

pub fn loop_start(buf: &mut Vec<u8>) {
    buf.push(0x03);
    buf.push(0x40);
}

pub fn if_start(buf: &mut Vec<u8>) {
    buf.push(0x04);
    buf.push(0x40);
}

pub fn else_(buf: &mut Vec<u8>) {
    buf.push(0x05);
}

pub fn end(buf: &mut Vec<u8>) {
    buf.push(0x0B);
}

pub fn br(buf: &mut Vec<u8>, depth: u32) {
    buf.push(0x0C);
    write_u32(buf, depth);
}

pub fn br_if(buf: &mut Vec<u8>, depth: u32) {
    buf.push(0x0D);
    write_u32(buf, depth);
}

pub mod i32_op {
    pub const ADD: u8 = 0x6A;
    pub const SUB: u8 = 0x6B;
    pub const MUL: u8 = 0x6C;
    pub const DIV_S: u8 = 0x6D;
    pub const REM_S: u8 = 0x6F;
    pub const AND: u8 = 0x71;
    pub const OR: u8 = 0x72;
    pub const XOR: u8 = 0x73;
    pub const SHL: u8 = 0x74;
    pub const SHR_S: u8 = 0x75;
    pub const SHR_U: u8 = 0x76;
    pub const EQZ: u8 = 0x45;
    pub const EQ: u8 = 0x46;
    pub const NE: u8 = 0x47;
    pub const LT_S: u8 = 0x48;
    pub const GT_S: u8 = 0x4A;
    pub const LE_S: u8 = 0x4C;
    pub const GE_S: u8 = 0x4E;
}

pub mod i64_op {
    pub const ADD: u8 = 0x7C;
    pub const SUB: u8 = 0x7D;
    pub const MUL: u8 = 0x7E;
    pub const DIV_S: u8 = 0x7F;
    pub const REM_S: u8 = 0x81;
    pub const AND: u8 = 0x83;
    pub const OR: u8 = 0x84;
    pub const XOR: u8 = 0x85;
    pub const SHL: u8 = 0x86;
    pub const SHR_S: u8 = 0x87;
    pub const SHR_U: u8 = 0x88;
    pub const EQ: u8 = 0x51;
    pub const NE: u8 = 0x52;
    pub const LT_S: u8 = 0x53;
    pub const GT_S: u8 = 0x55;
    pub const LE_S: u8 = 0x57;
    pub const GE_S: u8 = 0x59;
}

pub mod f32_op {
    pub const ADD: u8 = 0x92;
    pub const SUB: u8 = 0x93;
    pub const MUL: u8 = 0x94;
    pub const DIV: u8 = 0x95;
    pub const NEG: u8 = 0x8C;
    pub const EQ: u8 = 0x5B;
    pub const NE: u8 = 0x5C;
    pub const LT: u8 = 0x5D;
    pub const GT: u8 = 0x5E;
    pub const LE: u8 = 0x5F;
    pub const GE: u8 = 0x60;
}

pub mod f64_op {
    pub const ADD: u8 = 0xA0;
    pub const SUB: u8 = 0xA1;
    pub const MUL: u8 = 0xA2;
    pub const DIV: u8 = 0xA3;
    pub const NEG: u8 = 0x9A;
    pub const EQ: u8 = 0x61;
    pub const NE: u8 = 0x62;
    pub const LT: u8 = 0x63;
    pub const GT: u8 = 0x64;
    pub const LE: u8 = 0x65;
    pub const GE: u8 = 0x66;
}

pub fn simple(buf: &mut Vec<u8>, opcode: u8) {
    buf.push(opcode);
}

/// A bare GC-prefixed opcode (`0xFB`) with one type-index immediate —
/// covers `struct.new_default`, `array.len`, etc.
pub fn gc_op_with_type(buf: &mut Vec<u8>, sub_opcode: u32, type_idx: u32) {
    buf.push(0xFB);
    write_u32(buf, sub_opcode);
    write_u32(buf, type_idx);
}

pub fn struct_new(buf: &mut Vec<u8>, type_idx: u32) {
    gc_op_with_type(buf, 0x00, type_idx);
}

pub fn struct_new_default(buf: &mut Vec<u8>, type_idx: u32) {
    gc_op_with_type(buf, 0x01, type_idx);
}

pub fn struct_get(buf: &mut Vec<u8>, type_idx: u32, field_idx: u32) {
    buf.push(0xFB);
    write_u32(buf, 0x02);
    write_u32(buf, type_idx);
    write_u32(buf, field_idx);
}

pub fn struct_set(buf: &mut Vec<u8>, type_idx: u32, field_idx: u32) {
    buf.push(0xFB);
    write_u32(buf, 0x05);
    write_u32(buf, type_idx);
    write_u32(buf, field_idx);
}

pub fn array_new_fixed(buf: &mut Vec<u8>, type_idx: u32, count: u32) {
    buf.push(0xFB);
    write_u32(buf, 0x08);
    write_u32(buf, type_idx);
    write_u32(buf, count);
}

pub fn array_new_data(buf: &mut Vec<u8>, type_idx: u32, data_idx: u32) {
    buf.push(0xFB);
    write_u32(buf, 0x09);
    write_u32(buf, type_idx);
    write_u32(buf, data_idx);
}

pub fn array_get(buf: &mut Vec<u8>, type_idx: u32) {
    gc_op_with_type(buf, 0x0B, type_idx);
}

pub fn array_set(buf: &mut Vec<u8>, type_idx: u32) {
    gc_op_with_type(buf, 0x0E, type_idx);
}

pub fn array_len(buf: &mut Vec<u8>) {
    buf.push(0xFB);
    write_u32(buf, 0x0F);
}

pub fn ref_test(buf: &mut Vec<u8>, heap: HeapType) {
    buf.push(0xFB);
    write_u32(buf, 0x14);
    write_heap_type(buf, heap);
}

pub fn ref_cast(buf: &mut Vec<u8>, heap: HeapType) {
    buf.push(0xFB);
    write_u32(buf, 0x16);
    write_heap_type(buf, heap);
}

pub fn ref_func(buf: &mut Vec<u8>, func_idx: u32) {
    buf.push(0xD2);
    write_u32(buf, func_idx);
}

pub fn ref_is_null(buf: &mut Vec<u8>) {
    buf.push(0xD1);
}

pub fn ref_eq(buf: &mut Vec<u8>) {
    buf.push(0xD3);
}

pub fn ref_null(buf: &mut Vec<u8>, heap: HeapType) {
    buf.push(0xD0);
    write_heap_type(buf, heap);
}

/// `try`/`catch`/`catch_all`/`end` exception-handling blocks (spec
/// §4.5.5's `throw`/`try`/`catch`), the legacy (pre-`try_table`) EH
/// proposal encoding.
pub fn try_start(buf: &mut Vec<u8>) {
    buf.push(0x06);
    buf.push(0x40);
}

pub fn catch(buf: &mut Vec<u8>, tag_idx: u32) {
    buf.push(0x07);
    write_u32(buf, tag_idx);
}

pub fn catch_all(buf: &mut Vec<u8>) {
    buf.push(0x19);
}

pub fn throw(buf: &mut Vec<u8>, tag_idx: u32) {
    buf.push(0x08);
    write_u32(buf, tag_idx);
}

pub fn rethrow(buf: &mut Vec<u8>, depth: u32) {
    buf.push(0x09);
    write_u32(buf, depth);
}

/// Builds a `struct.new`-backed constant expression by walking field
/// initializers that are themselves already-lowered const exprs. Used
/// by [`crate::layout`] to initialize vtable globals (spec §4.5.1).
pub fn struct_new_const(type_idx: u32, fields: Vec<ConstExpr>) -> ConstExpr {
    ConstExpr::StructNew(type_idx, fields)
}

fn write_heap_type(buf: &mut Vec<u8>, heap: HeapType) {
    // Mirrors `zena_binary::types::HeapType`'s own encoding; duplicated
    // here since that encoder is crate-private to `zena-binary` and
    // instruction operands need the identical byte shape.
    let byte = match heap {
        HeapType::Func => Some(0x70),
        HeapType::Extern => Some(0x6F),
        HeapType::Any => Some(0x6E),
        HeapType::Eq => Some(0x6D),
        HeapType::I31 => Some(0x6C),
        HeapType::Struct => Some(0x65),
        HeapType::Array => Some(0x66),
        HeapType::None => Some(0x71),
        HeapType::NoExtern => Some(0x72),
        HeapType::NoFunc => Some(0x73),
        HeapType::Exn => Some(0x69),
        HeapType::NoExn => Some(0x74),
        HeapType::Concrete(_) => None,
    };
    match byte {
        Some(b) => buf.push(b),
        None => {
            let HeapType::Concrete(idx) = heap else { unreachable!() };
            write_i64(buf, i64::from(idx));
        }
    }
}

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    leb128::write::unsigned(buf, u64::from(v)).expect("writing to Vec<u8> cannot fail");
}

fn write_i32(buf: &mut Vec<u8>, v: i32) {
    leb128::write::signed(buf, i64::from(v)).expect("writing to Vec<u8> cannot fail");
}

fn write_i64(buf: &mut Vec<u8>, v: i64) {
    leb128::write::signed(buf, v).expect("writing to Vec<u8> cannot fail");
}
