//! Constant initializer expressions, used by globals and active data
//! segments. Each variant lowers to its opcode(s) followed by `end`
//! (`0x0B`), written by [`ConstExpr::encode`].

use crate::leb;
use crate::types::HeapType;

#[derive(Debug, Clone)]
pub enum ConstExpr {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    RefNull(HeapType),
    RefFunc(u32),
    GlobalGet(u32),
    /// `struct.new $type (args...)` — used to initialize a class's
    /// vtable global (spec §4.5.1: "a global of the vtable struct type
    /// initialized to `struct.new` of the concrete function references").
    StructNew(u32, Vec<ConstExpr>),
}

impl ConstExpr {
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            ConstExpr::I32(v) => {
                buf.push(0x41);
                leb::write_i32(buf, *v);
            }
            ConstExpr::I64(v) => {
                buf.push(0x42);
                leb::write_i64(buf, *v);
            }
            ConstExpr::F32(v) => {
                buf.push(0x43);
                buf.extend_from_slice(&v.to_le_bytes());
            }
            ConstExpr::F64(v) => {
                buf.push(0x44);
                buf.extend_from_slice(&v.to_le_bytes());
            }
            ConstExpr::RefNull(ht) => {
                buf.push(0xD0);
                encode_heap_type_operand(buf, *ht);
            }
            ConstExpr::RefFunc(idx) => {
                buf.push(0xD2);
                leb::write_u32(buf, *idx);
            }
            ConstExpr::GlobalGet(idx) => {
                buf.push(0x23);
                leb::write_u32(buf, *idx);
            }
            ConstExpr::StructNew(type_idx, args) => {
                for a in args {
                    a.encode_without_end(buf);
                }
                buf.push(0xFB);
                leb::write_u32(buf, 0x00);
                leb::write_u32(buf, *type_idx);
                return;
            }
        }
        buf.push(0x0B);
    }

    fn encode_without_end(&self, buf: &mut Vec<u8>) {
        let mut tmp = Vec::new();
        self.encode(&mut tmp);
        tmp.pop();
        buf.extend_from_slice(&tmp);
    }
}

fn encode_heap_type_operand(buf: &mut Vec<u8>, ht: HeapType) {
    // `ref.null` takes a bare heaptype immediate, not a reftype.
    ht.encode(buf);
}
