//! Import/export/table/memory/global/code entry shapes, one struct per
//! wasm section production (the teacher's
//! `wat-codegen/src/wat_emitter.rs` has one method per production in
//! text form; here each gets its own encodable struct instead).

use crate::constexpr::ConstExpr;
use crate::leb;
use crate::types::ValType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Func(u32),
    Table,
    Memory,
    Global(ValType, bool),
    Tag(u32),
}

#[derive(Debug, Clone)]
pub struct ImportEntry {
    pub module: String,
    pub name: String,
    pub kind: ImportKind,
}

impl ImportEntry {
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        leb::write_name(buf, &self.module);
        leb::write_name(buf, &self.name);
        match self.kind {
            ImportKind::Func(type_idx) => {
                buf.push(0x00);
                leb::write_u32(buf, type_idx);
            }
            ImportKind::Table => {
                buf.push(0x01);
                // funcref table, no explicit max.
                buf.push(0x70);
                buf.push(0x00);
                leb::write_u32(buf, 0);
            }
            ImportKind::Memory => {
                buf.push(0x02);
                buf.push(0x00);
                leb::write_u32(buf, 1);
            }
            ImportKind::Global(ty, mutable) => {
                buf.push(0x03);
                ty.encode(buf);
                buf.push(u8::from(mutable));
            }
            ImportKind::Tag(type_idx) => {
                buf.push(0x04);
                buf.push(0x00); // exception kind: always 0 in the current proposal.
                leb::write_u32(buf, type_idx);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Func,
    Table,
    Memory,
    Global,
    Tag,
}

impl ExportKind {
    fn byte(self) -> u8 {
        match self {
            ExportKind::Func => 0x00,
            ExportKind::Table => 0x01,
            ExportKind::Memory => 0x02,
            ExportKind::Global => 0x03,
            ExportKind::Tag => 0x04,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportEntry {
    pub name: String,
    pub kind: ExportKind,
    pub index: u32,
}

impl ExportEntry {
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        leb::write_name(buf, &self.name);
        buf.push(self.kind.byte());
        leb::write_u32(buf, self.index);
    }
}

#[derive(Debug, Clone)]
pub struct GlobalEntry {
    pub ty: ValType,
    pub mutable: bool,
    pub init: ConstExpr,
}

impl GlobalEntry {
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        self.ty.encode(buf);
        buf.push(u8::from(self.mutable));
        self.init.encode(buf);
    }
}

/// `func $n (local ...)* body end`, with adjacent identical local
/// declarations run-length compressed (spec §4.1: "Locals in a code
/// entry are run-length compressed").
#[derive(Debug, Clone)]
pub struct CodeEntry {
    pub locals: Vec<ValType>,
    /// Already-encoded instruction bytes, *without* the trailing `end`
    /// opcode — [`CodeEntry::encode`] appends it.
    pub body: Vec<u8>,
}

impl CodeEntry {
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        let mut inner = Vec::new();
        let runs = run_length_compress(&self.locals);
        leb::write_u32(&mut inner, runs.len() as u32);
        for (count, ty) in runs {
            leb::write_u32(&mut inner, count);
            ty.encode(&mut inner);
        }
        inner.extend_from_slice(&self.body);
        inner.push(0x0B);

        leb::write_u32(buf, inner.len() as u32);
        buf.extend_from_slice(&inner);
    }
}

fn run_length_compress(locals: &[ValType]) -> Vec<(u32, ValType)> {
    let mut runs: Vec<(u32, ValType)> = Vec::new();
    for &ty in locals {
        match runs.last_mut() {
            Some((count, last)) if *last == ty => *count += 1,
            _ => runs.push((1, ty)),
        }
    }
    runs
}
