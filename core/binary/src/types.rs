//! Value, reference, and composite type encoding for the GC / function-
//! references proposals (spec §4.1, §6.3).

use crate::leb;

/// An abstract or concrete heap type, the target of a `(ref null? ht)`.
///
/// Abstract variants encode as a single byte that happens to be a valid
/// one-byte SLEB128 encoding of a small negative number; concrete
/// variants (a type-section index) encode as a positive SLEB128 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapType {
    Func,
    Extern,
    Any,
    Eq,
    I31,
    Struct,
    Array,
    None,
    NoExtern,
    NoFunc,
    Exn,
    NoExn,
    /// A concrete struct/array/func type defined in this module's type
    /// section.
    Concrete(u32),
}

impl HeapType {
    fn abstract_byte(self) -> Option<u8> {
        Some(match self {
            HeapType::Func => 0x70,
            HeapType::Extern => 0x6F,
            HeapType::Any => 0x6E,
            HeapType::Eq => 0x6D,
            HeapType::I31 => 0x6C,
            HeapType::Struct => 0x65,
            HeapType::Array => 0x66,
            HeapType::None => 0x71,
            HeapType::NoExtern => 0x72,
            HeapType::NoFunc => 0x73,
            HeapType::Exn => 0x69,
            HeapType::NoExn => 0x74,
            HeapType::Concrete(_) => return None,
        })
    }

    pub(crate) fn encode(self, buf: &mut Vec<u8>) {
        match self.abstract_byte() {
            Some(byte) => buf.push(byte),
            None => {
                let HeapType::Concrete(idx) = self else { unreachable!() };
                leb::write_i64(buf, i64::from(idx));
            }
        }
    }
}

/// `(ref null? ht)`. Always encoded in the explicit long form (`0x63`/
/// `0x64` followed by the heap type) rather than the single-byte
/// shorthand some abstract nullable refs admit — both are valid wasm,
/// the long form just avoids a second table of special cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefType {
    pub nullable: bool,
    pub heap: HeapType,
}

impl RefType {
    #[must_use]
    pub fn nullable(heap: HeapType) -> Self {
        RefType { nullable: true, heap }
    }

    #[must_use]
    pub fn non_null(heap: HeapType) -> Self {
        RefType { nullable: false, heap }
    }

    fn encode(self, buf: &mut Vec<u8>) {
        buf.push(if self.nullable { 0x63 } else { 0x64 });
        self.heap.encode(buf);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValType {
    I32,
    I64,
    F32,
    F64,
    Ref(RefType),
}

impl ValType {
    pub(crate) fn encode(self, buf: &mut Vec<u8>) {
        match self {
            ValType::I32 => buf.push(0x7F),
            ValType::I64 => buf.push(0x7E),
            ValType::F32 => buf.push(0x7D),
            ValType::F64 => buf.push(0x7C),
            ValType::Ref(r) => r.encode(buf),
        }
    }
}

/// The storage representation of a struct/array field: a full value
/// type, or one of the two packed integer storage types that only
/// struct/array fields may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Val(ValType),
    I8,
    I16,
}

impl StorageType {
    fn encode(self, buf: &mut Vec<u8>) {
        match self {
            StorageType::Val(v) => v.encode(buf),
            StorageType::I8 => buf.push(0x78),
            StorageType::I16 => buf.push(0x77),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldType {
    pub storage: StorageType,
    pub mutable: bool,
}

impl FieldType {
    #[must_use]
    pub fn new(storage: StorageType, mutable: bool) -> Self {
        FieldType { storage, mutable }
    }

    fn encode(self, buf: &mut Vec<u8>) {
        self.storage.encode(buf);
        buf.push(u8::from(self.mutable));
    }
}

/// A struct, array, or function composite type (the payload a
/// [`SubType`] wraps).
#[derive(Debug, Clone)]
pub enum CompositeType {
    Func { params: Vec<ValType>, results: Vec<ValType> },
    Struct { fields: Vec<FieldType> },
    Array { element: FieldType },
}

impl CompositeType {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            CompositeType::Func { params, results } => {
                buf.push(0x60);
                leb::write_u32(buf, params.len() as u32);
                for p in params {
                    p.encode(buf);
                }
                leb::write_u32(buf, results.len() as u32);
                for r in results {
                    r.encode(buf);
                }
            }
            CompositeType::Struct { fields } => {
                buf.push(0x5F);
                leb::write_u32(buf, fields.len() as u32);
                for f in fields {
                    f.encode(buf);
                }
            }
            CompositeType::Array { element } => {
                buf.push(0x5E);
                element.encode(buf);
            }
        }
    }
}

/// One entry of the type section's flattened index space: a composite
/// type plus its `final`/supertype subtyping data (spec §4.1:
/// "Struct and array types are wrapped in `sub` (extensible) or `sub
/// final` with explicit supertype index when subclassing is used").
#[derive(Debug, Clone)]
pub struct SubType {
    pub is_final: bool,
    pub supertype: Option<u32>,
    pub composite: CompositeType,
}

impl SubType {
    #[must_use]
    pub fn func(params: Vec<ValType>, results: Vec<ValType>) -> Self {
        SubType {
            is_final: true,
            supertype: None,
            composite: CompositeType::Func { params, results },
        }
    }

    #[must_use]
    pub fn structure(fields: Vec<FieldType>, super_type: Option<u32>, is_final: bool) -> Self {
        SubType {
            is_final,
            supertype: super_type,
            composite: CompositeType::Struct { fields },
        }
    }

    #[must_use]
    pub fn array(element: FieldType, is_final: bool) -> Self {
        SubType {
            is_final,
            supertype: None,
            composite: CompositeType::Array { element },
        }
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        // Plain composite with no supertype and final is the abbreviated
        // form; anything that needs subtyping wraps it in `sub`/`sub final`.
        if self.is_final && self.supertype.is_none() {
            self.composite.encode(buf);
            return;
        }
        buf.push(if self.is_final { 0x4F } else { 0x50 });
        match self.supertype {
            Some(idx) => {
                leb::write_u32(buf, 1);
                leb::write_u32(buf, idx);
            }
            None => leb::write_u32(buf, 0),
        }
        self.composite.encode(buf);
    }

    #[must_use]
    pub fn as_func(&self) -> Option<(&[ValType], &[ValType])> {
        match &self.composite {
            CompositeType::Func { params, results } => Some((params, results)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_struct(&self) -> Option<&[FieldType]> {
        match &self.composite {
            CompositeType::Struct { fields } => Some(fields),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&FieldType> {
        match &self.composite {
            CompositeType::Array { element } => Some(element),
            _ => None,
        }
    }
}
