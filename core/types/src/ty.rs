//! Semantic type representation (spec §3.2).

use rustc_hash::FxHashMap;
use zena_ast::ModuleId;

/// Identity handle into [`crate::TypeUniverse`]. Two `TypeId`s compare
/// equal iff the universe considers the types they name the same —
/// that's the whole point of interning.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TypeId(pub(crate) u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PrimitiveKind {
    I32,
    I64,
    F32,
    F64,
    Boolean,
    Void,
    Never,
    Any,
    AnyRef,
    ByteArray,
}

/// One field of a class or record: its type and whether it can be
/// reassigned after construction.
#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: String,
    pub ty: TypeId,
    pub is_mut: bool,
}

#[derive(Clone, Debug)]
pub struct ClassType {
    pub name: String,
    pub module: ModuleId,
    /// Ordered: parent fields first, then this class's own — the order
    /// codegen's struct layout (§4.5.1) lays slots out in.
    pub fields: Vec<FieldInfo>,
    pub methods: FxHashMap<String, TypeId>,
    pub constructor_type: Option<TypeId>,
    pub super_class: Option<TypeId>,
    pub implements: Vec<TypeId>,
    /// Placeholder `TypeParameter` types introduced by this declaration,
    /// empty for non-generic classes.
    pub type_parameters: Vec<TypeId>,
    /// Set only when this `ClassType` is an *instantiation* of a generic
    /// declaration: `Some(args)` turns `generic_source` from "this is the
    /// generic template" into "this is `generic_source<args>`".
    pub type_arguments: Option<Vec<TypeId>>,
    /// The declaration this type was instantiated from. `None` for the
    /// generic declaration itself (or for a non-generic class).
    pub generic_source: Option<TypeId>,
    pub is_final: bool,
    pub is_extension: bool,
    pub on_type: Option<TypeId>,
}

#[derive(Clone, Debug)]
pub struct InterfaceType {
    pub name: String,
    pub module: ModuleId,
    pub methods: FxHashMap<String, TypeId>,
    pub properties: FxHashMap<String, (TypeId, bool)>,
    /// Declaration order matters: spec §9 leaves the secondary
    /// "search by interface subtype" scan's tie-break unspecified and
    /// directs implementers to pick a deterministic rule. We use
    /// declaration order.
    pub parent_interfaces: Vec<TypeId>,
    pub type_parameters: Vec<TypeId>,
    pub type_arguments: Option<Vec<TypeId>>,
    pub generic_source: Option<TypeId>,
}

#[derive(Clone, Debug)]
pub struct FunctionType {
    pub parameters: Vec<TypeId>,
    pub return_type: TypeId,
    pub type_parameters: Vec<TypeId>,
}

#[derive(Clone, Debug)]
pub struct RecordType {
    /// Sorted by field name — the canonical form used as the intern key.
    pub fields: Vec<(String, TypeId)>,
}

#[derive(Clone, Debug)]
pub struct ArrayType {
    pub element_type: TypeId,
}

#[derive(Clone, Debug)]
pub struct TypeAliasType {
    pub name: String,
    pub module: ModuleId,
    pub target: TypeId,
    /// Distinct aliases are nominal: assignment across the boundary
    /// requires an explicit `as` cast even though the representation is
    /// identical to `target`.
    pub is_distinct: bool,
    pub type_parameters: Vec<TypeId>,
    pub type_arguments: Option<Vec<TypeId>>,
    pub generic_source: Option<TypeId>,
}

#[derive(Clone, Debug)]
pub struct EnumType {
    pub name: String,
    pub module: ModuleId,
    /// Declaration order preserved; spec's DCE and codegen only need the
    /// discriminant map, but keeping order lets diagnostics list variants
    /// the way the user wrote them.
    pub variants: Vec<(String, i32)>,
}

#[derive(Clone, Debug)]
pub struct TypeParameterType {
    pub name: String,
    pub upper_bound: Option<TypeId>,
    pub default: Option<TypeId>,
    /// Uniquely identifies *this* declaration site — two type parameters
    /// named `T` on unrelated generics are never the same `TypeParameter`
    /// type, even though `substitute` may map either of them away.
    pub declaration_site: u32,
}

/// The tagged variant every concrete semantic type is stored as. Matching
/// is always exhaustive — there is no downcasting escape hatch.
#[derive(Clone, Debug)]
pub enum Type {
    Primitive(PrimitiveKind),
    Str,
    /// The type of the `null` literal. Not one of spec §3.2's primitive
    /// kinds — it only ever appears bare or as a union member (`T |
    /// null`), never as a standalone annotation.
    Null,
    Class(ClassType),
    Interface(InterfaceType),
    Function(FunctionType),
    Record(RecordType),
    /// Not currently interned — spec §9 leaves this as an explicit open
    /// point; see `DESIGN.md` for the decision record.
    Tuple(Vec<TypeId>),
    UnboxedTuple(Vec<TypeId>),
    Array(ArrayType),
    /// Normalized: flattened, deduped by identity, `never` removed,
    /// singleton collapsed — by the time a `Union` reaches the arena it
    /// always has at least two distinct members.
    Union(Vec<TypeId>),
    TypeAlias(TypeAliasType),
    Enum(EnumType),
    TypeParameter(TypeParameterType),
    /// Reserved-but-not-yet-populated slot (spec §9: "allocate the Type
    /// node, then populate its fields/methods, so other types may hold a
    /// reference to it during its own construction"). Never observed
    /// outside `TypeUniverse` internals once registration completes.
    Reserved,
}
