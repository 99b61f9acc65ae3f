// src/types/mod.rs
//
// The interned type system: TypeId handles into a per-compilation arena
// with automatic deduplication, so type matching is usually an id
// comparison. Built-in types are interned once up front.

pub mod relations;
mod resolve;

use hashbrown::HashMap;
use smallvec::SmallVec;
use sylva_numeric::SVInt;

use crate::symbols::SymbolId;

/// Handle to an interned type. Copyable, trivially comparable; identity
/// comparison on canonical ids decides type *matching* for most shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// The keyword a packed integral type was declared with; kept for
/// diagnostics. `reg` and `logic` collapse to the same canonical type and
/// differ only in this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegralKind {
    Bit,
    Logic,
    Reg,
    Byte,
    ShortInt,
    Int,
    LongInt,
    Integer,
    Time,
}

impl IntegralKind {
    pub fn keyword(self) -> &'static str {
        match self {
            IntegralKind::Bit => "bit",
            IntegralKind::Logic => "logic",
            IntegralKind::Reg => "reg",
            IntegralKind::Byte => "byte",
            IntegralKind::ShortInt => "shortint",
            IntegralKind::Int => "int",
            IntegralKind::LongInt => "longint",
            IntegralKind::Integer => "integer",
            IntegralKind::Time => "time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    ShortReal,
    Real,
    RealTime,
}

/// One named field of a struct or union.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub name: String,
    pub ty: TypeId,
}

pub type TypeIdVec = SmallVec<[TypeId; 4]>;

/// The closed sum of SystemVerilog types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// A simple bit vector: scalar or one packed dimension of scalars,
    /// with an inclusive `[left:right]` range. All the predefined integer
    /// types are instances of this shape.
    Integral {
        kind: IntegralKind,
        signed: bool,
        four_state: bool,
        left: i64,
        right: i64,
    },
    /// A packed array whose element is itself packed (multi-dimensional).
    PackedArray {
        element: TypeId,
        left: i64,
        right: i64,
    },
    FixedUnpackedArray {
        element: TypeId,
        left: i64,
        right: i64,
    },
    DynamicArray {
        element: TypeId,
    },
    Queue {
        element: TypeId,
        max_bound: Option<u64>,
    },
    AssociativeArray {
        element: TypeId,
        index: Option<TypeId>,
    },
    PackedStruct {
        fields: Vec<FieldInfo>,
        signed: bool,
    },
    UnpackedStruct {
        fields: Vec<FieldInfo>,
    },
    PackedUnion {
        fields: Vec<FieldInfo>,
        signed: bool,
    },
    UnpackedUnion {
        fields: Vec<FieldInfo>,
        tagged: bool,
    },
    /// Enum: base integral type plus ordered (name, value) members. The
    /// declaring symbol distinguishes otherwise-identical enums.
    Enum {
        base: TypeId,
        members: Vec<(String, SVInt)>,
        decl: SymbolId,
    },
    Floating {
        kind: FloatKind,
    },
    String,
    Chandle,
    Event,
    Void,
    Null,
    Unbounded,
    Untyped,
    Sequence,
    Property,
    /// Class handle type, identified by the class symbol.
    Class {
        class: SymbolId,
    },
    VirtualInterface {
        iface: SymbolId,
        modport: Option<String>,
    },
    /// Typedef: display name plus resolved target; the canonical type is
    /// the target's canonical type.
    Alias {
        name: String,
        target: TypeId,
    },
    /// The error type; assignment compatible with everything so a single
    /// failure does not cascade.
    Error,
}

/// Pre-interned types for O(1) access.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinTypes {
    pub bit: TypeId,
    pub logic: TypeId,
    pub reg: TypeId,
    pub byte: TypeId,
    pub shortint: TypeId,
    pub int: TypeId,
    pub longint: TypeId,
    pub integer: TypeId,
    pub time: TypeId,
    pub real: TypeId,
    pub shortreal: TypeId,
    pub realtime: TypeId,
    pub string: TypeId,
    pub chandle: TypeId,
    pub event: TypeId,
    pub void: TypeId,
    pub null: TypeId,
    pub unbounded: TypeId,
    pub error: TypeId,
}

/// Per-compilation type storage with hash-consing.
pub struct TypeArena {
    types: Vec<Type>,
    dedup: HashMap<Type, TypeId>,
    builtins: BuiltinTypes,
}

fn integral(kind: IntegralKind, signed: bool, four_state: bool, width: u32) -> Type {
    Type::Integral {
        kind,
        signed,
        four_state,
        left: width as i64 - 1,
        right: 0,
    }
}

impl TypeArena {
    pub fn new() -> TypeArena {
        let placeholder = TypeId(0);
        let mut arena = TypeArena {
            types: Vec::new(),
            dedup: HashMap::new(),
            builtins: BuiltinTypes {
                bit: placeholder,
                logic: placeholder,
                reg: placeholder,
                byte: placeholder,
                shortint: placeholder,
                int: placeholder,
                longint: placeholder,
                integer: placeholder,
                time: placeholder,
                real: placeholder,
                shortreal: placeholder,
                realtime: placeholder,
                string: placeholder,
                chandle: placeholder,
                event: placeholder,
                void: placeholder,
                null: placeholder,
                unbounded: placeholder,
                error: placeholder,
            },
        };

        arena.builtins = BuiltinTypes {
            bit: arena.intern(integral(IntegralKind::Bit, false, false, 1)),
            logic: arena.intern(integral(IntegralKind::Logic, false, true, 1)),
            reg: arena.intern(integral(IntegralKind::Reg, false, true, 1)),
            byte: arena.intern(integral(IntegralKind::Byte, true, false, 8)),
            shortint: arena.intern(integral(IntegralKind::ShortInt, true, false, 16)),
            int: arena.intern(integral(IntegralKind::Int, true, false, 32)),
            longint: arena.intern(integral(IntegralKind::LongInt, true, false, 64)),
            integer: arena.intern(integral(IntegralKind::Integer, true, true, 32)),
            time: arena.intern(integral(IntegralKind::Time, false, true, 64)),
            real: arena.intern(Type::Floating { kind: FloatKind::Real }),
            shortreal: arena.intern(Type::Floating {
                kind: FloatKind::ShortReal,
            }),
            realtime: arena.intern(Type::Floating {
                kind: FloatKind::RealTime,
            }),
            string: arena.intern(Type::String),
            chandle: arena.intern(Type::Chandle),
            event: arena.intern(Type::Event),
            void: arena.intern(Type::Void),
            null: arena.intern(Type::Null),
            unbounded: arena.intern(Type::Unbounded),
            error: arena.intern(Type::Error),
        };
        arena
    }

    pub fn builtins(&self) -> &BuiltinTypes {
        &self.builtins
    }

    /// Interns a type, deduplicating structurally identical ones. The
    /// `reg`/`logic` spelling difference is normalized away so both share
    /// one canonical entry; aliases always get their own node so the
    /// typedef name survives for display.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Type::Alias { .. } = ty {
            let id = TypeId(self.types.len() as u32);
            self.types.push(ty);
            return id;
        }
        let key = normalize_for_dedup(&ty);
        if let Some(&id) = self.dedup.get(&key) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        self.dedup.insert(key, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    /// Resolves alias chains to the canonical type id.
    pub fn canonical(&self, id: TypeId) -> TypeId {
        let mut cur = id;
        loop {
            match self.get(cur) {
                Type::Alias { target, .. } => cur = *target,
                _ => return cur,
            }
        }
    }

    /// The simple bit vector `[width-1:0]` with the given properties.
    pub fn bit_vector(&mut self, width: u32, signed: bool, four_state: bool) -> TypeId {
        let kind = if four_state {
            IntegralKind::Logic
        } else {
            IntegralKind::Bit
        };
        self.intern(integral(kind, signed, four_state, width.max(1)))
    }

    // ----- queries over canonical types -----------------------------------

    pub fn is_integral(&self, id: TypeId) -> bool {
        matches!(
            self.get(self.canonical(id)),
            Type::Integral { .. }
                | Type::PackedArray { .. }
                | Type::PackedStruct { .. }
                | Type::PackedUnion { .. }
                | Type::Enum { .. }
        )
    }

    pub fn is_floating(&self, id: TypeId) -> bool {
        matches!(self.get(self.canonical(id)), Type::Floating { .. })
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        self.is_integral(id) || self.is_floating(id)
    }

    pub fn is_enum(&self, id: TypeId) -> bool {
        matches!(self.get(self.canonical(id)), Type::Enum { .. })
    }

    pub fn is_class(&self, id: TypeId) -> bool {
        matches!(self.get(self.canonical(id)), Type::Class { .. })
    }

    pub fn is_error(&self, id: TypeId) -> bool {
        matches!(self.get(self.canonical(id)), Type::Error)
    }

    pub fn is_string(&self, id: TypeId) -> bool {
        matches!(self.get(self.canonical(id)), Type::String)
    }

    pub fn is_null(&self, id: TypeId) -> bool {
        matches!(self.get(self.canonical(id)), Type::Null)
    }

    pub fn is_unbounded(&self, id: TypeId) -> bool {
        matches!(self.get(self.canonical(id)), Type::Unbounded)
    }

    pub fn is_unpacked_array(&self, id: TypeId) -> bool {
        matches!(
            self.get(self.canonical(id)),
            Type::FixedUnpackedArray { .. }
                | Type::DynamicArray { .. }
                | Type::Queue { .. }
                | Type::AssociativeArray { .. }
        )
    }

    /// A one-dimension packed vector of scalars (or a predefined integer
    /// type), the shape most expressions produce.
    pub fn is_simple_bit_vector(&self, id: TypeId) -> bool {
        match self.get(self.canonical(id)) {
            Type::Integral { .. } => true,
            Type::PackedArray { element, .. } => {
                matches!(self.get(self.canonical(*element)), Type::Integral { left, right, .. }
                    if left == right)
            }
            _ => false,
        }
    }

    /// Bit width of an integral (or floating) type; zero otherwise.
    pub fn bit_width(&self, id: TypeId) -> u32 {
        match self.get(self.canonical(id)) {
            Type::Integral { left, right, .. } => (left - right).unsigned_abs() as u32 + 1,
            Type::PackedArray { element, left, right } => {
                self.bit_width(*element) * ((left - right).unsigned_abs() as u32 + 1)
            }
            Type::PackedStruct { fields, .. } => {
                fields.iter().map(|f| self.bit_width(f.ty)).sum()
            }
            Type::PackedUnion { fields, .. } => fields
                .iter()
                .map(|f| self.bit_width(f.ty))
                .max()
                .unwrap_or(0),
            Type::Enum { base, .. } => self.bit_width(*base),
            Type::Floating { kind: FloatKind::ShortReal } => 32,
            Type::Floating { .. } => 64,
            _ => 0,
        }
    }

    /// The `[left:right]` range of a simple bit vector.
    pub fn bit_vector_range(&self, id: TypeId) -> Option<(i64, i64)> {
        match self.get(self.canonical(id)) {
            Type::Integral { left, right, .. } => Some((*left, *right)),
            Type::PackedArray { left, right, .. } => Some((*left, *right)),
            _ => None,
        }
    }

    pub fn is_signed(&self, id: TypeId) -> bool {
        match self.get(self.canonical(id)) {
            Type::Integral { signed, .. } => *signed,
            Type::PackedStruct { signed, .. } | Type::PackedUnion { signed, .. } => *signed,
            Type::Enum { base, .. } => self.is_signed(*base),
            Type::Floating { .. } => true,
            _ => false,
        }
    }

    pub fn is_four_state(&self, id: TypeId) -> bool {
        match self.get(self.canonical(id)) {
            Type::Integral { four_state, .. } => *four_state,
            Type::PackedArray { element, .. } => self.is_four_state(*element),
            Type::PackedStruct { fields, .. } | Type::PackedUnion { fields, .. } => {
                fields.iter().any(|f| self.is_four_state(f.ty))
            }
            Type::Enum { base, .. } => self.is_four_state(*base),
            _ => false,
        }
    }

    /// Element type of any array flavor.
    pub fn element_type(&self, id: TypeId) -> Option<TypeId> {
        match self.get(self.canonical(id)) {
            Type::PackedArray { element, .. }
            | Type::FixedUnpackedArray { element, .. }
            | Type::DynamicArray { element }
            | Type::Queue { element, .. }
            | Type::AssociativeArray { element, .. } => Some(*element),
            _ => None,
        }
    }

    /// Human-readable type name for diagnostics.
    pub fn display(&self, id: TypeId) -> String {
        match self.get(id) {
            Type::Integral {
                kind,
                signed,
                left,
                right,
                ..
            } => {
                let mut out = kind.keyword().to_string();
                let scalar = matches!(
                    kind,
                    IntegralKind::Bit | IntegralKind::Logic | IntegralKind::Reg
                );
                if *signed && scalar {
                    out.push_str(" signed");
                }
                if scalar && !(*left == 0 && *right == 0) {
                    out = format!("{out}[{left}:{right}]");
                }
                out
            }
            Type::PackedArray { element, left, right } => {
                format!("{}[{left}:{right}]", self.display(*element))
            }
            Type::FixedUnpackedArray { element, left, right } => {
                format!("{}$[{left}:{right}]", self.display(*element))
            }
            Type::DynamicArray { element } => format!("{}[]", self.display(*element)),
            Type::Queue { element, .. } => format!("{}[$]", self.display(*element)),
            Type::AssociativeArray { element, index } => match index {
                Some(ix) => format!("{}[{}]", self.display(*element), self.display(*ix)),
                None => format!("{}[*]", self.display(*element)),
            },
            Type::PackedStruct { .. } => "packed struct".to_string(),
            Type::UnpackedStruct { .. } => "struct".to_string(),
            Type::PackedUnion { .. } => "packed union".to_string(),
            Type::UnpackedUnion { tagged, .. } => {
                if *tagged {
                    "tagged union".to_string()
                } else {
                    "union".to_string()
                }
            }
            Type::Enum { .. } => "enum".to_string(),
            Type::Floating { kind } => match kind {
                FloatKind::ShortReal => "shortreal".to_string(),
                FloatKind::Real => "real".to_string(),
                FloatKind::RealTime => "realtime".to_string(),
            },
            Type::String => "string".to_string(),
            Type::Chandle => "chandle".to_string(),
            Type::Event => "event".to_string(),
            Type::Void => "void".to_string(),
            Type::Null => "null".to_string(),
            Type::Unbounded => "$".to_string(),
            Type::Untyped => "untyped".to_string(),
            Type::Sequence => "sequence".to_string(),
            Type::Property => "property".to_string(),
            Type::Class { .. } => "class".to_string(),
            Type::VirtualInterface { .. } => "virtual interface".to_string(),
            Type::Alias { name, .. } => name.clone(),
            Type::Error => "<error>".to_string(),
        }
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_for_dedup(ty: &Type) -> Type {
    match ty {
        Type::Integral {
            kind: IntegralKind::Reg,
            signed,
            four_state,
            left,
            right,
        } => Type::Integral {
            kind: IntegralKind::Logic,
            signed: *signed,
            four_state: *four_state,
            left: *left,
            right: *right,
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_interned_once() {
        let mut arena = TypeArena::new();
        let int_again = arena.intern(integral(IntegralKind::Int, true, false, 32));
        assert_eq!(int_again, arena.builtins().int);
    }

    #[test]
    fn reg_and_logic_share_a_canonical_type() {
        let mut arena = TypeArena::new();
        let reg = arena.intern(integral(IntegralKind::Reg, false, true, 1));
        assert_eq!(reg, arena.builtins().logic);
    }

    #[test]
    fn widths_and_ranges() {
        let mut arena = TypeArena::new();
        let v16 = arena.bit_vector(16, false, true);
        assert_eq!(arena.bit_width(v16), 16);
        assert_eq!(arena.bit_vector_range(v16), Some((15, 0)));
        assert!(arena.is_four_state(v16));
        assert!(arena.is_simple_bit_vector(v16));

        // Identical requests share an id.
        assert_eq!(v16, arena.bit_vector(16, false, true));
        assert_ne!(v16, arena.bit_vector(16, true, true));
    }

    #[test]
    fn alias_resolves_to_canonical() {
        let mut arena = TypeArena::new();
        let int = arena.builtins().int;
        let alias = arena.intern(Type::Alias {
            name: "my_int_t".to_string(),
            target: int,
        });
        assert_ne!(alias, int);
        assert_eq!(arena.canonical(alias), int);
        assert_eq!(arena.display(alias), "my_int_t");
        assert_eq!(arena.bit_width(alias), 32);
        assert!(arena.is_integral(alias));
    }

    #[test]
    fn packed_struct_width_sums_fields() {
        let mut arena = TypeArena::new();
        let logic8 = arena.bit_vector(8, false, true);
        let st = arena.intern(Type::PackedStruct {
            fields: vec![
                FieldInfo { name: "lo".into(), ty: logic8 },
                FieldInfo { name: "hi".into(), ty: logic8 },
            ],
            signed: false,
        });
        assert_eq!(arena.bit_width(st), 16);
        assert!(arena.is_integral(st));
    }
}
