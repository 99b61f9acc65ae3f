// src/types/relations.rs
//
// The four progressively weaker type relations of IEEE 1800 §6.22:
// matching, equivalent, assignment compatible, and cast compatible. Pure
// functions over the arena; each level starts by delegating to the level
// above it.

use super::{FloatKind, Type, TypeArena, TypeId};

/// §6.22.1 — structural identity.
pub fn is_matching(arena: &TypeArena, a: TypeId, b: TypeId) -> bool {
    let l = arena.canonical(a);
    let r = arena.canonical(b);

    // Interning makes identical shapes share an id; this covers the
    // predefined types and most vector types outright.
    if l == r {
        return true;
    }

    let lt = arena.get(l);
    let rt = arena.get(r);

    // real and realtime are synonyms.
    if let (Type::Floating { kind: lk }, Type::Floating { kind: rk }) = (lt, rt) {
        let is_real = |k: FloatKind| matches!(k, FloatKind::Real | FloatKind::RealTime);
        return is_real(*lk) && is_real(*rk);
    }

    // Simple bit vectors match on signedness, four-stateness, and range,
    // regardless of which keyword produced them (byte vs bit signed [7:0]).
    if arena.is_simple_bit_vector(l)
        && arena.is_simple_bit_vector(r)
        && !(matches!(lt, Type::PackedArray { .. }) && matches!(rt, Type::PackedArray { .. }))
    {
        return arena.is_signed(l) == arena.is_signed(r)
            && arena.is_four_state(l) == arena.is_four_state(r)
            && arena.bit_vector_range(l) == arena.bit_vector_range(r);
    }

    // Arrays match by flavor, matching elements, and identical shape.
    match (lt, rt) {
        (
            Type::PackedArray { element: le, left: ll, right: lr },
            Type::PackedArray { element: re, left: rl, right: rr },
        )
        | (
            Type::FixedUnpackedArray { element: le, left: ll, right: lr },
            Type::FixedUnpackedArray { element: re, left: rl, right: rr },
        ) => (ll, lr) == (rl, rr) && is_matching(arena, *le, *re),
        (Type::DynamicArray { element: le }, Type::DynamicArray { element: re }) => {
            is_matching(arena, *le, *re)
        }
        (
            Type::Queue { element: le, max_bound: lb },
            Type::Queue { element: re, max_bound: rb },
        ) => lb == rb && is_matching(arena, *le, *re),
        (
            Type::AssociativeArray { element: le, index: li },
            Type::AssociativeArray { element: re, index: ri },
        ) => {
            let index_ok = match (li, ri) {
                (None, None) => true,
                (Some(li), Some(ri)) => is_matching(arena, *li, *ri),
                _ => false,
            };
            index_ok && is_matching(arena, *le, *re)
        }
        // Enums declared by the same syntax (e.g. one include pulled into
        // several units) count as matching; interning already merged the
        // truly identical ones.
        (
            Type::Enum { base: lbase, members: lm, .. },
            Type::Enum { base: rbase, members: rm, .. },
        ) => is_matching(arena, *lbase, *rbase) && lm == rm,
        (
            Type::VirtualInterface { iface: li, modport: lm },
            Type::VirtualInterface { iface: ri, modport: rm },
        ) => li == ri && lm == rm,
        _ => false,
    }
}

/// §6.22.2 — equivalence: matching, or same-shaped packed integrals, or
/// arrays with equivalent elements and compatible shape.
pub fn is_equivalent(arena: &TypeArena, a: TypeId, b: TypeId) -> bool {
    let l = arena.canonical(a);
    let r = arena.canonical(b);
    if is_matching(arena, l, r) {
        return true;
    }

    // Packed integral types are equivalent when signedness, four-stateness,
    // and bit width agree; the actual bounds may differ. Enums keep their
    // identity here.
    if arena.is_integral(l) && arena.is_integral(r) && !arena.is_enum(l) && !arena.is_enum(r) {
        return arena.is_signed(l) == arena.is_signed(r)
            && arena.is_four_state(l) == arena.is_four_state(r)
            && arena.bit_width(l) == arena.bit_width(r);
    }

    match (arena.get(l), arena.get(r)) {
        // Fixed-size unpacked arrays: same element equivalence and equal
        // range width, bounds free.
        (
            Type::FixedUnpackedArray { element: le, left: ll, right: lr },
            Type::FixedUnpackedArray { element: re, left: rl, right: rr },
        ) => {
            let lw = (ll - lr).unsigned_abs() + 1;
            let rw = (rl - rr).unsigned_abs() + 1;
            lw == rw && is_equivalent(arena, *le, *re)
        }
        (Type::DynamicArray { element: le }, Type::DynamicArray { element: re })
        | (Type::Queue { element: le, .. }, Type::Queue { element: re, .. }) => {
            is_equivalent(arena, *le, *re)
        }
        (
            Type::AssociativeArray { element: le, index: li },
            Type::AssociativeArray { element: re, index: ri },
        ) => {
            let index_ok = match (li, ri) {
                (None, None) => true,
                (Some(li), Some(ri)) => is_equivalent(arena, *li, *ri),
                _ => false,
            };
            index_ok && is_equivalent(arena, *le, *re)
        }
        _ => false,
    }
}

/// §6.22.3 — assignment compatibility: the implicit-conversion relation.
pub fn is_assignment_compatible(arena: &TypeArena, target: TypeId, source: TypeId) -> bool {
    let l = arena.canonical(target);
    let r = arena.canonical(source);
    if is_equivalent(arena, l, r) {
        return true;
    }

    // The error type converts to and from anything.
    if arena.is_error(l) || arena.is_error(r) {
        return true;
    }

    // Any integral or floating value implicitly converts to a packed
    // integral or floating target (enum targets excluded).
    if (arena.is_integral(l) && !arena.is_enum(l)) || arena.is_floating(l) {
        return arena.is_integral(r) || arena.is_floating(r) || arena.is_unbounded(r);
    }

    if arena.is_unpacked_array(l) && arena.is_unpacked_array(r) {
        // Associative arrays are only compatible when equivalent, which
        // was already ruled out above.
        let assoc = |id| matches!(arena.get(id), Type::AssociativeArray { .. });
        if assoc(l) || assoc(r) {
            return false;
        }
        // Two fixed-size arrays that are not equivalent have unequal
        // widths or non-equivalent elements; everything else defers the
        // size check to runtime and needs only element equivalence.
        if let (Type::FixedUnpackedArray { .. }, Type::FixedUnpackedArray { .. }) =
            (arena.get(l), arena.get(r))
        {
            return false;
        }
        let le = arena.element_type(l);
        let re = arena.element_type(r);
        return matches!((le, re), (Some(le), Some(re)) if is_equivalent(arena, le, re));
    }

    if let Type::Class { class: lc } = arena.get(l) {
        if arena.is_null(r) {
            return true;
        }
        if let Type::Class { class: rc } = arena.get(r) {
            // Up-casts and interface-class implementations are resolved by
            // the symbol layer, which consults the inheritance chain; at
            // the type level only identity is decidable.
            return lc == rc;
        }
        return false;
    }

    if let Type::VirtualInterface { iface: li, modport: lm } = arena.get(l) {
        if arena.is_null(r) {
            return true;
        }
        if let Type::VirtualInterface { iface: ri, modport: rm } = arena.get(r) {
            if li != ri {
                return false;
            }
            // A no-modport source may be assigned to a modport view.
            return lm == rm || (lm.is_some() && rm.is_none());
        }
        return false;
    }

    // Null assigns to chandles and events.
    if matches!(arena.get(l), Type::Chandle | Type::Event) {
        return arena.is_null(r);
    }

    false
}

/// §6.22.4 — cast compatibility: assignment compatibility plus the
/// explicit-cast escapes.
pub fn is_cast_compatible(arena: &TypeArena, target: TypeId, source: TypeId) -> bool {
    let l = arena.canonical(target);
    let r = arena.canonical(source);
    if is_assignment_compatible(arena, l, r) {
        return true;
    }

    if arena.is_enum(l) {
        return arena.is_integral(r) || arena.is_floating(r);
    }

    if arena.is_string(l) {
        return arena.is_integral(r);
    }
    if arena.is_string(r) {
        return arena.is_integral(l);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldInfo, IntegralKind};
    use sylva_numeric::SVInt;

    fn arena() -> TypeArena {
        TypeArena::new()
    }

    #[test]
    fn matching_is_reflexive_on_builtins() {
        let a = arena();
        let b = a.builtins();
        for ty in [b.bit, b.logic, b.int, b.real, b.string, b.event] {
            assert!(is_matching(&a, ty, ty));
            assert!(is_equivalent(&a, ty, ty));
            assert!(is_assignment_compatible(&a, ty, ty));
        }
    }

    #[test]
    fn real_and_realtime_match() {
        let a = arena();
        let b = a.builtins();
        assert!(is_matching(&a, b.real, b.realtime));
        assert!(is_matching(&a, b.realtime, b.real));
        assert!(!is_matching(&a, b.shortreal, b.real));
    }

    #[test]
    fn byte_matches_signed_two_state_vector() {
        let mut a = arena();
        let byte = a.builtins().byte;
        let vec8 = a.bit_vector(8, true, false);
        assert!(is_matching(&a, byte, vec8));

        // Different range does not match but is equivalent.
        let shifted = a.intern(Type::Integral {
            kind: IntegralKind::Bit,
            signed: true,
            four_state: false,
            left: 8,
            right: 1,
        });
        assert!(!is_matching(&a, byte, shifted));
        assert!(is_equivalent(&a, byte, shifted));
    }

    #[test]
    fn integral_equivalence_ignores_keyword() {
        let mut a = arena();
        let int = a.builtins().int;
        let bit32 = a.bit_vector(32, true, false);
        assert!(is_equivalent(&a, int, bit32));

        // Four-stateness matters.
        let logic32 = a.bit_vector(32, true, true);
        assert!(!is_equivalent(&a, int, logic32));
        // But both still assignment-convert.
        assert!(is_assignment_compatible(&a, int, logic32));
    }

    #[test]
    fn fixed_unpacked_arrays_compare_by_width() {
        let mut a = arena();
        let int = a.builtins().int;
        let arr_0_3 = a.intern(Type::FixedUnpackedArray { element: int, left: 0, right: 3 });
        let arr_1_4 = a.intern(Type::FixedUnpackedArray { element: int, left: 1, right: 4 });
        let arr_0_4 = a.intern(Type::FixedUnpackedArray { element: int, left: 0, right: 4 });

        assert!(!is_matching(&a, arr_0_3, arr_1_4));
        assert!(is_equivalent(&a, arr_0_3, arr_1_4));
        assert!(!is_equivalent(&a, arr_0_3, arr_0_4));
        // Unequal widths are not assignable either.
        assert!(!is_assignment_compatible(&a, arr_0_3, arr_0_4));
    }

    #[test]
    fn dynamic_and_queue_arrays() {
        let mut a = arena();
        let int = a.builtins().int;
        let bit32 = a.bit_vector(32, true, false);
        let dyn_int = a.intern(Type::DynamicArray { element: int });
        let dyn_bit32 = a.intern(Type::DynamicArray { element: bit32 });
        let queue_int = a.intern(Type::Queue { element: int, max_bound: None });
        let fixed_int = a.intern(Type::FixedUnpackedArray { element: int, left: 3, right: 0 });

        assert!(is_equivalent(&a, dyn_int, dyn_bit32));
        assert!(!is_equivalent(&a, dyn_int, queue_int));
        // Dynamic <- fixed of equivalent elements is assignable.
        assert!(is_assignment_compatible(&a, dyn_int, fixed_int));
    }

    #[test]
    fn associative_arrays_need_equivalent_index() {
        let mut a = arena();
        let int = a.builtins().int;
        let string = a.builtins().string;
        let by_int = a.intern(Type::AssociativeArray { element: int, index: Some(int) });
        let by_str = a.intern(Type::AssociativeArray { element: int, index: Some(string) });
        let wild = a.intern(Type::AssociativeArray { element: int, index: None });

        assert!(is_equivalent(&a, by_int, by_int));
        assert!(!is_equivalent(&a, by_int, by_str));
        assert!(!is_equivalent(&a, by_int, wild));
        // Associative arrays never assignment-convert across shapes.
        let dyn_int = a.intern(Type::DynamicArray { element: int });
        assert!(!is_assignment_compatible(&a, by_int, dyn_int));
    }

    #[test]
    fn enums_keep_identity_but_cast() {
        let mut a = arena();
        let int = a.builtins().int;
        let decl = crate::symbols::SymbolId::from_raw(1);
        let decl2 = crate::symbols::SymbolId::from_raw(2);
        let e1 = a.intern(Type::Enum {
            base: int,
            members: vec![("A".into(), SVInt::from_i64(0))],
            decl,
        });
        let e2 = a.intern(Type::Enum {
            base: int,
            members: vec![("B".into(), SVInt::from_i64(0))],
            decl: decl2,
        });

        assert!(is_matching(&a, e1, e1));
        assert!(!is_equivalent(&a, e1, e2));
        // Enum -> integral converts implicitly; integral -> enum needs a cast.
        assert!(is_assignment_compatible(&a, int, e1));
        assert!(!is_assignment_compatible(&a, e1, int));
        assert!(is_cast_compatible(&a, e1, int));
        assert!(is_cast_compatible(&a, e1, a.builtins().real));
    }

    #[test]
    fn string_casts() {
        let a = arena();
        let b = a.builtins();
        assert!(!is_assignment_compatible(&a, b.string, b.int));
        assert!(is_cast_compatible(&a, b.string, b.int));
        assert!(is_cast_compatible(&a, b.int, b.string));
        assert!(!is_cast_compatible(&a, b.real, b.string));
    }

    #[test]
    fn null_assigns_to_handle_types() {
        let a = arena();
        let b = a.builtins();
        assert!(is_assignment_compatible(&a, b.chandle, b.null));
        assert!(is_assignment_compatible(&a, b.event, b.null));
        assert!(!is_assignment_compatible(&a, b.chandle, b.int));
    }

    #[test]
    fn error_type_suppresses_cascades() {
        let a = arena();
        let b = a.builtins();
        assert!(is_assignment_compatible(&a, b.error, b.string));
        assert!(is_assignment_compatible(&a, b.event, b.error));
    }

    #[test]
    fn aliases_are_transparent_to_all_relations() {
        let mut a = arena();
        let int = a.builtins().int;
        let alias = a.intern(Type::Alias { name: "t".into(), target: int });
        let bit32 = a.bit_vector(32, true, false);

        assert!(is_matching(&a, alias, int));
        assert!(is_matching(&a, int, alias));
        assert!(is_equivalent(&a, alias, bit32));
        assert!(is_assignment_compatible(&a, alias, a.builtins().real));
    }

    #[test]
    fn matching_is_symmetric_and_transitive_on_samples() {
        let mut a = arena();
        let samples = [
            a.builtins().int,
            a.builtins().logic,
            a.bit_vector(8, true, false),
            a.builtins().byte,
            a.builtins().real,
            a.builtins().realtime,
            a.builtins().string,
        ];
        for &x in &samples {
            assert!(is_matching(&a, x, x));
            for &y in &samples {
                assert_eq!(is_matching(&a, x, y), is_matching(&a, y, x));
                for &z in &samples {
                    if is_matching(&a, x, y) && is_matching(&a, y, z) {
                        assert!(is_matching(&a, x, z));
                    }
                }
            }
        }
    }

    #[test]
    fn packed_struct_equivalence_by_width() {
        let mut a = arena();
        let logic8 = a.bit_vector(8, false, true);
        let st = a.intern(Type::PackedStruct {
            fields: vec![
                FieldInfo { name: "a".into(), ty: logic8 },
                FieldInfo { name: "b".into(), ty: logic8 },
            ],
            signed: false,
        });
        let vec16 = a.bit_vector(16, false, true);
        // A packed struct is an integral type of its total width.
        assert!(is_equivalent(&a, st, vec16));
    }
}
