use std::collections::HashSet;

use crate::{
    canonicalize_named, instantiate_as_supertype, ClassType, PrimitiveType, Type, TypeEnv,
    TypeVarId, WildcardBound,
};

/// Nominal subtyping with invariant generics and wildcard containment
/// (JLS 4.10). Best-effort: placeholder (`Unknown`/`Error`) operands are
/// treated as compatible so one unresolved type does not cascade.
pub fn is_subtype(env: &dyn TypeEnv, s: &Type, t: &Type) -> bool {
    let mut seen = HashSet::new();
    is_subtype_inner(env, s, t, &mut seen)
}

fn is_subtype_inner(
    env: &dyn TypeEnv,
    s: &Type,
    t: &Type,
    seen_type_vars: &mut HashSet<TypeVarId>,
) -> bool {
    let s = canonicalize_named(env, s);
    let t = canonicalize_named(env, t);

    if s == t {
        return true;
    }
    if s.is_errorish() || t.is_errorish() {
        return true;
    }

    match (&s, &t) {
        (Type::Null, _) => return t.is_reference(),
        (_, Type::Null) => return false,
        (Type::Primitive(_), _) | (_, Type::Primitive(_)) => return false,
        (Type::Void, _) | (_, Type::Void) => return false,
        _ => {}
    }

    // A top-level wildcard stands for its upper bound on the left.
    if let Type::Wildcard(bound) = &s {
        let upper = wildcard_upper(env, bound);
        return is_subtype_inner(env, &upper, &t, seen_type_vars);
    }
    if let Type::Wildcard(bound) = &t {
        // Only a super-bounded wildcard admits subtypes (of its lower bound).
        return match bound {
            WildcardBound::Super(lower) => is_subtype_inner(env, &s, lower, seen_type_vars),
            _ => false,
        };
    }

    if let Type::Intersection(parts) = &t {
        return parts
            .iter()
            .all(|p| is_subtype_inner(env, &s, p, seen_type_vars));
    }
    if let Type::Intersection(parts) = &s {
        return parts
            .iter()
            .any(|p| is_subtype_inner(env, p, &t, seen_type_vars));
    }

    if let Type::TypeVar(id) = &s {
        if !seen_type_vars.insert(*id) {
            return false;
        }
        let result = match env.type_param(*id) {
            Some(def) if !def.upper_bounds.is_empty() => def
                .upper_bounds
                .iter()
                .any(|b| is_subtype_inner(env, b, &t, seen_type_vars)),
            _ => matches!(&t, Type::Class(ClassType { def, .. }) if *def == env.well_known().object),
        };
        seen_type_vars.remove(id);
        return result;
    }

    if let Type::TypeVar(id) = &t {
        // Only capture variables carry lower bounds.
        let Some(lower) = env.type_param(*id).and_then(|d| d.lower_bound.clone()) else {
            return false;
        };
        return is_subtype_inner(env, &s, &lower, seen_type_vars);
    }

    match (&s, &t) {
        (Type::Array(se), Type::Array(te)) => match (se.as_ref(), te.as_ref()) {
            (Type::Primitive(p), Type::Primitive(q)) => p == q,
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
            (se, te) => is_subtype_inner(env, se, te, seen_type_vars),
        },
        (Type::Array(_), Type::Class(ClassType { def, .. })) => {
            let wk = env.well_known();
            *def == wk.object || *def == wk.cloneable || *def == wk.serializable
        }
        (Type::Class(_), Type::Class(ClassType { def: t_def, args: t_args })) => {
            if *t_def == env.well_known().object {
                return true;
            }
            let Some(sup) = instantiate_as_supertype(env, &s, *t_def) else {
                return false;
            };
            let Type::Class(ClassType { args: s_args, .. }) = sup else {
                return false;
            };
            if t_args.is_empty() {
                // Raw target: every parameterization of the declaration fits.
                return true;
            }
            if s_args.is_empty() {
                // Raw source needs unchecked conversion, which is not subtyping.
                return false;
            }
            if s_args.len() != t_args.len() {
                return false;
            }
            t_args
                .iter()
                .zip(s_args.iter())
                .all(|(ta, sa)| contains(env, ta, sa))
        }
        _ => false,
    }
}

/// Type-argument containment, `sa <= ta` (JLS 4.5.1).
pub fn contains(env: &dyn TypeEnv, ta: &Type, sa: &Type) -> bool {
    if ta == sa {
        return true;
    }
    if ta.is_errorish() || sa.is_errorish() {
        return true;
    }
    match ta {
        Type::Wildcard(WildcardBound::Unbounded) => true,
        Type::Wildcard(WildcardBound::Extends(upper)) => match sa {
            Type::Wildcard(WildcardBound::Extends(s_upper)) => is_subtype(env, s_upper, upper),
            Type::Wildcard(WildcardBound::Unbounded) | Type::Wildcard(WildcardBound::Super(_)) => {
                matches!(upper.as_ref(), Type::Class(ClassType { def, .. })
                    if *def == env.well_known().object)
            }
            _ => is_subtype(env, sa, upper),
        },
        Type::Wildcard(WildcardBound::Super(lower)) => match sa {
            Type::Wildcard(WildcardBound::Super(s_lower)) => is_subtype(env, lower, s_lower),
            Type::Wildcard(_) => false,
            _ => is_subtype(env, lower, sa),
        },
        // Non-wildcard arguments are invariant; equality was checked above.
        _ => false,
    }
}

fn wildcard_upper(env: &dyn TypeEnv, bound: &WildcardBound) -> Type {
    match bound {
        WildcardBound::Extends(upper) => (**upper).clone(),
        WildcardBound::Unbounded | WildcardBound::Super(_) => {
            Type::class(env.well_known().object, vec![])
        }
    }
}

/// Loose invocation compatibility (JLS 5.3): subtyping plus boxing, unboxing,
/// primitive widening, and the raw-supertype unchecked conversion.
pub fn is_assignable_loose(env: &dyn TypeEnv, s: &Type, t: &Type) -> bool {
    if is_subtype(env, s, t) {
        return true;
    }
    match (s, t) {
        (Type::Primitive(p), Type::Primitive(q)) => widens_to(*p, *q),
        (Type::Primitive(p), _) => {
            let boxed_s = boxed(env, *p);
            is_subtype(env, &boxed_s, t)
        }
        (_, Type::Primitive(q)) => match unboxed(env, s) {
            Some(p) => p == *q || widens_to(p, *q),
            None => false,
        },
        (Type::Class(_), Type::Class(ClassType { def: t_def, args: t_args }))
            if !t_args.is_empty() =>
        {
            // Unchecked conversion: the only supertype at T's declaration is raw.
            matches!(
                instantiate_as_supertype(env, s, *t_def),
                Some(Type::Class(ClassType { args, .. })) if args.is_empty()
            )
        }
        _ => false,
    }
}

/// Primitive widening conversion (JLS 5.1.2).
pub fn widens_to(from: PrimitiveType, to: PrimitiveType) -> bool {
    use PrimitiveType::*;
    match from {
        Byte => matches!(to, Short | Int | Long | Float | Double),
        Short => matches!(to, Int | Long | Float | Double),
        Char => matches!(to, Int | Long | Float | Double),
        Int => matches!(to, Long | Float | Double),
        Long => matches!(to, Float | Double),
        Float => matches!(to, Double),
        Boolean | Double => false,
    }
}

/// Boxing conversion (JLS 5.1.7).
pub fn boxed(env: &dyn TypeEnv, p: PrimitiveType) -> Type {
    let wk = env.well_known();
    let id = match p {
        PrimitiveType::Boolean => wk.boolean,
        PrimitiveType::Byte => wk.byte,
        PrimitiveType::Short => wk.short,
        PrimitiveType::Char => wk.character,
        PrimitiveType::Int => wk.integer,
        PrimitiveType::Long => wk.long,
        PrimitiveType::Float => wk.float,
        PrimitiveType::Double => wk.double,
    };
    Type::class(id, vec![])
}

/// Unboxing conversion, when `ty` is a primitive wrapper class.
pub fn unboxed(env: &dyn TypeEnv, ty: &Type) -> Option<PrimitiveType> {
    let Type::Class(ClassType { def, .. }) = canonicalize_named(env, ty) else {
        return None;
    };
    let wk = env.well_known();
    if def == wk.boolean {
        Some(PrimitiveType::Boolean)
    } else if def == wk.byte {
        Some(PrimitiveType::Byte)
    } else if def == wk.short {
        Some(PrimitiveType::Short)
    } else if def == wk.character {
        Some(PrimitiveType::Char)
    } else if def == wk.integer {
        Some(PrimitiveType::Int)
    } else if def == wk.long {
        Some(PrimitiveType::Long)
    } else if def == wk.float {
        Some(PrimitiveType::Float)
    } else if def == wk.double {
        Some(PrimitiveType::Double)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeStore;

    #[test]
    fn primitive_widening_chain() {
        assert!(widens_to(PrimitiveType::Byte, PrimitiveType::Double));
        assert!(widens_to(PrimitiveType::Char, PrimitiveType::Int));
        assert!(!widens_to(PrimitiveType::Long, PrimitiveType::Int));
        assert!(!widens_to(PrimitiveType::Boolean, PrimitiveType::Int));
    }

    #[test]
    fn boxing_round_trip() {
        let store = TypeStore::with_minimal_jdk();
        let boxed_int = boxed(&store, PrimitiveType::Int);
        assert_eq!(unboxed(&store, &boxed_int), Some(PrimitiveType::Int));
        let string = Type::class(store.well_known().string, vec![]);
        assert_eq!(unboxed(&store, &string), None);
    }

    #[test]
    fn loose_compatibility_boxes_and_widens() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known();
        let integer = Type::class(wk.integer, vec![]);
        let object = Type::class(wk.object, vec![]);
        let int = Type::Primitive(PrimitiveType::Int);
        let long = Type::Primitive(PrimitiveType::Long);

        assert!(is_assignable_loose(&store, &int, &integer));
        assert!(is_assignable_loose(&store, &int, &object));
        assert!(is_assignable_loose(&store, &integer, &int));
        assert!(is_assignable_loose(&store, &int, &long));
        assert!(!is_assignable_loose(&store, &long, &int));
    }

    #[test]
    fn wildcard_containment() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known();
        let list = store.class_id("java.util.List").unwrap();
        let number = Type::class(wk.number, vec![]);
        let integer = Type::class(wk.integer, vec![]);

        let list_integer = Type::class(list, vec![integer.clone()]);
        let list_ext_number = Type::class(
            list,
            vec![Type::Wildcard(WildcardBound::Extends(Box::new(number.clone())))],
        );
        let list_super_integer = Type::class(
            list,
            vec![Type::Wildcard(WildcardBound::Super(Box::new(integer)))],
        );

        assert!(is_subtype(&store, &list_integer, &list_ext_number));
        assert!(is_subtype(&store, &list_integer, &list_super_integer));
        assert!(!is_subtype(&store, &list_ext_number, &list_integer));
    }
}
