use std::collections::{HashMap, HashSet, VecDeque};

use crate::{
    canonicalize_named, class_substitution, is_subtype, ClassId, ClassKind, ClassType, Type,
    TypeEnv, TypeVarId, WildcardBound,
};

/// Capture-avoiding type-variable substitution.
pub fn substitute(ty: &Type, subst: &HashMap<TypeVarId, Type>) -> Type {
    match ty {
        Type::TypeVar(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Class(ClassType { def, args }) => Type::class(
            *def,
            args.iter().map(|a| substitute(a, subst)).collect(),
        ),
        Type::Array(elem) => Type::Array(Box::new(substitute(elem, subst))),
        Type::Wildcard(WildcardBound::Extends(upper)) => {
            Type::Wildcard(WildcardBound::Extends(Box::new(substitute(upper, subst))))
        }
        Type::Wildcard(WildcardBound::Super(lower)) => {
            Type::Wildcard(WildcardBound::Super(Box::new(substitute(lower, subst))))
        }
        Type::Intersection(parts) => {
            Type::Intersection(parts.iter().map(|p| substitute(p, subst)).collect())
        }
        _ => ty.clone(),
    }
}

/// Stable ordering key for deterministic iteration over types.
pub fn type_sort_key(env: &dyn TypeEnv, ty: &Type) -> String {
    crate::format_type(env, ty)
}

fn intersection_component_rank(env: &dyn TypeEnv, ty: &Type) -> u8 {
    match canonicalize_named(env, ty) {
        Type::Class(ClassType { def, .. }) => match env.class(def) {
            Some(c) if c.kind == ClassKind::Class => 0,
            Some(_) => 1,
            None => 2,
        },
        Type::Array(_) => 0,
        Type::TypeVar(_) => 1,
        _ => 2,
    }
}

/// Return `ty` viewed as `target` by walking the supertype graph and applying
/// type argument substitution along the way.
///
/// Never panics: missing class metadata simply returns `None`. Raw uses stay
/// raw while walking (`ArrayList` viewed as `List` is the raw `List`).
pub fn instantiate_as_supertype(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Option<Type> {
    fn inner(
        env: &dyn TypeEnv,
        ty: &Type,
        target: ClassId,
        seen_type_vars: &mut HashSet<TypeVarId>,
    ) -> Option<Type> {
        match ty {
            Type::Array(_) => {
                let wk = env.well_known();
                if target == wk.object || target == wk.cloneable || target == wk.serializable {
                    return Some(Type::class(target, vec![]));
                }
                return None;
            }
            Type::Intersection(parts) => {
                let mut sorted: Vec<&Type> = parts.iter().collect();
                sorted.sort_by_cached_key(|ty| {
                    (
                        intersection_component_rank(env, ty),
                        type_sort_key(env, ty),
                    )
                });
                for part in sorted {
                    if let Some(found) = inner(env, part, target, seen_type_vars) {
                        return Some(found);
                    }
                }
                return None;
            }
            Type::TypeVar(id) => {
                if !seen_type_vars.insert(*id) {
                    return None;
                }
                let mut out = None;
                if let Some(tp) = env.type_param(*id) {
                    for bound in &tp.upper_bounds {
                        if let Some(found) = inner(env, bound, target, seen_type_vars) {
                            out = Some(found);
                            break;
                        }
                    }
                }
                seen_type_vars.remove(id);
                return out;
            }
            Type::Wildcard(bound) => {
                let upper = match bound {
                    WildcardBound::Extends(u) => (**u).clone(),
                    _ => Type::class(env.well_known().object, vec![]),
                };
                return inner(env, &upper, target, seen_type_vars);
            }
            _ => {}
        }

        let ty = canonicalize_named(env, ty);
        let Type::Class(ClassType { def, args }) = ty else {
            return None;
        };

        let mut queue: VecDeque<Type> = VecDeque::new();
        let mut seen: HashSet<(ClassId, Vec<Type>)> = HashSet::new();
        queue.push_back(Type::class(def, args));

        while let Some(current) = queue.pop_front() {
            let Type::Class(ClassType { def, args }) = current.clone() else {
                continue;
            };
            if !seen.insert((def, args.clone())) {
                continue;
            }

            if def == target {
                return Some(current);
            }

            let Some(class_def) = env.class(def) else {
                continue;
            };

            // A raw instantiation carries no arguments to substitute into its
            // supertypes; rawness is preserved on the walk.
            let raw = args.is_empty() && !class_def.type_params.is_empty();

            if raw {
                if let Some(sc) = &class_def.super_class {
                    if let Some(raw_sc) = raw_class_type(env, sc) {
                        queue.push_back(raw_sc);
                    }
                }
                let mut ifaces: Vec<Type> = class_def
                    .interfaces
                    .iter()
                    .filter_map(|iface| raw_class_type(env, iface))
                    .collect();
                ifaces.sort_by_cached_key(|ty| type_sort_key(env, ty));
                for iface in ifaces {
                    queue.push_back(iface);
                }
                if class_def.kind == ClassKind::Interface {
                    queue.push_back(Type::class(env.well_known().object, vec![]));
                }
                continue;
            }

            let subst = class_substitution(class_def, &args);

            if let Some(sc) = &class_def.super_class {
                let sc = canonicalize_named(env, &substitute(sc, &subst));
                queue.push_back(sc);
            }
            let mut ifaces: Vec<Type> = class_def
                .interfaces
                .iter()
                .map(|iface| canonicalize_named(env, &substitute(iface, &subst)))
                .collect();
            ifaces.sort_by_cached_key(|ty| type_sort_key(env, ty));
            for iface in ifaces {
                queue.push_back(iface);
            }

            // Every interface implicitly has `Object` as a supertype (JLS 4.10.2).
            if class_def.kind == ClassKind::Interface {
                queue.push_back(Type::class(env.well_known().object, vec![]));
            }
        }

        None
    }

    let mut seen_type_vars = HashSet::new();
    inner(env, ty, target, &mut seen_type_vars)
}

fn raw_class_type(env: &dyn TypeEnv, ty: &Type) -> Option<Type> {
    match canonicalize_named(env, ty) {
        Type::Class(ClassType { def, .. }) => Some(Type::class(def, vec![])),
        _ => None,
    }
}

/// All class/interface supertype instantiations of `ty` (including `ty`
/// itself), in a deterministic breadth-first order.
fn supertype_closure(env: &dyn TypeEnv, ty: &Type) -> Vec<Type> {
    let ty = canonicalize_named(env, ty);
    let Type::Class(ClassType { def, args }) = ty else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut queue: VecDeque<Type> = VecDeque::new();
    let mut seen: HashSet<(ClassId, Vec<Type>)> = HashSet::new();
    queue.push_back(Type::class(def, args));

    while let Some(current) = queue.pop_front() {
        let Type::Class(ClassType { def, args }) = current.clone() else {
            continue;
        };
        if !seen.insert((def, args.clone())) {
            continue;
        }
        out.push(current);

        let Some(class_def) = env.class(def) else {
            continue;
        };
        let raw = args.is_empty() && !class_def.type_params.is_empty();
        let subst = if raw {
            HashMap::new()
        } else {
            class_substitution(class_def, &args)
        };

        let project = |t: &Type| -> Option<Type> {
            if raw {
                raw_class_type(env, t)
            } else {
                match canonicalize_named(env, &substitute(t, &subst)) {
                    c @ Type::Class(_) => Some(c),
                    _ => None,
                }
            }
        };

        let mut ifaces: Vec<Type> = class_def.interfaces.iter().filter_map(project).collect();
        ifaces.sort_by_cached_key(|ty| type_sort_key(env, ty));
        for iface in ifaces {
            queue.push_back(iface);
        }
        if let Some(sc) = &class_def.super_class {
            if let Some(sc) = project(sc) {
                queue.push_back(sc);
            }
        }
        if class_def.kind == ClassKind::Interface {
            queue.push_back(Type::class(env.well_known().object, vec![]));
        }
    }

    out
}

/// Least upper bound of a set of reference types.
///
/// `Null` and placeholder members are identity elements; an empty input
/// returns `Type::Null`.
pub fn lub(env: &dyn TypeEnv, types: &[Type]) -> Type {
    let mut acc: Option<Type> = None;
    for ty in types {
        if matches!(ty, Type::Null) || ty.is_errorish() {
            continue;
        }
        acc = Some(match acc {
            None => ty.clone(),
            Some(prev) => lub2(env, &prev, ty),
        });
    }
    acc.unwrap_or(Type::Null)
}

fn lub2(env: &dyn TypeEnv, s: &Type, t: &Type) -> Type {
    // Primitive members participate through their boxed forms.
    let s = match s {
        Type::Primitive(p) => crate::boxed(env, *p),
        _ => s.clone(),
    };
    let t = match t {
        Type::Primitive(p) => crate::boxed(env, *p),
        _ => t.clone(),
    };

    if s == t {
        return s;
    }
    if is_subtype(env, &s, &t) {
        return t;
    }
    if is_subtype(env, &t, &s) {
        return s;
    }

    if let (Type::Array(se), Type::Array(te)) = (&s, &t) {
        if se.is_reference() && te.is_reference() {
            return Type::Array(Box::new(lub2(env, se, te)));
        }
        return Type::class(env.well_known().object, vec![]);
    }

    // Walk s's supertypes, merge against t's view of each shared declaration,
    // and keep the most specific candidates.
    let mut candidates: Vec<Type> = Vec::new();
    for sup in supertype_closure(env, &s) {
        let Type::Class(ClassType { def, args: s_args }) = &sup else {
            continue;
        };
        let Some(t_sup) = instantiate_as_supertype(env, &t, *def) else {
            continue;
        };
        let Type::Class(ClassType { args: t_args, .. }) = &t_sup else {
            continue;
        };
        let merged = if s_args == t_args {
            sup.clone()
        } else if s_args.len() == t_args.len() {
            let args = s_args
                .iter()
                .zip(t_args.iter())
                .map(|(sa, ta)| merge_lub_args(env, sa, ta))
                .collect();
            Type::class(*def, args)
        } else {
            // One side raw: fall back to the raw declaration.
            Type::class(*def, vec![])
        };
        candidates.push(merged);
    }

    // Drop candidates that are strict supertypes of another candidate.
    let minimal: Vec<&Type> = candidates
        .iter()
        .filter(|c| {
            !candidates
                .iter()
                .any(|other| *c != other && is_subtype(env, other, c) && !is_subtype(env, c, other))
        })
        .collect();

    minimal
        .first()
        .map(|t| (*t).clone())
        .unwrap_or_else(|| Type::class(env.well_known().object, vec![]))
}

fn merge_lub_args(env: &dyn TypeEnv, sa: &Type, ta: &Type) -> Type {
    if sa == ta {
        return sa.clone();
    }
    // Least containing type argument, approximated with an extends-wildcard.
    let sa_up = wildcard_view(env, sa);
    let ta_up = wildcard_view(env, ta);
    Type::Wildcard(WildcardBound::Extends(Box::new(lub2(env, &sa_up, &ta_up))))
}

fn wildcard_view(env: &dyn TypeEnv, ty: &Type) -> Type {
    match ty {
        Type::Wildcard(WildcardBound::Extends(upper)) => (**upper).clone(),
        Type::Wildcard(_) => Type::class(env.well_known().object, vec![]),
        _ => ty.clone(),
    }
}

/// Greatest lower bound: a subtype pick when comparable, otherwise an
/// intersection. An empty input returns `Object`.
pub fn glb(env: &dyn TypeEnv, types: &[Type]) -> Type {
    let mut acc: Option<Type> = None;
    for ty in types {
        if ty.is_errorish() {
            continue;
        }
        acc = Some(match acc {
            None => ty.clone(),
            Some(prev) => {
                if is_subtype(env, &prev, ty) {
                    prev
                } else if is_subtype(env, ty, &prev) {
                    ty.clone()
                } else {
                    make_intersection(env, vec![prev, ty.clone()])
                }
            }
        });
    }
    acc.unwrap_or_else(|| Type::class(env.well_known().object, vec![]))
}

/// Normalize a list of intersection components: flatten, dedupe, drop
/// redundant supertypes, order deterministically.
pub fn make_intersection(env: &dyn TypeEnv, parts: Vec<Type>) -> Type {
    let mut flat: Vec<Type> = Vec::new();
    for part in parts {
        match part {
            Type::Intersection(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    flat.sort_by_cached_key(|ty| {
        (
            intersection_component_rank(env, ty),
            type_sort_key(env, ty),
        )
    });
    flat.dedup();

    let minimal: Vec<Type> = flat
        .iter()
        .filter(|c| {
            !flat
                .iter()
                .any(|other| *c != other && is_subtype(env, other, c) && !is_subtype(env, c, other))
        })
        .cloned()
        .collect();

    match minimal.len() {
        0 => Type::class(env.well_known().object, vec![]),
        1 => minimal.into_iter().next().unwrap_or(Type::Unknown),
        _ => Type::Intersection(minimal),
    }
}

/// The closest generic declaration `G` such that both `s` and `t` have a
/// parameterized supertype of `G`, returned as that pair of instantiations.
pub fn parameterized_supers(env: &dyn TypeEnv, s: &Type, t: &Type) -> Option<(Type, Type)> {
    for sup in supertype_closure(env, s) {
        let Type::Class(ClassType { def, args }) = &sup else {
            continue;
        };
        if args.is_empty() {
            continue;
        }
        let Some(t_sup) = instantiate_as_supertype(env, t, *def) else {
            continue;
        };
        let Type::Class(ClassType { args: t_args, .. }) = &t_sup else {
            continue;
        };
        if t_args.is_empty() {
            continue;
        }
        return Some((sup, t_sup));
    }
    None
}

/// Erasure (JLS 4.6).
pub fn erasure(env: &dyn TypeEnv, ty: &Type) -> Type {
    fn inner(env: &dyn TypeEnv, ty: &Type, seen: &mut HashSet<TypeVarId>) -> Type {
        match canonicalize_named(env, ty) {
            Type::Class(ClassType { def, .. }) => Type::class(def, vec![]),
            Type::Array(elem) => Type::Array(Box::new(inner(env, &elem, seen))),
            Type::TypeVar(id) => {
                if !seen.insert(id) {
                    return Type::class(env.well_known().object, vec![]);
                }
                let erased = env
                    .type_param(id)
                    .and_then(|tp| tp.upper_bounds.first().cloned())
                    .map(|b| inner(env, &b, seen))
                    .unwrap_or_else(|| Type::class(env.well_known().object, vec![]));
                seen.remove(&id);
                erased
            }
            Type::Wildcard(WildcardBound::Extends(upper)) => inner(env, &upper, seen),
            Type::Wildcard(_) => Type::class(env.well_known().object, vec![]),
            Type::Intersection(parts) => parts
                .first()
                .map(|p| inner(env, p, seen))
                .unwrap_or_else(|| Type::class(env.well_known().object, vec![])),
            other => other,
        }
    }
    let mut seen = HashSet::new();
    inner(env, ty, &mut seen)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamSignature {
    pub params: Vec<Type>,
    pub return_type: Type,
    pub throws: Vec<Type>,
}

/// Best-effort extraction of a functional interface's single-abstract-method
/// (SAM) signature.
///
/// Applies type argument substitution so `Function<String, Integer>` yields
/// `(String) -> Integer`. Returns `None` if `ty` is not (obviously) a
/// functional interface.
pub fn sam_signature(env: &dyn TypeEnv, ty: &Type) -> Option<SamSignature> {
    fn inner(
        env: &dyn TypeEnv,
        ty: &Type,
        seen_type_vars: &mut HashSet<TypeVarId>,
    ) -> Option<SamSignature> {
        match ty {
            Type::TypeVar(id) => {
                if !seen_type_vars.insert(*id) {
                    return None;
                }
                let sig = env.type_param(*id).and_then(|tp| {
                    let mut sig: Option<SamSignature> = None;
                    for bound in &tp.upper_bounds {
                        let Some(bound_sig) = inner(env, bound, seen_type_vars) else {
                            continue;
                        };
                        match &sig {
                            None => sig = Some(bound_sig),
                            Some(existing) if *existing == bound_sig => {}
                            Some(_) => return None,
                        }
                    }
                    sig
                });
                seen_type_vars.remove(id);
                return sig;
            }
            Type::Intersection(parts) => {
                // Functional if all functional components agree on a signature.
                let mut sig: Option<SamSignature> = None;
                for part in parts {
                    let Some(part_sig) = inner(env, part, seen_type_vars) else {
                        continue;
                    };
                    match &sig {
                        None => sig = Some(part_sig),
                        Some(existing) if *existing == part_sig => {}
                        Some(_) => return None,
                    }
                }
                return sig;
            }
            _ => {}
        }

        let ty = canonicalize_named(env, ty);
        let Type::Class(ClassType { def, args }) = ty else {
            return None;
        };

        let root_def = env.class(def)?;
        if root_def.kind != ClassKind::Interface {
            return None;
        }

        // Walk the interface inheritance graph collecting abstract instance
        // methods with substitution applied along the way.
        let mut candidates: HashMap<(String, Vec<Type>), (Type, Vec<Type>)> = HashMap::new();
        for current in supertype_closure(env, &Type::class(def, args)) {
            let Type::Class(ClassType { def, args }) = current else {
                continue;
            };
            let Some(class_def) = env.class(def) else {
                continue;
            };
            let subst = class_substitution(class_def, &args);

            for m in &class_def.methods {
                if m.is_static || !m.is_abstract {
                    continue;
                }
                let params: Vec<Type> = m.params.iter().map(|p| substitute(p, &subst)).collect();
                let return_type = substitute(&m.return_type, &subst);
                if is_object_method(env, &m.name, &params, &return_type) {
                    continue;
                }
                let throws: Vec<Type> = m.throws.iter().map(|t| substitute(t, &subst)).collect();

                let key = (m.name.clone(), params);
                if let Some((existing, _)) = candidates.get(&key) {
                    // Prefer the more specific return type of an override.
                    if is_subtype(env, &return_type, existing) {
                        candidates.insert(key, (return_type, throws));
                    }
                } else {
                    candidates.insert(key, (return_type, throws));
                }
            }
        }

        if candidates.len() != 1 {
            return None;
        }
        let ((_name, params), (return_type, throws)) = candidates.into_iter().next()?;
        Some(SamSignature {
            params,
            return_type,
            throws,
        })
    }

    let mut seen_type_vars = HashSet::new();
    inner(env, ty, &mut seen_type_vars)
}

fn is_object_method(env: &dyn TypeEnv, name: &str, params: &[Type], return_type: &Type) -> bool {
    let return_type = canonicalize_named(env, return_type);
    match name {
        "equals" => {
            params.len() == 1
                && canonicalize_named(env, &params[0])
                    == Type::class(env.well_known().object, vec![])
                && return_type == Type::Primitive(crate::PrimitiveType::Boolean)
        }
        "hashCode" => {
            params.is_empty() && return_type == Type::Primitive(crate::PrimitiveType::Int)
        }
        "toString" => {
            params.is_empty() && return_type == Type::class(env.well_known().string, vec![])
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassDef, MethodDef, TypeStore};
    use pretty_assertions::assert_eq;

    #[test]
    fn instantiate_as_supertype_recovers_type_arguments() {
        let store = TypeStore::with_minimal_jdk();
        let list = store.class_id("java.util.List").unwrap();
        let array_list = store.class_id("java.util.ArrayList").unwrap();
        let string = Type::class(store.well_known().string, vec![]);

        let array_list_string = Type::class(array_list, vec![string.clone()]);
        let instantiated = instantiate_as_supertype(&store, &array_list_string, list)
            .expect("should be able to view ArrayList<String> as List");
        assert_eq!(instantiated, Type::class(list, vec![string]));
    }

    #[test]
    fn instantiate_as_supertype_preserves_raw_types() {
        let store = TypeStore::with_minimal_jdk();
        let list = store.class_id("java.util.List").unwrap();
        let array_list = store.class_id("java.util.ArrayList").unwrap();

        let raw_array_list = Type::class(array_list, vec![]);
        let instantiated = instantiate_as_supertype(&store, &raw_array_list, list)
            .expect("should map raw supertypes");
        assert_eq!(instantiated, Type::class(list, vec![]));
    }

    #[test]
    fn sam_signature_applies_type_arguments() {
        let store = TypeStore::with_minimal_jdk();
        let function = store.class_id("java.util.function.Function").unwrap();
        let string = Type::class(store.well_known().string, vec![]);
        let integer = Type::class(store.well_known().integer, vec![]);

        let function_ty = Type::class(function, vec![string.clone(), integer.clone()]);
        let sig = sam_signature(&store, &function_ty).expect("Function should be functional");
        assert_eq!(sig.params, vec![string]);
        assert_eq!(sig.return_type, integer);
        assert_eq!(sig.throws, Vec::<Type>::new());
    }

    #[test]
    fn sam_signature_ignores_default_and_static_methods() {
        let mut store = TypeStore::with_minimal_jdk();
        let object = store.well_known().object;

        let iface_t = store.add_type_param("T", vec![Type::class(object, vec![])]);
        let iface = store.add_class(ClassDef {
            name: "com.example.MyFun".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![iface_t],
            super_class: Some(Type::class(object, vec![])),
            interfaces: vec![],
            methods: vec![
                MethodDef {
                    name: "defaultMethod".to_string(),
                    type_params: vec![],
                    params: vec![],
                    return_type: Type::Void,
                    throws: vec![],
                    is_static: false,
                    is_varargs: false,
                    is_abstract: false,
                },
                MethodDef {
                    name: "staticMethod".to_string(),
                    type_params: vec![],
                    params: vec![],
                    return_type: Type::Void,
                    throws: vec![],
                    is_static: true,
                    is_varargs: false,
                    is_abstract: false,
                },
                MethodDef {
                    name: "apply".to_string(),
                    type_params: vec![],
                    params: vec![Type::TypeVar(iface_t)],
                    return_type: Type::TypeVar(iface_t),
                    throws: vec![],
                    is_static: false,
                    is_varargs: false,
                    is_abstract: true,
                },
            ],
        });

        let string = Type::class(store.well_known().string, vec![]);
        let sig = sam_signature(&store, &Type::class(iface, vec![string.clone()]))
            .expect("should still be functional");
        assert_eq!(sig.params, vec![string.clone()]);
        assert_eq!(sig.return_type, string);
    }

    #[test]
    fn sam_signature_rejects_two_abstract_methods() {
        let store = TypeStore::with_minimal_jdk();
        let list = store.class_id("java.util.List").unwrap();
        let string = Type::class(store.well_known().string, vec![]);
        assert_eq!(sam_signature(&store, &Type::class(list, vec![string])), None);
    }

    #[test]
    fn lub_walks_to_shared_superclass() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known();
        let integer = Type::class(wk.integer, vec![]);
        let long = Type::class(wk.long, vec![]);
        let number = Type::class(wk.number, vec![]);

        assert_eq!(lub(&store, &[integer.clone(), long]), number);
        assert_eq!(lub(&store, &[integer.clone()]), integer);
        assert_eq!(lub(&store, &[]), Type::Null);
    }

    #[test]
    fn lub_merges_type_arguments_with_wildcards() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known();
        let list = store.class_id("java.util.List").unwrap();
        let integer = Type::class(wk.integer, vec![]);
        let long = Type::class(wk.long, vec![]);
        let number = Type::class(wk.number, vec![]);

        let merged = lub(
            &store,
            &[
                Type::class(list, vec![integer]),
                Type::class(list, vec![long]),
            ],
        );
        assert_eq!(
            merged,
            Type::class(
                list,
                vec![Type::Wildcard(WildcardBound::Extends(Box::new(number)))]
            )
        );
    }

    #[test]
    fn glb_prefers_the_subtype() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known();
        let integer = Type::class(wk.integer, vec![]);
        let number = Type::class(wk.number, vec![]);

        assert_eq!(glb(&store, &[number.clone(), integer.clone()]), integer.clone());
        assert_eq!(glb(&store, &[integer.clone(), number]), integer);
    }

    #[test]
    fn glb_builds_an_intersection_for_unrelated_interfaces() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known();
        let cloneable = Type::class(wk.cloneable, vec![]);
        let serializable = Type::class(wk.serializable, vec![]);

        let glbbed = glb(&store, &[cloneable.clone(), serializable.clone()]);
        let Type::Intersection(parts) = glbbed else {
            panic!("expected an intersection");
        };
        assert_eq!(parts.len(), 2);
        assert!(parts.contains(&cloneable));
        assert!(parts.contains(&serializable));
    }

    #[test]
    fn parameterized_supers_finds_the_shared_declaration() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known();
        let list = store.class_id("java.util.List").unwrap();
        let array_list = store.class_id("java.util.ArrayList").unwrap();
        let string = Type::class(wk.string, vec![]);
        let integer = Type::class(wk.integer, vec![]);

        let s = Type::class(array_list, vec![string.clone()]);
        let t = Type::class(list, vec![integer.clone()]);
        let (s_sup, t_sup) = parameterized_supers(&store, &s, &t).expect("List is shared");
        assert_eq!(s_sup, Type::class(list, vec![string]));
        assert_eq!(t_sup, Type::class(list, vec![integer]));
    }

    #[test]
    fn erasure_drops_type_arguments_and_variables() {
        let mut store = TypeStore::with_minimal_jdk();
        let wk_number = store.well_known().number;
        let list = store.class_id("java.util.List").unwrap();
        let number = Type::class(wk_number, vec![]);

        let t = store.add_type_param("T", vec![number.clone()]);
        assert_eq!(erasure(&store, &Type::TypeVar(t)), number);

        let list_t = Type::class(list, vec![Type::TypeVar(t)]);
        assert_eq!(erasure(&store, &list_t), Type::class(list, vec![]));
    }
}
