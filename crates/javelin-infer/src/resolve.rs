//! Resolution: finding an instantiation for each variable (JLS 18.4).

use std::collections::{BTreeSet, HashMap};

use javelin_types::{glb, is_subtype, lub, Type, TypeEnv, WildcardBound};

use crate::bounds::{BoundKind, BoundSet};
use crate::session::{InferenceSession, VarId};
use crate::ty::AbstractType;

/// Resolve `requested` (and everything they depend on) inside `bs`.
///
/// On success every requested variable has an instantiation. A contradictory
/// bound set is reported through `bs.contains_false()`; `Err` carries a
/// variable no resolution path could instantiate.
pub(crate) fn resolve(
    requested: &[VarId],
    bs: &mut BoundSet,
    s: &mut InferenceSession<'_>,
) -> Result<(), VarId> {
    for v in requested {
        bs.ensure_var(*v);
    }

    let mut worklist: Vec<VarId> = Vec::new();
    {
        let deps = bs.dependencies(s);
        let instantiated = bs.instantiated_vars();
        for v in requested {
            if !worklist.contains(v) {
                worklist.push(*v);
            }
            if let Some(ds) = deps.get(v) {
                for d in ds {
                    if !worklist.contains(d) {
                        worklist.push(*d);
                    }
                }
            }
        }
        worklist.retain(|v| !instantiated.contains(v));
    }

    while !worklist.is_empty() {
        if bs.contains_false() {
            return Ok(());
        }

        // The smallest dependency-closed set of unresolved variables,
        // insertion order breaking ties.
        let deps = bs.dependencies(s);
        let instantiated = bs.instantiated_vars();
        let mut smallest: Option<BTreeSet<VarId>> = None;
        for alpha in &worklist {
            let mut set: BTreeSet<VarId> = deps.get(alpha).cloned().unwrap_or_default();
            set.insert(*alpha);
            set.retain(|v| !instantiated.contains(v));
            let better = match &smallest {
                None => true,
                Some(current) => set.len() < current.len(),
            };
            if better {
                smallest = Some(set);
            }
            if smallest.as_ref().map(BTreeSet::len) == Some(1) {
                // A variable always depends on itself; nothing smaller exists.
                break;
            }
        }
        let Some(subset) = smallest else {
            break;
        };

        resolve_subset(&subset, bs, s)?;
        if bs.contains_false() {
            return Ok(());
        }

        let instantiated = bs.instantiated_vars();
        let before = worklist.len();
        worklist.retain(|v| !instantiated.contains(v));
        if worklist.len() == before {
            return Err(worklist[0]);
        }
    }
    Ok(())
}

/// Resolve one dependency-closed subset as a unit.
///
/// `Err` reports a variable with no derivable bound at all; a contradictory
/// plain attempt (the recoverable failure) rolls back and retries with
/// capture variables instead.
fn resolve_subset(
    subset: &BTreeSet<VarId>,
    bs: &mut BoundSet,
    s: &mut InferenceSession<'_>,
) -> Result<(), VarId> {
    let has_capture = subset.iter().any(|v| s.var(*v).is_capture);
    if has_capture {
        // Non-capture members resolve by the plain algorithm, capture
        // members by the capture-aware one.
        plain_resolve(subset, bs, s)?;
        if bs.contains_false() {
            return Ok(());
        }
        let instantiated = bs.instantiated_vars();
        let rest: BTreeSet<VarId> = subset
            .iter()
            .copied()
            .filter(|v| !instantiated.contains(v))
            .collect();
        if !rest.is_empty() {
            capture_resolve(&rest, bs, s);
        }
        return Ok(());
    }

    let saved = bs.clone();
    match plain_resolve(subset, bs, s) {
        Ok(()) if !bs.contains_false() => Ok(()),
        Ok(()) => {
            // Contradiction during the plain attempt: restore the saved
            // bounds and retry with fresh capture variables.
            tracing::debug!("plain resolution contradicted, retrying with capture variables");
            *bs = saved;
            capture_resolve(subset, bs, s);
            Ok(())
        }
        // A variable without any derivable bound fails outright; the capture
        // path has nothing to build a wildcard from.
        Err(v) => Err(v),
    }
}

/// Plain resolution: lub of proper lower bounds, else glb of proper upper
/// bounds, with the runtime-exception special case for throws-bounded
/// variables. Capture variables are skipped. `Err` carries a variable left
/// without any bound to instantiate from.
fn plain_resolve(
    subset: &BTreeSet<VarId>,
    bs: &mut BoundSet,
    s: &mut InferenceSession<'_>,
) -> Result<(), VarId> {
    bs.apply_instantiations(s);
    let mut to_resolve: Vec<VarId> = subset
        .iter()
        .copied()
        .filter(|v| !s.var(*v).is_capture)
        .filter(|v| bs.instantiation(*v).is_none())
        .collect();

    // Variables with proper lower bounds first; instantiating one may turn a
    // dependent variable's bounds proper, so iterate to quiescence.
    loop {
        let mut changed = false;
        for &ai in &to_resolve {
            if bs.instantiation(ai).is_some() {
                continue;
            }
            let lowers = bs
                .var_bounds(ai)
                .map(|b| b.proper_lower_bounds())
                .unwrap_or_default();
            if lowers.is_empty() {
                continue;
            }
            let inst = lub(s.env(), &lowers);
            bs.add_bound(s, ai, BoundKind::Equal, AbstractType::Proper(inst));
            changed = true;
        }
        bs.apply_instantiations(s);
        to_resolve.retain(|v| bs.instantiation(*v).is_none());
        if !changed {
            break;
        }
    }

    // Remaining variables resolve from their proper upper bounds.
    let upper_pass: Vec<VarId> = to_resolve.clone();
    for ai in upper_pass {
        if bs.instantiation(ai).is_some() {
            continue;
        }
        let Some(entry) = bs.var_bounds(ai) else {
            continue;
        };
        let uppers = entry.proper_upper_bounds();
        if uppers.is_empty() {
            continue;
        }
        let runtime_ex = Type::class(s.env().well_known().runtime_exception, vec![]);
        let use_runtime_ex = entry.has_throws_bound
            && uppers.iter().any(|u| is_subtype(s.env(), &runtime_ex, u));
        let inst = if use_runtime_ex {
            runtime_ex
        } else {
            glb(s.env(), &uppers)
        };
        bs.add_bound(s, ai, BoundKind::Equal, AbstractType::Proper(inst));
    }

    bs.apply_instantiations(s);
    to_resolve.retain(|v| bs.instantiation(*v).is_none());
    if let Some(&stuck) = to_resolve.first() {
        let has_any_bound = bs
            .var_bounds(stuck)
            .map(|b| !(b.equal.is_empty() && b.upper.is_empty() && b.lower.is_empty()))
            .unwrap_or(false);
        if has_any_bound {
            // Bounds exist but none were proper: a contradiction-shaped
            // failure the capture path may still recover.
            bs.set_false();
            return Ok(());
        }
        return Err(stuck);
    }
    bs.fixed_point(s);
    Ok(())
}

/// Capture-aware resolution: instantiate each variable to a fresh capture
/// variable built from the lub of its proper lower bounds and the glb of its
/// upper bounds, substituting the subset's variables simultaneously.
/// Self-references are replaced by an unbounded wildcard placeholder to avoid
/// infinite types.
pub(crate) fn capture_resolve(
    subset: &BTreeSet<VarId>,
    bs: &mut BoundSet,
    s: &mut InferenceSession<'_>,
) {
    bs.apply_instantiations(s);
    let vars: Vec<VarId> = subset
        .iter()
        .copied()
        .filter(|v| bs.instantiation(*v).is_none())
        .collect();
    if vars.is_empty() {
        return;
    }

    // Ids first: the bounds of one fresh variable may mention another.
    let caps: Vec<_> = vars
        .iter()
        .map(|_| s.ctx.fresh_type_param(vec![], None))
        .collect();
    let replacement: HashMap<VarId, Type> = vars
        .iter()
        .zip(caps.iter())
        .map(|(v, c)| (*v, Type::TypeVar(*c)))
        .collect();

    for (i, &ai) in vars.iter().enumerate() {
        let mut self_replacement = replacement.clone();
        self_replacement.insert(ai, Type::Wildcard(WildcardBound::Unbounded));

        let entry = bs.var_bounds(ai).cloned().unwrap_or_default();
        let lowers = entry.proper_lower_bounds();
        let lower = if lowers.is_empty() {
            None
        } else {
            Some(lub(s.env(), &lowers))
        };

        let mut uppers: Vec<Type> = Vec::new();
        for bound in &entry.upper {
            let substituted = bound.substitute_vars(s, &self_replacement);
            if let AbstractType::Proper(ty) = substituted {
                if !matches!(ty, Type::Wildcard(WildcardBound::Unbounded)) {
                    uppers.push(ty);
                }
            }
        }
        let upper = if uppers.is_empty() {
            Type::class(s.env().well_known().object, vec![])
        } else {
            glb(s.env(), &uppers)
        };

        s.ctx.set_type_param_bounds(caps[i], vec![upper], lower);
    }

    for (v, c) in vars.iter().zip(caps.iter()) {
        bs.add_bound(s, *v, BoundKind::Equal, AbstractType::Proper(Type::TypeVar(*c)));
    }
    bs.apply_instantiations(s);
    bs.fixed_point(s);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::CallId;
    use javelin_types::{TypeEnv, TypeStore};
    use pretty_assertions::assert_eq;

    fn session_with_var(store: &TypeStore) -> (InferenceSession<'_>, VarId) {
        let mut s = InferenceSession::new(store);
        let list_e = store
            .class(store.class_id("java.util.List").unwrap())
            .unwrap()
            .type_params[0];
        let var = s.fresh_variable(list_e, CallId(901), false);
        (s, var)
    }

    #[test]
    fn plain_resolution_uses_lub_of_lower_bounds() {
        let store = TypeStore::with_minimal_jdk();
        let (mut s, var) = session_with_var(&store);
        let wk = store.well_known();
        let integer = Type::class(wk.integer, vec![]);
        let long = Type::class(wk.long, vec![]);
        let number = Type::class(wk.number, vec![]);

        let mut bs = BoundSet::new();
        bs.add_bound(&s, var, BoundKind::Lower, AbstractType::Proper(integer));
        bs.add_bound(&s, var, BoundKind::Lower, AbstractType::Proper(long));
        bs.fixed_point(&mut s);
        assert!(!bs.contains_false());

        resolve(&[var], &mut bs, &mut s).unwrap();
        assert!(!bs.contains_false());
        assert_eq!(bs.instantiation(var), Some(&number));
    }

    #[test]
    fn plain_resolution_falls_back_to_upper_bounds() {
        let store = TypeStore::with_minimal_jdk();
        let (mut s, var) = session_with_var(&store);
        let number = Type::class(store.well_known().number, vec![]);

        let mut bs = BoundSet::new();
        bs.add_bound(&s, var, BoundKind::Upper, AbstractType::Proper(number.clone()));
        bs.fixed_point(&mut s);

        resolve(&[var], &mut bs, &mut s).unwrap();
        assert_eq!(bs.instantiation(var), Some(&number));
    }

    #[test]
    fn throws_bounded_variable_resolves_to_runtime_exception() {
        let store = TypeStore::with_minimal_jdk();
        let (mut s, var) = session_with_var(&store);
        let wk = store.well_known();
        let exception = Type::class(wk.exception, vec![]);
        let runtime_exception = Type::class(wk.runtime_exception, vec![]);

        let mut bs = BoundSet::new();
        bs.add_bound(&s, var, BoundKind::Upper, AbstractType::Proper(exception));
        bs.mark_throws(var);
        bs.fixed_point(&mut s);

        resolve(&[var], &mut bs, &mut s).unwrap();
        assert_eq!(bs.instantiation(var), Some(&runtime_exception));
    }

    #[test]
    fn capture_resolution_preserves_both_bounds() {
        let store = TypeStore::with_minimal_jdk();
        let (mut s, var) = session_with_var(&store);
        let wk = store.well_known();
        let integer = Type::class(wk.integer, vec![]);
        let number = Type::class(wk.number, vec![]);

        let mut bs = BoundSet::new();
        bs.add_bound(&s, var, BoundKind::Lower, AbstractType::Proper(integer.clone()));
        bs.add_bound(&s, var, BoundKind::Upper, AbstractType::Proper(number.clone()));
        bs.fixed_point(&mut s);

        let subset: BTreeSet<VarId> = [var].into_iter().collect();
        capture_resolve(&subset, &mut bs, &mut s);
        assert!(!bs.contains_false());

        let Some(Type::TypeVar(cap)) = bs.instantiation(var).cloned() else {
            panic!("expected a fresh capture variable instantiation");
        };
        let def = s.env().type_param(cap).expect("capture variable bounds");
        assert!(def.name.starts_with("CAP#"));
        assert_eq!(def.upper_bounds, vec![number]);
        assert_eq!(def.lower_bound, Some(integer));

        // Re-capturing the instantiation must not change it further.
        let inst = Type::TypeVar(cap);
        assert_eq!(s.ctx.capture_conversion(&inst), inst);
    }
}
