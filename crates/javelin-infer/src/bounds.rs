//! Per-variable bounds, the bound set, and the incorporation fixed point.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use javelin_types::{boxed, parameterized_supers, unboxed, ClassType, Type, TypeEnv};

use crate::constraint::{Typing, TypingKind};
use crate::session::{InferenceSession, VarId};
use crate::ty::AbstractType;

/// Kind of bound between a variable and a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundKind {
    /// `var = type`
    Equal,
    /// `var <: type`
    Upper,
    /// `type <: var`
    Lower,
}

/// Bounds accumulated against one inference variable.
#[derive(Clone, Debug, Default)]
pub struct VariableBounds {
    pub equal: Vec<AbstractType>,
    pub upper: Vec<AbstractType>,
    pub lower: Vec<AbstractType>,
    /// Set once an equality bound against a proper type lands; final for the
    /// resolution pass.
    pub instantiation: Option<Type>,
    /// The variable participates in a checked-exception constraint.
    pub has_throws_bound: bool,
}

impl VariableBounds {
    fn list(&self, kind: BoundKind) -> &Vec<AbstractType> {
        match kind {
            BoundKind::Equal => &self.equal,
            BoundKind::Upper => &self.upper,
            BoundKind::Lower => &self.lower,
        }
    }

    fn list_mut(&mut self, kind: BoundKind) -> &mut Vec<AbstractType> {
        match kind {
            BoundKind::Equal => &mut self.equal,
            BoundKind::Upper => &mut self.upper,
            BoundKind::Lower => &mut self.lower,
        }
    }

    pub fn proper_lower_bounds(&self) -> Vec<Type> {
        self.lower
            .iter()
            .filter_map(|b| match b {
                AbstractType::Proper(ty) => Some(ty.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn proper_upper_bounds(&self) -> Vec<Type> {
        self.upper
            .iter()
            .filter_map(|b| match b {
                AbstractType::Proper(ty) => Some(ty.clone()),
                _ => None,
            })
            .collect()
    }

    /// Any equal or lower bound that is a wildcard-parameterized type.
    pub fn has_wildcard_parameterized_lower_or_equal_bound(&self) -> bool {
        self.equal
            .iter()
            .chain(self.lower.iter())
            .any(|b| !b.is_use() && b.is_wildcard_parameterized())
    }

    /// Two proper lower bounds whose supertypes are different
    /// parameterizations of the same generic declaration.
    pub fn has_lower_bound_different_param(&self, env: &dyn TypeEnv) -> bool {
        let parameterized: Vec<&Type> = self
            .lower
            .iter()
            .filter_map(|b| match b {
                AbstractType::Proper(ty @ Type::Class(ClassType { args, .. }))
                    if !args.is_empty() =>
                {
                    Some(ty)
                }
                _ => None,
            })
            .collect();
        for (i, s1) in parameterized.iter().enumerate() {
            for s2 in parameterized.iter().skip(i + 1) {
                let Some((sup1, sup2)) = parameterized_supers(env, s1, s2) else {
                    continue;
                };
                if sup1 != sup2 {
                    return true;
                }
            }
        }
        false
    }

    /// An equal or lower bound whose only supertype at `target`'s declaration
    /// is the raw form.
    pub fn has_raw_type_lower_or_equal_bound(&self, env: &dyn TypeEnv, target: &Type) -> bool {
        let Type::Class(ClassType { def, .. }) = target else {
            return false;
        };
        self.equal
            .iter()
            .chain(self.lower.iter())
            .filter(|b| !b.is_use())
            .any(|b| {
                let ty = match b {
                    AbstractType::Proper(ty) | AbstractType::Inference { ty, .. } => ty,
                    AbstractType::Use(_) => return false,
                };
                matches!(
                    javelin_types::instantiate_as_supertype(env, ty, *def),
                    Some(Type::Class(ClassType { args, .. })) if args.is_empty()
                )
            })
    }

    /// Any bound mentioning a primitive wrapper class.
    pub fn has_primitive_wrapper_bound(&self, env: &dyn TypeEnv) -> bool {
        self.equal
            .iter()
            .chain(self.upper.iter())
            .chain(self.lower.iter())
            .any(|b| match b {
                AbstractType::Proper(ty) => unboxed(env, ty).is_some(),
                _ => false,
            })
    }
}

/// Accumulated bounds for all variables of an inference, plus the
/// incorporation work queue.
///
/// Owned exclusively by the in-flight inference; rollback for the
/// capture-aware resolution path is a plain clone.
#[derive(Clone, Debug, Default)]
pub struct BoundSet {
    bounds: BTreeMap<VarId, VariableBounds>,
    contains_false: bool,
    unchecked_conversion: bool,
    pending: VecDeque<Typing>,
    /// Complementary-pair constraints already reduced once; guards the fixed
    /// point against re-deriving the same facts forever.
    reduced: std::collections::HashSet<Typing>,
}

impl BoundSet {
    pub fn new() -> BoundSet {
        BoundSet::default()
    }

    pub fn contains_false(&self) -> bool {
        self.contains_false
    }

    pub fn set_false(&mut self) {
        self.contains_false = true;
    }

    pub fn unchecked_conversion(&self) -> bool {
        self.unchecked_conversion
    }

    pub fn set_unchecked_conversion(&mut self) {
        self.unchecked_conversion = true;
    }

    pub fn ensure_var(&mut self, var: VarId) {
        self.bounds.entry(var).or_default();
    }

    pub fn var_bounds(&self, var: VarId) -> Option<&VariableBounds> {
        self.bounds.get(&var)
    }

    pub fn var_bounds_mut(&mut self, var: VarId) -> &mut VariableBounds {
        self.bounds.entry(var).or_default()
    }

    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.bounds.keys().copied()
    }

    pub fn instantiation(&self, var: VarId) -> Option<&Type> {
        self.bounds.get(&var).and_then(|b| b.instantiation.as_ref())
    }

    pub fn instantiated_vars(&self) -> BTreeSet<VarId> {
        self.bounds
            .iter()
            .filter(|(_, b)| b.instantiation.is_some())
            .map(|(v, _)| *v)
            .collect()
    }

    pub fn mark_throws(&mut self, var: VarId) {
        self.var_bounds_mut(var).has_throws_bound = true;
    }

    /// Record `var <kind> ty`, queueing the complementary-pair constraints of
    /// the incorporation rules when the bound is new.
    pub fn add_bound(
        &mut self,
        s: &InferenceSession<'_>,
        var: VarId,
        kind: BoundKind,
        ty: AbstractType,
    ) -> bool {
        if ty.as_use() == Some(var) {
            return false;
        }
        if kind == BoundKind::Equal {
            if let AbstractType::Proper(proper) = &ty {
                if self.bounds.get(&var).map_or(true, |b| b.instantiation.is_none()) {
                    let inst = match proper {
                        Type::Primitive(p) => boxed(s.env(), *p),
                        other => other.clone(),
                    };
                    self.var_bounds_mut(var).instantiation = Some(inst);
                }
            }
        }

        let entry = self.var_bounds_mut(var);
        if entry.list(kind).contains(&ty) {
            return false;
        }
        entry.list_mut(kind).push(ty.clone());

        self.queue_complementary_constraints(s, var, kind, &ty);
        true
    }

    /// The pairwise derivations of JLS 18.3.1 for one newly added bound.
    fn queue_complementary_constraints(
        &mut self,
        s: &InferenceSession<'_>,
        var: VarId,
        kind: BoundKind,
        new_bound: &AbstractType,
    ) {
        let entry = match self.bounds.get(&var) {
            Some(entry) => entry,
            None => return,
        };

        let mut derived: Vec<Typing> = Vec::new();
        match kind {
            BoundKind::Equal => {
                // var = S and var = T imply S = T.
                for t in &entry.equal {
                    if t != new_bound {
                        derived.push(Typing::new(
                            new_bound.clone(),
                            t.clone(),
                            TypingKind::TypeEquality,
                        ));
                    }
                }
                // L <: var and var = S imply L <: S.
                for t in &entry.lower {
                    if t != new_bound {
                        derived.push(Typing::new(t.clone(), new_bound.clone(), TypingKind::Subtype));
                    }
                }
                // var = S and var <: U imply S <: U.
                for t in &entry.upper {
                    if t != new_bound {
                        derived.push(Typing::new(new_bound.clone(), t.clone(), TypingKind::Subtype));
                    }
                }
            }
            BoundKind::Lower => {
                for t in &entry.equal {
                    if t != new_bound {
                        derived.push(Typing::new(new_bound.clone(), t.clone(), TypingKind::Subtype));
                    }
                }
                // L <: var and var <: U imply L <: U.
                for t in &entry.upper {
                    if t != new_bound {
                        derived.push(Typing::new(new_bound.clone(), t.clone(), TypingKind::Subtype));
                    }
                }
            }
            BoundKind::Upper => {
                for t in &entry.equal {
                    if t != new_bound {
                        derived.push(Typing::new(t.clone(), new_bound.clone(), TypingKind::Subtype));
                    }
                }
                for t in &entry.lower {
                    if t != new_bound {
                        derived.push(Typing::new(t.clone(), new_bound.clone(), TypingKind::Subtype));
                    }
                }
                // var <: S and var <: T with parameterized supertypes of the
                // same declaration imply argument-wise equations.
                if !new_bound.is_use() {
                    for t in &entry.upper {
                        if t == new_bound || t.is_use() {
                            continue;
                        }
                        derived.extend(parameterized_super_equations(s, new_bound, t));
                    }
                }
            }
        }

        for typing in derived {
            if !self.reduced.contains(&typing) {
                self.pending.push_back(typing);
            }
        }
    }

    /// Merge another bound set's flags and bounds into this one, without
    /// running the fixed point. Every merged bound re-queues its pairwise
    /// derivations here, so the donor's own pending queue can be dropped.
    pub fn merge_from(&mut self, s: &InferenceSession<'_>, other: BoundSet) {
        if other.contains_false {
            self.contains_false = true;
        }
        if other.unchecked_conversion {
            self.unchecked_conversion = true;
        }
        for (var, vb) in other.bounds {
            self.ensure_var(var);
            if vb.has_throws_bound {
                self.mark_throws(var);
            }
            for b in vb.equal {
                self.add_bound(s, var, BoundKind::Equal, b);
            }
            for b in vb.upper {
                self.add_bound(s, var, BoundKind::Upper, b);
            }
            for b in vb.lower {
                self.add_bound(s, var, BoundKind::Lower, b);
            }
        }
    }

    /// Merge `other` into `self` and run the incorporation fixed point.
    pub fn incorporate(&mut self, s: &mut InferenceSession<'_>, other: BoundSet) {
        self.merge_from(s, other);
        self.fixed_point(s);
    }

    /// Drain the pending complementary constraints, reducing each until no
    /// new bound appears or a contradiction is found.
    pub fn fixed_point(&mut self, s: &mut InferenceSession<'_>) {
        while let Some(typing) = self.pending.pop_front() {
            if self.contains_false {
                return;
            }
            if !self.reduced.insert(typing.clone()) {
                continue;
            }
            let subs = typing.reduce(s, self);
            for sub in subs {
                if !self.reduced.contains(&sub) {
                    self.pending.push_back(sub);
                }
            }
        }
    }

    /// Substitute every known instantiation into the bounds of every
    /// variable. Returns whether anything changed.
    pub fn apply_instantiations(&mut self, s: &InferenceSession<'_>) -> bool {
        let snapshot = self.clone();
        let mut changed = false;
        let vars: Vec<VarId> = self.bounds.keys().copied().collect();
        for var in vars {
            let entry = self.bounds.get(&var).cloned().unwrap_or_default();
            for kind in [BoundKind::Equal, BoundKind::Upper, BoundKind::Lower] {
                let mut rewritten = Vec::new();
                for bound in entry.list(kind) {
                    let new_bound = bound.apply_instantiations(s, &snapshot);
                    if new_bound != *bound {
                        changed = true;
                    }
                    if !rewritten.contains(&new_bound) {
                        rewritten.push(new_bound);
                    }
                }
                *self.var_bounds_mut(var).list_mut(kind) = rewritten;
            }
            // A rewritten equality against a proper type becomes the
            // instantiation.
            let entry = self.var_bounds_mut(var);
            if entry.instantiation.is_none() {
                if let Some(AbstractType::Proper(ty)) =
                    entry.equal.iter().find(|b| b.is_proper()).cloned()
                {
                    entry.instantiation = Some(match ty {
                        Type::Primitive(p) => boxed(s.env(), p),
                        other => other,
                    });
                    changed = true;
                }
            }
        }
        changed
    }

    /// Variable dependencies: a variable depends on every variable mentioned
    /// in its bounds, transitively, and on itself.
    pub fn dependencies(&self, s: &InferenceSession<'_>) -> BTreeMap<VarId, BTreeSet<VarId>> {
        let mut direct: BTreeMap<VarId, BTreeSet<VarId>> = BTreeMap::new();
        for (var, vb) in &self.bounds {
            let mut deps = BTreeSet::new();
            deps.insert(*var);
            for bound in vb.equal.iter().chain(vb.upper.iter()).chain(vb.lower.iter()) {
                for mentioned in bound.inference_variables(s) {
                    deps.insert(mentioned);
                }
            }
            direct.insert(*var, deps);
        }

        // Transitive closure.
        let mut changed = true;
        while changed {
            changed = false;
            let keys: Vec<VarId> = direct.keys().copied().collect();
            for var in &keys {
                let current: Vec<VarId> = direct[var].iter().copied().collect();
                let mut additions = BTreeSet::new();
                for dep in current {
                    if let Some(transitive) = direct.get(&dep) {
                        for t in transitive {
                            if !direct[var].contains(t) {
                                additions.insert(*t);
                            }
                        }
                    }
                }
                if !additions.is_empty() {
                    if let Some(set) = direct.get_mut(var) {
                        set.extend(additions);
                    }
                    changed = true;
                }
            }
        }
        direct
    }
}

/// Argument-wise equations implied by two upper bounds sharing a
/// parameterized supertype of the same generic declaration. Wildcard
/// arguments are skipped.
fn parameterized_super_equations(
    s: &InferenceSession<'_>,
    a: &AbstractType,
    b: &AbstractType,
) -> Vec<Typing> {
    let a_ty = a.as_type(s);
    let b_ty = b.as_type(s);
    let Some((a_sup, b_sup)) = parameterized_supers(s.env(), &a_ty, &b_ty) else {
        return Vec::new();
    };

    let reclassify = |source: &AbstractType, ty: &Type| match source {
        AbstractType::Inference { theta, .. } => AbstractType::create(s, ty, *theta),
        _ => AbstractType::Proper(ty.clone()),
    };

    let (Type::Class(ClassType { args: a_args, .. }), Type::Class(ClassType { args: b_args, .. })) =
        (&a_sup, &b_sup)
    else {
        return Vec::new();
    };
    if a_args.len() != b_args.len() {
        return Vec::new();
    }

    let mut out = Vec::new();
    for (sa, ta) in a_args.iter().zip(b_args.iter()) {
        if matches!(sa, Type::Wildcard(_)) || matches!(ta, Type::Wildcard(_)) {
            continue;
        }
        if sa != ta {
            out.push(Typing::new(
                reclassify(a, sa),
                reclassify(b, ta),
                TypingKind::TypeEquality,
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::CallId;
    use javelin_types::TypeStore;

    fn session_with_vars(store: &TypeStore) -> (InferenceSession<'_>, VarId) {
        let mut s = InferenceSession::new(store);
        // Any declared parameter id works for these unit tests.
        let list_e = store
            .class(store.class_id("java.util.List").unwrap())
            .unwrap()
            .type_params[0];
        let var = s.fresh_variable(list_e, CallId(900), false);
        (s, var)
    }

    #[test]
    fn conflicting_equalities_are_contradictory() {
        let store = TypeStore::with_minimal_jdk();
        let (mut s, var) = session_with_vars(&store);
        let wk = store.well_known();
        let integer = Type::class(wk.integer, vec![]);
        let string = Type::class(wk.string, vec![]);

        let mut bs = BoundSet::new();
        bs.add_bound(&s, var, BoundKind::Equal, AbstractType::Proper(integer));
        bs.add_bound(&s, var, BoundKind::Equal, AbstractType::Proper(string));
        bs.fixed_point(&mut s);

        assert!(bs.contains_false());
    }

    #[test]
    fn lower_bound_above_upper_bound_is_contradictory() {
        let store = TypeStore::with_minimal_jdk();
        let (mut s, var) = session_with_vars(&store);
        let wk = store.well_known();
        let number = Type::class(wk.number, vec![]);
        let string = Type::class(wk.string, vec![]);

        let mut bs = BoundSet::new();
        bs.add_bound(&s, var, BoundKind::Upper, AbstractType::Proper(number));
        bs.add_bound(&s, var, BoundKind::Lower, AbstractType::Proper(string));
        bs.fixed_point(&mut s);

        assert!(bs.contains_false());
    }

    #[test]
    fn compatible_bounds_reach_a_quiet_fixed_point() {
        let store = TypeStore::with_minimal_jdk();
        let (mut s, var) = session_with_vars(&store);
        let wk = store.well_known();
        let number = Type::class(wk.number, vec![]);
        let integer = Type::class(wk.integer, vec![]);

        let mut bs = BoundSet::new();
        bs.add_bound(&s, var, BoundKind::Upper, AbstractType::Proper(number));
        bs.add_bound(&s, var, BoundKind::Lower, AbstractType::Proper(integer.clone()));
        bs.fixed_point(&mut s);

        assert!(!bs.contains_false());
        assert_eq!(bs.var_bounds(var).unwrap().proper_lower_bounds(), vec![integer]);
    }

    #[test]
    fn equal_proper_bound_records_the_instantiation() {
        let store = TypeStore::with_minimal_jdk();
        let (mut s, var) = session_with_vars(&store);
        let string = Type::class(store.well_known().string, vec![]);

        let mut bs = BoundSet::new();
        bs.add_bound(&s, var, BoundKind::Equal, AbstractType::Proper(string.clone()));
        bs.fixed_point(&mut s);

        assert_eq!(bs.instantiation(var), Some(&string));
        assert!(!bs.contains_false());
    }
}
