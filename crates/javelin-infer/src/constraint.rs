//! Constraints and their reduction into bounds (JLS 18.2).

use javelin_types::{
    glb, is_assignable_loose, is_subtype, ClassType, Type, TypeEnv, WildcardBound,
};

use crate::bounds::{BoundKind, BoundSet};
use crate::expr::{ArgExpr, LambdaExpr, MethodRefExpr};
use crate::infer;
use crate::session::{InferenceSession, VarId};
use crate::ty::AbstractType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypingKind {
    /// `S <: T`
    Subtype,
    /// `S <= T` (type-argument containment)
    Contained,
    /// `S = T`
    TypeEquality,
    /// `S -> T` (loose invocation compatibility)
    TypeCompatibility,
}

/// A constraint between two abstract types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Typing {
    pub s: AbstractType,
    pub t: AbstractType,
    pub kind: TypingKind,
}

/// A constraint of the inference phases: either a typing constraint, an
/// argument expression against a target type, or the checked-exception
/// constraint of a lambda/method reference.
#[derive(Clone, Debug)]
pub enum Constraint<'c> {
    Typing(Typing),
    Expression {
        expr: &'c ArgExpr,
        t: AbstractType,
    },
    CheckedException {
        expr: &'c ArgExpr,
        t: AbstractType,
    },
}

impl Constraint<'_> {
    /// Substitute known instantiations into the constraint's types.
    pub(crate) fn apply_instantiations(&mut self, s: &InferenceSession<'_>, bs: &BoundSet) {
        match self {
            Constraint::Typing(typing) => {
                typing.s = typing.s.apply_instantiations(s, bs);
                typing.t = typing.t.apply_instantiations(s, bs);
            }
            Constraint::Expression { t, .. } | Constraint::CheckedException { t, .. } => {
                *t = t.apply_instantiations(s, bs);
            }
        }
    }
}

impl Typing {
    pub fn new(s: AbstractType, t: AbstractType, kind: TypingKind) -> Typing {
        Typing { s, t, kind }
    }

    /// Reduce this constraint, adding direct bounds to `bs` and returning the
    /// simpler constraints it decomposes into. A failed proper-type check
    /// marks `bs` contradictory.
    pub fn reduce(&self, s: &mut InferenceSession<'_>, bs: &mut BoundSet) -> Vec<Typing> {
        let this = Typing {
            s: self.s.apply_instantiations(s, bs),
            t: self.t.apply_instantiations(s, bs),
            kind: self.kind,
        };
        match this.kind {
            TypingKind::TypeCompatibility => this.reduce_compatible(s, bs),
            TypingKind::Subtype => this.reduce_subtyping(s, bs),
            TypingKind::Contained => this.reduce_contained(s, bs),
            TypingKind::TypeEquality => this.reduce_equality(s, bs),
        }
    }

    /// JLS 18.2.2.
    fn reduce_compatible(&self, s: &mut InferenceSession<'_>, bs: &mut BoundSet) -> Vec<Typing> {
        let (sv, tv) = (&self.s, &self.t);
        if let (AbstractType::Proper(s_ty), AbstractType::Proper(t_ty)) = (sv, tv) {
            if is_subtype(s.env(), s_ty, t_ty) {
                return Vec::new();
            }
            if is_assignable_loose(s.env(), s_ty, t_ty) {
                if raw_supertype_only(s.env(), s_ty, t_ty) {
                    bs.set_unchecked_conversion();
                }
                return Vec::new();
            }
            tracing::debug!(s = ?s_ty, t = ?t_ty, "incompatible proper types");
            bs.set_false();
            return Vec::new();
        }

        if let AbstractType::Proper(Type::Primitive(p)) = sv {
            // A primitive argument participates through its wrapper.
            let boxed_s = AbstractType::Proper(javelin_types::boxed(s.env(), *p));
            return vec![Typing::new(boxed_s, tv.clone(), TypingKind::TypeCompatibility)];
        }
        if let AbstractType::Proper(Type::Primitive(p)) = tv {
            let boxed_t = AbstractType::Proper(javelin_types::boxed(s.env(), *p));
            return vec![Typing::new(sv.clone(), boxed_t, TypingKind::TypeEquality)];
        }

        // Unchecked conversion: S only reaches T's declaration raw.
        if !sv.is_use() {
            if let Some(Type::Class(ClassType { def, args })) = underlying_class(tv) {
                if !args.is_empty() {
                    if let Some(AbstractType::Proper(sup) | AbstractType::Inference { ty: sup, .. }) =
                        sv.as_super(s, def)
                    {
                        if matches!(sup, Type::Class(ClassType { args, .. }) if args.is_empty()) {
                            bs.set_unchecked_conversion();
                            return Vec::new();
                        }
                    }
                }
            }
        }

        vec![Typing::new(sv.clone(), tv.clone(), TypingKind::Subtype)]
    }

    /// JLS 18.2.3.
    fn reduce_subtyping(&self, s: &mut InferenceSession<'_>, bs: &mut BoundSet) -> Vec<Typing> {
        let (sv, tv) = (&self.s, &self.t);
        if let (AbstractType::Proper(s_ty), AbstractType::Proper(t_ty)) = (sv, tv) {
            if is_subtype(s.env(), s_ty, t_ty) {
                return Vec::new();
            }
            if is_assignable_loose(s.env(), s_ty, t_ty) && raw_supertype_only(s.env(), s_ty, t_ty)
            {
                bs.set_unchecked_conversion();
                return Vec::new();
            }
            tracing::debug!(s = ?s_ty, t = ?t_ty, "proper subtype check failed");
            bs.set_false();
            return Vec::new();
        }

        if matches!(sv, AbstractType::Proper(Type::Null)) {
            return Vec::new();
        }
        if matches!(tv, AbstractType::Proper(Type::Null)) {
            bs.set_false();
            return Vec::new();
        }

        if sv.is_use() || tv.is_use() {
            if let Some(var) = sv.as_use() {
                // A capture variable on the right contributes its lower bound.
                let upper = match tv {
                    AbstractType::Proper(Type::TypeVar(id)) => {
                        match s.env().type_param(*id).and_then(|d| d.lower_bound.clone()) {
                            Some(lower) => AbstractType::Proper(lower),
                            None => tv.clone(),
                        }
                    }
                    _ => tv.clone(),
                };
                bs.add_bound(s, var, BoundKind::Upper, upper);
            }
            if let Some(var) = tv.as_use() {
                if let AbstractType::Proper(Type::TypeVar(id)) = sv {
                    // A capture variable on the left also bounds from above.
                    if id.is_context_local() {
                        if let Some(upper) = s
                            .env()
                            .type_param(*id)
                            .and_then(|d| d.upper_bounds.first().cloned())
                        {
                            bs.add_bound(s, var, BoundKind::Lower, AbstractType::Proper(upper));
                        }
                    }
                }
                bs.add_bound(s, var, BoundKind::Lower, sv.clone());
            }
            return Vec::new();
        }

        // Both sides are composites (or one is proper); dispatch on T's shape.
        let t_ty = tv.as_type(s);
        match &t_ty {
            Type::Class(ClassType { def, args }) => {
                self.reduce_subtype_class(s, bs, *def, !args.is_empty())
            }
            Type::Array(_) => self.reduce_subtype_array(s, bs),
            Type::TypeVar(_) | Type::Wildcard(_) => self.reduce_subtype_type_variable(s, bs),
            Type::Intersection(parts) => {
                let mut out = Vec::new();
                for part in parts {
                    let part_t = reclassify(s, tv, part);
                    out.push(Typing::new(sv.clone(), part_t, TypingKind::Subtype));
                }
                out
            }
            _ => {
                bs.set_false();
                Vec::new()
            }
        }
    }

    fn reduce_subtype_class(
        &self,
        s: &mut InferenceSession<'_>,
        bs: &mut BoundSet,
        t_def: javelin_types::ClassId,
        t_parameterized: bool,
    ) -> Vec<Typing> {
        let (sv, tv) = (&self.s, &self.t);
        if t_parameterized {
            let Some(s_as_super) = sv.as_super(s, t_def) else {
                bs.set_false();
                return Vec::new();
            };
            // Capture so wildcards do not leak into the argument constraints.
            let s_as_super = s_as_super.capture(s);

            let s_raw = matches!(
                s_as_super.as_type(s),
                Type::Class(ClassType { ref args, .. }) if args.is_empty()
            );
            if s_raw {
                bs.set_unchecked_conversion();
                return Vec::new();
            }

            let (Some(b_args), Some(a_args)) = (s_as_super.type_arguments(s), tv.type_arguments(s))
            else {
                bs.set_false();
                return Vec::new();
            };
            if b_args.len() != a_args.len() {
                bs.set_false();
                return Vec::new();
            }
            b_args
                .into_iter()
                .zip(a_args)
                .map(|(b, a)| Typing::new(b, a, TypingKind::Contained))
                .collect()
        } else {
            // T is a non-generic class: an ordinary supertype query over the
            // underlying types decides.
            let s_ty = sv.as_type(s);
            let t_ty = tv.as_type(s);
            if is_subtype(s.env(), &s_ty, &t_ty) {
                Vec::new()
            } else {
                bs.set_false();
                Vec::new()
            }
        }
    }

    fn reduce_subtype_array(&self, s: &mut InferenceSession<'_>, bs: &mut BoundSet) -> Vec<Typing> {
        let (sv, tv) = (&self.s, &self.t);
        let Some(s_component) = sv.component(s) else {
            bs.set_false();
            return Vec::new();
        };
        let Some(t_component) = tv.component(s) else {
            bs.set_false();
            return Vec::new();
        };
        let s_prim = matches!(s_component, AbstractType::Proper(Type::Primitive(_)));
        let t_prim = matches!(t_component, AbstractType::Proper(Type::Primitive(_)));
        if s_prim && t_prim {
            if s_component != t_component {
                bs.set_false();
            }
            return Vec::new();
        }
        vec![Typing::new(s_component, t_component, TypingKind::Subtype)]
    }

    fn reduce_subtype_type_variable(
        &self,
        s: &mut InferenceSession<'_>,
        bs: &mut BoundSet,
    ) -> Vec<Typing> {
        let (sv, tv) = (&self.s, &self.t);
        let s_ty = sv.as_type(s);
        if matches!(s_ty, Type::Intersection(_)) {
            return Vec::new();
        }
        let t_ty = tv.as_type(s);
        match &t_ty {
            Type::TypeVar(id) => {
                if let Some(lower) = s.env().type_param(*id).and_then(|d| d.lower_bound.clone()) {
                    let lower_t = reclassify(s, tv, &lower);
                    return vec![Typing::new(sv.clone(), lower_t, TypingKind::Subtype)];
                }
                bs.set_false();
                Vec::new()
            }
            Type::Wildcard(WildcardBound::Super(lower)) => {
                let lower_t = reclassify(s, tv, lower);
                vec![Typing::new(sv.clone(), lower_t, TypingKind::Subtype)]
            }
            _ => {
                bs.set_false();
                Vec::new()
            }
        }
    }

    /// JLS 18.2.3, containment.
    fn reduce_contained(&self, s: &mut InferenceSession<'_>, bs: &mut BoundSet) -> Vec<Typing> {
        let (sv, tv) = (&self.s, &self.t);
        let t_ty = tv.as_type(s);
        let s_ty = sv.as_type(s);

        match &t_ty {
            Type::Wildcard(WildcardBound::Unbounded) => Vec::new(),
            Type::Wildcard(WildcardBound::Extends(t_upper)) => {
                let t_upper = reclassify(s, tv, t_upper);
                match &s_ty {
                    Type::Wildcard(WildcardBound::Unbounded) => {
                        let object =
                            AbstractType::Proper(Type::class(s.env().well_known().object, vec![]));
                        vec![Typing::new(object, t_upper, TypingKind::Subtype)]
                    }
                    Type::Wildcard(WildcardBound::Extends(s_upper)) => {
                        let s_upper = reclassify(s, sv, s_upper);
                        vec![Typing::new(s_upper, t_upper, TypingKind::Subtype)]
                    }
                    Type::Wildcard(WildcardBound::Super(s_lower)) => {
                        let s_lower = reclassify(s, sv, s_lower);
                        vec![Typing::new(s_lower, t_upper, TypingKind::TypeEquality)]
                    }
                    _ => vec![Typing::new(sv.clone(), t_upper, TypingKind::Subtype)],
                }
            }
            Type::Wildcard(WildcardBound::Super(t_lower)) => {
                let t_lower = reclassify(s, tv, t_lower);
                match &s_ty {
                    Type::Wildcard(WildcardBound::Super(s_lower)) => {
                        let s_lower = reclassify(s, sv, s_lower);
                        vec![Typing::new(t_lower, s_lower, TypingKind::Subtype)]
                    }
                    Type::Wildcard(_) => {
                        bs.set_false();
                        Vec::new()
                    }
                    _ => vec![Typing::new(t_lower, sv.clone(), TypingKind::Subtype)],
                }
            }
            _ => {
                if matches!(s_ty, Type::Wildcard(_)) {
                    bs.set_false();
                    return Vec::new();
                }
                vec![Typing::new(sv.clone(), tv.clone(), TypingKind::TypeEquality)]
            }
        }
    }

    /// JLS 18.2.4.
    fn reduce_equality(&self, s: &mut InferenceSession<'_>, bs: &mut BoundSet) -> Vec<Typing> {
        let (sv, tv) = (&self.s, &self.t);
        if let (AbstractType::Proper(s_ty), AbstractType::Proper(t_ty)) = (sv, tv) {
            if s_ty != t_ty && !s_ty.is_errorish() && !t_ty.is_errorish() {
                tracing::debug!(s = ?s_ty, t = ?t_ty, "proper types are not the same");
                bs.set_false();
            }
            return Vec::new();
        }

        // The null type and primitives cannot equal a non-proper type.
        for side in [sv, tv] {
            if matches!(
                side,
                AbstractType::Proper(Type::Null) | AbstractType::Proper(Type::Primitive(_))
            ) {
                bs.set_false();
                return Vec::new();
            }
        }

        if sv.is_use() || tv.is_use() {
            if let Some(var) = sv.as_use() {
                bs.add_bound(s, var, BoundKind::Equal, tv.clone());
            }
            if let Some(var) = tv.as_use() {
                bs.add_bound(s, var, BoundKind::Equal, sv.clone());
            }
            return Vec::new();
        }

        let s_ty = sv.as_type(s);
        let t_ty = tv.as_type(s);

        if let (
            Type::Class(ClassType { def: s_def, args: s_args }),
            Type::Class(ClassType { def: t_def, args: t_args }),
        ) = (&s_ty, &t_ty)
        {
            if s_def == t_def && s_args.len() == t_args.len() && !s_args.is_empty() {
                let s_arg_types = sv.type_arguments(s).unwrap_or_default();
                let t_arg_types = tv.type_arguments(s).unwrap_or_default();
                return t_arg_types
                    .into_iter()
                    .zip(s_arg_types)
                    .filter(|(t, s)| t != s)
                    .map(|(t, s)| Typing::new(t, s, TypingKind::TypeEquality))
                    .collect();
            }
        }

        if let (Some(s_component), Some(t_component)) = (sv.component(s), tv.component(s)) {
            return vec![Typing::new(s_component, t_component, TypingKind::TypeEquality)];
        }

        if let (Type::Wildcard(s_bound), Type::Wildcard(t_bound)) = (&s_ty, &t_ty) {
            match (s_bound, t_bound) {
                (WildcardBound::Unbounded, WildcardBound::Unbounded) => return Vec::new(),
                (WildcardBound::Super(s_lower), WildcardBound::Super(t_lower)) => {
                    return vec![Typing::new(
                        reclassify(s, tv, t_lower),
                        reclassify(s, sv, s_lower),
                        TypingKind::TypeEquality,
                    )];
                }
                (WildcardBound::Super(_), _) | (_, WildcardBound::Super(_)) => {}
                (s_b, t_b) => {
                    let s_upper = match s_b {
                        WildcardBound::Extends(u) => reclassify(s, sv, u),
                        _ => AbstractType::Proper(Type::class(s.env().well_known().object, vec![])),
                    };
                    let t_upper = match t_b {
                        WildcardBound::Extends(u) => reclassify(s, tv, u),
                        _ => AbstractType::Proper(Type::class(s.env().well_known().object, vec![])),
                    };
                    return vec![Typing::new(s_upper, t_upper, TypingKind::TypeEquality)];
                }
            }
        }

        bs.set_false();
        Vec::new()
    }
}

/// Classify a structural sub-type against the theta of the abstract type it
/// was pulled out of.
fn reclassify(s: &InferenceSession<'_>, source: &AbstractType, ty: &Type) -> AbstractType {
    match source {
        AbstractType::Inference { theta, .. } => AbstractType::create(s, ty, *theta),
        _ => AbstractType::Proper(ty.clone()),
    }
}

fn underlying_class(at: &AbstractType) -> Option<Type> {
    match at {
        AbstractType::Proper(ty @ Type::Class(_)) | AbstractType::Inference { ty: ty @ Type::Class(_), .. } => {
            Some(ty.clone())
        }
        _ => None,
    }
}

/// Whether loose compatibility held only through the raw-supertype unchecked
/// conversion.
fn raw_supertype_only(env: &dyn TypeEnv, s_ty: &Type, t_ty: &Type) -> bool {
    let Type::Class(ClassType { def, args }) = t_ty else {
        return false;
    };
    if args.is_empty() {
        return false;
    }
    matches!(
        javelin_types::instantiate_as_supertype(env, s_ty, *def),
        Some(Type::Class(ClassType { args, .. })) if args.is_empty()
    )
}

/// Outcome of reducing an expression constraint.
pub(crate) enum ExprReduction<'c> {
    True,
    False,
    Constraints(Vec<Constraint<'c>>),
    /// A nested invocation's applicability-and-target bound set.
    Bounds(BoundSet),
}

/// JLS 18.2.1.
pub(crate) fn reduce_expression<'c>(
    expr: &'c ArgExpr,
    t: &AbstractType,
    s: &mut InferenceSession<'_>,
) -> ExprReduction<'c> {
    match expr {
        ArgExpr::Parenthesized(inner) => reduce_expression(inner, t, s),
        ArgExpr::Conditional { then, els } => ExprReduction::Constraints(vec![
            Constraint::Expression {
                expr: then,
                t: t.clone(),
            },
            Constraint::Expression {
                expr: els,
                t: t.clone(),
            },
        ]),
        ArgExpr::Typed(ty) => ExprReduction::Constraints(vec![Constraint::Typing(Typing::new(
            AbstractType::Proper(ty.clone()),
            t.clone(),
            TypingKind::TypeCompatibility,
        ))]),
        ArgExpr::Invocation(call) => {
            if s.in_flight.contains(&call.id) {
                // Re-entrant request for an invocation already being inferred:
                // answer with no constraints rather than recursing forever.
                tracing::debug!(call = ?call.id, "recursion guard hit during nested inference");
                return ExprReduction::True;
            }
            match infer::nested_invocation_bounds(s, call, t) {
                Some(bounds) => ExprReduction::Bounds(bounds),
                // Nested inference failures are absorbed; the outer inference
                // proceeds without type arguments for this sub-expression.
                None => ExprReduction::True,
            }
        }
        ArgExpr::Lambda(lambda) => reduce_lambda(lambda, t, s),
        ArgExpr::MethodRef(method_ref) => reduce_method_ref(method_ref, t, s),
    }
}

fn reduce_lambda<'c>(
    lambda: &'c LambdaExpr,
    t: &AbstractType,
    s: &mut InferenceSession<'_>,
) -> ExprReduction<'c> {
    // The target must be a functional interface type; compute the ground
    // target (non-wildcard parameterization) first.
    let ground = ground_target(t, s);
    let Some(descriptor) = ground.functional_descriptor(s) else {
        return ExprReduction::False;
    };

    let mut constraints: Vec<Constraint<'c>> = Vec::new();

    if let Some(params) = &lambda.explicit_params {
        if params.len() != descriptor.params.len() {
            return ExprReduction::False;
        }
        for (pi, gi) in params.iter().zip(descriptor.params.iter()) {
            constraints.push(Constraint::Typing(Typing::new(
                AbstractType::Proper(pi.clone()),
                gi.clone(),
                TypingKind::TypeEquality,
            )));
        }
        if ground != *t {
            constraints.push(Constraint::Typing(Typing::new(
                ground.clone(),
                t.clone(),
                TypingKind::Subtype,
            )));
        }
    }

    if let Some(return_type) = &descriptor.return_type {
        for e in &lambda.returns {
            constraints.push(Constraint::Expression {
                expr: e,
                t: return_type.clone(),
            });
        }
    }

    ExprReduction::Constraints(constraints)
}

fn reduce_method_ref<'c>(
    method_ref: &'c MethodRefExpr,
    t: &AbstractType,
    s: &mut InferenceSession<'_>,
) -> ExprReduction<'c> {
    let Some(descriptor) = t.functional_descriptor(s) else {
        return ExprReduction::False;
    };
    let Some(referenced) = &method_ref.exact else {
        // An inexact reference needs overload resolution against the (not yet
        // known) descriptor; it contributes nothing here. Its checked
        // exceptions are handled by the separate throws constraint.
        return ExprReduction::True;
    };

    if descriptor.params.len() != referenced.params.len() {
        return ExprReduction::False;
    }

    let mut constraints: Vec<Constraint<'c>> = Vec::new();
    for (pi, fi) in descriptor.params.iter().zip(referenced.params.iter()) {
        constraints.push(Constraint::Typing(Typing::new(
            pi.clone(),
            AbstractType::Proper(fi.clone()),
            TypingKind::Subtype,
        )));
    }
    if let Some(r) = &descriptor.return_type {
        if referenced.return_type != Type::Void {
            constraints.push(Constraint::Typing(Typing::new(
                AbstractType::Proper(referenced.return_type.clone()),
                r.clone(),
                TypingKind::TypeCompatibility,
            )));
        }
    }
    ExprReduction::Constraints(constraints)
}

/// Checked-exception constraint of a lambda or method reference (JLS 18.2.5).
///
/// Every checked exception the body can throw that no proper thrown type of
/// the descriptor covers becomes a lower bound on each variable thrown type,
/// and those variables are marked as throws-bounded.
pub(crate) fn reduce_checked_exception(
    expr: &ArgExpr,
    t: &AbstractType,
    s: &mut InferenceSession<'_>,
    bs: &mut BoundSet,
) {
    let Some(descriptor) = t.functional_descriptor(s) else {
        return;
    };

    let mut proper_thrown: Vec<Type> = Vec::new();
    let mut variable_thrown: Vec<VarId> = Vec::new();
    for e in &descriptor.throws {
        match e {
            AbstractType::Proper(ty) => proper_thrown.push(ty.clone()),
            AbstractType::Use(var) => {
                if !variable_thrown.contains(var) {
                    variable_thrown.push(*var);
                }
            }
            AbstractType::Inference { .. } => {}
        }
    }
    if variable_thrown.is_empty() {
        return;
    }

    let body_thrown: &[Type] = match expr {
        ArgExpr::Lambda(l) => &l.thrown,
        ArgExpr::MethodRef(m) => &m.thrown,
        _ => &[],
    };

    for x in body_thrown {
        let covered = proper_thrown.iter().any(|e| is_subtype(s.env(), x, e));
        if covered {
            continue;
        }
        for var in &variable_thrown {
            bs.add_bound(s, *var, BoundKind::Lower, AbstractType::Proper(x.clone()));
        }
    }
    for var in variable_thrown {
        bs.mark_throws(var);
    }
}

/// Ground target type of a lambda (JLS 18.5.3 / 9.9): the non-wildcard
/// parameterization of a wildcard-parameterized functional interface target.
fn ground_target(t: &AbstractType, s: &InferenceSession<'_>) -> AbstractType {
    if !t.is_wildcard_parameterized() {
        return t.clone();
    }
    let ty = t.as_type(s);
    let Type::Class(ClassType { def, args }) = &ty else {
        return t.clone();
    };
    let Some(class_def) = s.env().class(*def) else {
        return t.clone();
    };

    let object = Type::class(s.env().well_known().object, vec![]);
    let formal_bounds: Vec<Type> = class_def
        .type_params
        .iter()
        .map(|tp| {
            s.env()
                .type_param(*tp)
                .and_then(|d| d.upper_bounds.first().cloned())
                .unwrap_or_else(|| object.clone())
        })
        .collect();

    let new_args: Vec<Type> = args
        .iter()
        .enumerate()
        .map(|(idx, arg)| {
            let bi = formal_bounds.get(idx).cloned().unwrap_or_else(|| object.clone());
            match arg {
                Type::Wildcard(WildcardBound::Unbounded) => bi,
                Type::Wildcard(WildcardBound::Extends(upper)) => {
                    glb(s.env(), &[(**upper).clone(), bi])
                }
                Type::Wildcard(WildcardBound::Super(lower)) => (**lower).clone(),
                other => other.clone(),
            }
        })
        .collect();

    let grounded = Type::class(*def, new_args);
    reclassify(s, t, &grounded)
}

/// Input variables of a constraint (JLS 18.5.2.2): the variables whose
/// instantiations must be known before the constraint can be reduced.
pub(crate) fn input_variables(c: &Constraint<'_>, s: &InferenceSession<'_>) -> Vec<VarId> {
    fn expr_inputs(expr: &ArgExpr, t: &AbstractType, s: &InferenceSession<'_>) -> Vec<VarId> {
        match expr {
            ArgExpr::Lambda(lambda) => {
                if let Some(var) = t.as_use() {
                    return vec![var];
                }
                if lambda.explicit_params.is_some() {
                    return Vec::new();
                }
                descriptor_param_vars(t, s)
            }
            ArgExpr::MethodRef(m) => {
                if let Some(var) = t.as_use() {
                    return vec![var];
                }
                if m.exact.is_some() {
                    return Vec::new();
                }
                descriptor_param_vars(t, s)
            }
            ArgExpr::Parenthesized(inner) => expr_inputs(inner, t, s),
            ArgExpr::Conditional { then, els } => {
                let mut vars = expr_inputs(then, t, s);
                for v in expr_inputs(els, t, s) {
                    if !vars.contains(&v) {
                        vars.push(v);
                    }
                }
                vars
            }
            _ => Vec::new(),
        }
    }

    match c {
        Constraint::Typing(_) => Vec::new(),
        Constraint::Expression { expr, t } => expr_inputs(expr, t, s),
        Constraint::CheckedException { expr, t } => {
            if let Some(var) = t.as_use() {
                return vec![var];
            }
            let mut vars = match expr {
                ArgExpr::Lambda(l) if l.explicit_params.is_none() => descriptor_param_vars(t, s),
                ArgExpr::MethodRef(m) if m.exact.is_none() => descriptor_param_vars(t, s),
                _ => Vec::new(),
            };
            for v in descriptor_return_vars(t, s) {
                if !vars.contains(&v) {
                    vars.push(v);
                }
            }
            vars
        }
    }
}

/// Output variables: the variables of the target type that are not inputs.
pub(crate) fn output_variables(c: &Constraint<'_>, s: &InferenceSession<'_>) -> Vec<VarId> {
    let t = match c {
        Constraint::Typing(_) => return Vec::new(),
        Constraint::Expression { t, .. } | Constraint::CheckedException { t, .. } => t,
    };
    let inputs = input_variables(c, s);
    t.inference_variables(s)
        .into_iter()
        .filter(|v| !inputs.contains(v))
        .collect()
}

fn descriptor_param_vars(t: &AbstractType, s: &InferenceSession<'_>) -> Vec<VarId> {
    let Some(descriptor) = t.functional_descriptor(s) else {
        return t.inference_variables(s);
    };
    let mut out = Vec::new();
    for p in &descriptor.params {
        for v in p.inference_variables(s) {
            if !out.contains(&v) {
                out.push(v);
            }
        }
    }
    out
}

fn descriptor_return_vars(t: &AbstractType, s: &InferenceSession<'_>) -> Vec<VarId> {
    let Some(descriptor) = t.functional_descriptor(s) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if let Some(r) = &descriptor.return_type {
        for v in r.inference_variables(s) {
            if !out.contains(&v) {
                out.push(v);
            }
        }
    }
    out
}

/// Reduce a worklist of constraints into a fresh bound set (the constraint
/// side of JLS 18.5.2.2). Derived complementary constraints are left pending;
/// they run when the result is incorporated into the caller's bound set.
pub(crate) fn reduce_constraints<'c>(
    items: Vec<Constraint<'c>>,
    s: &mut InferenceSession<'_>,
) -> BoundSet {
    let mut bs = BoundSet::new();
    let mut work: std::collections::VecDeque<Constraint<'c>> = items.into();

    while let Some(c) = work.pop_front() {
        if bs.contains_false() {
            return bs;
        }
        match c {
            Constraint::Typing(typing) => {
                for sub in typing.reduce(s, &mut bs) {
                    work.push_back(Constraint::Typing(sub));
                }
            }
            Constraint::Expression { expr, t } => {
                let t = t.apply_instantiations(s, &bs);
                match reduce_expression(expr, &t, s) {
                    ExprReduction::True => {}
                    ExprReduction::False => bs.set_false(),
                    ExprReduction::Constraints(subs) => work.extend(subs),
                    ExprReduction::Bounds(nested) => bs.merge_from(s, nested),
                }
            }
            Constraint::CheckedException { expr, t } => {
                let t = t.apply_instantiations(s, &bs);
                reduce_checked_exception(expr, &t, s, &mut bs);
            }
        }
    }
    bs
}
