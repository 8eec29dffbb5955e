//! Invocation type inference: the phase machine driving variable creation,
//! applicability bounds, target-type refinement, remaining constraints, and
//! resolution (JLS 18.5.2).

use std::collections::BTreeSet;

use javelin_types::{substitute, ClassType, Type, TypeEnv};

use crate::bounds::{BoundKind, BoundSet};
use crate::constraint::{reduce_constraints, Constraint, Typing, TypingKind};
use crate::error::InferenceError;
use crate::expr::{ArgExpr, CallSite};
use crate::resolve::resolve;
use crate::session::{InferenceResult, InferenceSession, ThetaId, VarId};
use crate::ty::AbstractType;

impl<'env> InferenceSession<'env> {
    /// Infer the type arguments of `call`.
    ///
    /// Failure is reported for the top-level call site only; failures inside
    /// nested inference for argument expressions are absorbed, and the outer
    /// inference proceeds without type arguments for those sub-expressions.
    pub fn infer(&mut self, call: &CallSite) -> Result<InferenceResult, InferenceError> {
        if self.in_flight.contains(&call.id) {
            return Err(InferenceError::Internal(format!(
                "re-entrant top-level inference for call {:?}",
                call.id
            )));
        }
        if call.args.len() != call.method.params.len() {
            return Err(InferenceError::Internal(
                "argument/parameter arity mismatch; varargs must be expanded by the front end"
                    .to_string(),
            ));
        }

        self.in_flight.push(call.id);
        let result = infer_internal(self, call);
        self.in_flight.pop();

        if let Ok(res) = &result {
            self.results.insert(call.id, res.clone());
        }
        result
    }
}

fn infer_internal(
    s: &mut InferenceSession<'_>,
    call: &CallSite,
) -> Result<InferenceResult, InferenceError> {
    let theta = s.theta_for(call);
    tracing::debug!(call = ?call.id, method = %call.method.name, "inference started");

    let mut bs = create_b2(s, call, theta);
    if bs.contains_false() {
        // Applicability is a distinct, earlier check assumed to have passed.
        return Err(InferenceError::Internal(
            "applicability bound set was contradictory".to_string(),
        ));
    }

    if call.poly {
        if let Some(target) = &call.target {
            create_b3(s, call, theta, &mut bs, AbstractType::Proper(target.clone()));
            if bs.contains_false() {
                return Err(InferenceError::ContradictoryBounds { call: call.id });
            }
        }
    }

    let c = create_c(s, call, theta);
    compute_b4(s, &mut bs, c).map_err(|unresolved| failure_for(s, &bs, call, unresolved))?;
    if bs.contains_false() {
        return Err(InferenceError::ContradictoryBounds { call: call.id });
    }

    // Final resolution of every remaining variable.
    let all_vars: Vec<VarId> = bs.vars().collect();
    match resolve(&all_vars, &mut bs, s) {
        Ok(()) if !bs.contains_false() => {}
        Ok(()) => return Err(InferenceError::ContradictoryBounds { call: call.id }),
        Err(v) => return Err(failure_for(s, &bs, call, Some(v))),
    }

    // Record inferred mappings for nested invocations encountered on the way.
    for (nested_call, nested_theta) in s.cached_thetas() {
        if nested_call == call.id || s.results.contains_key(&nested_call) {
            continue;
        }
        if let Some(res) = collect_result(s, &bs, nested_call, nested_theta) {
            s.results.insert(nested_call, res);
        }
    }

    match collect_result(s, &bs, call.id, theta) {
        Some(mut res) => {
            res.unchecked_conversion = bs.unchecked_conversion();
            tracing::debug!(call = ?call.id, args = ?res.type_arguments, "inference succeeded");
            Ok(res)
        }
        None => Err(failure_for(s, &bs, call, None)),
    }
}

fn collect_result(
    s: &InferenceSession<'_>,
    bs: &BoundSet,
    call: crate::expr::CallId,
    theta: ThetaId,
) -> Option<InferenceResult> {
    let mut type_arguments = Vec::new();
    for (tv, var) in s.theta(theta).entries() {
        if s.var(*var).is_capture {
            // Theta extensions for capture bounds are not declared parameters.
            continue;
        }
        let inst = bs.instantiation(*var)?;
        type_arguments.push((*tv, inst.clone()));
    }
    Some(InferenceResult {
        call,
        type_arguments,
        unchecked_conversion: bs.unchecked_conversion(),
    })
}

fn failure_for(
    s: &InferenceSession<'_>,
    bs: &BoundSet,
    call: &CallSite,
    unresolved: Option<VarId>,
) -> InferenceError {
    if bs.contains_false() {
        return InferenceError::ContradictoryBounds { call: call.id };
    }
    let type_param = match unresolved {
        Some(v) => s.var_name(v),
        None => s
            .cached_thetas()
            .iter()
            .find(|(id, _)| *id == call.id)
            .and_then(|(_, theta)| {
                s.theta(*theta)
                    .vars()
                    .find(|v| bs.instantiation(*v).is_none())
            })
            .map(|v| s.var_name(v))
            .unwrap_or_else(|| "?".to_string()),
    };
    InferenceError::UnresolvedVariable {
        call: call.id,
        type_param,
    }
}

/// B1 through B2: throws markers and the reduced constraints of the
/// arguments pertinent to applicability (JLS 18.5.1).
///
/// Declared type-parameter bounds are not seeded as bounds: conformance to
/// them is the applicability check's job, and a variable no argument or
/// target constrains must stay bound-free so final resolution reports it
/// instead of defaulting it.
pub(crate) fn create_b2(
    s: &mut InferenceSession<'_>,
    call: &CallSite,
    theta: ThetaId,
) -> BoundSet {
    let mut bs = BoundSet::new();

    let entries = s.theta(theta).entries().to_vec();
    for (_, var) in &entries {
        bs.ensure_var(*var);
    }

    // Type parameters appearing in the throws clause get the throws marker.
    for thrown in &call.method.throws {
        let at = AbstractType::create(s, thrown, theta);
        if let Some(var) = at.as_use() {
            bs.mark_throws(var);
        }
    }

    // Constraints for the argument/formal pairs pertinent to applicability.
    let mut constraints: Vec<Constraint<'_>> = Vec::new();
    for (arg, formal) in call.args.iter().zip(call.method.params.iter()) {
        let fi = AbstractType::create(s, formal, theta);
        if !not_pertinent_to_applicability(arg, fi.is_use()) {
            constraints.push(Constraint::Expression { expr: arg, t: fi });
        }
    }
    let new_bounds = reduce_constraints(constraints, s);
    bs.incorporate(s, new_bounds);
    bs
}

/// B2 to B3: constraints against the target type of a poly invocation
/// (JLS 18.5.2.1).
pub(crate) fn create_b3(
    s: &mut InferenceSession<'_>,
    call: &CallSite,
    theta: ThetaId,
    bs: &mut BoundSet,
    target: AbstractType,
) {
    if call.method.return_type == Type::Void {
        return;
    }
    let r = AbstractType::create(s, &call.method.return_type, theta);

    if bs.unchecked_conversion() {
        // Applicability needed an unchecked conversion: the target sees the
        // erasure of the return type.
        let erased = r.erased(s);
        let new_bounds = reduce_constraints(
            vec![Constraint::Typing(Typing::new(
                erased,
                target,
                TypingKind::TypeCompatibility,
            ))],
            s,
        );
        bs.incorporate(s, new_bounds);
        return;
    }

    if r.is_wildcard_parameterized() {
        capture_return_and_constrain(s, call, theta, bs, &r, target);
        return;
    }

    if let Some(alpha) = r.as_use() {
        if let AbstractType::Proper(target_ty) = &target {
            if resolve_return_variable_early(s, bs, alpha, target_ty) {
                if bs.contains_false() {
                    return;
                }
                let Some(inst) = bs.instantiation(alpha).cloned() else {
                    bs.set_false();
                    return;
                };
                let captured = s.ctx.capture_conversion(&inst);
                let new_bounds = reduce_constraints(
                    vec![Constraint::Typing(Typing::new(
                        AbstractType::Proper(captured),
                        target,
                        TypingKind::TypeCompatibility,
                    ))],
                    s,
                );
                bs.incorporate(s, new_bounds);
                return;
            }
        }
    }

    let new_bounds = reduce_constraints(
        vec![Constraint::Typing(Typing::new(
            r,
            target,
            TypingKind::TypeCompatibility,
        ))],
        s,
    );
    bs.incorporate(s, new_bounds);
}

/// The special target-compatibility triggers for a return type that is a lone
/// inference variable. When one fires the variable is resolved eagerly and
/// the capture of its instantiation is constrained against the target
/// instead of the variable itself. Returns whether a trigger fired.
fn resolve_return_variable_early(
    s: &mut InferenceSession<'_>,
    bs: &mut BoundSet,
    alpha: VarId,
    target_ty: &Type,
) -> bool {
    bs.ensure_var(alpha);
    let entry = bs.var_bounds(alpha).cloned().unwrap_or_default();

    let fire = if target_ty.is_primitive() {
        // The target is primitive and a primitive wrapper class bounds alpha.
        entry.has_primitive_wrapper_bound(s.env())
    } else if !target_ty.is_reference() {
        false
    } else if !target_ty.is_wildcard_parameterized() {
        // (i) a wildcard-parameterized lower/equal bound, or (ii) two lower
        // bounds that are different parameterizations of one declaration.
        entry.has_wildcard_parameterized_lower_or_equal_bound()
            || entry.has_lower_bound_different_param(s.env())
    } else {
        // (iii) the target parameterizes G and a lower/equal bound reaches G
        // only as the raw type.
        entry.has_raw_type_lower_or_equal_bound(s.env(), target_ty)
    };

    if !fire {
        return false;
    }
    tracing::debug!(var = ?alpha, "target-compatibility trigger fired; resolving return variable early");
    if resolve(&[alpha], bs, s).is_err() {
        bs.set_false();
    }
    true
}

/// The wildcard-parameterized-return branch of B3: bind fresh capture
/// variables `G<b1..bn> = capture(G<A1..An>)` and constrain the fresh
/// parameterization against the target.
fn capture_return_and_constrain(
    s: &mut InferenceSession<'_>,
    call: &CallSite,
    theta: ThetaId,
    bs: &mut BoundSet,
    r: &AbstractType,
    target: AbstractType,
) {
    let r_ty = r.as_type(s);
    let Type::Class(ClassType { def, args }) = &r_ty else {
        // Not a class use after all; fall back to the ordinary constraint.
        let new_bounds = reduce_constraints(
            vec![Constraint::Typing(Typing::new(
                r.clone(),
                target,
                TypingKind::TypeCompatibility,
            ))],
            s,
        );
        bs.incorporate(s, new_bounds);
        return;
    };
    let Some(class_def) = s.env().class(*def) else {
        bs.set_false();
        return;
    };
    let declared_params = class_def.type_params.clone();
    let formal_bounds: Vec<Type> = declared_params
        .iter()
        .map(|tp| {
            s.env()
                .type_param(*tp)
                .and_then(|d| d.upper_bounds.first().cloned())
                .unwrap_or_else(|| Type::class(s.env().well_known().object, vec![]))
        })
        .collect();
    let def = *def;
    let args = args.clone();

    // Fresh capture variables, one per type argument.
    let mut beta_tvs = Vec::with_capacity(args.len());
    let mut beta_vars = Vec::with_capacity(args.len());
    for _ in &args {
        let (tv, var) = s.extend_theta_with_capture(theta, call.id, vec![], None);
        beta_tvs.push(tv);
        beta_vars.push(var);
    }

    // Formal bounds are read with the class's parameters mapped to the fresh
    // variables.
    let beta_subst: std::collections::HashMap<_, _> = declared_params
        .iter()
        .copied()
        .zip(beta_tvs.iter().map(|tv| Type::TypeVar(*tv)))
        .collect();

    for ((arg, beta), formal_bound) in args.iter().zip(beta_vars.iter()).zip(formal_bounds.iter())
    {
        bs.ensure_var(*beta);
        let bi = AbstractType::create(s, &substitute(formal_bound, &beta_subst), theta);
        match arg {
            Type::Wildcard(javelin_types::WildcardBound::Unbounded) => {
                bs.add_bound(s, *beta, BoundKind::Upper, bi);
            }
            Type::Wildcard(javelin_types::WildcardBound::Extends(upper)) => {
                let upper_at = AbstractType::create(s, upper, theta);
                bs.add_bound(s, *beta, BoundKind::Upper, upper_at);
                bs.add_bound(s, *beta, BoundKind::Upper, bi);
            }
            Type::Wildcard(javelin_types::WildcardBound::Super(lower)) => {
                let lower_at = AbstractType::create(s, lower, theta);
                bs.add_bound(s, *beta, BoundKind::Lower, lower_at);
                bs.add_bound(s, *beta, BoundKind::Upper, bi);
            }
            other => {
                let equal = AbstractType::create(s, other, theta);
                bs.add_bound(s, *beta, BoundKind::Equal, equal);
            }
        }
    }

    let fresh_args: Vec<Type> = beta_tvs.iter().map(|tv| Type::TypeVar(*tv)).collect();
    let fresh_parameterization = AbstractType::create(s, &Type::class(def, fresh_args), theta);
    let new_bounds = reduce_constraints(
        vec![Constraint::Typing(Typing::new(
            fresh_parameterization,
            target,
            TypingKind::TypeCompatibility,
        ))],
        s,
    );
    bs.incorporate(s, new_bounds);
    bs.fixed_point(s);
}

/// Bounds for a nested poly invocation appearing as an argument: the bound
/// set B2 (and B3 against the nested target) that would determine its
/// invocation type (JLS 18.2.1). `None` means the nested inference failed and
/// is absorbed by the caller.
pub(crate) fn nested_invocation_bounds(
    s: &mut InferenceSession<'_>,
    call: &CallSite,
    target: &AbstractType,
) -> Option<BoundSet> {
    if call.args.len() != call.method.params.len() {
        return None;
    }
    s.in_flight.push(call.id);
    let theta = s.theta_for(call);
    let mut bs = create_b2(s, call, theta);
    if !bs.contains_false() {
        create_b3(s, call, theta, &mut bs, target.clone());
    }
    s.in_flight.pop();

    if bs.contains_false() {
        tracing::debug!(call = ?call.id, "nested inference failed; absorbing");
        return None;
    }
    Some(bs)
}

/// C: constraints for the argument/formal pairs *not* pertinent to
/// applicability, plus the additional constraints of lambdas, method
/// references, and nested poly invocations (JLS 18.5.2.2).
pub(crate) fn create_c<'c>(
    s: &mut InferenceSession<'_>,
    call: &'c CallSite,
    theta: ThetaId,
) -> Vec<Constraint<'c>> {
    let mut out = Vec::new();
    for (arg, formal) in call.args.iter().zip(call.method.params.iter()) {
        let fi = AbstractType::create(s, formal, theta);
        if not_pertinent_to_applicability(arg, fi.is_use()) {
            out.push(Constraint::Expression {
                expr: arg,
                t: fi.clone(),
            });
        }
        additional_arg_constraints(s, arg, &fi, &mut out);
    }
    out
}

/// Checked-exception constraints and nested-invocation constraints for an
/// argument and its subexpressions.
fn additional_arg_constraints<'c>(
    s: &mut InferenceSession<'_>,
    expr: &'c ArgExpr,
    fi: &AbstractType,
    out: &mut Vec<Constraint<'c>>,
) {
    match expr {
        ArgExpr::MethodRef(_) => {
            out.push(Constraint::CheckedException {
                expr,
                t: fi.clone(),
            });
        }
        ArgExpr::Lambda(lambda) => {
            out.push(Constraint::CheckedException {
                expr,
                t: fi.clone(),
            });
            for ret in &lambda.returns {
                additional_arg_constraints(s, ret, fi, out);
            }
        }
        ArgExpr::Invocation(nested) => {
            if nested.poly
                && !s.in_flight.contains(&nested.id)
                && nested.args.len() == nested.method.params.len()
            {
                let nested_theta = s.theta_for(nested);
                let mut nested_constraints = create_c(s, nested, nested_theta);
                out.append(&mut nested_constraints);
            }
        }
        ArgExpr::Parenthesized(inner) => additional_arg_constraints(s, inner, fi, out),
        ArgExpr::Conditional { then, els } => {
            additional_arg_constraints(s, then, fi, out);
            additional_arg_constraints(s, els, fi, out);
        }
        ArgExpr::Typed(_) => {}
    }
}

/// B4: reduce the remaining constraints in dependency order, resolving the
/// input variables of each selected subset first (JLS 18.5.2.2).
fn compute_b4(
    s: &mut InferenceSession<'_>,
    current: &mut BoundSet,
    mut c: Vec<Constraint<'_>>,
) -> Result<(), Option<VarId>> {
    use crate::constraint::{input_variables, output_variables};

    while !c.is_empty() {
        if current.contains_false() {
            return Err(None);
        }
        for ci in c.iter_mut() {
            ci.apply_instantiations(s, current);
        }

        let deps = current.dependencies(s);
        let instantiated = current.instantiated_vars();
        let outputs: Vec<Vec<VarId>> = c.iter().map(|ci| output_variables(ci, s)).collect();

        // A constraint is ready when the dependency closure of its input
        // variables meets no other constraint's output variables.
        let mut chosen: Vec<usize> = Vec::new();
        for (i, ci) in c.iter().enumerate() {
            let mut closure: BTreeSet<VarId> = BTreeSet::new();
            for v in input_variables(ci, s) {
                closure.insert(v);
                if let Some(ds) = deps.get(&v) {
                    closure.extend(ds.iter().copied());
                }
            }
            closure.retain(|v| !instantiated.contains(v));
            let conflicts = outputs
                .iter()
                .enumerate()
                .any(|(j, outs)| j != i && outs.iter().any(|o| closure.contains(o)));
            if !conflicts {
                chosen.push(i);
            }
        }
        if chosen.is_empty() {
            // Cyclic input/output dependencies; force progress on the first
            // constraint.
            chosen.push(0);
        }

        // Resolve the input variables of the chosen subset, then substitute
        // their instantiations before reducing.
        let mut alphas: Vec<VarId> = Vec::new();
        for &i in &chosen {
            for v in input_variables(&c[i], s) {
                if !alphas.contains(&v) && current.instantiation(v).is_none() {
                    alphas.push(v);
                }
            }
        }
        if !alphas.is_empty() {
            match resolve(&alphas, current, s) {
                Ok(()) if !current.contains_false() => {}
                Ok(()) => return Err(None),
                Err(v) => return Err(Some(v)),
            }
            for ci in c.iter_mut() {
                ci.apply_instantiations(s, current);
            }
        }

        let mut subset: Vec<Constraint<'_>> = Vec::with_capacity(chosen.len());
        for &i in chosen.iter().rev() {
            subset.push(c.remove(i));
        }
        subset.reverse();

        let new_bounds = reduce_constraints(subset, s);
        current.incorporate(s, new_bounds);
    }
    Ok(())
}

/// JLS 15.12.2.2: whether an argument expression must be deferred past the
/// applicability phase. An expression is also deferred whenever the formal
/// parameter type is itself one of the call's inference variables.
fn not_pertinent_to_applicability(expr: &ArgExpr, formal_is_variable: bool) -> bool {
    match expr {
        ArgExpr::Lambda(lambda) => {
            if lambda.explicit_params.is_none() || formal_is_variable {
                return true;
            }
            lambda
                .returns
                .iter()
                .any(|ret| not_pertinent_to_applicability(ret, formal_is_variable))
        }
        ArgExpr::MethodRef(m) => formal_is_variable || m.exact.is_none(),
        ArgExpr::Parenthesized(inner) => not_pertinent_to_applicability(inner, formal_is_variable),
        ArgExpr::Conditional { then, els } => {
            not_pertinent_to_applicability(then, formal_is_variable)
                || not_pertinent_to_applicability(els, formal_is_variable)
        }
        _ => false,
    }
}
