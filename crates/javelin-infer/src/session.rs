use std::collections::HashMap;

use javelin_types::{ClassDef, ClassId, TyContext, Type, TypeEnv, TypeParamDef, TypeVarId};

use crate::expr::{CallId, CallSite};

/// Handle of an inference variable in the session arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a per-call-site variable mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThetaId(pub(crate) u32);

/// Identity of one inference variable.
#[derive(Clone, Debug)]
pub struct VariableMeta {
    /// The declared type parameter this variable stands for.
    pub type_var: TypeVarId,
    /// The call site whose inference created the variable.
    pub call: CallId,
    /// Whether the variable was introduced by wildcard capture.
    pub is_capture: bool,
}

/// Ordered mapping from a signature's declared type parameters to the fresh
/// inference variables of one call site.
#[derive(Clone, Debug, Default)]
pub struct Theta {
    pub(crate) entries: Vec<(TypeVarId, VarId)>,
}

impl Theta {
    pub fn lookup(&self, tv: TypeVarId) -> Option<VarId> {
        self.entries
            .iter()
            .find(|(entry_tv, _)| *entry_tv == tv)
            .map(|(_, var)| *var)
    }

    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.entries.iter().map(|(_, var)| *var)
    }

    pub fn entries(&self) -> &[(TypeVarId, VarId)] {
        &self.entries
    }
}

/// One inference pass over a type-checking unit.
///
/// Owns the variable arena, the per-call-site theta cache, the in-flight call
/// stack that guards against re-entrant nested inference, and a [`TyContext`]
/// in which capture variables are allocated. Lifetime is one pass; results
/// are looked up by call-site id until the session is dropped.
pub struct InferenceSession<'env> {
    pub(crate) ctx: TyContext<'env>,
    vars: Vec<VariableMeta>,
    thetas: Vec<Theta>,
    theta_cache: HashMap<CallId, ThetaId>,
    pub(crate) in_flight: Vec<CallId>,
    pub(crate) results: HashMap<CallId, InferenceResult>,
}

/// Successful outcome of [`InferenceSession::infer`] for one call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferenceResult {
    pub call: CallId,
    /// Instantiation of each declared type parameter, in declaration order.
    pub type_arguments: Vec<(TypeVarId, Type)>,
    /// Whether applicability needed an unchecked conversion; callers must
    /// erase the invocation's return and thrown types when set.
    pub unchecked_conversion: bool,
}

impl<'env> InferenceSession<'env> {
    pub fn new(env: &'env dyn TypeEnv) -> Self {
        InferenceSession {
            ctx: TyContext::new(env),
            vars: Vec::new(),
            thetas: Vec::new(),
            theta_cache: HashMap::new(),
            in_flight: Vec::new(),
            results: HashMap::new(),
        }
    }

    /// The environment, including this session's capture allocations.
    pub fn env(&self) -> &dyn TypeEnv {
        &self.ctx
    }

    pub fn var(&self, id: VarId) -> &VariableMeta {
        &self.vars[id.index()]
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Human-readable name of the type parameter behind a variable.
    pub fn var_name(&self, id: VarId) -> String {
        let meta = self.var(id);
        self.ctx
            .type_param(meta.type_var)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("{:?}", meta.type_var))
    }

    pub(crate) fn fresh_variable(
        &mut self,
        type_var: TypeVarId,
        call: CallId,
        is_capture: bool,
    ) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(VariableMeta {
            type_var,
            call,
            is_capture,
        });
        id
    }

    pub fn theta(&self, id: ThetaId) -> &Theta {
        &self.thetas[id.0 as usize]
    }

    /// The variable mapping for a call site, created on first request and
    /// cached against the call-site id afterwards.
    pub fn theta_for(&mut self, call: &CallSite) -> ThetaId {
        if let Some(id) = self.theta_cache.get(&call.id) {
            return *id;
        }
        let mut theta = Theta::default();
        for tv in &call.method.type_params {
            let var = self.fresh_variable(*tv, call.id, false);
            theta.entries.push((*tv, var));
        }
        let id = ThetaId(self.thetas.len() as u32);
        self.thetas.push(theta);
        self.theta_cache.insert(call.id, id);
        tracing::trace!(call = ?call.id, theta = ?id, "created inference variable mapping");
        id
    }

    /// Extend an existing theta with a fresh capture variable.
    pub(crate) fn extend_theta_with_capture(
        &mut self,
        theta: ThetaId,
        call: CallId,
        upper_bounds: Vec<Type>,
        lower_bound: Option<Type>,
    ) -> (TypeVarId, VarId) {
        let tv = self.ctx.fresh_type_param(upper_bounds, lower_bound);
        let var = self.fresh_variable(tv, call, true);
        self.thetas[theta.0 as usize].entries.push((tv, var));
        (tv, var)
    }

    /// The inferred type arguments for a previously inferred call site.
    pub fn type_arguments_for(&self, call: CallId) -> Option<&InferenceResult> {
        self.results.get(&call)
    }

    /// Every cached variable mapping, keyed by call-site id.
    pub(crate) fn cached_thetas(&self) -> Vec<(CallId, ThetaId)> {
        let mut out: Vec<(CallId, ThetaId)> = self
            .theta_cache
            .iter()
            .map(|(call, theta)| (*call, *theta))
            .collect();
        out.sort_by_key(|(call, _)| *call);
        out
    }
}

// The session is itself an environment: capture variables allocated during
// resolution resolve through it.
impl TypeEnv for InferenceSession<'_> {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.ctx.class(id)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.ctx.type_param(id)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.ctx.lookup_class(name)
    }

    fn well_known(&self) -> &javelin_types::WellKnownTypes {
        self.ctx.well_known()
    }
}
