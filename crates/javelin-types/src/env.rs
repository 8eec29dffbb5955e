use std::fmt;

use crate::{ClassId, ClassType, Type, TypeEnv, TypeParamDef, TypeVarId, WildcardBound};

/// Per-invocation typing context layered over a borrowed environment.
///
/// Capture conversion and the inference engine allocate fresh type parameters
/// here instead of mutating shared state; the context-local bit in
/// [`TypeVarId`] keeps the two id spaces apart.
pub struct TyContext<'env> {
    base: &'env dyn TypeEnv,
    locals: Vec<TypeParamDef>,
}

impl fmt::Debug for TyContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TyContext")
            .field("locals", &self.locals)
            .finish_non_exhaustive()
    }
}

impl<'env> TyContext<'env> {
    pub fn new(base: &'env dyn TypeEnv) -> Self {
        Self {
            base,
            locals: Vec::new(),
        }
    }

    /// Clear all context-local allocations.
    ///
    /// Callers that want deterministic ids across repeated invocations should
    /// prefer creating a fresh context per invocation.
    pub fn reset(&mut self) {
        self.locals.clear();
    }

    /// Allocate a fresh context-local type parameter.
    pub fn fresh_type_param(
        &mut self,
        upper_bounds: Vec<Type>,
        lower_bound: Option<Type>,
    ) -> TypeVarId {
        let idx: u32 = self
            .locals
            .len()
            .try_into()
            .expect("too many context-local type params");
        let id = TypeVarId::new_context_local(idx);
        self.locals.push(TypeParamDef {
            name: format!("CAP#{}", idx),
            upper_bounds,
            lower_bound,
        });
        id
    }

    /// Replace the bounds of a previously allocated context-local parameter.
    ///
    /// Needed when capture bounds are computed in terms of each other and the
    /// ids must exist before the bounds do.
    pub fn set_type_param_bounds(
        &mut self,
        id: TypeVarId,
        upper_bounds: Vec<Type>,
        lower_bound: Option<Type>,
    ) {
        let idx = id
            .context_local_index()
            .expect("only context-local params can be rebound");
        let def = &mut self.locals[idx];
        def.upper_bounds = upper_bounds;
        def.lower_bound = lower_bound;
    }

    /// Capture conversion for parameterized types containing wildcards
    /// (JLS 5.1.10). Allocates fresh capture variables inside this context,
    /// not in the base environment. Wildcard-free and raw types are returned
    /// unchanged, so re-capturing a captured type is a no-op.
    pub fn capture_conversion(&mut self, ty: &Type) -> Type {
        let Type::Class(ClassType { def, args }) = ty else {
            return ty.clone();
        };

        if args.iter().all(|a| !matches!(a, Type::Wildcard(_))) {
            return ty.clone();
        }

        let Some(class_def) = self.class(*def) else {
            return ty.clone();
        };

        let object = Type::class(self.well_known().object, vec![]);
        let formal_bounds: Vec<Type> = class_def
            .type_params
            .iter()
            .map(|tp| {
                self.type_param(*tp)
                    .and_then(|d| d.upper_bounds.first().cloned())
                    .unwrap_or_else(|| object.clone())
            })
            .collect();

        let def = *def;
        let args = args.clone();
        let mut new_args = Vec::with_capacity(args.len());
        for (idx, arg) in args.iter().enumerate() {
            let formal = formal_bounds
                .get(idx)
                .cloned()
                .unwrap_or_else(|| object.clone());
            match arg {
                Type::Wildcard(WildcardBound::Unbounded) => {
                    let cap = self.fresh_type_param(vec![formal], None);
                    new_args.push(Type::TypeVar(cap));
                }
                Type::Wildcard(WildcardBound::Extends(upper)) => {
                    let glb = crate::glb(self, &[formal, (**upper).clone()]);
                    let cap = self.fresh_type_param(vec![glb], None);
                    new_args.push(Type::TypeVar(cap));
                }
                Type::Wildcard(WildcardBound::Super(lower)) => {
                    let cap = self.fresh_type_param(vec![formal], Some((**lower).clone()));
                    new_args.push(Type::TypeVar(cap));
                }
                other => new_args.push(other.clone()),
            }
        }

        Type::class(def, new_args)
    }
}

impl TypeEnv for TyContext<'_> {
    fn class(&self, id: ClassId) -> Option<&crate::ClassDef> {
        self.base.class(id)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        if let Some(idx) = id.context_local_index() {
            return self.locals.get(idx);
        }
        self.base.type_param(id)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.base.lookup_class(name)
    }

    fn well_known(&self) -> &crate::WellKnownTypes {
        self.base.well_known()
    }
}
