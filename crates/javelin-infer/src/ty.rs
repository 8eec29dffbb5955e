//! Types as the inference rules see them: proper types, uses of inference
//! variables, and composite types that mention inference variables.

use javelin_types::{
    erasure, instantiate_as_supertype, sam_signature, substitute, ClassId, ClassType, Type,
    TypeVarId, WildcardBound,
};
use std::collections::HashMap;

use crate::bounds::BoundSet;
use crate::session::{InferenceSession, ThetaId, VarId};

/// A type-like structure that may mention inference variables.
///
/// Closed over exactly three shapes; every structural operation matches
/// exhaustively, so "operation undefined for a variable use" is a compile-time
/// property rather than a cast failure.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbstractType {
    /// A type containing no inference variables.
    Proper(Type),
    /// A use of a single inference variable.
    Use(VarId),
    /// A structural type mentioning at least one inference variable, together
    /// with the variable mapping its type variables resolve through.
    Inference { ty: Type, theta: ThetaId },
}

impl AbstractType {
    /// Classify `ty` against `theta`: a mapped type variable becomes a
    /// variable use, a type transitively mentioning one becomes a composite,
    /// anything else is proper.
    pub fn create(s: &InferenceSession<'_>, ty: &Type, theta: ThetaId) -> AbstractType {
        if let Type::TypeVar(tv) = ty {
            if let Some(var) = s.theta(theta).lookup(*tv) {
                return AbstractType::Use(var);
            }
        }
        if mentions_theta_var(s, ty, theta) {
            AbstractType::Inference {
                ty: ty.clone(),
                theta,
            }
        } else {
            AbstractType::Proper(ty.clone())
        }
    }

    pub fn is_proper(&self) -> bool {
        matches!(self, AbstractType::Proper(_))
    }

    pub fn is_use(&self) -> bool {
        matches!(self, AbstractType::Use(_))
    }

    pub fn is_inference(&self) -> bool {
        matches!(self, AbstractType::Inference { .. })
    }

    pub fn as_use(&self) -> Option<VarId> {
        match self {
            AbstractType::Use(v) => Some(*v),
            _ => None,
        }
    }

    /// The underlying structural type. A variable use reads as its declared
    /// type parameter.
    pub fn as_type(&self, s: &InferenceSession<'_>) -> Type {
        match self {
            AbstractType::Proper(ty) | AbstractType::Inference { ty, .. } => ty.clone(),
            AbstractType::Use(v) => Type::TypeVar(s.var(*v).type_var),
        }
    }

    /// Every inference variable mentioned by this type.
    pub fn inference_variables(&self, s: &InferenceSession<'_>) -> Vec<VarId> {
        match self {
            AbstractType::Proper(_) => Vec::new(),
            AbstractType::Use(v) => vec![*v],
            AbstractType::Inference { ty, theta } => {
                let mut out = Vec::new();
                for (tv, var) in s.theta(*theta).entries() {
                    if mentions_type_var(ty, *tv) && !out.contains(var) {
                        out.push(*var);
                    }
                }
                out
            }
        }
    }

    /// Rebuild this type with every instantiated variable replaced by its
    /// instantiation.
    pub fn apply_instantiations(&self, s: &InferenceSession<'_>, bs: &BoundSet) -> AbstractType {
        match self {
            AbstractType::Proper(_) => self.clone(),
            AbstractType::Use(v) => match bs.instantiation(*v) {
                Some(inst) => AbstractType::Proper(inst.clone()),
                None => self.clone(),
            },
            AbstractType::Inference { ty, theta } => {
                let mut subst: HashMap<TypeVarId, Type> = HashMap::new();
                for (tv, var) in s.theta(*theta).entries() {
                    if let Some(inst) = bs.instantiation(*var) {
                        subst.insert(*tv, inst.clone());
                    }
                }
                if subst.is_empty() {
                    return self.clone();
                }
                AbstractType::create(s, &substitute(ty, &subst), *theta)
            }
        }
    }

    /// Substitute arbitrary variables by types (used by capture-aware
    /// resolution, where the replacement is a fresh capture variable).
    pub fn substitute_vars(
        &self,
        s: &InferenceSession<'_>,
        replacement: &HashMap<VarId, Type>,
    ) -> AbstractType {
        match self {
            AbstractType::Proper(_) => self.clone(),
            AbstractType::Use(v) => match replacement.get(v) {
                Some(ty) => AbstractType::Proper(ty.clone()),
                None => self.clone(),
            },
            AbstractType::Inference { ty, theta } => {
                let mut subst: HashMap<TypeVarId, Type> = HashMap::new();
                for (tv, var) in s.theta(*theta).entries() {
                    if let Some(ty) = replacement.get(var) {
                        subst.insert(*tv, ty.clone());
                    }
                }
                if subst.is_empty() {
                    return self.clone();
                }
                AbstractType::create(s, &substitute(ty, &subst), *theta)
            }
        }
    }

    /// View this type at generic declaration `target`, or `None` when it has
    /// no such supertype. Undefined for a bare variable use.
    pub fn as_super(&self, s: &InferenceSession<'_>, target: ClassId) -> Option<AbstractType> {
        match self {
            AbstractType::Use(_) => None,
            AbstractType::Proper(ty) => {
                instantiate_as_supertype(s.env(), ty, target).map(AbstractType::Proper)
            }
            AbstractType::Inference { ty, theta } => {
                instantiate_as_supertype(s.env(), ty, target)
                    .map(|sup| AbstractType::create(s, &sup, *theta))
            }
        }
    }

    /// Erasure. Always proper: type variables erase to their declared bounds.
    pub fn erased(&self, s: &InferenceSession<'_>) -> AbstractType {
        match self {
            AbstractType::Use(_) => self.clone(),
            AbstractType::Proper(ty) | AbstractType::Inference { ty, .. } => {
                AbstractType::Proper(erasure(s.env(), ty))
            }
        }
    }

    /// Capture conversion of the underlying type. A variable use captures to
    /// itself.
    pub fn capture(&self, s: &mut InferenceSession<'_>) -> AbstractType {
        match self {
            AbstractType::Use(_) => self.clone(),
            AbstractType::Proper(ty) => {
                let captured = s.ctx.capture_conversion(ty);
                AbstractType::Proper(captured)
            }
            AbstractType::Inference { ty, theta } => {
                let theta = *theta;
                let captured = s.ctx.capture_conversion(ty);
                AbstractType::create(s, &captured, theta)
            }
        }
    }

    pub fn is_wildcard_parameterized(&self) -> bool {
        match self {
            AbstractType::Use(_) => false,
            AbstractType::Proper(ty) | AbstractType::Inference { ty, .. } => {
                ty.is_wildcard_parameterized()
            }
        }
    }

    /// Type arguments of a class use, classified against this type's theta.
    pub fn type_arguments(&self, s: &InferenceSession<'_>) -> Option<Vec<AbstractType>> {
        match self {
            AbstractType::Use(_) => None,
            AbstractType::Proper(ty) => match ty {
                Type::Class(ClassType { args, .. }) => {
                    Some(args.iter().map(|a| AbstractType::Proper(a.clone())).collect())
                }
                _ => None,
            },
            AbstractType::Inference { ty, theta } => match ty {
                Type::Class(ClassType { args, .. }) => Some(
                    args.iter()
                        .map(|a| AbstractType::create(s, a, *theta))
                        .collect(),
                ),
                _ => None,
            },
        }
    }

    /// Component of an array type.
    pub fn component(&self, s: &InferenceSession<'_>) -> Option<AbstractType> {
        match self {
            AbstractType::Use(_) => None,
            AbstractType::Proper(ty) => match ty {
                Type::Array(elem) => Some(AbstractType::Proper((**elem).clone())),
                _ => None,
            },
            AbstractType::Inference { ty, theta } => match ty {
                Type::Array(elem) => Some(AbstractType::create(s, elem, *theta)),
                _ => None,
            },
        }
    }

    /// The single-abstract-method descriptor of a functional-interface type,
    /// with descriptor types classified against this type's theta.
    pub fn functional_descriptor(&self, s: &InferenceSession<'_>) -> Option<Descriptor> {
        let (ty, theta) = match self {
            AbstractType::Use(_) => return None,
            AbstractType::Proper(ty) => (ty, None),
            AbstractType::Inference { ty, theta } => (ty, Some(*theta)),
        };
        let sig = sam_signature(s.env(), ty)?;
        let classify = |t: &Type| match theta {
            Some(theta) => AbstractType::create(s, t, theta),
            None => AbstractType::Proper(t.clone()),
        };
        Some(Descriptor {
            params: sig.params.iter().map(&classify).collect(),
            return_type: match &sig.return_type {
                Type::Void => None,
                other => Some(classify(other)),
            },
            throws: sig.throws.iter().map(&classify).collect(),
        })
    }
}

/// Functional-interface descriptor under a variable mapping.
#[derive(Clone, Debug)]
pub struct Descriptor {
    pub params: Vec<AbstractType>,
    /// `None` for a void-returning descriptor.
    pub return_type: Option<AbstractType>,
    pub throws: Vec<AbstractType>,
}

fn mentions_theta_var(s: &InferenceSession<'_>, ty: &Type, theta: ThetaId) -> bool {
    s.theta(theta)
        .entries()
        .iter()
        .any(|(tv, _)| mentions_type_var(ty, *tv))
}

pub(crate) fn mentions_type_var(ty: &Type, tv: TypeVarId) -> bool {
    match ty {
        Type::TypeVar(id) => *id == tv,
        Type::Class(ClassType { args, .. }) => args.iter().any(|a| mentions_type_var(a, tv)),
        Type::Array(elem) => mentions_type_var(elem, tv),
        Type::Wildcard(WildcardBound::Extends(b)) | Type::Wildcard(WildcardBound::Super(b)) => {
            mentions_type_var(b, tv)
        }
        Type::Intersection(parts) => parts.iter().any(|p| mentions_type_var(p, tv)),
        _ => false,
    }
}
