//! Call-site input structures supplied by the front end.
//!
//! The engine never parses source: an embedder hands it a typed call-site
//! tree, with standalone argument types already computed, vararg arity
//! already fixed, and overload resolution already performed.

use javelin_types::{MethodDef, Type};

/// Stable identity of a call site, supplied by the front end.
///
/// Variable mappings and inference results are keyed by this id, so two
/// different invocations of the same method must carry different ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(pub u32);

/// A generic method or constructor invocation needing type-argument inference.
#[derive(Clone, Debug)]
pub struct CallSite {
    pub id: CallId,
    /// The invoked signature, in terms of its own declared type parameters.
    /// For diamond construction the front end concatenates the class's type
    /// parameters with the constructor's.
    pub method: MethodDef,
    pub args: Vec<ArgExpr>,
    /// The target type the invocation is assigned/returned/passed into, if
    /// any.
    pub target: Option<Type>,
    /// Whether the invocation is context-sensitive (a poly expression).
    pub poly: bool,
}

/// An argument expression, in the shapes the inference rules distinguish.
#[derive(Clone, Debug)]
pub enum ArgExpr {
    /// A standalone expression whose type the front end has computed.
    Typed(Type),
    Parenthesized(Box<ArgExpr>),
    Conditional {
        then: Box<ArgExpr>,
        els: Box<ArgExpr>,
    },
    Lambda(LambdaExpr),
    MethodRef(MethodRefExpr),
    /// A nested generic invocation (itself a poly expression).
    Invocation(Box<CallSite>),
}

#[derive(Clone, Debug)]
pub struct LambdaExpr {
    /// Declared parameter types for an explicitly typed lambda; `None` for an
    /// implicitly typed one.
    pub explicit_params: Option<Vec<Type>>,
    /// The lambda body's result expressions (all `return`s, or the single
    /// expression body).
    pub returns: Vec<ArgExpr>,
    /// Checked exception types the body can throw.
    pub thrown: Vec<Type>,
}

#[derive(Clone, Debug)]
pub struct MethodRefExpr {
    /// The referenced signature when the reference is exact (unique, non
    /// generic, non-varargs target); `None` models an inexact reference.
    pub exact: Option<MethodDef>,
    /// Checked exception types the referenced declaration can throw.
    pub thrown: Vec<Type>,
}

impl ArgExpr {
    pub fn lambda(explicit_params: Option<Vec<Type>>, returns: Vec<ArgExpr>) -> ArgExpr {
        ArgExpr::Lambda(LambdaExpr {
            explicit_params,
            returns,
            thrown: Vec::new(),
        })
    }
}
