//! Java type model shared by the Javelin analysis crates.
//!
//! The crate is deliberately front-end agnostic: class and method metadata are
//! supplied by an embedder (or by the [`TypeStore`] test fixture) through the
//! [`TypeEnv`] oracle trait, and every structural algorithm is a free function
//! over `&dyn TypeEnv`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

mod env;
mod helpers;
mod store;
mod subtype;

pub use env::TyContext;
pub use helpers::{
    erasure, instantiate_as_supertype, lub, glb, make_intersection, parameterized_supers,
    sam_signature, substitute, type_sort_key, SamSignature,
};
pub use store::TypeStore;
pub use subtype::{boxed, contains, is_assignable_loose, is_subtype, unboxed, widens_to};

/// Handle of an interned class or interface declaration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// Handle of a declared type parameter.
///
/// The high bit marks context-local parameters allocated by a [`TyContext`]
/// (capture variables); those never live in the global store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(pub(crate) u32);

impl TypeVarId {
    const CONTEXT_LOCAL_BIT: u32 = 1 << 31;

    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub(crate) fn new_context_local(index: u32) -> Self {
        Self(Self::CONTEXT_LOCAL_BIT | index)
    }

    pub(crate) fn context_local_index(self) -> Option<usize> {
        if (self.0 & Self::CONTEXT_LOCAL_BIT) == 0 {
            return None;
        }
        Some((self.0 & !Self::CONTEXT_LOCAL_BIT) as usize)
    }

    /// Whether this parameter was allocated by a [`TyContext`] rather than the
    /// global store.
    pub fn is_context_local(self) -> bool {
        self.context_local_index().is_some()
    }
}

impl fmt::Debug for TypeVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context_local_index() {
            Some(idx) => write!(f, "TypeVarId(cap#{idx})"),
            None => write!(f, "TypeVarId({})", self.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

/// Bound of a wildcard type argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

/// A use of a class or interface, together with its type arguments.
///
/// `args.is_empty()` on a generic declaration denotes a *raw* use.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
}

/// Structural Java type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveType),
    Void,
    /// The type of the `null` literal.
    Null,
    Class(ClassType),
    /// An unresolved spelling; [`canonicalize_named`] turns it into `Class`
    /// when the environment knows the name.
    Named(String),
    Array(Box<Type>),
    TypeVar(TypeVarId),
    Wildcard(WildcardBound),
    Intersection(Vec<Type>),
    /// Placeholder for a type the front end could not recover.
    Unknown,
    Error,
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Type {
        Type::Class(ClassType { def, args })
    }

    pub fn is_errorish(&self) -> bool {
        matches!(self, Type::Unknown | Type::Error)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Whether this is a reference type (class, array, type variable,
    /// intersection, or the null type).
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Class(_)
                | Type::Named(_)
                | Type::Array(_)
                | Type::TypeVar(_)
                | Type::Intersection(_)
                | Type::Null
        )
    }

    /// A raw use of a generic declaration (`List` rather than `List<String>`).
    pub fn is_raw(&self, env: &dyn TypeEnv) -> bool {
        match self {
            Type::Class(ClassType { def, args }) => {
                args.is_empty()
                    && env
                        .class(*def)
                        .map(|c| !c.type_params.is_empty())
                        .unwrap_or(false)
            }
            _ => false,
        }
    }

    /// A parameterized use of a generic declaration with at least one wildcard
    /// type argument. Raw types report `false`: a raw use carries no arguments
    /// to capture.
    pub fn is_wildcard_parameterized(&self) -> bool {
        match self {
            Type::Class(ClassType { args, .. }) => {
                args.iter().any(|a| matches!(a, Type::Wildcard(_)))
            }
            _ => false,
        }
    }

    /// A (raw or parameterized) use of a generic declaration.
    pub fn is_parameterized(&self, env: &dyn TypeEnv) -> bool {
        match self {
            Type::Class(ClassType { def, args }) => {
                !args.is_empty()
                    || env
                        .class(*def)
                        .map(|c| !c.type_params.is_empty())
                        .unwrap_or(false)
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub methods: Vec<MethodDef>,
}

/// Declared method signature, expressed in terms of the declaring signature's
/// own type-parameter identities. Vararg expansion to a fixed arity is the
/// front end's job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub return_type: Type,
    /// Checked-exceptions clause.
    pub throws: Vec<Type>,
    pub is_static: bool,
    pub is_varargs: bool,
    pub is_abstract: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    pub upper_bounds: Vec<Type>,
    /// Only ever set for capture variables.
    pub lower_bound: Option<Type>,
}

/// Ids of the `java.lang`/`java.io` types the algorithms special-case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub number: ClassId,
    pub boolean: ClassId,
    pub byte: ClassId,
    pub short: ClassId,
    pub character: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub float: ClassId,
    pub double: ClassId,
    pub throwable: ClassId,
    pub exception: ClassId,
    pub runtime_exception: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
}

/// Read-only oracle over class and type-parameter metadata.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;
}

/// Resolve a top-level `Named` spelling against the environment.
pub fn canonicalize_named(env: &dyn TypeEnv, ty: &Type) -> Type {
    match ty {
        Type::Named(name) => match env.lookup_class(name) {
            Some(id) => Type::class(id, vec![]),
            None => ty.clone(),
        },
        _ => ty.clone(),
    }
}

/// Build the substitution map for a class instantiation.
///
/// Missing arguments (raw or malformed uses) map to `Unknown` so downstream
/// callers still get a stable shape.
pub fn class_substitution(
    class_def: &ClassDef,
    args: &[Type],
) -> HashMap<TypeVarId, Type> {
    let mut subst = HashMap::with_capacity(class_def.type_params.len());
    for (idx, formal) in class_def.type_params.iter().copied().enumerate() {
        subst.insert(formal, args.get(idx).cloned().unwrap_or(Type::Unknown));
    }
    subst
}

/// Render a type for diagnostics. Not a parseable Java spelling: unresolved
/// and placeholder types print with angle-bracket markers.
pub fn format_type(env: &dyn TypeEnv, ty: &Type) -> String {
    match ty {
        Type::Primitive(p) => p.name().to_string(),
        Type::Void => "void".to_string(),
        Type::Null => "<null>".to_string(),
        Type::Named(n) => n.clone(),
        Type::Unknown => "<unknown>".to_string(),
        Type::Error => "<error>".to_string(),
        Type::Array(elem) => format!("{}[]", format_type(env, elem)),
        Type::TypeVar(id) => env
            .type_param(*id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("{:?}", id)),
        Type::Wildcard(WildcardBound::Unbounded) => "?".to_string(),
        Type::Wildcard(WildcardBound::Extends(t)) => {
            format!("? extends {}", format_type(env, t))
        }
        Type::Wildcard(WildcardBound::Super(t)) => format!("? super {}", format_type(env, t)),
        Type::Intersection(parts) => {
            let rendered: Vec<String> = parts.iter().map(|p| format_type(env, p)).collect();
            rendered.join(" & ")
        }
        Type::Class(ClassType { def, args }) => {
            let name = env
                .class(*def)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("{:?}", def));
            if args.is_empty() {
                name
            } else {
                let rendered: Vec<String> = args.iter().map(|a| format_type(env, a)).collect();
                format!("{}<{}>", name, rendered.join(", "))
            }
        }
    }
}
