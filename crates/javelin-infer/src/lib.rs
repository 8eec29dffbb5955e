//! Constraint-based type-argument inference for generic method and
//! constructor invocations, following the shape of JLS chapter 18.
//!
//! The engine is a pure, in-process function over structures supplied by a
//! front end: a typed call-site tree ([`CallSite`]/[`ArgExpr`]), declared
//! signatures (`javelin_types::MethodDef`), and a type-hierarchy oracle
//! (`javelin_types::TypeEnv`). It produces, per call site, either an
//! instantiation for every inference variable or a typed failure — nothing is
//! persisted and no global state is touched.
//!
//! ```
//! use javelin_infer::{ArgExpr, CallId, CallSite, InferenceSession};
//! use javelin_types::{MethodDef, Type, TypeEnv, TypeStore};
//!
//! let mut store = TypeStore::with_minimal_jdk();
//! let object = store.well_known().object;
//! let string = Type::class(store.well_known().string, vec![]);
//! let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
//!
//! // <T> T identity(T t), invoked with a String argument.
//! let call = CallSite {
//!     id: CallId(1),
//!     method: MethodDef {
//!         name: "identity".to_string(),
//!         type_params: vec![t],
//!         params: vec![Type::TypeVar(t)],
//!         return_type: Type::TypeVar(t),
//!         throws: vec![],
//!         is_static: true,
//!         is_varargs: false,
//!         is_abstract: false,
//!     },
//!     args: vec![ArgExpr::Typed(string.clone())],
//!     target: None,
//!     poly: false,
//! };
//!
//! let mut session = InferenceSession::new(&store);
//! let result = session.infer(&call).unwrap();
//! assert_eq!(result.type_arguments, vec![(t, string)]);
//! ```

mod bounds;
mod constraint;
mod error;
mod expr;
mod infer;
mod resolve;
mod session;
mod ty;

pub use bounds::{BoundKind, BoundSet, VariableBounds};
pub use constraint::{Typing, TypingKind};
pub use error::InferenceError;
pub use expr::{ArgExpr, CallId, CallSite, LambdaExpr, MethodRefExpr};
pub use session::{InferenceResult, InferenceSession, Theta, ThetaId, VarId, VariableMeta};
pub use ty::{AbstractType, Descriptor};
