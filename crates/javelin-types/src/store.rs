use std::collections::HashMap;

use crate::{
    ClassDef, ClassId, ClassKind, MethodDef, PrimitiveType, Type, TypeEnv, TypeParamDef,
    TypeVarId, WellKnownTypes, WildcardBound,
};

/// Owning implementation of [`TypeEnv`] used by tests and embedders that do
/// not bring their own index.
pub struct TypeStore {
    classes: Vec<ClassDef>,
    class_names: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
}

impl TypeStore {
    /// Create a store seeded with the slice of the JDK the algorithms (and the
    /// test suites) rely on: the `java.lang` core, the throwable hierarchy,
    /// `List`/`ArrayList`, and the `java.util.function` shapes.
    pub fn with_minimal_jdk() -> TypeStore {
        let mut store = TypeStore {
            classes: Vec::new(),
            class_names: HashMap::new(),
            type_params: Vec::new(),
            // Rewritten below once the ids exist.
            well_known: WellKnownTypes {
                object: ClassId(0),
                string: ClassId(0),
                number: ClassId(0),
                boolean: ClassId(0),
                byte: ClassId(0),
                short: ClassId(0),
                character: ClassId(0),
                integer: ClassId(0),
                long: ClassId(0),
                float: ClassId(0),
                double: ClassId(0),
                throwable: ClassId(0),
                exception: ClassId(0),
                runtime_exception: ClassId(0),
                cloneable: ClassId(0),
                serializable: ClassId(0),
            },
        };

        let object = store.add_plain_class("java.lang.Object", ClassKind::Class, None);
        let object_ty = Type::class(object, vec![]);

        let number =
            store.add_plain_class("java.lang.Number", ClassKind::Class, Some(object_ty.clone()));
        let number_ty = Type::class(number, vec![]);

        let string =
            store.add_plain_class("java.lang.String", ClassKind::Class, Some(object_ty.clone()));
        let boolean =
            store.add_plain_class("java.lang.Boolean", ClassKind::Class, Some(object_ty.clone()));
        let character = store.add_plain_class(
            "java.lang.Character",
            ClassKind::Class,
            Some(object_ty.clone()),
        );
        let byte =
            store.add_plain_class("java.lang.Byte", ClassKind::Class, Some(number_ty.clone()));
        let short =
            store.add_plain_class("java.lang.Short", ClassKind::Class, Some(number_ty.clone()));
        let integer =
            store.add_plain_class("java.lang.Integer", ClassKind::Class, Some(number_ty.clone()));
        let long =
            store.add_plain_class("java.lang.Long", ClassKind::Class, Some(number_ty.clone()));
        let float =
            store.add_plain_class("java.lang.Float", ClassKind::Class, Some(number_ty.clone()));
        let double =
            store.add_plain_class("java.lang.Double", ClassKind::Class, Some(number_ty));

        let throwable = store.add_plain_class(
            "java.lang.Throwable",
            ClassKind::Class,
            Some(object_ty.clone()),
        );
        let exception = store.add_plain_class(
            "java.lang.Exception",
            ClassKind::Class,
            Some(Type::class(throwable, vec![])),
        );
        let runtime_exception = store.add_plain_class(
            "java.lang.RuntimeException",
            ClassKind::Class,
            Some(Type::class(exception, vec![])),
        );

        let cloneable =
            store.add_plain_class("java.lang.Cloneable", ClassKind::Interface, None);
        let serializable =
            store.add_plain_class("java.io.Serializable", ClassKind::Interface, None);

        store.well_known = WellKnownTypes {
            object,
            string,
            number,
            boolean,
            byte,
            short,
            character,
            integer,
            long,
            float,
            double,
            throwable,
            exception,
            runtime_exception,
            cloneable,
            serializable,
        };

        // java.lang.Runnable
        store.add_class(ClassDef {
            name: "java.lang.Runnable".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![],
            super_class: Some(Type::class(object, vec![])),
            interfaces: vec![],
            methods: vec![MethodDef {
                name: "run".to_string(),
                type_params: vec![],
                params: vec![],
                return_type: Type::Void,
                throws: vec![],
                is_static: false,
                is_varargs: false,
                is_abstract: true,
            }],
        });

        // java.util.List / java.util.ArrayList
        let list_e = store.add_type_param("E", vec![Type::class(object, vec![])]);
        let list = store.add_class(ClassDef {
            name: "java.util.List".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![list_e],
            super_class: Some(Type::class(object, vec![])),
            interfaces: vec![],
            methods: vec![
                MethodDef {
                    name: "get".to_string(),
                    type_params: vec![],
                    params: vec![Type::Primitive(PrimitiveType::Int)],
                    return_type: Type::TypeVar(list_e),
                    throws: vec![],
                    is_static: false,
                    is_varargs: false,
                    is_abstract: true,
                },
                MethodDef {
                    name: "add".to_string(),
                    type_params: vec![],
                    params: vec![Type::TypeVar(list_e)],
                    return_type: Type::Primitive(PrimitiveType::Boolean),
                    throws: vec![],
                    is_static: false,
                    is_varargs: false,
                    is_abstract: true,
                },
            ],
        });

        let array_list_e = store.add_type_param("E", vec![Type::class(object, vec![])]);
        store.add_class(ClassDef {
            name: "java.util.ArrayList".to_string(),
            kind: ClassKind::Class,
            type_params: vec![array_list_e],
            super_class: Some(Type::class(object, vec![])),
            interfaces: vec![Type::class(list, vec![Type::TypeVar(array_list_e)])],
            methods: vec![],
        });

        // java.util.function shapes.
        let fun_t = store.add_type_param("T", vec![Type::class(object, vec![])]);
        let fun_r = store.add_type_param("R", vec![Type::class(object, vec![])]);
        store.add_class(ClassDef {
            name: "java.util.function.Function".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![fun_t, fun_r],
            super_class: Some(Type::class(object, vec![])),
            interfaces: vec![],
            methods: vec![MethodDef {
                name: "apply".to_string(),
                type_params: vec![],
                params: vec![Type::TypeVar(fun_t)],
                return_type: Type::TypeVar(fun_r),
                throws: vec![],
                is_static: false,
                is_varargs: false,
                is_abstract: true,
            }],
        });

        let sup_t = store.add_type_param("T", vec![Type::class(object, vec![])]);
        store.add_class(ClassDef {
            name: "java.util.function.Supplier".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![sup_t],
            super_class: Some(Type::class(object, vec![])),
            interfaces: vec![],
            methods: vec![MethodDef {
                name: "get".to_string(),
                type_params: vec![],
                params: vec![],
                return_type: Type::TypeVar(sup_t),
                throws: vec![],
                is_static: false,
                is_varargs: false,
                is_abstract: true,
            }],
        });

        let con_t = store.add_type_param("T", vec![Type::class(object, vec![])]);
        store.add_class(ClassDef {
            name: "java.util.function.Consumer".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![con_t],
            super_class: Some(Type::class(object, vec![])),
            interfaces: vec![],
            methods: vec![MethodDef {
                name: "accept".to_string(),
                type_params: vec![],
                params: vec![Type::TypeVar(con_t)],
                return_type: Type::Void,
                throws: vec![],
                is_static: false,
                is_varargs: false,
                is_abstract: true,
            }],
        });

        store
    }

    fn add_plain_class(
        &mut self,
        name: &str,
        kind: ClassKind,
        super_class: Option<Type>,
    ) -> ClassId {
        self.add_class(ClassDef {
            name: name.to_string(),
            kind,
            type_params: vec![],
            super_class,
            interfaces: vec![],
            methods: vec![],
        })
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.class_names.insert(def.name.clone(), id);
        self.classes.push(def);
        id
    }

    pub fn add_type_param(&mut self, name: &str, upper_bounds: Vec<Type>) -> TypeVarId {
        self.add_type_param_full(TypeParamDef {
            name: name.to_string(),
            upper_bounds,
            lower_bound: None,
        })
    }

    pub fn add_type_param_full(&mut self, def: TypeParamDef) -> TypeVarId {
        let id = TypeVarId::new(self.type_params.len() as u32);
        self.type_params.push(def);
        id
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.index())
    }

    /// Capture conversion allocating capture variables in the global store.
    ///
    /// Embedders that must keep the store immutable use
    /// [`crate::TyContext::capture_conversion`] instead.
    pub fn capture_conversion(&mut self, ty: &Type) -> Type {
        let Type::Class(crate::ClassType { def, args }) = ty else {
            return ty.clone();
        };
        if args.iter().all(|a| !matches!(a, Type::Wildcard(_))) {
            return ty.clone();
        }
        let Some(class_def) = self.class(*def) else {
            return ty.clone();
        };

        let object = Type::class(self.well_known.object, vec![]);
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
                    let cap = self.add_capture_type_param(vec![formal], None);
                    new_args.push(Type::TypeVar(cap));
                }
                Type::Wildcard(WildcardBound::Extends(upper)) => {
                    let glb = crate::glb(self, &[formal, (**upper).clone()]);
                    let cap = self.add_capture_type_param(vec![glb], None);
                    new_args.push(Type::TypeVar(cap));
                }
                Type::Wildcard(WildcardBound::Super(lower)) => {
                    let cap = self.add_capture_type_param(vec![formal], Some((**lower).clone()));
                    new_args.push(Type::TypeVar(cap));
                }
                other => new_args.push(other.clone()),
            }
        }

        Type::class(def, new_args)
    }

    fn add_capture_type_param(
        &mut self,
        upper_bounds: Vec<Type>,
        lower_bound: Option<Type>,
    ) -> TypeVarId {
        let idx = self.type_params.len();
        self.add_type_param_full(TypeParamDef {
            name: format!("CAP#{}", idx),
            upper_bounds,
            lower_bound,
        })
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index())
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        if id.context_local_index().is_some() {
            return None;
        }
        self.type_params.get(id.0 as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_id(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}
