use javelin_infer::{
    ArgExpr, CallId, CallSite, InferenceError, InferenceSession, LambdaExpr, MethodRefExpr,
};
use javelin_types::{
    ClassDef, ClassId, ClassKind, MethodDef, Type, TypeEnv, TypeStore, TypeVarId, WildcardBound,
};

use pretty_assertions::assert_eq;

fn simple_method(
    name: &str,
    type_params: Vec<TypeVarId>,
    params: Vec<Type>,
    return_type: Type,
) -> MethodDef {
    MethodDef {
        name: name.to_string(),
        type_params,
        params,
        return_type,
        throws: vec![],
        is_static: true,
        is_varargs: false,
        is_abstract: false,
    }
}

fn add_animals(store: &mut TypeStore) -> (ClassId, ClassId) {
    let object = store.well_known().object;
    let animal = store.add_class(ClassDef {
        name: "com.example.Animal".to_string(),
        kind: ClassKind::Class,
        type_params: vec![],
        super_class: Some(Type::class(object, vec![])),
        interfaces: vec![],
        methods: vec![],
    });
    let dog = store.add_class(ClassDef {
        name: "com.example.Dog".to_string(),
        kind: ClassKind::Class,
        type_params: vec![],
        super_class: Some(Type::class(animal, vec![])),
        interfaces: vec![],
        methods: vec![],
    });
    (animal, dog)
}

#[test]
fn infer_simple_identity() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let (animal, _) = add_animals(&mut store);
    let animal_ty = Type::class(animal, vec![]);

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    let call = CallSite {
        id: CallId(1),
        method: simple_method("identity", vec![t], vec![Type::TypeVar(t)], Type::TypeVar(t)),
        args: vec![ArgExpr::Typed(animal_ty.clone())],
        target: None,
        poly: false,
    };

    let mut session = InferenceSession::new(&store);
    let result = session.infer(&call).expect("inference should succeed");
    assert_eq!(result.type_arguments, vec![(t, animal_ty)]);
    assert!(!result.unchecked_conversion);
}

#[test]
fn infer_from_target_context() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let list = store.class_id("java.util.List").unwrap();
    let (animal, dog) = add_animals(&mut store);

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    // <T> List<T> wrap(T t), invoked with a Dog argument assigned to a
    // List<Animal> target: the target drives T to Animal.
    let call = CallSite {
        id: CallId(2),
        method: simple_method(
            "wrap",
            vec![t],
            vec![Type::TypeVar(t)],
            Type::class(list, vec![Type::TypeVar(t)]),
        ),
        args: vec![ArgExpr::Typed(Type::class(dog, vec![]))],
        target: Some(Type::class(list, vec![Type::class(animal, vec![])])),
        poly: true,
    };

    let mut session = InferenceSession::new(&store);
    let result = session.infer(&call).expect("inference should succeed");
    assert_eq!(result.type_arguments, vec![(t, Type::class(animal, vec![]))]);
}

#[test]
fn implicit_lambda_without_target_leaves_variable_unresolved() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let consumer = store.class_id("java.util.function.Consumer").unwrap();

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    let call = CallSite {
        id: CallId(3),
        method: simple_method(
            "accept",
            vec![t],
            vec![Type::class(consumer, vec![Type::TypeVar(t)])],
            Type::Void,
        ),
        args: vec![ArgExpr::Lambda(LambdaExpr {
            explicit_params: None,
            returns: vec![],
            thrown: vec![],
        })],
        target: None,
        poly: false,
    };

    let mut session = InferenceSession::new(&store);
    let err = session.infer(&call).expect_err("T has nothing to constrain it");
    assert_eq!(
        err,
        InferenceError::UnresolvedVariable {
            call: CallId(3),
            type_param: "T".to_string(),
        }
    );
}

#[test]
fn method_reference_checked_exception_bounds_the_throws_variable() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk_object = store.well_known().object;
    let wk_throwable = store.well_known().throwable;
    let exception = store.well_known().exception;

    let custom_checked = store.add_class(ClassDef {
        name: "com.example.CustomChecked".to_string(),
        kind: ClassKind::Class,
        type_params: vec![],
        super_class: Some(Type::class(exception, vec![])),
        interfaces: vec![],
        methods: vec![],
    });

    // interface ThrowingRunnable<E extends Throwable> { void run() throws E; }
    let iface_e = store.add_type_param("E", vec![Type::class(wk_throwable, vec![])]);
    let throwing_runnable = store.add_class(ClassDef {
        name: "com.example.ThrowingRunnable".to_string(),
        kind: ClassKind::Interface,
        type_params: vec![iface_e],
        super_class: Some(Type::class(wk_object, vec![])),
        interfaces: vec![],
        methods: vec![MethodDef {
            name: "run".to_string(),
            type_params: vec![],
            params: vec![],
            return_type: Type::Void,
            throws: vec![Type::TypeVar(iface_e)],
            is_static: false,
            is_varargs: false,
            is_abstract: true,
        }],
    });

    // <T extends Throwable> void rethrow(ThrowingRunnable<T> r) throws T
    let t = store.add_type_param("T", vec![Type::class(wk_throwable, vec![])]);
    let mut method = simple_method(
        "rethrow",
        vec![t],
        vec![Type::class(throwing_runnable, vec![Type::TypeVar(t)])],
        Type::Void,
    );
    method.throws = vec![Type::TypeVar(t)];

    let call = CallSite {
        id: CallId(4),
        method,
        args: vec![ArgExpr::MethodRef(MethodRefExpr {
            exact: Some(MethodDef {
                name: "failing".to_string(),
                type_params: vec![],
                params: vec![],
                return_type: Type::Void,
                throws: vec![Type::class(custom_checked, vec![])],
                is_static: true,
                is_varargs: false,
                is_abstract: false,
            }),
            thrown: vec![Type::class(custom_checked, vec![])],
        })],
        target: None,
        poly: false,
    };

    let mut session = InferenceSession::new(&store);
    let result = session.infer(&call).expect("inference should succeed");
    assert_eq!(
        result.type_arguments,
        vec![(t, Type::class(custom_checked, vec![]))]
    );
}

#[test]
fn conflicting_argument_and_target_is_contradictory() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let integer = store.well_known().integer;
    let string = store.well_known().string;
    let list = store.class_id("java.util.List").unwrap();

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    let call = CallSite {
        id: CallId(5),
        method: simple_method(
            "wrap",
            vec![t],
            vec![Type::TypeVar(t)],
            Type::class(list, vec![Type::TypeVar(t)]),
        ),
        args: vec![ArgExpr::Typed(Type::class(string, vec![]))],
        target: Some(Type::class(list, vec![Type::class(integer, vec![])])),
        poly: true,
    };

    let mut session = InferenceSession::new(&store);
    let err = session.infer(&call).expect_err("String is not an Integer");
    assert_eq!(err, InferenceError::ContradictoryBounds { call: CallId(5) });
}

#[test]
fn nested_poly_invocation_propagates_the_target() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let list = store.class_id("java.util.List").unwrap();
    let (animal, dog) = add_animals(&mut store);

    let t_inner = store.add_type_param("T", vec![Type::class(object, vec![])]);
    let t_outer = store.add_type_param("T", vec![Type::class(object, vec![])]);

    // wrap(identity(dog)) assigned to List<Animal>.
    let inner = CallSite {
        id: CallId(61),
        method: simple_method(
            "identity",
            vec![t_inner],
            vec![Type::TypeVar(t_inner)],
            Type::TypeVar(t_inner),
        ),
        args: vec![ArgExpr::Typed(Type::class(dog, vec![]))],
        target: None,
        poly: true,
    };
    let outer = CallSite {
        id: CallId(60),
        method: simple_method(
            "wrap",
            vec![t_outer],
            vec![Type::TypeVar(t_outer)],
            Type::class(list, vec![Type::TypeVar(t_outer)]),
        ),
        args: vec![ArgExpr::Invocation(Box::new(inner))],
        target: Some(Type::class(list, vec![Type::class(animal, vec![])])),
        poly: true,
    };

    let mut session = InferenceSession::new(&store);
    let result = session.infer(&outer).expect("inference should succeed");
    assert_eq!(
        result.type_arguments,
        vec![(t_outer, Type::class(animal, vec![]))]
    );

    // The nested invocation's mapping was recorded as well.
    let inner_result = session
        .type_arguments_for(CallId(61))
        .expect("nested call should have an inferred mapping");
    assert_eq!(
        inner_result.type_arguments,
        vec![(t_inner, Type::class(dog, vec![]))]
    );
}

#[test]
fn recursion_guard_answers_reentrant_nested_inference() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let (_, dog) = add_animals(&mut store);

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    // An argument that (pathologically) names the outer call site itself;
    // the guard must answer it with no constraints rather than recursing.
    let self_call = CallSite {
        id: CallId(7),
        method: simple_method(
            "both",
            vec![t],
            vec![Type::TypeVar(t), Type::TypeVar(t)],
            Type::TypeVar(t),
        ),
        args: vec![ArgExpr::Typed(Type::class(dog, vec![]))],
        target: None,
        poly: true,
    };
    let call = CallSite {
        id: CallId(7),
        method: simple_method(
            "both",
            vec![t],
            vec![Type::TypeVar(t), Type::TypeVar(t)],
            Type::TypeVar(t),
        ),
        args: vec![
            ArgExpr::Typed(Type::class(dog, vec![])),
            ArgExpr::Invocation(Box::new(self_call)),
        ],
        target: None,
        poly: false,
    };

    let mut session = InferenceSession::new(&store);
    let result = session.infer(&call).expect("the typed argument still constrains T");
    assert_eq!(result.type_arguments, vec![(t, Type::class(dog, vec![]))]);
}

#[test]
fn primitive_target_resolves_the_return_variable_early() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let integer = store.well_known().integer;

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    // <T> T choose(T a, T b) assigned to an int target.
    let call = CallSite {
        id: CallId(8),
        method: simple_method(
            "choose",
            vec![t],
            vec![Type::TypeVar(t), Type::TypeVar(t)],
            Type::TypeVar(t),
        ),
        args: vec![
            ArgExpr::Typed(Type::class(integer, vec![])),
            ArgExpr::Typed(Type::class(integer, vec![])),
        ],
        target: Some(Type::Primitive(javelin_types::PrimitiveType::Int)),
        poly: true,
    };

    let mut session = InferenceSession::new(&store);
    let result = session.infer(&call).expect("unboxing satisfies the target");
    assert_eq!(result.type_arguments, vec![(t, Type::class(integer, vec![]))]);
}

#[test]
fn wildcard_parameterized_lower_bound_is_captured_for_the_target() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let number = store.well_known().number;
    let list = store.class_id("java.util.List").unwrap();

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    let list_ext_number = Type::class(
        list,
        vec![Type::Wildcard(WildcardBound::Extends(Box::new(Type::class(
            number,
            vec![],
        ))))],
    );

    // <T> T pick(T t) with a List<? extends Number> argument and an Object
    // target: the wildcard-parameterized lower bound forces early resolution.
    let call = CallSite {
        id: CallId(9),
        method: simple_method("pick", vec![t], vec![Type::TypeVar(t)], Type::TypeVar(t)),
        args: vec![ArgExpr::Typed(list_ext_number.clone())],
        target: Some(Type::class(object, vec![])),
        poly: true,
    };

    let mut session = InferenceSession::new(&store);
    let result = session.infer(&call).expect("inference should succeed");
    assert_eq!(result.type_arguments, vec![(t, list_ext_number)]);
}

#[test]
fn raw_argument_records_unchecked_conversion() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let string = store.well_known().string;
    let list = store.class_id("java.util.List").unwrap();

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    // <T> void fill(List<T> l, T t) called with a raw List.
    let call = CallSite {
        id: CallId(10),
        method: simple_method(
            "fill",
            vec![t],
            vec![
                Type::class(list, vec![Type::TypeVar(t)]),
                Type::TypeVar(t),
            ],
            Type::Void,
        ),
        args: vec![
            ArgExpr::Typed(Type::class(list, vec![])),
            ArgExpr::Typed(Type::class(string, vec![])),
        ],
        target: None,
        poly: false,
    };

    let mut session = InferenceSession::new(&store);
    let result = session.infer(&call).expect("inference should succeed");
    assert_eq!(result.type_arguments, vec![(t, Type::class(string, vec![]))]);
    assert!(result.unchecked_conversion);
}

#[test]
fn explicit_lambda_parameter_types_pin_the_variable() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let consumer = store.class_id("java.util.function.Consumer").unwrap();
    let (animal, dog) = add_animals(&mut store);

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    // <T> void consume(Consumer<T> c, T seed) with an explicitly typed
    // (Animal a) -> {} lambda and a Dog seed.
    let call = CallSite {
        id: CallId(11),
        method: simple_method(
            "consume",
            vec![t],
            vec![
                Type::class(consumer, vec![Type::TypeVar(t)]),
                Type::TypeVar(t),
            ],
            Type::Void,
        ),
        args: vec![
            ArgExpr::Lambda(LambdaExpr {
                explicit_params: Some(vec![Type::class(animal, vec![])]),
                returns: vec![],
                thrown: vec![],
            }),
            ArgExpr::Typed(Type::class(dog, vec![])),
        ],
        target: None,
        poly: false,
    };

    let mut session = InferenceSession::new(&store);
    let result = session.infer(&call).expect("inference should succeed");
    assert_eq!(result.type_arguments, vec![(t, Type::class(animal, vec![]))]);
}

#[test]
fn conditional_argument_constrains_through_both_branches() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let (animal, dog) = add_animals(&mut store);

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    let call = CallSite {
        id: CallId(12),
        method: simple_method("pick", vec![t], vec![Type::TypeVar(t)], Type::TypeVar(t)),
        args: vec![ArgExpr::Conditional {
            then: Box::new(ArgExpr::Typed(Type::class(dog, vec![]))),
            els: Box::new(ArgExpr::Parenthesized(Box::new(ArgExpr::Typed(
                Type::class(animal, vec![]),
            )))),
        }],
        target: None,
        poly: false,
    };

    let mut session = InferenceSession::new(&store);
    let result = session.infer(&call).expect("inference should succeed");
    assert_eq!(result.type_arguments, vec![(t, Type::class(animal, vec![]))]);
}

#[test]
fn inference_is_deterministic_and_theta_creation_idempotent() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let (animal, _) = add_animals(&mut store);

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    let call = CallSite {
        id: CallId(13),
        method: simple_method("identity", vec![t], vec![Type::TypeVar(t)], Type::TypeVar(t)),
        args: vec![ArgExpr::Typed(Type::class(animal, vec![]))],
        target: None,
        poly: false,
    };

    let mut first_session = InferenceSession::new(&store);
    let first = first_session.infer(&call).unwrap();

    let mut second_session = InferenceSession::new(&store);
    let second = second_session.infer(&call).unwrap();
    assert_eq!(first, second);

    // Re-running in the same session reuses the cached variable mapping and
    // reproduces the result.
    let again = first_session.infer(&call).unwrap();
    assert_eq!(first, again);
    assert_eq!(
        first_session.type_arguments_for(CallId(13)),
        Some(&again)
    );
}
