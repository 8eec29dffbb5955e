use javelin_types::{
    instantiate_as_supertype, is_assignable_loose, is_subtype, sam_signature, ClassType,
    PrimitiveType, TyContext, Type, TypeEnv, TypeStore, WildcardBound,
};

use pretty_assertions::assert_eq;

#[test]
fn inheritance_type_arg_substitution() {
    let env = TypeStore::with_minimal_jdk();

    let array_list = env.class_id("java.util.ArrayList").unwrap();
    let list = env.class_id("java.util.List").unwrap();
    let string = env.well_known().string;
    let object = env.well_known().object;

    let array_list_string = Type::class(array_list, vec![Type::class(string, vec![])]);
    let list_string = Type::class(list, vec![Type::class(string, vec![])]);
    let list_object = Type::class(list, vec![Type::class(object, vec![])]);

    assert!(is_subtype(&env, &array_list_string, &list_string));
    assert!(!is_subtype(&env, &array_list_string, &list_object));
}

#[test]
fn capture_conversion_allocates_capture_vars() {
    let mut env = TypeStore::with_minimal_jdk();
    let list = env.class_id("java.util.List").unwrap();
    let integer = env.well_known().integer;

    let list_extends_integer = Type::class(
        list,
        vec![Type::Wildcard(WildcardBound::Extends(Box::new(Type::class(
            integer,
            vec![],
        ))))],
    );

    let captured = env.capture_conversion(&list_extends_integer);
    let Type::Class(ClassType { args, .. }) = captured else {
        panic!("expected captured class type");
    };
    assert_eq!(args.len(), 1);
    let Type::TypeVar(tv) = &args[0] else {
        panic!("expected captured type var");
    };

    let tv_data = env.type_param(*tv).unwrap();
    assert!(tv_data.name.starts_with("CAP#"));
    assert_eq!(tv_data.upper_bounds, vec![Type::class(integer, vec![])]);
    assert_eq!(tv_data.lower_bound, None);
}

#[test]
fn context_local_capture_leaves_the_store_untouched() {
    let env = TypeStore::with_minimal_jdk();
    let list = env.class_id("java.util.List").unwrap();
    let string = env.well_known().string;

    let list_super_string = Type::class(
        list,
        vec![Type::Wildcard(WildcardBound::Super(Box::new(Type::class(
            string,
            vec![],
        ))))],
    );

    let mut ctx = TyContext::new(&env);
    let captured = ctx.capture_conversion(&list_super_string);
    let Type::Class(ClassType { args, .. }) = &captured else {
        panic!("expected captured class type");
    };
    let Type::TypeVar(tv) = &args[0] else {
        panic!("expected captured type var");
    };
    assert!(tv.is_context_local());

    let def = ctx.type_param(*tv).unwrap();
    assert_eq!(def.lower_bound, Some(Type::class(string, vec![])));

    // Re-capturing a captured type is a no-op.
    assert_eq!(ctx.capture_conversion(&captured), captured);
}

#[test]
fn raw_types_are_not_wildcard_parameterized() {
    let env = TypeStore::with_minimal_jdk();
    let list = env.class_id("java.util.List").unwrap();

    let raw_list = Type::class(list, vec![]);
    assert!(raw_list.is_raw(&env));
    assert!(!raw_list.is_wildcard_parameterized());
    assert!(raw_list.is_parameterized(&env));

    // Viewing a subtype at a raw declaration stays raw.
    let array_list = env.class_id("java.util.ArrayList").unwrap();
    let raw_array_list = Type::class(array_list, vec![]);
    assert_eq!(
        instantiate_as_supertype(&env, &raw_array_list, list),
        Some(raw_list)
    );
}

#[test]
fn loose_invocation_compatibility_accepts_unchecked_raw() {
    let env = TypeStore::with_minimal_jdk();
    let list = env.class_id("java.util.List").unwrap();
    let string = Type::class(env.well_known().string, vec![]);

    let raw_list = Type::class(list, vec![]);
    let list_string = Type::class(list, vec![string]);

    assert!(!is_subtype(&env, &raw_list, &list_string));
    assert!(is_assignable_loose(&env, &raw_list, &list_string));
}

#[test]
fn sam_signature_carries_the_throws_clause() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = env.well_known().object;
    let throwable = env.well_known().throwable;

    let e = env.add_type_param("E", vec![Type::class(throwable, vec![])]);
    let iface = env.add_class(javelin_types::ClassDef {
        name: "com.example.ThrowingRunnable".to_string(),
        kind: javelin_types::ClassKind::Interface,
        type_params: vec![e],
        super_class: Some(Type::class(object, vec![])),
        interfaces: vec![],
        methods: vec![javelin_types::MethodDef {
            name: "run".to_string(),
            type_params: vec![],
            params: vec![],
            return_type: Type::Void,
            throws: vec![Type::TypeVar(e)],
            is_static: false,
            is_varargs: false,
            is_abstract: true,
        }],
    });

    let exception = Type::class(env.well_known().exception, vec![]);
    let sig = sam_signature(&env, &Type::class(iface, vec![exception.clone()]))
        .expect("single abstract method");
    assert_eq!(sig.params, Vec::<Type>::new());
    assert_eq!(sig.return_type, Type::Void);
    assert_eq!(sig.throws, vec![exception]);
}

#[test]
fn boxed_primitives_widen_through_assignability() {
    let env = TypeStore::with_minimal_jdk();
    let number = Type::class(env.well_known().number, vec![]);
    let int = Type::Primitive(PrimitiveType::Int);

    // int -> Integer -> Number
    assert!(is_assignable_loose(&env, &int, &number));
}
