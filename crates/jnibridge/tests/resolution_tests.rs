//! Class resolution, the alternate loader and signature overrides

use std::rc::Rc;

use jnibridge::{
    java_string, Arg, BridgeConfig, BridgeError, Env, ExceptionStrategy, ObjectRef, Type,
    TypeSpec, Value, OBJECT_CLASS, STRING_CLASS,
};
use jnibridge_mock::MockVm;

fn setup() -> (Rc<MockVm>, Env) {
    let vm = MockVm::new();
    let env = Env::new(vm.clone());
    (vm, env)
}

// ============================================================================
// Class Cache
// ============================================================================

#[test]
fn test_class_lookup_memoized_across_calls() {
    let (vm, env) = setup();
    for i in 0..5 {
        let value = env
            .call_static_method("jnibridge/test/Echo", "echo", Type::INT, &[Arg::Int(i)])
            .unwrap();
        assert_eq!(value, Value::Int(i));
    }
    assert_eq!(vm.find_class_calls("jnibridge/test/Echo"), 1);
    assert_eq!(env.cached_class_count(), 1);
}

#[test]
fn test_clear_class_cache_forces_lookup() {
    let (vm, env) = setup();
    env.find_class("java/awt/Point").unwrap();
    env.clear_class_cache();
    assert_eq!(env.cached_class_count(), 0);
    env.find_class("java/awt/Point").unwrap();
    assert_eq!(vm.find_class_calls("java/awt/Point"), 2);
}

#[test]
fn test_cache_disabled_by_config() {
    let vm = MockVm::new();
    let config = BridgeConfig::from_toml_str("class_cache = false").unwrap();
    let env = Env::with_config(vm.clone(), &config);
    env.find_class("java/awt/Point").unwrap();
    env.find_class("java/awt/Point").unwrap();
    assert_eq!(vm.find_class_calls("java/awt/Point"), 2);
    assert_eq!(env.cached_class_count(), 0);
    drop(env);
    assert_eq!(vm.live_global_refs(), 0);
}

#[test]
fn test_config_selects_strategy() {
    let vm = MockVm::new();
    let config = BridgeConfig::from_lookup(|key| {
        (key == "JNIBRIDGE_EXCEPTION_HANDLER").then(|| "tostring".to_string())
    })
    .unwrap();
    let env = Env::with_config(vm.clone(), &config);
    assert_eq!(
        env.find_class("java/foo/bar").unwrap_err(),
        BridgeError::JavaMessage("java.lang.NoClassDefFoundError: java/foo/bar".into())
    );
}

// ============================================================================
// Alternate Class Loader
// ============================================================================

fn with_loader(env: &Env) {
    let anchor = env.new_object("java/util/ArrayList", &[]).unwrap();
    env.set_class_loader_from(&anchor).unwrap();
    env.delete_local_ref(anchor);
}

#[test]
fn test_hidden_class_needs_loader() {
    let (vm, env) = setup();
    assert_eq!(
        env.find_class("jnibridge/test/Hidden"),
        Err(BridgeError::JavaException)
    );

    with_loader(&env);
    let mut hidden = env.new_object("jnibridge/test/Hidden", &[]).unwrap();
    let greeting: String = hidden
        .call_method_into(&env, "greet", STRING_CLASS, &[])
        .unwrap();
    assert_eq!(greeting, "hello from the app loader");

    // the fallback never leaves the first failure pending
    assert_eq!(vm.pending_violations(), 0);
    assert!(!vm.has_pending_exception());
}

#[test]
fn test_loader_failure_reports_loader_exception() {
    let (vm, env) = setup();
    env.set_exception_strategy(ExceptionStrategy::Structured);
    with_loader(&env);
    let err = env.find_class("java/foo/bar").unwrap_err();
    let t = err.as_throwable().unwrap();
    assert_eq!(t.class_name, "java.lang.ClassNotFoundException");
    assert_eq!(t.message, "java.foo.bar");
    assert_eq!(vm.pending_violations(), 0);
}

#[test]
fn test_loader_from_null_is_misuse() {
    let (_vm, env) = setup();
    let err = env
        .set_class_loader_from(&ObjectRef::null("java/util/ArrayList"))
        .unwrap_err();
    assert!(matches!(err, BridgeError::ProtocolMisuse(_)));
    assert!(!env.has_class_loader());
}

// ============================================================================
// Signature Override
// ============================================================================

#[test]
fn test_override_replaces_synthesized_signature() {
    let (_vm, env) = setup();
    // the value alone would resolve to `(I)J`
    env.precalculate_signature("(J)J");
    let value = env
        .call_static_method("jnibridge/test/Echo", "echo", Type::LONG, &[Arg::Long(9)])
        .unwrap();
    assert_eq!(value, Value::Long(9));
    assert!(env.take_signature().is_none());
}

#[test]
fn test_override_consumed_on_error() {
    let (vm, env) = setup();
    env.set_exception_strategy(ExceptionStrategy::ToString);
    env.precalculate_signature("(Ljava/lang/Object;)V");
    let err = env
        .call_static_method("jnibridge/test/Echo", "echo", Type::INT, &[Arg::Int(1)])
        .unwrap_err();
    assert_eq!(
        err,
        BridgeError::JavaMessage("java.lang.NoSuchMethodError: echo".into())
    );

    // the next call synthesizes `(I)I` again
    let value = env
        .call_static_method("jnibridge/test/Echo", "echo", Type::INT, &[Arg::Int(1)])
        .unwrap();
    assert_eq!(value, Value::Int(1));
    assert!(!vm.has_pending_exception());
}

#[test]
fn test_override_for_constructor_and_fields() {
    let (_vm, env) = setup();
    env.precalculate_signature("(II)V");
    let mut point = env
        .new_object("java/awt/Point", &[Arg::Int(2), Arg::Int(3)])
        .unwrap();

    env.precalculate_signature("I");
    assert_eq!(point.get_field(&env, "y", Type::INT).unwrap(), Value::Int(3));

    env.precalculate_signature("I");
    point.set_field(&env, "y", Arg::Int(30)).unwrap();
    assert_eq!(point.get_field(&env, "y", Type::INT).unwrap(), Value::Int(30));
}

#[test]
fn test_override_not_consumed_by_internal_calls() {
    let (_vm, env) = setup();
    let text = jnibridge::new_java_string(&env, "hi").unwrap();
    let mut hello = text.cast(OBJECT_CLASS).to_object_ref();
    env.precalculate_signature("()I");
    // refining the receiver makes its own calls without touching the override
    let len = hello.call_method(&env, "length", Type::INT, &[]).unwrap();
    assert_eq!(len, Value::Int(2));
    assert_eq!(hello.class_name(), STRING_CLASS);
    let text = java_string(&env, &hello).unwrap();
    assert_eq!(text, "hi");
    assert!(env.take_signature().is_none());
}

#[test]
fn test_register_native_uses_override() {
    let (vm, env) = setup();
    let void = TypeSpec::from(Type::VOID);
    env.precalculate_signature("(II)I");
    env.register_native(
        "jnibridge/test/Natives",
        "add",
        &void,
        &[],
        std::ptr::null_mut(),
    )
    .unwrap();
    assert!(vm.registered_native("jnibridge/test/Natives", "add", "(II)I").is_some());
}
