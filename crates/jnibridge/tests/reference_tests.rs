//! Local frames, global promotion and temporary cleanup

use std::cell::Cell;
use std::rc::Rc;

use jnibridge::{
    java_string, new_java_string, Arg, BridgeError, Env, ExceptionStrategy, Type, STRING_CLASS,
};
use jnibridge_mock::MockVm;

fn setup() -> (Rc<MockVm>, Env) {
    let vm = MockVm::new();
    let env = Env::new(vm.clone());
    (vm, env)
}

// ============================================================================
// Frames
// ============================================================================

#[test]
fn test_promoted_result_survives_pop() {
    let (vm, env) = setup();
    let dropped = Cell::new(None);

    let kept = env
        .with_local_frame(None, |env| {
            let kept = new_java_string(env, "kept")?;
            let other = new_java_string(env, "dropped")?;
            dropped.set(Some(other.handle()));
            Ok(Some(kept))
        })
        .unwrap()
        .unwrap();

    assert_eq!(vm.frame_depth(), 0);
    assert!(vm.is_live(kept.handle()));
    assert_eq!(java_string(&env, &kept).unwrap(), "kept");
    assert!(!vm.is_live(dropped.get().unwrap()));
    assert_eq!(kept.class_name(), STRING_CLASS);
}

#[test]
fn test_frame_popped_when_body_fails() {
    let (vm, env) = setup();
    env.set_exception_strategy(ExceptionStrategy::ToString);
    let inner = Cell::new(None);

    let err = env
        .with_local_frame(Some(4), |env| {
            let text = new_java_string(env, "temp")?;
            inner.set(Some(text.handle()));
            env.find_class("java/foo/bar")?;
            Ok(Some(text))
        })
        .unwrap_err();

    assert!(matches!(err, BridgeError::JavaMessage(_)));
    assert_eq!(vm.frame_depth(), 0);
    assert!(!vm.is_live(inner.get().unwrap()));
}

#[test]
fn test_frame_guard_pops_on_drop() {
    let (vm, env) = setup();
    let handle = {
        let _frame = env.local_frame(None).unwrap();
        assert_eq!(vm.frame_depth(), 1);
        new_java_string(&env, "scoped").unwrap().handle()
    };
    assert_eq!(vm.frame_depth(), 0);
    assert!(!vm.is_live(handle));
}

#[test]
fn test_nested_frames() {
    let (vm, env) = setup();
    env.push_local_frame(8).unwrap();
    env.push_local_frame(8).unwrap();
    let inner = new_java_string(&env, "inner").unwrap();
    let promoted = env.pop_local_frame(Some(&inner)).unwrap().unwrap();
    assert_eq!(vm.frame_depth(), 1);
    assert!(!vm.is_live(inner.handle()));
    assert!(vm.is_live(promoted.handle()));

    assert!(env.pop_local_frame(None).unwrap().is_none());
    assert_eq!(vm.frame_depth(), 0);
    assert!(!vm.is_live(promoted.handle()));
}

#[test]
fn test_unbalanced_pop_is_misuse() {
    let (vm, env) = setup();
    let err = env.pop_local_frame(None).unwrap_err();
    assert!(matches!(err, BridgeError::ProtocolMisuse(_)));
    assert_eq!(vm.frame_depth(), 0);
}

// ============================================================================
// Global References
// ============================================================================

#[test]
fn test_global_outlives_frame() {
    let (vm, env) = setup();
    // class and charset globals are created on first use
    let warm = new_java_string(&env, "warm").unwrap();
    env.delete_local_ref(warm);
    let globals = vm.live_global_refs();

    let global = env
        .with_local_frame(None, |env| {
            let text = new_java_string(env, "global")?;
            let global = env.new_global_ref(&text)?;
            assert_eq!(global.class_name(), STRING_CLASS);
            Ok(Some(global))
        })
        .unwrap()
        .unwrap();
    // the promoted local is a new reference to the same object
    assert_eq!(java_string(&env, &global).unwrap(), "global");
    assert_eq!(vm.live_global_refs(), globals + 1);
    assert_eq!(vm.live_local_refs(), 1);
}

#[test]
fn test_delete_global() {
    let (vm, env) = setup();
    let text = new_java_string(&env, "g").unwrap();
    let before = vm.live_global_refs();
    let global = env.new_global_ref(&text).unwrap();
    assert_eq!(vm.live_global_refs(), before + 1);
    env.delete_global_ref(global);
    assert_eq!(vm.live_global_refs(), before);
    assert!(vm.is_live(text.handle()));
}

#[test]
fn test_null_global_is_misuse() {
    let (_vm, env) = setup();
    let err = env
        .new_global_ref(&jnibridge::ObjectRef::null(STRING_CLASS))
        .unwrap_err();
    assert!(matches!(err, BridgeError::ProtocolMisuse(_)));
}

// ============================================================================
// Temporaries
// ============================================================================

#[test]
fn test_no_leaks_across_calls() {
    let (vm, env) = setup();
    let ints = [1, 2, 3];
    for _ in 0..10 {
        env.call_static_method(
            "jnibridge/test/Echo",
            "echo",
            STRING_CLASS,
            &[Arg::Str("repeat")],
        )
        .and_then(|value| {
            let obj = value.into_object()?;
            env.delete_local_ref(obj);
            Ok(())
        })
        .unwrap();
        env.call_static_method("jnibridge/test/Echo", "sum", Type::LONG, &[Arg::Ints(&ints)])
            .unwrap();
    }
    assert_eq!(vm.live_local_refs(), 0);
}

#[test]
fn test_temporaries_released_on_failure() {
    let (vm, env) = setup();
    env.set_exception_strategy(ExceptionStrategy::ToString);
    let ints = [1, 2, 3];
    let err = env
        .call_static_method(
            "jnibridge/test/Echo",
            "nope",
            Type::VOID,
            &[Arg::Str("temp"), Arg::Ints(&ints)],
        )
        .unwrap_err();
    assert_eq!(
        err,
        BridgeError::JavaMessage("java.lang.NoSuchMethodError: nope".into())
    );
    assert_eq!(vm.live_local_refs(), 0);
    assert!(!vm.has_pending_exception());
}

#[test]
fn test_env_drop_releases_cache() {
    let vm = MockVm::new();
    {
        let env = Env::new(vm.clone());
        env.find_class("java/lang/String").unwrap();
        env.find_class("java/awt/Point").unwrap();
        assert_eq!(env.cached_class_count(), 2);
        assert_eq!(vm.live_global_refs(), 2);
    }
    assert_eq!(vm.live_global_refs(), 0);
}
