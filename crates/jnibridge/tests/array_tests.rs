//! Primitive and object array round-trips through `jnibridge/test/Echo`

use std::rc::Rc;

use jnibridge::sdk::JNI_ABORT;
use jnibridge::{
    java_string, new_java_string, Arg, Env, ObjectRef, Type, TypeSpec, Value, STRING_CLASS,
};
use jnibridge_mock::MockVm;

const ECHO: &str = "jnibridge/test/Echo";

fn setup() -> (Rc<MockVm>, Env) {
    let vm = MockVm::new();
    let env = Env::new(vm.clone());
    (vm, env)
}

fn echo(env: &Env, ty: Type, arg: Arg<'_>) -> Value {
    env.call_static_method(ECHO, "echo", ty.array(), &[arg]).unwrap()
}

// ============================================================================
// Primitive Arrays
// ============================================================================

#[test]
fn test_round_trip_lengths() {
    let (vm, env) = setup();
    let cases: [&[i32]; 3] = [&[], &[9], &[1, -2, 3, i32::MAX, i32::MIN]];
    for ints in cases {
        assert_eq!(echo(&env, Type::INT, Arg::Ints(ints)), Value::Ints(ints.to_vec()));
    }
    assert_eq!(vm.live_local_refs(), 0);
}

#[test]
fn test_round_trip_every_kind() {
    let (vm, env) = setup();

    let booleans = [true, false, true];
    assert_eq!(
        echo(&env, Type::BOOLEAN, Arg::Booleans(&booleans)),
        Value::Booleans(booleans.to_vec())
    );

    let bytes = [0u8, 127, 128, 255];
    assert_eq!(echo(&env, Type::BYTE, Arg::Bytes(&bytes)), Value::Bytes(bytes.to_vec()));

    let signed = [-1i8, 0, 1];
    assert_eq!(
        echo(&env, Type::BYTE, Arg::SignedBytes(&signed)),
        Value::Bytes(vec![255, 0, 1])
    );

    let chars: Vec<u16> = "héllo".encode_utf16().collect();
    assert_eq!(echo(&env, Type::CHAR, Arg::Chars(&chars)), Value::Chars(chars.clone()));

    let shorts = [i16::MIN, 0, i16::MAX];
    assert_eq!(echo(&env, Type::SHORT, Arg::Shorts(&shorts)), Value::Shorts(shorts.to_vec()));

    let longs = [i64::MIN, 1 << 40];
    assert_eq!(echo(&env, Type::LONG, Arg::Longs(&longs)), Value::Longs(longs.to_vec()));

    let floats = [0.5f32, -1.25];
    assert_eq!(echo(&env, Type::FLOAT, Arg::Floats(&floats)), Value::Floats(floats.to_vec()));

    let doubles = [std::f64::consts::PI];
    assert_eq!(
        echo(&env, Type::DOUBLE, Arg::Doubles(&doubles)),
        Value::Doubles(doubles.to_vec())
    );

    let native = [1isize, -1, 65536];
    assert_eq!(
        echo(&env, Type::INT, Arg::NativeInts(&native)),
        Value::Ints(vec![1, -1, 65536])
    );

    assert_eq!(vm.live_local_refs(), 0);
    assert_eq!(vm.critical_violations(), 0);
}

#[test]
fn test_results_are_copied_without_write_back() {
    let (vm, env) = setup();
    let ints = [4, 5];
    echo(&env, Type::INT, Arg::Ints(&ints));
    assert!(vm.release_modes().iter().all(|mode| *mode == JNI_ABORT));
}

#[test]
fn test_array_argument_with_scalar_result() {
    let (_vm, env) = setup();
    let ints = [10, 20, 30];
    let sum = env
        .call_static_method(ECHO, "sum", Type::LONG, &[Arg::Ints(&ints)])
        .unwrap();
    assert_eq!(sum.get::<i64>().unwrap(), 60);
}

#[test]
fn test_empty_byte_slice_still_creates_array() {
    let (vm, env) = setup();
    let empty: &[u8] = &[];
    assert_eq!(echo(&env, Type::BYTE, Arg::Bytes(empty)), Value::Bytes(Vec::new()));
    assert_eq!(vm.critical_acquisitions(), 0);
}

// ============================================================================
// ByteArray
// ============================================================================

#[test]
fn test_byte_array_as_typed_argument() {
    let (vm, env) = setup();
    let array = env.new_byte_array_from_slice(b"payload").unwrap();
    let back = env
        .call_static_method(ECHO, "echo", Type::BYTE.array(), &[Arg::Typed(&array)])
        .unwrap();
    assert_eq!(back, Value::Bytes(b"payload".to_vec()));
    assert_eq!(vm.critical_violations(), 0);
}

#[test]
fn test_byte_array_wraps_result_object() {
    let (_vm, env) = setup();
    let text = new_java_string(&env, "bytes").unwrap();
    let bytes: Vec<u8> = text
        .cast(STRING_CLASS)
        .call_method(&env, "getBytes", Type::BYTE.array(), &[])
        .unwrap()
        .get()
        .unwrap();
    assert_eq!(bytes, b"bytes");

    let array = env.new_byte_array(2).unwrap();
    let wrapped = env.new_byte_array_from_object(&array.as_object()).unwrap();
    wrapped.with_critical(&env, |b| b.copy_from_slice(&[1, 2])).unwrap();
    assert_eq!(array.copy_bytes(&env).unwrap(), vec![1, 2]);
}

// ============================================================================
// Object Arrays
// ============================================================================

#[test]
fn test_object_array_argument() {
    let (vm, env) = setup();
    let words: Vec<ObjectRef> = ["a", "b", "c"]
        .iter()
        .map(|w| new_java_string(&env, w).unwrap())
        .collect();
    let array = env.to_object_array(&words, STRING_CLASS).unwrap();
    assert!(array.is_array());

    let joined = env
        .call_static_method(
            ECHO,
            "join",
            STRING_CLASS,
            &[Arg::from(&array), Arg::Str("-")],
        )
        .unwrap()
        .into_object()
        .unwrap();
    assert_eq!(java_string(&env, &joined).unwrap(), "a-b-c");

    env.delete_local_ref(joined);
    env.delete_local_ref(array);
    for word in words {
        env.delete_local_ref(word);
    }
    assert_eq!(vm.live_local_refs(), 0);
}

#[test]
fn test_object_array_result() {
    let (vm, env) = setup();
    let array = env
        .call_static_method(
            ECHO,
            "words",
            TypeSpec::object_array(STRING_CLASS),
            &[Arg::Str("one two  three")],
        )
        .unwrap()
        .into_object()
        .unwrap();
    assert!(array.is_array());
    assert_eq!(array.class_name(), STRING_CLASS);

    let words = env.from_object_array(&array).unwrap();
    let texts: Vec<String> = words
        .iter()
        .map(|w| java_string(&env, w).unwrap())
        .collect();
    assert_eq!(texts, ["one", "two", "three"]);
    assert!(words.iter().all(|w| w.class_name() == STRING_CLASS && !w.is_array()));

    for word in words {
        env.delete_local_ref(word);
    }
    env.delete_local_ref(array);
    assert_eq!(vm.live_local_refs(), 0);
}

#[test]
fn test_object_array_echo_keeps_element_class() {
    let (_vm, env) = setup();
    let one = new_java_string(&env, "x").unwrap();
    let array = env.to_object_array(std::slice::from_ref(&one), STRING_CLASS).unwrap();
    let back = env
        .call_static_method(
            ECHO,
            "echo",
            TypeSpec::object_array(STRING_CLASS),
            &[Arg::from(&array)],
        )
        .unwrap()
        .into_object()
        .unwrap();
    assert!(back.is_array());
    assert_ne!(back.handle(), array.handle());
    assert_eq!(env.from_object_array(&back).unwrap().len(), 1);
}
