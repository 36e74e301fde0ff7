//! Host value conversions
//!
//! [`ToJava`] turns a host value into a VM object for the duration of a call;
//! [`FromJavaObject`] reads a host value back out of a VM object. Strings go
//! through UTF-8 byte arrays in both directions.

use crate::env::Env;
use crate::error::{BridgeError, BridgeResult};
use crate::object::ObjectRef;
use crate::refs::LocalRef;
use crate::types::{Type, TypeSpec, STRING_CLASS};
use crate::value::{Arg, Value};

/// A host value that can be passed as a VM object
pub trait ToJava {
    /// VM type the converted object is declared as
    fn java_spec(&self) -> TypeSpec;

    /// Create the VM object; the result is a local reference owned by the
    /// caller
    fn to_java(&self, env: &Env) -> BridgeResult<ObjectRef>;
}

/// A host value that can be read from a VM object
pub trait FromJavaObject: Sized {
    fn from_java_object(env: &Env, obj: &ObjectRef) -> BridgeResult<Self>;
}

// ============================================================================
// Strings
// ============================================================================

/// Create a `java/lang/String` from host text
pub fn new_java_string(env: &Env, text: &str) -> BridgeResult<ObjectRef> {
    let bytes = env.new_byte_array_from_slice(text.as_bytes())?;
    let _bytes = LocalRef::new(env, bytes.handle());
    let charset = env.utf8_string()?;
    env.construct(None, STRING_CLASS, &[Arg::Typed(&bytes), Arg::Object(&charset)])
}

/// Read the contents of a `java/lang/String`
pub fn java_string(env: &Env, obj: &ObjectRef) -> BridgeResult<String> {
    if obj.is_null() {
        return Err(BridgeError::ProtocolMisuse("null string".into()));
    }
    let charset = env.utf8_string()?;
    let bytes: Vec<u8> = obj
        .cast(STRING_CLASS)
        .invoke(
            env,
            None,
            "getBytes",
            Type::BYTE.array(),
            &[Arg::Object(&charset)],
        )?
        .get()?;
    String::from_utf8(bytes).map_err(|e| BridgeError::Marshal(format!("string is not UTF-8: {e}")))
}

/// Read a string result, consuming its local reference; null reads as empty
pub(crate) fn nullable_string(env: &Env, value: Value) -> BridgeResult<String> {
    let obj = value.into_object()?;
    if obj.is_null() {
        return Ok(String::new());
    }
    let _guard = LocalRef::new(env, obj.handle());
    java_string(env, &obj)
}

impl ToJava for String {
    fn java_spec(&self) -> TypeSpec {
        TypeSpec::object(STRING_CLASS)
    }

    fn to_java(&self, env: &Env) -> BridgeResult<ObjectRef> {
        new_java_string(env, self)
    }
}

impl ToJava for &str {
    fn java_spec(&self) -> TypeSpec {
        TypeSpec::object(STRING_CLASS)
    }

    fn to_java(&self, env: &Env) -> BridgeResult<ObjectRef> {
        new_java_string(env, self)
    }
}

impl FromJavaObject for String {
    fn from_java_object(env: &Env, obj: &ObjectRef) -> BridgeResult<Self> {
        java_string(env, obj)
    }
}

// ============================================================================
// Other Types
// ============================================================================

impl FromJavaObject for Vec<u8> {
    fn from_java_object(env: &Env, obj: &ObjectRef) -> BridgeResult<Self> {
        env.new_byte_array_from_object(obj)?.copy_bytes(env)
    }
}

impl FromJavaObject for ObjectRef {
    fn from_java_object(env: &Env, obj: &ObjectRef) -> BridgeResult<Self> {
        if obj.is_null() {
            return Ok(obj.clone());
        }
        // the caller's reference is released after conversion
        let local = env.native().new_local_ref(obj.handle());
        Ok(obj.with_handle(local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jnibridge_mock::MockVm;

    #[test]
    fn test_string_round_trip() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        let obj = new_java_string(&env, "grüße, 世界").unwrap();
        assert_eq!(vm.string_value(obj.handle()).as_deref(), Some("grüße, 世界"));
        assert_eq!(java_string(&env, &obj).unwrap(), "grüße, 世界");
        env.delete_local_ref(obj);
        assert_eq!(vm.live_local_refs(), 0);
    }

    #[test]
    fn test_null_string_reads_empty() {
        let env = Env::new(MockVm::new());
        let value = Value::Object(ObjectRef::null(STRING_CLASS));
        assert_eq!(nullable_string(&env, value).unwrap(), "");
        assert!(java_string(&env, &ObjectRef::null(STRING_CLASS)).is_err());
    }

    #[test]
    fn test_to_java_spec() {
        assert_eq!("x".java_spec(), TypeSpec::object(STRING_CLASS));
        assert_eq!(String::from("x").java_spec(), TypeSpec::object(STRING_CLASS));
    }
}
