//! jnibridge SDK - raw JNI types and the native-interface capability
//!
//! This crate holds the minimal pieces shared by the bridge core and by any
//! `NativeInterface` implementation, so that a backend (a real `JNIEnv`
//! function table or an in-memory test VM) never depends on the core.
//!
//! # Example
//!
//! ```ignore
//! use jnibridge_sdk::{NativeInterface, JObject};
//!
//! fn class_of(ni: &dyn NativeInterface, name: &str) -> Option<JObject> {
//!     let class = ni.find_class(name);
//!     (!class.is_null()).then_some(class)
//! }
//! ```

pub mod native;
pub mod sys;

pub use native::{NativeInterface, NativeMethod};
pub use sys::{
    from_jboolean, jboolean, jbyte, jchar, jdouble, jfloat, jint, jlong, jshort, jsize,
    to_jboolean, JArray, JClass, JFieldId, JMethodId, JObject, JThrowable, JValue, JavaVm,
    JNI_ABORT, JNI_COMMIT, JNI_ENOMEM, JNI_ERR, JNI_FALSE, JNI_OK, JNI_RELEASE, JNI_TRUE,
};
