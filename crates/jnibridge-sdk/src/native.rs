//! NativeInterface trait: the JNI function table as a capability
//!
//! The bridge core programs against this trait only. A concrete
//! implementation forwards each method to the matching slot of a `JNIEnv`
//! function table; tests use an in-memory VM instead.
//!
//! Methods follow JNI conventions exactly: failures are signalled with a
//! sentinel (null reference, null ID, negative status) and, in almost every
//! case, a pending exception that the caller must inspect with
//! [`NativeInterface::exception_check`].

use std::ffi::c_void;

use crate::sys::{
    jboolean, jbyte, jchar, jdouble, jfloat, jint, jlong, jshort, jsize, JArray, JClass,
    JFieldId, JMethodId, JObject, JThrowable, JValue, JavaVm,
};

/// A native method binding for `RegisterNatives`.
#[derive(Debug, Clone)]
pub struct NativeMethod {
    /// Java method name
    pub name: String,
    /// JNI method signature, e.g. `(Ljava/lang/String;)V`
    pub signature: String,
    /// Host function pointer implementing the method
    pub fn_ptr: *mut c_void,
}

/// Abstract per-thread JNI environment.
///
/// One value corresponds to one attached native thread (`JNIEnv*`). It is
/// not required to be `Send` or `Sync`.
pub trait NativeInterface {
    // ========================================================================
    // VM
    // ========================================================================

    /// The VM this environment is attached to (`GetJavaVM`)
    fn java_vm(&self) -> JavaVm;

    // ========================================================================
    // Classes and Members
    // ========================================================================

    /// Find a class by slash-separated name with the default loader
    fn find_class(&self, name: &str) -> JClass;

    /// Runtime class of an object (local reference)
    fn get_object_class(&self, obj: JObject) -> JClass;

    /// `instanceof` test
    fn is_instance_of(&self, obj: JObject, class: JClass) -> jboolean;

    /// Whether two references denote the same object
    fn is_same_object(&self, a: JObject, b: JObject) -> jboolean;

    fn get_method_id(&self, class: JClass, name: &str, sig: &str) -> JMethodId;
    fn get_static_method_id(&self, class: JClass, name: &str, sig: &str) -> JMethodId;
    fn get_field_id(&self, class: JClass, name: &str, sig: &str) -> JFieldId;
    fn get_static_field_id(&self, class: JClass, name: &str, sig: &str) -> JFieldId;

    /// Bind host functions to native methods; negative on failure
    fn register_natives(&self, class: JClass, methods: &[NativeMethod]) -> jint;

    // ========================================================================
    // Exceptions
    // ========================================================================

    fn exception_check(&self) -> jboolean;

    /// Local reference to the pending exception, or null
    fn exception_occurred(&self) -> JThrowable;

    /// Print the pending exception and its backtrace to the VM's error stream
    fn exception_describe(&self);

    fn exception_clear(&self);

    // ========================================================================
    // References and Frames
    // ========================================================================

    fn new_global_ref(&self, obj: JObject) -> JObject;
    fn delete_global_ref(&self, obj: JObject);
    fn new_local_ref(&self, obj: JObject) -> JObject;
    fn delete_local_ref(&self, obj: JObject);
    fn ensure_local_capacity(&self, capacity: jint) -> jint;
    fn push_local_frame(&self, capacity: jint) -> jint;

    /// Pop the current frame, returning `result` as a reference valid in the
    /// enclosing frame (null when `result` is null)
    fn pop_local_frame(&self, result: JObject) -> JObject;

    // ========================================================================
    // Objects and Strings
    // ========================================================================

    fn new_object_a(&self, class: JClass, ctor: JMethodId, args: &[JValue]) -> JObject;

    /// Construct a `java.lang.String` from (modified) UTF-8
    fn new_string_utf(&self, s: &str) -> JObject;

    // ========================================================================
    // Instance Method Calls
    // ========================================================================

    fn call_void_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]);
    fn call_boolean_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]) -> jboolean;
    fn call_byte_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]) -> jbyte;
    fn call_char_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]) -> jchar;
    fn call_short_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]) -> jshort;
    fn call_int_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]) -> jint;
    fn call_long_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]) -> jlong;
    fn call_float_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]) -> jfloat;
    fn call_double_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]) -> jdouble;
    fn call_object_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]) -> JObject;

    // ========================================================================
    // Non-virtual Method Calls
    // ========================================================================

    fn call_nonvirtual_void_method_a(
        &self,
        obj: JObject,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    );
    fn call_nonvirtual_boolean_method_a(
        &self,
        obj: JObject,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jboolean;
    fn call_nonvirtual_byte_method_a(
        &self,
        obj: JObject,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jbyte;
    fn call_nonvirtual_char_method_a(
        &self,
        obj: JObject,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jchar;
    fn call_nonvirtual_short_method_a(
        &self,
        obj: JObject,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jshort;
    fn call_nonvirtual_int_method_a(
        &self,
        obj: JObject,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jint;
    fn call_nonvirtual_long_method_a(
        &self,
        obj: JObject,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jlong;
    fn call_nonvirtual_float_method_a(
        &self,
        obj: JObject,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jfloat;
    fn call_nonvirtual_double_method_a(
        &self,
        obj: JObject,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jdouble;
    fn call_nonvirtual_object_method_a(
        &self,
        obj: JObject,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> JObject;

    // ========================================================================
    // Static Method Calls
    // ========================================================================

    fn call_static_void_method_a(&self, class: JClass, method: JMethodId, args: &[JValue]);
    fn call_static_boolean_method_a(
        &self,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jboolean;
    fn call_static_byte_method_a(&self, class: JClass, method: JMethodId, args: &[JValue])
        -> jbyte;
    fn call_static_char_method_a(&self, class: JClass, method: JMethodId, args: &[JValue])
        -> jchar;
    fn call_static_short_method_a(
        &self,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jshort;
    fn call_static_int_method_a(&self, class: JClass, method: JMethodId, args: &[JValue]) -> jint;
    fn call_static_long_method_a(&self, class: JClass, method: JMethodId, args: &[JValue])
        -> jlong;
    fn call_static_float_method_a(
        &self,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jfloat;
    fn call_static_double_method_a(
        &self,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> jdouble;
    fn call_static_object_method_a(
        &self,
        class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> JObject;

    // ========================================================================
    // Instance Fields
    // ========================================================================

    fn get_boolean_field(&self, obj: JObject, field: JFieldId) -> jboolean;
    fn get_byte_field(&self, obj: JObject, field: JFieldId) -> jbyte;
    fn get_char_field(&self, obj: JObject, field: JFieldId) -> jchar;
    fn get_short_field(&self, obj: JObject, field: JFieldId) -> jshort;
    fn get_int_field(&self, obj: JObject, field: JFieldId) -> jint;
    fn get_long_field(&self, obj: JObject, field: JFieldId) -> jlong;
    fn get_float_field(&self, obj: JObject, field: JFieldId) -> jfloat;
    fn get_double_field(&self, obj: JObject, field: JFieldId) -> jdouble;
    fn get_object_field(&self, obj: JObject, field: JFieldId) -> JObject;

    fn set_boolean_field(&self, obj: JObject, field: JFieldId, value: jboolean);
    fn set_byte_field(&self, obj: JObject, field: JFieldId, value: jbyte);
    fn set_char_field(&self, obj: JObject, field: JFieldId, value: jchar);
    fn set_short_field(&self, obj: JObject, field: JFieldId, value: jshort);
    fn set_int_field(&self, obj: JObject, field: JFieldId, value: jint);
    fn set_long_field(&self, obj: JObject, field: JFieldId, value: jlong);
    fn set_float_field(&self, obj: JObject, field: JFieldId, value: jfloat);
    fn set_double_field(&self, obj: JObject, field: JFieldId, value: jdouble);
    fn set_object_field(&self, obj: JObject, field: JFieldId, value: JObject);

    // ========================================================================
    // Static Fields
    // ========================================================================

    fn get_static_boolean_field(&self, class: JClass, field: JFieldId) -> jboolean;
    fn get_static_byte_field(&self, class: JClass, field: JFieldId) -> jbyte;
    fn get_static_char_field(&self, class: JClass, field: JFieldId) -> jchar;
    fn get_static_short_field(&self, class: JClass, field: JFieldId) -> jshort;
    fn get_static_int_field(&self, class: JClass, field: JFieldId) -> jint;
    fn get_static_long_field(&self, class: JClass, field: JFieldId) -> jlong;
    fn get_static_float_field(&self, class: JClass, field: JFieldId) -> jfloat;
    fn get_static_double_field(&self, class: JClass, field: JFieldId) -> jdouble;
    fn get_static_object_field(&self, class: JClass, field: JFieldId) -> JObject;

    fn set_static_boolean_field(&self, class: JClass, field: JFieldId, value: jboolean);
    fn set_static_byte_field(&self, class: JClass, field: JFieldId, value: jbyte);
    fn set_static_char_field(&self, class: JClass, field: JFieldId, value: jchar);
    fn set_static_short_field(&self, class: JClass, field: JFieldId, value: jshort);
    fn set_static_int_field(&self, class: JClass, field: JFieldId, value: jint);
    fn set_static_long_field(&self, class: JClass, field: JFieldId, value: jlong);
    fn set_static_float_field(&self, class: JClass, field: JFieldId, value: jfloat);
    fn set_static_double_field(&self, class: JClass, field: JFieldId, value: jdouble);
    fn set_static_object_field(&self, class: JClass, field: JFieldId, value: JObject);

    // ========================================================================
    // Arrays
    // ========================================================================

    fn get_array_length(&self, array: JArray) -> jsize;

    fn new_object_array(&self, len: jsize, element_class: JClass, initial: JObject) -> JArray;
    fn get_object_array_element(&self, array: JArray, index: jsize) -> JObject;
    fn set_object_array_element(&self, array: JArray, index: jsize, value: JObject);

    fn new_boolean_array(&self, len: jsize) -> JArray;
    fn new_byte_array(&self, len: jsize) -> JArray;
    fn new_char_array(&self, len: jsize) -> JArray;
    fn new_short_array(&self, len: jsize) -> JArray;
    fn new_int_array(&self, len: jsize) -> JArray;
    fn new_long_array(&self, len: jsize) -> JArray;
    fn new_float_array(&self, len: jsize) -> JArray;
    fn new_double_array(&self, len: jsize) -> JArray;

    fn set_boolean_array_region(&self, array: JArray, start: jsize, buf: &[jboolean]);
    fn set_byte_array_region(&self, array: JArray, start: jsize, buf: &[jbyte]);
    fn set_char_array_region(&self, array: JArray, start: jsize, buf: &[jchar]);
    fn set_short_array_region(&self, array: JArray, start: jsize, buf: &[jshort]);
    fn set_int_array_region(&self, array: JArray, start: jsize, buf: &[jint]);
    fn set_long_array_region(&self, array: JArray, start: jsize, buf: &[jlong]);
    fn set_float_array_region(&self, array: JArray, start: jsize, buf: &[jfloat]);
    fn set_double_array_region(&self, array: JArray, start: jsize, buf: &[jdouble]);

    /// Pointer to a copy (or pinned view) of the elements; null on failure.
    /// Must be paired with the matching `release_*_array_elements`.
    fn get_boolean_array_elements(&self, array: JArray) -> *mut jboolean;
    fn get_byte_array_elements(&self, array: JArray) -> *mut jbyte;
    fn get_char_array_elements(&self, array: JArray) -> *mut jchar;
    fn get_short_array_elements(&self, array: JArray) -> *mut jshort;
    fn get_int_array_elements(&self, array: JArray) -> *mut jint;
    fn get_long_array_elements(&self, array: JArray) -> *mut jlong;
    fn get_float_array_elements(&self, array: JArray) -> *mut jfloat;
    fn get_double_array_elements(&self, array: JArray) -> *mut jdouble;

    fn release_boolean_array_elements(&self, array: JArray, elems: *mut jboolean, mode: jint);
    fn release_byte_array_elements(&self, array: JArray, elems: *mut jbyte, mode: jint);
    fn release_char_array_elements(&self, array: JArray, elems: *mut jchar, mode: jint);
    fn release_short_array_elements(&self, array: JArray, elems: *mut jshort, mode: jint);
    fn release_int_array_elements(&self, array: JArray, elems: *mut jint, mode: jint);
    fn release_long_array_elements(&self, array: JArray, elems: *mut jlong, mode: jint);
    fn release_float_array_elements(&self, array: JArray, elems: *mut jfloat, mode: jint);
    fn release_double_array_elements(&self, array: JArray, elems: *mut jdouble, mode: jint);

    /// Pinned access to a primitive array's storage. No other JNI call may
    /// be made until the matching release.
    fn get_primitive_array_critical(&self, array: JArray) -> *mut c_void;
    fn release_primitive_array_critical(&self, array: JArray, carray: *mut c_void, mode: jint);
}
