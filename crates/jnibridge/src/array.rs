//! Array conversion
//!
//! Host slices and VM primitive arrays convert through [`ArrayElement`], one
//! implementation per host element type. Reads copy out of either a critical
//! region (byte arrays) or an element buffer that is always released with
//! `JNI_ABORT`; writes allocate the array and fill it with one region write.

use std::borrow::Cow;
use std::ffi::c_void;

use jnibridge_sdk::{
    jboolean, jbyte, jchar, jdouble, jfloat, jint, jlong, jshort, jsize, JArray, JObject,
    NativeInterface, JNI_ABORT, JNI_RELEASE,
};
use tracing::trace;

use crate::buffer::with_region;
use crate::env::Env;
use crate::error::{BridgeError, BridgeResult};
use crate::object::{AsJObject, ObjectRef, TypeGetter};
use crate::refs::LocalRef;
use crate::types::{BaseKind, Type, OBJECT_CLASS};
use crate::value::Value;

// ============================================================================
// Element Table
// ============================================================================

/// A host type that maps onto a VM primitive array element
pub trait ArrayElement: Copy + Sized {
    /// Element type as the VM stores it
    type Raw: Copy;
    /// Base kind of the VM array
    const TYPE: Type;
    /// Read through a critical region instead of an element buffer
    const CRITICAL: bool = false;

    fn new_array(ni: &dyn NativeInterface, len: jsize) -> JArray;
    fn set_region(ni: &dyn NativeInterface, array: JArray, start: jsize, buf: &[Self::Raw]);
    fn get_elements(ni: &dyn NativeInterface, array: JArray) -> *mut Self::Raw;
    fn release_elements(ni: &dyn NativeInterface, array: JArray, elems: *mut Self::Raw, mode: jint);
    fn to_raw(data: &[Self]) -> Cow<'_, [Self::Raw]>;
    fn from_raw(raw: Self::Raw) -> Self;
}

macro_rules! array_element {
    (@to_raw $data:ident, same) => {
        Cow::Borrowed($data)
    };
    (@to_raw $data:ident, $map:tt) => {
        Cow::Owned($data.iter().map(|v| ($map)(*v)).collect())
    };
    (
        $ty:ty => $raw:ty, $kind:expr, critical = $critical:expr,
        $new:ident, $set:ident, $get:ident, $release:ident,
        to_raw = $to_raw:tt, from_raw = $from_raw:expr;
    ) => {
        impl ArrayElement for $ty {
            type Raw = $raw;
            const TYPE: Type = $kind;
            const CRITICAL: bool = $critical;

            fn new_array(ni: &dyn NativeInterface, len: jsize) -> JArray {
                ni.$new(len)
            }

            fn set_region(ni: &dyn NativeInterface, array: JArray, start: jsize, buf: &[$raw]) {
                ni.$set(array, start, buf)
            }

            fn get_elements(ni: &dyn NativeInterface, array: JArray) -> *mut $raw {
                ni.$get(array)
            }

            fn release_elements(ni: &dyn NativeInterface, array: JArray, elems: *mut $raw, mode: jint) {
                ni.$release(array, elems, mode)
            }

            fn to_raw(data: &[$ty]) -> Cow<'_, [$raw]> {
                array_element!(@to_raw data, $to_raw)
            }

            fn from_raw(raw: $raw) -> $ty {
                ($from_raw)(raw)
            }
        }
    };
}

array_element! {
    bool => jboolean, Type::BOOLEAN, critical = false,
    new_boolean_array, set_boolean_array_region,
    get_boolean_array_elements, release_boolean_array_elements,
    to_raw = (|v: bool| v as jboolean),
    from_raw = |raw: jboolean| raw != 0;
}

array_element! {
    u8 => jbyte, Type::BYTE, critical = true,
    new_byte_array, set_byte_array_region,
    get_byte_array_elements, release_byte_array_elements,
    to_raw = (|v: u8| v as jbyte),
    from_raw = |raw: jbyte| raw as u8;
}

array_element! {
    i8 => jbyte, Type::BYTE, critical = true,
    new_byte_array, set_byte_array_region,
    get_byte_array_elements, release_byte_array_elements,
    to_raw = same, from_raw = |raw: jbyte| raw;
}

array_element! {
    u16 => jchar, Type::CHAR, critical = false,
    new_char_array, set_char_array_region,
    get_char_array_elements, release_char_array_elements,
    to_raw = same, from_raw = |raw: jchar| raw;
}

array_element! {
    i16 => jshort, Type::SHORT, critical = false,
    new_short_array, set_short_array_region,
    get_short_array_elements, release_short_array_elements,
    to_raw = same, from_raw = |raw: jshort| raw;
}

array_element! {
    i32 => jint, Type::INT, critical = false,
    new_int_array, set_int_array_region,
    get_int_array_elements, release_int_array_elements,
    to_raw = same, from_raw = |raw: jint| raw;
}

// `int` on the VM side; wider host values are truncated
array_element! {
    isize => jint, Type::INT, critical = false,
    new_int_array, set_int_array_region,
    get_int_array_elements, release_int_array_elements,
    to_raw = (|v: isize| v as jint),
    from_raw = |raw: jint| raw as isize;
}

array_element! {
    i64 => jlong, Type::LONG, critical = false,
    new_long_array, set_long_array_region,
    get_long_array_elements, release_long_array_elements,
    to_raw = same, from_raw = |raw: jlong| raw;
}

array_element! {
    f32 => jfloat, Type::FLOAT, critical = false,
    new_float_array, set_float_array_region,
    get_float_array_elements, release_float_array_elements,
    to_raw = same, from_raw = |raw: jfloat| raw;
}

array_element! {
    f64 => jdouble, Type::DOUBLE, critical = false,
    new_double_array, set_double_array_region,
    get_double_array_elements, release_double_array_elements,
    to_raw = same, from_raw = |raw: jdouble| raw;
}

// ============================================================================
// Conversion
// ============================================================================

/// Copy a VM primitive array into a host vector
pub fn to_host_vec<T: ArrayElement>(env: &Env, array: JArray) -> BridgeResult<Vec<T>> {
    if array.is_null() {
        return Err(BridgeError::ProtocolMisuse(format!(
            "cannot read a null {} array",
            T::TYPE
        )));
    }
    let ni = env.native();
    let len = ni.get_array_length(array);
    if len <= 0 {
        return Ok(Vec::new());
    }
    let len = len as usize;

    if T::CRITICAL {
        let ptr = ni.get_primitive_array_critical(array) as *const T::Raw;
        if ptr.is_null() {
            return Err(env.pending_error(|| {
                BridgeError::ProtocolMisuse("critical array access failed".into())
            }));
        }
        // SAFETY: the VM pinned `len` elements at `ptr` until the release
        // below; nothing calls back into the VM in between.
        let out = unsafe { std::slice::from_raw_parts(ptr, len) }
            .iter()
            .map(|raw| T::from_raw(*raw))
            .collect();
        ni.release_primitive_array_critical(array, ptr as *mut c_void, JNI_ABORT);
        return Ok(out);
    }

    let elems = T::get_elements(ni, array);
    if elems.is_null() {
        return Err(env.pending_error(|| {
            BridgeError::ProtocolMisuse("array element access failed".into())
        }));
    }
    // SAFETY: `elems` holds `len` elements until released.
    let out = unsafe { std::slice::from_raw_parts(elems, len) }
        .iter()
        .map(|raw| T::from_raw(*raw))
        .collect();
    T::release_elements(ni, array, elems, JNI_ABORT);
    Ok(out)
}

/// Create a VM primitive array holding a copy of `data`.
///
/// The result is a new local reference owned by the caller.
pub fn to_java_array<T: ArrayElement>(env: &Env, data: &[T]) -> BridgeResult<JArray> {
    let len = jsize::try_from(data.len())
        .map_err(|_| BridgeError::Marshal(format!("{} elements do not fit an array", data.len())))?;
    let ni = env.native();
    let array = T::new_array(ni, len);
    if array.is_null() {
        return Err(env.pending_error(|| {
            BridgeError::ProtocolMisuse(format!("could not allocate {}[{len}]", T::TYPE))
        }));
    }
    let guard = LocalRef::new(env, array);
    if !data.is_empty() {
        let raw = T::to_raw(data);
        with_region(&*raw, |buf| T::set_region(ni, array, 0, buf));
    }
    env.check_exception()?;
    trace!(ty = %T::TYPE.array(), len, "created primitive array");
    Ok(guard.release())
}

/// Convert a primitive array result into its host vector form
pub(crate) fn primitive_array_value(env: &Env, ty: Type, array: JArray) -> BridgeResult<Value> {
    let value = match ty.base_kind() {
        BaseKind::Boolean => Value::Booleans(to_host_vec(env, array)?),
        BaseKind::Byte => Value::Bytes(to_host_vec(env, array)?),
        BaseKind::Char => Value::Chars(to_host_vec(env, array)?),
        BaseKind::Short => Value::Shorts(to_host_vec(env, array)?),
        BaseKind::Int => Value::Ints(to_host_vec(env, array)?),
        BaseKind::Long => Value::Longs(to_host_vec(env, array)?),
        BaseKind::Float => Value::Floats(to_host_vec(env, array)?),
        BaseKind::Double => Value::Doubles(to_host_vec(env, array)?),
        BaseKind::Void | BaseKind::Object => {
            return Err(BridgeError::Marshal(format!("{ty} is not a primitive array")))
        }
    };
    Ok(value)
}

// ============================================================================
// Object Arrays
// ============================================================================

impl Env {
    /// Read every element of an object array.
    ///
    /// The elements are new local references tagged with the array's element
    /// class.
    pub fn from_object_array(&self, array: &ObjectRef) -> BridgeResult<Vec<ObjectRef>> {
        if array.is_null() {
            return Err(BridgeError::ProtocolMisuse(
                "cannot read a null object array".into(),
            ));
        }
        let ni = self.native();
        let len = ni.get_array_length(array.handle());
        let mut out = Vec::with_capacity(len.max(0) as usize);
        for index in 0..len {
            let element = ni.get_object_array_element(array.handle(), index);
            if self.exception_check() {
                for obj in out {
                    self.delete_local_ref(obj);
                }
                return Err(self.handle_exception());
            }
            out.push(ObjectRef::new(element, array.class_name()));
        }
        Ok(out)
    }

    /// Build an array of `class` holding `items`, in order
    pub fn to_object_array(&self, items: &[ObjectRef], class: &str) -> BridgeResult<ObjectRef> {
        let len = jsize::try_from(items.len())
            .map_err(|_| BridgeError::Marshal(format!("{} elements do not fit an array", items.len())))?;
        let element_class = self.find_class(class)?;
        let ni = self.native();
        let array = ni.new_object_array(len, element_class, JObject::NULL);
        if array.is_null() {
            return Err(self.pending_error(|| {
                BridgeError::ProtocolMisuse(format!("could not allocate {class}[{len}]"))
            }));
        }
        let guard = LocalRef::new(self, array);
        for (index, item) in items.iter().enumerate() {
            ni.set_object_array_element(array, index as jsize, item.handle());
            self.check_exception()?;
        }
        Ok(ObjectRef::new_array(guard.release(), class))
    }
}

// ============================================================================
// ByteArray
// ============================================================================

/// A VM `byte[]` accessed through critical regions.
///
/// The handle is a local reference owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteArray {
    handle: JArray,
    len: usize,
}

impl Env {
    pub fn new_byte_array(&self, len: usize) -> BridgeResult<ByteArray> {
        let jlen = jsize::try_from(len)
            .map_err(|_| BridgeError::Marshal(format!("{len} bytes do not fit an array")))?;
        let handle = self.native().new_byte_array(jlen);
        if handle.is_null() {
            return Err(self.pending_error(|| {
                BridgeError::ProtocolMisuse(format!("could not allocate byte[{len}]"))
            }));
        }
        Ok(ByteArray { handle, len })
    }

    pub fn new_byte_array_from_slice(&self, data: &[u8]) -> BridgeResult<ByteArray> {
        let array = self.new_byte_array(data.len())?;
        array.with_critical(self, |bytes| bytes.copy_from_slice(data))?;
        Ok(array)
    }

    /// Wrap an existing `byte[]` reference
    pub fn new_byte_array_from_object(&self, obj: &ObjectRef) -> BridgeResult<ByteArray> {
        if obj.is_null() {
            return Err(BridgeError::ProtocolMisuse("null byte array".into()));
        }
        let len = self.native().get_array_length(obj.handle());
        Ok(ByteArray {
            handle: obj.handle(),
            len: len.max(0) as usize,
        })
    }
}

impl ByteArray {
    pub fn handle(&self) -> JArray {
        self.handle
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Run `f` over the pinned bytes; changes are written back.
    ///
    /// `f` must not call into the VM.
    pub fn with_critical<R>(&self, env: &Env, f: impl FnOnce(&mut [u8]) -> R) -> BridgeResult<R> {
        if self.len == 0 {
            return Ok(f(&mut []));
        }
        let ni = env.native();
        let ptr = ni.get_primitive_array_critical(self.handle);
        if ptr.is_null() {
            return Err(env.pending_error(|| {
                BridgeError::ProtocolMisuse("critical array access failed".into())
            }));
        }
        // SAFETY: the VM pinned `len` bytes at `ptr` until the release below.
        let bytes = unsafe { std::slice::from_raw_parts_mut(ptr as *mut u8, self.len) };
        let result = f(bytes);
        ni.release_primitive_array_critical(self.handle, ptr, JNI_RELEASE);
        Ok(result)
    }

    pub fn copy_bytes(&self, env: &Env) -> BridgeResult<Vec<u8>> {
        self.with_critical(env, |bytes| bytes.to_vec())
    }

    /// The array as an untyped object
    pub fn as_object(&self) -> ObjectRef {
        ObjectRef::new(self.handle, OBJECT_CLASS)
    }
}

impl AsJObject for ByteArray {
    fn as_jobject(&self) -> JObject {
        self.handle
    }
}

impl TypeGetter for ByteArray {
    fn java_type(&self) -> Type {
        Type::BYTE.array()
    }
}
