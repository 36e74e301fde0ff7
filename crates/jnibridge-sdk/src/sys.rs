//! Raw JNI ABI types
//!
//! Primitive aliases follow `jni.h`. Reference and ID types are opaque
//! integer-sized tokens; a zero token is the JNI `NULL`.

#![allow(non_camel_case_types)]

use std::fmt;

// ============================================================================
// Primitive Types
// ============================================================================

pub type jboolean = u8;
pub type jbyte = i8;
pub type jchar = u16;
pub type jshort = i16;
pub type jint = i32;
pub type jlong = i64;
pub type jfloat = f32;
pub type jdouble = f64;
pub type jsize = jint;

// ============================================================================
// Constants
// ============================================================================

pub const JNI_OK: jint = 0;
pub const JNI_ERR: jint = -1;
pub const JNI_ENOMEM: jint = -4;

pub const JNI_TRUE: jboolean = 1;
pub const JNI_FALSE: jboolean = 0;

/// Release mode: copy back and free the element buffer.
pub const JNI_RELEASE: jint = 0;
/// Release mode: copy back, keep the element buffer.
pub const JNI_COMMIT: jint = 1;
/// Release mode: free the element buffer without copying back.
pub const JNI_ABORT: jint = 2;

// ============================================================================
// Reference Types
// ============================================================================

/// Opaque reference to a VM object (`jobject`).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct JObject(usize);

/// Class references are object references.
pub type JClass = JObject;
/// Throwable references are object references.
pub type JThrowable = JObject;
/// Array references are object references.
pub type JArray = JObject;

impl JObject {
    /// The JNI `NULL` reference.
    pub const NULL: JObject = JObject(0);

    /// Wrap a raw reference value
    pub const fn from_raw(raw: usize) -> Self {
        JObject(raw)
    }

    /// Raw reference value
    pub const fn into_raw(self) -> usize {
        self.0
    }

    /// Check if this is the `NULL` reference
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for JObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "JObject(null)")
        } else {
            write!(f, "JObject({:#x})", self.0)
        }
    }
}

/// Opaque method ID (`jmethodID`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct JMethodId(usize);

/// Opaque field ID (`jfieldID`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct JFieldId(usize);

impl JMethodId {
    pub const NULL: JMethodId = JMethodId(0);

    pub const fn from_raw(raw: usize) -> Self {
        JMethodId(raw)
    }

    pub const fn into_raw(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl JFieldId {
    pub const NULL: JFieldId = JFieldId(0);

    pub const fn from_raw(raw: usize) -> Self {
        JFieldId(raw)
    }

    pub const fn into_raw(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Token identifying the `JavaVM` an environment belongs to.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct JavaVm(usize);

impl JavaVm {
    pub const fn from_raw(raw: usize) -> Self {
        JavaVm(raw)
    }

    pub const fn into_raw(self) -> usize {
        self.0
    }
}

// ============================================================================
// jvalue Union
// ============================================================================

/// One slot of a `jvalue` argument array.
///
/// Every slot is eight bytes wide regardless of which member is active.
#[repr(C)]
#[derive(Clone, Copy)]
pub union JValue {
    pub z: jboolean,
    pub b: jbyte,
    pub c: jchar,
    pub s: jshort,
    pub i: jint,
    pub j: jlong,
    pub f: jfloat,
    pub d: jdouble,
    pub l: JObject,
}

impl JValue {
    /// A slot with every byte zeroed
    pub const fn zeroed() -> Self {
        JValue { j: 0 }
    }
}

impl Default for JValue {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for JValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: every member is plain data and `j` spans the whole slot.
        write!(f, "JValue({:#018x})", unsafe { self.j })
    }
}

/// Convert a Rust `bool` to a `jboolean`
#[inline]
pub fn to_jboolean(b: bool) -> jboolean {
    if b {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

/// Convert a `jboolean` to a Rust `bool`
#[inline]
pub fn from_jboolean(b: jboolean) -> bool {
    b == JNI_TRUE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jvalue_is_one_word() {
        assert_eq!(std::mem::size_of::<JValue>(), 8);
    }

    #[test]
    fn test_null_object() {
        assert!(JObject::NULL.is_null());
        assert!(!JObject::from_raw(7).is_null());
        assert_eq!(JObject::default(), JObject::NULL);
    }

    #[test]
    fn test_jboolean_conversions() {
        assert_eq!(to_jboolean(true), JNI_TRUE);
        assert!(from_jboolean(JNI_TRUE));
        assert!(!from_jboolean(JNI_FALSE));
    }
}
