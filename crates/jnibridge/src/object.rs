//! Object handles
//!
//! An [`ObjectRef`] pairs a raw VM reference with the class name and
//! array-ness the bridge needs to rebuild signatures for it. Ownership of the
//! underlying reference stays with whoever received the `ObjectRef`; nothing
//! here deletes references on drop.

use jnibridge_sdk::JObject;

use crate::types::{Type, OBJECT_CLASS};

// ============================================================================
// Capabilities
// ============================================================================

/// Values backed by a VM reference
pub trait AsJObject {
    fn as_jobject(&self) -> JObject;
}

/// Values that know their declared class name and array-ness
pub trait ClassInfo {
    /// Slash-separated class name; the element class for arrays
    fn class_name(&self) -> &str;
    fn is_array(&self) -> bool;
}

/// Values that declare their own VM type
pub trait TypeGetter {
    fn java_type(&self) -> Type;
}

/// An object argument described by its class
pub trait JavaObject: AsJObject + ClassInfo {}

impl<T: AsJObject + ClassInfo> JavaObject for T {}

/// An object argument described by its VM type
pub trait TypedObject: AsJObject + TypeGetter {}

impl<T: AsJObject + TypeGetter> TypedObject for T {}

// ============================================================================
// ObjectRef
// ============================================================================

/// Reference to a VM object together with its declared class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    handle: JObject,
    class_name: String,
    is_array: bool,
}

impl ObjectRef {
    /// Wrap a reference to an object of `class_name`
    pub fn new(handle: JObject, class_name: impl Into<String>) -> Self {
        ObjectRef {
            handle,
            class_name: class_name.into(),
            is_array: false,
        }
    }

    /// Wrap a reference to an array whose elements are of `element_class`
    pub fn new_array(handle: JObject, element_class: impl Into<String>) -> Self {
        ObjectRef {
            handle,
            class_name: element_class.into(),
            is_array: true,
        }
    }

    /// A null reference that still carries a class, so it can be passed as
    /// an argument of that type
    pub fn null(class_name: impl Into<String>) -> Self {
        Self::new(JObject::NULL, class_name)
    }

    pub fn handle(&self) -> JObject {
        self.handle
    }

    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Declared as plain `java/lang/Object`, so calls refine it first
    pub fn is_generic(&self) -> bool {
        !self.is_array && self.class_name == OBJECT_CLASS
    }

    /// View the same reference as an instance of another class.
    ///
    /// No VM object is created and the original keeps its class name.
    pub fn cast(&self, class_name: impl Into<String>) -> CastedObjectRef<'_> {
        CastedObjectRef {
            inner: self,
            class_name: class_name.into(),
        }
    }

    pub fn into_handle(self) -> JObject {
        self.handle
    }

    pub(crate) fn set_class_name(&mut self, class_name: String) {
        self.class_name = class_name;
    }

    pub(crate) fn with_handle(&self, handle: JObject) -> ObjectRef {
        ObjectRef {
            handle,
            class_name: self.class_name.clone(),
            is_array: self.is_array,
        }
    }
}

impl AsJObject for ObjectRef {
    fn as_jobject(&self) -> JObject {
        self.handle
    }
}

impl ClassInfo for ObjectRef {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn is_array(&self) -> bool {
        self.is_array
    }
}

/// A borrowed view of an [`ObjectRef`] under a different class name
#[derive(Debug, Clone)]
pub struct CastedObjectRef<'a> {
    inner: &'a ObjectRef,
    class_name: String,
}

impl CastedObjectRef<'_> {
    pub fn handle(&self) -> JObject {
        self.inner.handle
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn is_array(&self) -> bool {
        self.inner.is_array
    }

    /// The view as an owned `ObjectRef` sharing the same reference
    pub fn to_object_ref(&self) -> ObjectRef {
        ObjectRef {
            handle: self.inner.handle,
            class_name: self.class_name.clone(),
            is_array: self.inner.is_array,
        }
    }
}

impl AsJObject for CastedObjectRef<'_> {
    fn as_jobject(&self) -> JObject {
        self.inner.handle
    }
}

impl ClassInfo for CastedObjectRef<'_> {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn is_array(&self) -> bool {
        self.inner.is_array
    }
}
