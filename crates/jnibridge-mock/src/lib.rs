//! In-memory VM implementing `NativeInterface`
//!
//! `MockVm` behaves like a JNI environment from the native side: local
//! references live in frames, global references outlive them, failed lookups
//! leave a pending exception, and array element access hands out pinned
//! buffers that must be released. It also records what the caller did so that
//! tests can assert on lookup counts, leaked references and protocol
//! violations.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use jnibridge_mock::MockVm;
//! use jnibridge_sdk::NativeInterface;
//!
//! let vm = MockVm::new();
//! let class = vm.find_class("java/lang/String");
//! assert!(!class.is_null());
//! assert_eq!(vm.find_class_calls("java/lang/String"), 1);
//! ```

mod classes;
mod heap;

use std::cell::{Cell, RefCell, RefMut};
use std::ffi::c_void;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use jnibridge_sdk::{
    jboolean, jbyte, jchar, jdouble, jfloat, jint, jlong, jshort, jsize, to_jboolean, JArray,
    JClass, JFieldId, JMethodId, JObject, JThrowable, JValue, JavaVm, NativeInterface,
    NativeMethod, JNI_ABORT, JNI_COMMIT, JNI_ERR, JNI_OK,
};

use heap::{array_descriptor, ArrayData, Data, Element, Slot, State};

static NEXT_VM_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug, Clone, Copy)]
enum Dispatch {
    Virtual,
    Nonvirtual,
    Static,
}

/// In-memory VM with a single attached thread.
pub struct MockVm {
    state: RefCell<State>,
    exhausted_globals: Cell<bool>,
}

impl MockVm {
    /// Create a VM with the built-in class library installed
    pub fn new() -> Rc<Self> {
        let id = NEXT_VM_ID.fetch_add(1, Ordering::Relaxed);
        Rc::new(MockVm {
            state: RefCell::new(State::new(id)),
            exhausted_globals: Cell::new(false),
        })
    }

    fn enter(&self) -> RefMut<'_, State> {
        let mut st = self.state.borrow_mut();
        if !st.critical.is_empty() {
            st.counters.critical_violations += 1;
        }
        st
    }

    /// Like `enter`, for operations that must not run with an exception pending
    fn enter_call(&self) -> RefMut<'_, State> {
        let mut st = self.enter();
        if st.pending.is_some() {
            st.counters.pending_violations += 1;
        }
        st
    }

    fn raise(st: &mut State, class: &str, message: String) {
        let exc = st.throw(class, Some(message), None);
        st.pending = Some(exc);
    }

    // ========================================================================
    // Observations
    // ========================================================================

    /// Number of `FindClass` calls made for `name`
    pub fn find_class_calls(&self, name: &str) -> usize {
        self.state
            .borrow()
            .counters
            .find_class
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub fn live_local_refs(&self) -> usize {
        self.state.borrow().live_locals()
    }

    pub fn live_global_refs(&self) -> usize {
        self.state.borrow().live_globals()
    }

    /// Number of pushed local frames above the base frame
    pub fn frame_depth(&self) -> usize {
        self.state.borrow().frame_depth()
    }

    /// Whether `r` is a live local or global reference
    pub fn is_live(&self, r: JObject) -> bool {
        self.state.borrow().deref(r).is_some()
    }

    pub fn has_pending_exception(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    /// Calls made while an exception was pending
    pub fn pending_violations(&self) -> usize {
        self.state.borrow().counters.pending_violations
    }

    /// Calls made while a critical region was held
    pub fn critical_violations(&self) -> usize {
        self.state.borrow().counters.critical_violations
    }

    pub fn critical_acquisitions(&self) -> usize {
        self.state.borrow().counters.critical_acquisitions
    }

    /// Modes passed to every `Release<Kind>ArrayElements` call, in order
    pub fn release_modes(&self) -> Vec<jint> {
        self.state.borrow().counters.release_modes.clone()
    }

    /// Text printed by every `ExceptionDescribe` call
    pub fn described(&self) -> Vec<String> {
        self.state.borrow().counters.described.clone()
    }

    /// Function pointer bound to a native method, if registered
    pub fn registered_native(&self, class: &str, name: &str, sig: &str) -> Option<usize> {
        let key = (class.to_string(), name.to_string(), sig.to_string());
        self.state.borrow().natives.get(&key).copied()
    }

    /// Contents of a `java/lang/String` reference
    pub fn string_value(&self, r: JObject) -> Option<String> {
        let st = self.state.borrow();
        st.deref(r).and_then(|obj| st.string(obj)).map(str::to_owned)
    }

    /// Make every later `NewGlobalRef` fail with `OutOfMemoryError` until
    /// called again with `false`
    pub fn exhaust_global_refs(&self, exhausted: bool) {
        self.exhausted_globals.set(exhausted);
    }

    /// Make an exception pending, as if a VM call had just thrown it
    pub fn throw_new(&self, class: &str, message: &str) {
        let mut st = self.state.borrow_mut();
        Self::raise(&mut st, class, message.to_string());
    }

    // ========================================================================
    // Shared paths
    // ========================================================================

    fn class_id(st: &State, class: JClass) -> Option<usize> {
        st.deref(class).and_then(|obj| st.mirrored_class(obj))
    }

    fn call(
        &self,
        dispatch: Dispatch,
        target: JObject,
        method: JMethodId,
        args: &[JValue],
    ) -> Slot {
        let mut st = self.enter_call();
        let this = match dispatch {
            Dispatch::Static => None,
            Dispatch::Virtual | Dispatch::Nonvirtual => st.deref(target),
        };
        let virtual_dispatch = matches!(dispatch, Dispatch::Virtual);
        match st.invoke(method.into_raw().wrapping_sub(1), this, args, virtual_dispatch) {
            Ok(slot) => slot,
            Err(exc) => {
                st.pending = Some(exc);
                Slot::Void
            }
        }
    }

    fn call_object(
        &self,
        dispatch: Dispatch,
        target: JObject,
        method: JMethodId,
        args: &[JValue],
    ) -> JObject {
        let slot = self.call(dispatch, target, method, args);
        self.state.borrow_mut().new_local(slot.object())
    }

    fn method_id(&self, class: JClass, name: &str, sig: &str, is_static: bool) -> JMethodId {
        let mut st = self.enter_call();
        let found = Self::class_id(&st, class)
            .and_then(|cid| st.find_method(cid, name, sig))
            .filter(|id| st.methods[*id].is_static == is_static);
        match found {
            Some(id) => JMethodId::from_raw(id + 1),
            None => {
                Self::raise(&mut st, "java/lang/NoSuchMethodError", name.to_string());
                JMethodId::NULL
            }
        }
    }

    fn field_id(&self, class: JClass, name: &str, sig: &str, is_static: bool) -> JFieldId {
        let mut st = self.enter_call();
        let found = Self::class_id(&st, class)
            .and_then(|cid| st.find_field(cid, name, sig))
            .filter(|id| st.fields[*id].is_static == is_static);
        match found {
            Some(id) => JFieldId::from_raw(id + 1),
            None => {
                Self::raise(&mut st, "java/lang/NoSuchFieldError", name.to_string());
                JFieldId::NULL
            }
        }
    }

    fn read_field(&self, obj: JObject, field: JFieldId) -> Slot {
        let mut st = self.enter_call();
        let id = field.into_raw().wrapping_sub(1);
        if id >= st.fields.len() {
            Self::raise(&mut st, "java/lang/NoSuchFieldError", "invalid field id".into());
            return Slot::Void;
        }
        match st.deref(obj) {
            Some(target) => st.get_field(target, id),
            None => {
                let exc = st.throw("java/lang/NullPointerException", None, None);
                st.pending = Some(exc);
                Slot::Void
            }
        }
    }

    fn write_field(&self, obj: JObject, field: JFieldId, value: Slot) {
        let mut st = self.enter_call();
        let id = field.into_raw().wrapping_sub(1);
        match st.deref(obj) {
            Some(target) if id < st.fields.len() => st.set_field(target, id, value),
            _ => {
                let exc = st.throw("java/lang/NullPointerException", None, None);
                st.pending = Some(exc);
            }
        }
    }

    fn read_static(&self, field: JFieldId) -> Slot {
        let st = self.enter_call();
        let id = field.into_raw().wrapping_sub(1);
        match st.fields.get(id) {
            Some(def) => st.statics.get(&id).copied().unwrap_or(Slot::zero(def.code)),
            None => Slot::Void,
        }
    }

    fn write_static(&self, field: JFieldId, value: Slot) {
        let mut st = self.enter_call();
        let id = field.into_raw().wrapping_sub(1);
        if id < st.fields.len() {
            st.statics.insert(id, value);
        }
    }

    fn object_slot(&self, value: JObject) -> Slot {
        Slot::L(self.state.borrow().deref(value))
    }

    fn new_primitive_array<T: Element>(&self, len: jsize) -> JArray {
        let mut st = self.enter_call();
        let Ok(len) = usize::try_from(len) else {
            Self::raise(&mut st, "java/lang/NegativeArraySizeException", len.to_string());
            return JObject::NULL;
        };
        let array = st.new_array(T::DESCRIPTOR, T::wrap(vec![T::default(); len]));
        st.new_local(Some(array))
    }

    fn set_region<T: Element>(&self, array: JArray, start: jsize, buf: &[T]) {
        let mut st = self.enter_call();
        let Some(obj) = st.deref(array) else {
            Self::raise(&mut st, "java/lang/NullPointerException", "array".into());
            return;
        };
        let stored = st.array_mut(obj).and_then(T::view_mut);
        let copied = match (stored, usize::try_from(start)) {
            (Some(values), Ok(start)) if start + buf.len() <= values.len() => {
                values[start..start + buf.len()].copy_from_slice(buf);
                true
            }
            _ => false,
        };
        if !copied {
            Self::raise(
                &mut st,
                "java/lang/ArrayIndexOutOfBoundsException",
                format!("region {start}+{}", buf.len()),
            );
        }
    }

    fn pin_elements<T: Element>(&self, array: JArray) -> *mut T {
        let mut st = self.enter_call();
        let Some(obj) = st.deref(array) else {
            return std::ptr::null_mut();
        };
        let Some(mut copy) = st.array(obj).filter(|data| T::view(data).is_some()).map(ArrayData::pinned) else {
            return std::ptr::null_mut();
        };
        let ptr = copy.as_mut_ptr();
        st.pinned.insert(ptr as usize, (obj, copy));
        ptr.cast()
    }

    fn release_elements<T: Element>(&self, array: JArray, elems: *mut T, mode: jint) {
        let mut st = self.state.borrow_mut();
        st.counters.release_modes.push(mode);
        let key = elems as usize;
        let Some((obj, buffer)) = st.pinned.remove(&key) else {
            return;
        };
        if st.deref(array) != Some(obj) {
            st.counters.pending_violations += 1;
        }
        if mode != JNI_ABORT {
            if let (Some(target), Some(source)) =
                (st.array_mut(obj).and_then(T::view_mut), T::view(&buffer))
            {
                target.copy_from_slice(source);
            }
        }
        if mode == JNI_COMMIT {
            st.pinned.insert(key, (obj, buffer));
        }
    }
}

macro_rules! call_methods {
    ($($virt:ident, $nonvirt:ident, $stat:ident => $ty:ty, $conv:expr;)*) => {$(
        fn $virt(&self, obj: JObject, method: JMethodId, args: &[JValue]) -> $ty {
            $conv(self.call(Dispatch::Virtual, obj, method, args))
        }

        fn $nonvirt(
            &self,
            obj: JObject,
            _class: JClass,
            method: JMethodId,
            args: &[JValue],
        ) -> $ty {
            $conv(self.call(Dispatch::Nonvirtual, obj, method, args))
        }

        fn $stat(&self, _class: JClass, method: JMethodId, args: &[JValue]) -> $ty {
            $conv(self.call(Dispatch::Static, JObject::NULL, method, args))
        }
    )*};
}

macro_rules! field_accessors {
    ($($get:ident, $set:ident, $get_static:ident, $set_static:ident => $ty:ty, $variant:ident, $conv:expr;)*) => {$(
        fn $get(&self, obj: JObject, field: JFieldId) -> $ty {
            $conv(self.read_field(obj, field))
        }

        fn $set(&self, obj: JObject, field: JFieldId, value: $ty) {
            self.write_field(obj, field, Slot::$variant(value))
        }

        fn $get_static(&self, _class: JClass, field: JFieldId) -> $ty {
            $conv(self.read_static(field))
        }

        fn $set_static(&self, _class: JClass, field: JFieldId, value: $ty) {
            self.write_static(field, Slot::$variant(value))
        }
    )*};
}

macro_rules! primitive_arrays {
    ($($new:ident, $set:ident, $get:ident, $release:ident => $ty:ty;)*) => {$(
        fn $new(&self, len: jsize) -> JArray {
            self.new_primitive_array::<$ty>(len)
        }

        fn $set(&self, array: JArray, start: jsize, buf: &[$ty]) {
            self.set_region::<$ty>(array, start, buf)
        }

        fn $get(&self, array: JArray) -> *mut $ty {
            self.pin_elements::<$ty>(array)
        }

        fn $release(&self, array: JArray, elems: *mut $ty, mode: jint) {
            self.release_elements::<$ty>(array, elems, mode)
        }
    )*};
}

impl NativeInterface for MockVm {
    fn java_vm(&self) -> JavaVm {
        JavaVm::from_raw(self.state.borrow().vm_id)
    }

    // ========================================================================
    // Classes and Members
    // ========================================================================

    fn find_class(&self, name: &str) -> JClass {
        let mut st = self.enter_call();
        *st.counters.find_class.entry(name.to_string()).or_insert(0) += 1;
        let visible = st.resolve_class(name).filter(|c| !st.classes[*c].hidden);
        match visible {
            Some(class) => {
                let mirror = st.mirror(class);
                st.new_local(Some(mirror))
            }
            None => {
                let cause = st.throw(
                    "java/lang/ClassNotFoundException",
                    Some(name.replace('/', ".")),
                    None,
                );
                let exc = st.throw(
                    "java/lang/NoClassDefFoundError",
                    Some(name.to_string()),
                    Some(cause),
                );
                st.pending = Some(exc);
                JObject::NULL
            }
        }
    }

    fn get_object_class(&self, obj: JObject) -> JClass {
        let mut st = self.enter_call();
        match st.deref(obj) {
            Some(target) => {
                let class = st.class_of(target);
                let mirror = st.mirror(class);
                st.new_local(Some(mirror))
            }
            None => JObject::NULL,
        }
    }

    fn is_instance_of(&self, obj: JObject, class: JClass) -> jboolean {
        let st = self.enter_call();
        let Some(target) = st.deref(obj) else {
            return to_jboolean(true);
        };
        let runtime = st.class_of(target);
        let result = Self::class_id(&st, class)
            .map(|cid| st.is_subclass(runtime, cid))
            .unwrap_or(false);
        to_jboolean(result)
    }

    fn is_same_object(&self, a: JObject, b: JObject) -> jboolean {
        let st = self.enter();
        to_jboolean(st.deref(a) == st.deref(b))
    }

    fn get_method_id(&self, class: JClass, name: &str, sig: &str) -> JMethodId {
        self.method_id(class, name, sig, false)
    }

    fn get_static_method_id(&self, class: JClass, name: &str, sig: &str) -> JMethodId {
        self.method_id(class, name, sig, true)
    }

    fn get_field_id(&self, class: JClass, name: &str, sig: &str) -> JFieldId {
        self.field_id(class, name, sig, false)
    }

    fn get_static_field_id(&self, class: JClass, name: &str, sig: &str) -> JFieldId {
        self.field_id(class, name, sig, true)
    }

    fn register_natives(&self, class: JClass, methods: &[NativeMethod]) -> jint {
        let mut st = self.enter_call();
        let Some(cid) = Self::class_id(&st, class) else {
            return JNI_ERR;
        };
        for method in methods {
            if st.find_method(cid, &method.name, &method.signature).is_none() {
                Self::raise(&mut st, "java/lang/NoSuchMethodError", method.name.clone());
                return JNI_ERR;
            }
        }
        let class_name = st.classes[cid].name.clone();
        for method in methods {
            st.natives.insert(
                (
                    class_name.clone(),
                    method.name.clone(),
                    method.signature.clone(),
                ),
                method.fn_ptr as usize,
            );
        }
        JNI_OK
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    fn exception_check(&self) -> jboolean {
        to_jboolean(self.enter().pending.is_some())
    }

    fn exception_occurred(&self) -> JThrowable {
        let mut st = self.enter();
        let pending = st.pending;
        st.new_local(pending)
    }

    fn exception_describe(&self) {
        let mut st = self.enter();
        if let Some(exc) = st.pending.take() {
            let text = st.describe(exc);
            st.counters.described.push(text);
        }
    }

    fn exception_clear(&self) {
        self.enter().pending = None;
    }

    // ========================================================================
    // References and Frames
    // ========================================================================

    fn new_global_ref(&self, obj: JObject) -> JObject {
        let mut st = self.enter();
        if self.exhausted_globals.get() {
            Self::raise(&mut st, "java/lang/OutOfMemoryError", "global references".into());
            return JObject::NULL;
        }
        let target = st.deref(obj);
        st.new_global(target)
    }

    fn delete_global_ref(&self, obj: JObject) {
        self.enter().delete_global(obj);
    }

    fn new_local_ref(&self, obj: JObject) -> JObject {
        let mut st = self.enter();
        let target = st.deref(obj);
        st.new_local(target)
    }

    fn delete_local_ref(&self, obj: JObject) {
        self.enter().delete_local(obj);
    }

    fn ensure_local_capacity(&self, capacity: jint) -> jint {
        if capacity < 0 {
            JNI_ERR
        } else {
            JNI_OK
        }
    }

    fn push_local_frame(&self, capacity: jint) -> jint {
        let mut st = self.enter_call();
        if capacity < 0 {
            Self::raise(&mut st, "java/lang/OutOfMemoryError", "negative capacity".into());
            return JNI_ERR;
        }
        st.push_frame();
        JNI_OK
    }

    fn pop_local_frame(&self, result: JObject) -> JObject {
        self.enter().pop_frame(result).unwrap_or(JObject::NULL)
    }

    // ========================================================================
    // Objects and Strings
    // ========================================================================

    fn new_object_a(&self, class: JClass, ctor: JMethodId, args: &[JValue]) -> JObject {
        let mut st = self.enter_call();
        let Some(cid) = Self::class_id(&st, class) else {
            Self::raise(&mut st, "java/lang/NullPointerException", "class".into());
            return JObject::NULL;
        };
        let obj = st.alloc(cid, Data::Plain);
        match st.invoke(ctor.into_raw().wrapping_sub(1), Some(obj), args, false) {
            Ok(_) => st.new_local(Some(obj)),
            Err(exc) => {
                st.pending = Some(exc);
                JObject::NULL
            }
        }
    }

    fn new_string_utf(&self, s: &str) -> JObject {
        let mut st = self.enter_call();
        let obj = st.new_string(s);
        st.new_local(Some(obj))
    }

    // ========================================================================
    // Method Calls
    // ========================================================================

    fn call_void_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]) {
        self.call(Dispatch::Virtual, obj, method, args);
    }

    fn call_nonvirtual_void_method_a(
        &self,
        obj: JObject,
        _class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) {
        self.call(Dispatch::Nonvirtual, obj, method, args);
    }

    fn call_static_void_method_a(&self, _class: JClass, method: JMethodId, args: &[JValue]) {
        self.call(Dispatch::Static, JObject::NULL, method, args);
    }

    fn call_object_method_a(&self, obj: JObject, method: JMethodId, args: &[JValue]) -> JObject {
        self.call_object(Dispatch::Virtual, obj, method, args)
    }

    fn call_nonvirtual_object_method_a(
        &self,
        obj: JObject,
        _class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> JObject {
        self.call_object(Dispatch::Nonvirtual, obj, method, args)
    }

    fn call_static_object_method_a(
        &self,
        _class: JClass,
        method: JMethodId,
        args: &[JValue],
    ) -> JObject {
        self.call_object(Dispatch::Static, JObject::NULL, method, args)
    }

    call_methods! {
        call_boolean_method_a, call_nonvirtual_boolean_method_a, call_static_boolean_method_a
            => jboolean, |s: Slot| s.int() as jboolean;
        call_byte_method_a, call_nonvirtual_byte_method_a, call_static_byte_method_a
            => jbyte, |s: Slot| s.int() as jbyte;
        call_char_method_a, call_nonvirtual_char_method_a, call_static_char_method_a
            => jchar, |s: Slot| s.int() as jchar;
        call_short_method_a, call_nonvirtual_short_method_a, call_static_short_method_a
            => jshort, |s: Slot| s.int() as jshort;
        call_int_method_a, call_nonvirtual_int_method_a, call_static_int_method_a
            => jint, |s: Slot| s.int() as jint;
        call_long_method_a, call_nonvirtual_long_method_a, call_static_long_method_a
            => jlong, |s: Slot| s.int();
        call_float_method_a, call_nonvirtual_float_method_a, call_static_float_method_a
            => jfloat, |s: Slot| s.float() as jfloat;
        call_double_method_a, call_nonvirtual_double_method_a, call_static_double_method_a
            => jdouble, |s: Slot| s.float();
    }

    // ========================================================================
    // Fields
    // ========================================================================

    field_accessors! {
        get_boolean_field, set_boolean_field, get_static_boolean_field, set_static_boolean_field
            => jboolean, Z, |s: Slot| s.int() as jboolean;
        get_byte_field, set_byte_field, get_static_byte_field, set_static_byte_field
            => jbyte, B, |s: Slot| s.int() as jbyte;
        get_char_field, set_char_field, get_static_char_field, set_static_char_field
            => jchar, C, |s: Slot| s.int() as jchar;
        get_short_field, set_short_field, get_static_short_field, set_static_short_field
            => jshort, S, |s: Slot| s.int() as jshort;
        get_int_field, set_int_field, get_static_int_field, set_static_int_field
            => jint, I, |s: Slot| s.int() as jint;
        get_long_field, set_long_field, get_static_long_field, set_static_long_field
            => jlong, J, |s: Slot| s.int();
        get_float_field, set_float_field, get_static_float_field, set_static_float_field
            => jfloat, F, |s: Slot| s.float() as jfloat;
        get_double_field, set_double_field, get_static_double_field, set_static_double_field
            => jdouble, D, |s: Slot| s.float();
    }

    fn get_object_field(&self, obj: JObject, field: JFieldId) -> JObject {
        let slot = self.read_field(obj, field);
        self.state.borrow_mut().new_local(slot.object())
    }

    fn set_object_field(&self, obj: JObject, field: JFieldId, value: JObject) {
        let slot = self.object_slot(value);
        self.write_field(obj, field, slot)
    }

    fn get_static_object_field(&self, _class: JClass, field: JFieldId) -> JObject {
        let slot = self.read_static(field);
        self.state.borrow_mut().new_local(slot.object())
    }

    fn set_static_object_field(&self, _class: JClass, field: JFieldId, value: JObject) {
        let slot = self.object_slot(value);
        self.write_static(field, slot)
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    fn get_array_length(&self, array: JArray) -> jsize {
        let st = self.enter_call();
        st.deref(array)
            .and_then(|obj| st.array(obj))
            .map(|data| data.len() as jsize)
            .unwrap_or(0)
    }

    fn new_object_array(&self, len: jsize, element_class: JClass, initial: JObject) -> JArray {
        let mut st = self.enter_call();
        let Some(cid) = Self::class_id(&st, element_class) else {
            Self::raise(&mut st, "java/lang/NullPointerException", "element class".into());
            return JObject::NULL;
        };
        let Ok(len) = usize::try_from(len) else {
            Self::raise(&mut st, "java/lang/NegativeArraySizeException", len.to_string());
            return JObject::NULL;
        };
        let fill = st.deref(initial);
        let descriptor = array_descriptor(&st.classes[cid].name);
        let array = st.new_array(&descriptor, ArrayData::L(vec![fill; len]));
        st.new_local(Some(array))
    }

    fn get_object_array_element(&self, array: JArray, index: jsize) -> JObject {
        let mut st = self.enter_call();
        let element = st
            .deref(array)
            .and_then(|obj| st.array(obj))
            .and_then(|data| match data {
                ArrayData::L(items) => usize::try_from(index).ok().and_then(|i| items.get(i)),
                _ => None,
            })
            .copied();
        match element {
            Some(element) => st.new_local(element),
            None => {
                Self::raise(
                    &mut st,
                    "java/lang/ArrayIndexOutOfBoundsException",
                    index.to_string(),
                );
                JObject::NULL
            }
        }
    }

    fn set_object_array_element(&self, array: JArray, index: jsize, value: JObject) {
        let mut st = self.enter_call();
        let value = st.deref(value);
        let stored = st.deref(array).and_then(|obj| st.array_mut(obj)).and_then(|data| {
            match (data, usize::try_from(index)) {
                (ArrayData::L(items), Ok(i)) if i < items.len() => {
                    items[i] = value;
                    Some(())
                }
                _ => None,
            }
        });
        if stored.is_none() {
            Self::raise(
                &mut st,
                "java/lang/ArrayIndexOutOfBoundsException",
                index.to_string(),
            );
        }
    }

    primitive_arrays! {
        new_boolean_array, set_boolean_array_region,
            get_boolean_array_elements, release_boolean_array_elements => jboolean;
        new_byte_array, set_byte_array_region,
            get_byte_array_elements, release_byte_array_elements => jbyte;
        new_char_array, set_char_array_region,
            get_char_array_elements, release_char_array_elements => jchar;
        new_short_array, set_short_array_region,
            get_short_array_elements, release_short_array_elements => jshort;
        new_int_array, set_int_array_region,
            get_int_array_elements, release_int_array_elements => jint;
        new_long_array, set_long_array_region,
            get_long_array_elements, release_long_array_elements => jlong;
        new_float_array, set_float_array_region,
            get_float_array_elements, release_float_array_elements => jfloat;
        new_double_array, set_double_array_region,
            get_double_array_elements, release_double_array_elements => jdouble;
    }

    fn get_primitive_array_critical(&self, array: JArray) -> *mut c_void {
        let mut st = self.enter_call();
        let Some(obj) = st.deref(array) else {
            return std::ptr::null_mut();
        };
        let Some(mut copy) = st.array(obj).map(ArrayData::pinned) else {
            return std::ptr::null_mut();
        };
        let ptr = copy.as_mut_ptr();
        st.critical.insert(ptr as usize, (obj, copy));
        st.counters.critical_acquisitions += 1;
        ptr
    }

    fn release_primitive_array_critical(&self, _array: JArray, carray: *mut c_void, mode: jint) {
        let mut st = self.state.borrow_mut();
        let Some((obj, buffer)) = st.critical.remove(&(carray as usize)) else {
            return;
        };
        if mode != JNI_ABORT {
            if let Some(target) = st.array_mut(obj) {
                *target = buffer;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_arg(vm: &MockVm, s: &str) -> JValue {
        JValue {
            l: vm.new_string_utf(s),
        }
    }

    #[test]
    fn test_find_class_counts_and_fails_with_cause() {
        let vm = MockVm::new();
        assert!(!vm.find_class("java/lang/String").is_null());
        assert_eq!(vm.find_class_calls("java/lang/String"), 1);

        assert!(vm.find_class("java/foo/bar").is_null());
        assert!(vm.has_pending_exception());
        vm.exception_describe();
        assert!(!vm.has_pending_exception());
        let text = &vm.described()[0];
        assert!(text.starts_with("java.lang.NoClassDefFoundError: java/foo/bar"));
        assert!(text.contains("Caused by: java.lang.ClassNotFoundException: java.foo.bar"));
    }

    #[test]
    fn test_hidden_class_needs_loader() {
        let vm = MockVm::new();
        assert!(vm.find_class("jnibridge/test/Hidden").is_null());
        vm.exception_clear();

        let string_class = vm.find_class("java/lang/String");
        let get_loader = vm.get_method_id(
            vm.find_class("java/lang/Class"),
            "getClassLoader",
            "()Ljava/lang/ClassLoader;",
        );
        let loader = vm.call_object_method_a(string_class, get_loader, &[]);
        let find = vm.get_method_id(
            vm.get_object_class(loader),
            "findClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
        );
        let name = string_arg(&vm, "jnibridge.test.Hidden");
        let hidden = vm.call_object_method_a(loader, find, &[name]);
        assert!(!hidden.is_null());
        assert!(!vm.has_pending_exception());
    }

    #[test]
    fn test_string_concat() {
        let vm = MockVm::new();
        let class = vm.find_class("java/lang/String");
        let concat = vm.get_method_id(class, "concat", "(Ljava/lang/String;)Ljava/lang/String;");
        let hello = vm.new_string_utf("Hello ");
        let result = vm.call_object_method_a(hello, concat, &[string_arg(&vm, "World!")]);
        assert_eq!(vm.string_value(result).as_deref(), Some("Hello World!"));
    }

    #[test]
    fn test_virtual_and_nonvirtual_dispatch() {
        let vm = MockVm::new();
        let base = vm.find_class("jnibridge/test/Base");
        let derived = vm.find_class("jnibridge/test/Derived");
        let init = vm.get_method_id(derived, "<init>", "()V");
        let obj = vm.new_object_a(derived, init, &[]);
        let name = vm.get_method_id(base, "name", "()Ljava/lang/String;");

        let virtual_result = vm.call_object_method_a(obj, name, &[]);
        assert_eq!(vm.string_value(virtual_result).as_deref(), Some("derived"));
        let direct = vm.call_nonvirtual_object_method_a(obj, base, name, &[]);
        assert_eq!(vm.string_value(direct).as_deref(), Some("base"));
    }

    #[test]
    fn test_element_release_modes() {
        let vm = MockVm::new();
        let array = vm.new_int_array(3);
        vm.set_int_array_region(array, 0, &[1, 2, 3]);
        let elems = vm.get_int_array_elements(array);
        unsafe { *elems = 99 };
        vm.release_int_array_elements(array, elems, JNI_ABORT);

        let elems = vm.get_int_array_elements(array);
        assert_eq!(unsafe { *elems }, 1);
        vm.release_int_array_elements(array, elems, 0);
        assert_eq!(vm.release_modes(), vec![JNI_ABORT, 0]);
    }

    #[test]
    fn test_critical_violation_is_recorded() {
        let vm = MockVm::new();
        let array = vm.new_byte_array(2);
        let ptr = vm.get_primitive_array_critical(array);
        vm.get_array_length(array);
        vm.release_primitive_array_critical(array, ptr, JNI_ABORT);
        vm.get_array_length(array);
        assert_eq!(vm.critical_violations(), 1);
        assert_eq!(vm.critical_acquisitions(), 1);
    }

    #[test]
    fn test_each_vm_has_its_own_id() {
        let a = MockVm::new();
        let b = MockVm::new();
        assert_ne!(a.java_vm(), b.java_vm());
    }
}
