//! Native dispatch
//!
//! Selects the one native entry point that matches a call family and a
//! resolved return (or field) type. Object and array results share the object
//! entry point. Nothing here inspects or handles exceptions; the caller checks
//! for one after every dispatch.

use jnibridge_sdk::{
    jboolean, jbyte, jchar, jdouble, jfloat, jint, jlong, jshort, JClass, JFieldId, JMethodId,
    JObject, JValue, NativeInterface,
};
use tracing::trace;

use crate::types::{BaseKind, Type};

/// Kind of VM operation being dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallFamily {
    Constructor,
    Virtual,
    Nonvirtual,
    Static,
    GetField,
    SetField,
    GetStaticField,
    SetStaticField,
}

/// Receiver of a method call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    Object(JObject),
    Nonvirtual { object: JObject, class: JClass },
    Static(JClass),
}

impl CallTarget {
    pub fn family(&self) -> CallFamily {
        match self {
            CallTarget::Object(_) => CallFamily::Virtual,
            CallTarget::Nonvirtual { .. } => CallFamily::Nonvirtual,
            CallTarget::Static(_) => CallFamily::Static,
        }
    }
}

/// Owner of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    Instance(JObject),
    Static(JClass),
}

/// A value exactly as the native interface returned it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    Void,
    Boolean(jboolean),
    Byte(jbyte),
    Char(jchar),
    Short(jshort),
    Int(jint),
    Long(jlong),
    Float(jfloat),
    Double(jdouble),
    Object(JObject),
}

macro_rules! call_kind {
    ($ni:expr, $target:expr, $method:expr, $args:expr, $variant:ident, $virt:ident, $nonvirt:ident, $stat:ident) => {
        RawValue::$variant(match $target {
            CallTarget::Object(obj) => $ni.$virt(obj, $method, $args),
            CallTarget::Nonvirtual { object, class } => $ni.$nonvirt(object, class, $method, $args),
            CallTarget::Static(class) => $ni.$stat(class, $method, $args),
        })
    };
}

/// Invoke a method and return its raw result
pub fn call_method(
    ni: &dyn NativeInterface,
    target: CallTarget,
    method: JMethodId,
    ret: Type,
    args: &[JValue],
) -> RawValue {
    trace!(family = ?target.family(), ret = %ret, argc = args.len(), "dispatch call");
    if ret.is_reference() {
        return call_kind!(
            ni, target, method, args, Object,
            call_object_method_a, call_nonvirtual_object_method_a, call_static_object_method_a
        );
    }
    match ret.base_kind() {
        BaseKind::Void => {
            match target {
                CallTarget::Object(obj) => ni.call_void_method_a(obj, method, args),
                CallTarget::Nonvirtual { object, class } => {
                    ni.call_nonvirtual_void_method_a(object, class, method, args)
                }
                CallTarget::Static(class) => ni.call_static_void_method_a(class, method, args),
            }
            RawValue::Void
        }
        BaseKind::Boolean => call_kind!(
            ni, target, method, args, Boolean,
            call_boolean_method_a, call_nonvirtual_boolean_method_a, call_static_boolean_method_a
        ),
        BaseKind::Byte => call_kind!(
            ni, target, method, args, Byte,
            call_byte_method_a, call_nonvirtual_byte_method_a, call_static_byte_method_a
        ),
        BaseKind::Char => call_kind!(
            ni, target, method, args, Char,
            call_char_method_a, call_nonvirtual_char_method_a, call_static_char_method_a
        ),
        BaseKind::Short => call_kind!(
            ni, target, method, args, Short,
            call_short_method_a, call_nonvirtual_short_method_a, call_static_short_method_a
        ),
        BaseKind::Int => call_kind!(
            ni, target, method, args, Int,
            call_int_method_a, call_nonvirtual_int_method_a, call_static_int_method_a
        ),
        BaseKind::Long => call_kind!(
            ni, target, method, args, Long,
            call_long_method_a, call_nonvirtual_long_method_a, call_static_long_method_a
        ),
        BaseKind::Float => call_kind!(
            ni, target, method, args, Float,
            call_float_method_a, call_nonvirtual_float_method_a, call_static_float_method_a
        ),
        BaseKind::Double => call_kind!(
            ni, target, method, args, Double,
            call_double_method_a, call_nonvirtual_double_method_a, call_static_double_method_a
        ),
        BaseKind::Object => call_kind!(
            ni, target, method, args, Object,
            call_object_method_a, call_nonvirtual_object_method_a, call_static_object_method_a
        ),
    }
}

/// Allocate and construct an object
pub fn new_object(ni: &dyn NativeInterface, class: JClass, ctor: JMethodId, args: &[JValue]) -> JObject {
    trace!(family = ?CallFamily::Constructor, argc = args.len(), "dispatch call");
    ni.new_object_a(class, ctor, args)
}

macro_rules! get_kind {
    ($ni:expr, $target:expr, $field:expr, $variant:ident, $get:ident, $get_static:ident) => {
        RawValue::$variant(match $target {
            FieldTarget::Instance(obj) => $ni.$get(obj, $field),
            FieldTarget::Static(class) => $ni.$get_static(class, $field),
        })
    };
}

/// Read a field of type `ty`
pub fn get_field(ni: &dyn NativeInterface, target: FieldTarget, field: JFieldId, ty: Type) -> RawValue {
    let family = match target {
        FieldTarget::Instance(_) => CallFamily::GetField,
        FieldTarget::Static(_) => CallFamily::GetStaticField,
    };
    trace!(family = ?family, ty = %ty, "dispatch field read");
    if ty.is_reference() {
        return get_kind!(ni, target, field, Object, get_object_field, get_static_object_field);
    }
    match ty.base_kind() {
        BaseKind::Boolean => get_kind!(ni, target, field, Boolean, get_boolean_field, get_static_boolean_field),
        BaseKind::Byte => get_kind!(ni, target, field, Byte, get_byte_field, get_static_byte_field),
        BaseKind::Char => get_kind!(ni, target, field, Char, get_char_field, get_static_char_field),
        BaseKind::Short => get_kind!(ni, target, field, Short, get_short_field, get_static_short_field),
        BaseKind::Int => get_kind!(ni, target, field, Int, get_int_field, get_static_int_field),
        BaseKind::Long => get_kind!(ni, target, field, Long, get_long_field, get_static_long_field),
        BaseKind::Float => get_kind!(ni, target, field, Float, get_float_field, get_static_float_field),
        BaseKind::Double => get_kind!(ni, target, field, Double, get_double_field, get_static_double_field),
        BaseKind::Object => get_kind!(ni, target, field, Object, get_object_field, get_static_object_field),
        BaseKind::Void => RawValue::Void,
    }
}

macro_rules! set_kind {
    ($ni:expr, $target:expr, $field:expr, $value:expr, $set:ident, $set_static:ident) => {
        match $target {
            FieldTarget::Instance(obj) => $ni.$set(obj, $field, $value),
            FieldTarget::Static(class) => $ni.$set_static(class, $field, $value),
        }
    };
}

/// Write a field of type `ty` from the matching member of `value`
pub fn set_field(ni: &dyn NativeInterface, target: FieldTarget, field: JFieldId, ty: Type, value: JValue) {
    let family = match target {
        FieldTarget::Instance(_) => CallFamily::SetField,
        FieldTarget::Static(_) => CallFamily::SetStaticField,
    };
    trace!(family = ?family, ty = %ty, "dispatch field write");
    // SAFETY: the marshaler wrote the union member that matches `ty`.
    unsafe {
        if ty.is_reference() {
            set_kind!(ni, target, field, value.l, set_object_field, set_static_object_field);
            return;
        }
        match ty.base_kind() {
            BaseKind::Boolean => set_kind!(ni, target, field, value.z, set_boolean_field, set_static_boolean_field),
            BaseKind::Byte => set_kind!(ni, target, field, value.b, set_byte_field, set_static_byte_field),
            BaseKind::Char => set_kind!(ni, target, field, value.c, set_char_field, set_static_char_field),
            BaseKind::Short => set_kind!(ni, target, field, value.s, set_short_field, set_static_short_field),
            BaseKind::Int => set_kind!(ni, target, field, value.i, set_int_field, set_static_int_field),
            BaseKind::Long => set_kind!(ni, target, field, value.j, set_long_field, set_static_long_field),
            BaseKind::Float => set_kind!(ni, target, field, value.f, set_float_field, set_static_float_field),
            BaseKind::Double => set_kind!(ni, target, field, value.d, set_double_field, set_static_double_field),
            BaseKind::Object => set_kind!(ni, target, field, value.l, set_object_field, set_static_object_field),
            BaseKind::Void => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jnibridge_mock::MockVm;

    #[test]
    fn test_target_families() {
        let obj = JObject::from_raw(8);
        assert_eq!(CallTarget::Object(obj).family(), CallFamily::Virtual);
        assert_eq!(
            CallTarget::Nonvirtual { object: obj, class: obj }.family(),
            CallFamily::Nonvirtual
        );
        assert_eq!(CallTarget::Static(obj).family(), CallFamily::Static);
    }

    #[test]
    fn test_static_int_dispatch() {
        let vm = MockVm::new();
        let ni: &dyn NativeInterface = &*vm;
        let class = ni.find_class("jnibridge/test/Echo");
        let method = ni.get_static_method_id(class, "echo", "(I)I");
        let raw = call_method(ni, CallTarget::Static(class), method, Type::INT, &[JValue { i: 41 }]);
        assert_eq!(raw, RawValue::Int(41));
    }

    #[test]
    fn test_static_field_round_trip() {
        let vm = MockVm::new();
        let ni: &dyn NativeInterface = &*vm;
        let class = ni.find_class("jnibridge/test/Echo");
        let field = ni.get_static_field_id(class, "BIG", "J");
        set_field(ni, FieldTarget::Static(class), field, Type::LONG, JValue { j: -9 });
        assert_eq!(
            get_field(ni, FieldTarget::Static(class), field, Type::LONG),
            RawValue::Long(-9)
        );
    }
}
