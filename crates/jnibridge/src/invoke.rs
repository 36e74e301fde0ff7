//! Call facade
//!
//! Every public call, construction and field access runs the same pipeline:
//!
//! 1. take the pending signature override, whatever happens next
//! 2. reject null receivers
//! 3. refine a generic `java/lang/Object` receiver to its runtime class
//! 4. resolve the return or field type
//! 5. resolve the class
//! 6. marshal the arguments and build the signature
//! 7. look up the member, pack the buffer, dispatch
//! 8. translate a pending exception, then convert the result
//!
//! Temporaries created during marshaling are released before the operation
//! returns, on success and on every error path.

use std::ffi::c_void;

use jnibridge_sdk::{from_jboolean, JClass, JObject, NativeMethod};
use tracing::{debug, trace, warn};

use crate::array::primitive_array_value;
use crate::convert::{nullable_string, FromJavaObject};
use crate::dispatch::{self, CallTarget, FieldTarget, RawValue};
use crate::env::Env;
use crate::error::{BridgeError, BridgeResult};
use crate::marshal::PreparedArgs;
use crate::object::{CastedObjectRef, ObjectRef};
use crate::refs::LocalRef;
use crate::resolve::{type_of_spec, types_of_args, Resolved};
use crate::signature::{method_signature, type_signature};
use crate::types::{Type, TypeSpec, CLASS_CLASS, OBJECT_CLASS, STRING_CLASS};
use crate::value::{Arg, Value};

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Clone, Copy)]
enum Receiver {
    Virtual(JObject),
    Nonvirtual(JObject),
    Static,
}

fn null_receiver(what: &str, member: &str) -> BridgeError {
    warn!(member, "{what} on a null reference");
    BridgeError::ProtocolMisuse(format!("{what} {member} on a null reference"))
}

/// Class to look members up on for a receiver's declared type
fn lookup_class(class_name: &str, is_array: bool) -> &str {
    if is_array {
        OBJECT_CLASS
    } else {
        class_name
    }
}

fn call(
    env: &Env,
    sig: Option<String>,
    receiver: Receiver,
    class_name: &str,
    name: &str,
    ret: &TypeSpec,
    args: &[Arg<'_>],
) -> BridgeResult<Value> {
    let ret = type_of_spec(ret)?;
    let class = env.find_class(class_name)?;
    let mut prepared = PreparedArgs::prepare(env, args)?;
    let sig = sig.unwrap_or_else(|| prepared.signature(&ret));
    trace!(class = class_name, method = name, signature = %sig, "resolved call");

    let method = env.method_id(class, name, &sig, matches!(receiver, Receiver::Static))?;
    let buffer = prepared.build(env)?;
    let target = match receiver {
        Receiver::Virtual(object) => CallTarget::Object(object),
        Receiver::Nonvirtual(object) => CallTarget::Nonvirtual { object, class },
        Receiver::Static => CallTarget::Static(class),
    };
    let raw = dispatch::call_method(env.native(), target, method, ret.0, buffer.as_slice());
    env.check_exception()?;
    convert_result(env, raw, &ret)
}

fn get_field(
    env: &Env,
    sig: Option<String>,
    target: Option<JObject>,
    class_name: &str,
    name: &str,
    ty: &TypeSpec,
) -> BridgeResult<Value> {
    let ty = type_of_spec(ty)?;
    let class = env.find_class(class_name)?;
    let sig = sig.unwrap_or_else(|| type_signature(ty.0, &ty.1));
    trace!(class = class_name, field = name, signature = %sig, "resolved field read");

    let field = env.field_id(class, name, &sig, target.is_none())?;
    let target = match target {
        Some(object) => FieldTarget::Instance(object),
        None => FieldTarget::Static(class),
    };
    let raw = dispatch::get_field(env.native(), target, field, ty.0);
    env.check_exception()?;
    convert_result(env, raw, &ty)
}

fn set_field(
    env: &Env,
    sig: Option<String>,
    target: Option<JObject>,
    class_name: &str,
    name: &str,
    value: Arg<'_>,
) -> BridgeResult<()> {
    let class = env.find_class(class_name)?;
    let mut prepared = PreparedArgs::prepare(env, &[value])?;
    let (ty, value_class) = prepared.types()[0].clone();
    let sig = sig.unwrap_or_else(|| type_signature(ty, &value_class));
    trace!(class = class_name, field = name, signature = %sig, "resolved field write");

    let field = env.field_id(class, name, &sig, target.is_none())?;
    let buffer = prepared.build(env)?;
    let target = match target {
        Some(object) => FieldTarget::Instance(object),
        None => FieldTarget::Static(class),
    };
    dispatch::set_field(env.native(), target, field, ty, buffer.as_slice()[0]);
    env.check_exception()
}

fn convert_result(env: &Env, raw: RawValue, (ty, class): &Resolved) -> BridgeResult<Value> {
    let value = match raw {
        RawValue::Void => Value::Void,
        RawValue::Boolean(v) => Value::Boolean(from_jboolean(v)),
        RawValue::Byte(v) => Value::Byte(v as u8),
        RawValue::Char(v) => Value::Char(v),
        RawValue::Short(v) => Value::Short(v),
        RawValue::Int(v) => Value::Int(v),
        RawValue::Long(v) => Value::Long(v),
        RawValue::Float(v) => Value::Float(v),
        RawValue::Double(v) => Value::Double(v),
        RawValue::Object(handle) if ty.is_primitive_array() => {
            if handle.is_null() {
                Value::Object(ObjectRef::null(OBJECT_CLASS))
            } else {
                let _array = LocalRef::new(env, handle);
                primitive_array_value(env, *ty, handle)?
            }
        }
        RawValue::Object(handle) if ty.is_array() => {
            Value::Object(ObjectRef::new_array(handle, class.as_str()))
        }
        RawValue::Object(handle) => Value::Object(ObjectRef::new(handle, class.as_str())),
    };
    Ok(value)
}

// ============================================================================
// ObjectRef
// ============================================================================

impl ObjectRef {
    /// Call an instance method, dispatched on the object's runtime class.
    ///
    /// A receiver declared as plain `java/lang/Object` is first refined to
    /// its runtime class, and keeps the refined class afterwards.
    pub fn call_method(
        &mut self,
        env: &Env,
        name: &str,
        ret: impl Into<TypeSpec>,
        args: &[Arg<'_>],
    ) -> BridgeResult<Value> {
        let sig = env.take_signature();
        if self.is_null() {
            return Err(null_receiver("call", name));
        }
        self.refine_class(env)?;
        let class = lookup_class(self.class_name(), self.is_array());
        call(env, sig, Receiver::Virtual(self.handle()), class, name, &ret.into(), args)
    }

    /// Call `class`'s implementation of a method, bypassing overrides
    pub fn call_nonvirtual_method(
        &mut self,
        env: &Env,
        class: &str,
        name: &str,
        ret: impl Into<TypeSpec>,
        args: &[Arg<'_>],
    ) -> BridgeResult<Value> {
        let sig = env.take_signature();
        if self.is_null() {
            return Err(null_receiver("nonvirtual call", name));
        }
        self.refine_class(env)?;
        call(env, sig, Receiver::Nonvirtual(self.handle()), class, name, &ret.into(), args)
    }

    /// Call a method returning an object and convert the result.
    ///
    /// The returned local reference is released after conversion.
    pub fn call_method_into<T: FromJavaObject>(
        &mut self,
        env: &Env,
        name: &str,
        ret: impl Into<TypeSpec>,
        args: &[Arg<'_>],
    ) -> BridgeResult<T> {
        let obj = self.call_method(env, name, ret, args)?.into_object()?;
        let _result = LocalRef::new(env, obj.handle());
        T::from_java_object(env, &obj)
    }

    pub fn get_field(
        &mut self,
        env: &Env,
        name: &str,
        ty: impl Into<TypeSpec>,
    ) -> BridgeResult<Value> {
        let sig = env.take_signature();
        if self.is_null() {
            return Err(null_receiver("field read", name));
        }
        self.refine_class(env)?;
        get_field(env, sig, Some(self.handle()), self.class_name(), name, &ty.into())
    }

    pub fn set_field(&mut self, env: &Env, name: &str, value: Arg<'_>) -> BridgeResult<()> {
        let sig = env.take_signature();
        if self.is_null() {
            return Err(null_receiver("field write", name));
        }
        self.refine_class(env)?;
        set_field(env, sig, Some(self.handle()), self.class_name(), name, value)
    }

    /// Whether the object is an instance of `class`; null is an instance of
    /// every class
    pub fn is_instance_of(&self, env: &Env, class: &str) -> BridgeResult<bool> {
        let class = env.find_class(class)?;
        Ok(from_jboolean(env.native().is_instance_of(self.handle(), class)))
    }

    /// Whether both references denote the same Java object
    pub fn is_same_object(&self, env: &Env, other: &ObjectRef) -> bool {
        from_jboolean(env.native().is_same_object(self.handle(), other.handle()))
    }

    /// Replace a generic `java/lang/Object` class name with the object's
    /// runtime class.
    ///
    /// Arrays, nulls and already specific references are left alone, as are
    /// runtime classes that are themselves arrays.
    pub fn refine_class(&mut self, env: &Env) -> BridgeResult<()> {
        if self.is_null() || !self.is_generic() {
            return Ok(());
        }
        let class = self
            .cast(OBJECT_CLASS)
            .invoke(env, None, "getClass", CLASS_CLASS, &[])?
            .into_object()?;
        let _class = LocalRef::new(env, class.handle());
        let name = class
            .cast(CLASS_CLASS)
            .invoke(env, None, "getName", STRING_CLASS, &[])?;
        let name = nullable_string(env, name)?;
        if name.is_empty() || name.starts_with('[') {
            return Ok(());
        }
        let name = name.replace('.', "/");
        if name != self.class_name() {
            debug!(from = self.class_name(), to = %name, "refined receiver class");
            self.set_class_name(name);
        }
        Ok(())
    }
}

// ============================================================================
// CastedObjectRef
// ============================================================================

impl CastedObjectRef<'_> {
    /// Call an instance method as declared on the cast class
    pub fn call_method(
        &self,
        env: &Env,
        name: &str,
        ret: impl Into<TypeSpec>,
        args: &[Arg<'_>],
    ) -> BridgeResult<Value> {
        let sig = env.take_signature();
        self.invoke(env, sig, name, ret, args)
    }

    pub(crate) fn invoke(
        &self,
        env: &Env,
        sig: Option<String>,
        name: &str,
        ret: impl Into<TypeSpec>,
        args: &[Arg<'_>],
    ) -> BridgeResult<Value> {
        if self.handle().is_null() {
            return Err(null_receiver("call", name));
        }
        let class = lookup_class(self.class_name(), self.is_array());
        call(env, sig, Receiver::Virtual(self.handle()), class, name, &ret.into(), args)
    }

    pub fn call_nonvirtual_method(
        &self,
        env: &Env,
        class: &str,
        name: &str,
        ret: impl Into<TypeSpec>,
        args: &[Arg<'_>],
    ) -> BridgeResult<Value> {
        let sig = env.take_signature();
        if self.handle().is_null() {
            return Err(null_receiver("nonvirtual call", name));
        }
        call(env, sig, Receiver::Nonvirtual(self.handle()), class, name, &ret.into(), args)
    }

    pub fn get_field(&self, env: &Env, name: &str, ty: impl Into<TypeSpec>) -> BridgeResult<Value> {
        let sig = env.take_signature();
        if self.handle().is_null() {
            return Err(null_receiver("field read", name));
        }
        get_field(env, sig, Some(self.handle()), self.class_name(), name, &ty.into())
    }

    pub fn set_field(&self, env: &Env, name: &str, value: Arg<'_>) -> BridgeResult<()> {
        let sig = env.take_signature();
        if self.handle().is_null() {
            return Err(null_receiver("field write", name));
        }
        set_field(env, sig, Some(self.handle()), self.class_name(), name, value)
    }
}

// ============================================================================
// Env: Construction, Statics, Natives
// ============================================================================

impl Env {
    /// Construct a new `class` with the constructor matching `args`
    pub fn new_object(&self, class: &str, args: &[Arg<'_>]) -> BridgeResult<ObjectRef> {
        let sig = self.take_signature();
        self.construct(sig, class, args)
    }

    pub(crate) fn construct(
        &self,
        sig: Option<String>,
        class_name: &str,
        args: &[Arg<'_>],
    ) -> BridgeResult<ObjectRef> {
        let class = self.find_class(class_name)?;
        let mut prepared = PreparedArgs::prepare(self, args)?;
        let sig = sig.unwrap_or_else(|| {
            prepared.signature(&(Type::VOID, OBJECT_CLASS.to_string()))
        });
        trace!(class = class_name, signature = %sig, "resolved constructor");

        let ctor = self.method_id(class, "<init>", &sig, false)?;
        let buffer = prepared.build(self)?;
        let handle = dispatch::new_object(self.native(), class, ctor, buffer.as_slice());
        self.check_exception()?;
        if handle.is_null() {
            return Err(BridgeError::NoPendingException);
        }
        Ok(ObjectRef::new(handle, class_name))
    }

    pub fn call_static_method(
        &self,
        class: &str,
        name: &str,
        ret: impl Into<TypeSpec>,
        args: &[Arg<'_>],
    ) -> BridgeResult<Value> {
        let sig = self.take_signature();
        call(self, sig, Receiver::Static, class, name, &ret.into(), args)
    }

    pub fn get_static_field(
        &self,
        class: &str,
        name: &str,
        ty: impl Into<TypeSpec>,
    ) -> BridgeResult<Value> {
        let sig = self.take_signature();
        get_field(self, sig, None, class, name, &ty.into())
    }

    pub fn set_static_field(&self, class: &str, name: &str, value: Arg<'_>) -> BridgeResult<()> {
        let sig = self.take_signature();
        set_field(self, sig, None, class, name, value)
    }

    /// Bind `fn_ptr` as the implementation of a `native` method.
    ///
    /// `params` may be values or bare [`Arg::Type`] descriptors; only their
    /// types are used.
    pub fn register_native(
        &self,
        class: &str,
        name: &str,
        ret: impl Into<TypeSpec>,
        params: &[Arg<'_>],
        fn_ptr: *mut c_void,
    ) -> BridgeResult<()> {
        let sig = self.take_signature();
        let class_ref: JClass = self.find_class(class)?;
        let signature = match sig {
            Some(sig) => sig,
            None => {
                let ret = type_of_spec(&ret.into())?;
                method_signature(ret.0, &ret.1, &types_of_args(params)?)
            }
        };
        debug!(class, method = name, signature = %signature, "registering native method");
        let method = NativeMethod {
            name: name.to_string(),
            signature: signature.clone(),
            fn_ptr,
        };
        if self.native().register_natives(class_ref, &[method]) < 0 {
            return Err(self.pending_error(|| {
                BridgeError::Resolution(format!("could not register native {name}{signature}"))
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jnibridge_mock::MockVm;

    #[test]
    fn test_static_call() {
        let env = Env::new(MockVm::new());
        let value = env
            .call_static_method("jnibridge/test/Echo", "echo", Type::LONG, &[Arg::Long(-5)])
            .unwrap();
        assert_eq!(value, Value::Long(-5));
    }

    #[test]
    fn test_null_receiver_is_misuse() {
        let env = Env::new(MockVm::new());
        let mut obj = ObjectRef::null("java/lang/String");
        let err = obj.call_method(&env, "length", Type::INT, &[]).unwrap_err();
        assert!(matches!(err, BridgeError::ProtocolMisuse(_)));
    }

    #[test]
    fn test_override_consumed_by_failed_call() {
        let env = Env::new(MockVm::new());
        env.precalculate_signature("(I)I");
        let mut obj = ObjectRef::null("java/lang/String");
        assert!(obj.call_method(&env, "length", Type::INT, &[]).is_err());
        assert!(env.take_signature().is_none());
    }

    #[test]
    fn test_primitive_array_result_releases_local() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        let ints = [3, 1, 2];
        let value = env
            .call_static_method(
                "jnibridge/test/Echo",
                "echo",
                Type::INT.array(),
                &[Arg::from(&ints[..])],
            )
            .unwrap();
        assert_eq!(value, Value::Ints(vec![3, 1, 2]));
        assert_eq!(vm.live_local_refs(), 0);
    }

    #[test]
    fn test_refine_generic_receiver() {
        let env = Env::new(MockVm::new());
        let point = env
            .new_object("java/awt/Point", &[Arg::Int(1), Arg::Int(2)])
            .unwrap();
        let mut generic = point.cast(OBJECT_CLASS).to_object_ref();
        generic.refine_class(&env).unwrap();
        assert_eq!(generic.class_name(), "java/awt/Point");
    }
}
