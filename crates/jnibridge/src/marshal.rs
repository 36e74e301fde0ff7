//! Argument marshaling
//!
//! Turns a list of [`Arg`]s into the signature parameter list and the packed
//! `jvalue` buffer for one call. Conversions and primitive slices create VM
//! objects along the way; those are held as temporaries and deleted when the
//! [`PreparedArgs`] drops.

use jnibridge_sdk::{to_jboolean, JObject, JValue};

use crate::array::to_java_array;
use crate::buffer::ArgBuffer;
use crate::convert::new_java_string;
use crate::env::Env;
use crate::error::{BridgeError, BridgeResult};
use crate::object::AsJObject;
use crate::refs::LocalRefs;
use crate::resolve::{type_of_arg, type_of_spec, Resolved};
use crate::signature::method_signature;
use crate::types::{Type, STRING_CLASS};
use crate::value::Arg;

enum Prepared<'a> {
    Arg(Arg<'a>),
    /// A VM object created from a host value, owned by the temporaries
    Converted(JObject),
}

/// Arguments ready for signature synthesis and buffer construction
pub struct PreparedArgs<'a, 'e> {
    items: Vec<Prepared<'a>>,
    types: Vec<Resolved>,
    temps: LocalRefs<'e>,
}

impl<'a, 'e> PreparedArgs<'a, 'e> {
    /// Resolve every argument's type and run host-to-VM conversions
    pub fn prepare(env: &'e Env, args: &[Arg<'a>]) -> BridgeResult<Self> {
        let mut prepared = PreparedArgs {
            items: Vec::with_capacity(args.len()),
            types: Vec::with_capacity(args.len()),
            temps: LocalRefs::new(env),
        };
        for arg in args {
            let (item, resolved) = match arg {
                Arg::Str(text) => {
                    let obj = new_java_string(env, text)?;
                    let handle = prepared.temps.push(obj.into_handle());
                    (Prepared::Converted(handle), (Type::OBJECT, STRING_CLASS.to_string()))
                }
                Arg::Convert(value) => {
                    let resolved = type_of_spec(&value.java_spec())?;
                    let obj = value.to_java(env)?;
                    let handle = prepared.temps.push(obj.into_handle());
                    (Prepared::Converted(handle), resolved)
                }
                Arg::Type(spec) => {
                    return Err(BridgeError::Marshal(format!(
                        "type descriptor {spec:?} used where a value is required"
                    )))
                }
                other => (Prepared::Arg(*other), type_of_arg(other)?),
            };
            prepared.items.push(item);
            prepared.types.push(resolved);
        }
        Ok(prepared)
    }

    pub fn types(&self) -> &[Resolved] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Method descriptor for these parameters and the given return type
    pub fn signature(&self, ret: &Resolved) -> String {
        method_signature(ret.0, &ret.1, &self.types)
    }

    /// Pack one `jvalue` per argument
    pub fn build(&mut self, env: &Env) -> BridgeResult<ArgBuffer> {
        let temps = &mut self.temps;
        let mut slots = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let slot = match item {
                Prepared::Converted(handle) => JValue { l: *handle },
                Prepared::Arg(arg) => match *arg {
                    Arg::Boolean(v) => JValue { z: to_jboolean(v) },
                    Arg::Byte(v) => JValue { b: v as i8 },
                    Arg::Char(v) => JValue { c: v },
                    Arg::Short(v) => JValue { s: v },
                    Arg::Int(v) => JValue { i: v },
                    Arg::NativeInt(v) => JValue { i: v as i32 },
                    Arg::Long(v) => JValue { j: v },
                    Arg::Float(v) => JValue { f: v },
                    Arg::Double(v) => JValue { d: v },
                    Arg::Booleans(v) => array_slot(temps, to_java_array(env, v)?),
                    Arg::Bytes(v) => array_slot(temps, to_java_array(env, v)?),
                    Arg::SignedBytes(v) => array_slot(temps, to_java_array(env, v)?),
                    Arg::Chars(v) => array_slot(temps, to_java_array(env, v)?),
                    Arg::Shorts(v) => array_slot(temps, to_java_array(env, v)?),
                    Arg::Ints(v) => array_slot(temps, to_java_array(env, v)?),
                    Arg::NativeInts(v) => array_slot(temps, to_java_array(env, v)?),
                    Arg::Longs(v) => array_slot(temps, to_java_array(env, v)?),
                    Arg::Floats(v) => array_slot(temps, to_java_array(env, v)?),
                    Arg::Doubles(v) => array_slot(temps, to_java_array(env, v)?),
                    Arg::Object(obj) => JValue { l: obj.as_jobject() },
                    Arg::Typed(obj) => JValue { l: obj.as_jobject() },
                    Arg::Str(_) | Arg::Convert(_) | Arg::Type(_) => {
                        return Err(BridgeError::Marshal(format!(
                            "argument {arg:?} was not prepared"
                        )))
                    }
                },
            };
            slots.push(slot);
        }
        Ok(ArgBuffer::from_slots(slots))
    }
}

fn array_slot(temps: &mut LocalRefs<'_>, array: JObject) -> JValue {
    JValue {
        l: temps.push(array),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectRef;
    use crate::types::{TypeSpec, OBJECT_CLASS};
    use jnibridge_mock::MockVm;

    #[test]
    fn test_signature_from_args() {
        let env = Env::new(MockVm::new());
        let point = ObjectRef::null("java/awt/Point");
        let prepared =
            PreparedArgs::prepare(&env, &[Arg::Int(1), Arg::from(true), Arg::from(&point)]).unwrap();
        let ret = (Type::OBJECT, STRING_CLASS.to_string());
        assert_eq!(
            prepared.signature(&ret),
            "(IZLjava/awt/Point;)Ljava/lang/String;"
        );
    }

    #[test]
    fn test_temporaries_released_on_drop() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        let ints = [1, 2, 3];
        {
            let mut prepared =
                PreparedArgs::prepare(&env, &[Arg::Str("hi"), Arg::from(&ints[..])]).unwrap();
            let buffer = prepared.build(&env).unwrap();
            assert_eq!(buffer.len(), 2);
            assert_eq!(vm.live_local_refs(), 2);
        }
        assert_eq!(vm.live_local_refs(), 0);
    }

    #[test]
    fn test_type_descriptor_is_not_a_value() {
        let env = Env::new(MockVm::new());
        let spec = TypeSpec::object(OBJECT_CLASS);
        let err = PreparedArgs::prepare(&env, &[Arg::Type(&spec)]).err();
        assert!(matches!(err, Some(BridgeError::Marshal(_))));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_native_int_is_narrowed() {
        let env = Env::new(MockVm::new());
        let mut prepared = PreparedArgs::prepare(&env, &[Arg::NativeInt((1 << 32) + 7)]).unwrap();
        assert_eq!(prepared.types()[0].0, Type::INT);
        let buffer = prepared.build(&env).unwrap();
        assert_eq!(unsafe { buffer.as_slice()[0].i }, 7);
    }
}
