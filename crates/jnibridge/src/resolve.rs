//! Type resolution
//!
//! Maps explicit [`TypeSpec`]s and host [`Arg`]s to a VM [`Type`] plus the
//! class name that goes into the signature. Capabilities win over the
//! primitive table, and the primitive table wins over treating a value as a
//! plain object.

use crate::error::{BridgeError, BridgeResult};
use crate::types::{Type, TypeSpec, OBJECT_CLASS, STRING_CLASS};
use crate::value::Arg;

/// A resolved type and the class name carried with it
pub type Resolved = (Type, String);

/// Resolve an explicitly stated type
pub fn type_of_spec(spec: &TypeSpec) -> BridgeResult<Resolved> {
    match spec {
        TypeSpec::Type(ty) => {
            // re-validate: the bits may come from anywhere
            let ty = Type::from_bits(ty.bits())?;
            Ok((ty, OBJECT_CLASS.to_string()))
        }
        TypeSpec::Object(class) => Ok((Type::OBJECT, class.clone())),
        TypeSpec::ObjectArray(class) => Ok((Type::OBJECT.array(), class.clone())),
    }
}

/// Resolve the VM type of an argument
pub fn type_of_arg(arg: &Arg<'_>) -> BridgeResult<Resolved> {
    match arg {
        Arg::Typed(typed) => Ok((typed.java_type(), OBJECT_CLASS.to_string())),
        Arg::Object(obj) => {
            let ty = if obj.is_array() {
                Type::OBJECT.array()
            } else {
                Type::OBJECT
            };
            Ok((ty, obj.class_name().to_string()))
        }
        Arg::Convert(conv) => type_of_spec(&conv.java_spec()),
        Arg::Type(spec) => type_of_spec(spec),
        Arg::Str(_) => Ok((Type::OBJECT, STRING_CLASS.to_string())),
        other => match other.primitive() {
            Some((primitive, slice)) => {
                let base = primitive.java_type();
                let ty = if slice { base.array() } else { base };
                Ok((ty, OBJECT_CLASS.to_string()))
            }
            None => Err(BridgeError::Marshal(format!(
                "no VM type for argument {other:?}"
            ))),
        },
    }
}

/// Resolve every argument, failing on the first one without a mapping
pub fn types_of_args(args: &[Arg<'_>]) -> BridgeResult<Vec<Resolved>> {
    args.iter().map(type_of_arg).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectRef;

    #[test]
    fn test_spec_defaults_to_object_class() {
        assert_eq!(
            type_of_spec(&TypeSpec::Type(Type::OBJECT)).unwrap(),
            (Type::OBJECT, OBJECT_CLASS.to_string())
        );
        assert_eq!(
            type_of_spec(&TypeSpec::object_array("java/lang/String")).unwrap(),
            (Type::OBJECT.array(), "java/lang/String".to_string())
        );
    }

    #[test]
    fn test_primitive_args() {
        assert_eq!(type_of_arg(&Arg::Int(1)).unwrap().0, Type::INT);
        assert_eq!(type_of_arg(&Arg::NativeInt(1)).unwrap().0, Type::INT);
        assert_eq!(type_of_arg(&Arg::Char(1)).unwrap().0, Type::CHAR);

        let bytes = [1u8, 2];
        let (ty, class) = type_of_arg(&Arg::from(&bytes[..])).unwrap();
        assert_eq!(ty, Type::BYTE.array());
        assert_eq!(class, OBJECT_CLASS);
    }

    #[test]
    fn test_object_args_use_class_info() {
        let obj = ObjectRef::null("java/awt/Point");
        assert_eq!(
            type_of_arg(&Arg::from(&obj)).unwrap(),
            (Type::OBJECT, "java/awt/Point".to_string())
        );

        let arr = ObjectRef::new_array(jnibridge_sdk::JObject::NULL, "java/lang/String");
        assert_eq!(type_of_arg(&Arg::from(&arr)).unwrap().0, Type::OBJECT.array());
        assert_eq!(
            type_of_arg(&Arg::Str("x")).unwrap().1,
            STRING_CLASS.to_string()
        );
    }
}
