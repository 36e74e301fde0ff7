//! Host-side argument and return values
//!
//! [`Arg`] is the closed set of host shapes a call accepts: primitive scalars,
//! primitive slices, objects described by a capability, values converted
//! through [`ToJava`], and bare type descriptors. [`Value`] is what comes back.

use std::fmt;

use crate::convert::ToJava;
use crate::error::{BridgeError, BridgeResult};
use crate::object::{JavaObject, ObjectRef, TypedObject};
use crate::types::{Primitive, TypeSpec};

// ============================================================================
// Arguments
// ============================================================================

/// A call argument
#[derive(Clone, Copy)]
pub enum Arg<'a> {
    Boolean(bool),
    Byte(u8),
    Char(u16),
    Short(i16),
    Int(i32),
    /// Narrowed to a 32-bit `int` by truncation
    NativeInt(isize),
    Long(i64),
    Float(f32),
    Double(f64),

    Booleans(&'a [bool]),
    Bytes(&'a [u8]),
    SignedBytes(&'a [i8]),
    Chars(&'a [u16]),
    Shorts(&'a [i16]),
    Ints(&'a [i32]),
    NativeInts(&'a [isize]),
    Longs(&'a [i64]),
    Floats(&'a [f32]),
    Doubles(&'a [f64]),

    /// An object described by its class name and array-ness
    Object(&'a dyn JavaObject),
    /// An object that declares its own VM type
    Typed(&'a dyn TypedObject),
    /// Host text, passed as a new `java/lang/String`
    Str(&'a str),
    /// A host value converted to a VM object for the duration of the call
    Convert(&'a dyn ToJava),
    /// A type descriptor with no value; only valid where a signature is
    /// built without a call, e.g. native method registration
    Type(&'a TypeSpec),
}

impl Arg<'_> {
    /// Primitive table key for scalars and slices
    pub(crate) fn primitive(&self) -> Option<(Primitive, bool)> {
        let entry = match self {
            Arg::Boolean(_) => (Primitive::Boolean, false),
            Arg::Byte(_) => (Primitive::Byte, false),
            Arg::Char(_) => (Primitive::Char, false),
            Arg::Short(_) => (Primitive::Short, false),
            Arg::Int(_) => (Primitive::Int, false),
            Arg::NativeInt(_) => (Primitive::NativeInt, false),
            Arg::Long(_) => (Primitive::Long, false),
            Arg::Float(_) => (Primitive::Float, false),
            Arg::Double(_) => (Primitive::Double, false),
            Arg::Booleans(_) => (Primitive::Boolean, true),
            Arg::Bytes(_) | Arg::SignedBytes(_) => (Primitive::Byte, true),
            Arg::Chars(_) => (Primitive::Char, true),
            Arg::Shorts(_) => (Primitive::Short, true),
            Arg::Ints(_) => (Primitive::Int, true),
            Arg::NativeInts(_) => (Primitive::NativeInt, true),
            Arg::Longs(_) => (Primitive::Long, true),
            Arg::Floats(_) => (Primitive::Float, true),
            Arg::Doubles(_) => (Primitive::Double, true),
            _ => return None,
        };
        Some(entry)
    }
}

impl fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Boolean(v) => write!(f, "Boolean({v})"),
            Arg::Byte(v) => write!(f, "Byte({v})"),
            Arg::Char(v) => write!(f, "Char({v})"),
            Arg::Short(v) => write!(f, "Short({v})"),
            Arg::Int(v) => write!(f, "Int({v})"),
            Arg::NativeInt(v) => write!(f, "NativeInt({v})"),
            Arg::Long(v) => write!(f, "Long({v})"),
            Arg::Float(v) => write!(f, "Float({v})"),
            Arg::Double(v) => write!(f, "Double({v})"),
            Arg::Booleans(v) => write!(f, "Booleans(len={})", v.len()),
            Arg::Bytes(v) => write!(f, "Bytes(len={})", v.len()),
            Arg::SignedBytes(v) => write!(f, "SignedBytes(len={})", v.len()),
            Arg::Chars(v) => write!(f, "Chars(len={})", v.len()),
            Arg::Shorts(v) => write!(f, "Shorts(len={})", v.len()),
            Arg::Ints(v) => write!(f, "Ints(len={})", v.len()),
            Arg::NativeInts(v) => write!(f, "NativeInts(len={})", v.len()),
            Arg::Longs(v) => write!(f, "Longs(len={})", v.len()),
            Arg::Floats(v) => write!(f, "Floats(len={})", v.len()),
            Arg::Doubles(v) => write!(f, "Doubles(len={})", v.len()),
            Arg::Object(o) => write!(f, "Object({})", o.class_name()),
            Arg::Typed(t) => write!(f, "Typed({})", t.java_type()),
            Arg::Str(s) => write!(f, "Str({s:?})"),
            Arg::Convert(c) => write!(f, "Convert({:?})", c.java_spec()),
            Arg::Type(spec) => write!(f, "Type({spec:?})"),
        }
    }
}

macro_rules! arg_from {
    ($($ty:ty => $variant:ident;)*) => {$(
        impl<'a> From<$ty> for Arg<'a> {
            fn from(v: $ty) -> Self {
                Arg::$variant(v)
            }
        }
    )*};
}

arg_from! {
    bool => Boolean;
    u8 => Byte;
    u16 => Char;
    i16 => Short;
    i32 => Int;
    isize => NativeInt;
    i64 => Long;
    f32 => Float;
    f64 => Double;
    &'a [bool] => Booleans;
    &'a [u8] => Bytes;
    &'a [i8] => SignedBytes;
    &'a [u16] => Chars;
    &'a [i16] => Shorts;
    &'a [i32] => Ints;
    &'a [isize] => NativeInts;
    &'a [i64] => Longs;
    &'a [f32] => Floats;
    &'a [f64] => Doubles;
    &'a str => Str;
    &'a TypeSpec => Type;
}

impl<'a> From<i8> for Arg<'a> {
    fn from(v: i8) -> Self {
        Arg::Byte(v as u8)
    }
}

impl<'a> From<&'a ObjectRef> for Arg<'a> {
    fn from(obj: &'a ObjectRef) -> Self {
        Arg::Object(obj)
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(s: &'a String) -> Self {
        Arg::Str(s)
    }
}

// ============================================================================
// Return Values
// ============================================================================

/// A value returned by a call or field read
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    Boolean(bool),
    Byte(u8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Objects and object arrays; null primitive arrays also come back here
    Object(ObjectRef),
    Booleans(Vec<bool>),
    Bytes(Vec<u8>),
    Chars(Vec<u16>),
    Shorts(Vec<i16>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Boolean(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Char(_) => "char",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Object(_) => "object",
            Value::Booleans(_) => "boolean[]",
            Value::Bytes(_) => "byte[]",
            Value::Chars(_) => "char[]",
            Value::Shorts(_) => "short[]",
            Value::Ints(_) => "int[]",
            Value::Longs(_) => "long[]",
            Value::Floats(_) => "float[]",
            Value::Doubles(_) => "double[]",
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Extract a host value of the requested type
    pub fn get<T>(self) -> BridgeResult<T>
    where
        T: TryFrom<Value, Error = BridgeError>,
    {
        T::try_from(self)
    }

    pub fn into_object(self) -> BridgeResult<ObjectRef> {
        self.get()
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

macro_rules! value_try_from {
    ($($ty:ty => $variant:ident, $name:literal;)*) => {$(
        impl TryFrom<Value> for $ty {
            type Error = BridgeError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(BridgeError::UnexpectedType {
                        expected: $name,
                        found: other.kind_name(),
                    }),
                }
            }
        }
    )*};
}

value_try_from! {
    bool => Boolean, "boolean";
    u8 => Byte, "byte";
    u16 => Char, "char";
    i16 => Short, "short";
    i32 => Int, "int";
    i64 => Long, "long";
    f32 => Float, "float";
    f64 => Double, "double";
    ObjectRef => Object, "object";
    Vec<bool> => Booleans, "boolean[]";
    Vec<u8> => Bytes, "byte[]";
    Vec<u16> => Chars, "char[]";
    Vec<i16> => Shorts, "short[]";
    Vec<i32> => Ints, "int[]";
    Vec<i64> => Longs, "long[]";
    Vec<f32> => Floats, "float[]";
    Vec<f64> => Doubles, "double[]";
}

impl TryFrom<Value> for () {
    type Error = BridgeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Void => Ok(()),
            other => Err(BridgeError::UnexpectedType {
                expected: "void",
                found: other.kind_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_extraction() {
        assert_eq!(Value::Int(7).get::<i32>().unwrap(), 7);
        assert_eq!(
            Value::Bytes(b"hi".to_vec()).get::<Vec<u8>>().unwrap(),
            b"hi".to_vec()
        );
        assert!(Value::Void.get::<()>().is_ok());
    }

    #[test]
    fn test_value_wrong_type() {
        let err = Value::Long(1).get::<i32>().unwrap_err();
        assert_eq!(
            err,
            BridgeError::UnexpectedType {
                expected: "int",
                found: "long"
            }
        );
    }

    #[test]
    fn test_arg_primitive_keys() {
        assert_eq!(Arg::from(3isize).primitive(), Some((Primitive::NativeInt, false)));
        let ints = [1, 2];
        assert_eq!(Arg::from(&ints[..]).primitive(), Some((Primitive::Int, true)));
        assert_eq!(Arg::from("x").primitive(), None);
    }
}
