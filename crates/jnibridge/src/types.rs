//! VM type model
//!
//! A [`Type`] is a bitmask holding exactly one base kind, optionally combined
//! with the array bit. [`TypeSpec`] is what callers pass when they state a
//! type explicitly instead of letting it be inferred from a value.

use std::fmt;

use crate::error::{BridgeError, BridgeResult};

/// Class name used for untyped objects and as the carrier of primitive arrays
pub const OBJECT_CLASS: &str = "java/lang/Object";
pub const STRING_CLASS: &str = "java/lang/String";
pub const CLASS_CLASS: &str = "java/lang/Class";

// ============================================================================
// Type
// ============================================================================

/// VM type: one base kind, optionally an array of it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Type(u32);

/// Base kind of a [`Type`], for exhaustive matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Object,
}

const BASE_MASK: u32 = 0x3ff;
const ARRAY_BIT: u32 = 1 << 10;

impl Type {
    pub const VOID: Type = Type(1 << 0);
    pub const BOOLEAN: Type = Type(1 << 1);
    pub const BYTE: Type = Type(1 << 2);
    pub const CHAR: Type = Type(1 << 3);
    pub const SHORT: Type = Type(1 << 4);
    pub const INT: Type = Type(1 << 5);
    pub const LONG: Type = Type(1 << 6);
    pub const FLOAT: Type = Type(1 << 7);
    pub const DOUBLE: Type = Type(1 << 8);
    pub const OBJECT: Type = Type(1 << 9);

    /// Build a type from raw bits, rejecting anything but one base kind plus
    /// an optional array bit
    pub fn from_bits(bits: u32) -> BridgeResult<Type> {
        let base = bits & BASE_MASK;
        if bits & !(BASE_MASK | ARRAY_BIT) != 0 || base.count_ones() != 1 {
            return Err(BridgeError::Marshal(format!("invalid type bits {bits:#x}")));
        }
        Ok(Type(bits))
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// The array-of-this type
    pub const fn array(self) -> Type {
        Type(self.0 | ARRAY_BIT)
    }

    /// The base kind with the array bit cleared
    pub const fn base(self) -> Type {
        Type(self.0 & BASE_MASK)
    }

    pub const fn is_array(self) -> bool {
        self.0 & ARRAY_BIT != 0
    }

    pub fn base_kind(self) -> BaseKind {
        match self.base() {
            Type::VOID => BaseKind::Void,
            Type::BOOLEAN => BaseKind::Boolean,
            Type::BYTE => BaseKind::Byte,
            Type::CHAR => BaseKind::Char,
            Type::SHORT => BaseKind::Short,
            Type::INT => BaseKind::Int,
            Type::LONG => BaseKind::Long,
            Type::FLOAT => BaseKind::Float,
            Type::DOUBLE => BaseKind::Double,
            _ => BaseKind::Object,
        }
    }

    /// Array of a primitive kind, converted to a host vector on return
    pub fn is_primitive_array(self) -> bool {
        self.is_array() && !matches!(self.base_kind(), BaseKind::Object | BaseKind::Void)
    }

    /// Returned as a handle rather than a host value
    pub fn is_reference(self) -> bool {
        self.is_array() || self.base_kind() == BaseKind::Object
    }

    fn base_name(self) -> &'static str {
        match self.base_kind() {
            BaseKind::Void => "void",
            BaseKind::Boolean => "boolean",
            BaseKind::Byte => "byte",
            BaseKind::Char => "char",
            BaseKind::Short => "short",
            BaseKind::Int => "int",
            BaseKind::Long => "long",
            BaseKind::Float => "float",
            BaseKind::Double => "double",
            BaseKind::Object => "object",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())?;
        if self.is_array() {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({self})")
    }
}

// ============================================================================
// Primitive Table
// ============================================================================

/// Host primitive shapes understood without any capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    /// Pointer-width host integer, narrowed to `int`
    NativeInt,
    Long,
    Float,
    Double,
}

/// Host primitive to VM base kind, indexed by `Primitive as usize`.
pub static PRIMITIVES: [(Primitive, Type); 9] = [
    (Primitive::Boolean, Type::BOOLEAN),
    (Primitive::Byte, Type::BYTE),
    (Primitive::Char, Type::CHAR),
    (Primitive::Short, Type::SHORT),
    (Primitive::Int, Type::INT),
    (Primitive::NativeInt, Type::INT),
    (Primitive::Long, Type::LONG),
    (Primitive::Float, Type::FLOAT),
    (Primitive::Double, Type::DOUBLE),
];

impl Primitive {
    pub fn java_type(self) -> Type {
        PRIMITIVES[self as usize].1
    }
}

// ============================================================================
// TypeSpec
// ============================================================================

/// An explicitly stated VM type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    /// A bare type; object kinds default to `java/lang/Object`
    Type(Type),
    /// An object of the given slash-separated class
    Object(String),
    /// An array whose elements are of the given class
    ObjectArray(String),
}

impl TypeSpec {
    pub fn object(class: impl Into<String>) -> Self {
        TypeSpec::Object(class.into())
    }

    pub fn object_array(class: impl Into<String>) -> Self {
        TypeSpec::ObjectArray(class.into())
    }
}

impl From<Type> for TypeSpec {
    fn from(ty: Type) -> Self {
        TypeSpec::Type(ty)
    }
}

impl From<&str> for TypeSpec {
    fn from(class: &str) -> Self {
        TypeSpec::Object(class.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(class: String) -> Self {
        TypeSpec::Object(class)
    }
}

impl From<&TypeSpec> for TypeSpec {
    fn from(spec: &TypeSpec) -> Self {
        spec.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bits_validates() {
        assert_eq!(Type::from_bits(Type::INT.bits()).unwrap(), Type::INT);
        assert_eq!(
            Type::from_bits(Type::BYTE.array().bits()).unwrap(),
            Type::BYTE.array()
        );
        assert!(Type::from_bits(0).is_err());
        assert!(Type::from_bits(Type::INT.bits() | Type::LONG.bits()).is_err());
        assert!(Type::from_bits(1 << 11).is_err());
        assert!(Type::from_bits(1 << 10).is_err());
    }

    #[test]
    fn test_array_bit_is_orthogonal() {
        let t = Type::DOUBLE.array();
        assert!(t.is_array());
        assert_eq!(t.base(), Type::DOUBLE);
        assert_eq!(t.base_kind(), BaseKind::Double);
        assert!(t.is_primitive_array());
        assert!(!Type::OBJECT.array().is_primitive_array());
        assert!(Type::OBJECT.array().is_reference());
        assert!(!Type::LONG.is_reference());
    }

    #[test]
    fn test_primitive_table_order() {
        for (i, (primitive, _)) in PRIMITIVES.iter().enumerate() {
            assert_eq!(*primitive as usize, i);
        }
        assert_eq!(Primitive::NativeInt.java_type(), Type::INT);
        assert_eq!(Primitive::Char.java_type(), Type::CHAR);
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::INT.to_string(), "int");
        assert_eq!(Type::BOOLEAN.array().to_string(), "boolean[]");
    }
}
