//! Signature synthesis
//!
//! Produces JNI type descriptors: `(` parameter descriptors `)` return
//! descriptor, with `[` prefixing arrays and `L<class>;` for objects.

use crate::types::{BaseKind, Type};

/// Descriptor code for a base kind
fn base_code(ty: Type, class: &str, out: &mut String) {
    match ty.base_kind() {
        BaseKind::Void => out.push('V'),
        BaseKind::Boolean => out.push('Z'),
        BaseKind::Byte => out.push('B'),
        BaseKind::Char => out.push('C'),
        BaseKind::Short => out.push('S'),
        BaseKind::Int => out.push('I'),
        BaseKind::Long => out.push('J'),
        BaseKind::Float => out.push('F'),
        BaseKind::Double => out.push('D'),
        BaseKind::Object => {
            out.push('L');
            out.push_str(class);
            out.push(';');
        }
    }
}

fn push_type(ty: Type, class: &str, out: &mut String) {
    if ty.is_array() {
        out.push('[');
    }
    base_code(ty, class, out);
}

/// Descriptor of a single type, also used as a field signature
pub fn type_signature(ty: Type, class: &str) -> String {
    let mut out = String::new();
    push_type(ty, class, &mut out);
    out
}

/// Method descriptor from return type and parameter types, in call order
pub fn method_signature<S: AsRef<str>>(ret: Type, ret_class: &str, params: &[(Type, S)]) -> String {
    let mut out = String::from("(");
    for (ty, class) in params {
        push_type(*ty, class.as_ref(), &mut out);
    }
    out.push(')');
    push_type(ret, ret_class, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OBJECT_CLASS;

    #[test]
    fn test_base_codes() {
        let cases = [
            (Type::VOID, "V"),
            (Type::BOOLEAN, "Z"),
            (Type::BYTE, "B"),
            (Type::CHAR, "C"),
            (Type::SHORT, "S"),
            (Type::INT, "I"),
            (Type::LONG, "J"),
            (Type::FLOAT, "F"),
            (Type::DOUBLE, "D"),
            (Type::OBJECT, "Ljava/lang/Object;"),
        ];
        for (ty, expected) in cases {
            assert_eq!(type_signature(ty, OBJECT_CLASS), expected);
            if ty != Type::VOID {
                assert_eq!(type_signature(ty.array(), OBJECT_CLASS), format!("[{expected}"));
            }
        }
    }

    #[test]
    fn test_method_signature() {
        let sig = method_signature(
            Type::OBJECT,
            "java/lang/String",
            &[(Type::INT, OBJECT_CLASS), (Type::BOOLEAN, OBJECT_CLASS)],
        );
        assert_eq!(sig, "(IZ)Ljava/lang/String;");
    }

    #[test]
    fn test_no_params() {
        let params: [(Type, &str); 0] = [];
        assert_eq!(method_signature(Type::BYTE.array(), OBJECT_CLASS, &params), "()[B");
    }

    #[test]
    fn test_object_array_param() {
        let sig = method_signature(
            Type::VOID,
            OBJECT_CLASS,
            &[(Type::OBJECT.array(), "java/lang/String".to_string())],
        );
        assert_eq!(sig, "([Ljava/lang/String;)V");
    }
}
