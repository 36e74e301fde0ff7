//! Built-in class library of the mock VM
//!
//! A small slice of `java.lang`, `java.util` and `java.awt`, plus fixture
//! classes under `jnibridge/test/` used by the bridge's integration tests.

use crate::heap::{
    array_descriptor, ArrayData, Data, ObjId, Slot, State, ThrowableData, OBJECT_CLASS,
};

type Outcome = Result<Slot, ObjId>;

// ============================================================================
// Helpers
// ============================================================================

fn npe(st: &mut State) -> ObjId {
    st.throw("java/lang/NullPointerException", None, None)
}

fn receiver(st: &mut State, this: Option<ObjId>) -> Result<ObjId, ObjId> {
    this.ok_or_else(|| npe(st))
}

fn string_arg(st: &mut State, arg: Slot) -> Result<String, ObjId> {
    match arg.object().and_then(|obj| st.string(obj).map(str::to_owned)) {
        Some(s) => Ok(s),
        None => Err(npe(st)),
    }
}

fn this_string(st: &mut State, this: Option<ObjId>) -> Result<String, ObjId> {
    let this = receiver(st, this)?;
    Ok(st.string(this).unwrap_or_default().to_string())
}

fn bytes_arg(st: &mut State, arg: Slot) -> Result<Vec<u8>, ObjId> {
    match arg.object().and_then(|obj| st.array(obj)) {
        Some(ArrayData::B(bytes)) => Ok(bytes.iter().map(|b| *b as u8).collect()),
        _ => Err(npe(st)),
    }
}

fn return_string(st: &mut State, s: &str) -> Outcome {
    Ok(Slot::L(Some(st.new_string(s))))
}

fn return_optional_string(st: &mut State, s: Option<String>) -> Outcome {
    match s {
        Some(s) => return_string(st, &s),
        None => Ok(Slot::L(None)),
    }
}

fn return_bytes(st: &mut State, s: &str) -> Outcome {
    let bytes = s.bytes().map(|b| b as i8).collect();
    Ok(Slot::L(Some(st.new_array("[B", ArrayData::B(bytes)))))
}

fn check_charset(st: &mut State, charset: &str) -> Result<(), ObjId> {
    if charset.eq_ignore_ascii_case("UTF-8") || charset.eq_ignore_ascii_case("UTF8") {
        Ok(())
    } else {
        Err(st.throw(
            "java/io/UnsupportedEncodingException",
            Some(charset.to_string()),
            None,
        ))
    }
}

fn set_throwable(st: &mut State, this: ObjId, message: Option<String>, cause: Option<ObjId>) {
    let trace = st.synthetic_trace(st.class_of(this));
    st.object_mut(this).data = Data::Throwable(ThrowableData {
        message,
        cause,
        trace,
    });
}

// ============================================================================
// java.lang.Object / Class / ClassLoader
// ============================================================================

fn noop(_: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    Ok(Slot::Void)
}

fn object_hash_code(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    Ok(Slot::I(this as i32))
}

fn object_get_class(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let class = st.class_of(this);
    Ok(Slot::L(Some(st.mirror(class))))
}

fn object_to_string(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let text = format!("{}@{:x}", st.dotted_name(st.class_of(this)), this);
    return_string(st, &text)
}

fn object_equals(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let other = args[0].object();
    let equal = match (st.string(this), other.and_then(|o| st.string(o))) {
        (Some(a), Some(b)) => a == b,
        _ => other == Some(this),
    };
    Ok(Slot::Z(equal as u8))
}

fn class_get_name(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    match st.mirrored_class(this) {
        Some(class) => {
            let name = st.dotted_name(class);
            return_string(st, &name)
        }
        None => Err(npe(st)),
    }
}

fn class_get_class_loader(st: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    Ok(Slot::L(st.app_loader))
}

fn loader_find_class(st: &mut State, _: Option<ObjId>, args: &[Slot]) -> Outcome {
    let name = string_arg(st, args[0])?;
    match st.resolve_class(&name.replace('.', "/")) {
        Some(class) => Ok(Slot::L(Some(st.mirror(class)))),
        None => Err(st.throw("java/lang/ClassNotFoundException", Some(name), None)),
    }
}

// ============================================================================
// java.lang.String
// ============================================================================

fn string_init(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    st.object_mut(this).data = Data::Str(String::new());
    Ok(Slot::Void)
}

fn string_init_bytes(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let bytes = bytes_arg(st, args[0])?;
    st.object_mut(this).data = Data::Str(String::from_utf8_lossy(&bytes).into_owned());
    Ok(Slot::Void)
}

fn string_init_bytes_charset(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let charset = string_arg(st, args[1])?;
    check_charset(st, &charset)?;
    string_init_bytes(st, this, args)
}

fn string_init_chars(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let text = match args[0].object().and_then(|obj| st.array(obj)) {
        Some(ArrayData::C(chars)) => String::from_utf16_lossy(chars),
        _ => return Err(npe(st)),
    };
    st.object_mut(this).data = Data::Str(text);
    Ok(Slot::Void)
}

fn string_concat(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let mut text = this_string(st, this)?;
    text.push_str(&string_arg(st, args[0])?);
    return_string(st, &text)
}

fn string_get_bytes(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let text = this_string(st, this)?;
    return_bytes(st, &text)
}

fn string_get_bytes_charset(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let charset = string_arg(st, args[0])?;
    check_charset(st, &charset)?;
    string_get_bytes(st, this, args)
}

fn string_length(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let text = this_string(st, this)?;
    Ok(Slot::I(text.encode_utf16().count() as i32))
}

fn string_is_empty(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let text = this_string(st, this)?;
    Ok(Slot::Z(text.is_empty() as u8))
}

fn string_char_at(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let text = this_string(st, this)?;
    let index = args[0].int();
    match usize::try_from(index)
        .ok()
        .and_then(|i| text.encode_utf16().nth(i))
    {
        Some(unit) => Ok(Slot::C(unit)),
        None => Err(st.throw(
            "java/lang/StringIndexOutOfBoundsException",
            Some(format!("index {index}, length {}", text.len())),
            None,
        )),
    }
}

fn string_substring(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let text = this_string(st, this)?;
    let chars: Vec<char> = text.chars().collect();
    let (begin, end) = (args[0].int(), args[1].int());
    if begin < 0 || end > chars.len() as i64 || begin > end {
        return Err(st.throw(
            "java/lang/StringIndexOutOfBoundsException",
            Some(format!("begin {begin}, end {end}, length {}", chars.len())),
            None,
        ));
    }
    let sub: String = chars[begin as usize..end as usize].iter().collect();
    return_string(st, &sub)
}

fn string_ends_with(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let text = this_string(st, this)?;
    let suffix = string_arg(st, args[0])?;
    Ok(Slot::Z(text.ends_with(&suffix) as u8))
}

fn string_to_string(_: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    Ok(Slot::L(this))
}

// ============================================================================
// java.lang.Throwable / StackTraceElement
// ============================================================================

fn throwable_init(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    set_throwable(st, this, None, None);
    Ok(Slot::Void)
}

fn throwable_init_message(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let message = args[0].object().and_then(|o| st.string(o)).map(str::to_owned);
    set_throwable(st, this, message, None);
    Ok(Slot::Void)
}

fn throwable_init_message_cause(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let message = args[0].object().and_then(|o| st.string(o)).map(str::to_owned);
    set_throwable(st, this, message, args[1].object());
    Ok(Slot::Void)
}

fn throwable_get_message(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let message = st.throwable(this).and_then(|t| t.message.clone());
    return_optional_string(st, message)
}

fn throwable_to_string(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let text = st.throwable_string(this);
    return_string(st, &text)
}

fn throwable_get_cause(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    Ok(Slot::L(st.throwable(this).and_then(|t| t.cause)))
}

fn throwable_get_stack_trace(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let trace = st.throwable(this).map(|t| t.trace.clone()).unwrap_or_default();
    let element_class = st.class_or_object("java/lang/StackTraceElement");
    let elements = trace
        .into_iter()
        .map(|element| Some(st.alloc(element_class, Data::TraceElement(element))))
        .collect();
    let descriptor = array_descriptor("java/lang/StackTraceElement");
    Ok(Slot::L(Some(st.new_array(&descriptor, ArrayData::L(elements)))))
}

fn trace_element(
    st: &mut State,
    this: Option<ObjId>,
) -> Result<crate::heap::TraceElement, ObjId> {
    let this = receiver(st, this)?;
    match &st.object(this).data {
        Data::TraceElement(element) => Ok(element.clone()),
        _ => Err(npe(st)),
    }
}

fn ste_get_class_name(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let element = trace_element(st, this)?;
    return_string(st, &element.class)
}

fn ste_get_method_name(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let element = trace_element(st, this)?;
    return_string(st, &element.method)
}

fn ste_get_file_name(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let element = trace_element(st, this)?;
    return_optional_string(st, element.file)
}

fn ste_get_line_number(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let element = trace_element(st, this)?;
    Ok(Slot::I(element.line))
}

fn ste_is_native_method(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let element = trace_element(st, this)?;
    Ok(Slot::Z(element.native as u8))
}

fn ste_to_string(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let element = trace_element(st, this)?;
    let text = format!(
        "{}.{}({}:{})",
        element.class,
        element.method,
        element.file.as_deref().unwrap_or("Unknown Source"),
        element.line
    );
    return_string(st, &text)
}

// ============================================================================
// java.lang.System
// ============================================================================

fn system_get_property(st: &mut State, _: Option<ObjId>, args: &[Slot]) -> Outcome {
    let key = string_arg(st, args[0])?;
    let value = match key.as_str() {
        "java.version" => Some("17.0.2"),
        "file.encoding" => Some("UTF-8"),
        "java.vendor" => Some("jnibridge mock"),
        _ => None,
    };
    return_optional_string(st, value.map(str::to_owned))
}

// ============================================================================
// java.util.ArrayList
// ============================================================================

fn list_init(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    st.object_mut(this).data = Data::List(Vec::new());
    Ok(Slot::Void)
}

fn list_add(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    match &mut st.object_mut(this).data {
        Data::List(items) => {
            items.push(args[0].object());
            Ok(Slot::Z(1))
        }
        _ => Err(npe(st)),
    }
}

fn list_get(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let index = args[0].int();
    let item = match &st.object(this).data {
        Data::List(items) => usize::try_from(index).ok().and_then(|i| items.get(i).copied()),
        _ => None,
    };
    match item {
        Some(item) => Ok(Slot::L(item)),
        None => Err(st.throw(
            "java/lang/IndexOutOfBoundsException",
            Some(format!("Index: {index}")),
            None,
        )),
    }
}

fn list_size(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    match &st.object(this).data {
        Data::List(items) => Ok(Slot::I(items.len() as i32)),
        _ => Ok(Slot::I(0)),
    }
}

// ============================================================================
// java.awt.Point
// ============================================================================

fn point_fields(st: &State, this: ObjId) -> (Option<usize>, Option<usize>) {
    let class = st.class_of(this);
    (st.find_field(class, "x", "I"), st.find_field(class, "y", "I"))
}

fn point_init_xy(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    if let (Some(x), Some(y)) = point_fields(st, this) {
        st.set_field(this, x, args[0]);
        st.set_field(this, y, args[1]);
    }
    Ok(Slot::Void)
}

fn point_translate(st: &mut State, this: Option<ObjId>, args: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    if let (Some(x), Some(y)) = point_fields(st, this) {
        let nx = st.get_field(this, x).int() + args[0].int();
        let ny = st.get_field(this, y).int() + args[1].int();
        st.set_field(this, x, Slot::I(nx as i32));
        st.set_field(this, y, Slot::I(ny as i32));
    }
    Ok(Slot::Void)
}

fn point_get_x(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let x = point_fields(st, this).0.map(|x| st.get_field(this, x).float());
    Ok(Slot::D(x.unwrap_or_default()))
}

fn point_get_y(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let y = point_fields(st, this).1.map(|y| st.get_field(this, y).float());
    Ok(Slot::D(y.unwrap_or_default()))
}

fn point_to_string(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let text = match point_fields(st, this) {
        (Some(x), Some(y)) => format!(
            "java.awt.Point[x={},y={}]",
            st.get_field(this, x).int(),
            st.get_field(this, y).int()
        ),
        _ => "java.awt.Point".to_string(),
    };
    return_string(st, &text)
}

// ============================================================================
// Test fixtures
// ============================================================================

fn echo_value(_: &mut State, _: Option<ObjId>, args: &[Slot]) -> Outcome {
    Ok(args[0])
}

fn echo_array(st: &mut State, _: Option<ObjId>, args: &[Slot]) -> Outcome {
    let Some(source) = args[0].object() else {
        return Ok(Slot::L(None));
    };
    let class = st.class_of(source);
    match st.array(source).cloned() {
        Some(data) => Ok(Slot::L(Some(st.alloc(class, Data::Array(data))))),
        None => Err(st.throw(
            "java/lang/ClassCastException",
            Some("not an array".to_string()),
            None,
        )),
    }
}

fn echo_sum_ints(st: &mut State, _: Option<ObjId>, args: &[Slot]) -> Outcome {
    match args[0].object().and_then(|obj| st.array(obj)) {
        Some(ArrayData::I(values)) => Ok(Slot::J(values.iter().map(|v| *v as i64).sum())),
        _ => Err(npe(st)),
    }
}

fn echo_join(st: &mut State, _: Option<ObjId>, args: &[Slot]) -> Outcome {
    let strings: Vec<String> = match args[0].object().and_then(|obj| st.array(obj)) {
        Some(ArrayData::L(items)) => items
            .iter()
            .map(|item| item.and_then(|o| st.string(o)).unwrap_or("null").to_string())
            .collect(),
        _ => return Err(npe(st)),
    };
    let separator = string_arg(st, args[1])?;
    return_string(st, &strings.join(&separator))
}

fn echo_words(st: &mut State, _: Option<ObjId>, args: &[Slot]) -> Outcome {
    let text = string_arg(st, args[0])?;
    let words = text
        .split_whitespace()
        .map(|word| Some(st.new_string(word)))
        .collect();
    let descriptor = array_descriptor("java/lang/String");
    Ok(Slot::L(Some(st.new_array(&descriptor, ArrayData::L(words)))))
}

fn base_name(st: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    return_string(st, "base")
}

fn derived_name(st: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    return_string(st, "derived")
}

fn thrower_fail(st: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    let cause = st.throw(
        "java/lang/IllegalStateException",
        Some("inner".to_string()),
        None,
    );
    Err(st.throw("java/lang/RuntimeException", Some("outer".to_string()), Some(cause)))
}

fn thrower_fail_plain(st: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    Err(st.throw(
        "java/lang/IllegalArgumentException",
        Some("bad argument".to_string()),
        None,
    ))
}

fn thrower_fail_broken(st: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    Err(st.throw(
        "jnibridge/test/BrokenException",
        Some("partial".to_string()),
        None,
    ))
}

fn thrower_fail_silent(st: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    Err(st.throw("jnibridge/test/SilentException", None, None))
}

fn thrower_fail_cycle(st: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    let inner = st.throw(
        "java/lang/IllegalStateException",
        Some("second".to_string()),
        None,
    );
    let outer = st.throw("java/lang/RuntimeException", Some("first".to_string()), Some(inner));
    if let Data::Throwable(t) = &mut st.object_mut(inner).data {
        t.cause = Some(outer);
    }
    Err(outer)
}

fn returns_null(_: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    Ok(Slot::L(None))
}

// Introspection methods of `BrokenException` and `BrokenFrame` throw
fn broken_introspection(st: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    Err(st.throw(
        "java/lang/IllegalStateException",
        Some("introspection failed".to_string()),
        None,
    ))
}

fn broken_get_stack_trace(st: &mut State, this: Option<ObjId>, _: &[Slot]) -> Outcome {
    let this = receiver(st, this)?;
    let trace = st.throwable(this).map(|t| t.trace.clone()).unwrap_or_default();
    let broken = st.class_or_object("jnibridge/test/BrokenFrame");
    let plain = st.class_or_object("java/lang/StackTraceElement");
    let elements = trace
        .into_iter()
        .enumerate()
        .map(|(i, element)| {
            let class = if i == 0 { broken } else { plain };
            Some(st.alloc(class, Data::TraceElement(element)))
        })
        .collect();
    let descriptor = array_descriptor("java/lang/StackTraceElement");
    Ok(Slot::L(Some(st.new_array(&descriptor, ArrayData::L(elements)))))
}

fn hidden_greet(st: &mut State, _: Option<ObjId>, _: &[Slot]) -> Outcome {
    return_string(st, "hello from the app loader")
}

// ============================================================================
// Installation
// ============================================================================

const THROWABLES: &[(&str, &str)] = &[
    ("java/lang/Exception", "java/lang/Throwable"),
    ("java/lang/Error", "java/lang/Throwable"),
    ("java/lang/RuntimeException", "java/lang/Exception"),
    ("java/lang/IllegalStateException", "java/lang/RuntimeException"),
    ("java/lang/IllegalArgumentException", "java/lang/RuntimeException"),
    ("java/lang/NullPointerException", "java/lang/RuntimeException"),
    ("java/lang/ClassCastException", "java/lang/RuntimeException"),
    ("java/lang/IndexOutOfBoundsException", "java/lang/RuntimeException"),
    (
        "java/lang/ArrayIndexOutOfBoundsException",
        "java/lang/IndexOutOfBoundsException",
    ),
    (
        "java/lang/StringIndexOutOfBoundsException",
        "java/lang/IndexOutOfBoundsException",
    ),
    ("java/lang/NegativeArraySizeException", "java/lang/RuntimeException"),
    ("java/lang/ReflectiveOperationException", "java/lang/Exception"),
    (
        "java/lang/ClassNotFoundException",
        "java/lang/ReflectiveOperationException",
    ),
    ("java/io/IOException", "java/lang/Exception"),
    ("java/io/UnsupportedEncodingException", "java/io/IOException"),
    ("java/lang/LinkageError", "java/lang/Error"),
    ("java/lang/NoClassDefFoundError", "java/lang/LinkageError"),
    ("java/lang/IncompatibleClassChangeError", "java/lang/LinkageError"),
    ("java/lang/NoSuchMethodError", "java/lang/IncompatibleClassChangeError"),
    ("java/lang/NoSuchFieldError", "java/lang/IncompatibleClassChangeError"),
    ("java/lang/VirtualMachineError", "java/lang/Error"),
    ("java/lang/OutOfMemoryError", "java/lang/VirtualMachineError"),
];

const ECHO_SIGNATURES: &[&str] = &[
    "(Z)Z",
    "(B)B",
    "(C)C",
    "(S)S",
    "(I)I",
    "(J)J",
    "(F)F",
    "(D)D",
    "(Ljava/lang/Object;)Ljava/lang/Object;",
    "(Ljava/lang/String;)Ljava/lang/String;",
];

const ECHO_ARRAY_SIGNATURES: &[&str] = &[
    "([Z)[Z",
    "([B)[B",
    "([C)[C",
    "([S)[S",
    "([I)[I",
    "([J)[J",
    "([F)[F",
    "([D)[D",
    "([Ljava/lang/String;)[Ljava/lang/String;",
];

const FIELD_KINDS: &[(&str, &str, Slot)] = &[
    ("flag", "Z", Slot::Z(0)),
    ("octet", "B", Slot::B(0)),
    ("letter", "C", Slot::C(0)),
    ("small", "S", Slot::S(0)),
    ("count", "I", Slot::I(0)),
    ("big", "J", Slot::J(0)),
    ("ratio", "F", Slot::F(0.0)),
    ("precise", "D", Slot::D(0.0)),
    ("label", "Ljava/lang/String;", Slot::L(None)),
    ("data", "[I", Slot::L(None)),
];

pub fn install(st: &mut State) {
    let object = st.define_class("java/lang/Object", None);
    debug_assert_eq!(object, OBJECT_CLASS);
    st.add_method(object, "<init>", "()V", false, noop);
    st.add_method(object, "hashCode", "()I", false, object_hash_code);
    st.add_method(object, "getClass", "()Ljava/lang/Class;", false, object_get_class);
    st.add_method(object, "toString", "()Ljava/lang/String;", false, object_to_string);
    st.add_method(object, "equals", "(Ljava/lang/Object;)Z", false, object_equals);

    let class = st.define_class("java/lang/Class", Some("java/lang/Object"));
    st.add_method(class, "getName", "()Ljava/lang/String;", false, class_get_name);
    st.add_method(
        class,
        "getClassLoader",
        "()Ljava/lang/ClassLoader;",
        false,
        class_get_class_loader,
    );

    let loader = st.define_class("java/lang/ClassLoader", Some("java/lang/Object"));
    st.add_method(
        loader,
        "findClass",
        "(Ljava/lang/String;)Ljava/lang/Class;",
        false,
        loader_find_class,
    );
    st.add_method(
        loader,
        "loadClass",
        "(Ljava/lang/String;)Ljava/lang/Class;",
        false,
        loader_find_class,
    );
    let app_loader = st.alloc(loader, Data::Plain);
    st.app_loader = Some(app_loader);

    let string = st.define_class("java/lang/String", Some("java/lang/Object"));
    st.add_method(string, "<init>", "()V", false, string_init);
    st.add_method(string, "<init>", "([B)V", false, string_init_bytes);
    st.add_method(
        string,
        "<init>",
        "([BLjava/lang/String;)V",
        false,
        string_init_bytes_charset,
    );
    st.add_method(string, "<init>", "([C)V", false, string_init_chars);
    st.add_method(
        string,
        "concat",
        "(Ljava/lang/String;)Ljava/lang/String;",
        false,
        string_concat,
    );
    st.add_method(string, "getBytes", "()[B", false, string_get_bytes);
    st.add_method(
        string,
        "getBytes",
        "(Ljava/lang/String;)[B",
        false,
        string_get_bytes_charset,
    );
    st.add_method(string, "length", "()I", false, string_length);
    st.add_method(string, "isEmpty", "()Z", false, string_is_empty);
    st.add_method(string, "charAt", "(I)C", false, string_char_at);
    st.add_method(
        string,
        "substring",
        "(II)Ljava/lang/String;",
        false,
        string_substring,
    );
    st.add_method(string, "endsWith", "(Ljava/lang/String;)Z", false, string_ends_with);
    st.add_method(string, "toString", "()Ljava/lang/String;", false, string_to_string);

    let throwable = st.define_class("java/lang/Throwable", Some("java/lang/Object"));
    st.add_method(throwable, "<init>", "()V", false, throwable_init);
    st.add_method(
        throwable,
        "<init>",
        "(Ljava/lang/String;)V",
        false,
        throwable_init_message,
    );
    st.add_method(
        throwable,
        "<init>",
        "(Ljava/lang/String;Ljava/lang/Throwable;)V",
        false,
        throwable_init_message_cause,
    );
    st.add_method(
        throwable,
        "getMessage",
        "()Ljava/lang/String;",
        false,
        throwable_get_message,
    );
    st.add_method(
        throwable,
        "getLocalizedMessage",
        "()Ljava/lang/String;",
        false,
        throwable_get_message,
    );
    st.add_method(
        throwable,
        "toString",
        "()Ljava/lang/String;",
        false,
        throwable_to_string,
    );
    st.add_method(
        throwable,
        "getCause",
        "()Ljava/lang/Throwable;",
        false,
        throwable_get_cause,
    );
    st.add_method(
        throwable,
        "getStackTrace",
        "()[Ljava/lang/StackTraceElement;",
        false,
        throwable_get_stack_trace,
    );
    st.add_method(throwable, "printStackTrace", "()V", false, noop);
    for (name, parent) in THROWABLES {
        st.define_class(name, Some(*parent));
    }

    let element = st.define_class("java/lang/StackTraceElement", Some("java/lang/Object"));
    st.add_method(
        element,
        "getClassName",
        "()Ljava/lang/String;",
        false,
        ste_get_class_name,
    );
    st.add_method(
        element,
        "getMethodName",
        "()Ljava/lang/String;",
        false,
        ste_get_method_name,
    );
    st.add_method(
        element,
        "getFileName",
        "()Ljava/lang/String;",
        false,
        ste_get_file_name,
    );
    st.add_method(element, "getLineNumber", "()I", false, ste_get_line_number);
    st.add_method(element, "isNativeMethod", "()Z", false, ste_is_native_method);
    st.add_method(element, "toString", "()Ljava/lang/String;", false, ste_to_string);

    let system = st.define_class("java/lang/System", Some("java/lang/Object"));
    st.add_method(
        system,
        "getProperty",
        "(Ljava/lang/String;)Ljava/lang/String;",
        true,
        system_get_property,
    );

    let list = st.define_class("java/util/ArrayList", Some("java/lang/Object"));
    st.add_method(list, "<init>", "()V", false, list_init);
    st.add_method(list, "add", "(Ljava/lang/Object;)Z", false, list_add);
    st.add_method(list, "get", "(I)Ljava/lang/Object;", false, list_get);
    st.add_method(list, "size", "()I", false, list_size);

    let calendar = st.define_class("java/util/Calendar", Some("java/lang/Object"));
    st.add_field(calendar, "APRIL", "I", Some(Slot::I(3)));

    let point = st.define_class("java/awt/Point", Some("java/lang/Object"));
    st.add_field(point, "x", "I", None);
    st.add_field(point, "y", "I", None);
    st.add_method(point, "<init>", "(II)V", false, point_init_xy);
    st.add_method(point, "translate", "(II)V", false, point_translate);
    st.add_method(point, "getX", "()D", false, point_get_x);
    st.add_method(point, "getY", "()D", false, point_get_y);
    st.add_method(point, "toString", "()Ljava/lang/String;", false, point_to_string);

    let echo = st.define_class("jnibridge/test/Echo", Some("java/lang/Object"));
    for sig in ECHO_SIGNATURES {
        st.add_method(echo, "echo", sig, true, echo_value);
    }
    for sig in ECHO_ARRAY_SIGNATURES {
        st.add_method(echo, "echo", sig, true, echo_array);
    }
    st.add_method(echo, "sum", "([I)J", true, echo_sum_ints);
    st.add_method(
        echo,
        "join",
        "([Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
        true,
        echo_join,
    );
    st.add_method(
        echo,
        "words",
        "(Ljava/lang/String;)[Ljava/lang/String;",
        true,
        echo_words,
    );
    for (name, sig, zero) in FIELD_KINDS {
        st.add_field(echo, name, sig, None);
        st.add_field(echo, &name.to_uppercase(), sig, Some(*zero));
    }

    let base = st.define_class("jnibridge/test/Base", Some("java/lang/Object"));
    st.add_method(base, "name", "()Ljava/lang/String;", false, base_name);
    let derived = st.define_class("jnibridge/test/Derived", Some("jnibridge/test/Base"));
    st.add_method(derived, "name", "()Ljava/lang/String;", false, derived_name);

    let thrower = st.define_class("jnibridge/test/Thrower", Some("java/lang/Object"));
    st.add_method(thrower, "fail", "()V", true, thrower_fail);
    st.add_method(thrower, "failPlain", "()I", true, thrower_fail_plain);
    st.add_method(thrower, "failBroken", "()V", true, thrower_fail_broken);
    st.add_method(thrower, "failCycle", "()V", true, thrower_fail_cycle);
    st.add_method(thrower, "failSilent", "()V", true, thrower_fail_silent);
    st.add_method(
        thrower,
        "returnsNull",
        "()Ljava/lang/Object;",
        true,
        returns_null,
    );

    let broken = st.define_class(
        "jnibridge/test/BrokenException",
        Some("java/lang/RuntimeException"),
    );
    st.add_method(
        broken,
        "getLocalizedMessage",
        "()Ljava/lang/String;",
        false,
        broken_introspection,
    );
    st.add_method(
        broken,
        "getCause",
        "()Ljava/lang/Throwable;",
        false,
        broken_introspection,
    );
    st.add_method(
        broken,
        "getStackTrace",
        "()[Ljava/lang/StackTraceElement;",
        false,
        broken_get_stack_trace,
    );
    let silent = st.define_class(
        "jnibridge/test/SilentException",
        Some("java/lang/RuntimeException"),
    );
    st.add_method(silent, "toString", "()Ljava/lang/String;", false, returns_null);
    let frame = st.define_class(
        "jnibridge/test/BrokenFrame",
        Some("java/lang/StackTraceElement"),
    );
    st.add_method(
        frame,
        "getClassName",
        "()Ljava/lang/String;",
        false,
        broken_introspection,
    );

    let natives = st.define_class("jnibridge/test/Natives", Some("java/lang/Object"));
    st.add_method(natives, "add", "(II)I", true, noop);
    st.add_method(natives, "greet", "(Ljava/lang/String;)V", false, noop);

    let hidden = st.define_class("jnibridge/test/Hidden", Some("java/lang/Object"));
    st.add_method(hidden, "greet", "()Ljava/lang/String;", false, hidden_greet);
    st.classes[hidden].hidden = true;
}
