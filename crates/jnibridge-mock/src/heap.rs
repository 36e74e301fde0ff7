//! Heap, class table and reference tables of the in-memory VM
//!
//! Objects are never collected. References are separate tokens that point at
//! heap objects, so deleting or invalidating a reference never touches the
//! object itself. This mirrors how a real VM behaves from the native side.

use std::ffi::c_void;

use jnibridge_sdk::{
    jboolean, jbyte, jchar, jdouble, jfloat, jint, jlong, jshort, JObject, JValue,
};
use rustc_hash::FxHashMap;

pub type ObjId = usize;
pub type ClassId = usize;

/// `java/lang/Object` is always installed first.
pub const OBJECT_CLASS: ClassId = 0;

/// Native body of a mock method. `this` is `None` for static methods.
/// `Err` carries the thrown exception object.
pub type Body = fn(&mut State, Option<ObjId>, &[Slot]) -> Result<Slot, ObjId>;

// ============================================================================
// Values
// ============================================================================

/// A VM-side value held in a field, an argument or a return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    Void,
    Z(jboolean),
    B(jbyte),
    C(jchar),
    S(jshort),
    I(jint),
    J(jlong),
    F(jfloat),
    D(jdouble),
    L(Option<ObjId>),
}

impl Slot {
    /// Default value for a descriptor code
    pub fn zero(code: char) -> Slot {
        match code {
            'V' => Slot::Void,
            'Z' => Slot::Z(0),
            'B' => Slot::B(0),
            'C' => Slot::C(0),
            'S' => Slot::S(0),
            'I' => Slot::I(0),
            'J' => Slot::J(0),
            'F' => Slot::F(0.0),
            'D' => Slot::D(0.0),
            _ => Slot::L(None),
        }
    }

    pub fn object(self) -> Option<ObjId> {
        match self {
            Slot::L(obj) => obj,
            _ => None,
        }
    }

    /// Widen any integral or floating value
    pub fn int(self) -> i64 {
        match self {
            Slot::Z(v) => v as i64,
            Slot::B(v) => v as i64,
            Slot::C(v) => v as i64,
            Slot::S(v) => v as i64,
            Slot::I(v) => v as i64,
            Slot::J(v) => v,
            Slot::F(v) => v as i64,
            Slot::D(v) => v as i64,
            Slot::Void | Slot::L(_) => 0,
        }
    }

    pub fn float(self) -> f64 {
        match self {
            Slot::F(v) => v as f64,
            Slot::D(v) => v,
            other => other.int() as f64,
        }
    }
}

/// Backing storage of an array object
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Z(Vec<jboolean>),
    B(Vec<jbyte>),
    C(Vec<jchar>),
    S(Vec<jshort>),
    I(Vec<jint>),
    J(Vec<jlong>),
    F(Vec<jfloat>),
    D(Vec<jdouble>),
    L(Vec<Option<ObjId>>),
}

fn pinned_copy<T: Copy>(src: &[T]) -> Vec<T> {
    // at least one slot of capacity so every pinned buffer has a unique address
    let mut out = Vec::with_capacity(src.len().max(1));
    out.extend_from_slice(src);
    out
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Z(v) => v.len(),
            ArrayData::B(v) => v.len(),
            ArrayData::C(v) => v.len(),
            ArrayData::S(v) => v.len(),
            ArrayData::I(v) => v.len(),
            ArrayData::J(v) => v.len(),
            ArrayData::F(v) => v.len(),
            ArrayData::D(v) => v.len(),
            ArrayData::L(v) => v.len(),
        }
    }

    /// Copy into a freshly allocated buffer with a stable address
    pub fn pinned(&self) -> ArrayData {
        match self {
            ArrayData::Z(v) => ArrayData::Z(pinned_copy(v)),
            ArrayData::B(v) => ArrayData::B(pinned_copy(v)),
            ArrayData::C(v) => ArrayData::C(pinned_copy(v)),
            ArrayData::S(v) => ArrayData::S(pinned_copy(v)),
            ArrayData::I(v) => ArrayData::I(pinned_copy(v)),
            ArrayData::J(v) => ArrayData::J(pinned_copy(v)),
            ArrayData::F(v) => ArrayData::F(pinned_copy(v)),
            ArrayData::D(v) => ArrayData::D(pinned_copy(v)),
            ArrayData::L(v) => ArrayData::L(pinned_copy(v)),
        }
    }

    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        match self {
            ArrayData::Z(v) => v.as_mut_ptr().cast(),
            ArrayData::B(v) => v.as_mut_ptr().cast(),
            ArrayData::C(v) => v.as_mut_ptr().cast(),
            ArrayData::S(v) => v.as_mut_ptr().cast(),
            ArrayData::I(v) => v.as_mut_ptr().cast(),
            ArrayData::J(v) => v.as_mut_ptr().cast(),
            ArrayData::F(v) => v.as_mut_ptr().cast(),
            ArrayData::D(v) => v.as_mut_ptr().cast(),
            ArrayData::L(v) => v.as_mut_ptr().cast(),
        }
    }
}

/// Primitive element types with a matching `ArrayData` variant
pub trait Element: Copy + Default + 'static {
    const DESCRIPTOR: &'static str;
    fn wrap(v: Vec<Self>) -> ArrayData;
    fn view(data: &ArrayData) -> Option<&Vec<Self>>;
    fn view_mut(data: &mut ArrayData) -> Option<&mut Vec<Self>>;
}

macro_rules! element {
    ($($ty:ty => $variant:ident, $desc:literal;)*) => {$(
        impl Element for $ty {
            const DESCRIPTOR: &'static str = $desc;

            fn wrap(v: Vec<Self>) -> ArrayData {
                ArrayData::$variant(v)
            }

            fn view(data: &ArrayData) -> Option<&Vec<Self>> {
                match data {
                    ArrayData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn view_mut(data: &mut ArrayData) -> Option<&mut Vec<Self>> {
                match data {
                    ArrayData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    )*};
}

element! {
    jboolean => Z, "[Z";
    jbyte => B, "[B";
    jchar => C, "[C";
    jshort => S, "[S";
    jint => I, "[I";
    jlong => J, "[J";
    jfloat => F, "[F";
    jdouble => D, "[D";
}

// ============================================================================
// Objects and Classes
// ============================================================================

#[derive(Debug, Clone)]
pub struct TraceElement {
    pub class: String,
    pub method: String,
    pub file: Option<String>,
    pub line: i32,
    pub native: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ThrowableData {
    pub message: Option<String>,
    pub cause: Option<ObjId>,
    pub trace: Vec<TraceElement>,
}

#[derive(Debug, Clone)]
pub enum Data {
    Plain,
    Str(String),
    Mirror(ClassId),
    Array(ArrayData),
    Throwable(ThrowableData),
    TraceElement(TraceElement),
    List(Vec<Option<ObjId>>),
}

#[derive(Debug)]
pub struct Object {
    pub class: ClassId,
    pub data: Data,
    pub fields: FxHashMap<usize, Slot>,
}

#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub super_class: Option<ClassId>,
    /// Invisible to `FindClass`, reachable only through a class loader
    pub hidden: bool,
    pub mirror: Option<ObjId>,
    pub methods: FxHashMap<(String, String), usize>,
    pub fields: FxHashMap<(String, String), usize>,
}

pub struct MethodDef {
    pub name: String,
    pub sig: String,
    pub is_static: bool,
    pub params: Vec<char>,
    pub body: Body,
}

pub struct FieldDef {
    pub code: char,
    pub is_static: bool,
}

/// Parameter codes and return code of a method descriptor. Every array or
/// class type collapses to `L`.
pub fn parse_method_sig(sig: &str) -> (Vec<char>, char) {
    let mut params = Vec::new();
    let mut chars = sig.chars().skip_while(|c| *c == '(').peekable();
    while let Some(c) = chars.next() {
        match c {
            ')' => break,
            '[' => {
                while chars.peek() == Some(&'[') {
                    chars.next();
                }
                if chars.next() == Some('L') {
                    for c in chars.by_ref() {
                        if c == ';' {
                            break;
                        }
                    }
                }
                params.push('L');
            }
            'L' => {
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                }
                params.push('L');
            }
            other => params.push(other),
        }
    }
    let ret = match chars.next() {
        Some('[') | Some('L') => 'L',
        Some(code) => code,
        None => 'V',
    };
    (params, ret)
}

fn field_code(sig: &str) -> char {
    match sig.chars().next() {
        Some('[') | Some('L') | None => 'L',
        Some(code) => code,
    }
}

/// Descriptor of the array class whose elements are `element`
pub fn array_descriptor(element: &str) -> String {
    if element.starts_with('[') {
        format!("[{element}")
    } else {
        format!("[L{element};")
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug)]
enum RefKind {
    Local(usize),
    Global,
}

#[derive(Debug)]
struct RefEntry {
    obj: ObjId,
    kind: RefKind,
}

/// Observations recorded for test assertions
#[derive(Debug, Default)]
pub struct Counters {
    pub find_class: FxHashMap<String, usize>,
    pub pending_violations: usize,
    pub critical_violations: usize,
    pub critical_acquisitions: usize,
    pub release_modes: Vec<jint>,
    pub described: Vec<String>,
}

pub struct State {
    pub vm_id: usize,
    pub classes: Vec<ClassDef>,
    class_index: FxHashMap<String, ClassId>,
    pub methods: Vec<MethodDef>,
    pub fields: Vec<FieldDef>,
    pub statics: FxHashMap<usize, Slot>,
    objects: Vec<Object>,
    refs: FxHashMap<usize, RefEntry>,
    frames: Vec<Vec<usize>>,
    next_ref: usize,
    pub pending: Option<ObjId>,
    pub app_loader: Option<ObjId>,
    pub pinned: FxHashMap<usize, (ObjId, ArrayData)>,
    pub critical: FxHashMap<usize, (ObjId, ArrayData)>,
    pub natives: FxHashMap<(String, String, String), usize>,
    pub counters: Counters,
}

impl State {
    pub fn new(vm_id: usize) -> Self {
        let mut state = State {
            vm_id,
            classes: Vec::new(),
            class_index: FxHashMap::default(),
            methods: Vec::new(),
            fields: Vec::new(),
            statics: FxHashMap::default(),
            objects: Vec::new(),
            refs: FxHashMap::default(),
            frames: vec![Vec::new()],
            next_ref: 0x1000,
            pending: None,
            app_loader: None,
            pinned: FxHashMap::default(),
            critical: FxHashMap::default(),
            natives: FxHashMap::default(),
            counters: Counters::default(),
        };
        crate::classes::install(&mut state);
        state
    }

    // ------------------------------------------------------------------------
    // Class table
    // ------------------------------------------------------------------------

    pub fn define_class(&mut self, name: &str, super_name: Option<&str>) -> ClassId {
        let super_class = super_name.and_then(|n| self.class_index.get(n).copied());
        let id = self.classes.len();
        self.classes.push(ClassDef {
            name: name.to_string(),
            super_class,
            hidden: false,
            mirror: None,
            methods: FxHashMap::default(),
            fields: FxHashMap::default(),
        });
        self.class_index.insert(name.to_string(), id);
        id
    }

    pub fn add_method(
        &mut self,
        class: ClassId,
        name: &str,
        sig: &str,
        is_static: bool,
        body: Body,
    ) -> usize {
        let (params, _) = parse_method_sig(sig);
        let id = self.methods.len();
        self.methods.push(MethodDef {
            name: name.to_string(),
            sig: sig.to_string(),
            is_static,
            params,
            body,
        });
        self.classes[class]
            .methods
            .insert((name.to_string(), sig.to_string()), id);
        id
    }

    pub fn add_field(
        &mut self,
        class: ClassId,
        name: &str,
        sig: &str,
        initial: Option<Slot>,
    ) -> usize {
        let id = self.fields.len();
        self.fields.push(FieldDef {
            code: field_code(sig),
            is_static: initial.is_some(),
        });
        if let Some(value) = initial {
            self.statics.insert(id, value);
        }
        self.classes[class]
            .fields
            .insert((name.to_string(), sig.to_string()), id);
        id
    }

    pub fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_index.get(name).copied()
    }

    /// Resolve a class by name, materializing array classes on demand
    pub fn resolve_class(&mut self, name: &str) -> Option<ClassId> {
        if name.starts_with('[') {
            Some(self.array_class(name))
        } else {
            self.lookup_class(name)
        }
    }

    pub fn array_class(&mut self, descriptor: &str) -> ClassId {
        match self.lookup_class(descriptor) {
            Some(id) => id,
            None => self.define_class(descriptor, Some("java/lang/Object")),
        }
    }

    pub fn class_or_object(&self, name: &str) -> ClassId {
        self.lookup_class(name).unwrap_or(OBJECT_CLASS)
    }

    pub fn mirror(&mut self, class: ClassId) -> ObjId {
        if let Some(mirror) = self.classes[class].mirror {
            return mirror;
        }
        let class_class = self.class_or_object("java/lang/Class");
        let mirror = self.alloc(class_class, Data::Mirror(class));
        self.classes[class].mirror = Some(mirror);
        mirror
    }

    /// Class represented by a `java/lang/Class` object
    pub fn mirrored_class(&self, obj: ObjId) -> Option<ClassId> {
        match self.objects[obj].data {
            Data::Mirror(class) => Some(class),
            _ => None,
        }
    }

    pub fn is_subclass(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut current = Some(class);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.classes[c].super_class;
        }
        false
    }

    pub fn find_method(&self, class: ClassId, name: &str, sig: &str) -> Option<usize> {
        let key = (name.to_string(), sig.to_string());
        let mut current = Some(class);
        while let Some(c) = current {
            if let Some(id) = self.classes[c].methods.get(&key) {
                return Some(*id);
            }
            current = self.classes[c].super_class;
        }
        None
    }

    pub fn find_field(&self, class: ClassId, name: &str, sig: &str) -> Option<usize> {
        let key = (name.to_string(), sig.to_string());
        let mut current = Some(class);
        while let Some(c) = current {
            if let Some(id) = self.classes[c].fields.get(&key) {
                return Some(*id);
            }
            current = self.classes[c].super_class;
        }
        None
    }

    pub fn dotted_name(&self, class: ClassId) -> String {
        self.classes[class].name.replace('/', ".")
    }

    // ------------------------------------------------------------------------
    // Heap
    // ------------------------------------------------------------------------

    pub fn alloc(&mut self, class: ClassId, data: Data) -> ObjId {
        let id = self.objects.len();
        self.objects.push(Object {
            class,
            data,
            fields: FxHashMap::default(),
        });
        id
    }

    pub fn object(&self, id: ObjId) -> &Object {
        &self.objects[id]
    }

    pub fn object_mut(&mut self, id: ObjId) -> &mut Object {
        &mut self.objects[id]
    }

    pub fn class_of(&self, id: ObjId) -> ClassId {
        self.objects[id].class
    }

    pub fn new_string(&mut self, s: &str) -> ObjId {
        let class = self.class_or_object("java/lang/String");
        self.alloc(class, Data::Str(s.to_string()))
    }

    pub fn string(&self, id: ObjId) -> Option<&str> {
        match &self.objects[id].data {
            Data::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn new_array(&mut self, descriptor: &str, data: ArrayData) -> ObjId {
        let class = self.array_class(descriptor);
        self.alloc(class, Data::Array(data))
    }

    pub fn array(&self, id: ObjId) -> Option<&ArrayData> {
        match &self.objects[id].data {
            Data::Array(data) => Some(data),
            _ => None,
        }
    }

    pub fn array_mut(&mut self, id: ObjId) -> Option<&mut ArrayData> {
        match &mut self.objects[id].data {
            Data::Array(data) => Some(data),
            _ => None,
        }
    }

    pub fn get_field(&self, obj: ObjId, field: usize) -> Slot {
        let code = self.fields[field].code;
        self.objects[obj]
            .fields
            .get(&field)
            .copied()
            .unwrap_or_else(|| Slot::zero(code))
    }

    pub fn set_field(&mut self, obj: ObjId, field: usize, value: Slot) {
        self.objects[obj].fields.insert(field, value);
    }

    // ------------------------------------------------------------------------
    // Exceptions
    // ------------------------------------------------------------------------

    pub fn synthetic_trace(&self, class: ClassId) -> Vec<TraceElement> {
        vec![
            TraceElement {
                class: self.dotted_name(class),
                method: "<init>".to_string(),
                file: Some("MockVm.java".to_string()),
                line: 42,
                native: false,
            },
            TraceElement {
                class: "java.lang.Thread".to_string(),
                method: "run".to_string(),
                file: Some("Thread.java".to_string()),
                line: 750,
                native: false,
            },
        ]
    }

    /// Build a throwable of the given class
    pub fn throw(&mut self, class_name: &str, message: Option<String>, cause: Option<ObjId>) -> ObjId {
        let class = self.class_or_object(class_name);
        let trace = self.synthetic_trace(class);
        self.alloc(
            class,
            Data::Throwable(ThrowableData {
                message,
                cause,
                trace,
            }),
        )
    }

    pub fn throwable(&self, id: ObjId) -> Option<&ThrowableData> {
        match &self.objects[id].data {
            Data::Throwable(t) => Some(t),
            _ => None,
        }
    }

    /// `Throwable.toString()` text
    pub fn throwable_string(&self, id: ObjId) -> String {
        let name = self.dotted_name(self.class_of(id));
        match self.throwable(id).and_then(|t| t.message.as_deref()) {
            Some(message) => format!("{name}: {message}"),
            None => name,
        }
    }

    /// `printStackTrace()` text including causes
    pub fn describe(&self, id: ObjId) -> String {
        let mut out = String::new();
        let mut current = Some(id);
        let mut first = true;
        let mut seen = Vec::new();
        while let Some(exc) = current {
            if seen.contains(&exc) {
                out.push_str(&format!("[CIRCULAR REFERENCE: {}]\n", self.throwable_string(exc)));
                break;
            }
            seen.push(exc);
            if !first {
                out.push_str("Caused by: ");
            }
            out.push_str(&self.throwable_string(exc));
            out.push('\n');
            if let Some(t) = self.throwable(exc) {
                for element in &t.trace {
                    out.push_str(&format!(
                        "\tat {}.{}({}:{})\n",
                        element.class,
                        element.method,
                        element.file.as_deref().unwrap_or("Unknown Source"),
                        element.line
                    ));
                }
            }
            current = self.throwable(exc).and_then(|t| t.cause);
            first = false;
        }
        out
    }

    // ------------------------------------------------------------------------
    // References
    // ------------------------------------------------------------------------

    fn next_token(&mut self) -> usize {
        let token = self.next_ref;
        self.next_ref += 8;
        token
    }

    pub fn new_local(&mut self, obj: Option<ObjId>) -> JObject {
        let Some(obj) = obj else {
            return JObject::NULL;
        };
        let token = self.next_token();
        let frame = self.frames.len() - 1;
        self.frames[frame].push(token);
        self.refs.insert(
            token,
            RefEntry {
                obj,
                kind: RefKind::Local(frame),
            },
        );
        JObject::from_raw(token)
    }

    pub fn new_global(&mut self, obj: Option<ObjId>) -> JObject {
        let Some(obj) = obj else {
            return JObject::NULL;
        };
        let token = self.next_token();
        self.refs.insert(
            token,
            RefEntry {
                obj,
                kind: RefKind::Global,
            },
        );
        JObject::from_raw(token)
    }

    pub fn deref(&self, r: JObject) -> Option<ObjId> {
        self.refs.get(&r.into_raw()).map(|entry| entry.obj)
    }

    pub fn delete_local(&mut self, r: JObject) {
        let token = r.into_raw();
        if let Some(RefEntry {
            kind: RefKind::Local(frame),
            ..
        }) = self.refs.get(&token)
        {
            let frame = *frame;
            self.refs.remove(&token);
            self.frames[frame].retain(|t| *t != token);
        }
    }

    pub fn delete_global(&mut self, r: JObject) {
        let token = r.into_raw();
        if matches!(
            self.refs.get(&token),
            Some(RefEntry {
                kind: RefKind::Global,
                ..
            })
        ) {
            self.refs.remove(&token);
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Pop the top frame; `None` when only the base frame is left
    pub fn pop_frame(&mut self, result: JObject) -> Option<JObject> {
        if self.frames.len() <= 1 {
            return None;
        }
        let keep = self.deref(result);
        if let Some(tokens) = self.frames.pop() {
            for token in tokens {
                self.refs.remove(&token);
            }
        }
        Some(self.new_local(keep))
    }

    pub fn live_locals(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }

    pub fn live_globals(&self) -> usize {
        self.refs
            .values()
            .filter(|entry| matches!(entry.kind, RefKind::Global))
            .count()
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len() - 1
    }

    // ------------------------------------------------------------------------
    // Invocation
    // ------------------------------------------------------------------------

    fn slot_from(&self, code: char, value: &JValue) -> Slot {
        // SAFETY: the descriptor code selects the member the caller wrote.
        unsafe {
            match code {
                'Z' => Slot::Z(value.z),
                'B' => Slot::B(value.b),
                'C' => Slot::C(value.c),
                'S' => Slot::S(value.s),
                'I' => Slot::I(value.i),
                'J' => Slot::J(value.j),
                'F' => Slot::F(value.f),
                'D' => Slot::D(value.d),
                _ => Slot::L(self.deref(value.l)),
            }
        }
    }

    /// Run a method body. Virtual dispatch looks the method up again from the
    /// receiver's runtime class.
    pub fn invoke(
        &mut self,
        method: usize,
        this: Option<ObjId>,
        args: &[JValue],
        virtual_dispatch: bool,
    ) -> Result<Slot, ObjId> {
        let Some(def) = self.methods.get(method) else {
            return Err(self.throw(
                "java/lang/NoSuchMethodError",
                Some("invalid method id".to_string()),
                None,
            ));
        };
        let (mut body, is_static) = (def.body, def.is_static);
        let (name, sig, params) = (def.name.clone(), def.sig.clone(), def.params.clone());
        if !is_static && this.is_none() {
            return Err(self.throw("java/lang/NullPointerException", None, None));
        }
        if virtual_dispatch {
            if let Some(receiver) = this {
                let runtime = self.class_of(receiver);
                if let Some(overridden) = self.find_method(runtime, &name, &sig) {
                    body = self.methods[overridden].body;
                }
            }
        }
        if args.len() < params.len() {
            return Err(self.throw(
                "java/lang/IllegalArgumentException",
                Some(format!("expected {} arguments, got {}", params.len(), args.len())),
                None,
            ));
        }
        let slots: Vec<Slot> = params
            .iter()
            .zip(args)
            .map(|(code, value)| self.slot_from(*code, value))
            .collect();
        body(self, this, &slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method_sig() {
        let (params, ret) = parse_method_sig("(IZ[BLjava/lang/String;[[Ljava/lang/Object;J)V");
        assert_eq!(params, vec!['I', 'Z', 'L', 'L', 'L', 'J']);
        assert_eq!(ret, 'V');

        let (params, ret) = parse_method_sig("()[I");
        assert!(params.is_empty());
        assert_eq!(ret, 'L');
    }

    #[test]
    fn test_pop_frame_invalidates_locals() {
        let mut st = State::new(1);
        let a = st.new_string("a");
        let b = st.new_string("b");
        st.push_frame();
        let ra = st.new_local(Some(a));
        let rb = st.new_local(Some(b));
        let promoted = st.pop_frame(rb).unwrap();
        assert!(st.deref(ra).is_none());
        assert!(st.deref(rb).is_none());
        assert_eq!(st.deref(promoted), Some(b));
        assert!(st.pop_frame(JObject::NULL).is_none());
    }

    #[test]
    fn test_throwable_string() {
        let mut st = State::new(1);
        let cause = st.throw("java/lang/ClassNotFoundException", Some("a.B".into()), None);
        let exc = st.throw("java/lang/NoClassDefFoundError", Some("a/B".into()), Some(cause));
        assert_eq!(st.throwable_string(exc), "java.lang.NoClassDefFoundError: a/B");
        assert!(st.describe(exc).contains("Caused by: java.lang.ClassNotFoundException: a.B"));
    }
}
