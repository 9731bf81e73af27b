//! Marshal value types.
//!
//! Compound values (strings, arrays, hashes, objects, custom objects) are
//! shared handles: the decoder reserves an object-table slot before the
//! children are decoded, so a back-reference can resolve to a value that is
//! still being built. This is what makes genuinely self-referential graphs
//! representable; identity of two handles is checked with `Rc::ptr_eq`.

use std::any::Any;
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// Encoding assumed for byte strings with no encoding ivar.
pub const DEFAULT_ENCODING: &str = "utf8";

/// Ordered name → value mapping used for object fields and ivars.
pub type Fields = IndexMap<String, Value>;

/// An interned symbol name.
///
/// Back-references resolve to clones of the same interned string; external
/// equality is by name only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// A byte string with an attached encoding name.
///
/// The bytes are never transcoded; the encoding is metadata recorded from
/// the stream's ivars (or [`DEFAULT_ENCODING`] when absent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubyString {
    pub bytes: Vec<u8>,
    pub encoding: String,
}

impl RubyString {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            encoding: DEFAULT_ENCODING.to_owned(),
        }
    }

    /// The string content as UTF-8 text, with invalid sequences replaced.
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl Default for RubyString {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// An ordered sequence of values, plus any generically attached ivars.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RubyArray {
    pub elements: Vec<Value>,
    pub ivars: Fields,
}

impl RubyArray {
    pub fn new(elements: Vec<Value>) -> Self {
        Self {
            elements,
            ivars: Fields::new(),
        }
    }
}

/// A key → value mapping with insertion order preserved.
///
/// Keys are arbitrary values, so lookup is a linear scan; inserting an
/// existing key replaces the value in place without reordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RubyHash {
    entries: Vec<(Value, Value)>,
    pub ivars: Fields,
}

impl RubyHash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: Value, value: Value) {
        if let Some((_, v)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            *v = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }
}

/// A generic object: class name plus an ordered field map.
///
/// Field names come from the stream as `@name` symbols; the leading `@` is
/// stripped. Ivars attached via an `I` wrapper are kept separately.
#[derive(Debug, Clone, PartialEq)]
pub struct RubyObject {
    pub class_name: Symbol,
    pub fields: Fields,
    pub ivars: Fields,
}

impl RubyObject {
    pub fn new(class_name: Symbol) -> Self {
        Self {
            class_name,
            fields: Fields::new(),
            ivars: Fields::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// The output of a registered custom decoder.
///
/// Implemented automatically for any `Any + Debug` type.
pub trait CustomValue: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug> CustomValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A decoded user-defined object: the original class name plus the opaque
/// value produced by the registered decoder.
#[derive(Debug)]
pub struct CustomObject {
    class_name: Symbol,
    value: Box<dyn CustomValue>,
}

impl CustomObject {
    pub fn new(class_name: Symbol, value: Box<dyn CustomValue>) -> Self {
        Self { class_name, value }
    }

    pub fn class_name(&self) -> &Symbol {
        &self.class_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        // as_ref, not auto-deref: the blanket impl also covers the Box
        // itself, which would make every downcast miss.
        self.value.as_ref().as_any().downcast_ref()
    }
}

/// A value decoded from a Marshal stream.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Symbol(Symbol),
    String(Rc<RefCell<RubyString>>),
    Array(Rc<RefCell<RubyArray>>),
    Hash(Rc<RefCell<RubyHash>>),
    Object(Rc<RefCell<RubyObject>>),
    Custom(Rc<CustomObject>),
}

impl Value {
    pub fn string(s: RubyString) -> Self {
        Self::String(Rc::new(RefCell::new(s)))
    }

    pub fn array(elements: Vec<Value>) -> Self {
        Self::Array(Rc::new(RefCell::new(RubyArray::new(elements))))
    }

    pub fn hash(h: RubyHash) -> Self {
        Self::Hash(Rc::new(RefCell::new(h)))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&Rc<RefCell<RubyString>>> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Rc<RefCell<RubyArray>>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&Rc<RefCell<RubyHash>>> {
        match self {
            Self::Hash(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Rc<RefCell<RubyObject>>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&Rc<CustomObject>> {
        match self {
            Self::Custom(c) => Some(c),
            _ => None,
        }
    }

    /// A one-level description for diagnostics: scalars and strings render
    /// their value, compounds their shape or class name only. Never
    /// recurses into children, so it terminates on cyclic graphs where
    /// `Display` would not.
    pub fn describe(&self) -> String {
        match self {
            Self::Array(a) => format!("array of {}", a.borrow().elements.len()),
            Self::Hash(h) => format!("hash of {}", h.borrow().len()),
            other => other.to_string(),
        }
    }
}

/// Scalars compare structurally; compound handles compare by identity
/// first, then by content. Custom objects compare by identity only, since
/// their payload is opaque. Comparing a cyclic graph to a distinct cyclic
/// graph does not terminate; identity checks on the handles do.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::String(a), Self::String(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Hash(a), Self::Hash(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Custom(a), Self::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Renders in Ruby inspect style. Recurses into array and hash children
/// and so does not terminate on cyclic graphs, which decoded values can
/// legitimately be; use [`Value::describe`] for a cycle-safe summary.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Symbol(s) => write!(f, "{s}"),
            Self::String(s) => write!(f, "\"{}\"", s.borrow().to_text()),
            Self::Array(a) => {
                write!(f, "[")?;
                for (i, item) in a.borrow().elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Hash(h) => {
                write!(f, "{{")?;
                for (i, (k, v)) in h.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} => {v}")?;
                }
                write!(f, "}}")
            }
            Self::Object(o) => write!(f, "#<{}>", o.borrow().class_name.name()),
            Self::Custom(c) => write!(f, "#<{}>", c.class_name().name()),
        }
    }
}

// -- Convenience conversions --

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(RubyString::new(s.as_bytes().to_vec()))
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Self::Symbol(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::array(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_equality_is_by_name() {
        assert_eq!(Symbol::new("title"), Symbol::new("title"));
        assert_ne!(Symbol::new("title"), Symbol::new("name"));
    }

    #[test]
    fn hash_insert_replaces_in_place() {
        let mut h = RubyHash::new();
        h.insert(Value::from(1), Value::from("a"));
        h.insert(Value::from(2), Value::from("b"));
        h.insert(Value::from(1), Value::from("c"));
        assert_eq!(h.len(), 2);
        let keys: Vec<_> = h.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![Value::from(1), Value::from(2)]);
        assert_eq!(h.get(&Value::from(1)), Some(&Value::from("c")));
    }

    #[test]
    fn string_equality_is_structural() {
        assert_eq!(Value::from("abc"), Value::from("abc"));
        assert_ne!(Value::from("abc"), Value::from("abd"));
    }

    #[test]
    fn shared_handles_compare_by_identity() {
        let a = Value::array(vec![Value::Nil]);
        let b = a.clone();
        match (&a, &b) {
            (Value::Array(x), Value::Array(y)) => assert!(Rc::ptr_eq(x, y)),
            _ => unreachable!(),
        }
        assert_eq!(a, b);
    }

    #[test]
    fn custom_downcast() {
        #[derive(Debug)]
        struct Marker(u32);
        let c = CustomObject::new(Symbol::new("Marker"), Box::new(Marker(7)));
        assert_eq!(c.downcast_ref::<Marker>().unwrap().0, 7);
        assert!(c.downcast_ref::<String>().is_none());
    }

    #[test]
    fn describe_is_shallow_on_cyclic_graphs() {
        let v = Value::array(vec![Value::Integer(1)]);
        if let Value::Array(rc) = &v {
            let this = v.clone();
            rc.borrow_mut().elements.push(this);
        }
        assert_eq!(v.describe(), "array of 2");
        assert_eq!(Value::Integer(3).describe(), "3");
        assert_eq!(Value::Bool(false).describe(), "false");
    }

    #[test]
    fn display_renders_ruby_style() {
        let mut h = RubyHash::new();
        h.insert(Value::from(Symbol::new("id")), Value::from(3));
        let v = Value::array(vec![Value::Nil, Value::from(true), Value::hash(h)]);
        assert_eq!(v.to_string(), "[nil, true, {:id => 3}]");
    }
}
