//! Marshal stream decoding: bytes → `Value`.
//!
//! The dispatcher reads one tag byte and fully consumes that value's
//! encoding before returning. Fresh symbols append to the symbol table;
//! fresh compound values reserve an object-table slot before their children
//! are decoded, so back-references can resolve mid-construction and
//! self-referential graphs decode without recursion on the reference.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cursor::Cursor;
use crate::error::{MarshalError, TagByte};
use crate::fixnum::read_fixnum;
use crate::registry::Registry;
use crate::tag;
use crate::types::{
    CustomObject, Fields, RubyArray, RubyHash, RubyObject, RubyString, Symbol, Value,
    DEFAULT_ENCODING,
};

/// Default nesting depth limit. The reference behavior had no limit and
/// exhausted the stack on adversarial input; exceeding this limit is a
/// `DepthLimit` error instead.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Decodes the root value of a Marshal stream.
pub fn decode(input: &[u8], registry: &Registry) -> Result<Value, MarshalError> {
    Decoder::new(input, registry)?.read_value()
}

/// Decodes one Marshal stream.
///
/// The symbol table, object table, and cursor are exclusively owned by one
/// decoder; only the registry is shared. Construction consumes the two-byte
/// version header.
pub struct Decoder<'a> {
    cursor: Cursor<'a>,
    registry: &'a Registry,
    version: (u8, u8),
    symbols: Vec<Symbol>,
    objects: Vec<Value>,
    depth: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8], registry: &'a Registry) -> Result<Self, MarshalError> {
        let mut cursor = Cursor::new(input);
        let major = cursor.read_u8()?;
        let minor = cursor.read_u8()?;
        Ok(Self {
            cursor,
            registry,
            version: (major, minor),
            symbols: Vec::new(),
            objects: Vec::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The (major, minor) version header. Retained but not validated;
    /// accepting or rejecting versions is the caller's concern.
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Decodes one complete value, recursing for nested values.
    pub fn read_value(&mut self) -> Result<Value, MarshalError> {
        if self.depth >= self.max_depth {
            return Err(MarshalError::DepthLimit {
                offset: self.cursor.position(),
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let value = self.read_tagged();
        self.depth -= 1;
        value
    }

    fn read_tagged(&mut self) -> Result<Value, MarshalError> {
        let offset = self.cursor.position();
        let t = self.cursor.read_u8()?;
        tracing::trace!(tag = %TagByte(t), offset, "dispatching tag");
        match t {
            tag::NIL => Ok(Value::Nil),
            tag::TRUE => Ok(Value::Bool(true)),
            tag::FALSE => Ok(Value::Bool(false)),
            tag::FIXNUM => Ok(Value::Integer(read_fixnum(&mut self.cursor)?)),
            tag::FLOAT => self.read_float(),
            tag::SYMBOL => self.read_symbol().map(Value::Symbol),
            tag::SYMLINK => self.read_symlink().map(Value::Symbol),
            tag::OBJLINK => self.read_objlink(),
            tag::STRING => self.read_string(),
            tag::ARRAY => self.read_array(),
            tag::HASH => self.read_hash(),
            tag::EMPTY_HASH => self.read_empty_hash(),
            tag::OBJECT => self.read_object(),
            tag::IVAR => self.read_ivard(),
            tag::USER_DEFINED => self.read_user_defined(),
            tag::STRUCT
            | tag::USER_CLASS
            | tag::USER_MARSHAL
            | tag::EXTENDED
            | tag::BIGNUM
            | tag::CLASS
            | tag::MODULE
            | tag::CLASS_OR_MODULE
            | tag::DATA
            | tag::REGEXP => Err(MarshalError::UnsupportedTag {
                offset,
                tag: TagByte(t),
                construct: unsupported_construct(t),
            }),
            _ => Err(MarshalError::UnknownTag {
                offset,
                tag: TagByte(t),
            }),
        }
    }

    fn read_symbol(&mut self) -> Result<Symbol, MarshalError> {
        let offset = self.cursor.position();
        let len = read_fixnum(&mut self.cursor)?;
        if len < 0 {
            return Err(MarshalError::SymbolDecode {
                offset,
                reason: format!("length {len} is negative"),
            });
        }
        let bytes = self.cursor.read_exact(len as usize)?;
        let name = std::str::from_utf8(bytes).map_err(|e| MarshalError::SymbolDecode {
            offset,
            reason: format!("invalid UTF-8: {e}"),
        })?;
        let sym = Symbol::new(name);
        self.symbols.push(sym.clone());
        Ok(sym)
    }

    fn read_symlink(&mut self) -> Result<Symbol, MarshalError> {
        let offset = self.cursor.position();
        let index = read_fixnum(&mut self.cursor)?;
        if index < 0 {
            return Err(MarshalError::SymlinkDecode { offset, index });
        }
        // Forward references signal corruption; the table only ever grows.
        self.symbols
            .get(index as usize)
            .cloned()
            .ok_or(MarshalError::SymlinkDecode { offset, index })
    }

    fn read_objlink(&mut self) -> Result<Value, MarshalError> {
        let offset = self.cursor.position();
        let index = read_fixnum(&mut self.cursor)?;
        if index < 0 {
            return Err(MarshalError::ObjlinkDecode { offset, index });
        }
        self.objects
            .get(index as usize)
            .cloned()
            .ok_or(MarshalError::ObjlinkDecode { offset, index })
    }

    fn read_string(&mut self) -> Result<Value, MarshalError> {
        let cell = Rc::new(RefCell::new(RubyString::default()));
        self.objects.push(Value::String(cell.clone()));
        let offset = self.cursor.position();
        let len = read_fixnum(&mut self.cursor)?;
        if len < 0 {
            return Err(MarshalError::NegativeLength {
                offset,
                construct: "byte string",
                len,
            });
        }
        cell.borrow_mut().bytes = self.cursor.read_exact(len as usize)?.to_vec();
        Ok(Value::String(cell))
    }

    fn read_float(&mut self) -> Result<Value, MarshalError> {
        let offset = self.cursor.position();
        let len = read_fixnum(&mut self.cursor)?;
        if len < 0 {
            return Err(MarshalError::NegativeLength {
                offset,
                construct: "float literal",
                len,
            });
        }
        let bytes = self.cursor.read_exact(len as usize)?;
        let text = std::str::from_utf8(bytes).map_err(|e| MarshalError::Decode {
            offset,
            message: format!("float literal is not valid UTF-8: {e}"),
        })?;
        // Ruby writes "inf", "-inf", and "nan" literals; f64 parsing
        // accepts all of them.
        let v: f64 = text.parse().map_err(|e| MarshalError::Decode {
            offset,
            message: format!("invalid float literal {text:?}: {e}"),
        })?;
        let value = Value::Float(v);
        self.objects.push(value.clone());
        Ok(value)
    }

    fn read_array(&mut self) -> Result<Value, MarshalError> {
        let offset = self.cursor.position();
        let len = read_fixnum(&mut self.cursor)?;
        if len < 0 {
            return Err(MarshalError::ArrayDecode { offset, len });
        }
        let cell = Rc::new(RefCell::new(RubyArray::default()));
        self.objects.push(Value::Array(cell.clone()));
        // Capacity is a hint only; oversized declared lengths fail on read.
        let mut elements = Vec::with_capacity((len as usize).min(1 << 16));
        for _ in 0..len {
            elements.push(self.read_value()?);
        }
        cell.borrow_mut().elements = elements;
        Ok(Value::Array(cell))
    }

    fn read_hash(&mut self) -> Result<Value, MarshalError> {
        let cell = Rc::new(RefCell::new(RubyHash::new()));
        self.objects.push(Value::Hash(cell.clone()));
        let offset = self.cursor.position();
        let count = read_fixnum(&mut self.cursor)?;
        if count < 0 {
            return Err(MarshalError::NegativeLength {
                offset,
                construct: "hash entry count",
                len: count,
            });
        }
        let mut entries = RubyHash::new();
        for _ in 0..count {
            let key = self.read_value()?;
            let value = self.read_value()?;
            entries.insert(key, value);
        }
        *cell.borrow_mut() = entries;
        Ok(Value::Hash(cell))
    }

    fn read_empty_hash(&mut self) -> Result<Value, MarshalError> {
        let value = Value::hash(RubyHash::new());
        self.objects.push(value.clone());
        Ok(value)
    }

    fn read_object(&mut self) -> Result<Value, MarshalError> {
        let cell = Rc::new(RefCell::new(RubyObject::new(Symbol::new(""))));
        self.objects.push(Value::Object(cell.clone()));
        let class_name = self.expect_symbol("class name")?;
        let offset = self.cursor.position();
        let count = read_fixnum(&mut self.cursor)?;
        if count < 0 {
            return Err(MarshalError::NegativeLength {
                offset,
                construct: "object field count",
                len: count,
            });
        }
        let mut fields = Fields::new();
        for _ in 0..count {
            let name = self.expect_symbol("field name")?;
            let value = self.read_value()?;
            fields.insert(name.name().trim_start_matches('@').to_owned(), value);
        }
        {
            let mut obj = cell.borrow_mut();
            obj.class_name = class_name;
            obj.fields = fields;
        }
        Ok(Value::Object(cell))
    }

    fn read_ivard(&mut self) -> Result<Value, MarshalError> {
        let inner = self.read_value()?;
        let offset = self.cursor.position();
        let count = read_fixnum(&mut self.cursor)?;
        if count < 0 {
            return Err(MarshalError::NegativeLength {
                offset,
                construct: "ivar count",
                len: count,
            });
        }
        let mut ivars = Fields::new();
        for _ in 0..count {
            let name = self.expect_symbol("ivar name")?;
            let value = self.read_value()?;
            ivars.insert(name.name().to_owned(), value);
        }
        self.apply_ivars(inner, ivars, offset)
    }

    /// Strings consume a recognized encoding marker; objects, arrays, and
    /// hashes keep their ivars; scalar values have no ivar storage.
    fn apply_ivars(
        &mut self,
        inner: Value,
        ivars: Fields,
        offset: usize,
    ) -> Result<Value, MarshalError> {
        match &inner {
            Value::String(cell) => {
                if let Some(e) = ivars.get("E") {
                    match e {
                        Value::Bool(true) => {
                            cell.borrow_mut().encoding = DEFAULT_ENCODING.to_owned();
                        }
                        // describe, not Display: the indicator may be a
                        // cyclic graph.
                        other => {
                            return Err(MarshalError::UnsupportedEncoding {
                                offset,
                                indicator: other.describe(),
                            });
                        }
                    }
                } else if let Some(enc) = ivars.get("encoding") {
                    match enc {
                        Value::String(name) => {
                            let name = match std::str::from_utf8(&name.borrow().bytes) {
                                Ok(text) => text.to_owned(),
                                Err(_) => {
                                    return Err(MarshalError::UnsupportedEncoding {
                                        offset,
                                        indicator: "non-UTF-8 encoding name".to_owned(),
                                    });
                                }
                            };
                            tracing::debug!(encoding = %name, "explicit string encoding");
                            cell.borrow_mut().encoding = name;
                        }
                        other => {
                            return Err(MarshalError::UnsupportedEncoding {
                                offset,
                                indicator: other.describe(),
                            });
                        }
                    }
                }
            }
            Value::Object(cell) => cell.borrow_mut().ivars.extend(ivars),
            Value::Array(cell) => cell.borrow_mut().ivars.extend(ivars),
            Value::Hash(cell) => cell.borrow_mut().ivars.extend(ivars),
            _ => {
                tracing::debug!(count = ivars.len(), offset, "discarding ivars on scalar value");
            }
        }
        Ok(inner)
    }

    fn read_user_defined(&mut self) -> Result<Value, MarshalError> {
        // The payload is opaque, so nothing can back-reference this slot
        // before it is filled; a plain placeholder keeps the index order.
        let oid = self.objects.len();
        self.objects.push(Value::Nil);
        let class_name = self.expect_symbol("user-defined class name")?;
        let offset = self.cursor.position();
        let len = read_fixnum(&mut self.cursor)?;
        if len < 0 {
            return Err(MarshalError::NegativeLength {
                offset,
                construct: "user-defined payload",
                len,
            });
        }
        let Some(decode_fn) = self.registry.resolve(class_name.name()) else {
            return Err(MarshalError::UnknownRegisteredClass {
                offset,
                class_name: class_name.name().to_owned(),
            });
        };
        let payload = self.cursor.read_exact(len as usize)?;
        let decoded = decode_fn(payload)?;
        let value = Value::Custom(Rc::new(CustomObject::new(class_name, decoded)));
        self.objects[oid] = value.clone();
        Ok(value)
    }

    fn expect_symbol(&mut self, what: &'static str) -> Result<Symbol, MarshalError> {
        let offset = self.cursor.position();
        match self.read_value()? {
            Value::Symbol(s) => Ok(s),
            other => Err(MarshalError::Decode {
                offset,
                message: format!("{what} must be a symbol, got {}", other.describe()),
            }),
        }
    }
}

fn unsupported_construct(t: u8) -> &'static str {
    match t {
        tag::STRUCT => "struct",
        tag::USER_CLASS => "user class",
        tag::USER_MARSHAL => "user marshal",
        tag::EXTENDED => "extended object",
        tag::BIGNUM => "bignum",
        tag::CLASS => "class",
        tag::MODULE => "module",
        tag::CLASS_OR_MODULE => "class or module",
        tag::DATA => "data object",
        tag::REGEXP => "regexp",
        _ => "unrecognized",
    }
}
