//! Marshal value model.

mod value;

pub use value::{
    CustomObject, CustomValue, Fields, RubyArray, RubyHash, RubyObject, RubyString, Symbol, Value,
    DEFAULT_ENCODING,
};
