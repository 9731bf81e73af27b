//! Marshal tag byte constants.
//!
//! One leading byte identifies how the following bytes are structured. The
//! tag set is closed; the dispatcher matches over it exhaustively.

// Scalars
pub const NIL: u8 = b'0';
pub const TRUE: u8 = b'T';
pub const FALSE: u8 = b'F';
pub const FIXNUM: u8 = b'i';
pub const FLOAT: u8 = b'f';

// Symbols and back-references
pub const SYMBOL: u8 = b':';
pub const SYMLINK: u8 = b';';
pub const OBJLINK: u8 = b'@';

// Compounds
pub const STRING: u8 = b'"';
pub const ARRAY: u8 = b'[';
pub const HASH: u8 = b'{';
pub const EMPTY_HASH: u8 = b'}';
pub const OBJECT: u8 = b'o';
pub const IVAR: u8 = b'I';
pub const USER_DEFINED: u8 = b'u';

// Recognized but unsupported. These fail with `UnsupportedTag`; they are
// never silently skipped.
pub const STRUCT: u8 = b'S';
pub const USER_CLASS: u8 = b'C';
pub const USER_MARSHAL: u8 = b'U';
pub const EXTENDED: u8 = b'e';
pub const BIGNUM: u8 = b'L';
pub const CLASS: u8 = b'c';
pub const MODULE: u8 = b'm';
pub const CLASS_OR_MODULE: u8 = b'M';
pub const DATA: u8 = b'd';
pub const REGEXP: u8 = b'/';
