//! `Data`: the toolkit's fixed-width tagged scalar, plus the reference hash
//! and compare helpers that interpret it.
//!
//! The table itself is generic and never looks inside a key or value; these
//! helpers exist so `ChainedTable<Data, Data, _, _>` works out of the box.

use crate::hashing::bytes_hash;
use core::cmp::Ordering;
use core::fmt;
use std::rc::Rc;

/// One of a signed integer, a float, or an owned handle to a byte buffer.
///
/// Cloning copies the scalar or bumps the handle's reference count; the
/// buffer is only freed when the last handle goes away.
#[derive(Clone)]
pub enum Data {
    Int(i64),
    Float(f64),
    Ptr(Rc<[u8]>),
}

impl Data {
    pub fn str(s: &str) -> Self {
        Data::Ptr(Rc::from(s.as_bytes()))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Data::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Data::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Data::Ptr(p) => Some(p),
            _ => None,
        }
    }

    /// Byte view used by the string helpers: the buffer up to its first NUL.
    /// Non-pointer payloads read as the empty string.
    fn c_str(&self) -> &[u8] {
        let bytes = self.as_bytes().unwrap_or(&[]);
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        &bytes[..end]
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Int(i) => write!(f, "{i}"),
            Data::Float(x) => write!(f, "{x:?}"),
            Data::Ptr(p) => match core::str::from_utf8(p) {
                Ok(s) => write!(f, "{s:?}"),
                Err(_) => write!(f, "{:p}", Rc::as_ptr(p) as *const u8),
            },
        }
    }
}

impl From<i64> for Data {
    fn from(i: i64) -> Self {
        Data::Int(i)
    }
}

impl From<f64> for Data {
    fn from(x: f64) -> Self {
        Data::Float(x)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::str(s)
    }
}

impl From<Vec<u8>> for Data {
    fn from(v: Vec<u8>) -> Self {
        Data::Ptr(Rc::from(v))
    }
}

/// Hash a pointer payload as a NUL-terminated byte string.
pub fn string_hash(d: &Data) -> u64 {
    bytes_hash(d.c_str())
}

/// Identity hash of an integer payload; other payloads hash to 0.
pub fn int_hash(d: &Data) -> u64 {
    d.as_int().map_or(0, |i| i as u64)
}

/// Lexicographic byte comparison of pointer payloads. `Equal` exactly when
/// the byte strings are identical.
pub fn compare_string(a: &Data, b: &Data) -> Ordering {
    a.c_str().cmp(b.c_str())
}

/// Numeric comparison of integer payloads. Non-integers sort first.
pub fn compare_int(a: &Data, b: &Data) -> Ordering {
    a.as_int().cmp(&b.as_int())
}

/// Total-order comparison of float payloads. Non-floats sort first.
pub fn compare_float(a: &Data, b: &Data) -> Ordering {
    match (a.as_float(), b.as_float()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (x, y) => x.is_some().cmp(&y.is_some()),
    }
}

/// Handle identity: `Equal` only for two handles to the same buffer.
pub fn compare_pointer(a: &Data, b: &Data) -> Ordering {
    let addr = |d: &Data| d.as_bytes().map(|p| p.as_ptr() as usize);
    addr(a).cmp(&addr(b))
}
