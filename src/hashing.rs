//! Caller-injected key identity: a hash function and an equality comparator.
//!
//! Plain closures and `fn` items work directly through the blanket impls.
//! `BuildHash` and `OrdCompare` adapt keys that already implement the std
//! traits.

use core::cmp::Ordering;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

pub trait HashFn<K: ?Sized> {
    fn hash(&self, key: &K) -> u64;
}

/// Three-way comparison of two keys. The table only looks at whether the
/// result is `Ordering::Equal`.
pub trait CompareFn<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

impl<K: ?Sized, F> HashFn<K> for F
where
    F: Fn(&K) -> u64,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self(key)
    }
}

impl<K: ?Sized, F> CompareFn<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// Hash any `K: Hash` through a `BuildHasher`.
#[derive(Clone, Debug, Default)]
pub struct BuildHash<S = DefaultHashBuilder>(pub S);

impl<K, S> HashFn<K> for BuildHash<S>
where
    K: ?Sized + Hash,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.0.hash_one(key)
    }
}

/// Compare any `K: Ord` with `Ord::cmp`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrdCompare;

impl<K: ?Sized + Ord> CompareFn<K> for OrdCompare {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Multiplicative string hash, `h = h * 31 + byte` in wrapping 32-bit
/// arithmetic. Stops at the first NUL byte.
pub fn bytes_hash(bytes: &[u8]) -> u64 {
    let h = bytes
        .iter()
        .take_while(|&&b| b != 0)
        .fold(0u32, |h, &b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
    u64::from(h)
}
