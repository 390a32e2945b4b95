//! ChainedTable: separate chaining over a slotmap arena.
//!
//! Entries live in a `SlotMap`; each bucket stores the arena key of its chain
//! head and each entry stores the key of its successor. Chains are
//! head-first, so the most recently inserted colliding key is found first.
//! Each entry remembers the hash it was inserted with. Growing relinks
//! entries into a new bucket array from those stored hashes, so no user code
//! runs while chains are half moved, and the entries themselves never move.
//! Every method, including one that unwinds out of a user callback, leaves
//! `len()` equal to the number of entries reachable from the buckets.

use crate::alloc::{bytes_for, AllocError, Allocator, Global};
use crate::config::TableConfig;
use crate::error::TableError;
use crate::hashing::{CompareFn, HashFn};
use crate::reentrancy::CallbackGuard;
use core::cmp::Ordering;
use core::mem::{self, size_of};
use log::{debug, trace, warn};
use slotmap::{DefaultKey, SlotMap};

type Link = Option<DefaultKey>;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
    next: Link,
}

/// Where a key lives, or would live: its hash and bucket, the entry before
/// it in the chain, and the entry itself if present.
struct Probe {
    hash: u64,
    bucket: usize,
    prev: Link,
    found: Link,
}

pub struct ChainedTable<K, V, H, C, A: Allocator = Global> {
    hash: H,
    compare: C,
    buckets: Vec<Link>,
    entries: SlotMap<DefaultKey, Entry<K, V>>,
    config: TableConfig,
    alloc: A,
    guard: CallbackGuard,
}

/// Reserve a bucket array of `cap` empty chains, charging `alloc` first.
fn alloc_buckets<A: Allocator>(alloc: &mut A, cap: usize) -> Result<Vec<Link>, AllocError> {
    let bytes = bytes_for::<Link>(cap)?;
    alloc.allocate(bytes)?;
    let mut buckets = Vec::new();
    if buckets.try_reserve_exact(cap).is_err() {
        alloc.release(bytes);
        return Err(AllocError::Exhausted { requested: bytes });
    }
    buckets.resize(cap, None);
    Ok(buckets)
}

fn bucket_of(hash: u64, cap: usize) -> usize {
    (hash % cap as u64) as usize
}

/// Growth policy: roughly double, kept odd so it never lands on a power of
/// two.
fn next_capacity(cap: usize) -> Result<usize, AllocError> {
    cap.checked_mul(2)
        .and_then(|n| n.checked_add(1))
        .ok_or(AllocError::CapacityOverflow)
}

impl<K, V, H, C> ChainedTable<K, V, H, C>
where
    H: HashFn<K>,
    C: CompareFn<K>,
{
    /// Empty table with the default policy: 257 buckets, max load 0.7.
    pub fn new(hash: H, compare: C) -> Result<Self, TableError> {
        Self::with_config(hash, compare, TableConfig::default())
    }

    pub fn with_config(hash: H, compare: C, config: TableConfig) -> Result<Self, TableError> {
        Self::with_config_in(hash, compare, config, Global)
    }
}

impl<K, V, H, C, A> ChainedTable<K, V, H, C, A>
where
    H: HashFn<K>,
    C: CompareFn<K>,
    A: Allocator,
{
    pub fn new_in(hash: H, compare: C, alloc: A) -> Result<Self, TableError> {
        Self::with_config_in(hash, compare, TableConfig::default(), alloc)
    }

    /// Build an empty table. On failure nothing is retained: the allocator
    /// is handed back its charge before the error is returned.
    pub fn with_config_in(
        hash: H,
        compare: C,
        config: TableConfig,
        mut alloc: A,
    ) -> Result<Self, TableError> {
        config.validate()?;
        let buckets = alloc_buckets(&mut alloc, config.initial_capacity)?;
        trace!("created table with {} buckets", buckets.len());
        Ok(Self {
            hash,
            compare,
            buckets,
            entries: SlotMap::with_key(),
            config,
            alloc,
            guard: CallbackGuard::default(),
        })
    }

    fn hash_of(&self, key: &K) -> u64 {
        let _busy = self.guard.enter();
        self.hash.hash(key)
    }

    fn same_key(&self, a: &K, b: &K) -> bool {
        let _busy = self.guard.enter();
        self.compare.compare(a, b) == Ordering::Equal
    }

    fn probe(&self, key: &K) -> Probe {
        let hash = self.hash_of(key);
        let bucket = bucket_of(hash, self.buckets.len());
        let mut prev = None;
        let mut cur = self.buckets[bucket];
        while let Some((k, e)) = cur.and_then(|k| self.entries.get(k).map(|e| (k, e))) {
            if self.same_key(&e.key, key) {
                return Probe {
                    hash,
                    bucket,
                    prev,
                    found: Some(k),
                };
            }
            prev = Some(k);
            cur = e.next;
        }
        Probe {
            hash,
            bucket,
            prev,
            found: None,
        }
    }

    /// Insert or overwrite.
    ///
    /// An existing equal key has its value replaced in place and the old
    /// value is returned; length and capacity do not change. A new key is
    /// linked at the head of its chain and may trigger growth.
    ///
    /// `Err(Allocation)` means the entry could not be allocated and nothing
    /// was stored. `Err(ResizeSkipped)` means the entry *was* stored but the
    /// bucket array could not grow; the next new key retries the resize.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        let at = self.probe(&key);
        if let Some(e) = at.found.and_then(|k| self.entries.get_mut(k)) {
            return Ok(Some(mem::replace(&mut e.value, value)));
        }

        self.alloc.allocate(Self::ENTRY_BYTES)?;
        let head = self.buckets[at.bucket];
        let k = self.entries.insert(Entry {
            key,
            value,
            hash: at.hash,
            next: head,
        });
        self.buckets[at.bucket] = Some(k);

        // Load is measured as it stood before this key arrived.
        if self.config.over_threshold(self.len() - 1, self.capacity()) {
            if let Err(e) = self.grow() {
                warn!(
                    "resize of {}-bucket table skipped: {e}; {} entries stored",
                    self.capacity(),
                    self.len()
                );
                return Err(TableError::ResizeSkipped(e));
            }
        }
        Ok(None)
    }

    /// Move every entry into a larger bucket array. Leaves the table
    /// untouched on failure. Runs no user code.
    fn grow(&mut self) -> Result<(), AllocError> {
        let old_cap = self.capacity();
        let new_cap = next_capacity(old_cap)?;
        let fresh = alloc_buckets(&mut self.alloc, new_cap)?;
        let old = mem::replace(&mut self.buckets, fresh);

        for head in old.iter().copied() {
            let mut cur = head;
            while let Some(k) = cur {
                let Some(e) = self.entries.get_mut(k) else {
                    break;
                };
                let b = bucket_of(e.hash, new_cap);
                cur = e.next;
                e.next = self.buckets[b];
                self.buckets[b] = Some(k);
            }
        }

        drop(old);
        self.alloc.release(Self::bucket_bytes(old_cap));
        debug!(
            "resized table {old_cap} -> {new_cap} buckets ({} entries)",
            self.len()
        );
        Ok(())
    }

    pub fn get(&self, key: &K) -> Result<&V, TableError> {
        self.probe(key)
            .found
            .and_then(|k| self.entries.get(k))
            .map(|e| &e.value)
            .ok_or(TableError::NotFound)
    }

    pub fn get_mut(&mut self, key: &K) -> Result<&mut V, TableError> {
        let found = self.probe(key).found;
        found
            .and_then(|k| self.entries.get_mut(k))
            .map(|e| &mut e.value)
            .ok_or(TableError::NotFound)
    }

    /// By-value lookup for `Copy` payloads such as `i64` or `f64`.
    pub fn get_copied(&self, key: &K) -> Result<V, TableError>
    where
        V: Copy,
    {
        self.get(key).copied()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.probe(key).found.is_some()
    }

    /// Unlink `key` and hand its value back. Capacity never shrinks.
    pub fn remove(&mut self, key: &K) -> Result<V, TableError> {
        let at = self.probe(key);
        let k = at.found.ok_or(TableError::NotFound)?;
        self.unlink(at.bucket, at.prev, k)
            .map(|e| e.value)
            .ok_or(TableError::NotFound)
    }

    /// `remove`, then pass the value to `on_delete` exactly once.
    pub fn remove_act<F>(&mut self, key: &K, on_delete: F) -> Result<(), TableError>
    where
        F: FnOnce(V),
    {
        let value = self.remove(key)?;
        let _busy = self.guard.enter();
        on_delete(value);
        Ok(())
    }
}

impl<K, V, H, C, A: Allocator> ChainedTable<K, V, H, C, A> {
    const ENTRY_BYTES: usize = size_of::<Entry<K, V>>();

    fn bucket_bytes(cap: usize) -> usize {
        // Only called for capacities that were charged successfully.
        bytes_for::<Link>(cap).unwrap_or(0)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of buckets currently allocated.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.alloc
    }

    fn unlink(&mut self, bucket: usize, prev: Link, k: DefaultKey) -> Option<Entry<K, V>> {
        let entry = self.entries.remove(k)?;
        match prev {
            Some(p) => {
                if let Some(pe) = self.entries.get_mut(p) {
                    pe.next = entry.next;
                }
            }
            None => self.buckets[bucket] = entry.next,
        }
        self.alloc.release(Self::ENTRY_BYTES);
        Some(entry)
    }

    /// Entries of one bucket, head first.
    pub(crate) fn chain(&self, bucket: usize) -> Chain<'_, K, V> {
        Chain {
            entries: &self.entries,
            next: self.buckets.get(bucket).copied().flatten(),
        }
    }

    /// Iterate in bucket-index order, then chain order.
    pub fn iter(&self) -> Iter<'_, K, V, H, C, A> {
        Iter {
            table: self,
            bucket: 0,
            chain: self.chain(0),
        }
    }

    /// Mutable iteration. Order follows the entry arena, not the buckets.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.entries.values_mut().map(|e| (&e.key, &mut e.value))
    }

    /// Remove every entry, yielding owned pairs in bucket-then-chain order.
    /// Capacity is kept.
    ///
    /// The table is emptied as soon as `drain` returns, before the first
    /// item is taken. Dropping the iterator early drops the remaining pairs;
    /// leaking it (`mem::forget`) leaks them along with their allocator
    /// charges, but the table itself stays empty and usable.
    pub fn drain(&mut self) -> Drain<'_, K, V, H, C, A> {
        let mut entries = mem::take(&mut self.entries);
        let next = splice_chains(&mut self.buckets, &mut entries);
        Drain {
            table: self,
            entries,
            next,
        }
    }

    pub fn clear(&mut self) {
        self.drain().for_each(drop);
    }

    /// Tear the table down. Same as dropping it.
    pub fn delete(self) {
        drop(self)
    }

    /// Tear the table down, passing each live value to `on_delete` exactly
    /// once, in bucket-then-chain order.
    pub fn delete_act<F>(mut self, mut on_delete: F)
    where
        F: FnMut(V),
    {
        let mut drain = self.drain();
        while let Some((_key, value)) = drain.next() {
            let _busy = drain.table.guard.enter();
            on_delete(value);
        }
    }
}

impl<K, V, H, C, A: Allocator> Drop for ChainedTable<K, V, H, C, A> {
    fn drop(&mut self) {
        let live = self.entries.len();
        self.alloc.release(live * Self::ENTRY_BYTES);
        self.alloc.release(Self::bucket_bytes(self.buckets.len()));
        trace!("dropped table: {live} entries, {} buckets", self.buckets.len());
    }
}

/// Empty every bucket and thread their chains, in bucket order, into one
/// list. Returns the list's head.
fn splice_chains<K, V>(
    buckets: &mut [Link],
    entries: &mut SlotMap<DefaultKey, Entry<K, V>>,
) -> Link {
    let mut head = None;
    let mut tail: Link = None;
    for slot in buckets.iter_mut() {
        let Some(first) = slot.take() else {
            continue;
        };
        match tail.and_then(|t| entries.get_mut(t)) {
            Some(last) => last.next = Some(first),
            None => head = Some(first),
        }
        let mut last = first;
        while let Some(next) = entries.get(last).and_then(|e| e.next) {
            last = next;
        }
        tail = Some(last);
    }
    head
}

/// Walks one chain.
pub(crate) struct Chain<'a, K, V> {
    entries: &'a SlotMap<DefaultKey, Entry<K, V>>,
    next: Link,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let e = self.entries.get(self.next?)?;
        self.next = e.next;
        Some((&e.key, &e.value))
    }
}

/// Iterator over `(&K, &V)` in bucket-then-chain order.
pub struct Iter<'a, K, V, H, C, A: Allocator> {
    table: &'a ChainedTable<K, V, H, C, A>,
    bucket: usize,
    chain: Chain<'a, K, V>,
}

impl<'a, K, V, H, C, A: Allocator> Iterator for Iter<'a, K, V, H, C, A> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.chain.next() {
                return Some(item);
            }
            self.bucket += 1;
            if self.bucket >= self.table.capacity() {
                return None;
            }
            self.chain = self.table.chain(self.bucket);
        }
    }
}

/// Owning drain returned by [`ChainedTable::drain`]. Holds the detached
/// entries; the table it borrows is already empty.
pub struct Drain<'a, K, V, H, C, A: Allocator> {
    table: &'a mut ChainedTable<K, V, H, C, A>,
    entries: SlotMap<DefaultKey, Entry<K, V>>,
    next: Link,
}

impl<K, V, H, C, A: Allocator> Iterator for Drain<'_, K, V, H, C, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let e = self.entries.remove(self.next?)?;
        self.next = e.next;
        self.table
            .alloc
            .release(ChainedTable::<K, V, H, C, A>::ENTRY_BYTES);
        Some((e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.entries.len(), Some(self.entries.len()))
    }
}

impl<K, V, H, C, A: Allocator> Drop for Drain<'_, K, V, H, C, A> {
    fn drop(&mut self) {
        self.for_each(drop);
    }
}
