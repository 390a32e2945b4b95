//! chained-table: a single-threaded, separately chained hash table whose key
//! identity comes from caller-supplied hash and comparison functions.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1) average insert, lookup and removal over an open hash space,
//!   with the bucket array growing as load rises.
//! - Layers:
//!   - `alloc`: the allocation service. Every heap request the table makes
//!     is charged against an `Allocator` first, so exhaustion is reported
//!     as an error instead of aborting.
//!   - `table::ChainedTable<K, V, H, C, A>`: bucket array of chain heads
//!     over a slotmap arena of entries. Chains are linked through arena
//!     keys rather than pointers.
//!   - `data::Data`: the tagged scalar (integer, float or byte handle) and
//!     the reference hash/compare helpers for it.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (marker in the reentrancy guard).
//! - Keys are opaque. The table only calls `hash(key)` and
//!   `compare(a, b) == Equal`; it never clones, prints or frees a key or
//!   value unless asked.
//! - Every live key sits in the chain `hash(key) % capacity` for the
//!   current capacity; growth relinks every entry.
//! - Capacity never shrinks.
//!
//! Growth
//! - A new key triggers growth when the table was already above the
//!   configured load factor before it arrived. With the default 257
//!   buckets and 0.7, the 181st distinct key grows the table and the 180th
//!   does not.
//! - New capacity is `2 * capacity + 1`.
//! - Growth is opportunistic: if the new bucket array cannot be allocated
//!   the insert still succeeds, `TableError::ResizeSkipped` is returned,
//!   and the next new key tries again.
//!
//! Status reporting
//! - Every operation returns its own `Result`; `TableError::NotFound` and
//!   the allocation variants never overlap with a returned value.
//!
//! Cleanup
//! - `remove` and `drain` hand owned values back; `remove_act` and
//!   `delete_act` pass them to a callback exactly once. Dropping the table
//!   drops whatever is left.
//!
//! Reentrancy
//! - The hash, compare and cleanup callbacks run under a debug-only guard;
//!   reaching the same table from inside one of them panics in debug
//!   builds.

pub mod alloc;
pub mod config;
pub mod data;
mod dump;
mod error;
pub mod hashing;
mod reentrancy;
pub mod table;
mod table_proptest;

// Public surface
pub use crate::alloc::{AllocError, Allocator, Counting, Global};
pub use config::{TableConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_LOAD_FACTOR};
pub use data::Data;
pub use dump::Dump;
pub use error::TableError;
pub use hashing::{BuildHash, CompareFn, HashFn, OrdCompare};
pub use table::ChainedTable;
