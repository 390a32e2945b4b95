//! Diagnostic rendering of a table's buckets and chains. Debugging aid only;
//! the layout is not a stable format.

use crate::alloc::Allocator;
use crate::table::ChainedTable;
use core::fmt;

/// Display adapter returned by [`ChainedTable::dump`].
pub struct Dump<'a, K, V, H, C, A: Allocator> {
    table: &'a ChainedTable<K, V, H, C, A>,
    full: bool,
}

impl<K, V, H, C, A: Allocator> ChainedTable<K, V, H, C, A> {
    /// Render the table. `full` lists empty buckets too.
    pub fn dump(&self, full: bool) -> Dump<'_, K, V, H, C, A> {
        Dump { table: self, full }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, H, C, A: Allocator> fmt::Display for Dump<'_, K, V, H, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.table;
        writeln!(
            f,
            "table: len={} capacity={} load={:.3}",
            t.len(),
            t.capacity(),
            t.load_factor()
        )?;
        for bucket in 0..t.capacity() {
            let mut chain = t.chain(bucket).peekable();
            if chain.peek().is_none() && !self.full {
                continue;
            }
            write!(f, "[{bucket}]:")?;
            let mut first = true;
            for (k, v) in chain {
                let sep = if first { " " } else { ", " };
                write!(f, "{sep}{k:?} -> {v:?}")?;
                first = false;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, H, C, A: Allocator> fmt::Debug for ChainedTable<K, V, H, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.dump(false), f)
    }
}
