#![cfg(test)]

// Property tests for ChainedTable kept inside the crate so they can reach
// `chain()` and the allocator accounting directly.

use crate::alloc::Counting;
use crate::config::TableConfig;
use crate::error::TableError;
use crate::hashing::{BuildHash, CompareFn, HashFn, OrdCompare};
use crate::table::ChainedTable;
use core::mem::size_of;
use proptest::prelude::*;
use slotmap::DefaultKey;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations so shrinking moves toward earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    RemoveAct(usize),
    Get(usize),
    Mutate(usize, i32),
    Iterate,
    Drain,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, TableConfig, Vec<Op>)> {
    let cfg = (1usize..=8, 0.25f64..2.0).prop_map(|(cap, lf)| {
        TableConfig::new()
            .with_initial_capacity(cap)
            .with_max_load_factor(lf)
    });
    (proptest::collection::vec("[a-z]{0,4}", 1..=12), cfg).prop_flat_map(|(pool, cfg)| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => idx.clone().prop_map(Op::Remove),
            1 => idx.clone().prop_map(Op::RemoveAct),
            2 => idx.clone().prop_map(Op::Get),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Iterate),
            1 => Just(Op::Drain),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), cfg, ops))
    })
}

fn fail(e: TableError) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

fn run<H, C>(
    pool: Vec<String>,
    cfg: TableConfig,
    ops: Vec<Op>,
    hash: H,
    compare: C,
) -> Result<(), TestCaseError>
where
    H: HashFn<String> + Clone,
    C: CompareFn<String>,
{
    let mut sut =
        ChainedTable::with_config_in(hash.clone(), compare, cfg, Counting::new()).map_err(fail)?;
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut last_cap = sut.capacity();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].clone();
                let prev = sut.insert(k.clone(), v).map_err(fail)?;
                prop_assert_eq!(prev, model.insert(k, v));
            }
            Op::Remove(i) => {
                let k = &pool[i];
                match (sut.remove(k), model.remove(k)) {
                    (Ok(v), Some(mv)) => prop_assert_eq!(v, mv),
                    (Err(TableError::NotFound), None) => {}
                    (got, want) => {
                        prop_assert!(false, "remove {:?}: got {:?}, want {:?}", k, got, want)
                    }
                }
            }
            Op::RemoveAct(i) => {
                let k = &pool[i];
                let mut calls = Vec::new();
                let r = sut.remove_act(k, |v| calls.push(v));
                match model.remove(k) {
                    Some(mv) => {
                        prop_assert!(r.is_ok());
                        prop_assert_eq!(calls, vec![mv]);
                    }
                    None => {
                        prop_assert_eq!(r, Err(TableError::NotFound));
                        prop_assert!(calls.is_empty());
                    }
                }
            }
            Op::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k).ok(), model.get(k));
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            Op::Mutate(i, d) => {
                let k = &pool[i];
                if let (Ok(v), Some(mv)) = (sut.get_mut(k), model.get_mut(k)) {
                    *v = v.wrapping_add(d);
                    *mv = mv.wrapping_add(d);
                }
            }
            Op::Iterate => {
                let s: BTreeSet<_> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let m: BTreeSet<_> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s, m);
            }
            Op::Drain => {
                let mut drained: Vec<_> = sut.drain().collect();
                let mut expected: Vec<_> = model.drain().collect();
                drained.sort();
                expected.sort();
                prop_assert_eq!(drained, expected);
            }
        }

        // Post-conditions after each op
        // 1) Size parity; capacity only ever grows.
        prop_assert_eq!(sut.len(), model.len());
        prop_assert!(sut.capacity() >= last_cap);
        last_cap = sut.capacity();
        // 2) Every entry sits in the chain its hash selects.
        let mut linked = 0;
        for b in 0..sut.capacity() {
            for (k, _) in sut.chain(b) {
                prop_assert_eq!((hash.hash(k) % sut.capacity() as u64) as usize, b);
                linked += 1;
            }
        }
        prop_assert_eq!(linked, sut.len());
    }

    // Teardown hands every value to the callback once and returns all bytes.
    let mut alloc = Counting::new();
    let mut torn = Vec::new();
    {
        let mut t =
            ChainedTable::with_config_in(hash, OrdCompare, cfg, &mut alloc).map_err(fail)?;
        for (k, v) in sut.drain() {
            t.insert(k, v).map_err(fail)?;
        }
        t.delete_act(|v| torn.push(v));
    }
    let mut expected: Vec<_> = model.into_values().collect();
    torn.sort();
    expected.sort();
    prop_assert_eq!(torn, expected);
    prop_assert_eq!(alloc.live_bytes(), 0);
    // The drained table still holds exactly its bucket array.
    let bucket_bytes = sut.capacity() * size_of::<Option<DefaultKey>>();
    prop_assert_eq!(sut.allocator().live_bytes(), bucket_bytes);
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences and growth policies:
// - insert returns the previous value exactly when the model had one.
// - get/remove/remove_act miss with NotFound and otherwise match the model.
// - remove_act fires its callback once per removed key and never on a miss.
// - iter and drain yield each live entry exactly once.
// - Every entry is linked into the chain `hash % capacity`; capacity never shrinks.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, cfg, ops) in arb_scenario()) {
        let hash = BuildHash::<hashbrown::hash_map::DefaultHashBuilder>::default();
        run(pool, cfg, ops, hash, OrdCompare)?;
    }
}

// Property: Same invariants under a constant hash, so every key shares one
// chain and removal has to relink heads, middles and tails.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, cfg, ops) in arb_scenario()) {
        let constant = |_: &String| 7u64;
        run(pool, cfg, ops, constant, |a: &String, b: &String| a.cmp(b))?;
    }
}
