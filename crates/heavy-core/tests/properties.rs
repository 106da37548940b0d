//! Property-based tests for heavy-core runtime primitives.
//!
//! Tests scheduler ordering, sub-block timing, pool reuse, mailbox record
//! integrity, and lane-wise signal math using proptest for randomized input
//! generation.

use std::sync::{Arc, Mutex};

use heavy_core::hash::hash_bytes;
use heavy_core::mailbox::mailbox;
use heavy_core::signal::{SignalBinop, SignalBinopOp};
use heavy_core::{
    Context, ContextOptions, Element, MAX_BLOCK_ELEMENTS, MemoryPool, Message, MessageQueue,
    N_SIMD, Object, ObjectContext, ObjectId, Outbox, PatchBuilder, Target, Timing, string_to_hash,
};
use proptest::prelude::*;

/// Object ids for queue targets, taken from a throwaway builder.
fn object_ids(n: usize) -> Vec<ObjectId> {
    let mut b = PatchBuilder::new(0, 0);
    (0..n).map(|i| b.add_receive(&format!("r{i}"))).collect()
}

/// Logs the sub-block start at which each message arrives.
struct BlockClock {
    log: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl Object for BlockClock {
    fn class_name(&self) -> &'static str {
        "block_clock"
    }

    fn outlets(&self) -> usize {
        0
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        self.log
            .lock()
            .unwrap()
            .push((msg.timestamp(), cx.current_sample()));
    }
}

fn element() -> impl Strategy<Value = Element> {
    prop_oneof![
        Just(Element::Bang),
        (-1.0e6f32..1.0e6).prop_map(Element::Float),
        any::<u32>().prop_map(Element::Hash),
        "[a-z_]{1,20}".prop_map(|s| Element::symbol(&s)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Hashing is a pure function of the bytes.
    #[test]
    fn hash_is_deterministic(name in "[ -~]{0,40}") {
        prop_assert_eq!(string_to_hash(&name), hash_bytes(name.as_bytes()));
    }

    /// The queue pops in non-decreasing timestamp order and keeps insertion
    /// order among equal timestamps.
    #[test]
    fn queue_orders_by_time_then_arrival(times in prop::collection::vec(0u32..64, 1..100)) {
        let ids = object_ids(1);
        let target = Target::Inlet { object: ids[0], inlet: 0 };
        let mut q = MessageQueue::new(MemoryPool::with_capacity(256));
        for (i, &t) in times.iter().enumerate() {
            let elements = [Element::Float(i as f32)];
            prop_assert!(q.schedule(target, &Message::new(t, &elements)).is_some());
        }

        let mut dst = [Element::Bang; MAX_BLOCK_ELEMENTS];
        let mut fired = Vec::new();
        while let Some(f) = q.pop_before(u32::MAX, &mut dst) {
            let Element::Float(index) = dst[0] else {
                return Err(TestCaseError::fail("payload corrupted"));
            };
            fired.push((f.timestamp, index as usize));
        }
        prop_assert_eq!(fired.len(), times.len());
        for pair in fired.windows(2) {
            prop_assert!(pair[0].0 <= pair[1].0);
            if pair[0].0 == pair[1].0 {
                prop_assert!(pair[0].1 < pair[1].1);
            }
        }
        prop_assert!(q.is_empty());
    }

    /// Nothing at or after the boundary is popped.
    #[test]
    fn pop_before_is_strict(times in prop::collection::vec(0u32..256, 1..50), bound in 0u32..256) {
        let ids = object_ids(1);
        let target = Target::Outlet { object: ids[0], outlet: 0 };
        let mut q = MessageQueue::new(MemoryPool::with_capacity(256));
        for &t in &times {
            prop_assert!(q.schedule(target, &Message::new(t, &[Element::Bang])).is_some());
        }
        let mut dst = [Element::Bang; 4];
        let mut popped = 0;
        while let Some(f) = q.pop_before(bound, &mut dst) {
            prop_assert!(f.timestamp < bound);
            popped += 1;
        }
        prop_assert_eq!(popped, times.iter().filter(|&&t| t < bound).count());
        prop_assert_eq!(q.len(), times.len() - popped);
    }

    /// A message due at `t` is delivered at the start of the sub-block
    /// containing `t`.
    #[test]
    fn messages_fire_at_sub_block_floor(t in 0u32..2048) {
        let log: Arc<Mutex<Vec<(u32, u32)>>> = Arc::default();
        let mut b = PatchBuilder::new(0, 0);
        let r = b.add_receive("tick");
        let clock = b.add(BlockClock { log: Arc::clone(&log) });
        b.connect(r, 0, clock, 0).unwrap();
        let mut cx = Context::new(b.build().unwrap(), 48_000.0, ContextOptions::default()).unwrap();

        prop_assert!(cx.send_message_to_receiver(string_to_hash("tick"), t, &[Element::Bang]));
        cx.process(&[], &mut [], 2048 + N_SIMD);

        let w = N_SIMD as u32;
        let seen = log.lock().unwrap();
        prop_assert_eq!(seen.as_slice(), &[(t, t / w * w)]);
    }

    /// Freed blocks are reused: repeating an allocation pattern never grows
    /// the pool, and live blocks never alias.
    #[test]
    fn pool_reuses_freed_blocks(sizes in prop::collection::vec(1usize..=32, 1..40)) {
        let mut pool = MemoryPool::with_capacity(4096);
        let mut high_water = None;
        for _round in 0..3 {
            let mut blocks = Vec::new();
            for (i, &len) in sizes.iter().enumerate() {
                let block = pool.alloc(len).unwrap();
                pool.slice_mut(block).fill(Element::Float(i as f32));
                blocks.push(block);
            }
            for (i, &block) in blocks.iter().enumerate() {
                prop_assert_eq!(pool.slice(block).len(), sizes[i]);
                prop_assert!(pool.slice(block).iter().all(|e| *e == Element::Float(i as f32)));
            }
            for block in blocks {
                pool.free(block);
            }
            match high_water {
                None => high_water = Some(pool.high_water_mark()),
                Some(h) => prop_assert_eq!(pool.high_water_mark(), h),
            }
        }
    }

    /// Records come out of a mailbox exactly as they went in, in order.
    #[test]
    fn mailbox_preserves_records(
        records in prop::collection::vec(
            (any::<u32>(), any::<bool>(), any::<u32>(), prop::collection::vec(element(), 0..8)),
            1..20,
        )
    ) {
        let (mut tx, mut rx) = mailbox(16 * 1024);
        for (hash, absolute, time, elements) in &records {
            let timing = if *absolute { Timing::At(*time) } else { Timing::After(*time) };
            prop_assert!(tx.try_send(*hash, timing, elements));
        }

        let mut scratch = Vec::with_capacity(MAX_BLOCK_ELEMENTS);
        for (hash, absolute, time, elements) in &records {
            let delivery = rx.try_recv(&mut scratch).unwrap();
            prop_assert_eq!(delivery.receiver_hash, *hash);
            let timing = if *absolute { Timing::At(*time) } else { Timing::After(*time) };
            prop_assert_eq!(delivery.timing, timing);
            prop_assert_eq!(&scratch, elements);
        }
        prop_assert!(rx.is_empty());
    }

    /// Vectorized signal math equals the per-sample result.
    #[test]
    fn signal_math_matches_scalar(
        pairs in prop::collection::vec((-100.0f32..100.0, -100.0f32..100.0), 64..=64),
    ) {
        let mut b = PatchBuilder::new(2, 2);
        let add = b.add(SignalBinop::new(SignalBinopOp::Add));
        let mul = b.add(SignalBinop::new(SignalBinopOp::Mul));
        for node in [add, mul] {
            b.adc(0, node, 0).unwrap();
            b.adc(1, node, 1).unwrap();
        }
        b.dac(add, 0, 0).unwrap();
        b.dac(mul, 0, 1).unwrap();
        let mut cx = Context::new(b.build().unwrap(), 48_000.0, ContextOptions::default()).unwrap();

        let (x, y): (Vec<f32>, Vec<f32>) = pairs.into_iter().unzip();
        let (mut sum, mut product) = (vec![0.0; 64], vec![0.0; 64]);
        prop_assert_eq!(cx.process(&[&x, &y], &mut [&mut sum, &mut product], 64), 64);
        for i in 0..64 {
            prop_assert_eq!(sum[i], x[i] + y[i]);
            prop_assert_eq!(product[i], x[i] * y[i]);
        }
    }
}
