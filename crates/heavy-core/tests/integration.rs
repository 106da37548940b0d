//! Integration tests for heavy-core patches.
//!
//! Builds small patches through [`PatchBuilder`] and drives them through a
//! [`Context`] the way a host would: scheduler ordering and block-width
//! timing, delay commands, table bounds, vectorized filters against their
//! scalar recurrence, the random generator's exact sequence, and mailbox
//! overload behaviour.

use std::sync::{Arc, Mutex};

use heavy_core::control::{Delay, Random};
use heavy_core::signal::{BiquadK, BiquadState, Envelope, SignalVar};
use heavy_core::{
    Context, ContextOptions, Element, INIT_RECEIVER_HASH, MAX_BLOCK_ELEMENTS, Message, N_SIMD,
    Object, ObjectContext, Outbox, PatchBuilder, Table, string_to_hash,
};

const SAMPLE_RATE: f64 = 48_000.0;
const TAU: f32 = core::f32::consts::TAU;

/// Generate a sine wave buffer at the given frequency and sample rate.
fn generate_sine(freq_hz: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| libm::sinf(TAU * freq_hz * n as f32 / sample_rate))
        .collect()
}

/// One observed delivery: message timestamp, sub-block start, first element.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Seen {
    timestamp: u32,
    block_start: u32,
    element: Element,
}

type Log = Arc<Mutex<Vec<Seen>>>;

/// Control sink that logs everything arriving on its inlet.
struct Recorder {
    log: Log,
}

impl Object for Recorder {
    fn class_name(&self) -> &'static str {
        "recorder"
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
        if let Some(&element) = msg.element(0) {
            self.log.lock().unwrap().push(Seen {
                timestamp: msg.timestamp(),
                block_start: cx.current_sample(),
                element,
            });
        }
    }
}

/// Adds a recorder fed by receiver `name`.
fn record_receiver(b: &mut PatchBuilder, name: &str) -> Log {
    let log = Log::default();
    let r = b.add_receive(name);
    let rec = b.add(Recorder {
        log: Arc::clone(&log),
    });
    b.connect(r, 0, rec, 0).unwrap();
    log
}

fn context(b: PatchBuilder, options: ContextOptions) -> Context {
    Context::new(b.build().unwrap(), SAMPLE_RATE, options).unwrap()
}

/// Renders `n` frames of a patch with no audio outputs.
fn run(cx: &mut Context, n: usize) {
    assert_eq!(cx.process(&[], &mut [], n), n);
}

fn floats(log: &Log) -> Vec<f32> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|s| match s.element {
            Element::Float(f) => Some(f),
            _ => None,
        })
        .collect()
}

// ============================================================================
// 1. Name hashing
// ============================================================================

#[test]
fn hash_is_stable() {
    assert_eq!(string_to_hash("freq"), 0x345F_C008);
    assert_eq!(INIT_RECEIVER_HASH, 0xCE5C_C65B);
    assert_eq!(string_to_hash("freq"), string_to_hash("freq"));
    assert_ne!(string_to_hash("freq"), string_to_hash("Freq"));
}

// ============================================================================
// 2. Scheduler ordering and block timing
// ============================================================================

#[test]
fn equal_timestamps_fire_in_arrival_order() {
    let mut b = PatchBuilder::new(0, 0);
    let log = record_receiver(&mut b, "in");
    let mut cx = context(b, ContextOptions::default());
    let h = string_to_hash("in");

    cx.send_message_to_receiver(h, 4, &[Element::Float(2.0)]);
    cx.send_message_to_receiver(h, 0, &[Element::Float(1.0)]);
    cx.send_message_to_receiver(h, 4, &[Element::Float(3.0)]);
    run(&mut cx, 4 * N_SIMD);

    assert_eq!(floats(&log), vec![1.0, 2.0, 3.0]);
    let seen = log.lock().unwrap();
    assert_eq!(
        seen.iter().map(|s| s.timestamp).collect::<Vec<_>>(),
        vec![0, 4, 4]
    );
}

#[test]
fn messages_fire_at_the_start_of_their_sub_block() {
    let mut b = PatchBuilder::new(0, 0);
    let log = record_receiver(&mut b, "in");
    let mut cx = context(b, ContextOptions::default());
    let h = string_to_hash("in");

    let times = [5_u32, 17, 31, 64];
    for (i, &t) in times.iter().enumerate() {
        cx.send_message_to_receiver(h, t, &[Element::Float(i as f32)]);
    }
    run(&mut cx, 128);

    let seen = log.lock().unwrap();
    assert_eq!(seen.len(), times.len());
    for (s, &t) in seen.iter().zip(&times) {
        assert_eq!(s.timestamp, t);
        assert_eq!(s.block_start, t / N_SIMD as u32 * N_SIMD as u32);
    }
}

#[test]
fn relative_sends_are_measured_from_the_next_block() {
    let mut b = PatchBuilder::new(0, 0);
    let log = record_receiver(&mut b, "in");
    let mut cx = context(b, ContextOptions::default());
    run(&mut cx, 64);

    // 1 ms at 48 kHz is 48 samples.
    assert!(cx.send_message_to_receiver_after(string_to_hash("in"), 1.0, &[Element::Bang]));
    run(&mut cx, 128);
    let seen = log.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].timestamp, 64 + 48);
}

// ============================================================================
// 3. Delay commands
// ============================================================================

fn delay_patch(ms: f32) -> (Context, Log) {
    let mut b = PatchBuilder::new(0, 0);
    let r = b.add_receive("d");
    let d = b.add(Delay::new(ms));
    let log = Log::default();
    let rec = b.add(Recorder {
        log: Arc::clone(&log),
    });
    b.connect(r, 0, d, 0).unwrap();
    b.connect(d, 0, rec, 0).unwrap();
    (context(b, ContextOptions::default()), log)
}

#[test]
fn delay_flush_emits_pending_at_flush_time() {
    let (mut cx, log) = delay_patch(10.0);
    let h = string_to_hash("d");
    for v in [1.0, 2.0, 3.0] {
        cx.send_float_to_receiver(h, v);
    }
    run(&mut cx, 64);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(cx.pending_messages(), 3);

    cx.send_symbol_to_receiver(h, "flush");
    run(&mut cx, 64);
    assert_eq!(floats(&log), vec![1.0, 2.0, 3.0]);
    assert!(log.lock().unwrap().iter().all(|s| s.timestamp == 64));

    // Nothing left to fire when the original due time passes.
    run(&mut cx, 1024);
    assert_eq!(log.lock().unwrap().len(), 3);
    assert_eq!(cx.pending_messages(), 0);
}

#[test]
fn delay_clear_drops_pending() {
    let (mut cx, log) = delay_patch(10.0);
    let h = string_to_hash("d");
    for v in [1.0, 2.0, 3.0] {
        cx.send_float_to_receiver(h, v);
    }
    run(&mut cx, 64);
    assert_eq!(cx.pending_messages(), 3);
    cx.send_symbol_to_receiver(h, "clear");
    run(&mut cx, 1024);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(cx.pending_messages(), 0);
}

#[test]
fn delay_fires_once_per_input() {
    let (mut cx, log) = delay_patch(1.0);
    cx.send_float_to_receiver(string_to_hash("d"), 7.0);
    run(&mut cx, 256);
    let seen = log.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].timestamp, 48);
    assert_eq!(seen[0].element, Element::Float(7.0));
}

// ============================================================================
// 4. Tables
// ============================================================================

#[test]
fn table_write_at_last_index() {
    let mut t = Table::new(4);
    t.write(3, 1.0);
    assert_eq!(t.read(3), 1.0);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic]
fn table_write_past_end_panics() {
    let mut t = Table::new(4);
    t.write(4, 1.0);
}

// ============================================================================
// 5. Signal processing
// ============================================================================

#[test]
fn biquad_matches_scalar_recurrence() {
    let coeffs = [0.2, 0.4, 0.2, -0.5, 0.1];
    let mut b = PatchBuilder::new(1, 1);
    let bq = b.add(BiquadK::new(coeffs));
    b.adc(0, bq, 0).unwrap();
    b.dac(bq, 0, 0).unwrap();
    let mut cx = context(b, ContextOptions::default());

    let input = generate_sine(1_000.0, SAMPLE_RATE as f32, 512);
    let mut output = vec![0.0; input.len()];
    assert_eq!(
        cx.process(&[&input], &mut [&mut output[..]], input.len()),
        input.len()
    );

    let mut state = BiquadState::default();
    for (i, (&x, &y)) in input.iter().zip(&output).enumerate() {
        let expected = state.tick(x, coeffs);
        assert!(
            (expected - y).abs() < 1e-4,
            "sample {i}: expected {expected}, got {y}"
        );
    }
}

#[test]
fn envelope_reports_full_scale_dc() {
    let mut b = PatchBuilder::new(0, 0);
    let v = b.add(SignalVar::new(1.0));
    let env = b.add(Envelope::new(256, 128));
    let log = Log::default();
    let rec = b.add(Recorder {
        log: Arc::clone(&log),
    });
    b.connect_signal(v, 0, env, 0).unwrap();
    b.connect(env, 0, rec, 0).unwrap();
    let mut cx = context(b, ContextOptions::default());

    run(&mut cx, 1024);
    let levels = floats(&log);
    assert!(!levels.is_empty());
    for db in levels {
        assert!((db - 100.0).abs() < 0.01, "level {db}");
    }
}

// ============================================================================
// 6. Random
// ============================================================================

#[test]
fn random_sequence_matches_generator() {
    let mut b = PatchBuilder::new(0, 0);
    let r = b.add_receive("go");
    let rnd = b.add(Random::new(7));
    let log = Log::default();
    let rec = b.add(Recorder {
        log: Arc::clone(&log),
    });
    b.connect(r, 0, rnd, 0).unwrap();
    b.connect(rnd, 0, rec, 0).unwrap();
    let mut cx = context(b, ContextOptions::default());

    for _ in 0..5 {
        cx.send_bang_to_receiver(string_to_hash("go"));
    }
    run(&mut cx, N_SIMD);

    let mut state: u64 = 7;
    let expected: Vec<f32> = (0..5)
        .map(|_| {
            state = state * 279_470_273 % 2_147_483_647;
            (state >> 8) as f32 / 8_388_608.0
        })
        .collect();
    assert_eq!(floats(&log), expected);
    assert!(expected.iter().all(|v| (0.0..1.0).contains(v)));
}

// ============================================================================
// 7. Mailbox overload
// ============================================================================

#[test]
fn full_input_mailbox_drops_excess() {
    let mut b = PatchBuilder::new(0, 0);
    let log = record_receiver(&mut b, "in");
    let opts = ContextOptions::default()
        .with_input_queue_kb(1)
        .with_pool_kb(64);
    let mut cx = context(b, opts);
    let mut tx = cx.sender().unwrap();
    let h = string_to_hash("in");

    let mut accepted = 0;
    while tx.send_float_to_receiver(h, accepted as f32) {
        accepted += 1;
        assert!(accepted < 10_000, "mailbox never filled");
    }
    assert!(accepted > 0);
    assert!(!tx.send_float_to_receiver(h, -1.0));

    run(&mut cx, N_SIMD);
    let expected: Vec<f32> = (0..accepted).map(|i| i as f32).collect();
    assert_eq!(floats(&log), expected);

    // Draining frees the ring again.
    assert!(tx.send_float_to_receiver(h, 0.0));
}

#[test]
fn oversized_mailbox_messages_are_refused() {
    let mut b = PatchBuilder::new(0, 0);
    let log = record_receiver(&mut b, "in");
    let mut cx = context(b, ContextOptions::default());
    let mut tx = cx.sender().unwrap();
    let h = string_to_hash("in");

    let too_long = vec![Element::Float(1.0); MAX_BLOCK_ELEMENTS + 1];
    assert!(!tx.send_message_to_receiver(h, 0, &too_long));
    let longest = vec![Element::Float(2.0); MAX_BLOCK_ELEMENTS];
    assert!(tx.send_message_to_receiver(h, 0, &longest));

    run(&mut cx, N_SIMD);
    assert_eq!(floats(&log), vec![2.0]);
}

// ============================================================================
// 8. Send and receive
// ============================================================================

#[test]
fn internal_send_reaches_every_receiver() {
    let mut b = PatchBuilder::new(0, 0);
    let r = b.add_receive("in");
    let s = b.add_send("bus", false);
    b.connect(r, 0, s, 0).unwrap();
    let first = record_receiver(&mut b, "bus");
    let second = record_receiver(&mut b, "bus");
    let mut cx = context(b, ContextOptions::default());

    cx.send_float_to_receiver(string_to_hash("in"), 0.5);
    run(&mut cx, N_SIMD);
    assert_eq!(floats(&first), vec![0.5]);
    assert_eq!(floats(&second), vec![0.5]);
}

#[test]
fn load_bang_reaches_init_receiver() {
    let mut b = PatchBuilder::new(0, 0);
    let log = record_receiver(&mut b, "__hv_init");
    let mut cx = context(b, ContextOptions::default());
    run(&mut cx, N_SIMD);
    run(&mut cx, N_SIMD);
    let seen = log.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].element, Element::Bang);
    assert_eq!(seen[0].timestamp, 0);
}

// ============================================================================
// 9. Pool exhaustion
// ============================================================================

#[test]
#[should_panic(expected = "message pool exhausted")]
fn delays_overflowing_the_pool_abort() {
    let mut b = PatchBuilder::new(0, 0);
    let r = b.add_receive("d");
    // More pending delays than a 1 kb pool has slots.
    for _ in 0..512 {
        let d = b.add(Delay::new(1.0));
        b.connect(r, 0, d, 0).unwrap();
    }
    let mut cx = context(b, ContextOptions::default().with_pool_kb(1));
    cx.send_bang_to_receiver(string_to_hash("d"));
    run(&mut cx, N_SIMD);
}

#[test]
#[should_panic(expected = "message pool exhausted")]
fn host_sends_overflowing_the_pool_abort() {
    let mut b = PatchBuilder::new(0, 0);
    let _log = record_receiver(&mut b, "in");
    let mut cx = context(b, ContextOptions::default().with_pool_kb(1));
    let h = string_to_hash("in");
    for i in 0..10_000 {
        cx.send_float_to_receiver(h, i as f32);
    }
}

#[test]
#[should_panic(expected = "message pool exhausted")]
fn mailbox_drain_overflowing_the_pool_aborts() {
    let mut b = PatchBuilder::new(0, 0);
    let _log = record_receiver(&mut b, "in");
    let opts = ContextOptions::default()
        .with_input_queue_kb(64)
        .with_pool_kb(1);
    let mut cx = context(b, opts);
    let mut tx = cx.sender().unwrap();
    let h = string_to_hash("in");
    // Due far in the future, so nothing fires and frees its slot.
    for _ in 0..1_000 {
        assert!(tx.send_message_to_receiver(h, 1 << 20, &[Element::Bang]));
    }
    run(&mut cx, N_SIMD);
}

#[test]
#[should_panic(expected = "message pool exhausted")]
fn load_bang_without_pool_space_aborts() {
    let mut b = PatchBuilder::new(0, 0);
    let _log = record_receiver(&mut b, "__hv_init");
    let _ = context(b, ContextOptions::default().with_pool_kb(0));
}
