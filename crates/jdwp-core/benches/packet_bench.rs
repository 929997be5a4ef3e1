//! Criterion benchmarks for the JDWP packet codec.
//!
//! Measures encode and decode latency across payload sizes, plus the cost
//! of parsing a realistic `AllClasses` reply body.
//!
//! Run with:
//! ```bash
//! cargo bench --package jdwp-core --bench packet_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jdwp_core::commands::vm::AllClasses;
use jdwp_core::{
    decode_packet, encode_command, encode_packet, CommandPacket, IdSizes, JdwpCommand, Packet,
    PayloadWriter, ReplyFrame, ReplyPacket,
};

const PAYLOAD_SIZES: &[usize] = &[0, 64, 1024, 65535];

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn make_reply(len: usize) -> Packet {
    Packet::Reply(ReplyFrame {
        id: 42,
        flags: 0x80,
        packet: ReplyPacket {
            error_code: 0,
            data: vec![0xA5; len],
        },
    })
}

/// An `AllClasses` body listing `n` classes.
fn make_all_classes_body(n: usize) -> Vec<u8> {
    let mut w = PayloadWriter::default();
    w.write_i32(n as i32);
    for i in 0..n {
        w.write_u8(1);
        w.write_u64(i as u64);
        w.write_string(&format!("Lcom/example/Class{i};"))
            .expect("fixture string fits");
        w.write_i32(7);
    }
    w.into_bytes()
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_encode_command(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_command");
    for &len in PAYLOAD_SIZES {
        let packet = CommandPacket::with_data(1, 1, vec![0x5A; len]);
        group.bench_with_input(BenchmarkId::from_parameter(len), &packet, |b, p| {
            b.iter(|| encode_command(black_box(7), black_box(p)))
        });
    }
    group.finish();
}

fn bench_decode_reply(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_reply");
    for &len in PAYLOAD_SIZES {
        let bytes = encode_packet(&make_reply(len)).expect("fixture must encode");
        group.bench_with_input(BenchmarkId::from_parameter(len), &bytes, |b, bytes| {
            b.iter(|| decode_packet(black_box(bytes)))
        });
    }
    group.finish();
}

fn bench_parse_all_classes(c: &mut Criterion) {
    let body = make_all_classes_body(2_000);
    c.bench_function("parse_all_classes_2000", |b| {
        b.iter(|| AllClasses::parse_reply(black_box(&body), IdSizes::default()))
    });
}

criterion_group!(
    benches,
    bench_encode_command,
    bench_decode_reply,
    bench_parse_all_classes
);
criterion_main!(benches);
