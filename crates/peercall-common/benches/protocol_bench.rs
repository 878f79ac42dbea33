// Criterion benchmarks for the peercall-common protocol layer
//
// Run benchmarks with:
//   cargo bench -p peercall-common
//
// For detailed output with plots:
//   cargo bench -p peercall-common -- --save-baseline main

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use peercall_common::transport::BinaryCodec;
use peercall_common::wire::{decode_args, decode_result, encode_args, encode_result, Value};
use peercall_common::{procs, Request, Response};

fn bench_args_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("args_encoding");

    let strcat_args = [Value::Str("foo".into()), Value::Str("bar".into())];
    group.bench_function("encode_strcat", |b| {
        b.iter(|| encode_args(black_box(&procs::STRCAT), black_box(&strcat_args)));
    });

    let long = "x".repeat(250);
    let long_args = [Value::Str(long.clone()), Value::Str("y".into())];
    group.bench_function("encode_near_bound", |b| {
        b.iter(|| encode_args(black_box(&procs::STRCAT), black_box(&long_args)));
    });

    group.bench_function("encode_empty", |b| {
        b.iter(|| encode_args(black_box(&procs::COUNT), black_box(&[])));
    });

    group.finish();
}

fn bench_args_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("args_decoding");

    let strcat_args = [Value::Str("foo".into()), Value::Str("bar".into())];
    let payload = encode_args(&procs::STRCAT, &strcat_args).unwrap();
    group.bench_function("decode_strcat", |b| {
        b.iter(|| decode_args(black_box(&procs::STRCAT), black_box(&payload)));
    });

    let stat_payload = encode_result(
        &procs::STAT,
        Some(&Value::Blob(
            procs::StatInfo {
                dev: 0x0801,
                ino: 42,
                mode: 0o100644,
                rdev: 0,
                size: 4096,
            }
            .to_wire(),
        )),
    )
    .unwrap();
    group.bench_function("decode_stat_result", |b| {
        b.iter(|| decode_result(black_box(&procs::STAT), black_box(&stat_payload)));
    });

    group.finish();
}

fn bench_envelope_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_serialization");

    let args = encode_args(
        &procs::STRCAT,
        &[Value::Str("foo".into()), Value::Str("bar".into())],
    )
    .unwrap();
    let request = Request::new(1, procs::STRCAT.name, args);
    group.bench_function("encode_request", |b| {
        b.iter(|| BinaryCodec::encode_request(black_box(&request)));
    });

    let encoded = BinaryCodec::encode_request(&request).unwrap();
    group.bench_function("decode_request", |b| {
        b.iter(|| BinaryCodec::decode_request(black_box(&encoded)));
    });

    let response = Response::success(1, vec![0, 6, b'f', b'o', b'o', b'b', b'a', b'r']);
    group.bench_function("encode_response", |b| {
        b.iter(|| BinaryCodec::encode_response(black_box(&response)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_args_encoding,
    bench_args_decoding,
    bench_envelope_serialization,
);
criterion_main!(benches);
