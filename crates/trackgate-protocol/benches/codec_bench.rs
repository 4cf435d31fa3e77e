//! Performance benchmarks for the wire codec.
//!
//! Run with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};
use trackgate_core::{MessageId, TerminalId};
use trackgate_protocol::{seal, FrameHeader, LocationRecord, Response, TrackerCodec};

fn terminal() -> TerminalId {
    TerminalId::new("123456789010").unwrap()
}

/// Sealed heartbeat frame.
fn heartbeat_frame() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&0x0002u16.to_be_bytes());
    payload.extend_from_slice(&0u16.to_be_bytes());
    payload.extend_from_slice(&terminal().to_bcd());
    payload.extend_from_slice(&1u16.to_be_bytes());
    seal(&payload).to_vec()
}

/// Sealed location frame with a handful of TLV extras.
fn location_frame() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&3u32.to_be_bytes());
    body.extend_from_slice(&31_258_960u32.to_be_bytes());
    body.extend_from_slice(&12_826_744u32.to_be_bytes());
    body.extend_from_slice(&100u16.to_be_bytes());
    body.extend_from_slice(&200u16.to_be_bytes());
    body.extend_from_slice(&90u16.to_be_bytes());
    body.extend_from_slice(&[0x24, 0x03, 0x15, 0x12, 0x30, 0x45]);
    body.extend_from_slice(&[0x01, 0x04, 0x00, 0x00, 0x00, 0x64]);
    body.extend_from_slice(&[0x33, 0x01, 0x08]);
    body.extend_from_slice(&[0x34, 0x01, 0x01]);

    let mut payload = Vec::new();
    payload.extend_from_slice(&0x0200u16.to_be_bytes());
    payload.extend_from_slice(&(body.len() as u16).to_be_bytes());
    payload.extend_from_slice(&terminal().to_bcd());
    payload.extend_from_slice(&2u16.to_be_bytes());
    payload.extend_from_slice(&body);
    seal(&payload).to_vec()
}

fn bench_decode_heartbeat(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_heartbeat");
    group.throughput(Throughput::Elements(1));

    let wire = heartbeat_frame();
    group.bench_function("reframe_and_open", |b| {
        b.iter(|| {
            let mut codec = TrackerCodec::new();
            let mut buffer = BytesMut::from(&wire[..]);
            let frame = codec.decode(&mut buffer).unwrap().unwrap();
            black_box(frame);
        });
    });

    group.finish();
}

fn bench_decode_location(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_location");
    group.throughput(Throughput::Elements(1));

    let wire = location_frame();
    group.bench_function("full_decode_with_tlvs", |b| {
        b.iter(|| {
            let mut codec = TrackerCodec::new();
            let mut buffer = BytesMut::from(&wire[..]);
            let frame = codec.decode(&mut buffer).unwrap().unwrap();
            let interior = match frame {
                trackgate_protocol::RawFrame::Binary(interior) => interior,
                other => panic!("unexpected frame {other:?}"),
            };
            let (_, body) = FrameHeader::from_interior(&interior).unwrap();
            let record = LocationRecord::decode(&body).unwrap();
            black_box(record);
        });
    });

    group.finish();
}

fn bench_encode_ack(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_ack");
    group.throughput(Throughput::Elements(1));

    group.bench_function("general_ack", |b| {
        b.iter(|| {
            let mut codec = TrackerCodec::new();
            let mut out = BytesMut::new();
            let ack = Response::general_ack(terminal(), 1, MessageId::TerminalHeartbeat);
            codec.encode(black_box(ack), &mut out).unwrap();
            black_box(out);
        });
    });

    group.finish();
}

fn bench_decode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_batch");

    for batch_size in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(batch_size as u64));

        let mut stream = Vec::new();
        for _ in 0..batch_size {
            stream.extend_from_slice(&location_frame());
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, _| {
                b.iter(|| {
                    let mut codec = TrackerCodec::new();
                    let mut buffer = BytesMut::from(&stream[..]);
                    let mut count = 0;
                    while let Ok(Some(_)) = codec.decode(&mut buffer) {
                        count += 1;
                    }
                    black_box(count);
                });
            },
        );
    }

    group.finish();
}

fn bench_decode_partial_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_partial_streaming");
    group.throughput(Throughput::Elements(1));

    let wire = location_frame();
    for chunk_size in [8usize, 16, 32] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("chunk_{chunk_size}_bytes")),
            &chunk_size,
            |b, &size| {
                b.iter(|| {
                    let mut codec = TrackerCodec::new();
                    let mut result = None;
                    for chunk in wire.chunks(size) {
                        let mut buf = BytesMut::from(chunk);
                        if let Ok(Some(frame)) = codec.decode(&mut buf) {
                            result = Some(frame);
                            break;
                        }
                    }
                    black_box(result);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_decode_heartbeat,
    bench_decode_location,
    bench_encode_ack,
    bench_decode_batch,
    bench_decode_partial_streaming,
);

criterion_main!(benches);
