use cbuffer::CircularBuffer;
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_throughput(c: &mut Criterion) {
    let mut storage = vec![0u8; 1 << 16];
    let mut cb = CircularBuffer::with_region(&mut storage, 1 << 16).unwrap();
    let payload = [0x11u8; 64];
    let mut out = [0u8; 64];

    c.bench_function("spsc_roundtrip_64b", |b| {
        b.iter(|| {
            cb.write(&payload);
            cb.read(&mut out);
        })
    });

    let (mut producer, mut consumer) = cb.split();
    c.bench_function("split_roundtrip_64b", |b| {
        b.iter(|| {
            producer.write(&payload);
            consumer.read(&mut out);
        })
    });
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
