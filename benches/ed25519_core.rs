use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ed25519_core::{
    ge_scalarmult_base, ristretto255_from_hash, sc_muladd, GeP2, GeP3,
};

const SCALAR: [u8; 32] = [
    0x77, 0x07, 0x6a, 0x0a, 0x73, 0x18, 0xa5, 0x7d, 0x3c, 0x16, 0xc1, 0x72,
    0x51, 0xb2, 0x66, 0x45, 0xdf, 0x4c, 0x2f, 0x87, 0xeb, 0xc0, 0x99, 0x2a,
    0xb1, 0x77, 0xfb, 0xa5, 0x1d, 0xb9, 0x2c, 0x0a,
];

const OTHER_SCALAR: [u8; 32] = [
    0x5d, 0xab, 0x08, 0x7e, 0x62, 0x4a, 0x8a, 0x4b, 0x79, 0xe1, 0x7f, 0x8b,
    0x83, 0x80, 0x0e, 0xe6, 0x6f, 0x3b, 0xb1, 0x29, 0x26, 0x18, 0xb6, 0xfd,
    0x1c, 0x2f, 0x8b, 0x27, 0xff, 0x88, 0xe0, 0x0b,
];

fn criterion_benchmark(c: &mut Criterion) {
    let point = ge_scalarmult_base(&OTHER_SCALAR);

    c.bench_function("scalarmult_base", |b| {
        b.iter(|| ge_scalarmult_base(black_box(&SCALAR)))
    });

    c.bench_function("scalarmult", |b| {
        b.iter(|| black_box(&point).scalarmult(black_box(&SCALAR)))
    });

    c.bench_function("double_scalarmult_vartime", |b| {
        b.iter(|| {
            GeP2::double_scalarmult_vartime(
                black_box(&SCALAR),
                black_box(&point),
                black_box(&OTHER_SCALAR),
            )
        })
    });

    let encoded = point.to_bytes();
    c.bench_function("decode", |b| b.iter(|| GeP3::from_bytes(black_box(&encoded))));

    let mut digest = [0u8; 64];
    digest[..32].copy_from_slice(&SCALAR);
    digest[32..].copy_from_slice(&OTHER_SCALAR);
    c.bench_function("ristretto255_from_hash", |b| {
        b.iter(|| ristretto255_from_hash(black_box(&digest)))
    });

    c.bench_function("sc_muladd", |b| {
        let mut s = [0u8; 32];
        b.iter(|| {
            sc_muladd(&mut s, black_box(&SCALAR), &OTHER_SCALAR, &SCALAR);
            s
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
