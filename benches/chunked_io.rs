//! Throughput benchmarks for the write/read path across the chunking
//! boundary (§4.2, §4.4): single-call `writeFile`/`readFile` against a
//! multi-chunk blob, and the streaming adapters pushing in small pieces.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kfs::key::FileKey;
use kfs::table::DEFAULT_CHUNK_SIZE;
use kfs::Table;
use tokio::runtime::Runtime;

fn rt() -> Runtime {
    Runtime::new().unwrap()
}

fn key_for(i: u64) -> FileKey {
    let mut bytes = [0u8; 20];
    bytes[12..20].copy_from_slice(&i.to_be_bytes());
    FileKey::from_bytes(bytes)
}

fn bench_write_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_file");
    for &blobs_of in &[1usize, 4, 16] {
        let size = blobs_of * DEFAULT_CHUNK_SIZE;
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let runtime = rt();
            let dir = tempfile::tempdir().unwrap();
            let table = runtime.block_on(Table::open(dir.path().join("bench.kfs"), None)).unwrap();
            let data = vec![0x5au8; size];
            let mut counter = 0u64;

            b.iter(|| {
                counter += 1;
                let key = key_for(counter);
                runtime.block_on(table.write_file(&key, &data)).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_read_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_file");
    for &blobs_of in &[1usize, 4, 16] {
        let size = blobs_of * DEFAULT_CHUNK_SIZE;
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let runtime = rt();
            let dir = tempfile::tempdir().unwrap();
            let table = runtime.block_on(Table::open(dir.path().join("bench.kfs"), None)).unwrap();
            let data = vec![0x5au8; size];
            let key = key_for(1);
            runtime.block_on(table.write_file(&key, &data)).unwrap();

            b.iter(|| {
                let read = runtime.block_on(table.read_file(&key)).unwrap();
                criterion::black_box(read);
            });
        });
    }
    group.finish();
}

fn bench_streaming_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming_push");
    let total = 8 * DEFAULT_CHUNK_SIZE;
    for &piece in &[1024usize, 8192, 65536] {
        group.throughput(Throughput::Bytes(total as u64));
        group.bench_with_input(BenchmarkId::from_parameter(piece), &piece, |b, &piece| {
            let runtime = rt();
            let dir = tempfile::tempdir().unwrap();
            let table = runtime.block_on(Table::open(dir.path().join("bench.kfs"), None)).unwrap();
            let data = vec![0x3cu8; total];
            let mut counter = 0u64;

            b.iter(|| {
                counter += 1;
                let key = key_for(counter);
                runtime.block_on(async {
                    let mut stream = table
                        .create_write_stream(&key, Some(total as u64))
                        .await
                        .unwrap();
                    for chunk in data.chunks(piece) {
                        stream.push(chunk).await.unwrap();
                    }
                    stream.end().await.unwrap();
                });
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_write_file, bench_read_file, bench_streaming_push);
criterion_main!(benches);
