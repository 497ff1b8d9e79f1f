//! Template matching benchmarks

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use logzip::{templates_from_lines, MatchTree, TemplateMatcher};

const TEMPLATES: &[&str] = &[
    "Receiving block <*> src: <*> dest: <*>",
    "BLOCK* NameSystem.addStoredBlock: blockMap updated: <*> is added to <*> size <*>",
    "PacketResponder <*> for block <*> terminating",
    "Received block <*> of size <*> from <*>",
    "Deleting block <*> file <*>",
    "Verification succeeded for <*>",
    "<*> Served block <*> to <*>",
];

fn generate_contents(lines: usize) -> Vec<String> {
    (0..lines)
        .map(|i| match i % 6 {
            0 => format!("Receiving block blk_{} src: /10.250.{}.{}:50010 dest: /10.250.{}.1:50010", i, i % 256, i % 13, i % 7),
            1 => format!("PacketResponder {} for block blk_-{} terminating", i % 3, i * 7919),
            2 => format!("Received block blk_{} of size 67108864 from /10.251.{}.{}", i, i % 256, i % 91),
            3 => format!("Deleting block blk_{} file /mnt/hadoop/dfs/data/current/subdir{}/blk_{}", i, i % 64, i),
            4 => format!("Verification succeeded for blk_{}", i * 31),
            _ => format!("unknown message number {}", i),
        })
        .collect()
}

fn matching_benchmark(c: &mut Criterion) {
    let tree = MatchTree::build(&templates_from_lines(TEMPLATES.iter().copied())).unwrap();
    let matcher = TemplateMatcher::new(&tree);
    let contents = generate_contents(2_000);

    let mut group = c.benchmark_group("match");
    group.throughput(Throughput::Elements(contents.len() as u64));

    group.bench_function("match_content", |b| {
        b.iter(|| {
            for content in &contents {
                black_box(matcher.match_content(black_box(content)));
            }
        })
    });

    for workers in [1, 4] {
        group.bench_function(format!("match_all_{}_workers", workers), |b| {
            b.iter(|| matcher.match_all(black_box(&contents), workers).unwrap())
        });
    }

    group.finish();
}

fn build_benchmark(c: &mut Criterion) {
    let templates = templates_from_lines(TEMPLATES.iter().copied());
    c.bench_function("build_tree", |b| {
        b.iter(|| MatchTree::build(black_box(&templates)).unwrap())
    });
}

criterion_group!(benches, matching_benchmark, build_benchmark);
criterion_main!(benches);
