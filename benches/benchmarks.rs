//! Criterion benchmarks for HierarchicalMemory.

use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use tempfile::TempDir;

use hierarchical_memory::engine::{MemoryFilter, QueryEngine, RankBy, WriteEngine};
use hierarchical_memory::format::{MemoryReader, MemoryWriter};
use hierarchical_memory::graph::{detect_cycle, MemoryIndex};
use hierarchical_memory::store::HierarchicalMemory;
use hierarchical_memory::types::{MemoryLevel, ValidationLimits};

const TAGS: [&str; 5] = ["rust", "python", "web", "infra", "notes"];

/// Build an index where roughly a third of the entries are roots and the
/// rest hang under a random earlier entry.
fn make_index(count: usize) -> (MemoryIndex, Vec<String>) {
    let engine = WriteEngine::new(ValidationLimits::default());
    let mut index = MemoryIndex::new();
    let mut ids: Vec<String> = Vec::with_capacity(count);
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let parent = if ids.is_empty() || rng.gen_bool(0.3) {
            None
        } else {
            Some(ids[rng.gen_range(0..ids.len())].clone())
        };
        let tags = vec![
            TAGS[i % TAGS.len()].to_string(),
            TAGS[(i / 7) % TAGS.len()].to_string(),
        ];
        let level = MemoryLevel::ALL[i % 3];
        let id = engine
            .add(
                &mut index,
                &format!("memory number {i} about {}", TAGS[i % TAGS.len()]),
                level,
                tags,
                parent.as_deref(),
            )
            .unwrap();
        ids.push(id);
    }
    (index, ids)
}

fn bench_add_to_index(c: &mut Criterion) {
    let engine = WriteEngine::new(ValidationLimits::default());
    let (index, ids) = make_index(10_000);
    let mut rng = rand::thread_rng();

    c.bench_function("add_entry_to_10k", |b| {
        b.iter_batched(
            || index.clone(),
            |mut idx| {
                let parent = &ids[rng.gen_range(0..ids.len())];
                engine
                    .add(&mut idx, "new entry", MemoryLevel::ShortTerm, Vec::new(), Some(parent))
                    .unwrap()
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_store_add(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let store = HierarchicalMemory::new(dir.path()).unwrap();
    for i in 0..1_000 {
        store.add(&format!("seed {i}"), MemoryLevel::MediumTerm, &["seed"], None);
    }

    c.bench_function("store_add_with_save_1k", |b| {
        b.iter(|| store.add("bench", MemoryLevel::ShortTerm, &["bench"], None))
    });
}

fn bench_tag_search(c: &mut Criterion) {
    let (index, _) = make_index(100_000);
    let query = QueryEngine::new();
    let filter = MemoryFilter::AllTags(vec!["rust".into(), "web".into()]);

    c.bench_function("tag_search_100k", |b| b.iter(|| query.select(&index, &filter)));
}

fn bench_content_search(c: &mut Criterion) {
    let (index, _) = make_index(100_000);
    let query = QueryEngine::new();
    let substring = MemoryFilter::Content("NUMBER 4242".into());
    let regex = MemoryFilter::regex(r"number \d+2 about (rust|web)").unwrap();

    c.bench_function("content_search_100k", |b| {
        b.iter(|| query.select(&index, &substring))
    });
    c.bench_function("regex_search_100k", |b| b.iter(|| query.select(&index, &regex)));
}

fn bench_ranking(c: &mut Criterion) {
    let (mut index, ids) = make_index(100_000);
    let query = QueryEngine::new();
    let mut rng = rand::thread_rng();
    let sample: Vec<String> = (0..10_000)
        .map(|_| ids[rng.gen_range(0..ids.len())].clone())
        .collect();
    query.touch_all(&mut index, &sample);

    c.bench_function("most_accessed_top10_100k", |b| {
        b.iter(|| query.rank(&index, RankBy::MostAccessed, 10))
    });
}

fn bench_cycle_check(c: &mut Criterion) {
    let (index, ids) = make_index(100_000);
    let mut rng = rand::thread_rng();

    c.bench_function("detect_cycle_100k", |b| {
        b.iter(|| {
            let parent = &ids[rng.gen_range(0..ids.len())];
            let child = &ids[rng.gen_range(0..ids.len())];
            detect_cycle(&index, parent, child)
        })
    });
}

fn bench_write_file_10k(c: &mut Criterion) {
    let (index, _) = make_index(10_000);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memories.json");

    c.bench_function("write_file_10k", |b| {
        b.iter(|| MemoryWriter::write_to_file(&index, &path).unwrap())
    });
}

fn bench_read_file_10k(c: &mut Criterion) {
    let (index, _) = make_index(10_000);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memories.json");
    MemoryWriter::write_to_file(&index, &path).unwrap();

    c.bench_function("read_file_10k", |b| {
        b.iter(|| MemoryReader::read_from_file(&path).unwrap())
    });
}

criterion_group!(
    benches,
    bench_add_to_index,
    bench_store_add,
    bench_tag_search,
    bench_content_search,
    bench_ranking,
    bench_cycle_check,
    bench_write_file_10k,
    bench_read_file_10k,
);
criterion_main!(benches);
