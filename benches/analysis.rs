use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use jmdict_bot::{Analyzer, Lexicon, create_ngrams, snapshot};
use std::sync::{Arc, OnceLock};

static SAMPLE: &str = include_str!("../data/sample_jmdict.xml");

fn lexicon() -> Arc<Lexicon> {
    static LEXICON: OnceLock<Arc<Lexicon>> = OnceLock::new();
    LEXICON
        .get_or_init(|| Arc::new(Lexicon::from_reader(SAMPLE.as_bytes()).expect("sample lexicon")))
        .clone()
}

fn bench_load(c: &mut Criterion) {
    c.bench_function("load::parse_xml", |b| {
        b.iter(|| {
            let lexicon = Lexicon::from_reader(SAMPLE.as_bytes()).expect("parse sample");
            black_box(lexicon.len());
        });
    });

    let bytes = snapshot::encode(lexicon().entries()).expect("encode snapshot");
    c.bench_function("load::decode_snapshot", |b| {
        b.iter(|| {
            let entries = snapshot::decode(&bytes).expect("decode snapshot");
            black_box(entries.len());
        });
    });
}

fn bench_ngrams(c: &mut Criterion) {
    const PHRASE: &str = "今日は日本語の勉強をしました";
    for size in [1usize, 2, 4] {
        c.bench_with_input(BenchmarkId::new("ngrams", size), &size, |b, &size| {
            b.iter(|| black_box(create_ngrams(PHRASE, size).expect("valid size").len()));
        });
    }
}

fn bench_analyse(c: &mut Criterion) {
    let analyzer = Analyzer::new(lexicon());
    const PHRASES: &[&str] = &[
        "猫",
        "今日は日本語",
        "こんにちは、今日はパンを食べる人と橋を渡りました",
    ];
    for &phrase in PHRASES {
        let label = phrase.chars().count().to_string();
        c.bench_with_input(BenchmarkId::new("analyse", label), &phrase, |b, &phrase| {
            b.iter(|| black_box(analyzer.analyse(phrase).len()));
        });
    }
}

criterion_group!(benches, bench_load, bench_ngrams, bench_analyse);
criterion_main!(benches);
