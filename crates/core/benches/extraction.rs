use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use legible_core::{
    Article, Components, ContentScorer, Document, HeuristicScorer, Sanitizer, StructuralSanitizer, normalize,
};

fn page(paragraphs: usize) -> String {
    let body: String = (0..paragraphs)
        .map(|i| {
            format!(
                "<div class=\"row\"><p>Paragraph {i} talks about tides, weather, and ships, at some length, \
                 so the scorer has real prose to weigh.</p><aside class=\"sidebar\"><a href=\"/{i}\">Related</a></aside></div>"
            )
        })
        .collect();

    format!(
        "<html><head><title>Benchmark Page | Site</title><meta charset=\"utf-8\"></head>\
         <body><nav class=\"menu\"><a href=\"/\">Home</a></nav><article class=\"post\">{body}</article>\
         <script>track()</script></body></html>"
    )
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for size in [10, 100, 1000] {
        let html = page(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &html, |b, html| {
            b.iter(|| Document::parse(black_box(html), None))
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let bytes = page(100).into_bytes();

    c.bench_function("normalize", |b| {
        b.iter(|| normalize(black_box(&bytes), Some("text/html; charset=iso-8859-1"), None))
    });
}

fn bench_sanitize(c: &mut Criterion) {
    let html = page(100);
    let sanitizer = StructuralSanitizer::default();

    c.bench_function("sanitize", |b| {
        b.iter(|| {
            let mut doc = Document::parse(&html, None).unwrap();
            sanitizer.prepare(black_box(&mut doc), &[]).unwrap();
        })
    });
}

fn bench_scoring(c: &mut Criterion) {
    let html = page(100);
    let scorer = HeuristicScorer::default();
    let mut doc = Document::parse(&html, None).unwrap();
    StructuralSanitizer::default().prepare(&mut doc, &[]).unwrap();

    c.bench_function("scoring_and_selection", |b| b.iter(|| scorer.extract(black_box(&mut doc), false)));
}

fn bench_full_extraction(c: &mut Criterion) {
    let html = page(100);
    let components = Components::default();

    c.bench_function("full_extraction", |b| {
        b.iter(|| {
            let doc = Document::parse(black_box(&html), None).unwrap();
            let mut article = Article::prepare(doc, None, &components, &[], tracing::Span::none()).unwrap();
            article.text_body().map(str::len).unwrap_or_default()
        })
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_normalize,
    bench_sanitize,
    bench_scoring,
    bench_full_extraction
);
criterion_main!(benches);
