//! MEDCHAT Benchmark Suite
//!
//! Everything a chat request does locally around the one upstream call:
//!   compose_advisor ............ persona lookup + concatenation
//!   render_fixed_template ...... `{message}` substitution
//!   sanitize_reply_* ........... markup stripping on short and long replies
//!   health_report .............. parse + classify + summarise a reading

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use medchat_bench::{markdown_reply, QUESTION};
use medchat_core::{HealthReading, HealthReport};
use medchat_llm::{sanitize, FixedPersona, PersonaTable};

fn bench_compose(c: &mut Criterion) {
    let table = PersonaTable::advisor();
    c.bench_function("compose_advisor", |b| {
        b.iter(|| black_box(table.compose(black_box(Some("medication")), black_box(QUESTION))));
    });
}

fn bench_render(c: &mut Criterion) {
    c.bench_function("render_fixed_template", |b| {
        b.iter(|| black_box(FixedPersona::Condition.render(black_box(QUESTION))));
    });
}

fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize_reply");
    for paragraphs in [1usize, 10, 100] {
        let reply = markdown_reply(paragraphs);
        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &reply, |b, r| {
            b.iter(|| black_box(sanitize(black_box(r))));
        });
    }
    group.finish();
}

fn bench_health_report(c: &mut Criterion) {
    let body = json!({ "年龄": "52", "gender": "男", "收缩压": "150", "舒张压": "95", "体重": "80" });
    let fields = body.as_object().cloned().unwrap_or_default();
    c.bench_function("health_report", |b| {
        b.iter(|| {
            let reading = HealthReading::from_json(black_box(&fields));
            black_box(reading.map(|r| HealthReport::evaluate(&r).to_summary()))
        });
    });
}

criterion_group!(
    benches,
    bench_compose,
    bench_render,
    bench_sanitize,
    bench_health_report,
);
criterion_main!(benches);
