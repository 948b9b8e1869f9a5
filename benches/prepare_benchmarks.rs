use criterion::{black_box, criterion_group, criterion_main, Criterion};
use native_query::prelude::*;
use native_query::sql::to_positional;
use serde_json::json;

fn find_by_name() -> QueryOperation {
    QueryOperation::new("UserRepository", "findByNameContaining")
        .inline_sql(
            "SELECT id, name FROM users WHERE 1 = 1 \
             {% if name %}AND name LIKE :name{% endif %} \
             AND status IN (:statuses)",
        )
        .argument(
            ArgumentDecl::plain::<String>("name")
                .with_param(ParamDecl::new("name").operator(Operator::Containing)),
        )
        .argument(ArgumentDecl::plain::<Vec<String>>("statuses"))
        .argument(ArgumentDecl::page("pageable"))
        .returns(ReturnType::of::<Page<String>>())
}

fn benchmark_resolve_cached(c: &mut Criterion) {
    let engine = QueryEngine::builder(NativeQueryConfig::default())
        .build()
        .expect("engine");
    let operation = find_by_name();

    c.bench_function("resolve_cached", |b| {
        b.iter(|| engine.resolve(black_box(&operation)))
    });
}

fn benchmark_prepare(c: &mut Criterion) {
    let engine = QueryEngine::builder(NativeQueryConfig::default())
        .build()
        .expect("engine");
    let operation = find_by_name();
    let page = PageRequest::new(2, 25).with_sort(Sort::by(Order::asc("name")));

    c.bench_function("prepare_paged", |b| {
        b.iter(|| {
            engine.prepare(
                black_box(&operation),
                &[
                    json!("al").into(),
                    json!(["ACTIVE", "PENDING"]).into(),
                    page.clone().into(),
                ],
            )
        })
    });
}

fn benchmark_to_positional(c: &mut Criterion) {
    let engine = QueryEngine::builder(NativeQueryConfig::default())
        .build()
        .expect("engine");
    let prepared = engine
        .prepare(
            &find_by_name(),
            &[
                json!("al").into(),
                json!(["ACTIVE", "PENDING"]).into(),
                PageRequest::new(0, 10).into(),
            ],
        )
        .expect("prepared");

    c.bench_function("to_positional", |b| {
        b.iter(|| to_positional(black_box(&prepared.sql), &prepared.parameters))
    });
}

criterion_group!(
    benches,
    benchmark_resolve_cached,
    benchmark_prepare,
    benchmark_to_positional
);
criterion_main!(benches);
