use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rustf_dialect::dialect::{rewrite_marks, Dialect, PlaceholderStyle, PostgresDialect};
use rustf_dialect::models::{FieldInfo, FieldType, ModelInfo, ModelQuery, OrderDirection};
use rustf_dialect::ExecContext;

fn benchmark_rewrite(c: &mut Criterion) {
    let short = "SELECT * FROM t WHERE a = ? AND b = ?";
    let wide = format!(
        "INSERT INTO t VALUES {}",
        vec!["(?, ?, ?, ?)"; 250].join(", ")
    );

    c.bench_function("rewrite_question_passthrough", |b| {
        b.iter(|| black_box(rewrite_marks(black_box(short), PlaceholderStyle::Question)))
    });

    c.bench_function("rewrite_numbered_short", |b| {
        b.iter(|| black_box(rewrite_marks(black_box(short), PlaceholderStyle::Numbered('$'))))
    });

    c.bench_function("rewrite_numbered_1000_marks", |b| {
        b.iter(|| black_box(rewrite_marks(black_box(&wide), PlaceholderStyle::Numbered('$'))))
    });
}

fn benchmark_select_build(c: &mut Criterion) {
    let model = ModelInfo::builder("posts")
        .field(FieldInfo::auto("id", FieldType::BigInteger))
        .field(FieldInfo::new("title", FieldType::VarChar))
        .field(FieldInfo::new("views", FieldType::Integer))
        .build()
        .unwrap();
    let dialect = PostgresDialect::new();
    let ctx = ExecContext::new().with_schema("tenant_a");

    c.bench_function("postgres_select_build", |b| {
        b.iter(|| {
            let stmt = ModelQuery::new(&dialect as &dyn Dialect, &model)
                .filter("title__icontains", "rust")
                .filter("views__gte", 10)
                .order_by("views", OrderDirection::Desc)
                .paginate(3, 20)
                .build_select(&ctx)
                .unwrap();
            black_box(stmt);
        })
    });
}

criterion_group!(benches, benchmark_rewrite, benchmark_select_build);
criterion_main!(benches);
