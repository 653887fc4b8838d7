use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use ontokb::{ObjectPropertyDeclaration, Ontology};

fn make_ontology() -> Ontology {
    let ontology = Ontology::default();
    ontology
        .declare_object_property(&ObjectPropertyDeclaration {
            name: "hasPart".to_string(),
            inverses: vec!["partOf".to_string()],
            chains: vec![vec!["hasPart".to_string(), "hasPart".to_string()]],
            ..ObjectPropertyDeclaration::default()
        })
        .unwrap();
    ontology.add_inverse_of("attachedTo", "holds").unwrap();
    ontology.add_inheritance("Component", "Thing").unwrap();
    for i in 0..256u32 {
        ontology.add_inheritance(&format!("part{i}"), "Component").unwrap();
    }
    ontology.close();
    ontology
}

fn bench_assert_with_inverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("assertion");
    group.throughput(Throughput::Elements(1));
    group.bench_function("assert_inverse", |b| {
        b.iter_custom(|iters| {
            let ontology = make_ontology();
            let start = Instant::now();
            for i in 0..iters {
                let subject = format!("part{}", i % 256);
                let object = format!("part{}", (i + 1) % 256);
                ontology.add_relation(&subject, "attachedTo", &object, 1.0).unwrap();
            }
            start.elapsed()
        })
    });
    group.finish();
}

fn bench_chain_cascade_and_retraction(c: &mut Criterion) {
    c.bench_function("assertion/chain_then_retract", |b| {
        b.iter_custom(|iters| {
            let ontology = make_ontology();
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..16 {
                    ontology
                        .add_relation(&format!("part{i}"), "hasPart", &format!("part{}", i + 1), 1.0)
                        .unwrap();
                }
                ontology.remove_relation("part0", "hasPart", Some("part1"), false).unwrap();
            }
            start.elapsed()
        })
    });
}

fn bench_queries(c: &mut Criterion) {
    let ontology = make_ontology();
    for i in 0..64 {
        ontology
            .add_relation(&format!("part{i}"), "hasPart", &format!("part{}", i + 1), 1.0)
            .unwrap();
    }
    c.bench_function("assertion/get_on", |b| {
        b.iter(|| ontology.individual().get_on("part0", "hasPart", None, false))
    });
    c.bench_function("assertion/find_fuzzy", |b| b.iter(|| ontology.individual().find_fuzzy("prt12")));
}

criterion_group!(
    assertion,
    bench_assert_with_inverse,
    bench_chain_cascade_and_retraction,
    bench_queries
);
criterion_main!(assertion);
