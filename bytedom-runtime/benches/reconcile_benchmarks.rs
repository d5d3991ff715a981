/// Benchmarks for mounting and reconciling keyed row lists
use bytedom_runtime::bytecode::{Key, LoopOptions, Program, ProgramBuilder, SlotSource};
use bytedom_runtime::{MemoryHost, NodeId, RootElement, Runtime};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use serde_json::{json, Value};

fn row_program() -> Program {
    ProgramBuilder::new()
        .open("tbody")
        .loop_map(
            |scope| Ok(scope.props()["rows"].as_array().cloned().unwrap_or_default()),
            0,
            |_, item, _| Ok(Key::try_from(&item["id"])?),
            LoopOptions::new().with_props(|_, item, _| Ok(item.clone())),
            ProgramBuilder::new()
                .open("tr")
                .open("td")
                .class("col-md-1")
                .text_node_from(SlotSource::Prop("id".into()), 0)
                .close()
                .open("td")
                .class("col-md-4")
                .open("a")
                .text_node_from(SlotSource::Prop("label".into()), 1)
                .close()
                .close()
                .close(),
        )
        .close()
        .build()
        .expect("row program decodes")
}

fn rows(ids: impl IntoIterator<Item = i64>) -> Value {
    let rows: Vec<Value> = ids
        .into_iter()
        .map(|id| json!({"id": id, "label": format!("row {}", id)}))
        .collect();
    json!({ "rows": rows })
}

fn mounted(program: &Program, props: Value) -> (Runtime<MemoryHost>, NodeId) {
    let mut runtime = Runtime::new(MemoryHost::new());
    let container = runtime.host_mut().create_container("table");
    runtime
        .render(Some(RootElement::new(program.clone(), props)), &container)
        .expect("mount succeeds");
    (runtime, container)
}

fn benchmark_create(c: &mut Criterion) {
    let program = row_program();
    c.bench_function("create_1000_rows", |b| {
        b.iter_batched(
            || rows(0..1000),
            |props| black_box(mounted(&program, props)),
            BatchSize::LargeInput,
        )
    });
}

fn benchmark_swap(c: &mut Criterion) {
    let program = row_program();
    let mut swapped: Vec<i64> = (0..1000).collect();
    swapped.swap(1, 998);
    let swapped = rows(swapped);
    c.bench_function("swap_rows_1000", |b| {
        b.iter_batched(
            || mounted(&program, rows(0..1000)),
            |(mut runtime, container)| {
                runtime
                    .render(Some(RootElement::new(program.clone(), swapped.clone())), &container)
                    .expect("update succeeds");
                black_box(runtime)
            },
            BatchSize::LargeInput,
        )
    });
}

fn benchmark_replace(c: &mut Criterion) {
    let program = row_program();
    let replacement = rows(1000..2000);
    c.bench_function("replace_1000_rows", |b| {
        b.iter_batched(
            || mounted(&program, rows(0..1000)),
            |(mut runtime, container)| {
                runtime
                    .render(
                        Some(RootElement::new(program.clone(), replacement.clone())),
                        &container,
                    )
                    .expect("update succeeds");
                black_box(runtime)
            },
            BatchSize::LargeInput,
        )
    });
}

fn benchmark_noop_update(c: &mut Criterion) {
    let program = row_program();
    let props = rows(0..1000);
    let (mut runtime, container) = mounted(&program, props.clone());
    c.bench_function("noop_update_1000_rows", |b| {
        b.iter(|| {
            runtime
                .render(Some(RootElement::new(program.clone(), props.clone())), &container)
                .expect("update succeeds");
            runtime.host_mut().clear_ops();
        })
    });
}

criterion_group!(
    benches,
    benchmark_create,
    benchmark_swap,
    benchmark_replace,
    benchmark_noop_update
);
criterion_main!(benches);
