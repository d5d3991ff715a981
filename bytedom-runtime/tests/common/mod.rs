//! Shared fixtures for runtime integration tests
#![allow(dead_code)]

use bytedom_runtime::bytecode::{Key, LoopOptions, Program, ProgramBuilder, SlotSource};
use bytedom_runtime::{MemoryHost, NodeId, RootElement, Runtime};
use serde_json::{json, Value};

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// A runtime over a fresh in-memory document and a container to render into
pub fn setup() -> (Runtime<MemoryHost>, NodeId) {
    init_tracing();
    let mut runtime = Runtime::new(MemoryHost::new());
    let container = runtime.host_mut().create_container("div");
    (runtime, container)
}

/// Props for the row table: `{"rows": [{"id": .., "label": "row <id>"}, ..]}`
pub fn rows(ids: &[i64]) -> Value {
    let rows: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "label": format!("row {}", id)}))
        .collect();
    json!({ "rows": rows })
}

fn row_collection(scope: &bytedom_runtime::bytecode::Scope<'_>) -> anyhow::Result<Vec<Value>> {
    Ok(scope.props()["rows"].as_array().cloned().unwrap_or_default())
}

fn row_key(
    _: &bytedom_runtime::bytecode::Scope<'_>,
    item: &Value,
    _: usize,
) -> anyhow::Result<Key> {
    Ok(Key::try_from(&item["id"])?)
}

/// `<ul>` whose only children are one `<li>` per row, keyed by id
pub fn row_list() -> ProgramBuilder {
    ProgramBuilder::new()
        .open("ul")
        .loop_map(
            row_collection,
            0,
            row_key,
            LoopOptions::new().with_props(|_, item, _| Ok(item.clone())),
            ProgramBuilder::new()
                .open("li")
                .attr_from("data-id", SlotSource::Prop("id".into()), 0)
                .text_node_from(SlotSource::Prop("label".into()), 1)
                .close(),
        )
        .close()
}

pub fn row_program() -> Program {
    row_list().build().expect("row program decodes")
}

/// Labels of the rendered rows, in document order
pub fn labels(host: &MemoryHost, container: NodeId) -> Vec<String> {
    host.elements_by_tag(container, "li")
        .into_iter()
        .map(|li| host.text_content(li))
        .collect()
}

pub fn row_ids(host: &MemoryHost, container: NodeId) -> Vec<i64> {
    host.elements_by_tag(container, "li")
        .into_iter()
        .filter_map(|li| host.attribute(li, "data-id").and_then(|id| id.parse().ok()))
        .collect()
}

pub fn render_rows(
    runtime: &mut Runtime<MemoryHost>,
    container: NodeId,
    program: &Program,
    ids: &[i64],
) {
    runtime
        .render(Some(RootElement::new(program.clone(), rows(ids))), &container)
        .expect("render succeeds");
}
