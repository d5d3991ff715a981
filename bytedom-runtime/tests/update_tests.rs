mod common;

use bytedom_runtime::bytecode::{ProgramBuilder, SlotSource};
use bytedom_runtime::{MemoryHost, RootElement, Runtime};
use common::*;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

fn toggle() -> ProgramBuilder {
    ProgramBuilder::new()
        .open_div()
        .ternary(
            |scope| Ok(scope.props()["on"].as_bool().unwrap_or(false)),
            0,
            ProgramBuilder::new().open_span().text("on").close(),
            ProgramBuilder::new().open("em").text("off").close(),
        )
        .text_node("|")
        .close()
}

#[test]
fn test_update_with_same_values_writes_nothing() {
    let (mut runtime, container) = setup();
    let program = ProgramBuilder::new()
        .open_div()
        .dynamic_class(|scope| Ok(scope.props()["class"].clone()), 0)
        .dynamic_style(|scope| Ok(scope.props()["style"].clone()), 1)
        .text_node_from(SlotSource::Prop("label".into()), 2)
        .close()
        .build()
        .unwrap();
    let props = json!({"class": "a", "style": "color: blue", "label": "x"});

    runtime
        .render(Some(RootElement::new(program.clone(), props.clone())), &container)
        .unwrap();
    runtime.host_mut().clear_ops();
    runtime
        .render(Some(RootElement::new(program, props)), &container)
        .unwrap();

    assert_eq!(runtime.host().write_count(), 0);
    assert!(runtime.host().ops().is_empty());
}

#[test]
fn test_update_writes_only_changed_values() {
    let (mut runtime, container) = setup();
    let program = ProgramBuilder::new()
        .open_div()
        .dynamic_class(|scope| Ok(scope.props()["class"].clone()), 0)
        .dynamic_text_node(|scope| Ok(scope.props()["label"].clone()), 1)
        .close()
        .build()
        .unwrap();

    runtime
        .render(
            Some(RootElement::new(program.clone(), json!({"class": "a", "label": "x"}))),
            &container,
        )
        .unwrap();
    runtime.host_mut().clear_ops();
    runtime
        .render(
            Some(RootElement::new(program, json!({"class": "a", "label": "y"}))),
            &container,
        )
        .unwrap();

    assert_eq!(runtime.host().write_count(), 1);
    assert_eq!(runtime.host().inner_html(container), r#"<div class="a">y</div>"#);
}

#[test]
fn test_ternary_switches_branch_in_place() {
    let (mut runtime, container) = setup();
    let program = toggle().build().unwrap();

    runtime
        .render(Some(RootElement::new(program.clone(), json!({"on": true}))), &container)
        .unwrap();
    assert_eq!(runtime.host().inner_html(container), "<div><span>on</span>|</div>");

    runtime
        .render(Some(RootElement::new(program.clone(), json!({"on": false}))), &container)
        .unwrap();
    assert_eq!(runtime.host().inner_html(container), "<div><em>off</em>|</div>");

    runtime
        .render(Some(RootElement::new(program, json!({"on": true}))), &container)
        .unwrap();
    assert_eq!(runtime.host().inner_html(container), "<div><span>on</span>|</div>");
}

#[test]
fn test_ternary_keeps_branch_when_rebranching_disabled() {
    init_tracing();
    let mut runtime = Runtime::builder(MemoryHost::new())
        .with_rebranch_ternaries(false)
        .build();
    let container = runtime.host_mut().create_container("div");
    let program = toggle().build().unwrap();

    runtime
        .render(Some(RootElement::new(program.clone(), json!({"on": true}))), &container)
        .unwrap();
    runtime
        .render(Some(RootElement::new(program, json!({"on": false}))), &container)
        .unwrap();

    assert_eq!(runtime.host().inner_html(container), "<div><span>on</span>|</div>");
}

#[test]
fn test_empty_branch_holds_its_position() {
    let (mut runtime, container) = setup();
    let program = ProgramBuilder::new()
        .open_div()
        .text_node("[")
        .ternary(
            |scope| Ok(scope.props()["show"].as_bool().unwrap_or(false)),
            0,
            ProgramBuilder::new().open("b").text("shown").close(),
            ProgramBuilder::new(),
        )
        .text_node("]")
        .close()
        .build()
        .unwrap();

    runtime
        .render(Some(RootElement::new(program.clone(), json!({"show": false}))), &container)
        .unwrap();
    assert_eq!(runtime.host().inner_html(container), "<div>[]</div>");

    runtime
        .render(Some(RootElement::new(program.clone(), json!({"show": true}))), &container)
        .unwrap();
    assert_eq!(runtime.host().inner_html(container), "<div>[<b>shown</b>]</div>");

    runtime
        .render(Some(RootElement::new(program, json!({"show": false}))), &container)
        .unwrap();
    assert_eq!(runtime.host().inner_html(container), "<div>[]</div>");
}

#[test]
fn test_component_receives_new_props_from_parent() {
    let (mut runtime, container) = setup();
    let child = ProgramBuilder::new()
        .open_span()
        .dynamic_text(|scope| Ok(scope.props()["title"].clone()), 0)
        .close();
    let program = ProgramBuilder::new()
        .open_div()
        .component(|_| Ok(json!({})), 0, child)
        .close()
        .build()
        .unwrap();

    runtime
        .render(Some(RootElement::new(program.clone(), json!({"title": "one"}))), &container)
        .unwrap();
    runtime
        .render(Some(RootElement::new(program, json!({"title": "two"}))), &container)
        .unwrap();

    assert_eq!(runtime.host().inner_html(container), "<div><span>two</span></div>");
    assert_eq!(runtime.component_count(), 1);
}

#[test]
fn test_did_update_runs_on_every_update_pass() {
    let (mut runtime, container) = setup();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let program = ProgramBuilder::new()
        .open_div()
        .did_update(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        })
        .close()
        .build()
        .unwrap();

    runtime
        .render(Some(RootElement::new(program.clone(), json!({}))), &container)
        .unwrap();
    assert_eq!(calls.get(), 0);

    runtime
        .render(Some(RootElement::new(program.clone(), json!({}))), &container)
        .unwrap();
    runtime
        .render(Some(RootElement::new(program, json!({}))), &container)
        .unwrap();
    assert_eq!(calls.get(), 2);
}
