mod common;

use bytedom_runtime::bytecode::{
    Event, Key, LoopOptions, Program, ProgramBuilder, SlotSource, StateUpdate,
};
use bytedom_runtime::{HostOp, RenderError, RootElement};
use common::*;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_bubbling_invokes_target_before_ancestor() {
    let (mut runtime, container) = setup();
    let log = Rc::new(RefCell::new(Vec::new()));
    let (outer, inner) = (log.clone(), log.clone());
    let program = ProgramBuilder::new()
        .open_div()
        .on(
            "click",
            move |_, _| {
                outer.borrow_mut().push("ancestor");
                Ok(())
            },
            0,
        )
        .open("button")
        .id("go")
        .on(
            "click",
            move |_, _| {
                inner.borrow_mut().push("descendant");
                Ok(())
            },
            1,
        )
        .close()
        .close()
        .build()
        .unwrap();
    runtime
        .render(Some(RootElement::new(program, json!({}))), &container)
        .unwrap();
    let button = runtime.host().query_id(container, "go").unwrap();

    let invoked = runtime
        .dispatch_event(&container, &button, &Event::new("click"))
        .unwrap();

    assert_eq!(invoked, 2);
    assert_eq!(*log.borrow(), vec!["descendant", "ancestor"]);
}

#[test]
fn test_one_native_listener_per_event_name() {
    let (mut runtime, container) = setup();
    let program = ProgramBuilder::new()
        .open("ul")
        .loop_map(
            |scope| Ok(scope.props()["rows"].as_array().cloned().unwrap_or_default()),
            0,
            |_, item, _| Ok(Key::try_from(&item["id"])?),
            LoopOptions::new().with_props(|_, item, _| Ok(item.clone())),
            ProgramBuilder::new()
                .open("li")
                .on("click", |_, _| Ok(()), 0)
                .on("mouseover", |_, _| Ok(()), 1)
                .text_node_from(SlotSource::Prop("label".into()), 2)
                .close(),
        )
        .close()
        .build()
        .unwrap();
    render_rows(&mut runtime, container, &program, &[1, 2, 3]);

    assert_eq!(runtime.listener_count(&container), 2);
    assert_eq!(runtime.host().listener_count(container), 2);
    assert_eq!(runtime.handler_count(&container, "click"), 3);

    render_rows(&mut runtime, container, &program, &[1]);
    assert_eq!(runtime.handler_count(&container, "click"), 1);
    assert_eq!(runtime.handler_count(&container, "mouseover"), 1);
    assert_eq!(runtime.listener_count(&container), 2);
}

#[test]
fn test_handler_sees_item_props() {
    let (mut runtime, container) = setup();
    let clicked = Rc::new(RefCell::new(Vec::new()));
    let sink = clicked.clone();
    let program = ProgramBuilder::new()
        .open("ul")
        .loop_map(
            |scope| Ok(scope.props()["rows"].as_array().cloned().unwrap_or_default()),
            0,
            |_, item, _| Ok(Key::try_from(&item["id"])?),
            LoopOptions::new().with_props(|_, item, _| Ok(item.clone())),
            ProgramBuilder::new()
                .open("li")
                .on_dynamic(
                    "click",
                    move |scope, _| {
                        sink.borrow_mut().push(scope.props()["label"].clone());
                        Ok(())
                    },
                    0,
                )
                .text_node_from(SlotSource::Prop("label".into()), 1)
                .close(),
        )
        .close()
        .build()
        .unwrap();
    render_rows(&mut runtime, container, &program, &[1, 2]);

    let second = runtime.host().elements_by_tag(container, "li")[1];
    runtime
        .dispatch_event(&container, &second, &Event::new("click"))
        .unwrap();

    let props = json!({"rows": [{"id": 1, "label": "one"}, {"id": 2, "label": "renamed"}]});
    runtime
        .render(Some(RootElement::new(program, props)), &container)
        .unwrap();
    runtime
        .dispatch_event(&container, &second, &Event::new("click"))
        .unwrap();

    assert_eq!(*clicked.borrow(), vec![json!("row 2"), json!("renamed")]);
}

#[test]
fn test_dispatch_flushes_state_updates() {
    let (mut runtime, container) = setup();
    let counter = ProgramBuilder::new()
        .open("button")
        .on(
            "click",
            |scope, _| {
                if let Some(instance) = scope.instance() {
                    instance.set_state(StateUpdate::updater(|state, _| {
                        Ok(json!({"count": state["count"].as_i64().unwrap_or(0) + 1}))
                    }));
                }
                Ok(())
            },
            0,
        )
        .dynamic_text(|scope| Ok(scope.state_field("count")), 1)
        .close();
    let program = ProgramBuilder::new()
        .open_div()
        .component(|_| Ok(json!({"count": 0})), 0, counter)
        .close()
        .build()
        .unwrap();
    runtime
        .render(Some(RootElement::new(program, json!({}))), &container)
        .unwrap();
    let button = runtime.host().elements_by_tag(container, "button")[0];

    runtime
        .dispatch_event(&container, &button, &Event::new("click"))
        .unwrap();
    runtime
        .dispatch_event(&container, &button, &Event::new("click"))
        .unwrap();

    assert_eq!(runtime.host().text_content(button), "2");
    assert_eq!(runtime.pending_updates(), 0);
}

#[test]
fn test_unmount_releases_every_handler() {
    let (mut runtime, container) = setup();
    let program = ProgramBuilder::new()
        .open_div()
        .on("click", |_, _| Ok(()), 0)
        .open("button")
        .on("click", |_, _| Ok(()), 1)
        .on("keydown", |_, _| Ok(()), 2)
        .close()
        .close()
        .build()
        .unwrap();
    runtime
        .render(Some(RootElement::new(program, json!({}))), &container)
        .unwrap();
    assert_eq!(runtime.handler_count(&container, "click"), 2);

    runtime.render(None, &container).unwrap();

    assert_eq!(runtime.handler_count(&container, "click"), 0);
    assert_eq!(runtime.handler_count(&container, "keydown"), 0);
    assert_eq!(runtime.host().listener_count(container), 0);
}

#[test]
fn test_switched_out_branch_releases_its_handlers() {
    let (mut runtime, container) = setup();
    let program = ProgramBuilder::new()
        .open_div()
        .ternary(
            |scope| Ok(scope.props()["editing"].as_bool().unwrap_or(false)),
            0,
            ProgramBuilder::new()
                .open("input")
                .on("keydown", |_, _| Ok(()), 0)
                .on("click", |_, _| Ok(()), 1)
                .close(),
            ProgramBuilder::new().open("button").on("click", |_, _| Ok(()), 0).close(),
        )
        .close()
        .build()
        .unwrap();

    runtime
        .render(Some(RootElement::new(program.clone(), json!({"editing": true}))), &container)
        .unwrap();
    assert_eq!(runtime.handler_count(&container, "keydown"), 1);
    assert_eq!(runtime.handler_count(&container, "click"), 1);

    runtime
        .render(Some(RootElement::new(program, json!({"editing": false}))), &container)
        .unwrap();
    assert_eq!(runtime.handler_count(&container, "keydown"), 0);
    assert_eq!(runtime.handler_count(&container, "click"), 1);
    let input = runtime.host().elements_by_tag(container, "input");
    assert!(input.is_empty());
}

#[test]
fn test_handler_failure_is_reported() {
    let (mut runtime, container) = setup();
    let program = ProgramBuilder::new()
        .open("button")
        .on("click", |_, _| Err(anyhow::anyhow!("denied")), 0)
        .close()
        .build()
        .unwrap();
    runtime
        .render(Some(RootElement::new(program, json!({}))), &container)
        .unwrap();
    let button = runtime.host().elements_by_tag(container, "button")[0];

    let err = runtime
        .dispatch_event(&container, &button, &Event::new("click"))
        .unwrap_err();

    assert!(matches!(err, RenderError::Callback { context: "event handler", .. }));
}

#[test]
fn test_dispatch_to_unknown_container() {
    let (mut runtime, container) = setup();
    let err = runtime
        .dispatch_event(&container, &container, &Event::new("click"))
        .unwrap_err();
    assert!(matches!(err, RenderError::UnknownRoot));
}

#[test]
fn test_handler_receives_event_detail() {
    let (mut runtime, container) = setup();
    let seen = Rc::new(RefCell::new(None));
    let sink = seen.clone();
    let program = ProgramBuilder::new()
        .open("input")
        .on(
            "input",
            move |_, event| {
                *sink.borrow_mut() = Some(event.detail.clone());
                Ok(())
            },
            0,
        )
        .close()
        .build()
        .unwrap();
    runtime
        .render(Some(RootElement::new(program, json!({}))), &container)
        .unwrap();
    let input = runtime.host().elements_by_tag(container, "input")[0];

    runtime
        .dispatch_event(&container, &input, &Event::new("input").with_detail(json!("typed")))
        .unwrap();

    assert_eq!(*seen.borrow(), Some(json!("typed")));
}

fn clickable_rows() -> Program {
    ProgramBuilder::new()
        .open("ul")
        .loop_map(
            |scope| Ok(scope.props()["rows"].as_array().cloned().unwrap_or_default()),
            0,
            |_, item, _| Ok(Key::try_from(&item["id"])?),
            LoopOptions::new().with_props(|_, item, _| Ok(item.clone())),
            ProgramBuilder::new()
                .open("li")
                .on("click", |_, _| Ok(()), 0)
                .text_node_from(SlotSource::Prop("label".into()), 1)
                .close(),
        )
        .close()
        .build()
        .unwrap()
}

#[test]
fn test_clearing_a_sole_child_loop_releases_handlers() {
    let (mut runtime, container) = setup();
    let program = clickable_rows();
    render_rows(&mut runtime, container, &program, &[1, 2, 3]);
    assert_eq!(runtime.handler_count(&container, "click"), 3);
    runtime.host_mut().clear_ops();

    render_rows(&mut runtime, container, &program, &[]);

    let ul = runtime.host().elements_by_tag(container, "ul")[0];
    assert!(runtime.host().ops().contains(&HostOp::SetTextContent {
        node: ul,
        value: String::new(),
    }));
    assert_eq!(runtime.handler_count(&container, "click"), 0);
    assert_eq!(runtime.listener_count(&container), 1);
}

#[test]
fn test_disjoint_replace_releases_the_old_handlers() {
    let (mut runtime, container) = setup();
    let program = clickable_rows();
    render_rows(&mut runtime, container, &program, &[1, 2, 3]);
    let old_first = runtime.host().elements_by_tag(container, "li")[0];

    render_rows(&mut runtime, container, &program, &[4, 5, 6]);

    assert_eq!(labels(runtime.host(), container), ["row 4", "row 5", "row 6"]);
    assert_eq!(runtime.handler_count(&container, "click"), 3);
    let invoked = runtime
        .dispatch_event(&container, &old_first, &Event::new("click"))
        .unwrap();
    assert_eq!(invoked, 0);
    let new_first = runtime.host().elements_by_tag(container, "li")[0];
    let invoked = runtime
        .dispatch_event(&container, &new_first, &Event::new("click"))
        .unwrap();
    assert_eq!(invoked, 1);
}
