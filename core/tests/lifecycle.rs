//! Browser-side lifecycle tests for the component runtime.
//!
//! Run with `wasm-pack test --headless --chrome core`. Each test registers
//! its own tag: the platform registry cannot be cleared between tests.

#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::HtmlElement;

use rivulet_core::{ComponentDefinition, Host, PropertySpec, define};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn mount(tag: &str) -> HtmlElement {
    let element: HtmlElement = document()
        .create_element(tag)
        .unwrap()
        .dyn_into()
        .unwrap();
    document().body().unwrap().append_child(&element).unwrap();
    element
}

fn get_js(element: &HtmlElement, property: &str) -> JsValue {
    let target: &JsValue = element.as_ref();
    js_sys::Reflect::get(target, &JsValue::from_str(property)).unwrap()
}

fn set_js(element: &HtmlElement, property: &str, value: &JsValue) {
    let target: &JsValue = element.as_ref();
    js_sys::Reflect::set(target, &JsValue::from_str(property), value).unwrap();
}

async fn tick() {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0)
            .unwrap();
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Awaits ticks until `ready` holds, panicking after a generous deadline.
async fn wait_until(ready: impl Fn() -> bool) {
    for _ in 0..200 {
        if ready() {
            return;
        }
        tick().await;
    }
    panic!("condition never became true");
}

#[wasm_bindgen_test]
async fn defaults_reflect_on_mount() {
    define(
        "t-default-reflection",
        ComponentDefinition::new(|_state, props| format!("<p>{}</p>", props.text("variant")))
            .property("variant", PropertySpec::text("default").reflect()),
    )
    .unwrap();

    let element = mount("t-default-reflection");

    assert_eq!(element.get_attribute("variant").as_deref(), Some("default"));
    assert_eq!(get_js(&element, "variant").as_string().as_deref(), Some("default"));
}

#[wasm_bindgen_test]
async fn authored_attributes_override_defaults() {
    define(
        "t-authored-attr",
        ComponentDefinition::new(|_state, props| format!("<p>{}</p>", props.text("variant")))
            .property("variant", PropertySpec::text("default").reflect()),
    )
    .unwrap();

    let element: HtmlElement = document()
        .create_element("t-authored-attr")
        .unwrap()
        .dyn_into()
        .unwrap();
    element.set_attribute("variant", "primary").unwrap();
    document().body().unwrap().append_child(&element).unwrap();

    assert_eq!(get_js(&element, "variant").as_string().as_deref(), Some("primary"));
    assert_eq!(element.get_attribute("variant").as_deref(), Some("primary"));
}

#[wasm_bindgen_test]
async fn boolean_assignment_reflects_and_rerenders_once() {
    let renders = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&renders);
    define(
        "t-bool-reflect",
        ComponentDefinition::new(move |_state, props| {
            counter.set(counter.get() + 1);
            format!("<p>{}</p>", props.flag("disabled"))
        })
        .property("disabled", PropertySpec::boolean(false).reflect()),
    )
    .unwrap();

    let element = mount("t-bool-reflect");
    assert_eq!(renders.get(), 1, "mounting renders once");
    assert!(!element.has_attribute("disabled"));

    set_js(&element, "disabled", &JsValue::TRUE);
    assert!(element.has_attribute("disabled"));
    assert_eq!(renders.get(), 2, "assignment triggers exactly one re-render");

    set_js(&element, "disabled", &JsValue::TRUE);
    assert_eq!(renders.get(), 2, "an unchanged assignment is a no-op");

    set_js(&element, "disabled", &JsValue::FALSE);
    assert!(!element.has_attribute("disabled"), "false unsets the attribute");
    assert_eq!(renders.get(), 3);
}

#[wasm_bindgen_test]
async fn attribute_mutation_updates_the_property() {
    define(
        "t-attr-sync",
        ComponentDefinition::new(|_state, props| format!("<p>{}</p>", props.text("variant")))
            .property("variant", PropertySpec::text("default").reflect()),
    )
    .unwrap();

    let element = mount("t-attr-sync");
    element.set_attribute("variant", "danger").unwrap();

    assert_eq!(get_js(&element, "variant").as_string().as_deref(), Some("danger"));
}

#[wasm_bindgen_test]
async fn corrupt_structured_attribute_degrades_to_empty() {
    define(
        "t-structured",
        ComponentDefinition::new(|_state, _props| "<p></p>".to_owned())
            .property("items", PropertySpec::structured(json!([]))),
    )
    .unwrap();

    let element = mount("t-structured");
    element.set_attribute("items", "[1, 2, oops").unwrap();

    let items = get_js(&element, "items");
    let text = js_sys::JSON::stringify(&items).unwrap();
    assert_eq!(text.as_string().as_deref(), Some("[]"));
}

#[wasm_bindgen_test]
async fn disconnect_stops_state_triggered_renders() {
    let renders = Rc::new(Cell::new(0u32));
    let host_slot: Rc<RefCell<Option<Host>>> = Rc::new(RefCell::new(None));
    let counter = Rc::clone(&renders);
    let slot = Rc::clone(&host_slot);
    define(
        "t-disconnect",
        ComponentDefinition::new(move |state, _props| {
            counter.set(counter.get() + 1);
            format!("<p>{}</p>", state["ticks"])
        })
        .initial_state(json!({ "ticks": 0 }))
        .on_connect(move |host| {
            *slot.borrow_mut() = Some(host.clone());
        }),
    )
    .unwrap();

    let element = mount("t-disconnect");
    let host = host_slot.borrow().clone().unwrap();
    assert_eq!(renders.get(), 1);

    host.set_state(json!({ "ticks": 1 }));
    assert_eq!(renders.get(), 2, "state writes re-render while connected");

    element.remove();
    assert!(!host.connected());

    host.set_state(json!({ "ticks": 2 }));
    tick().await;
    assert_eq!(renders.get(), 2, "state writes after disconnection must not render");
}

#[wasm_bindgen_test]
async fn failed_global_stylesheet_still_renders_markup() {
    define(
        "t-style-failure",
        ComponentDefinition::new(|_state, _props| "<p id=\"made-it\">hello</p>".to_owned())
            .global_stylesheet("/no-such-stylesheet-for-rivulet-tests.css"),
    )
    .unwrap();

    let element = mount("t-style-failure");
    wait_until(|| {
        element
            .shadow_root()
            .is_some_and(|shadow| shadow.inner_html().contains("made-it"))
    })
    .await;

    let target: &JsValue = element.shadow_root().unwrap().as_ref();
    let adopted = js_sys::Reflect::get(target, &JsValue::from_str("adoptedStyleSheets")).unwrap();
    let adopted: js_sys::Array = adopted.dyn_into().unwrap();
    assert_eq!(adopted.length(), 0, "the failed sheet contributes nothing");
}

#[wasm_bindgen_test]
async fn delegated_clicks_reach_the_named_method() {
    let renders = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&renders);
    define(
        "t-delegated-click",
        ComponentDefinition::new(move |state, _props| {
            counter.set(counter.get() + 1);
            format!("<button>clicked {}</button>", state["clicks"])
        })
        .initial_state(json!({ "clicks": 0 }))
        .method("bump", |host, _event, _target| {
            let clicks = host.state()["clicks"].as_u64().unwrap_or(0) + 1;
            host.update_state(move |state| {
                let mut next = state.clone();
                next["clicks"] = clicks.into();
                next
            });
        })
        .on("button", "click", "bump"),
    )
    .unwrap();

    let element = mount("t-delegated-click");
    wait_until(|| {
        element
            .shadow_root()
            .is_some_and(|shadow| shadow.inner_html().contains("clicked 0"))
    })
    .await;

    let button: HtmlElement = element
        .shadow_root()
        .unwrap()
        .query_selector("button")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    button.click();

    wait_until(|| {
        element
            .shadow_root()
            .is_some_and(|shadow| shadow.inner_html().contains("clicked 1"))
    })
    .await;
    assert!(renders.get() >= 2);
}

#[wasm_bindgen_test]
async fn missing_event_handler_is_skipped() {
    define(
        "t-missing-handler",
        ComponentDefinition::new(|_state, _props| "<button>still here</button>".to_owned())
            .on("button", "click", "nonexistent"),
    )
    .unwrap();

    let element = mount("t-missing-handler");
    wait_until(|| {
        element
            .shadow_root()
            .is_some_and(|shadow| shadow.inner_html().contains("still here"))
    })
    .await;

    // Clicking must be harmless even though no handler could be resolved.
    let button: HtmlElement = element
        .shadow_root()
        .unwrap()
        .query_selector("button")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    button.click();
}

#[wasm_bindgen_test]
async fn redefining_a_tag_returns_the_existing_class() {
    let first = define(
        "t-redefine",
        ComponentDefinition::new(|_state, _props| "<p>one</p>".to_owned()),
    )
    .unwrap();
    let second = define(
        "t-redefine",
        ComponentDefinition::new(|_state, _props| "<p>two</p>".to_owned()),
    )
    .unwrap();

    assert!(js_sys::Object::is(first.as_ref(), second.as_ref()));
}

#[wasm_bindgen_test]
async fn invalid_tag_names_are_rejected() {
    let result = define(
        "notahyphenatedname",
        ComponentDefinition::new(|_state, _props| String::new()),
    );
    assert!(result.is_err());
}
