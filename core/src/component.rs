//! Per-instance lifecycle: the machinery behind every element the factory
//! produces.
//!
//! Each mounted element owns one [`InstanceInner`] record: its typed
//! property map, its connected flag, its lazily created state store, the
//! cleanup handles for the currently delegated listeners, and its shadow
//! root. The lifecycle callbacks of the generated class funnel into the
//! free functions here; hooks and methods observe the instance through the
//! [`Host`] handle.
//!
//! Rendering is a two-phase operation. The synchronous phase evaluates the
//! template and style source into an immutable payload and detaches the
//! previous render's listeners; the asynchronous phase resolves
//! stylesheets and then commits, but only if the instance is still
//! connected. That liveness re-check is the runtime's only cancellation
//! mechanism: a disconnection during the asynchronous boundary simply
//! aborts the commit. Two renders racing through the boundary resolve
//! last-committed-wins, with no ordering token.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    CssStyleSheet, CustomEvent, CustomEventInit, HtmlElement, ShadowRoot, ShadowRootInit,
    ShadowRootMode,
};

use rivulet_dom::{ListenerHandle, attach, find_all};

use crate::codec::{self, PropertyValue, ValueType};
use crate::definition::{ComponentDefinition, PropertyChange, PropertyMap, StateValue};
use crate::error::js_message;
use crate::store::{Store, Subscription};
use crate::style;

const INSTANCE_KEY: &str = "__rivuletInstance";

thread_local! {
    static INSTANCES: RefCell<HashMap<u64, Rc<InstanceInner>>> = RefCell::new(HashMap::new());
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

pub(crate) struct InstanceInner {
    element: HtmlElement,
    definition: Rc<ComponentDefinition>,
    properties: RefCell<PropertyMap>,
    connected: Cell<bool>,
    state: RefCell<Option<Store<StateValue>>>,
    render_subscription: RefCell<Option<Subscription<StateValue>>>,
    listeners: RefCell<Vec<ListenerHandle>>,
    shadow: RefCell<Option<ShadowRoot>>,
}

fn element_key(element: &HtmlElement) -> &JsValue {
    element.as_ref()
}

fn instance_of(element: &HtmlElement) -> Option<Rc<InstanceInner>> {
    let id = js_sys::Reflect::get(element_key(element), &JsValue::from_str(INSTANCE_KEY))
        .ok()?
        .as_f64()?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let id = id as u64;
    INSTANCES.with(|instances| instances.borrow().get(&id).cloned())
}

/// Construct transition: seed the property map from schema defaults and
/// register the instance record. Defaults are cloned per instance so no
/// mutable default is ever shared between elements.
pub(crate) fn construct(element: &HtmlElement, definition: &Rc<ComponentDefinition>) {
    let mut properties = PropertyMap::default();
    for (name, spec) in &definition.properties {
        properties.insert(name.clone(), spec.default_value().clone());
    }
    let inner = Rc::new(InstanceInner {
        element: element.clone(),
        definition: Rc::clone(definition),
        properties: RefCell::new(properties),
        connected: Cell::new(false),
        state: RefCell::new(None),
        render_subscription: RefCell::new(None),
        listeners: RefCell::new(Vec::new()),
        shadow: RefCell::new(None),
    });

    let id = NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    #[allow(clippy::cast_precision_loss)]
    let stamp = JsValue::from_f64(id as f64);
    if let Err(err) = js_sys::Reflect::set(element_key(element), &JsValue::from_str(INSTANCE_KEY), &stamp) {
        tracing::error!(error = %js_message(&err), "failed to stamp instance id on element");
        return;
    }
    INSTANCES.with(|instances| instances.borrow_mut().insert(id, inner));
}

/// Connect transition: reconcile attributes, initialize state once,
/// subscribe the render listener, run the hook, render.
pub(crate) fn connect(element: &HtmlElement) {
    let Some(inner) = instance_of(element) else {
        return;
    };
    inner.connected.set(true);
    sync_attributes(&inner);
    init_state(&inner);
    subscribe_render(&inner);
    if let Some(hook) = &inner.definition.on_connect {
        hook(&Host::new(Rc::clone(&inner)));
    }
    render(&inner);
}

/// Disconnect transition: drop the render subscription and every delegated
/// listener, then run the hook. The state store itself survives so a
/// reconnection resumes where the instance left off.
pub(crate) fn disconnect(element: &HtmlElement) {
    let Some(inner) = instance_of(element) else {
        return;
    };
    inner.connected.set(false);
    if let Some(subscription) = inner.render_subscription.borrow_mut().take() {
        subscription.unsubscribe();
    }
    inner.listeners.borrow_mut().clear();
    if let Some(hook) = &inner.definition.on_disconnect {
        hook(&Host::new(Rc::clone(&inner)));
    }
}

/// Attribute-changed transition. Decodes with the declared type and routes
/// through the property-change handler when the decoded value differs from
/// the current one; structured values are always treated as potentially
/// different. This path never writes the attribute back.
pub(crate) fn attribute_changed(element: &HtmlElement, attribute: &str, new: Option<&str>) {
    let Some(inner) = instance_of(element) else {
        return;
    };
    let name = codec::property_name(attribute);
    let Some(spec) = inner.definition.properties.get(&name) else {
        return;
    };
    let decoded = codec::decode(new, spec.value_type());
    let previous = {
        let properties = inner.properties.borrow();
        properties
            .get(&name)
            .cloned()
            .unwrap_or_else(|| spec.default_value().clone())
    };
    if decoded == previous && spec.value_type() != ValueType::Structured {
        return;
    }
    inner
        .properties
        .borrow_mut()
        .insert(name.clone(), decoded.clone());
    if inner.connected.get() {
        property_changed(&inner, &name, &previous, &decoded);
    }
}

/// Accessor read: the current property value converted for JavaScript.
pub(crate) fn read_property(element: &HtmlElement, name: &str) -> JsValue {
    let Some(inner) = instance_of(element) else {
        return JsValue::UNDEFINED;
    };
    let properties = inner.properties.borrow();
    properties.get(name).map_or(JsValue::UNDEFINED, property_to_js)
}

/// Accessor write: coerce the incoming JavaScript value to the declared
/// type and run the assignment path.
pub(crate) fn write_property(element: &HtmlElement, name: &str, value: &JsValue) {
    let Some(inner) = instance_of(element) else {
        return;
    };
    let Some(spec) = inner.definition.properties.get(name) else {
        return;
    };
    assign_property(&inner, name, coerce_js(value, spec.value_type()));
}

/// The direct-assignment path: an unchanged non-structured value is a
/// no-op; otherwise the map is updated, the attribute is synchronized when
/// the schema reflects, and the property-change handler runs while
/// connected.
fn assign_property(inner: &Rc<InstanceInner>, name: &str, value: PropertyValue) {
    let Some(spec) = inner.definition.properties.get(name) else {
        return;
    };
    let previous = {
        let properties = inner.properties.borrow();
        properties
            .get(name)
            .cloned()
            .unwrap_or_else(|| spec.default_value().clone())
    };
    if value == previous && spec.value_type() != ValueType::Structured {
        return;
    }
    inner
        .properties
        .borrow_mut()
        .insert(name.to_owned(), value.clone());
    if spec.reflects() {
        let attribute = codec::attribute_name(name);
        let result = match codec::encode(&value) {
            Some(text) => inner.element.set_attribute(&attribute, &text),
            None => inner.element.remove_attribute(&attribute),
        };
        if let Err(err) = result {
            tracing::warn!(
                property = %name,
                error = %js_message(&err),
                "failed to reflect property to attribute"
            );
        }
    }
    if inner.connected.get() {
        property_changed(inner, name, &previous, &value);
    }
}

fn property_changed(inner: &Rc<InstanceInner>, name: &str, old: &PropertyValue, new: &PropertyValue) {
    if let Some(hook) = &inner.definition.on_property_change {
        let outcome = hook(&Host::new(Rc::clone(inner)), name, old, new);
        if outcome == PropertyChange::Handled {
            return;
        }
    }
    render(inner);
}

/// Connect step 1: attributes present on the element override the schema
/// defaults (reconciling server-rendered markup); reflecting properties
/// with no attribute write their encoded default out.
fn sync_attributes(inner: &Rc<InstanceInner>) {
    for (name, spec) in &inner.definition.properties {
        let attribute = codec::attribute_name(name);
        if let Some(raw) = inner.element.get_attribute(&attribute) {
            let decoded = codec::decode(Some(&raw), spec.value_type());
            inner.properties.borrow_mut().insert(name.clone(), decoded);
        } else if spec.reflects() {
            let encoded = {
                let properties = inner.properties.borrow();
                properties.get(name).and_then(codec::encode)
            };
            if let Some(text) = encoded {
                // May re-enter attribute_changed synchronously; no borrows
                // are held across the call.
                if let Err(err) = inner.element.set_attribute(&attribute, &text) {
                    tracing::warn!(
                        property = %name,
                        error = %js_message(&err),
                        "failed to reflect default to attribute"
                    );
                }
            }
        }
    }
}

/// Connect step 2: the state store is created exactly once per instance,
/// even across disconnect/reconnect cycles.
fn init_state(inner: &Rc<InstanceInner>) {
    let mut state = inner.state.borrow_mut();
    if state.is_none() {
        let initial = {
            let properties = inner.properties.borrow();
            inner.definition.initial_state.evaluate(&properties)
        };
        *state = Some(Store::new(initial));
    }
}

fn subscribe_render(inner: &Rc<InstanceInner>) {
    let store = inner.state.borrow().clone();
    let Some(store) = store else {
        return;
    };
    let weak = Rc::downgrade(inner);
    let subscription = store.subscribe(move |_| {
        if let Some(inner) = weak.upgrade() {
            if inner.connected.get() {
                render(&inner);
            }
        }
    });
    *inner.render_subscription.borrow_mut() = Some(subscription);
}

/// Render: synchronous prepare, asynchronous style resolution, and a
/// commit gated on the connected flag.
pub(crate) fn render(inner: &Rc<InstanceInner>) {
    if !inner.connected.get() || inner.state.borrow().is_none() {
        return;
    }
    let state = inner
        .state
        .borrow()
        .as_ref()
        .map_or(StateValue::Null, Store::get);
    let properties = inner.properties.borrow().clone();
    let markup = (inner.definition.template)(&state, &properties);
    let css = inner.definition.style.resolve(&state, &properties);
    inner.listeners.borrow_mut().clear();

    let global_url = inner.definition.global_stylesheet.clone();
    let inner = Rc::clone(inner);
    spawn_local(async move {
        let mut sheets: Vec<CssStyleSheet> = Vec::new();
        if let Some(url) = global_url {
            if let Some(sheet) = style::global_sheet(&url).await {
                sheets.push(sheet);
            }
        }
        if let Some(css) = css {
            if let Some(sheet) = style::compile(&css).await {
                sheets.push(sheet);
            }
        }
        if !inner.connected.get() {
            return;
        }
        commit(&inner, &markup, &sheets);
    });
}

fn commit(inner: &Rc<InstanceInner>, markup: &str, sheets: &[CssStyleSheet]) {
    let Some(shadow) = shadow_root(inner) else {
        return;
    };
    style::adopt(&shadow, sheets);
    shadow.set_inner_html(markup);
    attach_listeners(inner, &shadow);
}

fn shadow_root(inner: &Rc<InstanceInner>) -> Option<ShadowRoot> {
    if let Some(existing) = inner.shadow.borrow().as_ref() {
        return Some(existing.clone());
    }
    match inner
        .element
        .attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open))
    {
        Ok(shadow) => {
            *inner.shadow.borrow_mut() = Some(shadow.clone());
            Some(shadow)
        }
        Err(err) => {
            tracing::error!(error = %js_message(&err), "failed to attach shadow root");
            None
        }
    }
}

/// Re-runs event delegation against freshly rendered content. Handlers are
/// resolved by name now, not at dispatch time; a missing name logs and the
/// listener is simply not attached.
fn attach_listeners(inner: &Rc<InstanceInner>, shadow: &ShadowRoot) {
    let mut handles = inner.listeners.borrow_mut();
    for binding in &inner.definition.events {
        let Some(method) = inner.definition.methods.get(&binding.handler) else {
            tracing::warn!(
                handler = %binding.handler,
                selector = %binding.selector,
                "event handler not found; listener not attached"
            );
            continue;
        };
        for matched in find_all(shadow, &binding.selector) {
            let method = Rc::clone(method);
            let weak = Rc::downgrade(inner);
            let target = matched.clone();
            let listener = attach(matched.as_ref(), &binding.event, move |event| {
                if let Some(inner) = weak.upgrade() {
                    method(&Host::new(inner), &event, &target);
                }
            });
            match listener {
                Ok(handle) => handles.push(handle),
                Err(err) => tracing::warn!(
                    selector = %binding.selector,
                    event = %binding.event,
                    error = %err,
                    "failed to attach delegated listener"
                ),
            }
        }
    }
}

fn coerce_js(value: &JsValue, value_type: ValueType) -> PropertyValue {
    match value_type {
        ValueType::Bool => PropertyValue::Bool(value.is_truthy()),
        ValueType::Number => PropertyValue::Number(value.as_f64().unwrap_or(f64::NAN)),
        ValueType::Text => {
            if let Some(text) = value.as_string() {
                PropertyValue::Text(text)
            } else if value.is_null() || value.is_undefined() {
                PropertyValue::Text(String::new())
            } else {
                PropertyValue::Text(stringify(value).unwrap_or_default())
            }
        }
        ValueType::Structured => {
            if value.is_null() || value.is_undefined() {
                PropertyValue::Structured(StateValue::Null)
            } else {
                codec::decode(stringify(value).as_deref(), ValueType::Structured)
            }
        }
    }
}

fn stringify(value: &JsValue) -> Option<String> {
    js_sys::JSON::stringify(value)
        .ok()
        .and_then(|text| text.as_string())
}

fn property_to_js(value: &PropertyValue) -> JsValue {
    match value {
        PropertyValue::Bool(flag) => JsValue::from_bool(*flag),
        PropertyValue::Number(number) => JsValue::from_f64(*number),
        PropertyValue::Text(text) => JsValue::from_str(text),
        PropertyValue::Structured(StateValue::Null) => JsValue::NULL,
        PropertyValue::Structured(structured) => js_sys::JSON::parse(&structured.to_string())
            .unwrap_or(JsValue::NULL),
    }
}

/// The per-instance handle passed to lifecycle hooks and methods.
#[derive(Clone)]
pub struct Host {
    inner: Rc<InstanceInner>,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("tag", &self.inner.element.tag_name())
            .field("connected", &self.inner.connected.get())
            .finish_non_exhaustive()
    }
}

impl Host {
    pub(crate) fn new(inner: Rc<InstanceInner>) -> Self {
        Self { inner }
    }

    /// The underlying element.
    #[must_use]
    pub fn element(&self) -> &HtmlElement {
        &self.inner.element
    }

    /// Whether the instance is currently connected to a document.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.inner.connected.get()
    }

    /// A snapshot of the current property values.
    #[must_use]
    pub fn properties(&self) -> PropertyMap {
        self.inner.properties.borrow().clone()
    }

    /// The current value of one property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        self.inner.properties.borrow().get(name).cloned()
    }

    /// Assigns a property, driving reflection and the property-change
    /// handler exactly like an accessor write from JavaScript.
    ///
    /// A value whose type disagrees with the schema is rejected with a
    /// diagnostic.
    pub fn set_property(&self, name: &str, value: PropertyValue) {
        let Some(spec) = self.inner.definition.properties.get(name) else {
            tracing::warn!(property = %name, "assignment to undeclared property ignored");
            return;
        };
        if spec.value_type() != value.value_type() {
            tracing::warn!(
                property = %name,
                expected = ?spec.value_type(),
                got = ?value.value_type(),
                "assignment with mismatched type ignored"
            );
            return;
        }
        assign_property(&self.inner, name, value);
    }

    /// A clone of the current state, or null before first connection.
    #[must_use]
    pub fn state(&self) -> StateValue {
        self.inner
            .state
            .borrow()
            .as_ref()
            .map_or(StateValue::Null, Store::get)
    }

    /// Replaces the state, triggering a re-render while connected.
    pub fn set_state(&self, value: StateValue) {
        let store = self.inner.state.borrow().clone();
        if let Some(store) = store {
            store.set(value);
        }
    }

    /// Replaces the state with `update(previous)`, triggering a re-render
    /// while connected.
    pub fn update_state(&self, update: impl FnOnce(&StateValue) -> StateValue) {
        let store = self.inner.state.borrow().clone();
        if let Some(store) = store {
            store.update(update);
        }
    }

    /// Dispatches a bubbling, composed `CustomEvent` from the element with
    /// `detail` as its payload.
    pub fn emit(&self, event: &str, detail: &StateValue) {
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        init.set_composed(true);
        init.set_detail(&property_to_js(&PropertyValue::Structured(detail.clone())));
        match CustomEvent::new_with_event_init_dict(event, &init) {
            Ok(custom) => {
                if let Err(err) = self.inner.element.dispatch_event(&custom) {
                    tracing::warn!(event = %event, error = %js_message(&err), "failed to dispatch event");
                }
            }
            Err(err) => {
                tracing::warn!(event = %event, error = %js_message(&err), "failed to construct event");
            }
        }
    }
}
