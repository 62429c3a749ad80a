//! The declarative component definition.
//!
//! A [`ComponentDefinition`] is built once at module-load time and never
//! mutated: a property schema, a template, an optional style source, an
//! event map, a named method table, and lifecycle hooks. The runtime derives
//! the whole custom-element class from it mechanically.

use std::collections::BTreeMap;
use std::rc::Rc;

use web_sys::{Element, Event};

use crate::codec::{PropertyValue, ValueType};
use crate::component::Host;

/// The dynamic state value a component instance owns.
pub type StateValue = serde_json::Value;

pub(crate) type TemplateFn = Rc<dyn Fn(&StateValue, &PropertyMap) -> String>;
pub(crate) type StyleFn = Rc<dyn Fn(&StateValue, &PropertyMap) -> String>;
pub(crate) type StateFn = Rc<dyn Fn(&PropertyMap) -> StateValue>;
pub(crate) type HookFn = Rc<dyn Fn(&Host)>;
pub(crate) type ChangeHookFn = Rc<dyn Fn(&Host, &str, &PropertyValue, &PropertyValue) -> PropertyChange>;
pub(crate) type MethodFn = Rc<dyn Fn(&Host, &Event, &Element)>;

/// Schema entry describing one property.
///
/// Constructed only through the typed constructors, so a default value can
/// never disagree with the declared type.
#[derive(Debug, Clone)]
pub struct PropertySpec {
    value_type: ValueType,
    default: PropertyValue,
    reflect: bool,
}

impl PropertySpec {
    /// A presence-based boolean property.
    #[must_use]
    pub const fn boolean(default: bool) -> Self {
        Self {
            value_type: ValueType::Bool,
            default: PropertyValue::Bool(default),
            reflect: false,
        }
    }

    /// A floating-point number property.
    #[must_use]
    pub const fn number(default: f64) -> Self {
        Self {
            value_type: ValueType::Number,
            default: PropertyValue::Number(default),
            reflect: false,
        }
    }

    /// A plain text property.
    #[must_use]
    pub fn text(default: impl Into<String>) -> Self {
        Self {
            value_type: ValueType::Text,
            default: PropertyValue::Text(default.into()),
            reflect: false,
        }
    }

    /// A structured property carried as JSON in the attribute.
    #[must_use]
    pub const fn structured(default: StateValue) -> Self {
        Self {
            value_type: ValueType::Structured,
            default: PropertyValue::Structured(default),
            reflect: false,
        }
    }

    /// Keeps the attribute synchronized with the property value.
    #[must_use]
    pub const fn reflect(mut self) -> Self {
        self.reflect = true;
        self
    }

    /// The declared value type.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// The default value new instances start from.
    #[must_use]
    pub const fn default_value(&self) -> &PropertyValue {
        &self.default
    }

    /// Whether the property reflects to its attribute.
    #[must_use]
    pub const fn reflects(&self) -> bool {
        self.reflect
    }
}

/// Per-instance property storage with typed accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    values: BTreeMap<String, PropertyValue>,
}

static NULL: StateValue = StateValue::Null;

impl PropertyMap {
    /// Returns the value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Returns a boolean property, `false` when absent or differently typed.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(PropertyValue::as_bool).unwrap_or(false)
    }

    /// Returns a numeric property, `NaN` when absent or differently typed.
    #[must_use]
    pub fn number(&self, name: &str) -> f64 {
        self.get(name)
            .and_then(PropertyValue::as_number)
            .unwrap_or(f64::NAN)
    }

    /// Returns a text property, empty when absent or differently typed.
    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.get(name).and_then(PropertyValue::as_text).unwrap_or("")
    }

    /// Returns a structured property, null when absent or differently typed.
    #[must_use]
    pub fn structured(&self, name: &str) -> &StateValue {
        self.get(name)
            .and_then(PropertyValue::as_structured)
            .unwrap_or(&NULL)
    }

    /// Iterates over the stored values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub(crate) fn insert(&mut self, name: String, value: PropertyValue) {
        self.values.insert(name, value);
    }
}

/// How a component sources its styles.
#[derive(Clone, Default)]
pub(crate) enum StyleSource {
    /// No component styles.
    #[default]
    None,
    /// A fixed CSS string.
    Static(String),
    /// CSS computed from the current state and properties on every render.
    Dynamic(StyleFn),
}

impl StyleSource {
    pub(crate) fn resolve(&self, state: &StateValue, properties: &PropertyMap) -> Option<String> {
        match self {
            Self::None => None,
            Self::Static(css) => Some(css.clone()),
            Self::Dynamic(style) => Some(style(state, properties)),
        }
    }
}

impl std::fmt::Debug for StyleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("StyleSource::None"),
            Self::Static(_) => f.write_str("StyleSource::Static"),
            Self::Dynamic(_) => f.write_str("StyleSource::Dynamic"),
        }
    }
}

/// How a component computes its initial state on first connection.
#[derive(Clone)]
pub(crate) enum StateInit {
    Value(StateValue),
    FromProperties(StateFn),
}

impl Default for StateInit {
    fn default() -> Self {
        Self::Value(StateValue::Null)
    }
}

impl StateInit {
    pub(crate) fn evaluate(&self, properties: &PropertyMap) -> StateValue {
        match self {
            Self::Value(value) => value.clone(),
            Self::FromProperties(init) => init(properties),
        }
    }
}

/// One entry of the event map: every element matching `selector` inside the
/// rendered content gets a listener for `event` dispatching to the method
/// named `handler`.
#[derive(Debug, Clone)]
pub(crate) struct EventBinding {
    pub(crate) selector: String,
    pub(crate) event: String,
    pub(crate) handler: String,
}

/// Outcome of an `on_property_change` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyChange {
    /// Proceed with the automatic re-render.
    Render,
    /// The hook handled the change itself; skip the automatic re-render.
    Handled,
}

/// A declarative description of a custom element.
///
/// Built once per tag with [`ComponentDefinition::new`] and the chained
/// configuration methods, then handed to [`define`](crate::define).
pub struct ComponentDefinition {
    pub(crate) properties: BTreeMap<String, PropertySpec>,
    pub(crate) template: TemplateFn,
    pub(crate) style: StyleSource,
    pub(crate) global_stylesheet: Option<String>,
    pub(crate) initial_state: StateInit,
    pub(crate) events: Vec<EventBinding>,
    pub(crate) methods: BTreeMap<String, MethodFn>,
    pub(crate) on_connect: Option<HookFn>,
    pub(crate) on_disconnect: Option<HookFn>,
    pub(crate) on_property_change: Option<ChangeHookFn>,
}

impl std::fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("properties", &self.properties)
            .field("style", &self.style)
            .field("global_stylesheet", &self.global_stylesheet)
            .field("events", &self.events)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ComponentDefinition {
    /// Creates a definition rendering with `template`.
    ///
    /// The template is a pure function from the current state and property
    /// snapshot to markup; it runs fresh on every render and must not
    /// retain DOM nodes across renders.
    #[must_use]
    pub fn new(template: impl Fn(&StateValue, &PropertyMap) -> String + 'static) -> Self {
        Self {
            properties: BTreeMap::new(),
            template: Rc::new(template),
            style: StyleSource::None,
            global_stylesheet: None,
            initial_state: StateInit::default(),
            events: Vec::new(),
            methods: BTreeMap::new(),
            on_connect: None,
            on_disconnect: None,
            on_property_change: None,
        }
    }

    /// Declares a schema property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, spec: PropertySpec) -> Self {
        self.properties.insert(name.into(), spec);
        self
    }

    /// Looks up the schema entry for `name`.
    #[must_use]
    pub fn property_spec(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.get(name)
    }

    /// Uses a fixed CSS string as the component styles.
    #[must_use]
    pub fn style_text(mut self, css: impl Into<String>) -> Self {
        self.style = StyleSource::Static(css.into());
        self
    }

    /// Computes the component styles from state and properties on every render.
    #[must_use]
    pub fn style_with(
        mut self,
        style: impl Fn(&StateValue, &PropertyMap) -> String + 'static,
    ) -> Self {
        self.style = StyleSource::Dynamic(Rc::new(style));
        self
    }

    /// Adopts the shared global stylesheet at `url` in addition to the
    /// component styles.
    #[must_use]
    pub fn global_stylesheet(mut self, url: impl Into<String>) -> Self {
        self.global_stylesheet = Some(url.into());
        self
    }

    /// Starts every instance from a fixed state value.
    #[must_use]
    pub fn initial_state(mut self, value: StateValue) -> Self {
        self.initial_state = StateInit::Value(value);
        self
    }

    /// Computes the initial state from the property snapshot at first
    /// connection.
    #[must_use]
    pub fn initial_state_with(mut self, init: impl Fn(&PropertyMap) -> StateValue + 'static) -> Self {
        self.initial_state = StateInit::FromProperties(Rc::new(init));
        self
    }

    /// Declares a named method, addressable from the event map.
    #[must_use]
    pub fn method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&Host, &Event, &Element) + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Rc::new(method));
        self
    }

    /// Maps `event` on elements matching `selector` to the method named
    /// `handler`. Listeners are re-attached against the fresh content on
    /// every render.
    #[must_use]
    pub fn on(
        mut self,
        selector: impl Into<String>,
        event: impl Into<String>,
        handler: impl Into<String>,
    ) -> Self {
        self.events.push(EventBinding {
            selector: selector.into(),
            event: event.into(),
            handler: handler.into(),
        });
        self
    }

    /// Runs after the instance connects, before the first render.
    #[must_use]
    pub fn on_connect(mut self, hook: impl Fn(&Host) + 'static) -> Self {
        self.on_connect = Some(Rc::new(hook));
        self
    }

    /// Runs after the instance disconnects and its listeners are released.
    #[must_use]
    pub fn on_disconnect(mut self, hook: impl Fn(&Host) + 'static) -> Self {
        self.on_disconnect = Some(Rc::new(hook));
        self
    }

    /// Observes property changes; returning [`PropertyChange::Handled`]
    /// suppresses the automatic re-render for that change.
    #[must_use]
    pub fn on_property_change(
        mut self,
        hook: impl Fn(&Host, &str, &PropertyValue, &PropertyValue) -> PropertyChange + 'static,
    ) -> Self {
        self.on_property_change = Some(Rc::new(hook));
        self
    }
}

/// Checks a schema property name: non-empty ASCII camelCase with no
/// separator characters.
pub(crate) fn is_valid_property_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_lowercase())
        && chars.all(|ch| ch.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_constructors_pin_the_value_type() {
        assert_eq!(PropertySpec::boolean(true).value_type(), ValueType::Bool);
        assert_eq!(PropertySpec::number(1.5).value_type(), ValueType::Number);
        assert_eq!(PropertySpec::text("x").value_type(), ValueType::Text);
        assert_eq!(
            PropertySpec::structured(json!([])).value_type(),
            ValueType::Structured
        );
        assert!(!PropertySpec::boolean(true).reflects());
        assert!(PropertySpec::boolean(true).reflect().reflects());
    }

    #[test]
    fn property_map_accessors_fall_back_per_type() {
        let mut map = PropertyMap::default();
        map.insert("open".into(), PropertyValue::Bool(true));
        map.insert("count".into(), PropertyValue::Number(3.0));
        map.insert("label".into(), PropertyValue::Text("hi".into()));
        map.insert("items".into(), PropertyValue::Structured(json!([1, 2])));

        assert!(map.flag("open"));
        assert!(!map.flag("missing"));
        assert!((map.number("count") - 3.0).abs() < f64::EPSILON);
        assert!(map.number("missing").is_nan());
        assert_eq!(map.text("label"), "hi");
        assert_eq!(map.text("missing"), "");
        assert_eq!(map.structured("items"), &json!([1, 2]));
        assert_eq!(map.structured("missing"), &StateValue::Null);
    }

    #[test]
    fn property_names_are_validated() {
        for name in ["variant", "maxItems", "a1"] {
            assert!(is_valid_property_name(name), "{name} should be accepted");
        }
        for name in ["", "Variant", "max-items", "max_items", "1abc", "é"] {
            assert!(!is_valid_property_name(name), "{name} should be rejected");
        }
    }

    #[test]
    fn state_init_prefers_the_property_snapshot_form() {
        let mut map = PropertyMap::default();
        map.insert("count".into(), PropertyValue::Number(2.0));

        let fixed = StateInit::Value(json!({"ticks": 0}));
        assert_eq!(fixed.evaluate(&map), json!({"ticks": 0}));

        let derived = StateInit::FromProperties(Rc::new(|props: &PropertyMap| {
            json!({"ticks": props.number("count")})
        }));
        assert_eq!(derived.evaluate(&map), json!({"ticks": 2.0}));
    }
}
