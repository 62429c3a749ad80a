//! Tag registration and the generated element class.
//!
//! [`define`] validates the definition eagerly, builds one set of lifecycle
//! closures per component kind, and hands them to a small JavaScript shim
//! that produces the actual `HTMLElement` subclass: observed attributes from
//! the schema, accessor pairs on the prototype, and the four lifecycle
//! callbacks delegating back into the runtime. The registry owns the
//! closures for the lifetime of the process; a registered kind is never
//! torn down.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;
use web_sys::HtmlElement;

use crate::codec;
use crate::component;
use crate::definition::{ComponentDefinition, is_valid_property_name};
use crate::error::{DefineError, js_message};

#[wasm_bindgen(inline_js = r"
export function register_class(tag, observed, properties, hooks) {
    class RivuletElement extends HTMLElement {
        static get observedAttributes() {
            return observed;
        }
        constructor() {
            super();
            hooks.construct(this);
        }
        connectedCallback() {
            hooks.connect(this);
        }
        disconnectedCallback() {
            hooks.disconnect(this);
        }
        attributeChangedCallback(name, oldValue, newValue) {
            hooks.attribute_changed(this, name, newValue);
        }
    }
    for (const name of properties) {
        Object.defineProperty(RivuletElement.prototype, name, {
            get() {
                return hooks.get_property(this, name);
            },
            set(value) {
                hooks.set_property(this, name, value);
            },
            configurable: true,
            enumerable: true,
        });
    }
    customElements.define(tag, RivuletElement);
    return RivuletElement;
}
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn register_class(
        tag: &str,
        observed: &js_sys::Array,
        properties: &js_sys::Array,
        hooks: &js_sys::Object,
    ) -> Result<js_sys::Function, JsValue>;
}

/// The closures backing one generated class. Kept alive in the registry so
/// the JavaScript side can call them for as long as the tag exists.
struct ShimHooks {
    object: js_sys::Object,
    _construct: Closure<dyn Fn(HtmlElement)>,
    _connect: Closure<dyn Fn(HtmlElement)>,
    _disconnect: Closure<dyn Fn(HtmlElement)>,
    _attribute_changed: Closure<dyn Fn(HtmlElement, String, JsValue)>,
    _get_property: Closure<dyn Fn(HtmlElement, String) -> JsValue>,
    _set_property: Closure<dyn Fn(HtmlElement, String, JsValue)>,
}

impl ShimHooks {
    fn new(definition: &Rc<ComponentDefinition>) -> Result<Self, JsValue> {
        let construct = {
            let definition = Rc::clone(definition);
            Closure::wrap(Box::new(move |element: HtmlElement| {
                component::construct(&element, &definition);
            }) as Box<dyn Fn(HtmlElement)>)
        };
        let connect = Closure::wrap(Box::new(|element: HtmlElement| {
            component::connect(&element);
        }) as Box<dyn Fn(HtmlElement)>);
        let disconnect = Closure::wrap(Box::new(|element: HtmlElement| {
            component::disconnect(&element);
        }) as Box<dyn Fn(HtmlElement)>);
        let attribute_changed = Closure::wrap(Box::new(
            |element: HtmlElement, attribute: String, new: JsValue| {
                component::attribute_changed(&element, &attribute, new.as_string().as_deref());
            },
        )
            as Box<dyn Fn(HtmlElement, String, JsValue)>);
        let get_property = Closure::wrap(Box::new(|element: HtmlElement, name: String| {
            component::read_property(&element, &name)
        })
            as Box<dyn Fn(HtmlElement, String) -> JsValue>);
        let set_property = Closure::wrap(Box::new(
            |element: HtmlElement, name: String, value: JsValue| {
                component::write_property(&element, &name, &value);
            },
        )
            as Box<dyn Fn(HtmlElement, String, JsValue)>);

        let object = js_sys::Object::new();
        for (key, callback) in [
            ("construct", construct.as_ref()),
            ("connect", connect.as_ref()),
            ("disconnect", disconnect.as_ref()),
            ("attribute_changed", attribute_changed.as_ref()),
            ("get_property", get_property.as_ref()),
            ("set_property", set_property.as_ref()),
        ] {
            js_sys::Reflect::set(&object, &JsValue::from_str(key), callback)?;
        }

        Ok(Self {
            object,
            _construct: construct,
            _connect: connect,
            _disconnect: disconnect,
            _attribute_changed: attribute_changed,
            _get_property: get_property,
            _set_property: set_property,
        })
    }
}

struct Registration {
    class: js_sys::Function,
    _definition: Rc<ComponentDefinition>,
    _hooks: ShimHooks,
}

thread_local! {
    static REGISTRY: RefCell<HashMap<String, Registration>> = RefCell::new(HashMap::new());
}

/// Checks a custom-element tag name: lowercase ASCII, starts with a letter,
/// and contains at least one hyphen (the platform's namespacing rule).
pub(crate) fn is_valid_tag_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    let starts_well = chars.next().is_some_and(|first| first.is_ascii_lowercase());
    starts_well
        && tag.contains('-')
        && tag
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '-' | '_' | '.'))
}

/// Registers `definition` under `tag` and returns the generated element
/// class.
///
/// Re-registering an existing tag is a no-op that returns the previously
/// generated class unchanged.
///
/// # Errors
///
/// Returns [`DefineError::InvalidTagName`] or
/// [`DefineError::InvalidPropertyName`] when the definition is malformed
/// (logged, nothing registered), and [`DefineError::Registry`] when the
/// platform registry rejects the class.
pub fn define(tag: &str, definition: ComponentDefinition) -> Result<js_sys::Function, DefineError> {
    if !is_valid_tag_name(tag) {
        tracing::error!(%tag, "rejected component registration: invalid tag name");
        return Err(DefineError::InvalidTagName(tag.to_owned()));
    }
    for name in definition.properties.keys() {
        if !is_valid_property_name(name) {
            tracing::error!(%tag, property = %name, "rejected component registration: invalid property name");
            return Err(DefineError::InvalidPropertyName(name.clone()));
        }
    }
    let existing = REGISTRY.with(|registry| {
        registry
            .borrow()
            .get(tag)
            .map(|registration| registration.class.clone())
    });
    if let Some(class) = existing {
        tracing::debug!(%tag, "tag already defined; returning existing class");
        return Ok(class);
    }

    let definition = Rc::new(definition);
    let observed = js_sys::Array::new();
    let properties = js_sys::Array::new();
    for name in definition.properties.keys() {
        observed.push(&JsValue::from_str(&codec::attribute_name(name)));
        properties.push(&JsValue::from_str(name));
    }

    let registry_error = |err: JsValue| DefineError::Registry {
        tag: tag.to_owned(),
        message: js_message(&err),
    };
    let hooks = ShimHooks::new(&definition).map_err(registry_error)?;
    let class = register_class(tag, &observed, &properties, &hooks.object).map_err(|err| {
        tracing::error!(%tag, error = %js_message(&err), "custom element registration failed");
        registry_error(err)
    })?;

    REGISTRY.with(|registry| {
        registry.borrow_mut().insert(
            tag.to_owned(),
            Registration {
                class: class.clone(),
                _definition: definition,
                _hooks: hooks,
            },
        );
    });
    tracing::debug!(%tag, "component registered");
    Ok(class)
}

#[cfg(test)]
mod tests {
    use super::is_valid_tag_name;

    #[test]
    fn tag_names_require_a_hyphen() {
        for tag in ["rv-button", "my-counter", "x-a1", "a-b.c_d"] {
            assert!(is_valid_tag_name(tag), "{tag} should be accepted");
        }
        for tag in ["button", "RV-BUTTON", "-leading", "rv button", "", "1-tag"] {
            assert!(!is_valid_tag_name(tag), "{tag} should be rejected");
        }
    }
}
