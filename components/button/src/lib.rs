//! The `rv-button` element.
//!
//! A thin consumer of the runtime's public contract: a schema with a
//! reflecting `variant`, a reflecting `disabled` flag, and a `label`; a
//! press counter in component state; and a delegated `click` listener that
//! dispatches a composed `rv-press` event. Light-DOM children render
//! through a slot, with the `label` property as fallback content.

use serde_json::json;

use rivulet_core::{ComponentDefinition, DefineError, PropertySpec};

/// The tag name the button registers under.
pub const TAG: &str = "rv-button";

const BUTTON_CSS: &str = r#"
:host {
    display: inline-block;
}
button {
    font: inherit;
    border: 1px solid transparent;
    border-radius: 0.375rem;
    padding: 0.5rem 1rem;
    cursor: pointer;
}
button[disabled] {
    cursor: not-allowed;
    opacity: 0.6;
}
.rv-button--default {
    background: #e5e7eb;
    color: #111827;
}
.rv-button--primary {
    background: #2563eb;
    color: #ffffff;
}
.rv-button--danger {
    background: #dc2626;
    color: #ffffff;
}
"#;

/// Builds the button's component definition.
///
/// Exposed so embedders can customize it (for example with
/// [`ComponentDefinition::global_stylesheet`]) before registering it under
/// their own tag.
#[must_use]
pub fn definition() -> ComponentDefinition {
    ComponentDefinition::new(|_state, props| {
        let variant = props.text("variant");
        let disabled = if props.flag("disabled") { " disabled" } else { "" };
        let label = props.text("label");
        format!(
            r#"<button class="rv-button rv-button--{variant}" part="button"{disabled}><slot>{label}</slot></button>"#
        )
    })
    .property("variant", PropertySpec::text("default").reflect())
    .property("disabled", PropertySpec::boolean(false).reflect())
    .property("label", PropertySpec::text(""))
    .initial_state(json!({ "presses": 0 }))
    .style_text(BUTTON_CSS)
    .method("press", |host, _event, _target| {
        if host.properties().flag("disabled") {
            return;
        }
        let presses = host.state()["presses"].as_u64().unwrap_or(0) + 1;
        host.update_state(|state| {
            let mut next = state.clone();
            next["presses"] = json!(presses);
            next
        });
        host.emit("rv-press", &json!({ "presses": presses }));
    })
    .on("button", "click", "press")
}

/// Registers `rv-button` and returns the generated class.
///
/// # Errors
///
/// Propagates [`DefineError`] from the runtime; re-registration is a no-op
/// returning the existing class.
pub fn register() -> Result<js_sys::Function, DefineError> {
    rivulet_core::define(TAG, definition())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivulet_core::ValueType;

    #[test]
    fn schema_declares_the_public_surface() {
        let definition = definition();

        let variant = definition.property_spec("variant").expect("variant");
        assert_eq!(variant.value_type(), ValueType::Text);
        assert!(variant.reflects());

        let disabled = definition.property_spec("disabled").expect("disabled");
        assert_eq!(disabled.value_type(), ValueType::Bool);
        assert!(disabled.reflects());

        let label = definition.property_spec("label").expect("label");
        assert_eq!(label.value_type(), ValueType::Text);
        assert!(!label.reflects());
    }
}
