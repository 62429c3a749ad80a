use wasm_bindgen::JsValue;

/// Error type produced when registering a component definition.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DefineError {
    /// The tag name does not conform to the custom-element naming rules.
    #[error("invalid custom element name `{0}`: names are lowercase and contain a hyphen")]
    InvalidTagName(String),
    /// A schema property name is not a plain camelCase identifier.
    #[error("invalid property name `{0}`: names are non-empty ASCII camelCase")]
    InvalidPropertyName(String),
    /// The platform registry rejected the registration.
    #[error("custom element registry rejected `{tag}`: {message}")]
    Registry {
        /// The tag name that was being registered.
        tag: String,
        /// The stringified JavaScript exception.
        message: String,
    },
}

/// Renders a JavaScript exception as a log-friendly string.
pub(crate) fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}
