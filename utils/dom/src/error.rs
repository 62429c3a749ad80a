use wasm_bindgen::JsValue;

/// Error type produced by the DOM utilities.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomError {
    /// The DOM APIs are not accessible (e.g., when executed outside of a browser).
    #[error("DOM is not available")]
    Unavailable,
    /// A fetch completed with a non-success HTTP status.
    #[error("request for `{url}` failed with status {status}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
    /// A JavaScript value did not have the expected shape.
    #[error("unexpected JavaScript value where {0} was expected")]
    UnexpectedType(&'static str),
    /// Wrapper around JavaScript exceptions.
    #[error("JavaScript error: {0}")]
    Js(String),
}

impl From<JsValue> for DomError {
    fn from(value: JsValue) -> Self {
        value
            .as_string()
            .map_or_else(|| Self::Js(format!("{value:?}")), Self::Js)
    }
}
