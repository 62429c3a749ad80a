//! DOM collaborators for the Rivulet runtime.
//!
//! This crate wraps the handful of `web-sys` operations the component runtime
//! consumes: selector queries over an arbitrary query root ([`find_one`],
//! [`find_all`]), event listener attachment with scoped cleanup ([`attach`]),
//! and a text-returning network fetch ([`fetch_text`]). The wrappers keep the
//! raw `JsValue` plumbing out of the runtime and convert JavaScript
//! exceptions into [`DomError`].

mod error;
mod fetch;
mod listener;
mod query;

pub use error::DomError;
pub use fetch::fetch_text;
pub use listener::{ListenerHandle, attach};
pub use query::{QueryRoot, find_all, find_one};

use web_sys::{Document, Window};

/// Returns the browser window.
///
/// # Errors
///
/// Returns [`DomError::Unavailable`] outside of a browsing context.
pub fn window() -> Result<Window, DomError> {
    web_sys::window().ok_or(DomError::Unavailable)
}

/// Returns the active document.
///
/// # Errors
///
/// Returns [`DomError::Unavailable`] outside of a browsing context.
pub fn document() -> Result<Document, DomError> {
    window()?.document().ok_or(DomError::Unavailable)
}
