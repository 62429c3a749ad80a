//! The Rivulet component-definition runtime.
//!
//! This crate turns a declarative [`ComponentDefinition`] (property schema,
//! template function, style source, event map, lifecycle hooks) into a
//! fully wired custom-element class via [`define`]. The runtime owns:
//!
//! - bidirectional attribute/property synchronization with type coercion
//!   and optional reflection ([`codec`]),
//! - a minimal per-instance reactive state container whose writes trigger
//!   re-renders ([`store`]),
//! - asynchronous, cached adoption of an external stylesheet plus
//!   per-component styles into the shadow root ([`style`]),
//! - and declarative event delegation re-attached on every render.
//!
//! Each mounted element runs construction → connection → (attribute sync,
//! state init, style + render) → zero or more attribute changes or state
//! mutations, each re-rendering → eventual disconnection. Reconnection
//! re-runs the connection sequence without re-creating already-initialized
//! state.

pub mod codec;
mod component;
mod definition;
mod error;
mod registry;
pub mod store;
pub mod style;

pub use codec::{PropertyValue, ValueType};
pub use component::Host;
pub use definition::{ComponentDefinition, PropertyChange, PropertyMap, PropertySpec, StateValue};
pub use error::DefineError;
pub use registry::define;
pub use style::SharedCache;

#[doc(no_inline)]
pub use web_sys::{Element, Event, HtmlElement};
