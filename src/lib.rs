//! Rivulet: a declarative custom-element runtime for Rust and WebAssembly.
//!
//! Describe a UI element as data (a property schema, a template function,
//! a style source, an event map, lifecycle hooks) and [`define`] turns it
//! into a registered custom-element class with attribute/property
//! synchronization, reactive per-instance state, cached stylesheet
//! adoption, and delegated events wired up for you.
//!
//! ```ignore
//! use rivulet::prelude::*;
//! use serde_json::json;
//!
//! rivulet::init();
//! let counter = ComponentDefinition::new(|state, _props| {
//!     format!("<button>clicked {} times</button>", state["clicks"])
//! })
//! .initial_state(json!({ "clicks": 0 }))
//! .method("bump", |host, _event, _target| {
//!     let clicks = host.state()["clicks"].as_u64().unwrap_or(0) + 1;
//!     host.update_state(move |state| {
//!         let mut next = state.clone();
//!         next["clicks"] = clicks.into();
//!         next
//!     });
//! })
//! .on("button", "click", "bump");
//! define("my-counter", counter)?;
//! ```

pub use rivulet_core::{
    ComponentDefinition, DefineError, Host, PropertyChange, PropertyMap, PropertySpec,
    PropertyValue, StateValue, ValueType, define,
};

/// DOM query, listener, and fetch utilities.
pub use rivulet_dom as dom;

/// The bundled `rv-button` element.
pub use rivulet_button as button;

pub use tracing as log;

pub mod prelude {
    //! Commonly used types for building Rivulet components.
    pub use rivulet_core::{
        ComponentDefinition, DefineError, Host, PropertyChange, PropertyMap, PropertySpec,
        PropertyValue, StateValue, ValueType, define,
    };
}

/// Installs the browser panic hook so Rust panics surface on the console.
///
/// Call once at startup, before registering components.
pub fn init() {
    console_error_panic_hook::set_once();
    tracing::debug!("rivulet initialised");
}
