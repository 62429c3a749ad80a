use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, EventTarget};

use crate::error::DomError;

/// Cleanup handle for a listener attached with [`attach`].
///
/// The listener stays attached for as long as the handle is alive; dropping
/// the handle (or calling [`ListenerHandle::detach`]) removes it from the
/// target and releases the backing closure.
#[derive(Debug)]
pub struct ListenerHandle {
    target: EventTarget,
    event: String,
    callback: Option<Closure<dyn FnMut(Event)>>,
}

impl ListenerHandle {
    /// Removes the listener from its target.
    pub fn detach(self) {
        drop(self);
    }

    /// The event name this handle listens for.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            let _ = self
                .target
                .remove_event_listener_with_callback(&self.event, callback.as_ref().unchecked_ref());
        }
    }
}

/// Attaches `handler` to `target` for the given event name.
///
/// Returns a [`ListenerHandle`] owning the listener; the caller keeps the
/// handle alive for as long as the listener should stay attached.
///
/// # Errors
///
/// Returns [`DomError::Js`] when the underlying `addEventListener` call is
/// rejected by the platform.
pub fn attach(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<ListenerHandle, DomError> {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target
        .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
        .map_err(DomError::from)?;
    Ok(ListenerHandle {
        target: target.clone(),
        event: event.to_owned(),
        callback: Some(callback),
    })
}
