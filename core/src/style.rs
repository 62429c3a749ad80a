//! Stylesheet resolution and the process-wide stylesheet cache.
//!
//! Global stylesheets are fetched over the network and compiled once per
//! URL, no matter how many instances or component kinds ask for them:
//! concurrent requesters share a single in-flight operation, and a resolved
//! sheet is memoized for the lifetime of the process. Failures clear the
//! cache entry so a later connection can retry, and always degrade to
//! "render without this sheet": style trouble never takes down a
//! component.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CssStyleSheet, ShadowRoot};

use rivulet_dom::fetch_text;

use crate::error::js_message;

type InFlight<T> = Shared<LocalBoxFuture<'static, Option<T>>>;

enum Entry<T: Clone> {
    Loading(InFlight<T>),
    Ready(T),
}

/// A keyed get-or-fetch cache that collapses duplicate concurrent loads.
///
/// Each key is either untouched, loading (one shared in-flight future all
/// requesters await), or resolved (memoized forever). A load that yields
/// `None` clears the entry so the next request retries.
pub struct SharedCache<T: Clone> {
    entries: Rc<RefCell<HashMap<String, Entry<T>>>>,
}

impl<T: Clone> Clone for SharedCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
        }
    }
}

impl<T: Clone> std::fmt::Debug for SharedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCache")
            .field("entries", &self.entries.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Default for SharedCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> SharedCache<T> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Returns the cached value for `key`, starting `load` if the key has
    /// never resolved and joining the in-flight load if one is running.
    pub async fn get_or_load<F>(&self, key: &str, load: impl FnOnce() -> F) -> Option<T>
    where
        F: Future<Output = Option<T>> + 'static,
    {
        let in_flight = {
            let mut entries = self.entries.borrow_mut();
            let joined = match entries.get(key) {
                Some(Entry::Ready(value)) => return Some(value.clone()),
                Some(Entry::Loading(in_flight)) => Some(in_flight.clone()),
                None => None,
            };
            joined.unwrap_or_else(|| {
                let in_flight = load().boxed_local().shared();
                entries.insert(key.to_owned(), Entry::Loading(in_flight.clone()));
                in_flight
            })
        };

        let result = in_flight.clone().await;
        let mut entries = self.entries.borrow_mut();
        if let Some(value) = &result {
            entries.insert(key.to_owned(), Entry::Ready(value.clone()));
        } else {
            // Only clear the entry we awaited: a failed requester must not
            // wipe out a retry that is already in flight.
            let should_clear = matches!(
                entries.get(key),
                Some(Entry::Loading(current)) if current.ptr_eq(&in_flight)
            );
            if should_clear {
                entries.remove(key);
            }
        }
        result
    }
}

thread_local! {
    static GLOBAL_SHEETS: SharedCache<CssStyleSheet> = SharedCache::new();
}

/// Resolves the shared global stylesheet for `url`.
///
/// The first requester fetches and compiles it; concurrent requesters await
/// the same operation; later requesters get the memoized sheet. Returns
/// `None` (after logging) when fetching or compiling fails, in which case
/// the entry is cleared so a future connection may retry.
pub async fn global_sheet(url: &str) -> Option<CssStyleSheet> {
    let cache = GLOBAL_SHEETS.with(SharedCache::clone);
    let load_url = url.to_owned();
    cache
        .get_or_load(url, move || async move {
            match fetch_text(&load_url).await {
                Ok(css) => compile(&css).await,
                Err(err) => {
                    tracing::warn!(url = %load_url, error = %err, "global stylesheet fetch failed");
                    None
                }
            }
        })
        .await
}

/// Compiles CSS text into a constructable stylesheet.
///
/// Returns `None` (after logging) when construction or parsing fails.
pub async fn compile(css: &str) -> Option<CssStyleSheet> {
    let sheet = match CssStyleSheet::new() {
        Ok(sheet) => sheet,
        Err(err) => {
            tracing::warn!(error = %js_message(&err), "constructable stylesheets unavailable");
            return None;
        }
    };
    let replaced = sheet.replace(css);
    match JsFuture::from(replaced).await {
        Ok(_) => Some(sheet),
        Err(err) => {
            tracing::warn!(error = %js_message(&err), "stylesheet failed to compile");
            None
        }
    }
}

/// Installs `sheets` as the adopted stylesheets of `shadow`.
///
/// `adoptedStyleSheets` is an `ObservableArray` attribute, which the
/// generated bindings do not model uniformly across versions, so the
/// assignment goes through `Reflect`.
pub(crate) fn adopt(shadow: &ShadowRoot, sheets: &[CssStyleSheet]) {
    let list = js_sys::Array::new();
    for sheet in sheets {
        list.push(&JsValue::from(sheet.clone()));
    }
    let target: &JsValue = shadow.as_ref();
    if let Err(err) = js_sys::Reflect::set(target, &JsValue::from_str("adoptedStyleSheets"), &list)
    {
        tracing::warn!(error = %js_message(&err), "failed to adopt stylesheets");
    }
}
