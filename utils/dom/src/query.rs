use wasm_bindgen::JsCast;
use web_sys::{Document, DocumentFragment, Element, NodeList, ShadowRoot};

use crate::error::DomError;

/// A DOM node that selector queries can be scoped to.
///
/// Implemented for the roots the runtime actually queries: the document,
/// arbitrary elements, document fragments, and shadow roots.
pub trait QueryRoot {
    /// Returns the first element under this root matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Js`] when the selector is not parseable.
    fn query(&self, selector: &str) -> Result<Option<Element>, DomError>;

    /// Returns every element under this root matching `selector`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Js`] when the selector is not parseable.
    fn query_all(&self, selector: &str) -> Result<Vec<Element>, DomError>;
}

fn collect(list: &NodeList) -> Vec<Element> {
    let mut elements = Vec::with_capacity(list.length() as usize);
    for index in 0..list.length() {
        if let Some(element) = list.item(index).and_then(|node| node.dyn_into::<Element>().ok()) {
            elements.push(element);
        }
    }
    elements
}

impl QueryRoot for Document {
    fn query(&self, selector: &str) -> Result<Option<Element>, DomError> {
        Document::query_selector(self, selector).map_err(DomError::from)
    }

    fn query_all(&self, selector: &str) -> Result<Vec<Element>, DomError> {
        Document::query_selector_all(self, selector)
            .map(|list| collect(&list))
            .map_err(DomError::from)
    }
}

impl QueryRoot for Element {
    fn query(&self, selector: &str) -> Result<Option<Element>, DomError> {
        Element::query_selector(self, selector).map_err(DomError::from)
    }

    fn query_all(&self, selector: &str) -> Result<Vec<Element>, DomError> {
        Element::query_selector_all(self, selector)
            .map(|list| collect(&list))
            .map_err(DomError::from)
    }
}

impl QueryRoot for DocumentFragment {
    fn query(&self, selector: &str) -> Result<Option<Element>, DomError> {
        DocumentFragment::query_selector(self, selector).map_err(DomError::from)
    }

    fn query_all(&self, selector: &str) -> Result<Vec<Element>, DomError> {
        DocumentFragment::query_selector_all(self, selector)
            .map(|list| collect(&list))
            .map_err(DomError::from)
    }
}

impl QueryRoot for ShadowRoot {
    fn query(&self, selector: &str) -> Result<Option<Element>, DomError> {
        let fragment: &DocumentFragment = self.as_ref();
        fragment.query(selector)
    }

    fn query_all(&self, selector: &str) -> Result<Vec<Element>, DomError> {
        let fragment: &DocumentFragment = self.as_ref();
        fragment.query_all(selector)
    }
}

/// Returns the first element matching `selector` under `root`.
///
/// Selector errors are logged and reported as "no match" so callers can treat
/// a malformed selector like an empty result.
pub fn find_one(root: &impl QueryRoot, selector: &str) -> Option<Element> {
    match root.query(selector) {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(%selector, error = %err, "selector query failed");
            None
        }
    }
}

/// Returns every element matching `selector` under `root`, in document order.
///
/// Selector errors are logged and reported as an empty result.
pub fn find_all(root: &impl QueryRoot, selector: &str) -> Vec<Element> {
    match root.query_all(selector) {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(%selector, error = %err, "selector query failed");
            Vec::new()
        }
    }
}
