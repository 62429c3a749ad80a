use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::error::DomError;
use crate::window;

/// Fetches `url` and returns the response body as text.
///
/// # Errors
///
/// Returns [`DomError::Unavailable`] outside of a browsing context,
/// [`DomError::Status`] for non-success HTTP statuses, and [`DomError::Js`]
/// when the network request itself is rejected.
pub async fn fetch_text(url: &str) -> Result<String, DomError> {
    let window = window()?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()
        .map_err(|_| DomError::UnexpectedType("Response"))?;
    if !response.ok() {
        return Err(DomError::Status {
            url: url.to_owned(),
            status: response.status(),
        });
    }
    let body = JsFuture::from(response.text()?).await?;
    body.as_string()
        .ok_or(DomError::UnexpectedType("string body"))
}
