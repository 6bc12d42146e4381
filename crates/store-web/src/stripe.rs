//! Stripe.js Embedded Checkout Bindings
//!
//! Minimal wasm-bindgen surface over the Stripe.js global loaded from
//! `https://js.stripe.com/v3` by the host page: construct a client,
//! initialize an embedded checkout from a client secret, mount it, and
//! destroy it.

use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    /// The object returned by `Stripe(publishableKey)`.
    pub type StripeJs;

    #[wasm_bindgen(js_name = Stripe)]
    fn stripe_constructor(publishable_key: &str) -> StripeJs;

    #[wasm_bindgen(method, js_name = initEmbeddedCheckout)]
    fn init_embedded_checkout(this: &StripeJs, options: &JsValue) -> Promise;

    /// Handle to a live embedded checkout instance.
    pub type EmbeddedCheckout;

    #[wasm_bindgen(method)]
    fn mount(this: &EmbeddedCheckout, selector: &str);

    #[wasm_bindgen(method)]
    fn destroy(this: &EmbeddedCheckout);
}

/// Initialize an embedded checkout for a session client secret.
///
/// The returned handle must be destroyed on every exit path; Stripe.js
/// allows only one live instance per page.
pub async fn init_embedded(
    publishable_key: &str,
    client_secret: &str,
) -> Result<EmbeddedCheckout, String> {
    let stripe = stripe_constructor(publishable_key);

    let options = Object::new();
    Reflect::set(
        &options,
        &JsValue::from_str("clientSecret"),
        &JsValue::from_str(client_secret),
    )
    .map_err(|_| "Failed to build checkout options")?;

    let promise = stripe.init_embedded_checkout(&options.into());
    let instance = JsFuture::from(promise)
        .await
        .map_err(js_error_message)?;

    Ok(instance.unchecked_into::<EmbeddedCheckout>())
}

/// Mount a checkout instance into a container selector.
pub fn mount_embedded(checkout: &EmbeddedCheckout, selector: &str) {
    checkout.mount(selector);
}

/// Destroy a checkout instance, releasing its iframe and listeners.
pub fn destroy_embedded(checkout: &EmbeddedCheckout) {
    checkout.destroy();
}

/// Pull a readable message out of a JS exception or promise rejection.
fn js_error_message(value: JsValue) -> String {
    Reflect::get(&value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| "Checkout initialization failed".into())
}
