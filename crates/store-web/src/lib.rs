//! solostore Web Frontend
//!
//! Leptos-based WASM frontend for the checkout site: landing page with the
//! embedded checkout modal, and the success confirmation view.

mod api;
mod app;
mod checkout;
mod components;
mod pages;
mod stripe;
mod tracking;
mod urgency;

pub use app::App;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
