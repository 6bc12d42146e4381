//! Client Checkout Controller
//!
//! Orchestrates the embedded checkout lifecycle as an explicit state
//! machine. One tagged state replaces the usual pile of boolean flags, so
//! "initializing and mounted at once" is unrepresentable.
//!
//! Cancellation: every open/close bumps an epoch; async work captures the
//! epoch it started under and discards its result if the epoch has moved.
//! The embedded instance is destroyed on every exit path.

use leptos::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::api;
use crate::stripe::{self, EmbeddedCheckout};

/// Selector the embedded checkout mounts into.
pub const CONTAINER_SELECTOR: &str = "#checkout-container";

/// Delay before mounting, giving the modal container a frame to render.
const MOUNT_DELAY_MS: i32 = 50;

/// Lifecycle of the checkout modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutState {
    /// Modal closed, nothing in flight
    Idle,

    /// Session creation / embedded init in flight
    Initializing,

    /// Embedded checkout mounted and interactive
    Mounted,

    /// Initialization failed; retry is offered
    Failed(String),
}

impl CheckoutState {
    /// Open requests are accepted only when nothing is in flight or
    /// mounted; a second open while initializing is a no-op.
    pub const fn accepts_open(&self) -> bool {
        matches!(self, Self::Idle | Self::Failed(_))
    }

    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Initializing | Self::Mounted | Self::Failed(_))
    }
}

/// Handle owning the modal lifecycle. Cheap to copy into closures.
#[derive(Clone, Copy)]
pub struct CheckoutController {
    state: RwSignal<CheckoutState>,
    epoch: StoredValue<u64>,
    instance: StoredValue<Option<EmbeddedCheckout>, LocalStorage>,
}

impl Default for CheckoutController {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutController {
    pub fn new() -> Self {
        Self {
            state: RwSignal::new(CheckoutState::Idle),
            epoch: StoredValue::new(0),
            instance: StoredValue::new_local(None),
        }
    }

    pub fn state(&self) -> RwSignal<CheckoutState> {
        self.state
    }

    /// Open the modal and start initialization. No-op unless the current
    /// state accepts an open request.
    pub fn open(&self) {
        if !self.state.get_untracked().accepts_open() {
            return;
        }

        self.teardown();
        let my_epoch = self.bump_epoch();
        self.state.set(CheckoutState::Initializing);

        let controller = *self;
        leptos::task::spawn_local(async move {
            controller.run_init(my_epoch).await;
        });
    }

    /// Close the modal, cancelling in-flight work and destroying any
    /// mounted instance.
    pub fn close(&self) {
        self.bump_epoch();
        self.teardown();
        self.state.set(CheckoutState::Idle);
    }

    /// Retry after a failure: full teardown, then open again.
    pub fn retry(&self) {
        if !matches!(self.state.get_untracked(), CheckoutState::Failed(_)) {
            return;
        }
        self.bump_epoch();
        self.teardown();
        self.state.set(CheckoutState::Idle);
        self.open();
    }

    fn bump_epoch(&self) -> u64 {
        self.epoch.update_value(|e| *e += 1);
        self.epoch.get_value()
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.get_value()
    }

    fn teardown(&self) {
        self.instance.update_value(|slot| {
            if let Some(instance) = slot.take() {
                stripe::destroy_embedded(&instance);
            }
        });
    }

    async fn run_init(self, my_epoch: u64) {
        let client_secret = match api::create_embedded_session().await {
            Ok(secret) => secret,
            Err(message) => {
                if self.current_epoch() == my_epoch {
                    self.state.set(CheckoutState::Failed(message));
                }
                return;
            }
        };
        if self.current_epoch() != my_epoch {
            // Closed while the session request was in flight.
            return;
        }

        let publishable_key = match api::get_checkout_config().await {
            Ok(key) => key,
            Err(message) => {
                if self.current_epoch() == my_epoch {
                    self.state.set(CheckoutState::Failed(message));
                }
                return;
            }
        };
        if self.current_epoch() != my_epoch {
            return;
        }

        let instance = match stripe::init_embedded(&publishable_key, &client_secret).await {
            Ok(instance) => instance,
            Err(message) => {
                if self.current_epoch() == my_epoch {
                    self.state.set(CheckoutState::Failed(message));
                }
                return;
            }
        };

        // Let the modal container render before mounting into it.
        sleep_ms(MOUNT_DELAY_MS).await;

        if self.current_epoch() != my_epoch {
            // Closed after init resolved; never mount a stale instance.
            stripe::destroy_embedded(&instance);
            return;
        }

        stripe::mount_embedded(&instance, CONTAINER_SELECTOR);
        self.instance.set_value(Some(instance));
        self.state.set(CheckoutState::Mounted);
    }
}

/// Await a browser timeout without pulling in a timer crate.
async fn sleep_ms(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        }
    });
    let _ = JsFuture::from(promise).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_accepted_from_idle_and_failed() {
        assert!(CheckoutState::Idle.accepts_open());
        assert!(CheckoutState::Failed("network".into()).accepts_open());
    }

    #[test]
    fn test_open_is_noop_while_busy() {
        assert!(!CheckoutState::Initializing.accepts_open());
        assert!(!CheckoutState::Mounted.accepts_open());
    }

    #[test]
    fn test_open_states() {
        assert!(!CheckoutState::Idle.is_open());
        assert!(CheckoutState::Initializing.is_open());
        assert!(CheckoutState::Mounted.is_open());
        assert!(CheckoutState::Failed("x".into()).is_open());
    }
}
