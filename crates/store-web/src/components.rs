//! UI Components

use leptos::prelude::*;

use crate::checkout::{CheckoutController, CheckoutState};

/// Modal hosting the embedded checkout. The container div must exist
/// before the controller mounts into it; the controller's mount delay
/// covers the first render.
#[component]
pub fn CheckoutModal(controller: CheckoutController) -> impl IntoView {
    let state = controller.state();

    // Release the embedded instance on component teardown as well as on
    // explicit close.
    on_cleanup(move || controller.close());

    view! {
        <Show when=move || state.get().is_open()>
            <div class="modal-overlay" on:click=move |_| controller.close()>
                <div class="modal" on:click=|ev| ev.stop_propagation()>
                    <button class="modal-close" on:click=move |_| controller.close()>
                        "✕"
                    </button>

                    {move || match state.get() {
                        CheckoutState::Initializing => view! {
                            <div class="modal-status">"Loading secure checkout…"</div>
                        }
                        .into_any(),
                        CheckoutState::Failed(message) => view! {
                            <div class="modal-error">
                                <p>{message}</p>
                                <button class="btn" on:click=move |_| controller.retry()>
                                    "Try again"
                                </button>
                            </div>
                        }
                        .into_any(),
                        _ => ().into_any(),
                    }}

                    <div id="checkout-container"></div>
                </div>
            </div>
        </Show>
    }
}

/// Remaining-spots badge
#[component]
pub fn SpotsBadge(spots: u32) -> impl IntoView {
    view! {
        <p class="spots">
            <span class="spots-count">{spots}</span>
            " spots left at this price"
        </p>
    }
}
