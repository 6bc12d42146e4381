//! Landing Page

use leptos::prelude::*;

use crate::api;
use crate::checkout::CheckoutController;
use crate::components::{CheckoutModal, SpotsBadge};
use crate::tracking;
use crate::urgency;

#[component]
pub fn HomePage() -> impl IntoView {
    let controller = CheckoutController::new();
    let (price, set_price) = signal(None::<api::PriceInfo>);
    let spots = urgency::load_spots();

    // One-time social-proof toast; the seen-flag persists across visits.
    let show_simulation = !urgency::simulation_seen();
    if show_simulation {
        urgency::mark_simulation_seen();
    }

    tracking::report_page_view();
    tracking::use_scroll_tracking();

    leptos::task::spawn_local(async move {
        match api::get_price().await {
            Ok(info) => set_price.set(Some(info)),
            Err(e) => leptos::logging::warn!("Price lookup failed: {e}"),
        }
    });

    view! {
        <div class="home">
            <header class="hero">
                <h1>"The Launch Playbook"</h1>
                <p class="tagline">
                    "The complete system for launching your first digital product"
                </p>

                <div class="price-display">
                    {move || {
                        price
                            .get()
                            .map_or_else(
                                || view! { <span class="price">"…"</span> }.into_any(),
                                |info| {
                                    view! { <span class="price">{info.formatted}</span> }
                                        .into_any()
                                },
                            )
                    }}
                    <span class="price-note">"one-time payment, lifetime access"</span>
                </div>

                <SpotsBadge spots=spots />

                <div class="cta">
                    <button class="btn btn-primary" on:click=move |_| controller.open()>
                        "Get Instant Access"
                    </button>
                </div>
            </header>

            <section class="features">
                <div class="feature">
                    <h3>"📦 Everything included"</h3>
                    <p>"Templates, checklists, and the full launch framework."</p>
                </div>
                <div class="feature">
                    <h3>"♾️ Lifetime access"</h3>
                    <p>"Pay once. Every future update is included."</p>
                </div>
                <div class="feature">
                    <h3>"🔒 Secure checkout"</h3>
                    <p>"Payments handled end-to-end by Stripe."</p>
                </div>
            </section>

            <Show when=move || show_simulation>
                <div class="toast">"Someone just grabbed their copy 🎉"</div>
            </Show>

            <CheckoutModal controller=controller />
        </div>
    }
}
