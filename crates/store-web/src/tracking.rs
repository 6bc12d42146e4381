//! Client-Side Event Reporting
//!
//! Reports PageView on mount and scroll-depth milestones from a window
//! scroll listener. Each milestone fires at most once per page load on the
//! client; the server-side dedup store remains authoritative.

use leptos::ev;
use leptos::prelude::*;

use crate::api;

/// Scroll-depth thresholds, in percent of scrollable height.
pub const SCROLL_MILESTONES: [u32; 4] = [25, 50, 75, 90];

/// Percentage of the page scrolled past, clamped to 0..=100.
fn scroll_percent(scroll_y: f64, viewport_height: f64, document_height: f64) -> u32 {
    let scrollable = document_height - viewport_height;
    if scrollable <= 0.0 {
        return 100;
    }
    let percent = (scroll_y / scrollable * 100.0).clamp(0.0, 100.0);
    // Truncation is intentional: 24.9% has not crossed the 25% milestone.
    percent as u32
}

/// Milestones newly crossed at `percent`, given which were already sent.
fn milestones_crossed(percent: u32, sent: &[bool; 4]) -> Vec<usize> {
    SCROLL_MILESTONES
        .iter()
        .enumerate()
        .filter(|&(i, &threshold)| percent >= threshold && !sent[i])
        .map(|(i, _)| i)
        .collect()
}

/// Report the page view for the current page load.
pub fn report_page_view() {
    leptos::task::spawn_local(async {
        if let Err(e) = api::track_event("PageView", None).await {
            leptos::logging::warn!("PageView tracking failed: {e}");
        }
    });
}

/// Attach a window scroll listener that reports each milestone once.
/// The listener lives until the owning component is cleaned up.
pub fn use_scroll_tracking() {
    let sent = StoredValue::new([false; 4]);

    let handle = window_event_listener(ev::scroll, move |_| {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };
        let Some(root) = document.document_element() else {
            return;
        };

        let scroll_y = window.scroll_y().unwrap_or(0.0);
        let viewport = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let height = f64::from(root.scroll_height());

        let percent = scroll_percent(scroll_y, viewport, height);
        for index in milestones_crossed(percent, &sent.get_value()) {
            sent.update_value(|flags| flags[index] = true);
            let event = format!("ScrollDepth{}", SCROLL_MILESTONES[index]);
            leptos::task::spawn_local(async move {
                if let Err(e) = api::track_event(&event, None).await {
                    leptos::logging::warn!("Scroll tracking failed: {e}");
                }
            });
        }
    });

    on_cleanup(move || handle.remove());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_percent() {
        // 2000px document, 1000px viewport: halfway down is 50%.
        assert_eq!(scroll_percent(500.0, 1000.0, 2000.0), 50);
        assert_eq!(scroll_percent(0.0, 1000.0, 2000.0), 0);
        assert_eq!(scroll_percent(1000.0, 1000.0, 2000.0), 100);
    }

    #[test]
    fn test_short_page_counts_as_fully_scrolled() {
        assert_eq!(scroll_percent(0.0, 1000.0, 800.0), 100);
    }

    #[test]
    fn test_milestones_fire_once() {
        let mut sent = [false; 4];

        let crossed = milestones_crossed(60, &sent);
        assert_eq!(crossed, vec![0, 1]); // 25 and 50

        for index in crossed {
            sent[index] = true;
        }
        assert!(milestones_crossed(60, &sent).is_empty());

        // Scrolling further fires only the new ones.
        assert_eq!(milestones_crossed(95, &sent), vec![2, 3]);
    }
}
