//! Urgency Counter
//!
//! Cosmetic "spots left" counter persisted in local storage, decaying over
//! time toward a floor, plus the one-time purchase-simulation flag. No
//! coupling to the transactional flow.

use chrono::Utc;
use serde::{Deserialize, Serialize};

const STORAGE_KEY: &str = "solostore_spots";
const SIMULATION_KEY: &str = "solostore_purchase_sim_seen";

/// Starting count for a fresh visitor.
pub const INITIAL_SPOTS: u32 = 37;

/// The counter never drops below this.
pub const SPOTS_FLOOR: u32 = 4;

/// One spot disappears every this many minutes.
const DECAY_MINUTES: i64 = 45;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct SpotsRecord {
    spots: u32,
    updated_at: i64,
}

/// Apply time decay to a stored count. Monotonic non-increasing, floored.
fn decayed_spots(spots: u32, updated_at: i64, now: i64) -> u32 {
    let elapsed_minutes = (now - updated_at).max(0) / 60;
    let decay = u32::try_from(elapsed_minutes / DECAY_MINUTES).unwrap_or(u32::MAX);
    spots.saturating_sub(decay).max(SPOTS_FLOOR)
}

fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

/// Load the current spots count, applying decay and persisting the result.
pub fn load_spots() -> u32 {
    let now = Utc::now().timestamp();

    let Some(storage) = storage() else {
        return INITIAL_SPOTS;
    };

    let record = storage
        .get_item(STORAGE_KEY)
        .ok()
        .flatten()
        .and_then(|raw| serde_json::from_str::<SpotsRecord>(&raw).ok());

    let spots = match record {
        Some(record) => decayed_spots(record.spots, record.updated_at, now),
        None => INITIAL_SPOTS,
    };

    let fresh = SpotsRecord {
        spots,
        updated_at: now,
    };
    if let Ok(raw) = serde_json::to_string(&fresh) {
        let _ = storage.set_item(STORAGE_KEY, &raw);
    }

    spots
}

/// Whether this visitor has already seen the purchase simulation.
pub fn simulation_seen() -> bool {
    storage()
        .and_then(|s| s.get_item(SIMULATION_KEY).ok().flatten())
        .is_some()
}

/// Mark the purchase simulation as seen.
pub fn mark_simulation_seen() {
    if let Some(storage) = storage() {
        let _ = storage.set_item(SIMULATION_KEY, "1");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_decay_within_window() {
        let now = 1_700_000_000;
        assert_eq!(decayed_spots(30, now, now + 60), 30);
    }

    #[test]
    fn test_decays_one_per_window() {
        let start = 1_700_000_000;
        let after_two_windows = start + 2 * DECAY_MINUTES * 60;
        assert_eq!(decayed_spots(30, start, after_two_windows), 28);
    }

    #[test]
    fn test_never_below_floor() {
        let start = 1_700_000_000;
        let much_later = start + 365 * 24 * 60 * 60;
        assert_eq!(decayed_spots(30, start, much_later), SPOTS_FLOOR);
    }

    #[test]
    fn test_clock_skew_does_not_increase() {
        let now = 1_700_000_000;
        // updated_at in the future (clock skew) must not add spots back.
        assert_eq!(decayed_spots(10, now + 3600, now), 10);
    }
}
