//! Selection engine: filter the catalog by active categories, then draw one
//! item uniformly at random after a fixed spin delay.
//!
//! The engine never owns catalog data. Candidates are passed in by reference
//! for each operation, so there is no second copy of the category list to
//! drift out of sync with the catalog store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::sync::Notify;

use crate::storage::{Category, Food};

/// How long a spin takes by default. The delay exists for the caller's
/// animation; nothing is computed during it.
pub const SPIN_DURATION: Duration = Duration::from_millis(2000);

/// The items eligible for a spin: those whose category is currently active.
///
/// Pure. Items referencing an inactive or unknown category are excluded;
/// dangling references are not an error.
pub fn filtered_candidates(foods: &[Food], categories: &[Category]) -> Vec<Food> {
    foods
        .iter()
        .filter(|food| {
            categories
                .iter()
                .any(|c| c.active && c.id == food.category_id)
        })
        .cloned()
        .collect()
}

/// Uniform draw over the candidate slice. Pure; `None` only for an empty slice.
///
/// Every candidate has equal weight; recently selected items are not
/// excluded or down-weighted.
pub fn pick<'a, R: Rng>(candidates: &'a [Food], rng: &mut R) -> Option<&'a Food> {
    if candidates.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..candidates.len());
    candidates.get(index)
}

/// Result of a [`Roulette::spin`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinOutcome {
    /// The wheel landed on an item; it is now the engine's selection.
    Landed(Food),
    /// No candidates — nothing happened, the engine never entered Spinning.
    EmptyPool,
    /// A spin was already in flight — this call was a no-op.
    Busy,
    /// [`Roulette::cancel_spin`] interrupted the delay. The previous
    /// selection is untouched.
    Cancelled,
}

/// The spin state machine: `Idle → Spinning → Idle(with result)`.
///
/// All methods take `&self`; the struct is shared behind an `Arc` by callers
/// that need to cancel a spin from another task. Re-entrant spins on the same
/// instance are rejected while one is in flight.
pub struct Roulette {
    spin_duration: Duration,
    spinning: AtomicBool,
    selected: Mutex<Option<Food>>,
    cancel: Notify,
}

impl Default for Roulette {
    fn default() -> Self {
        Self::new()
    }
}

impl Roulette {
    pub fn new() -> Self {
        Self::with_duration(SPIN_DURATION)
    }

    pub fn with_duration(spin_duration: Duration) -> Self {
        Self {
            spin_duration,
            spinning: AtomicBool::new(false),
            selected: Mutex::new(None),
            cancel: Notify::new(),
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.spinning.load(Ordering::Acquire)
    }

    /// The most recent spin result, if any.
    pub fn selected(&self) -> Option<Food> {
        self.selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clear the current selection. Does not touch history or a spin in flight.
    pub fn reset(&self) {
        *self
            .selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Interrupt a spin in flight, transitioning back to Idle without a
    /// result. No-op when nothing is spinning.
    pub fn cancel_spin(&self) {
        if self.is_spinning() {
            self.cancel.notify_one();
        }
    }

    /// Run one spin over `candidates`.
    ///
    /// Returns [`SpinOutcome::EmptyPool`] for an empty slice and
    /// [`SpinOutcome::Busy`] when a spin is already in flight; in both cases
    /// the engine state is unchanged. Otherwise the engine is Spinning for
    /// the configured delay, then lands on a uniformly random candidate which
    /// becomes [`selected`](Self::selected).
    ///
    /// Feeding the landed item into the history log is the caller's job.
    pub async fn spin(&self, candidates: &[Food]) -> SpinOutcome {
        if candidates.is_empty() {
            return SpinOutcome::EmptyPool;
        }
        if self
            .spinning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return SpinOutcome::Busy;
        }

        let outcome = tokio::select! {
            _ = tokio::time::sleep(self.spin_duration) => {
                let landed = {
                    let mut rng = rand::thread_rng();
                    pick(candidates, &mut rng).cloned()
                };
                match landed {
                    Some(food) => {
                        *self
                            .selected
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner) = Some(food.clone());
                        tracing::debug!(name = %food.name, "Spin landed");
                        SpinOutcome::Landed(food)
                    }
                    // Unreachable with a non-empty slice; treated as an empty pool.
                    None => SpinOutcome::EmptyPool,
                }
            }
            _ = self.cancel.notified() => {
                tracing::debug!("Spin cancelled");
                SpinOutcome::Cancelled
            }
        };

        self.spinning.store(false, Ordering::Release);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn food(id: i64, name: &str, category_id: i64) -> Food {
        Food {
            id,
            name: name.to_string(),
            emoji: "🍽️".to_string(),
            category_id,
            description: None,
            image_url: None,
        }
    }

    fn category(id: i64, active: bool) -> Category {
        Category {
            id,
            name: format!("cat-{id}"),
            emoji: "🏷️".to_string(),
            active,
        }
    }

    #[test]
    fn filtered_candidates_keeps_only_active_categories() {
        let foods = vec![food(1, "떡볶이", 5), food(2, "초밥", 4)];
        let categories = vec![category(4, true), category(5, true)];

        assert_eq!(filtered_candidates(&foods, &categories).len(), 2);

        let mut toggled = categories.clone();
        toggled[0].active = false;
        let filtered = filtered_candidates(&foods, &toggled);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "떡볶이");

        // Toggling back on restores the excluded items
        toggled[0].active = true;
        assert_eq!(filtered_candidates(&foods, &toggled).len(), 2);
    }

    #[test]
    fn dangling_category_reference_is_excluded() {
        let foods = vec![food(1, "유령메뉴", 42)];
        let categories = vec![category(1, true)];
        assert!(filtered_candidates(&foods, &categories).is_empty());
    }

    #[test]
    fn pick_on_empty_slice_is_none() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(pick(&[], &mut rng), None);
    }

    #[test]
    fn pick_is_uniform_over_four_items() {
        // Chi-square goodness of fit: 10,000 draws over 4 items, df = 3.
        // Critical value at p = 0.01 is 11.345.
        let foods: Vec<Food> = (0..4).map(|i| food(i, &format!("menu-{i}"), 1)).collect();
        let mut rng = StdRng::seed_from_u64(0xBAB);

        let mut counts = [0u32; 4];
        for _ in 0..10_000 {
            let picked = pick(&foods, &mut rng).unwrap();
            counts[picked.id as usize] += 1;
        }

        let expected = 2500.0;
        let chi_square: f64 = counts
            .iter()
            .map(|&c| {
                let diff = c as f64 - expected;
                diff * diff / expected
            })
            .sum();
        assert!(
            chi_square < 11.345,
            "chi-square {chi_square:.3} exceeds the p=0.01 critical value; counts: {counts:?}"
        );
    }

    #[tokio::test]
    async fn spin_with_empty_pool_changes_nothing() {
        let roulette = Roulette::new();
        let outcome = roulette.spin(&[]).await;

        assert_eq!(outcome, SpinOutcome::EmptyPool);
        assert!(!roulette.is_spinning());
        assert_eq!(roulette.selected(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn spin_lands_and_stores_selection() {
        let roulette = Arc::new(Roulette::new());
        let candidates = vec![food(1, "떡볶이", 5)];

        let engine = roulette.clone();
        let pool = candidates.clone();
        let handle = tokio::spawn(async move { engine.spin(&pool).await });

        while !roulette.is_spinning() {
            tokio::task::yield_now().await;
        }

        let outcome = handle.await.unwrap();
        assert_eq!(outcome, SpinOutcome::Landed(candidates[0].clone()));
        assert!(!roulette.is_spinning());
        assert_eq!(roulette.selected(), Some(candidates[0].clone()));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_spin_is_rejected_as_busy() {
        let roulette = Arc::new(Roulette::new());
        let candidates = vec![food(1, "라면", 5), food(2, "김밥", 5)];

        let engine = roulette.clone();
        let pool = candidates.clone();
        let handle = tokio::spawn(async move { engine.spin(&pool).await });

        while !roulette.is_spinning() {
            tokio::task::yield_now().await;
        }

        assert_eq!(roulette.spin(&candidates).await, SpinOutcome::Busy);

        // The original spin still completes
        assert!(matches!(handle.await.unwrap(), SpinOutcome::Landed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_returns_to_idle_without_result() {
        let roulette = Arc::new(Roulette::new());
        let candidates = vec![food(1, "라면", 5)];

        let engine = roulette.clone();
        let pool = candidates.clone();
        let handle = tokio::spawn(async move { engine.spin(&pool).await });

        while !roulette.is_spinning() {
            tokio::task::yield_now().await;
        }
        roulette.cancel_spin();

        assert_eq!(handle.await.unwrap(), SpinOutcome::Cancelled);
        assert!(!roulette.is_spinning());
        assert_eq!(roulette.selected(), None);
    }

    #[tokio::test]
    async fn cancel_when_idle_is_noop() {
        let roulette = Roulette::with_duration(Duration::from_millis(1));
        roulette.cancel_spin();

        // A later spin must not be poisoned by a stale cancel
        let candidates = vec![food(1, "라면", 5)];
        let outcome = roulette.spin(&candidates).await;
        assert!(matches!(outcome, SpinOutcome::Landed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_selection_only() {
        let roulette = Roulette::new();
        let candidates = vec![food(1, "라면", 5)];
        roulette.spin(&candidates).await;
        assert!(roulette.selected().is_some());

        roulette.reset();
        assert_eq!(roulette.selected(), None);
    }

    proptest! {
        #[test]
        fn filtered_is_exactly_the_active_subset(
            category_ids in proptest::collection::vec(1i64..=8, 0..30),
            active_mask in proptest::collection::vec(any::<bool>(), 5),
        ) {
            let foods: Vec<Food> = category_ids
                .iter()
                .enumerate()
                .map(|(i, &cid)| food(i as i64 + 1, &format!("menu-{i}"), cid))
                .collect();
            let categories: Vec<Category> = active_mask
                .iter()
                .enumerate()
                .map(|(i, &active)| category(i as i64 + 1, active))
                .collect();

            let filtered = filtered_candidates(&foods, &categories);

            // Strict subset of the input, and membership holds exactly for
            // foods whose category exists and is active.
            for item in &filtered {
                prop_assert!(foods.contains(item));
            }
            for item in &foods {
                let should_be_in = categories
                    .iter()
                    .any(|c| c.active && c.id == item.category_id);
                prop_assert_eq!(filtered.contains(item), should_be_in);
            }
        }
    }
}
