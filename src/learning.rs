// File: src/learning.rs
use crate::core::types::{Category, Counters, Priors};
use crate::error::{DiagnosisError, Result};
use tracing::{debug, warn};

/// Counter every category starts from, so no prior is ever zero on the first run.
pub const INITIAL_COUNT: u64 = 1;

/// Fresh counters for a store that has never been written.
pub fn initial_counters<'a, I>(categories: I) -> Counters
where
    I: IntoIterator<Item = &'a Category>,
{
    categories
        .into_iter()
        .map(|c| (c.clone(), INITIAL_COUNT))
        .collect()
}

/// Returns `stats` with `confirmed` bumped by one.
/// An unknown category leaves the input untouched and is reported as an error.
pub fn update(stats: &Counters, confirmed: &str) -> Result<Counters> {
    LearningEngine::new().learn(stats, confirmed)
}

/// prior(c) = count(c) / sum(counts)
pub fn recompute_priors(stats: &Counters) -> Result<Priors> {
    let total: u64 = stats.values().sum();
    if total == 0 {
        return Err(DiagnosisError::EmptyCounters);
    }
    Ok(stats
        .iter()
        .map(|(c, &n)| (c.clone(), n as f64 / total as f64))
        .collect())
}

/// Lines persisted counters up with the current table: categories that left the
/// table are dropped, new ones start at [`INITIAL_COUNT`].
pub fn reconcile_counters(loaded: Counters, categories: &[Category]) -> Counters {
    let mut out = Counters::new();
    for category in categories {
        let count = loaded.get(category).copied().unwrap_or_else(|| {
            warn!(%category, initial = INITIAL_COUNT, "no stored counter");
            INITIAL_COUNT
        });
        out.insert(category.clone(), count);
    }
    for stale in loaded.keys().filter(|c| !out.contains_key(*c)) {
        warn!(category = %stale, "dropping counter for category missing from the table");
    }
    out
}

pub struct LearningEngine {
    count_increment: u64,
}

impl Default for LearningEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LearningEngine {
    pub fn new() -> Self {
        Self { count_increment: 1 }
    }

    pub fn learn(&self, stats: &Counters, confirmed: &str) -> Result<Counters> {
        if !stats.contains_key(confirmed) {
            return Err(DiagnosisError::UnknownCategory(confirmed.to_string()));
        }
        let mut next = stats.clone();
        if let Some(count) = next.get_mut(confirmed) {
            *count += self.count_increment;
            debug!(category = confirmed, count = *count, "counter updated");
        }
        Ok(next)
    }
}
