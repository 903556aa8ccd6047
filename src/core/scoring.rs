// File: src/core/scoring.rs
use crate::core::types::{Category, Likelihoods, Observation, Posterior, Priors};
use crate::error::{DiagnosisError, Result};
use std::cmp::Ordering;
use tracing::debug;

/// Naive Bayes over binary symptoms.
///
/// Each category starts at its prior and is multiplied by `l` for every present
/// symptom and by `1 - l` for every absent one. The raw scores are then
/// normalized so the posterior sums to 1. Pure: no state is read or written.
///
/// The products are kept as sums of logarithms and normalized with
/// log-sum-exp, so long symptom lists do not underflow to zero.
pub fn score(
    priors: &Priors,
    likelihoods: &Likelihoods,
    observation: &Observation,
) -> Result<Posterior> {
    let mut log_scores = Posterior::new();
    for (category, row) in likelihoods {
        let prior = *priors.get(category).ok_or_else(|| {
            DiagnosisError::malformed(format!("'{category}'"), "no prior")
        })?;
        let mut log_p = prior.ln();
        for (symptom, present) in observation.iter() {
            let l = *row.get(symptom).ok_or_else(|| {
                DiagnosisError::malformed(
                    format!("'{category}'"),
                    format!("no likelihood for '{symptom}'"),
                )
            })?;
            log_p += if present { l.ln() } else { (1.0 - l).ln() };
        }
        log_scores.insert(category.clone(), log_p);
    }
    debug!(?log_scores, "log scores");

    // -inf everywhere means every category was ruled out by a zero factor.
    let max = log_scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(DiagnosisError::DegenerateEvidence);
    }
    let weights: Posterior = log_scores
        .into_iter()
        .map(|(c, log_p)| (c, (log_p - max).exp()))
        .collect();
    let total: f64 = weights.values().sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(DiagnosisError::DegenerateEvidence);
    }
    Ok(weights.into_iter().map(|(c, w)| (c, w / total)).collect())
}

/// The category with the highest posterior. Equal maxima go to the
/// lexicographically smallest identifier.
pub fn most_likely(posterior: &Posterior) -> Option<&Category> {
    posterior
        .iter()
        .max_by(|(a_id, a_p), (b_id, b_p)| {
            a_p.partial_cmp(b_p)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b_id.cmp(a_id))
        })
        .map(|(category, _)| category)
}
