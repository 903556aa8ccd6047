// src/core/types.rs
use crate::error::{DiagnosisError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A diagnosable condition, identified by its lowercase name.
pub type Category = String;

/// A binary observable feature used as evidence.
pub type Symptom = String;

/// Category -> prior probability.
pub type Priors = BTreeMap<Category, f64>;

/// Category -> number of confirmed diagnoses (starts at 1).
pub type Counters = BTreeMap<Category, u64>;

/// Category -> Symptom -> P(symptom present | category).
pub type Likelihoods = BTreeMap<Category, BTreeMap<Symptom, f64>>;

/// Category -> normalized posterior probability.
pub type Posterior = BTreeMap<Category, f64>;

/// Normalizes a user-typed category or symptom name.
pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// The reference table: one row per category, one likelihood per symptom.
/// Rows keep their file order so they can be written back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct LikelihoodTable {
    pub symptoms: Vec<Symptom>,
    pub categories: Vec<Category>,
    pub priors: Priors,
    pub likelihoods: Likelihoods,
}

impl LikelihoodTable {
    pub fn contains(&self, category: &str) -> bool {
        self.priors.contains_key(category)
    }

    /// Replaces the prior column. Categories missing from `priors` keep their old value.
    pub fn set_priors(&mut self, priors: &Priors) {
        for (category, prior) in priors {
            if let Some(slot) = self.priors.get_mut(category) {
                *slot = *prior;
            }
        }
    }
}

/// One yes/no answer per known symptom. Partial vectors cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Observation {
    answers: BTreeMap<Symptom, bool>,
}

impl Observation {
    /// Checks that `answers` covers exactly `symptoms`.
    pub fn new(symptoms: &[Symptom], answers: BTreeMap<Symptom, bool>) -> Result<Self> {
        let expected: BTreeSet<&str> = symptoms.iter().map(String::as_str).collect();
        if let Some(missing) = expected.iter().find(|s| !answers.contains_key(**s)) {
            return Err(DiagnosisError::IncompleteObservation(format!(
                "no answer for '{missing}'"
            )));
        }
        if let Some(extra) = answers.keys().find(|s| !expected.contains(s.as_str())) {
            return Err(DiagnosisError::IncompleteObservation(format!(
                "unknown symptom '{extra}'"
            )));
        }
        Ok(Self { answers })
    }

    /// Every symptom in `present` is true, everything else false.
    pub fn from_present<S: AsRef<str>>(symptoms: &[Symptom], present: &[S]) -> Result<Self> {
        let mut answers: BTreeMap<Symptom, bool> =
            symptoms.iter().map(|s| (s.clone(), false)).collect();
        for name in present {
            let name = normalize_id(name.as_ref());
            match answers.get_mut(&name) {
                Some(flag) => *flag = true,
                None => {
                    return Err(DiagnosisError::IncompleteObservation(format!(
                        "unknown symptom '{name}'"
                    )))
                }
            }
        }
        Ok(Self { answers })
    }

    pub fn get(&self, symptom: &str) -> Option<bool> {
        self.answers.get(symptom).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symptom, bool)> {
        self.answers.iter().map(|(s, present)| (s, *present))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// How the user answered the final "is this right?" prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "category", rename_all = "snake_case")]
pub enum Confirmation {
    Correct(Category),
    Corrected(Category),
}

impl Confirmation {
    pub fn category(&self) -> &str {
        match self {
            Confirmation::Correct(c) | Confirmation::Corrected(c) => c,
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Confirmation::Correct(_))
    }
}

/// One finished session, as appended to the case log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub timestamp: DateTime<Utc>,
    pub observation: Observation,
    pub posterior: Posterior,
    pub predicted: Category,
    pub confirmation: Confirmation,
}
