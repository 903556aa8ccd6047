use crate::core::scoring::{most_likely, score};
use crate::core::types::{
    Category, Confirmation, Counters, LikelihoodTable, Observation, Posterior, Priors, Symptom,
};
use crate::error::{DiagnosisError, Result};
use crate::learning::{self, LearningEngine};
use crate::persistence::DiagnosisStore;
use serde::Serialize;
use tracing::{debug, info, warn};

/// A scored observation and the category it points to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub posterior: Posterior,
    pub predicted: Category,
}

// The engine owns the in-memory table and counters for one run. The store is
// only touched in `load` and `save`.
pub struct DiagnosisEngine<S: DiagnosisStore> {
    pub table: LikelihoodTable,
    pub counters: Counters,
    learning_engine: LearningEngine,
    store: S,
}

impl<S: DiagnosisStore> DiagnosisEngine<S> {
    /// Reads the table (fatal if absent or malformed) and the counters. A store
    /// without counters starts every category at 1. The table's prior column is
    /// rebuilt from the counters, which are the source of truth.
    pub fn load(store: S) -> Result<Self> {
        let mut table = store.load_table()?;
        let counters = match store.load_counters()? {
            Some(loaded) => learning::reconcile_counters(loaded, &table.categories),
            None => {
                info!("no stored counters, starting every category at 1");
                learning::initial_counters(&table.categories)
            }
        };
        let priors = learning::recompute_priors(&counters)?;
        if priors != table.priors {
            debug!("prior column disagrees with the counters, using the counters");
            table.set_priors(&priors);
        }
        Ok(Self {
            table,
            counters,
            learning_engine: LearningEngine::new(),
            store,
        })
    }

    pub fn symptoms(&self) -> &[Symptom] {
        &self.table.symptoms
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Scores with the priors the counters give right now.
    pub fn diagnose(&self, observation: &Observation) -> Result<Diagnosis> {
        let priors = self.priors()?;
        let posterior = score(&priors, &self.table.likelihoods, observation)?;
        let predicted = most_likely(&posterior)
            .cloned()
            .ok_or(DiagnosisError::DegenerateEvidence)?;
        info!(%predicted, "diagnosis scored");
        Ok(Diagnosis { posterior, predicted })
    }

    /// Feeds a confirmation back into the counters. Unknown categories leave
    /// the counters as they were.
    pub fn user_confirms(&mut self, confirmation: &Confirmation) -> Result<()> {
        match self.learning_engine.learn(&self.counters, confirmation.category()) {
            Ok(next) => {
                self.counters = next;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "confirmation not recorded");
                Err(e)
            }
        }
    }

    pub fn priors(&self) -> Result<Priors> {
        learning::recompute_priors(&self.counters)
    }

    /// Recomputes priors from the counters and writes both back. The table goes
    /// first: if the counter write then fails, the next `load` still derives the
    /// priors from the counters on disk.
    pub fn save(&mut self) -> Result<()> {
        let priors = self.priors()?;
        self.table.set_priors(&priors);
        self.store.save_table(&self.table)?;
        self.store.save_counters(&self.counters)
    }

    /// Forgets every confirmation: counters back to 1, priors uniform.
    pub fn reset(&mut self) -> Result<()> {
        self.counters = learning::initial_counters(&self.table.categories);
        self.save()
    }
}
