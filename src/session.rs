// File: src/session.rs
use crate::chart::{render_chart, ChartStyle};
use crate::core::engine::{Diagnosis, DiagnosisEngine};
use crate::core::types::{normalize_id, Confirmation, Observation, SessionRecord};
use crate::error::{DiagnosisError, Result};
use crate::persistence::{CaseLog, DiagnosisStore};
use crate::prompt::InputSource;
use chrono::Utc;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, info, warn};

/// Where a session is. Transitions only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Start,
    CollectingObservations,
    Scored,
    AwaitingConfirmation,
    ConfirmedCorrect,
    ConfirmedCorrection,
    PersistedPriors,
    LoggedCase,
    End,
}

#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub record: SessionRecord,
    /// False when the correction named an unknown category.
    pub counters_updated: bool,
    pub logged: bool,
    pub trail: Vec<SessionState>,
}

/// One interactive diagnosis, from the first symptom question to the case log.
pub struct Session<'a, S: DiagnosisStore, I: InputSource, W: Write> {
    engine: &'a mut DiagnosisEngine<S>,
    input: &'a mut I,
    out: &'a mut W,
    case_log: Option<&'a mut dyn CaseLog>,
    chart: Option<ChartStyle>,
    trail: Vec<SessionState>,
}

impl<'a, S: DiagnosisStore, I: InputSource, W: Write> Session<'a, S, I, W> {
    /// Takes an engine that already loaded its table; load failures never get this far.
    pub fn new(engine: &'a mut DiagnosisEngine<S>, input: &'a mut I, out: &'a mut W) -> Self {
        Self {
            engine,
            input,
            out,
            case_log: None,
            chart: None,
            trail: vec![SessionState::Start],
        }
    }

    pub fn with_case_log(mut self, case_log: &'a mut dyn CaseLog) -> Self {
        self.case_log = Some(case_log);
        self
    }

    pub fn with_chart(mut self, style: ChartStyle) -> Self {
        self.chart = Some(style);
        self
    }

    pub fn state(&self) -> SessionState {
        self.trail.last().copied().unwrap_or(SessionState::Start)
    }

    fn advance(&mut self, next: SessionState) {
        debug!(from = ?self.state(), to = ?next, "session transition");
        self.trail.push(next);
    }

    pub fn run(mut self) -> Result<SessionOutcome> {
        self.advance(SessionState::CollectingObservations);
        let observation = self.collect_observations()?;

        let diagnosis = self.engine.diagnose(&observation)?;
        self.advance(SessionState::Scored);
        self.show(&diagnosis)?;

        self.advance(SessionState::AwaitingConfirmation);
        let confirmation = self.confirm(&diagnosis.predicted)?;
        self.advance(if confirmation.is_correct() {
            SessionState::ConfirmedCorrect
        } else {
            SessionState::ConfirmedCorrection
        });

        let counters_updated = match self.engine.user_confirms(&confirmation) {
            Ok(()) => true,
            Err(DiagnosisError::UnknownCategory(name)) => {
                writeln!(
                    self.out,
                    "'{name}' is not a known diagnosis; statistics were not updated."
                )?;
                false
            }
            Err(e) => return Err(e),
        };

        self.engine.save()?;
        self.advance(SessionState::PersistedPriors);
        writeln!(self.out, "Statistics and priors saved.")?;

        let record = SessionRecord {
            timestamp: Utc::now(),
            observation,
            posterior: diagnosis.posterior,
            predicted: diagnosis.predicted,
            confirmation,
        };

        let mut logged = false;
        if let Some(log) = self.case_log.as_mut() {
            match log.append(&record) {
                Ok(()) => logged = true,
                Err(e) => {
                    warn!(error = %e, "case not logged");
                    writeln!(self.out, "Case was not logged: {e}")?;
                }
            }
        }
        if logged {
            self.advance(SessionState::LoggedCase);
        }

        self.advance(SessionState::End);
        info!(
            predicted = %record.predicted,
            confirmed = %record.confirmation.category(),
            counters_updated,
            logged,
            "session finished"
        );
        Ok(SessionOutcome {
            record,
            counters_updated,
            logged,
            trail: self.trail,
        })
    }

    fn collect_observations(&mut self) -> Result<Observation> {
        let symptoms = self.engine.symptoms().to_vec();
        let mut answers = BTreeMap::new();
        for symptom in &symptoms {
            let question = format!("Do you have {}?", symptom.replace('_', " "));
            answers.insert(symptom.clone(), self.input.ask_yes_no(&question)?);
        }
        Observation::new(&symptoms, answers)
    }

    fn show(&mut self, diagnosis: &Diagnosis) -> Result<()> {
        writeln!(self.out, "\nDiagnosis probabilities:")?;
        for category in &self.engine.table.categories {
            let p = diagnosis.posterior.get(category).copied().unwrap_or(0.0);
            writeln!(self.out, "  {category}: {:.2}%", p * 100.0)?;
        }
        writeln!(self.out, "Most likely diagnosis: {}", diagnosis.predicted)?;
        if let Some(style) = self.chart {
            writeln!(self.out)?;
            render_chart(&mut *self.out, &diagnosis.posterior, &diagnosis.predicted, style)?;
        }
        Ok(())
    }

    fn confirm(&mut self, predicted: &str) -> Result<Confirmation> {
        let question = format!("Is '{predicted}' the correct diagnosis?");
        if self.input.ask_yes_no(&question)? {
            return Ok(Confirmation::Correct(predicted.to_string()));
        }
        let answer = self.input.ask_line("Please enter the correct diagnosis:")?;
        Ok(Confirmation::Corrected(normalize_id(&answer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{parse_table, MemoryStore};
    use crate::prompt::ScriptedInput;

    struct VecLog(Vec<SessionRecord>);

    impl CaseLog for VecLog {
        fn append(&mut self, record: &SessionRecord) -> Result<()> {
            self.0.push(record.clone());
            Ok(())
        }
    }

    fn engine() -> DiagnosisEngine<MemoryStore> {
        let text = "disease,prior,fever,runny_nose\nflu,0.5,0.9,0.4\ncold,0.5,0.3,0.9\n";
        let table = parse_table(text.as_bytes()).unwrap();
        DiagnosisEngine::load(MemoryStore::new(Some(table), None)).unwrap()
    }

    #[test]
    fn confirmed_session_walks_every_state() {
        let mut engine = engine();
        let mut input = ScriptedInput::new(["y", "n", "y"]);
        let mut out = Vec::new();
        let mut log = VecLog(Vec::new());
        let outcome = Session::new(&mut engine, &mut input, &mut out)
            .with_case_log(&mut log)
            .run()
            .unwrap();

        use SessionState::*;
        assert_eq!(
            outcome.trail,
            vec![
                Start,
                CollectingObservations,
                Scored,
                AwaitingConfirmation,
                ConfirmedCorrect,
                PersistedPriors,
                LoggedCase,
                End
            ]
        );
        assert_eq!(outcome.record.predicted, "flu");
        assert!(outcome.counters_updated);
        assert_eq!(log.0.len(), 1);
        assert_eq!(engine.counters["flu"], 2);
        assert_eq!(input.asked[1], "Do you have runny nose?");

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Most likely diagnosis: flu"));
    }

    #[test]
    fn correction_counts_for_the_named_category() {
        let mut engine = engine();
        let mut input = ScriptedInput::new(["y", "n", "n", " COLD "]);
        let mut out = Vec::new();
        let outcome = Session::new(&mut engine, &mut input, &mut out).run().unwrap();
        assert_eq!(outcome.record.confirmation, Confirmation::Corrected("cold".into()));
        assert!(outcome.trail.contains(&SessionState::ConfirmedCorrection));
        assert!(!outcome.logged);
        assert_eq!(engine.counters["cold"], 2);
        assert_eq!(engine.counters["flu"], 1);
    }

    #[test]
    fn unknown_correction_is_reported_and_posterior_kept() {
        let mut engine = engine();
        let mut input = ScriptedInput::new(["y", "n", "n", "plague"]);
        let mut out = Vec::new();
        let outcome = Session::new(&mut engine, &mut input, &mut out).run().unwrap();
        assert!(!outcome.counters_updated);
        assert_eq!(outcome.record.posterior.len(), 2);
        assert!(engine.counters.values().all(|&n| n == 1));
        assert_eq!(outcome.trail.last(), Some(&SessionState::End));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("'plague' is not a known diagnosis"));
    }

    #[test]
    fn closed_input_saves_nothing() {
        let mut engine = engine();
        let mut input = ScriptedInput::new(["y"]);
        let mut out = Vec::new();
        let err = Session::new(&mut engine, &mut input, &mut out).run().unwrap_err();
        assert!(matches!(err, DiagnosisError::InputClosed));
        assert!(engine.store().counters().is_none());
    }
}
