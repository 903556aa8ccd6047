// File: src/persistence.rs
use crate::core::types::{normalize_id, Category, Counters, LikelihoodTable, SessionRecord, Symptom};
use crate::error::{DiagnosisError, Result};
use csv::{ReaderBuilder, StringRecord, Trim, Writer, WriterBuilder};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const DISEASE_COLUMN: &str = "disease";
const PRIOR_COLUMN: &str = "prior";
const COUNT_COLUMN: &str = "count";

/// Where the table and counters live. Injected into the engine so tests can
/// swap the filesystem for memory.
pub trait DiagnosisStore {
    fn load_table(&self) -> Result<LikelihoodTable>;
    /// `None` when no counters were ever written.
    fn load_counters(&self) -> Result<Option<Counters>>;
    fn save_counters(&self, counters: &Counters) -> Result<()>;
    /// Writes the table back with its (recomputed) prior column.
    fn save_table(&self, table: &LikelihoodTable) -> Result<()>;
}

/// Append-only sink for finished sessions.
pub trait CaseLog {
    fn append(&mut self, record: &SessionRecord) -> Result<()>;
}

/// Two flat CSV files on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    table_path: PathBuf,
    stats_path: PathBuf,
}

impl FileStore {
    pub fn new(table_path: impl Into<PathBuf>, stats_path: impl Into<PathBuf>) -> Self {
        Self {
            table_path: table_path.into(),
            stats_path: stats_path.into(),
        }
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }

    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }
}

impl DiagnosisStore for FileStore {
    fn load_table(&self) -> Result<LikelihoodTable> {
        if !self.table_path.exists() {
            return Err(DiagnosisError::MissingDataSource {
                path: self.table_path.clone(),
            });
        }
        let table = parse_table(File::open(&self.table_path)?)?;
        debug!(
            path = %self.table_path.display(),
            categories = table.categories.len(),
            symptoms = table.symptoms.len(),
            "table loaded"
        );
        Ok(table)
    }

    fn load_counters(&self) -> Result<Option<Counters>> {
        if !self.stats_path.exists() {
            return Ok(None);
        }
        parse_counters(File::open(&self.stats_path)?).map(Some)
    }

    fn save_counters(&self, counters: &Counters) -> Result<()> {
        save_to_disk(&self.stats_path, |writer| write_counters(writer, counters))?;
        info!(path = %self.stats_path.display(), "counters saved");
        Ok(())
    }

    fn save_table(&self, table: &LikelihoodTable) -> Result<()> {
        save_to_disk(&self.table_path, |writer| write_table(writer, table))?;
        info!(path = %self.table_path.display(), "priors saved");
        Ok(())
    }
}

/// Keeps everything in memory; nothing touches the disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RefCell<Option<LikelihoodTable>>,
    counters: RefCell<Option<Counters>>,
}

impl MemoryStore {
    pub fn new(table: Option<LikelihoodTable>, counters: Option<Counters>) -> Self {
        Self {
            table: RefCell::new(table),
            counters: RefCell::new(counters),
        }
    }

    pub fn table(&self) -> Option<LikelihoodTable> {
        self.table.borrow().clone()
    }

    pub fn counters(&self) -> Option<Counters> {
        self.counters.borrow().clone()
    }
}

impl DiagnosisStore for MemoryStore {
    fn load_table(&self) -> Result<LikelihoodTable> {
        self.table().ok_or_else(|| DiagnosisError::MissingDataSource {
            path: PathBuf::from("<memory>"),
        })
    }

    fn load_counters(&self) -> Result<Option<Counters>> {
        Ok(self.counters())
    }

    fn save_counters(&self, counters: &Counters) -> Result<()> {
        *self.counters.borrow_mut() = Some(counters.clone());
        Ok(())
    }

    fn save_table(&self, table: &LikelihoodTable) -> Result<()> {
        *self.table.borrow_mut() = Some(table.clone());
        Ok(())
    }
}

/// Replaces `path` in one rename so readers never see a half-written file.
pub fn save_to_disk<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut Writer<&File>) -> Result<()>,
{
    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = Writer::from_writer(temp_file.as_file());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Trimmed fields, ragged rows allowed so column counts are reported per line.
fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source)
}

fn line_of(record: &StringRecord) -> String {
    match record.position() {
        Some(pos) => format!("at line {}", pos.line()),
        None => "at unknown line".to_string(),
    }
}

fn parse_probability(raw: &str, row: &str, column: &str) -> Result<f64> {
    let value: f64 = raw.parse().map_err(|_| {
        DiagnosisError::malformed(row, format!("{column}: '{raw}' is not a number"))
    })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(DiagnosisError::malformed(
            row,
            format!("{column}: {value} is outside [0, 1]"),
        ));
    }
    Ok(value)
}

/// Parses `disease,prior,<symptom>...` with one row per category.
pub fn parse_table<R: Read>(source: R) -> Result<LikelihoodTable> {
    let mut reader = csv_reader(source);
    let columns = reader.headers()?.clone();
    if columns.len() < 2
        || !columns[0].eq_ignore_ascii_case(DISEASE_COLUMN)
        || !columns[1].eq_ignore_ascii_case(PRIOR_COLUMN)
    {
        return Err(DiagnosisError::malformed(
            "header",
            "header must start with 'disease,prior'",
        ));
    }

    let symptoms: Vec<Symptom> = columns.iter().skip(2).map(normalize_id).collect();
    let mut seen = BTreeSet::new();
    for symptom in &symptoms {
        if symptom.is_empty() || !seen.insert(symptom.as_str()) {
            return Err(DiagnosisError::malformed(
                "header",
                format!("empty or duplicate symptom column '{symptom}'"),
            ));
        }
    }

    let mut table = LikelihoodTable {
        symptoms,
        categories: Vec::new(),
        priors: BTreeMap::new(),
        likelihoods: BTreeMap::new(),
    };

    for record in reader.records() {
        let record = record?;
        let row = line_of(&record);
        if record.len() != columns.len() {
            return Err(DiagnosisError::malformed(
                &row,
                format!("expected {} columns, found {}", columns.len(), record.len()),
            ));
        }
        let category: Category = normalize_id(&record[0]);
        if category.is_empty() {
            return Err(DiagnosisError::malformed(&row, "empty disease name"));
        }
        if table.contains(&category) {
            return Err(DiagnosisError::malformed(
                &row,
                format!("duplicate disease '{category}'"),
            ));
        }
        let prior = parse_probability(&record[1], &row, PRIOR_COLUMN)?;
        let mut row_likelihoods = BTreeMap::new();
        for (symptom, raw) in table.symptoms.iter().zip(record.iter().skip(2)) {
            if raw.is_empty() {
                return Err(DiagnosisError::malformed(
                    &row,
                    format!("missing likelihood for '{symptom}'"),
                ));
            }
            row_likelihoods.insert(symptom.clone(), parse_probability(raw, &row, symptom)?);
        }
        table.categories.push(category.clone());
        table.priors.insert(category.clone(), prior);
        table.likelihoods.insert(category, row_likelihoods);
    }

    if table.categories.is_empty() {
        return Err(DiagnosisError::malformed("body", "table has no diseases"));
    }
    Ok(table)
}

pub fn write_table<W: Write>(writer: &mut Writer<W>, table: &LikelihoodTable) -> Result<()> {
    let mut header = vec![DISEASE_COLUMN.to_string(), PRIOR_COLUMN.to_string()];
    header.extend(table.symptoms.iter().cloned());
    writer.write_record(&header)?;
    for category in &table.categories {
        let likelihoods = &table.likelihoods[category];
        let mut fields = vec![category.clone(), table.priors[category].to_string()];
        fields.extend(table.symptoms.iter().map(|s| likelihoods[s].to_string()));
        writer.write_record(&fields)?;
    }
    Ok(())
}

/// Parses `disease,count`.
pub fn parse_counters<R: Read>(source: R) -> Result<Counters> {
    let mut reader = csv_reader(source);
    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Ok(Counters::new());
    }
    let is_expected = header.len() == 2
        && header[0].eq_ignore_ascii_case(DISEASE_COLUMN)
        && header[1].eq_ignore_ascii_case(COUNT_COLUMN);
    if !is_expected {
        return Err(DiagnosisError::malformed(
            "header",
            "counter header must be 'disease,count'",
        ));
    }

    let mut counters = Counters::new();
    for record in reader.records() {
        let record = record?;
        let row = line_of(&record);
        if record.len() != 2 {
            return Err(DiagnosisError::malformed(
                &row,
                format!("expected 2 columns, found {}", record.len()),
            ));
        }
        let count: u64 = record[1].parse().map_err(|_| {
            DiagnosisError::malformed(&row, format!("'{}' is not a count", &record[1]))
        })?;
        counters.insert(normalize_id(&record[0]), count);
    }
    Ok(counters)
}

pub fn write_counters<W: Write>(writer: &mut Writer<W>, counters: &Counters) -> Result<()> {
    writer.write_record([DISEASE_COLUMN, COUNT_COLUMN])?;
    for (category, count) in counters {
        writer.write_record([category.as_str(), count.to_string().as_str()])?;
    }
    Ok(())
}

/// CSV case log, one row per finished session.
#[derive(Debug, Clone)]
pub struct CsvCaseLog {
    path: PathBuf,
    symptoms: Vec<Symptom>,
    categories: Vec<Category>,
}

impl CsvCaseLog {
    pub fn new(path: impl Into<PathBuf>, table: &LikelihoodTable) -> Self {
        Self {
            path: path.into(),
            symptoms: table.symptoms.clone(),
            categories: table.categories.clone(),
        }
    }

    pub fn header(&self) -> Vec<String> {
        let mut columns = vec![
            "timestamp".to_string(),
            "predicted_diagnosis".to_string(),
            "confirmed_correct".to_string(),
            "confirmed_diagnosis".to_string(),
        ];
        columns.extend(self.symptoms.iter().map(|s| format!("symptom_{s}")));
        columns.extend(self.categories.iter().map(|c| format!("prob_{c}")));
        columns
    }

    pub fn row(&self, record: &SessionRecord) -> Vec<String> {
        let mut fields = vec![
            record.timestamp.to_rfc3339(),
            record.predicted.clone(),
            record.confirmation.is_correct().to_string(),
            record.confirmation.category().to_string(),
        ];
        fields.extend(
            self.symptoms
                .iter()
                .map(|s| record.observation.get(s).unwrap_or(false).to_string()),
        );
        fields.extend(
            self.categories
                .iter()
                .map(|c| record.posterior.get(c).copied().unwrap_or(0.0).to_string()),
        );
        fields
    }

    fn existing_header_matches(&self, header: &[String]) -> Result<bool> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;
        match reader.records().next() {
            Some(first) => Ok(first?.iter().eq(header.iter().map(String::as_str))),
            None => Ok(false),
        }
    }
}

impl CaseLog for CsvCaseLog {
    fn append(&mut self, record: &SessionRecord) -> Result<()> {
        let header = self.header();
        let existing_len = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
        if existing_len > 0 {
            if !self.existing_header_matches(&header)? {
                return Err(DiagnosisError::CaseLogSchema {
                    path: self.path.clone(),
                });
            }
        } else if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        if existing_len == 0 {
            writer.write_record(&header)?;
        }
        writer.write_record(&self.row(record))?;
        writer.flush()?;
        debug!(path = %self.path.display(), "case appended");
        Ok(())
    }
}
