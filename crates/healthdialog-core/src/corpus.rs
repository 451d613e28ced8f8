use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{CorpusEntry, RowId};

const QUESTION_COLUMN: &str = "question";
const ANSWER_COLUMN: &str = "answer";

/// Dense, ordered FAQ table. Immutable once loaded.
///
/// Row order is the contract with the vector index: the text at position `i`
/// handed to the index build must be `entries[i].question`.
#[derive(Debug, Clone, Default)]
pub struct CorpusStore {
    entries: Vec<CorpusEntry>,
}

impl CorpusStore {
    pub fn from_pairs<Q, A>(pairs: impl IntoIterator<Item = (Q, A)>) -> Self
    where
        Q: Into<String>,
        A: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .enumerate()
            .map(|(row_id, (q, a))| CorpusEntry { row_id, question: q.into(), answer: a.into() })
            .collect();
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| Error::Corpus(format!("{}: {}", path.display(), e)))?;
        let store = Self::from_reader(file)?;
        tracing::info!(path = %path.display(), rows = store.len(), "loaded FAQ corpus");
        Ok(store)
    }

    /// Parse CSV with a header row. `question` and `answer` are required; any
    /// other columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
        let headers = rdr.headers().map_err(|e| Error::Corpus(e.to_string()))?.clone();
        let q_idx = column_index(&headers, QUESTION_COLUMN)?;
        let a_idx = column_index(&headers, ANSWER_COLUMN)?;

        let mut entries = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let row = line + 1;
            let record = record.map_err(|e| Error::Corpus(format!("row {}: {}", row, e)))?;
            let question = required_field(&record, q_idx, row, QUESTION_COLUMN)?;
            let answer = required_field(&record, a_idx, row, ANSWER_COLUMN)?;
            if question.is_empty() || answer.is_empty() {
                tracing::warn!(row, "FAQ row has an empty question or answer");
            }
            entries.push(CorpusEntry { row_id: entries.len(), question, answer });
        }
        Ok(Self { entries })
    }

    pub fn get(&self, row_id: RowId) -> Result<&CorpusEntry> {
        self.entries.get(row_id).ok_or(Error::OutOfRange { row_id, size: self.entries.len() })
    }

    pub fn contains(&self, row_id: RowId) -> bool { row_id < self.entries.len() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn entries(&self) -> &[CorpusEntry] { &self.entries }

    /// Question texts in row order, ready for the index build.
    pub fn questions(&self) -> Vec<String> { self.entries.iter().map(|e| e.question.clone()).collect() }
}

/// Short rows are accepted by the flexible reader but must still carry every
/// required column.
fn required_field(record: &csv::StringRecord, idx: usize, row: usize, name: &str) -> Result<String> {
    record
        .get(idx)
        .map(|v| v.trim().to_string())
        .ok_or_else(|| Error::Corpus(format!("row {}: missing {}", row, name)))
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::Corpus(format!("missing required column '{}'", name)))
}
