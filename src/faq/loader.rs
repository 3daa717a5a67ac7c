use std::collections::HashMap;
use std::path::Path;

use super::{FaqRecord, RowIssue};
use crate::core::errors::AssistantError;

const QUESTION_COLUMN: &str = "question";
const ANSWER_COLUMN: &str = "answer";
const ID_COLUMN: &str = "id";

/// Parsed FAQ file: usable records plus the rows that were rejected.
#[derive(Debug, Clone, Default)]
pub struct FaqDataset {
    pub records: Vec<FaqRecord>,
    pub total_rows: usize,
    pub issues: Vec<RowIssue>,
}

pub fn load_faq_csv(path: &Path) -> Result<FaqDataset, AssistantError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| {
            AssistantError::Validation(format!("Cannot open FAQ file {}: {}", path.display(), err))
        })?;
    read_dataset(reader, &path.display().to_string())
}

fn read_dataset<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    source: &str,
) -> Result<FaqDataset, AssistantError> {
    let headers = reader
        .headers()
        .map_err(|err| AssistantError::Validation(format!("Cannot read header of {}: {}", source, err)))?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
    };
    let missing: Vec<&str> = [QUESTION_COLUMN, ANSWER_COLUMN]
        .into_iter()
        .filter(|name| column(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(AssistantError::Validation(format!(
            "{} is missing required column(s): {}",
            source,
            missing.join(", ")
        )));
    }
    let (Some(question_idx), Some(answer_idx)) = (column(QUESTION_COLUMN), column(ANSWER_COLUMN))
    else {
        return Err(AssistantError::Validation(format!(
            "{} has no question/answer columns",
            source
        )));
    };
    let id_idx = column(ID_COLUMN);

    let mut dataset = FaqDataset::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (row, result) in reader.records().enumerate() {
        dataset.total_rows += 1;

        let record = match result {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!("Skipping row {} of {}: {}", row, source, err);
                dataset.issues.push(RowIssue {
                    row,
                    id: None,
                    reason: format!("unreadable row: {}", err),
                });
                continue;
            }
        };

        let id = id_idx
            .and_then(|idx| record.get(idx))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| FaqRecord::row_id(row));
        let question = record.get(question_idx).unwrap_or_default();
        let answer = record.get(answer_idx).unwrap_or_default();

        if question.is_empty() || answer.is_empty() {
            let field = if question.is_empty() { QUESTION_COLUMN } else { ANSWER_COLUMN };
            tracing::warn!("Skipping row {} ({}) of {}: empty {}", row, id, source, field);
            dataset.issues.push(RowIssue {
                row,
                id: Some(id),
                reason: format!("empty {}", field),
            });
            continue;
        }

        let faq = FaqRecord::new(id.clone(), question, answer);
        match seen.get(&id) {
            Some(&existing) => {
                tracing::warn!(
                    "Duplicate FAQ id '{}' at row {} replaces an earlier row",
                    id,
                    row
                );
                dataset.records[existing] = faq;
            }
            None => {
                seen.insert(id, dataset.records.len());
                dataset.records.push(faq);
            }
        }
    }

    Ok(dataset)
}
