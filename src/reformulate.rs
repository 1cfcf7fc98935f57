//! Explains to a reviewer why their review was removed and proposes a
//! rewrite that follows the platform guidelines, one completion per row.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::completion::CompletionClient;
use crate::error::{Error, Result};
use crate::session::{Sampling, Session};
use crate::spreadsheet::{Cell, Report, Table, read_table, write_report};

pub const EXPLANATION_MARKER: &str = "Explanation:";
pub const REWRITE_MARKER: &str = "Rewrite:";

/// Input columns the prompt is built from, in [`Complaint`] field order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "ID",
    "Company Name",
    "User Name",
    "Detailed Review",
    "Reason for Removal",
    "Star Rating",
    "Company Comment",
];

const REFORMULATE_SAMPLING: Sampling = Sampling {
    temperature: 0.3,
    max_tokens: 600,
};

/// One row of the removal dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Complaint<'a> {
    pub id: &'a str,
    pub company_name: &'a str,
    pub user_name: &'a str,
    pub detailed_review: &'a str,
    pub removal_reason: &'a str,
    pub star_rating: &'a str,
    pub company_comment: &'a str,
}

impl<'a> Complaint<'a> {
    /// Pick the required fields out of `row`; cells past its end read as empty.
    pub fn from_row(row: &'a [String], columns: &[usize; 7]) -> Self {
        let [
            id,
            company_name,
            user_name,
            detailed_review,
            removal_reason,
            star_rating,
            company_comment,
        ] = columns.map(|c| row.get(c).map_or("", String::as_str));
        Self {
            id,
            company_name,
            user_name,
            detailed_review,
            removal_reason,
            star_rating,
            company_comment,
        }
    }
}

#[derive(Serialize)]
struct ComplaintContext<'a> {
    id: &'a str,
    company_name: &'a str,
    user_name: &'a str,
    detailed_review: &'a str,
    removal_reason: &'a str,
    star_rating: &'a str,
    company_comment: &'a str,
    guidelines: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reformulation {
    pub explanation: String,
    pub rewrite: String,
}

/// Split a reply at the first rewrite marker. Without one, the whole reply is
/// the explanation.
pub fn parse_reformulation(reply: &str) -> Reformulation {
    let reply = reply.trim();
    match reply.split_once(REWRITE_MARKER) {
        Some((before, after)) => Reformulation {
            explanation: before.replace(EXPLANATION_MARKER, "").trim().to_string(),
            rewrite: after.trim().to_string(),
        },
        None => Reformulation {
            explanation: reply.to_string(),
            rewrite: String::new(),
        },
    }
}

/// Text of the guidelines document: PDFs are extracted, anything else is read as text.
pub fn load_guidelines(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        pdf_extract::extract_text(path)
            .map_err(|e| Error::Guidelines(format!("failed to extract {}: {e}", path.display())))
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn require_columns(table: &Table) -> Result<[usize; 7]> {
    let mut columns = [0; 7];
    for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = table.column_index(name)?;
    }
    Ok(columns)
}

/// A failed completion becomes the explanation text with an empty rewrite.
/// Prompt errors are returned.
pub fn reformulate_row<C: CompletionClient>(
    session: &Session<C>,
    complaint: &Complaint<'_>,
    guidelines: &str,
) -> Result<Reformulation> {
    let ctx = ComplaintContext {
        id: complaint.id,
        company_name: complaint.company_name,
        user_name: complaint.user_name,
        detailed_review: complaint.detailed_review,
        removal_reason: complaint.removal_reason,
        star_rating: complaint.star_rating,
        company_comment: complaint.company_comment,
        guidelines,
    };
    match session.ask_user("reformulate", ctx, REFORMULATE_SAMPLING) {
        Ok(reply) => Ok(parse_reformulation(&reply)),
        Err(e @ Error::Prompt(_)) => Err(e),
        Err(e) => {
            warn!(error = %e, id = complaint.id, "reformulation failed");
            Ok(Reformulation {
                explanation: e.to_string(),
                rewrite: String::new(),
            })
        }
    }
}

/// Every input column followed by `Explanation` and `Rewrite`.
pub fn reformulate_table<C: CompletionClient>(
    session: &Session<C>,
    table: &Table,
    guidelines: &str,
) -> Result<Report> {
    let columns = require_columns(table)?;
    let mut headers = table.headers.clone();
    headers.push("Explanation".to_string());
    headers.push("Rewrite".to_string());
    let mut report = Report::new(headers);

    for (i, row) in table.rows.iter().enumerate() {
        let complaint = Complaint::from_row(row, &columns);
        let result = reformulate_row(session, &complaint, guidelines)?;
        info!(row = i + 1, total = table.rows.len(), "row reformulated");

        let mut cells: Vec<Cell> = row.iter().map(|v| v.as_str().into()).collect();
        cells.push(result.explanation.into());
        cells.push(result.rewrite.into());
        report.push_row(cells);
    }

    Ok(report)
}

pub fn run<C: CompletionClient>(
    session: &Session<C>,
    input: &Path,
    sheet: &str,
    guidelines_path: &Path,
    output: &Path,
) -> Result<Report> {
    let table = read_table(input, Some(sheet))?;
    require_columns(&table)?;
    let guidelines = load_guidelines(guidelines_path)?;
    info!(
        rows = table.rows.len(),
        guidelines_chars = guidelines.chars().count(),
        "reformulating removed reviews"
    );

    let report = reformulate_table(session, &table, &guidelines)?;
    write_report(output, &report)?;
    info!(output = %output.display(), "results saved");
    Ok(report)
}
