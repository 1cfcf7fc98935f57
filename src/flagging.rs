//! Finds reviews whose author is unhappy about one of their reviews being
//! flagged or removed, scores how central that complaint is, and extracts
//! the details for the strongest ones.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::completion::CompletionClient;
use crate::error::{Error, Result};
use crate::extract::is_analyzable;
use crate::relevance::parse_score;
use crate::session::{Sampling, Session};
use crate::spreadsheet::{Report, read_reviews, write_report};

pub const DETAILS_FALLBACK: &str = "Error extracting details";

const DETECT_SAMPLING: Sampling = Sampling {
    temperature: 0.1,
    max_tokens: 5,
};
const SCORE_SAMPLING: Sampling = Sampling {
    temperature: 0.1,
    max_tokens: 5,
};
const DETAILS_SAMPLING: Sampling = Sampling {
    temperature: 0.1,
    max_tokens: 150,
};

#[derive(Serialize)]
struct ReviewContext<'a> {
    review: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedReview {
    pub index: usize,
    pub text: String,
    pub score: u32,
    pub details: String,
}

pub fn is_affirmative(reply: &str) -> bool {
    reply.trim().to_uppercase() == "YES"
}

pub fn detect_flagging<C: CompletionClient>(session: &Session<C>, review: &str) -> Result<bool> {
    match session.ask("flag-detect", ReviewContext { review }, DETECT_SAMPLING) {
        Ok(reply) => Ok(is_affirmative(&reply)),
        Err(e @ Error::Prompt(_)) => Err(e),
        Err(e) => {
            warn!(error = %e, "flagging detection failed");
            Ok(false)
        }
    }
}

/// 0-10; 0 when the reply is unusable.
pub fn score_flagging<C: CompletionClient>(session: &Session<C>, review: &str) -> Result<u32> {
    match session.ask("flag-score", ReviewContext { review }, SCORE_SAMPLING) {
        Ok(reply) => Ok(parse_score(&reply, 0)),
        Err(e @ Error::Prompt(_)) => Err(e),
        Err(e) => {
            warn!(error = %e, "flagging score failed");
            Ok(0)
        }
    }
}

pub fn flagging_details<C: CompletionClient>(session: &Session<C>, review: &str) -> Result<String> {
    match session.ask("flag-details", ReviewContext { review }, DETAILS_SAMPLING) {
        Ok(reply) => Ok(reply.trim().to_string()),
        Err(e @ Error::Prompt(_)) => Err(e),
        Err(e) => {
            warn!(error = %e, "flagging detail extraction failed");
            Ok(DETAILS_FALLBACK.to_string())
        }
    }
}

/// Run detection, scoring and detail extraction over every analyzable review.
/// Results are sorted by score, highest first; equal scores keep input order.
pub fn find_flagged_reviews<C: CompletionClient>(
    session: &Session<C>,
    reviews: &[String],
    threshold: u32,
) -> Result<Vec<FlaggedReview>> {
    let mut found = Vec::new();

    for (index, review) in reviews.iter().enumerate() {
        if !is_analyzable(review) {
            continue;
        }

        if detect_flagging(session, review)? {
            let score = score_flagging(session, review)?;
            debug!(review = index, score, "flagging mention detected");
            if score >= threshold {
                found.push(FlaggedReview {
                    index,
                    text: review.clone(),
                    score,
                    details: flagging_details(session, review)?,
                });
            }
        }

        session.throttle().pause();
    }

    found.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(found)
}

pub fn report(found: &[FlaggedReview]) -> Report {
    let mut report = Report::new(["Review_Index", "Review_Text", "Relevance_Score", "Details"]);
    for item in found {
        report.push_row(vec![
            item.index.into(),
            item.text.as_str().into(),
            item.score.into(),
            item.details.as_str().into(),
        ]);
    }
    report
}

pub fn run<C: CompletionClient>(
    session: &Session<C>,
    input: &Path,
    sheet: Option<&str>,
    column: &str,
    output: &Path,
    threshold: u32,
) -> Result<Option<Vec<FlaggedReview>>> {
    let reviews = read_reviews(input, sheet, column)?;
    if reviews.is_empty() {
        warn!(input = %input.display(), column, "no reviews found, nothing to analyze");
        return Ok(None);
    }
    info!(count = reviews.len(), "analyzing reviews for flagging complaints");

    let found = find_flagged_reviews(session, &reviews, threshold)?;
    write_report(output, &report(&found))?;
    info!(
        output = %output.display(),
        flagged = found.len(),
        "results saved"
    );
    Ok(Some(found))
}
