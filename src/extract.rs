use serde::Serialize;
use tracing::warn;

use crate::completion::CompletionClient;
use crate::error::{Error, Result};
use crate::session::{Sampling, Session};

/// Reviews shorter than this (in characters, after trimming) are skipped.
pub const MIN_REVIEW_CHARS: usize = 5;

const EXTRACT_SAMPLING: Sampling = Sampling {
    temperature: 0.3,
    max_tokens: 50,
};

#[derive(Serialize)]
struct ExtractContext<'a> {
    review: &'a str,
    focus_areas: &'a str,
}

pub fn is_analyzable(review: &str) -> bool {
    review.trim().chars().count() >= MIN_REVIEW_CHARS
}

/// Split a comma-separated keyword reply into lowercase, trimmed labels.
/// Empty fragments and repeats are dropped; first-seen order is kept.
pub fn parse_theme_list(reply: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for fragment in reply.trim().to_lowercase().split(',') {
        let label = fragment.trim();
        if !label.is_empty() && !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    labels
}

/// Ask the model for 2-4 themes of one review.
///
/// A failed completion is logged, followed by the throttle's error back-off,
/// and yields no themes. Prompt errors are returned.
pub fn extract_themes<C: CompletionClient>(
    session: &Session<C>,
    review: &str,
    focus_areas: &str,
) -> Result<Vec<String>> {
    let ctx = ExtractContext {
        review,
        focus_areas,
    };
    match session.ask("extract", ctx, EXTRACT_SAMPLING) {
        Ok(reply) => Ok(parse_theme_list(&reply)),
        Err(e @ Error::Prompt(_)) => Err(e),
        Err(e) => {
            warn!(error = %e, "theme extraction failed");
            session.throttle().back_off();
            Ok(Vec::new())
        }
    }
}
