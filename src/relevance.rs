use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::ThemeGroup;
use crate::completion::CompletionClient;
use crate::error::{Error, Result};
use crate::session::{Sampling, Session};

/// Score used when the model's reply has no usable number.
pub const NEUTRAL_RELEVANCE: u32 = 5;
pub const MAX_SCORE: u32 = 10;
/// Longest reviews of a group that get scored.
pub const CANDIDATE_LIMIT: usize = 10;

const RELEVANCE_SAMPLING: Sampling = Sampling {
    temperature: 0.2,
    max_tokens: 5,
};

#[derive(Serialize)]
struct RelevanceContext<'a> {
    review: &'a str,
    theme: &'a str,
}

/// Keep only the digits of `reply` and read them as a score, capped at 10.
/// No digits (or an absurdly long run of them) yields `default`.
pub fn parse_score(reply: &str, default: u32) -> u32 {
    let digits: String = reply.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<u32>()
        .map(|score| score.min(MAX_SCORE))
        .unwrap_or(default)
}

/// Ask how strongly `review` is about `theme`. A sent request is always
/// followed by the throttle pause.
pub fn score_relevance<C: CompletionClient>(
    session: &Session<C>,
    review: &str,
    theme: &str,
) -> Result<u32> {
    let score = match session.ask(
        "relevance",
        RelevanceContext { review, theme },
        RELEVANCE_SAMPLING,
    ) {
        Ok(reply) => parse_score(&reply, NEUTRAL_RELEVANCE),
        Err(e @ Error::Prompt(_)) => return Err(e),
        Err(e) => {
            warn!(error = %e, theme, "relevance scoring failed");
            NEUTRAL_RELEVANCE
        }
    };
    session.throttle().pause();
    Ok(score)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub index: usize,
    pub relevance: u32,
    pub length: usize,
}

/// The `limit` longest reviews of a group as `(index, text)`; equal lengths
/// keep group order. Indices outside `reviews` are skipped.
pub fn longest_reviews<'a>(
    group: &ThemeGroup,
    reviews: &'a [String],
    limit: usize,
) -> Vec<(usize, &'a str)> {
    let mut by_length: Vec<(usize, &str)> = group
        .reviews
        .iter()
        .filter_map(|&idx| reviews.get(idx).map(|r| (idx, r.as_str())))
        .collect();
    by_length.sort_by_key(|&(_, text)| std::cmp::Reverse(text.chars().count()));
    by_length.truncate(limit);
    by_length
}

/// Order by relevance, then length, both descending. Stable for full ties.
pub fn rank_candidates(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| (b.relevance, b.length).cmp(&(a.relevance, a.length)));
}

/// Take up to `limit` ranked candidates not yet used by another theme,
/// topping up with already-used ones when too few remain. Every pick is
/// added to `used`.
pub fn pick_examples(
    ranked: &[ScoredCandidate],
    used: &mut HashSet<usize>,
    limit: usize,
) -> Vec<usize> {
    let mut picks: Vec<usize> = Vec::with_capacity(limit);

    for candidate in ranked {
        if picks.len() >= limit {
            break;
        }
        if !used.contains(&candidate.index) {
            picks.push(candidate.index);
            used.insert(candidate.index);
        }
    }

    for candidate in ranked {
        if picks.len() >= limit {
            break;
        }
        if !picks.contains(&candidate.index) {
            picks.push(candidate.index);
            used.insert(candidate.index);
        }
    }

    picks
}

/// Score the longest reviews of `group` against its theme and pick examples.
pub fn ranked_examples<C: CompletionClient>(
    session: &Session<C>,
    group: &ThemeGroup,
    reviews: &[String],
    used: &mut HashSet<usize>,
    limit: usize,
) -> Result<Vec<usize>> {
    debug!(theme = %group.theme, "scoring example candidates");
    let mut scored: Vec<ScoredCandidate> = Vec::with_capacity(CANDIDATE_LIMIT);
    for (index, text) in longest_reviews(group, reviews, CANDIDATE_LIMIT) {
        scored.push(ScoredCandidate {
            index,
            relevance: score_relevance(session, text, &group.theme)?,
            length: text.chars().count(),
        });
    }
    rank_candidates(&mut scored);
    Ok(pick_examples(&scored, used, limit))
}
