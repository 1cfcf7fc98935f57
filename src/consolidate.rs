use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::completion::CompletionClient;
use crate::error::{Error, Result};
use crate::session::{Sampling, Session};

const CONSOLIDATE_SAMPLING: Sampling = Sampling {
    temperature: 0.2,
    max_tokens: 300,
};

#[derive(Serialize)]
struct ConsolidateContext {
    themes: String,
    categories: String,
}

/// Raw theme label → broader category. Unknown labels resolve to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationMap {
    entries: HashMap<String, String>,
}

impl ConsolidationMap {
    pub fn identity<S: AsRef<str>>(labels: &[S]) -> Self {
        labels
            .iter()
            .map(|l| (l.as_ref().to_string(), l.as_ref().to_string()))
            .collect()
    }

    pub fn resolve<'a>(&'a self, label: &'a str) -> &'a str {
        self.entries.get(label).map(String::as_str).unwrap_or(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for ConsolidationMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Parse `label: category` lines. Lines without a colon are ignored; both
/// sides are trimmed and lowercased, and later lines win on duplicate keys.
pub fn parse_consolidation(reply: &str) -> ConsolidationMap {
    reply
        .trim()
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(label, category)| (label.trim().to_lowercase(), category.trim().to_lowercase()))
        .collect()
}

/// Map every distinct raw label onto one of `categories` with a single call.
///
/// An empty label set returns an empty map without calling the model. A
/// failed completion degrades to the identity mapping.
pub fn consolidate<C: CompletionClient>(
    session: &Session<C>,
    labels: &[String],
    categories: &[String],
) -> Result<ConsolidationMap> {
    if labels.is_empty() {
        return Ok(ConsolidationMap::default());
    }

    let ctx = ConsolidateContext {
        themes: labels.join(", "),
        categories: categories.join(", "),
    };
    match session.ask("consolidate", ctx, CONSOLIDATE_SAMPLING) {
        Ok(reply) => {
            let map = parse_consolidation(&reply);
            debug!(labels = labels.len(), mapped = map.len(), "themes consolidated");
            Ok(map)
        }
        Err(e @ Error::Prompt(_)) => Err(e),
        Err(e) => {
            warn!(error = %e, "theme consolidation failed, keeping raw themes");
            Ok(ConsolidationMap::identity(labels))
        }
    }
}
