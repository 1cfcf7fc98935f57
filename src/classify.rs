//! Review theme classification: extract, consolidate, group, pick examples.
//!
//! Two strategies share the pipeline and differ only after grouping:
//! `basic` reports the first reviews of each theme and appends a TOTAL row,
//! `ranked` scores the longest reviews against the theme and avoids reusing
//! an example across themes.

use std::collections::HashSet;
use std::path::Path;

use clap::ValueEnum;
use tracing::{debug, info, warn};

use crate::aggregate::{MAX_EXAMPLES, ThemeGroup, ThemeIndex, first_examples, group_themes};
use crate::completion::CompletionClient;
use crate::config::Config;
use crate::consolidate::consolidate;
use crate::error::Result;
use crate::extract::{extract_themes, is_analyzable};
use crate::relevance::ranked_examples;
use crate::session::Session;
use crate::spreadsheet::{Cell, Report, read_reviews, write_report};

pub const TOTAL_LABEL: &str = "TOTAL";

pub const BASIC_CATEGORIES: &[&str] = &[
    "moderation",
    "customer support",
    "website usability",
    "trustworthiness",
    "overall satisfaction",
];

pub const RANKED_CATEGORIES: &[&str] = &[
    "customer service",
    "product quality",
    "website usability",
    "price/value",
    "delivery experience",
    "communication",
    "trustworthiness",
    "return/refund policy",
    "customer support",
    "overall satisfaction",
];

pub const BASIC_FOCUS_AREAS: &[&str] = &["usability", "customer support", "moderation issues"];
pub const RANKED_FOCUS_AREAS: &[&str] = &["service quality", "communication", "product issues"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// First reviews as examples, TOTAL row, coverage warning
    Basic,
    /// Relevance-ranked examples, not reused across themes
    Ranked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifyOptions {
    pub strategy: Strategy,
    pub max_themes: usize,
    pub categories: Vec<String>,
    pub focus_areas: Vec<String>,
}

impl ClassifyOptions {
    /// Strategy defaults, overridden by config lists and the CLI theme cap.
    pub fn resolve(strategy: Strategy, config: &Config, max_themes: Option<usize>) -> Self {
        let (categories, focus_areas) = match strategy {
            Strategy::Basic => (BASIC_CATEGORIES, BASIC_FOCUS_AREAS),
            Strategy::Ranked => (RANKED_CATEGORIES, RANKED_FOCUS_AREAS),
        };
        Self {
            strategy,
            max_themes: max_themes.unwrap_or(config.max_themes),
            categories: config
                .categories
                .clone()
                .unwrap_or_else(|| to_strings(categories)),
            focus_areas: config
                .focus_areas
                .clone()
                .unwrap_or_else(|| to_strings(focus_areas)),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fewer distinct raw labels than this usually means extraction is failing.
pub const MIN_DISTINCT_THEMES: usize = 2;

/// Soft data-quality problems found after a run. They never stop the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryWarning {
    FewThemes { distinct_labels: usize },
    /// `basic` only: theme counts sum to less than the reviews read.
    Undercounted { total: usize, input_reviews: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeSummary {
    pub theme: String,
    pub count: usize,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub strategy: Strategy,
    pub themes: Vec<ThemeSummary>,
    /// Reviews long enough to be sent to the model.
    pub processed: usize,
    /// Distinct raw labels before consolidation.
    pub distinct_labels: usize,
    /// Non-blank reviews read from the input.
    pub input_reviews: usize,
}

impl Classification {
    /// Sum of counts over the reported themes. A review in several themes
    /// counts once per theme.
    pub fn total_count(&self) -> usize {
        self.themes.iter().map(|t| t.count).sum()
    }

    /// Output rows. `basic` appends the TOTAL row.
    pub fn report(&self) -> Report {
        let mut report = Report::new(["Theme", "Count", "Example 1", "Example 2", "Example 3"]);
        for theme in &self.themes {
            let mut row: Vec<Cell> = vec![theme.theme.as_str().into(), theme.count.into()];
            for slot in 0..MAX_EXAMPLES {
                row.push(theme.examples.get(slot).map_or("", String::as_str).into());
            }
            report.push_row(row);
        }
        if self.strategy == Strategy::Basic {
            report.push_row(vec![
                TOTAL_LABEL.into(),
                self.total_count().into(),
                "".into(),
                "".into(),
                "".into(),
            ]);
        }
        report
    }

    pub fn warnings(&self) -> Vec<SummaryWarning> {
        let mut warnings = Vec::new();
        if self.distinct_labels < MIN_DISTINCT_THEMES {
            warnings.push(SummaryWarning::FewThemes {
                distinct_labels: self.distinct_labels,
            });
        }
        let total = self.total_count();
        if self.strategy == Strategy::Basic && total < self.input_reviews {
            warnings.push(SummaryWarning::Undercounted {
                total,
                input_reviews: self.input_reviews,
            });
        }
        warnings
    }

    /// Log totals and the soft data-quality warnings.
    pub fn log_summary(&self) {
        info!(
            themes = self.themes.len(),
            processed = self.processed,
            total_counted = self.total_count(),
            "classification complete"
        );
        if self.strategy == Strategy::Basic {
            info!(input_reviews = self.input_reviews, "total reviews in input");
        }
        for warning in self.warnings() {
            match warning {
                SummaryWarning::FewThemes { distinct_labels } => warn!(
                    distinct_themes = distinct_labels,
                    "very few themes identified, the completion API may be failing"
                ),
                SummaryWarning::Undercounted {
                    total,
                    input_reviews,
                } => warn!(
                    total_counted = total,
                    input_reviews,
                    "theme counts sum to less than the number of input reviews"
                ),
            }
        }
    }
}

/// Extract themes for every analyzable review. Returns the raw index and the
/// number of reviews sent to the model.
pub fn collect_themes<C: CompletionClient>(
    session: &Session<C>,
    reviews: &[String],
    focus_areas: &str,
) -> Result<(ThemeIndex, usize)> {
    let mut index = ThemeIndex::new();
    let mut processed = 0;

    for (i, review) in reviews.iter().enumerate() {
        if !is_analyzable(review) {
            debug!(review = i, "skipping short review");
            continue;
        }

        let themes = extract_themes(session, review, focus_areas)?;
        processed += 1;
        debug!(review = i, themes = ?themes, "review themed");
        for theme in &themes {
            index.record(i, theme);
        }

        session.throttle().pause();
    }

    Ok((index, processed))
}

pub fn classify_reviews<C: CompletionClient>(
    session: &Session<C>,
    reviews: &[String],
    options: &ClassifyOptions,
) -> Result<Classification> {
    info!(reviews = reviews.len(), "analyzing reviews to identify themes");
    let (index, processed) = collect_themes(session, reviews, &options.focus_areas.join(", "))?;

    info!(distinct_themes = index.len(), "consolidating themes");
    let map = consolidate(session, index.labels(), &options.categories)?;
    let groups = group_themes(&index, &map, options.max_themes);

    let themes = match options.strategy {
        Strategy::Basic => groups
            .iter()
            .map(|g| summarize(g, first_examples(g, MAX_EXAMPLES), reviews))
            .collect(),
        Strategy::Ranked => {
            let mut used: HashSet<usize> = HashSet::new();
            let mut themes = Vec::with_capacity(groups.len());
            for g in &groups {
                info!(theme = %g.theme, "calculating relevance scores");
                let picks = ranked_examples(session, g, reviews, &mut used, MAX_EXAMPLES)?;
                themes.push(summarize(g, picks, reviews));
            }
            themes
        }
    };

    Ok(Classification {
        strategy: options.strategy,
        themes,
        processed,
        distinct_labels: index.len(),
        input_reviews: reviews.len(),
    })
}

fn summarize(group: &ThemeGroup, picks: Vec<usize>, reviews: &[String]) -> ThemeSummary {
    ThemeSummary {
        theme: group.theme.clone(),
        count: group.count(),
        examples: picks
            .into_iter()
            .filter_map(|i| reviews.get(i).cloned())
            .collect(),
    }
}

/// Read reviews, classify them and write the report.
pub fn run<C: CompletionClient>(
    session: &Session<C>,
    input: &Path,
    sheet: Option<&str>,
    column: &str,
    output: &Path,
    options: &ClassifyOptions,
) -> Result<Option<Classification>> {
    let reviews = read_reviews(input, sheet, column)?;
    if reviews.is_empty() {
        warn!(input = %input.display(), column, "no reviews found, nothing to analyze");
        return Ok(None);
    }
    info!(count = reviews.len(), "found reviews to analyze");

    let classification = classify_reviews(session, &reviews, options)?;
    classification.log_summary();
    write_report(output, &classification.report())?;
    info!(output = %output.display(), "results saved");
    Ok(Some(classification))
}
