//! Query generation policy
//!
//! Turns the classification service's query proposals into the final search
//! set: a fixed total, a minimum per category, and a minimum number of
//! queries in one category that contain a keyword as a whole word.

use std::collections::HashSet;

use regex::Regex;
use shared::{QueryCategory, QueryConstraint, SearchQuery};

use crate::error::{PipelineError, PipelineResult};

/// At least `count` queries in `category`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMinimum {
    pub category: QueryCategory,
    pub count: usize,
}

/// At least `count` queries in `category` containing `keyword`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub keyword: String,
    pub category: QueryCategory,
    pub count: usize,
}

impl KeywordRule {
    fn matcher(&self) -> PipelineResult<Regex> {
        Regex::new(&format!(r"(?i)\b{}\b", regex::escape(self.keyword.trim())))
            .map_err(|e| PipelineError::config(format!("invalid keyword '{}': {e}", self.keyword)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPolicy {
    pub total: usize,
    pub minimums: Vec<CategoryMinimum>,
    pub keyword: Option<KeywordRule>,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            total: 10,
            minimums: vec![
                CategoryMinimum {
                    category: QueryCategory::Math,
                    count: 5,
                },
                CategoryMinimum {
                    category: QueryCategory::Curiosity,
                    count: 5,
                },
            ],
            keyword: Some(KeywordRule {
                keyword: "easy".to_string(),
                category: QueryCategory::Math,
                count: 2,
            }),
        }
    }
}

impl QueryPolicy {
    /// Check the policy can be satisfied by some query set at all
    pub fn validate(&self) -> PipelineResult<()> {
        if self.total == 0 {
            return Err(PipelineError::config("query total must be at least 1"));
        }
        let required: usize = self.minimums.iter().map(|m| m.count).sum();
        if required > self.total {
            return Err(PipelineError::config(format!(
                "category minimums ({required}) exceed query total ({})",
                self.total
            )));
        }
        if let Some(rule) = &self.keyword {
            if rule.keyword.trim().is_empty() {
                return Err(PipelineError::config("keyword rule has an empty keyword"));
            }
            if rule.count > self.total {
                return Err(PipelineError::config("keyword minimum exceeds query total"));
            }
            rule.matcher()?;
        }
        Ok(())
    }

    /// Select exactly `total` queries from `proposals`.
    ///
    /// Required items are chosen first (keyword matches, then category
    /// minimums), the rest are filled in proposal order, and the result keeps
    /// proposal order.
    pub fn apply(&self, proposals: Vec<SearchQuery>) -> PipelineResult<Vec<SearchQuery>> {
        let matcher = self.keyword.as_ref().map(|rule| rule.matcher()).transpose()?;
        let candidates = dedupe(proposals);

        let is_keyword_match = |query: &SearchQuery| match (&self.keyword, &matcher) {
            (Some(rule), Some(re)) => query.category == rule.category && re.is_match(&query.text),
            _ => false,
        };

        if candidates.len() < self.total {
            return Err(PipelineError::QueryPolicyError {
                reason: format!("expected {} distinct queries, got {}", self.total, candidates.len()),
            });
        }

        let mut selected = vec![false; candidates.len()];

        if let Some(rule) = &self.keyword {
            let matches: Vec<usize> = (0..candidates.len()).filter(|&i| is_keyword_match(&candidates[i])).collect();
            if matches.len() < rule.count {
                return Err(PipelineError::QueryPolicyError {
                    reason: format!(
                        "expected at least {} {} queries containing '{}', got {}",
                        rule.count,
                        rule.category,
                        rule.keyword,
                        matches.len()
                    ),
                });
            }
            for i in matches.into_iter().take(rule.count) {
                selected[i] = true;
            }
        }

        for minimum in &self.minimums {
            let mut have = count_selected(&candidates, &selected, minimum.category);
            for i in 0..candidates.len() {
                if have >= minimum.count {
                    break;
                }
                if !selected[i] && candidates[i].category == minimum.category {
                    selected[i] = true;
                    have += 1;
                }
            }
            if have < minimum.count {
                return Err(PipelineError::QueryPolicyError {
                    reason: format!(
                        "expected at least {} {} queries, got {}",
                        minimum.count, minimum.category, have
                    ),
                });
            }
        }

        let mut remaining = self.total.saturating_sub(selected.iter().filter(|s| **s).count());
        for flag in selected.iter_mut() {
            if remaining == 0 {
                break;
            }
            if !*flag {
                *flag = true;
                remaining -= 1;
            }
        }

        let chosen: Vec<SearchQuery> = candidates
            .into_iter()
            .zip(selected)
            .filter(|(_, keep)| *keep)
            .map(|(mut query, _)| {
                query.constraints.clear();
                if is_keyword_match(&query) {
                    if let Some(rule) = &self.keyword {
                        query.constraints.push(QueryConstraint::ContainsKeyword(rule.keyword.clone()));
                    }
                }
                query
            })
            .collect();

        if chosen.len() != self.total {
            return Err(PipelineError::QueryPolicyError {
                reason: format!(
                    "required queries ({}) exceed the total of {}",
                    chosen.len(),
                    self.total
                ),
            });
        }
        Ok(chosen)
    }

    /// Human-readable policy statement for the query prompt
    pub fn describe(&self) -> String {
        let mut lines = vec![format!("Return exactly {} search queries.", self.total)];
        for minimum in &self.minimums {
            lines.push(format!(
                "At least {} queries must have category \"{}\".",
                minimum.count, minimum.category
            ));
        }
        if let Some(rule) = &self.keyword {
            lines.push(format!(
                "At least {} of the \"{}\" queries must contain the word \"{}\".",
                rule.count, rule.category, rule.keyword
            ));
        }
        lines.join("\n")
    }
}

/// Trim, drop empty texts and keep the first of each normalised text
fn dedupe(proposals: Vec<SearchQuery>) -> Vec<SearchQuery> {
    let mut seen = HashSet::new();
    proposals
        .into_iter()
        .filter_map(|mut query| {
            query.text = query.text.trim().to_string();
            if query.text.is_empty() {
                return None;
            }
            let key = query.text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
            seen.insert(key).then_some(query)
        })
        .collect()
}

fn count_selected(candidates: &[SearchQuery], selected: &[bool], category: QueryCategory) -> usize {
    candidates
        .iter()
        .zip(selected)
        .filter(|(q, s)| **s && q.category == category)
        .count()
}
