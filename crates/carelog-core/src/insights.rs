//! Window-scoped aggregation of issue mentions.
//!
//! Two folds share one extraction pass:
//! - [`aggregate_issue_insights`]: plain mention counts plus a
//!   representative snippet per issue, for "recent issues" views.
//! - [`derive_weighted_issue_series`]: weighted ranking and a dense daily
//!   score series, for stacked trend charts.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{DailyLogRecord, LexiconTerm};
use crate::nlp::extract_issue_mentions;
use crate::num::round2;
use crate::window::RangeWindow;

/// One (log, issue) extraction result tagged with the log's date.
///
/// Ephemeral: produced by [`collect_issue_rows`] and folded immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct MentionRow {
    pub source_id: String,
    pub issue_key: String,
    pub label: String,
    pub mention_count: u32,
    pub weighted_score: f64,
    pub evidence_snippet: Option<String>,
    pub date: String,
}

/// Extraction pass over every in-window log with non-empty notes.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRows {
    pub rows: Vec<MentionRow>,
    pub analyzed_logs: u32,
}

/// Run the mention extractor over each log inside `window`.
///
/// Inactive lexicon terms never participate in matching.
pub fn collect_issue_rows(
    logs: &[DailyLogRecord],
    terms: &[LexiconTerm],
    window: &RangeWindow,
) -> IssueRows {
    let active: Vec<LexiconTerm> = terms.iter().filter(|t| t.is_active).cloned().collect();
    let mut rows = Vec::new();
    let mut analyzed_logs = 0;

    for log in logs {
        if !window.contains(&log.date) || !log.has_notes() {
            continue;
        }
        let notes = log.notes.as_deref().unwrap_or_default();

        analyzed_logs += 1;
        for mention in extract_issue_mentions(notes, &active) {
            rows.push(MentionRow {
                source_id: log.id.clone(),
                issue_key: mention.issue_key,
                label: mention.label,
                mention_count: mention.mention_count,
                weighted_score: mention.weighted_score,
                evidence_snippet: mention.evidence_snippet,
                date: log.date.clone(),
            });
        }
    }

    IssueRows {
        rows,
        analyzed_logs,
    }
}

/// Ranked issue with plain counts for "recent issues" views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueInsightItem {
    pub issue_key: String,
    pub label: String,
    pub count: u32,
    pub last_seen_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_snippet: Option<String>,
}

/// One day of per-issue mention counts. Zero-mention days are present too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDayPoint {
    pub date: String,
    pub counts: BTreeMap<String, u32>,
}

/// Count-based ranking plus a dense daily count series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueInsights {
    pub window_days: usize,
    pub top_issues: Vec<IssueInsightItem>,
    pub daily_series: Vec<IssueDayPoint>,
    pub total_analyzed_logs: u32,
}

struct InsightFold {
    label: String,
    count: u32,
    weighted_score: f64,
    last_seen_date: String,
    latest_snippet: Option<String>,
}

/// Fold mention rows into the count-based insight payload.
///
/// Snippet selection: the most recent log's snippet wins; if the most
/// recent log had none, the first available snippet is kept.
pub fn aggregate_issue_insights(
    rows: &[MentionRow],
    window: &RangeWindow,
    limit: usize,
    include_snippets: bool,
    total_analyzed_logs: u32,
) -> IssueInsights {
    let mut by_issue: BTreeMap<String, InsightFold> = BTreeMap::new();
    let mut by_date: HashMap<String, BTreeMap<String, u32>> = HashMap::new();

    for row in rows {
        let fold = by_issue
            .entry(row.issue_key.clone())
            .or_insert_with(|| InsightFold {
                label: row.label.clone(),
                count: 0,
                weighted_score: 0.0,
                last_seen_date: row.date.clone(),
                latest_snippet: None,
            });

        fold.count += row.mention_count;
        fold.weighted_score += row.weighted_score;

        if row.date > fold.last_seen_date {
            fold.last_seen_date = row.date.clone();
            fold.latest_snippet = row.evidence_snippet.clone();
        } else if fold.latest_snippet.is_none() && row.evidence_snippet.is_some() {
            fold.latest_snippet = row.evidence_snippet.clone();
        }

        *by_date
            .entry(row.date.clone())
            .or_default()
            .entry(row.issue_key.clone())
            .or_insert(0) += row.mention_count;
    }

    let mut ranked: Vec<(String, InsightFold)> = by_issue.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.weighted_score
            .partial_cmp(&a.1.weighted_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.1.last_seen_date.cmp(&a.1.last_seen_date))
    });

    let top_issues = ranked
        .into_iter()
        .take(limit)
        .map(|(issue_key, fold)| IssueInsightItem {
            issue_key,
            label: fold.label,
            count: fold.count,
            last_seen_date: fold.last_seen_date,
            latest_snippet: if include_snippets {
                fold.latest_snippet
            } else {
                None
            },
        })
        .collect();

    let daily_series = window
        .dates
        .iter()
        .map(|date| IssueDayPoint {
            date: date.clone(),
            counts: by_date.get(date).cloned().unwrap_or_default(),
        })
        .collect();

    IssueInsights {
        window_days: window.days,
        top_issues,
        daily_series,
        total_analyzed_logs,
    }
}

/// Ranked issue with weighted totals for trend views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedIssueRankItem {
    pub issue_key: String,
    pub label: String,
    pub weighted_score: f64,
    pub mention_count: u32,
    pub last_seen_date: String,
}

/// One day of per-issue weighted scores for the ranked (active) issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedSeriesPoint {
    pub date: String,
    pub scores: BTreeMap<String, f64>,
}

/// Weighted ranking plus dense daily series for the ranked issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedIssueSeries {
    pub rank: Vec<WeightedIssueRankItem>,
    pub daily_series: Vec<WeightedSeriesPoint>,
    pub analyzed_logs: u32,
}

/// Rank issues by total weighted score (ties: most recent last-seen date
/// first), truncated to `limit`, and build the dense daily score series
/// covering only the ranked issues. All scores round to 2 decimals.
pub fn derive_weighted_issue_series(
    logs: &[DailyLogRecord],
    terms: &[LexiconTerm],
    window: &RangeWindow,
    limit: usize,
) -> WeightedIssueSeries {
    let collected = collect_issue_rows(logs, terms, window);

    let mut rank_map: BTreeMap<String, WeightedIssueRankItem> = BTreeMap::new();
    let mut scores_by_date: HashMap<String, BTreeMap<String, f64>> = HashMap::new();

    for row in &collected.rows {
        let item = rank_map
            .entry(row.issue_key.clone())
            .or_insert_with(|| WeightedIssueRankItem {
                issue_key: row.issue_key.clone(),
                label: row.label.clone(),
                weighted_score: 0.0,
                mention_count: 0,
                last_seen_date: row.date.clone(),
            });
        item.weighted_score += row.weighted_score;
        item.mention_count += row.mention_count;
        if row.date > item.last_seen_date {
            item.last_seen_date = row.date.clone();
        }

        let day_scores = scores_by_date.entry(row.date.clone()).or_default();
        let current = day_scores.get(&row.issue_key).copied().unwrap_or(0.0);
        day_scores.insert(row.issue_key.clone(), round2(current + row.weighted_score));
    }

    let mut rank: Vec<WeightedIssueRankItem> = rank_map.into_values().collect();
    rank.sort_by(|a, b| {
        b.weighted_score
            .partial_cmp(&a.weighted_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.last_seen_date.cmp(&a.last_seen_date))
    });
    rank.truncate(limit);
    for item in &mut rank {
        item.weighted_score = round2(item.weighted_score);
    }

    let active_keys: HashSet<&str> = rank.iter().map(|item| item.issue_key.as_str()).collect();
    let daily_series = window
        .dates
        .iter()
        .map(|date| {
            let day_scores = scores_by_date.get(date);
            let scores = active_keys
                .iter()
                .map(|key| {
                    let value = day_scores
                        .and_then(|scores| scores.get(*key))
                        .copied()
                        .unwrap_or(0.0);
                    ((*key).to_string(), round2(value))
                })
                .collect();
            WeightedSeriesPoint {
                date: date.clone(),
                scores,
            }
        })
        .collect();

    WeightedIssueSeries {
        rank,
        daily_series,
        analyzed_logs: collected.analyzed_logs,
    }
}
