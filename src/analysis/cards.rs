//! Metric cards: market-intelligence record collections and their summaries.
//!
//! Each card kind has its own record shape but shares one derivation:
//! totals and extremes over recent records, a compliance rate, a
//! month-over-month growth rate and a trend label. Summaries are rebuilt
//! from the records on every pass.

use super::stats::{data_quality, freshness_for_days, growth_rate, update_freshness};
use super::trend::{trend_label, TrendLabel, TrendThresholds};
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days a congressional trade may go undisclosed and still be compliant.
pub const DISCLOSURE_DEADLINE_DAYS: i64 = 45;

/// The card kinds the aggregator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Trading,
    Contracts,
    Lobbying,
    Patents,
    Sentiment,
}

impl CardKind {
    pub const ALL: [CardKind; 5] = [
        CardKind::Trading,
        CardKind::Contracts,
        CardKind::Lobbying,
        CardKind::Patents,
        CardKind::Sentiment,
    ];

    /// Trend cut points for this kind.
    pub fn thresholds(&self) -> TrendThresholds {
        match self {
            CardKind::Trading | CardKind::Contracts => TrendThresholds::STANDARD,
            CardKind::Lobbying => TrendThresholds::LOBBYING,
            CardKind::Patents => TrendThresholds::PATENTS,
            CardKind::Sentiment => TrendThresholds::SENTIMENT,
        }
    }

    /// Name used when the input card does not carry one.
    pub fn default_name(&self) -> &'static str {
        match self {
            CardKind::Trading => "Congressional Trading",
            CardKind::Contracts => "Government Contracts",
            CardKind::Lobbying => "Lobbying",
            CardKind::Patents => "Patents",
            CardKind::Sentiment => "Market Sentiment",
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

/// What every card record exposes to the shared derivation.
pub trait CardRecord {
    /// Date the record is bucketed by.
    fn date(&self) -> NaiveDate;
    /// Monetary amount or count summed into the card totals.
    fn value(&self) -> f64;
    /// Whether the record counts toward the compliance rate.
    fn is_compliant(&self) -> bool;
    /// Whether the record is flagged as a potential conflict of interest.
    fn is_potential_conflict(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transaction {
    Purchase,
    Sale,
    Exchange,
}

/// A disclosed trade by a public official.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub official: String,
    pub ticker: String,
    pub transaction: Transaction,
    pub amount: f64,
    pub traded_on: NaiveDate,
    /// `None` while the trade has not been disclosed.
    #[serde(default)]
    pub disclosed_on: Option<NaiveDate>,
    #[serde(default)]
    pub potential_conflict: bool,
}

impl CardRecord for TradeRecord {
    fn date(&self) -> NaiveDate {
        self.traded_on
    }

    fn value(&self) -> f64 {
        self.amount
    }

    fn is_compliant(&self) -> bool {
        self.disclosed_on
            .map(|d| (d - self.traded_on).num_days() <= DISCLOSURE_DEADLINE_DAYS)
            .unwrap_or(false)
    }

    fn is_potential_conflict(&self) -> bool {
        self.potential_conflict
    }
}

/// A federal contract award.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub agency: String,
    pub recipient: String,
    pub amount: f64,
    pub awarded_on: NaiveDate,
    pub compliant: bool,
}

impl CardRecord for ContractRecord {
    fn date(&self) -> NaiveDate {
        self.awarded_on
    }

    fn value(&self) -> f64 {
        self.amount
    }

    fn is_compliant(&self) -> bool {
        self.compliant
    }
}

/// A lobbying disclosure report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyingRecord {
    pub client: String,
    pub registrant: String,
    pub amount: f64,
    pub filed_on: NaiveDate,
    pub on_time: bool,
}

impl CardRecord for LobbyingRecord {
    fn date(&self) -> NaiveDate {
        self.filed_on
    }

    fn value(&self) -> f64 {
        self.amount
    }

    fn is_compliant(&self) -> bool {
        self.on_time
    }
}

/// A granted patent. Valued by claim count; cited patents count as quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentRecord {
    pub assignee: String,
    pub title: String,
    pub granted_on: NaiveDate,
    pub claims: u32,
    #[serde(default)]
    pub citations: u32,
}

impl CardRecord for PatentRecord {
    fn date(&self) -> NaiveDate {
        self.granted_on
    }

    fn value(&self) -> f64 {
        f64::from(self.claims)
    }

    fn is_compliant(&self) -> bool {
        self.citations > 0
    }
}

/// A sentiment reading. Valued by mentions; non-negative score counts as positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub ticker: String,
    /// In [-1, 1].
    pub score: f64,
    pub mentions: u32,
    pub observed_on: NaiveDate,
}

impl CardRecord for SentimentRecord {
    fn date(&self) -> NaiveDate {
        self.observed_on
    }

    fn value(&self) -> f64 {
        f64::from(self.mentions)
    }

    fn is_compliant(&self) -> bool {
        self.score >= 0.0
    }
}

/// A named collection of records of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCard<R> {
    #[serde(default)]
    pub name: Option<String>,
    /// Explicit last-update stamp; falls back to the newest record date.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default = "Vec::new")]
    pub records: Vec<R>,
}

impl<R> Default for MetricCard<R> {
    fn default() -> Self {
        Self {
            name: None,
            last_updated: None,
            records: Vec::new(),
        }
    }
}

impl<R: CardRecord> MetricCard<R> {
    pub fn with_records(records: Vec<R>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Explicit stamp, or the newest record date at midnight UTC.
    pub fn effective_last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated.or_else(|| {
            self.records
                .iter()
                .map(CardRecord::date)
                .max()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt))
        })
    }

    /// Appends another card's records; the later update stamp wins.
    pub fn merge(&mut self, other: MetricCard<R>) {
        if self.name.is_none() {
            self.name = other.name;
        }
        self.last_updated = match (self.last_updated, other.last_updated) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.records.extend(other.records);
    }
}

/// Windowing used to derive card summaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardWindow {
    /// Evaluation instant.
    pub as_of: DateTime<Utc>,
    /// Width of the "recent" and month-over-month windows, in days.
    pub recent_days: i64,
    /// Number of windows in the correlation series.
    pub series_windows: usize,
}

impl CardWindow {
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            recent_days: 30,
            series_windows: 6,
        }
    }

    /// Bounds `(start, end]` of the window `back` steps before `as_of`.
    /// `None` when the window leaves the calendar range.
    fn bounds(&self, back: i64) -> Option<(NaiveDate, NaiveDate)> {
        let width = u64::try_from(self.recent_days).ok()?;
        let steps = u64::try_from(back).ok()?;
        let end = self
            .as_of
            .date_naive()
            .checked_sub_days(Days::new(steps.checked_mul(width)?))?;
        let start = end.checked_sub_days(Days::new(width))?;
        Some((start, end))
    }

    /// Sum of values dated in `(as_of - (back+1)*w, as_of - back*w]`.
    fn window_total<R: CardRecord>(&self, records: &[R], back: i64) -> f64 {
        let Some((start, end)) = self.bounds(back) else {
            return 0.0;
        };
        records
            .iter()
            .filter(|r| r.date() > start && r.date() <= end)
            .map(CardRecord::value)
            .sum()
    }
}

/// Derived fields for one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSummary {
    pub kind: CardKind,
    pub name: String,
    pub total_records: usize,
    pub recent_records: usize,
    /// Totals and extremes over recent records.
    pub total_value: f64,
    pub average_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    /// Compliant share of all records, in percent.
    pub compliance_rate: f64,
    /// Month-over-month growth of value, in percent.
    pub growth_rate: f64,
    pub trend: TrendLabel,
    pub potential_conflicts: usize,
    pub data_quality: f64,
    pub freshness: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Value per window, oldest first.
    pub monthly_series: Vec<f64>,
}

impl CardSummary {
    pub fn has_records(&self) -> bool {
        self.total_records > 0
    }
}

/// Derives the summary for one card.
pub fn summarize<R: CardRecord>(
    kind: CardKind,
    card: &MetricCard<R>,
    window: &CardWindow,
) -> CardSummary {
    let recent: Vec<f64> = match window.bounds(0) {
        Some((start, end)) => card
            .records
            .iter()
            .filter(|r| r.date() > start && r.date() <= end)
            .map(CardRecord::value)
            .collect(),
        None => Vec::new(),
    };

    let total_value: f64 = recent.iter().sum();
    let (average_value, min_value, max_value) = if recent.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        (
            total_value / recent.len() as f64,
            recent.iter().copied().fold(f64::INFINITY, f64::min),
            recent.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        )
    };

    let total_records = card.records.len();
    let compliant = card.records.iter().filter(|r| r.is_compliant()).count();
    let compliance_rate = if total_records == 0 {
        0.0
    } else {
        compliant as f64 / total_records as f64 * 100.0
    };

    let current = window.window_total(&card.records, 0);
    let previous = window.window_total(&card.records, 1);
    let growth = growth_rate(current, previous);

    let monthly_series = (0..window.series_windows as i64)
        .rev()
        .map(|back| window.window_total(&card.records, back))
        .collect();

    let last_updated = card.effective_last_updated();
    let freshness = match last_updated {
        Some(stamp) => update_freshness(stamp, window.as_of),
        None => freshness_for_days(f64::INFINITY),
    };

    CardSummary {
        kind,
        name: card
            .name
            .clone()
            .unwrap_or_else(|| kind.default_name().to_string()),
        total_records,
        recent_records: recent.len(),
        total_value,
        average_value,
        min_value,
        max_value,
        compliance_rate,
        growth_rate: growth,
        trend: trend_label(growth, &kind.thresholds()),
        potential_conflicts: card
            .records
            .iter()
            .filter(|r| r.is_potential_conflict())
            .count(),
        data_quality: data_quality(recent.len(), total_records),
        freshness,
        last_updated,
        monthly_series,
    }
}

/// At most one card per kind, as supplied by the data-fetch layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardSet {
    #[serde(default)]
    pub trading: Option<MetricCard<TradeRecord>>,
    #[serde(default)]
    pub contracts: Option<MetricCard<ContractRecord>>,
    #[serde(default)]
    pub lobbying: Option<MetricCard<LobbyingRecord>>,
    #[serde(default)]
    pub patents: Option<MetricCard<PatentRecord>>,
    #[serde(default)]
    pub sentiment: Option<MetricCard<SentimentRecord>>,
}

fn merge_card<R: CardRecord>(slot: &mut Option<MetricCard<R>>, other: Option<MetricCard<R>>) {
    match (slot.as_mut(), other) {
        (Some(existing), Some(other)) => existing.merge(other),
        (None, Some(other)) => *slot = Some(other),
        (_, None) => {}
    }
}

impl CardSet {
    /// Number of cards supplied, with or without records.
    pub fn len(&self) -> usize {
        [
            self.trading.is_some(),
            self.contracts.is_some(),
            self.lobbying.is_some(),
            self.patents.is_some(),
            self.sentiment.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Folds another set in, kind by kind.
    pub fn merge(&mut self, other: CardSet) {
        merge_card(&mut self.trading, other.trading);
        merge_card(&mut self.contracts, other.contracts);
        merge_card(&mut self.lobbying, other.lobbying);
        merge_card(&mut self.patents, other.patents);
        merge_card(&mut self.sentiment, other.sentiment);
    }

    /// Summaries of every supplied card, in [`CardKind::ALL`] order.
    pub fn summaries(&self, window: &CardWindow) -> Vec<CardSummary> {
        let mut summaries = Vec::with_capacity(self.len());

        if let Some(card) = &self.trading {
            summaries.push(summarize(CardKind::Trading, card, window));
        }
        if let Some(card) = &self.contracts {
            summaries.push(summarize(CardKind::Contracts, card, window));
        }
        if let Some(card) = &self.lobbying {
            summaries.push(summarize(CardKind::Lobbying, card, window));
        }
        if let Some(card) = &self.patents {
            summaries.push(summarize(CardKind::Patents, card, window));
        }
        if let Some(card) = &self.sentiment {
            summaries.push(summarize(CardKind::Sentiment, card, window));
        }

        summaries
    }
}
