//! Seeded demo snapshots.
//!
//! Generates a realistic-looking snapshot from an explicitly passed seed so
//! that demo runs and test fixtures are reproducible.

use crate::analysis::cards::{
    CardSet, ContractRecord, LobbyingRecord, MetricCard, PatentRecord, SentimentRecord,
    TradeRecord, Transaction,
};
use crate::input::{Snapshot, SubjectInput};
use crate::scoring::FactorSet;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SYMBOLS: [&str; 6] = ["AAPL", "MSFT", "NVDA", "JPM", "XOM", "KO"];
const OFFICIALS: [&str; 4] = [
    "Sen. A. Rivera",
    "Rep. J. Okafor",
    "Sen. M. Lindqvist",
    "Rep. D. Haddad",
];
const AGENCIES: [&str; 4] = ["DOD", "NASA", "HHS", "DOE"];
const REGISTRANTS: [&str; 3] = ["K Street Partners", "Capitol Advisors", "Beacon Group"];

/// Number of days of history generated for every card.
const HISTORY_DAYS: i64 = 180;

/// Builds a full demo snapshot anchored at `as_of`.
pub fn generate(seed: u64, as_of: DateTime<Utc>) -> Snapshot {
    let mut rng = StdRng::seed_from_u64(seed);
    let today = as_of.date_naive();

    let subjects = SYMBOLS
        .iter()
        .map(|symbol| subject(&mut rng, symbol))
        .collect();

    let cards = CardSet {
        trading: Some(named("Congressional Trading", trades(&mut rng, today))),
        contracts: Some(named("Government Contracts", contracts(&mut rng, today))),
        lobbying: Some(named("Lobbying", lobbying(&mut rng, today))),
        patents: Some(named("Patents", patents(&mut rng, today))),
        sentiment: Some(named("Market Sentiment", sentiment(&mut rng, today))),
    };

    Snapshot {
        as_of: Some(as_of),
        subjects,
        cards,
    }
}

fn named<R>(name: &str, records: Vec<R>) -> MetricCard<R> {
    MetricCard {
        name: Some(name.to_string()),
        last_updated: None,
        records,
    }
}

fn subject(rng: &mut StdRng, symbol: &str) -> SubjectInput {
    let growth = (1..=4)
        .map(|q| (format!("Q{q} Revenue Growth"), rng.gen_range(-0.05..0.25)))
        .collect::<FactorSet>();

    let mut risk = (1..=3)
        .map(|y| (format!("Year {y} Debt/Equity"), rng.gen_range(0.1..2.5)))
        .collect::<FactorSet>();
    risk.insert("Beta", rng.gen_range(0.6..1.8));

    let profitability = FactorSet::new()
        .with("Profit Margin", rng.gen_range(0.02..0.35))
        .with("Operating Margin", rng.gen_range(0.05..0.45))
        .with("Dividend Yield", rng.gen_range(0.0..0.05))
        .with("EBITDA/Sales", rng.gen_range(0.1..0.5));

    let valuation = FactorSet::new()
        .with("Year 1 P/E", rng.gen_range(8.0..45.0))
        .with("PEG", rng.gen_range(0.5..3.5))
        .with("P/B", rng.gen_range(1.0..12.0))
        .with("EV/Revenue", rng.gen_range(1.0..15.0))
        .with("EPS", rng.gen_range(0.5..12.0))
        .with("Market Cap Relative", rng.gen_range(0.2..1.8));

    SubjectInput {
        symbol: symbol.to_string(),
        requester: "demo".to_string(),
        growth,
        risk,
        profitability,
        valuation,
    }
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

fn past_day(rng: &mut StdRng, today: NaiveDate) -> NaiveDate {
    today - Duration::days(rng.gen_range(0..HISTORY_DAYS))
}

fn trades(rng: &mut StdRng, today: NaiveDate) -> Vec<TradeRecord> {
    (0..rng.gen_range(40..80))
        .map(|_| {
            let traded_on = past_day(rng, today);
            let lag = rng.gen_range(5..70);
            let disclosed = traded_on + Duration::days(lag);
            TradeRecord {
                official: pick(rng, &OFFICIALS).to_string(),
                ticker: pick(rng, &SYMBOLS).to_string(),
                transaction: if rng.gen_bool(0.55) {
                    Transaction::Purchase
                } else {
                    Transaction::Sale
                },
                amount: f64::from(rng.gen_range(1..=50u32)) * 5_000.0,
                traded_on,
                disclosed_on: (disclosed <= today).then_some(disclosed),
                potential_conflict: rng.gen_bool(0.15),
            }
        })
        .collect()
}

fn contracts(rng: &mut StdRng, today: NaiveDate) -> Vec<ContractRecord> {
    (0..rng.gen_range(20..50))
        .map(|_| ContractRecord {
            agency: pick(rng, &AGENCIES).to_string(),
            recipient: pick(rng, &SYMBOLS).to_string(),
            amount: rng.gen_range(50_000.0..25_000_000.0),
            awarded_on: past_day(rng, today),
            compliant: rng.gen_bool(0.9),
        })
        .collect()
}

fn lobbying(rng: &mut StdRng, today: NaiveDate) -> Vec<LobbyingRecord> {
    (0..rng.gen_range(15..40))
        .map(|_| LobbyingRecord {
            client: pick(rng, &SYMBOLS).to_string(),
            registrant: pick(rng, &REGISTRANTS).to_string(),
            amount: rng.gen_range(10_000.0..500_000.0),
            filed_on: past_day(rng, today),
            on_time: rng.gen_bool(0.85),
        })
        .collect()
}

fn patents(rng: &mut StdRng, today: NaiveDate) -> Vec<PatentRecord> {
    (0..rng.gen_range(10..30))
        .map(|i| PatentRecord {
            assignee: pick(rng, &SYMBOLS).to_string(),
            title: format!("Method and apparatus #{}", i + 1),
            granted_on: past_day(rng, today),
            claims: rng.gen_range(3..40),
            citations: rng.gen_range(0..12),
        })
        .collect()
}

fn sentiment(rng: &mut StdRng, today: NaiveDate) -> Vec<SentimentRecord> {
    (0..rng.gen_range(30..90))
        .map(|_| SentimentRecord {
            ticker: pick(rng, &SYMBOLS).to_string(),
            score: rng.gen_range(-1.0..1.0),
            mentions: rng.gen_range(10..5_000),
            observed_on: past_day(rng, today),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_same_seed_same_snapshot() {
        assert_eq!(generate(42, as_of()), generate(42, as_of()));
    }

    #[test]
    fn test_different_seed_different_snapshot() {
        assert_ne!(generate(1, as_of()), generate(2, as_of()));
    }

    #[test]
    fn test_snapshot_is_complete() {
        let snapshot = generate(7, as_of());
        assert_eq!(snapshot.subjects.len(), SYMBOLS.len());
        assert_eq!(snapshot.cards.len(), 5);

        let trading = snapshot.cards.trading.as_ref().unwrap();
        assert!(trading.records.iter().all(|t| t.traded_on <= as_of().date_naive()));
        assert!(trading
            .records
            .iter()
            .filter_map(|t| t.disclosed_on)
            .all(|d| d <= as_of().date_naive()));
    }
}
