//! Position and sector roll-ups over finished outcomes.

use crate::domain::{Confidence, OutcomeRecord, Recommendation};
use crate::error::ParseInputError;
use serde::Serialize;
use std::str::FromStr;

/// A held position: `AAPL:50@150` on the command line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    pub symbol: String,
    pub shares: f64,
    pub buy_price: f64,
}

impl FromStr for Holding {
    type Err = ParseInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseInputError::Holding(s.to_string());
        let (symbol, rest) = s.split_once(':').ok_or_else(invalid)?;
        let (shares, buy_price) = rest.split_once('@').ok_or_else(invalid)?;

        let symbol = symbol.trim().to_uppercase();
        let shares: f64 = shares.trim().parse().map_err(|_| invalid())?;
        let buy_price: f64 = buy_price.trim().parse().map_err(|_| invalid())?;
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if symbol.is_empty() || !valid(shares) || !valid(buy_price) {
            return Err(invalid());
        }

        Ok(Self {
            symbol,
            shares,
            buy_price,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub symbol: String,
    pub shares: f64,
    pub buy_price: f64,
    pub current_price: f64,
    pub current_value: f64,
    pub gain_loss: f64,
    pub gain_loss_pct: f64,
    pub recommendation: Recommendation,
    pub confidence: Option<Confidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub positions: Vec<PositionSummary>,
    pub total_current_value: f64,
    pub total_initial_value: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_pct: f64,
}

/// Values each holding at its analyzed price. Holdings whose symbol has no successful
/// outcome are left out of the positions and the totals.
pub fn portfolio_summary(holdings: &[Holding], outcomes: &[OutcomeRecord]) -> PortfolioSummary {
    let positions: Vec<PositionSummary> = holdings
        .iter()
        .filter_map(|h| {
            let s = outcomes
                .iter()
                .filter_map(OutcomeRecord::as_success)
                .find(|s| s.symbol.eq_ignore_ascii_case(&h.symbol))?;

            let current_value = s.current_price * h.shares;
            let initial_value = h.buy_price * h.shares;
            let gain_loss = current_value - initial_value;
            Some(PositionSummary {
                symbol: s.symbol.clone(),
                shares: h.shares,
                buy_price: h.buy_price,
                current_price: s.current_price,
                current_value,
                gain_loss,
                gain_loss_pct: ratio_pct(gain_loss, initial_value),
                recommendation: s.analysis.recommendation,
                confidence: s.analysis.confidence,
            })
        })
        .collect();

    let total_current_value: f64 = positions.iter().map(|p| p.current_value).sum();
    let total_initial_value: f64 = positions.iter().map(|p| p.buy_price * p.shares).sum();
    let total_gain_loss = total_current_value - total_initial_value;

    PortfolioSummary {
        positions,
        total_current_value,
        total_initial_value,
        total_gain_loss,
        total_gain_loss_pct: ratio_pct(total_gain_loss, total_initial_value),
    }
}

/// Named symbol list: `Technology=AAPL,MSFT,NVDA`.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorGroup {
    pub name: String,
    pub symbols: Vec<String>,
}

impl FromStr for SectorGroup {
    type Err = ParseInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, symbols) = s
            .split_once('=')
            .ok_or_else(|| ParseInputError::SectorGroup(s.to_string()))?;
        let name = name.trim().to_string();
        let symbols: Vec<String> = symbols
            .split(',')
            .map(|sym| sym.trim().to_uppercase())
            .filter(|sym| !sym.is_empty())
            .collect();
        if name.is_empty() || symbols.is_empty() {
            return Err(ParseInputError::SectorGroup(s.to_string()));
        }
        Ok(Self { name, symbols })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorMember {
    pub symbol: String,
    pub price: f64,
    pub week_change: f64,
    pub month_change: f64,
    pub pe_ratio: f64,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorSummary {
    pub sector: String,
    pub avg_week_change: f64,
    pub avg_month_change: f64,
    pub buy_count: usize,
    /// Successful outcomes only; failed symbols are not counted.
    pub members: Vec<SectorMember>,
}

/// Averages over the group's successful outcomes; zero when none succeeded.
pub fn sector_summary(sector: &str, outcomes: &[OutcomeRecord]) -> SectorSummary {
    let members: Vec<SectorMember> = outcomes
        .iter()
        .filter_map(OutcomeRecord::as_success)
        .map(|s| SectorMember {
            symbol: s.symbol.clone(),
            price: s.current_price,
            week_change: s.stock_data.week_change,
            month_change: s.stock_data.month_change,
            pe_ratio: s.stock_data.pe_ratio,
            recommendation: s.analysis.recommendation,
        })
        .collect();

    let mean = |f: fn(&SectorMember) -> f64| {
        if members.is_empty() {
            0.0
        } else {
            members.iter().map(f).sum::<f64>() / members.len() as f64
        }
    };
    let avg_week_change = mean(|m| m.week_change);
    let avg_month_change = mean(|m| m.month_change);
    let buy_count = members
        .iter()
        .filter(|m| m.recommendation == Recommendation::Buy)
        .count();

    SectorSummary {
        sector: sector.to_string(),
        avg_week_change,
        avg_month_change,
        buy_count,
        members,
    }
}

fn ratio_pct(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::sample_metrics;
    use crate::domain::{AnalysisFailure, AnalysisResult, AnalysisSuccess, FailureStage};

    fn success(symbol: &str, price: f64, rec: Recommendation, week: f64, month: f64) -> OutcomeRecord {
        let mut m = sample_metrics();
        m.symbol = symbol.to_string();
        m.current_price = price;
        m.week_change = week;
        m.month_change = month;
        OutcomeRecord::Success(AnalysisSuccess {
            symbol: symbol.to_string(),
            company_name: format!("{symbol} Inc."),
            current_price: price,
            analysis: AnalysisResult {
                recommendation: rec,
                confidence: Some(Confidence::Medium),
                analysis: String::new(),
                key_factors: Vec::new(),
            },
            stock_data: m,
        })
    }

    fn failure(symbol: &str) -> OutcomeRecord {
        OutcomeRecord::Failure(AnalysisFailure {
            symbol: symbol.to_string(),
            stage: FailureStage::FetchData,
            error: "No data available for this symbol".to_string(),
            message: String::new(),
            stock_data: None,
            analysis: None,
        })
    }

    #[test]
    fn parses_holdings() {
        let h: Holding = " aapl : 50 @ 150.25".parse().unwrap();
        assert_eq!(
            h,
            Holding {
                symbol: "AAPL".to_string(),
                shares: 50.0,
                buy_price: 150.25
            }
        );
        for bad in ["AAPL", "AAPL:50", ":50@1", "AAPL:x@1", "AAPL:-1@10"] {
            assert!(bad.parse::<Holding>().is_err(), "{bad:?}");
        }
    }

    #[test]
    fn portfolio_values_positions_and_totals() {
        let holdings = vec![
            "AAPL:50@150".parse().unwrap(),
            "TSLA:30@800".parse().unwrap(),
            "GONE:10@5".parse().unwrap(),
        ];
        let outcomes = vec![
            success("AAPL", 180.0, Recommendation::Buy, 0.0, 0.0),
            success("TSLA", 200.0, Recommendation::Sell, 0.0, 0.0),
            failure("GONE"),
        ];

        let summary = portfolio_summary(&holdings, &outcomes);
        assert_eq!(summary.positions.len(), 2);

        let aapl = &summary.positions[0];
        assert_eq!(aapl.current_value, 9_000.0);
        assert_eq!(aapl.gain_loss, 1_500.0);
        assert!((aapl.gain_loss_pct - 20.0).abs() < 1e-9);
        assert_eq!(aapl.recommendation, Recommendation::Buy);

        let tsla = &summary.positions[1];
        assert_eq!(tsla.gain_loss, -18_000.0);
        assert!((tsla.gain_loss_pct + 75.0).abs() < 1e-9);

        assert_eq!(summary.total_current_value, 15_000.0);
        assert_eq!(summary.total_initial_value, 31_500.0);
        assert_eq!(summary.total_gain_loss, -16_500.0);
    }

    #[test]
    fn zero_cost_basis_has_zero_percent() {
        let holdings = vec!["AAPL:10@0".parse().unwrap()];
        let outcomes = vec![success("AAPL", 100.0, Recommendation::Hold, 0.0, 0.0)];

        let summary = portfolio_summary(&holdings, &outcomes);
        assert_eq!(summary.positions[0].gain_loss_pct, 0.0);
        assert_eq!(summary.total_gain_loss_pct, 0.0);
    }

    #[test]
    fn parses_sector_groups() {
        let g: SectorGroup = "Finance = jpm, BAC,,gs".parse().unwrap();
        assert_eq!(g.name, "Finance");
        assert_eq!(g.symbols, ["JPM", "BAC", "GS"]);
        assert!("Finance".parse::<SectorGroup>().is_err());
        assert!("Finance=".parse::<SectorGroup>().is_err());
    }

    #[test]
    fn sector_averages_and_buy_count_skip_failures() {
        let outcomes = vec![
            success("XOM", 110.0, Recommendation::Buy, 2.0, 4.0),
            failure("CVX"),
            success("COP", 100.0, Recommendation::Hold, -1.0, 1.0),
        ];

        let s = sector_summary("Energy", &outcomes);
        assert_eq!(s.sector, "Energy");
        assert_eq!(s.members.len(), 2);
        assert_eq!(s.buy_count, 1);
        assert!((s.avg_week_change - 0.5).abs() < 1e-9);
        assert!((s.avg_month_change - 2.5).abs() < 1e-9);
    }

    #[test]
    fn empty_sector_averages_to_zero() {
        let s = sector_summary("Healthcare", &[failure("JNJ")]);
        assert!(s.members.is_empty());
        assert_eq!(s.avg_week_change, 0.0);
        assert_eq!(s.avg_month_change, 0.0);
        assert_eq!(s.buy_count, 0);
    }
}
