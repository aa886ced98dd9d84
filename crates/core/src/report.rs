use crate::domain::{AnalysisSuccess, OutcomeRecord};
use chrono::SecondsFormat;
use std::fmt::{self, Write};

const RULE_WIDTH: usize = 60;

/// Multi-section text report. Failures collapse to a single line.
pub fn render_report(outcome: &OutcomeRecord) -> String {
    match outcome {
        OutcomeRecord::Success(s) => {
            let mut out = String::new();
            // Writing into a String never fails.
            let _ = write_report(&mut out, s);
            out
        }
        OutcomeRecord::Failure(f) => format!("❌ Analysis failed: {}", f.error),
    }
}

fn write_report(out: &mut String, s: &AnalysisSuccess) -> fmt::Result {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let rec = s.analysis.recommendation;
    let confidence = s.analysis.confidence.map(|c| c.as_str()).unwrap_or("N/A");

    writeln!(out)?;
    writeln!(out, "{heavy}\n📊 STOCK ANALYSIS REPORT\n{heavy}\n")?;
    writeln!(out, "🏢 Company: {} ({})", s.company_name, s.symbol)?;
    writeln!(out, "💵 Current Price: ${:?}\n", s.current_price)?;
    writeln!(out, "{} RECOMMENDATION: {rec}", rec.emoji())?;
    writeln!(out, "📊 Confidence Level: {confidence}\n")?;
    writeln!(out, "🔑 Key Factors:")?;
    for factor in &s.analysis.key_factors {
        writeln!(out, "  • {factor}")?;
    }
    writeln!(out, "\n📝 Detailed Analysis:\n{light}")?;
    writeln!(out, "{}\n{light}\n", s.analysis.analysis)?;
    writeln!(
        out,
        "⏰ Analysis Timestamp: {}",
        s.stock_data.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;
    writeln!(out, "{heavy}")
}

/// One line per symbol: `AAPL: 🟢 BUY @ $189.5`.
pub fn quick_summary(outcome: &OutcomeRecord) -> String {
    match outcome {
        OutcomeRecord::Success(s) => format!(
            "{}: {} {} @ ${:?}",
            s.symbol,
            s.analysis.recommendation.emoji(),
            s.analysis.recommendation,
            s.current_price
        ),
        OutcomeRecord::Failure(f) => format!("{}: ❌ Error analyzing stock", f.symbol),
    }
}
