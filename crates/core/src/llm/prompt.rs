use crate::domain::MetricsRecord;

pub const SYSTEM_PROMPT: &str = "You are an expert stock analyst. Provide detailed investment recommendations based on stock data. Always provide a clear BUY, HOLD, or SELL recommendation with detailed reasoning.";

/// Decimals print the shortest round-trip form with at least one fractional digit (`110.0`).
pub fn analysis_prompt(m: &MetricsRecord) -> String {
    format!(
        "Analyze the following stock data for {name} ({symbol}) and provide an investment recommendation:

Current Price: ${current:?}
Previous Close: ${previous:?}

Price Movement:
- 1 Week Change: {week:?}%
- 1 Month Change: {month:?}%
- 52 Week Range: ${low:?} - ${high:?}

Valuation Metrics:
- P/E Ratio: {pe:?}
- Forward P/E: {fpe:?}
- EPS: ${eps:?}

Trading Activity:
- Volume: {volume}
- Average Volume: {avg_volume}
- Market Cap: ${market_cap}

Other Metrics:
- Beta: {beta:?}
- Dividend Yield: {dividend:?}%
- Sector: {sector}
- Industry: {industry}
- Current Analyst Rating: {rating} (Score: {score:?})

Please provide:
1. A clear BUY, HOLD, or SELL recommendation
2. Key reasons supporting your recommendation
3. Risk factors to consider
4. Price targets or entry/exit points if applicable
5. Overall market sentiment and technical analysis

Format your response as a comprehensive paragraph that flows naturally.
",
        name = m.company_name,
        symbol = m.symbol,
        current = m.current_price,
        previous = m.previous_close,
        week = m.week_change,
        month = m.month_change,
        low = m.week_52_low,
        high = m.week_52_high,
        pe = m.pe_ratio,
        fpe = m.forward_pe,
        eps = m.earnings_per_share,
        volume = group_thousands(m.volume),
        avg_volume = group_thousands(m.avg_volume),
        market_cap = group_thousands(m.market_cap),
        beta = m.beta,
        dividend = m.dividend_yield,
        sector = m.sector,
        industry = m.industry,
        rating = m.recommendation,
        score = m.analyst_rating,
    )
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::sample_metrics;

    #[test]
    fn groups_digits() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(52_345_678), "52,345,678");
    }

    #[test]
    fn whole_numbers_keep_a_decimal() {
        let mut m = sample_metrics();
        m.current_price = 110.0;
        m.pe_ratio = 0.0;
        let p = analysis_prompt(&m);
        assert!(p.contains("Current Price: $110.0\n"));
        assert!(p.contains("- P/E Ratio: 0.0\n"));
    }

    #[test]
    fn prompt_embeds_every_section_and_field() {
        let p = analysis_prompt(&sample_metrics());
        for needle in [
            "Apple Inc. (AAPL)",
            "Current Price: $189.5",
            "Previous Close: $187.25",
            "Price Movement:",
            "- 1 Week Change: 1.25%",
            "- 1 Month Change: -3.4%",
            "- 52 Week Range: $180.17 - $199.62",
            "Valuation Metrics:",
            "- P/E Ratio: 29.4",
            "- Forward P/E: 26.1",
            "- EPS: $6.43",
            "Trading Activity:",
            "- Volume: 52,345,678",
            "- Average Volume: 48,000,000",
            "- Market Cap: $2,950,000,000,000",
            "Other Metrics:",
            "- Beta: 1.28",
            "- Dividend Yield: 0.0051%",
            "- Sector: Technology",
            "- Industry: Consumer Electronics",
            "- Current Analyst Rating: buy (Score: 2.1)",
            "1. A clear BUY, HOLD, or SELL recommendation",
            "comprehensive paragraph",
        ] {
            assert!(p.contains(needle), "missing {needle:?} in prompt");
        }
    }
}
