use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use stockagent_core::agent::StockAgent;
use stockagent_core::config::Settings;
use stockagent_core::domain::OutcomeRecord;
use stockagent_core::portfolio::{self, Holding, SectorGroup};
use stockagent_core::{export, report, screen};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SYMBOLS: [&str; 5] = ["AAPL", "GOOGL", "TSLA", "MSFT", "AMZN"];
const DEFAULT_HOLDINGS: [&str; 4] = ["AAPL:50@150", "GOOGL:20@2500", "TSLA:30@800", "MSFT:40@300"];
const DEFAULT_SECTORS: [&str; 4] = [
    "Technology=AAPL,MSFT,NVDA",
    "Finance=JPM,BAC,GS",
    "Healthcare=JNJ,PFE,UNH",
    "Energy=XOM,CVX,COP",
];

#[derive(Debug, Parser)]
#[command(name = "stockagent", about = "AI-assisted stock analysis")]
struct Args {
    /// Overrides the API key of the configured LLM provider.
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Full report per symbol.
    Analyze { symbols: Vec<String> },
    /// Prompt for symbols until quit/exit/q.
    Interactive,
    /// One line per symbol.
    Quick { symbols: Vec<String> },
    /// Analyze, then write successful results to a timestamped JSON file.
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        symbols: Vec<String>,
    },
    /// Analyze, then filter.
    Screen {
        #[arg(value_enum)]
        kind: ScreenKind,
        symbols: Vec<String>,
    },
    /// Value holdings (SYMBOL:SHARES@BUY_PRICE) at analyzed prices.
    Portfolio { holdings: Vec<Holding> },
    /// Compare groups (NAME=SYM1,SYM2) by average change and BUY count.
    Sectors { groups: Vec<SectorGroup> },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScreenKind {
    Momentum,
    Value,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut settings = Settings::from_env()?;
    if let Some(key) = args.api_key.clone() {
        settings = settings.with_api_key(key);
    }
    let _sentry_guard = init_sentry(&settings);

    // Reports own stdout.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let agent = match StockAgent::from_settings(&settings) {
        Ok(agent) => agent,
        Err(err) => {
            let err = anyhow::Error::new(err).context("agent setup failed");
            sentry_anyhow::capture_anyhow(&err);
            return Err(err);
        }
    };

    match args.command {
        Command::Analyze { symbols } => {
            for outcome in agent.analyze_many(&symbols_or_default(symbols)).await {
                println!("{}", report::render_report(&outcome));
            }
        }
        Command::Interactive => interactive(&agent).await?,
        Command::Quick { symbols } => {
            for outcome in agent.analyze_many(&symbols_or_default(symbols)).await {
                println!("{}", report::quick_summary(&outcome));
            }
        }
        Command::Export { dir, symbols } => {
            let outcomes = agent.analyze_many(&symbols_or_default(symbols)).await;
            let now = chrono::Local::now().fixed_offset();
            let path = export::export_outcomes(&outcomes, &dir, now)
                .with_context(|| format!("export to {} failed", dir.display()))?;
            tracing::info!(path = %path.display(), analyzed = outcomes.len(), "export written");
            println!("Results exported to {}", path.display());
        }
        Command::Screen { kind, symbols } => {
            let outcomes = agent.analyze_many(&symbols_or_default(symbols)).await;
            print_screen(kind, &outcomes);
        }
        Command::Portfolio { holdings } => {
            let holdings = if holdings.is_empty() {
                parse_defaults(&DEFAULT_HOLDINGS)?
            } else {
                holdings
            };
            let symbols: Vec<&str> = holdings.iter().map(|h| h.symbol.as_str()).collect();
            let outcomes = agent.analyze_many(&symbols).await;
            print_portfolio(&portfolio::portfolio_summary(&holdings, &outcomes));
        }
        Command::Sectors { groups } => {
            let groups = if groups.is_empty() {
                parse_defaults(&DEFAULT_SECTORS)?
            } else {
                groups
            };
            println!("\n{}\n📊 SECTOR PERFORMANCE COMPARISON\n{}", "=".repeat(60), "=".repeat(60));
            for group in &groups {
                tracing::info!(sector = %group.name, symbols = group.symbols.len(), "analyzing sector");
                let outcomes = agent.analyze_many(&group.symbols).await;
                print_sector(&portfolio::sector_summary(&group.name, &outcomes));
            }
        }
    }

    Ok(())
}

fn parse_defaults<T>(items: &[&str]) -> anyhow::Result<Vec<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    items
        .iter()
        .map(|s| s.parse::<T>().map_err(anyhow::Error::new))
        .collect()
}

fn symbols_or_default(symbols: Vec<String>) -> Vec<String> {
    if symbols.is_empty() {
        DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
    } else {
        symbols
    }
}

async fn interactive(agent: &StockAgent) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nEnter stock symbol (or 'quit' to exit): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match prompt_input(&line) {
            PromptInput::Empty => println!("❌ Please enter a valid stock symbol"),
            PromptInput::Quit => break,
            PromptInput::Symbol(symbol) => {
                let outcome = agent.analyze_symbol(symbol).await;
                println!("{}", report::render_report(&outcome));
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

#[derive(Debug, PartialEq)]
enum PromptInput<'a> {
    Empty,
    Quit,
    Symbol(&'a str),
}

fn prompt_input(line: &str) -> PromptInput<'_> {
    let input = line.trim();
    if input.is_empty() {
        PromptInput::Empty
    } else if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q") {
        PromptInput::Quit
    } else {
        PromptInput::Symbol(input)
    }
}

fn print_screen(kind: ScreenKind, outcomes: &[OutcomeRecord]) {
    match kind {
        ScreenKind::Momentum => {
            let picks = screen::momentum_screen(outcomes);
            println!("🚀 Momentum screen: {} of {} symbols", picks.len(), outcomes.len());
            for p in picks {
                println!(
                    "  {} ({}) ${:.2} | week {:+.2}% | month {:+.2}% | volume x{:.2} | {} {}",
                    p.symbol,
                    p.company,
                    p.price,
                    p.week_change,
                    p.month_change,
                    p.volume_ratio,
                    p.recommendation.emoji(),
                    p.recommendation
                );
            }
        }
        ScreenKind::Value => {
            let picks = screen::value_screen(outcomes);
            println!("💎 Value screen: {} of {} symbols", picks.len(), outcomes.len());
            for p in picks {
                println!(
                    "  {} ({}) ${:.2} | P/E {:.2} | fwd P/E {:.2} | yield {:.2}% | beta {:.2} | {} {}",
                    p.symbol,
                    p.company,
                    p.price,
                    p.pe_ratio,
                    p.forward_pe,
                    p.dividend_yield_pct,
                    p.beta,
                    p.recommendation.emoji(),
                    p.recommendation
                );
            }
        }
    }
}

fn print_portfolio(summary: &portfolio::PortfolioSummary) {
    let heavy = "=".repeat(60);
    println!("\n{heavy}\n📈 PORTFOLIO SUMMARY\n{heavy}");
    for p in &summary.positions {
        let emoji = if p.gain_loss > 0.0 { "🟢" } else { "🔴" };
        let confidence = p.confidence.map(|c| c.as_str()).unwrap_or("N/A");
        println!("\n{}:", p.symbol);
        println!("  Holdings: {} shares", p.shares);
        println!("  Buy Price: ${:.2} → Current: ${:.2}", p.buy_price, p.current_price);
        println!("  Position Value: ${:.2}", p.current_value);
        println!("  {emoji} P/L: ${:.2} ({:+.2}%)", p.gain_loss, p.gain_loss_pct);
        println!("  📊 Recommendation: {} (Confidence: {confidence})", p.recommendation);
    }

    let emoji = if summary.total_gain_loss > 0.0 { "🟢" } else { "🔴" };
    println!("\n{}", "-".repeat(60));
    println!("💼 Total Portfolio Value: ${:.2}", summary.total_current_value);
    println!("💰 Total Initial Investment: ${:.2}", summary.total_initial_value);
    println!(
        "{emoji} Total P/L: ${:.2} ({:+.2}%)",
        summary.total_gain_loss, summary.total_gain_loss_pct
    );
    println!("{heavy}");
}

fn print_sector(s: &portfolio::SectorSummary) {
    println!("\n{} Sector:", s.sector);
    println!("  Average Week Change: {:+.2}%", s.avg_week_change);
    println!("  Average Month Change: {:+.2}%", s.avg_month_change);
    println!("  Buy Recommendations: {}/{}", s.buy_count, s.members.len());
    println!("\n  Individual Stocks:");
    for m in &s.members {
        println!(
            "    {}: ${:.2} | Week: {:+.2}% | Rec: {}",
            m.symbol, m.price, m.week_change, m.recommendation
        );
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_input_classifies_lines() {
        assert_eq!(prompt_input("   "), PromptInput::Empty);
        assert_eq!(prompt_input(""), PromptInput::Empty);
        for quit in ["quit", "EXIT", " q "] {
            assert_eq!(prompt_input(quit), PromptInput::Quit);
        }
        assert_eq!(prompt_input(" tsla \n"), PromptInput::Symbol("tsla"));
    }

    #[test]
    fn default_portfolio_and_sectors_parse() {
        let holdings: Vec<Holding> = parse_defaults(&DEFAULT_HOLDINGS).unwrap();
        assert_eq!(holdings[1].symbol, "GOOGL");
        assert_eq!(holdings[1].buy_price, 2500.0);

        let groups: Vec<SectorGroup> = parse_defaults(&DEFAULT_SECTORS).unwrap();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[3].symbols, ["XOM", "CVX", "COP"]);
    }

    #[test]
    fn cli_accepts_portfolio_and_sector_arguments() {
        let args = Args::try_parse_from(["stockagent", "portfolio", "AAPL:10@100"]).unwrap();
        assert!(matches!(args.command, Command::Portfolio { holdings } if holdings.len() == 1));

        let args = Args::try_parse_from(["stockagent", "sectors", "Tech=AAPL,MSFT"]).unwrap();
        assert!(matches!(args.command, Command::Sectors { groups } if groups[0].symbols.len() == 2));

        assert!(Args::try_parse_from(["stockagent", "portfolio", "AAPL"]).is_err());
    }
}
