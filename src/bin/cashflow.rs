use payroll_cashflow_agent::{
    analytics::{analyze_values, project_values},
    config::AppConfig,
    telemetry::init_tracing,
    AgentError,
};
use serde_json::Value;
use tracing::info;

const USAGE: &str = "usage: cashflow <transactions.json> [days] [--weighted]";

struct Args {
    path: String,
    days: i64,
    weighted: bool,
}

fn parse_args() -> Result<Args, AgentError> {
    let mut path = None;
    let mut days = 0;
    let mut weighted = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--weighted" => weighted = true,
            "-h" | "--help" => return Err(AgentError::InvalidInput(USAGE.to_string())),
            _ if path.is_none() => path = Some(arg),
            _ => {
                days = arg
                    .parse()
                    .map_err(|_| AgentError::InvalidInput(format!("days must be an integer, got '{}'", arg)))?;
            }
        }
    }

    let path = path.ok_or_else(|| AgentError::InvalidInput(USAGE.to_string()))?;
    Ok(Args { path, days, weighted })
}

/// Accepts either a bare array or an object with a `transactions` array.
fn transactions_from(document: Value) -> Result<Vec<Value>, AgentError> {
    match document {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("transactions") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(AgentError::InvalidInput(
                "expected a 'transactions' array".to_string(),
            )),
        },
        _ => Err(AgentError::InvalidInput(
            "expected a JSON array of transactions".to_string(),
        )),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing(&config.log_level);

    let args = parse_args()?;
    let raw = std::fs::read_to_string(&args.path)?;
    let transactions = transactions_from(serde_json::from_str(&raw)?)?;

    info!(path = %args.path, records = transactions.len(), "Loaded transactions");

    let report = analyze_values(transactions.clone(), args.days);
    println!("{}", serde_json::to_string_pretty(&report)?);

    let projection = project_values(transactions, args.weighted, args.days);
    println!("{}", serde_json::to_string_pretty(&projection)?);

    if let Some(error) = report.error_message() {
        return Err(AgentError::InvalidInput(error.to_string()).into());
    }
    Ok(())
}
