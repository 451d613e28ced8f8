use std::env;

use healthdialog_core::config::Config;
use healthdialog_server::{from_settings, init_tracing};

const USAGE: &str = "Usage: healthdialog-ask [--json] <question...>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().skip(1).collect();
    let mut json = false; let mut words = Vec::new();
    for arg in &args { match arg.as_str() {
        "--json" | "-j" => json = true,
        "--help" | "-h" => { println!("{USAGE}"); return Ok(()); }
        _ => words.push(arg.as_str()),
    } }
    let query = words.join(" ");
    if query.trim().is_empty() { eprintln!("{USAGE}"); std::process::exit(2); }

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let assembler = from_settings(&config.settings()?)?;
    let result = assembler.answer(query.trim()).await;

    if json { println!("{}", serde_json::to_string_pretty(&result)?); return Ok(()); }
    println!("{}\n", result.answer);
    match (result.confidence, result.hallucination_risk) {
        (Some(c), Some(r)) => println!("Confidence: {:.3} (hallucination risk: {})", c, r),
        _ => println!("Confidence: unavailable"),
    }
    if result.fallback_used == Some(true) { println!("Synthesis unavailable, showing the closest FAQ answer"); }
    if let Some(err) = &result.error { println!("Error: {}", err); }
    for (i, s) in result.sources.iter().enumerate() { println!("  [{}] {}", i + 1, s.title); }
    Ok(())
}
