//! laundering-detector CLI
//!
//! Run batch detection from the command line, or serve the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Detect over a CSV file, text summary to stdout
//! laundering-detector detect --input transactions.csv
//!
//! # Full JSON result, enhanced mode, aggressive preset
//! laundering-detector detect --input transactions.csv --format json --preset aggressive
//!
//! # Serve the HTTP API on :8080
//! laundering-detector serve --port 8080
//! ```

use laundering_detector::core::config::{DetectionConfig, Preset};
use laundering_detector::http::app::{build_app, AppState};
use laundering_detector::io::csv_input;
use laundering_detector::pipeline;
use std::process;

fn print_usage() {
    eprintln!(
        r#"laundering-detector — batch money-laundering pattern detection

USAGE:
    laundering-detector <COMMAND> [OPTIONS]

COMMANDS:
    detect      Run detection over a CSV transaction file
    serve       Start the HTTP API
    help        Show this message

OPTIONS (detect):
    --input <FILE>      Path to a CSV transaction file
    --format <FORMAT>   Output format: text (default) or json
    --preset <NAME>     aggressive | conservative | balanced (default: balanced)
    --include-graph     Echo the interned graph back in the JSON result

OPTIONS (serve):
    --port <N>          Port to listen on (default: 8080)
    --metrics-path <F>  Path to the append-only metrics JSON-lines file

EXAMPLES:
    laundering-detector detect --input transactions.csv
    laundering-detector detect --input transactions.csv --format json --preset aggressive
    laundering-detector serve --port 9000"#
    );
}

struct DetectArgs {
    input: String,
    format: String,
    preset: Option<String>,
    include_graph: bool,
}

fn parse_detect_args(args: &[String]) -> DetectArgs {
    let mut input = None;
    let mut format = "text".to_string();
    let mut preset = None;
    let mut include_graph = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            "--preset" => {
                i += 1;
                preset = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--preset requires a name");
                    process::exit(1);
                }));
            }
            "--include-graph" => {
                include_graph = true;
            }
            other => {
                eprintln!("Unknown option: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    let input = input.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    DetectArgs {
        input,
        format,
        preset,
        include_graph,
    }
}

async fn cmd_detect(args: &[String]) {
    let parsed = parse_detect_args(args);

    let path = std::path::Path::new(&parsed.input);
    let (edges, issues) = csv_input::read_edges_from_path(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", parsed.input);
        process::exit(1);
    });
    if !issues.is_empty() {
        log::warn!("{} rows dropped during cleaning", issues.len());
    }

    let config = match parsed.preset.as_deref().and_then(Preset::parse) {
        Some(preset) => DetectionConfig::preset(preset),
        None => DetectionConfig::from_env(),
    };

    let result = pipeline::run(edges, config, parsed.include_graph)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Detection failed: {e}");
            process::exit(1);
        });

    if parsed.format == "json" {
        println!("{}", serde_json::to_string_pretty(&result).unwrap());
    } else {
        println!(
            "Analyzed {} accounts, {} transactions in {:.3}s",
            result.summary.total_nodes,
            result.summary.total_transactions,
            result.summary.processing_time_seconds
        );
        println!(
            "Found {} fraud ring(s), flagged {} suspicious account(s)",
            result.summary.fraud_rings_detected, result.summary.suspicious_accounts_flagged
        );
        for ring in &result.fraud_rings {
            println!(
                "  {} risk={} flow={} members={}",
                ring.ring_id,
                ring.risk_score,
                ring.total_flow,
                ring.member_accounts.join(" -> ")
            );
        }
        for account in &result.suspicious_accounts {
            println!(
                "  {} score={} flags=[{}]",
                account.account_id,
                account.suspicion_score,
                account.flags.join(",")
            );
        }
    }
}

async fn cmd_serve(args: &[String]) {
    let mut port = 8080u16;
    let mut metrics_path = "metrics.jsonl".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                port = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--port requires a number");
                        process::exit(1);
                    });
            }
            "--metrics-path" => {
                i += 1;
                metrics_path = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--metrics-path requires a file path");
                    process::exit(1);
                });
            }
            other => {
                eprintln!("Unknown option: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    let state = AppState::new(metrics_path);
    let app = build_app(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    log::info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap_or_else(|e| {
        eprintln!("failed to bind {addr}: {e}");
        process::exit(1);
    });
    axum::serve(listener, app).await.unwrap_or_else(|e| {
        eprintln!("server error: {e}");
        process::exit(1);
    });
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "detect" => cmd_detect(rest).await,
        "serve" => cmd_serve(rest).await,
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}
