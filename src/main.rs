// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::env;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use otp_ioctl_core::config::{load_and_validate_config, RuntimeBuilder};
use otp_ioctl_core::engine::{Completion, RequestResult, StopAck};
use otp_ioctl_core::observability::{DispatchEvent, MemorySink};
use otp_ioctl_core::traits::DiagnosticSink;

/// Records every event in memory and forwards it to `tracing`.
struct TeeSink {
    memory: MemorySink,
}

impl DiagnosticSink for TeeSink {
    fn record(&self, event: &DispatchEvent) {
        otp_ioctl_core::observability::TracingSink.record(event);
        self.memory.record(event);
    }
}

#[derive(Serialize)]
struct CodeReport {
    code: String,
    request_id: Option<u64>,
    result: Option<RequestResult>,
    output: Option<u32>,
    error: Option<String>,
}

const DEFAULT_PROGRAM: &str = "otp-ioctl-core";

#[derive(Debug, PartialEq)]
struct CliArgs {
    json: bool,
    config_file: String,
    codes: Vec<String>,
}

impl CliArgs {
    /// `None` when the config file or every code is missing. The first item
    /// is the program name and may be absent.
    fn parse(args: impl IntoIterator<Item = String>) -> Option<Self> {
        let mut args: Vec<String> = args.into_iter().skip(1).collect();
        let json = match args.iter().position(|arg| arg == "--json") {
            Some(index) => {
                args.remove(index);
                true
            }
            None => false,
        };
        if args.len() < 2 {
            return None;
        }
        let codes = args.split_off(1);
        let config_file = args.pop()?;
        Some(Self {
            json,
            config_file,
            codes,
        })
    }
}

/// Parses a decimal or `0x`-prefixed code.
fn parse_code(arg: &str) -> Result<u32> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => arg.parse::<u32>(),
    };
    parsed.with_context(|| format!("'{}' is not a valid u32 OTP code", arg))
}

fn output_value(completion: &Completion) -> Option<u32> {
    completion
        .output
        .as_slice()
        .first_chunk::<4>()
        .filter(|_| completion.result.bytes_written >= 4)
        .map(|bytes| u32::from_le_bytes(*bytes))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = match CliArgs::parse(env::args()) {
        Some(cli) => cli,
        None => {
            let program = env::args().next().unwrap_or_else(|| DEFAULT_PROGRAM.to_string());
            eprintln!("Usage: {} [--json] <config.yaml|config.toml> <otp_code> [otp_code ...]", program);
            eprintln!("Example: {} configs/static-code.yaml 123456 1 0x1E240", program);
            eprintln!("Logging: RUST_LOG=otp_ioctl_core=debug {} ...", program);
            std::process::exit(1);
        }
    };
    let json = cli.json;
    let config_file = &cli.config_file;
    let codes = cli
        .codes
        .iter()
        .map(|arg| parse_code(arg))
        .collect::<Result<Vec<_>>>()?;

    let config = load_and_validate_config(config_file)
        .with_context(|| format!("loading {}", config_file))?;
    let operation_code = config.operation_code();

    let sink = Arc::new(TeeSink {
        memory: MemorySink::new(),
    });
    let queue = RuntimeBuilder::from_config(&config, sink.clone())?;

    if !json {
        println!("🔐 OTP Dispatch Demo");
        println!("═══════════════════════════════════");
        println!("Config: {}", config_file);
        println!("Control code: 0x{:08X}", operation_code);
        println!("Policy: {}", RuntimeBuilder::policy(&config.policy).name());
        println!("Workers: {}", queue.options().workers);
        println!();
    }

    let start = Instant::now();
    let mut submitted = Vec::with_capacity(codes.len());
    for code in &codes {
        let outcome = queue.submit(operation_code, code.to_le_bytes().to_vec(), vec![0u8; 4]);
        submitted.push((*code, outcome));
    }

    let mut reports = Vec::with_capacity(submitted.len());
    for (code, outcome) in submitted {
        let report = match outcome {
            Ok(handle) => {
                let completion = handle.wait().await;
                CodeReport {
                    code: code.to_string(),
                    request_id: Some(completion.id.0),
                    output: output_value(&completion),
                    result: Some(completion.result),
                    error: None,
                }
            }
            Err(err) => CodeReport {
                code: code.to_string(),
                request_id: None,
                result: None,
                output: None,
                error: Some(err.to_string()),
            },
        };
        reports.push(report);
    }
    let elapsed = start.elapsed();

    let ack = queue.stop().await;
    if let StopAck::Deferred(report) = ack {
        bail!(
            "queue did not drain in time ({} requests were in flight at stop)",
            report.in_flight_at_stop
        );
    }

    if json {
        for report in &reports {
            println!("{}", serde_json::to_string(report)?);
        }
        return Ok(());
    }

    for report in &reports {
        match (&report.result, &report.error) {
            (Some(result), _) => {
                let verdict = if result.accepted() { "✅ accepted" } else { "❌ rejected" };
                println!(
                    "  #{:<4} code {:>10} -> {} ({}, output={:?})",
                    report.request_id.unwrap_or_default(),
                    report.code,
                    verdict,
                    result.status,
                    report.output
                );
            }
            (None, Some(error)) => println!("  code {:>10} -> ⚠️  {}", report.code, error),
            (None, None) => {}
        }
    }

    println!();
    println!("📊 Summary");
    println!("   Requests: {}", reports.len());
    println!("   Accepted: {}", reports.iter().filter(|r| r.result.is_some_and(|res| res.accepted())).count());
    println!("   Events recorded: {}", sink.memory.events().len());
    println!("   Elapsed: {:?}", elapsed);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn test_cli_args_with_json_flag_anywhere() {
        let cli = CliArgs::parse(strings(&["otp", "cfg.yaml", "--json", "1", "0x2"])).unwrap();
        assert_eq!(
            cli,
            CliArgs {
                json: true,
                config_file: "cfg.yaml".to_string(),
                codes: strings(&["1", "0x2"]),
            }
        );
    }

    #[test]
    fn test_cli_args_missing_program_or_codes() {
        assert_eq!(CliArgs::parse(Vec::<String>::new()), None);
        assert_eq!(CliArgs::parse(strings(&["otp", "cfg.yaml"])), None);
        assert_eq!(CliArgs::parse(strings(&["otp", "--json", "cfg.yaml"])), None);
    }

    #[test]
    fn test_parse_code_accepts_decimal_and_hex() {
        assert_eq!(parse_code("123456").unwrap(), 123_456);
        assert_eq!(parse_code("0x1E240").unwrap(), 123_456);
        assert!(parse_code("twelve").is_err());
    }
}
