//! # chatdigest CLI
//!
//! Command-line interface for the chatdigest library.
//!
//! Exit codes: `0` all conversations handled, `1` the run could not start or
//! was aborted, `2` the run finished but some conversations failed.

use std::io;
use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;

use chatdigest::ChatdigestError;
use chatdigest::cli::{Args, Command, ExportArgs, LogFormat, RunArgs};
use chatdigest::config::TransportConfig;
use chatdigest::core::Pipeline;
use chatdigest::core::output::{export_csv, write_csv};
use chatdigest::inference::InferenceClient;
use chatdigest::parsers::load_archive;
use chatdigest::progress::stderr_progress;
use chatdigest::transport::TransportManager;

#[tokio::main]
async fn main() {
    let args = <Args as ClapParser>::parse();
    init_tracing(&args);

    let result = match args.into_command() {
        Command::Run(run_args) => run(run_args).await,
        Command::Export(export_args) => export(&export_args),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            if e.is_fatal_setup() {
                eprintln!("   Check the input, settings and ledger, then rerun.");
            }
            process::exit(1);
        }
    }
}

/// Logs go to stderr so stdout stays clean for the summary and CSV export.
fn init_tracing(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));

    match args.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

async fn run(args: RunArgs) -> Result<i32, ChatdigestError> {
    let total_start = Instant::now();

    let input = args.resolve_input()?;
    let transport = args.transport_config()?;
    let pipeline_config = args.pipeline_config();

    println!("🧠 chatdigest v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📂 Input:   {}", input.display());
    println!("💾 Output:  {}", pipeline_config.output_dir.display());
    println!("🤖 Model:   {}", args.model);
    match &transport {
        TransportConfig::Direct { endpoint } => println!("🔌 Host:    {}", endpoint),
        TransportConfig::Tunnel(tunnel) => println!(
            "🔐 Tunnel:  {}@{}:{} -> localhost:{}",
            tunnel.user, tunnel.host, tunnel.ssh_port, tunnel.local_port
        ),
    }
    println!();

    println!("⏳ Parsing archive...");
    let parse_start = Instant::now();
    let conversations = load_archive(&input)?;
    println!(
        "   Found {} conversations ({:.2}s)",
        conversations.len(),
        parse_start.elapsed().as_secs_f64()
    );

    let pipeline = Pipeline::new(
        TransportManager::new(transport),
        InferenceClient::new(args.inference_config())?,
        pipeline_config,
    );
    let pipeline = if args.progress {
        pipeline.with_progress(stderr_progress())
    } else {
        pipeline
    };

    println!("🔍 Analyzing...");
    let report = pipeline.run(&input, &conversations).await?;
    let total_time = total_start.elapsed();

    println!();
    if report.is_clean() {
        println!("✅ Done!");
    } else {
        println!("⚠️  Done with failures");
    }

    println!();
    println!("📊 Summary:");
    println!("   Conversations: {}", report.total);
    println!("   Analyzed:      {}", report.processed);
    println!("   Skipped:       {}", report.skipped);
    println!("   Failed:        {}", report.failed);
    for failure in &report.failures {
        println!(
            "   ✗ #{} {}: {}",
            failure.ordinal, failure.chat_name, failure.error
        );
    }

    println!();
    println!("⚡ Performance:");
    println!("   Total time:  {:.2}s", total_time.as_secs_f64());

    Ok(if report.is_partial() { 2 } else { 0 })
}

fn export(args: &ExportArgs) -> Result<i32, ChatdigestError> {
    match &args.output {
        Some(path) => {
            let rows = write_csv(&args.dir, path)?;
            println!("✅ Exported {} rows to {}", rows, path.display());
        }
        None => {
            export_csv(&args.dir, io::stdout().lock())?;
        }
    }
    Ok(0)
}
