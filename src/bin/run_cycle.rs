use anyhow::Result;
use clap::Parser;
use quant_agent::cli::AgentArgs;

/// Run decision cycles from the command line, one per scheduler tick
#[derive(Parser, Debug)]
#[command(name = "run-cycle")]
struct Args {
    /// Number of cycles to run back to back
    #[arg(short = 'n', long, default_value_t = 1)]
    cycles: u32,

    /// Print the final state as JSON after the summaries
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    agent: AgentArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Summaries go to stdout; logs stay on stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quant_agent=warn".parse()?),
        )
        .init();

    let args = Args::parse();
    let mut agent = args.agent.build_agent()?;

    let mut last = None;
    for cycle in 1..=args.cycles {
        let report = agent.run_cycle().await;
        if args.cycles > 1 {
            println!("--- cycle {} ---", cycle);
        }
        println!("{}", report.summary());
        last = Some(report);
    }

    if args.json {
        let state = match last {
            Some(report) => report.state,
            None => agent.current_state(),
        };
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    Ok(())
}
