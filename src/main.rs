use chart_harvest::cli::{
    handle_config_init, handle_ingest, handle_route, handle_schedule, load_config, Cli, Commands,
    ConfigCommands, IngestArgs, RouteArgs, ScheduleArgs,
};
use chart_harvest::logging::init_tracing;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Schedule(args) => run_schedule(&args),
        Commands::Ingest(args) => run_ingest(&args).await,
        Commands::Route(args) => run_route(&args),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run_schedule(args: &ScheduleArgs) -> anyhow::Result<String> {
    let config = load_config(&args.config)?;
    handle_schedule(args, &config)
}

async fn run_ingest(args: &IngestArgs) -> anyhow::Result<String> {
    let config = load_config(&args.config)?;
    init_tracing(&config.logging)?;
    handle_ingest(args, &config).await
}

fn run_route(args: &RouteArgs) -> anyhow::Result<String> {
    let config = load_config(&args.config)?;
    Ok(handle_route(args, &config))
}
