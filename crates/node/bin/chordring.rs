use chordring_node::config::Config;
use chordring_node::consts::DEFAULT_CONFIG_LOCATION;
use chordring_node::logging::init_logging;
use chordring_node::logging::LogLevel;
use chordring_node::simulation::Simulation;
use clap::Args;
use clap::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(about, version, author)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, default_value_t = LogLevel::Info, value_enum, env)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Command {
    #[command(about = "Writes a default configuration file.")]
    Init(InitCommand),
    #[command(about = "Builds a ring in process, breaks it, and prints a JSON report.")]
    Simulate(SimulateCommand),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[arg(
        long,
        short = 'c',
        env,
        default_value = DEFAULT_CONFIG_LOCATION,
        help = "Config file location"
    )]
    pub config: String,
}

#[derive(Args, Debug)]
struct InitCommand {
    #[arg(
        long,
        default_value = DEFAULT_CONFIG_LOCATION,
        help = "The location of config file"
    )]
    pub location: String,
}

#[derive(Args, Debug)]
struct SimulateCommand {
    #[arg(
        long,
        short = 'n',
        help = "Number of nodes. If not provided, use simulation.nodes in config file"
    )]
    pub nodes: Option<usize>,

    #[arg(
        long,
        short = 'r',
        help = "Maintenance rounds. If not provided, use simulation.rounds in config file"
    )]
    pub rounds: Option<usize>,

    #[arg(
        long,
        short = 'f',
        help = "Nodes to crash. If not provided, use simulation.failures in config file"
    )]
    pub failures: Option<usize>,

    #[command(flatten)]
    config_args: ConfigArgs,
}

fn get_value<V>(value: Option<V>, default_value: V) -> V {
    value.unwrap_or(default_value)
}

async fn simulate(args: SimulateCommand) -> anyhow::Result<()> {
    let c = Config::read_fs(args.config_args.config.as_str())?;

    let mut simulation = c.simulation;
    simulation.nodes = get_value(args.nodes, simulation.nodes);
    simulation.rounds = get_value(args.rounds, simulation.rounds);
    simulation.failures = get_value(args.failures, simulation.failures);

    let report = Simulation::new(c.chord, simulation)?.run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Command::Init(args) => {
            let p = Config::default().write_fs(args.location.as_str())?;
            println!("Your config file has saved to: {}", p);
            Ok(())
        }
        Command::Simulate(args) => simulate(args).await,
    }
}
