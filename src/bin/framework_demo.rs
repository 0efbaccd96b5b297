use clap::{Parser, Subcommand};
use mini_module::app::demos;
use mini_module::utils::logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "framework-demo")]
#[command(about = "Walkthroughs of the event, routing, service and view facilities")]
struct Args {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Trigger `Lundi` on an event manager with two prioritised listeners
    Event,
    /// Match a URI against `/:controller` (letters only)
    Route { uri: String },
    /// Fetch a counted service twice and print the live instance count
    Service {
        /// Build a new instance on every fetch instead of sharing one
        #[arg(long)]
        per_call: bool,
    },
    /// Render the `tintin` view through its template
    View {
        /// Template file to use instead of the built-in one
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// Render the `tintin` view variables as JSON
    ViewJson,
    /// Render the `tintin` view through rendering and response strategies
    StrategyView {
        #[arg(long)]
        template: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    match args.command {
        Command::Event => {
            for line in demos::event_demo() {
                println!("{}", line);
            }
        }
        Command::Route { uri } => {
            if demos::route_demo(&uri)? {
                println!("OK");
            } else {
                println!("Not OK");
            }
        }
        Command::Service { per_call } => {
            for count in demos::service_demo(!per_call) {
                println!("{}", count);
            }
        }
        Command::View { template } => {
            println!("{}", demos::view_demo(template.as_deref())?);
        }
        Command::ViewJson => {
            println!("{}", demos::json_view_demo()?);
        }
        Command::StrategyView { template } => match demos::strategy_view_demo(template.as_deref()) {
            Ok(content) => println!("{}", content),
            Err(e) => {
                tracing::error!("❌ Rendering failed: {}", e);
                eprintln!("{}", e.user_friendly_message());
            }
        },
    }

    Ok(())
}
