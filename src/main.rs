//! Sam CLI entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sam::agent::{Agent, ProviderRegistry};
use sam::memory::CoreMemory;
use sam::ui;

#[derive(Parser)]
#[command(name = "sam")]
#[command(about = "Sam - lightweight stateful AI agent with self-editing memory")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Sam configuration
    Onboard,

    /// Chat with the agent
    Chat {
        /// Single message to send (omit for interactive mode)
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print the default compiled memory
    Memory,

    /// Show Sam status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Double Ctrl+C to exit
    let exit_flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let r = exit_flag.clone();

    ctrlc::set_handler(move || {
        if r.load(std::sync::atomic::Ordering::SeqCst) {
            println!("\nBye!");
            std::process::exit(0);
        } else {
            println!("\nPress Ctrl+C again to exit");
            r.store(true, std::sync::atomic::Ordering::SeqCst);

            let r2 = r.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_secs(3));
                r2.store(false, std::sync::atomic::Ordering::SeqCst);
            });
        }
    })
    .ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            sam::config::onboard()?;
        }

        Commands::Chat { message } => {
            let agent = build_agent()?;
            match message {
                Some(msg) => run_once(agent, &msg).await,
                None => run_interactive(agent).await?,
            }
        }

        Commands::Memory => {
            let mut memory = CoreMemory::new();
            memory.initialize_default();
            ui::print_memory_dump(&memory.compile());
        }

        Commands::Status => {
            let config = sam::config::load()?;
            println!("Sam Status\n");
            println!("Provider: {}", config.provider);
            println!("Model: {}", config.model);
            println!("Base URL: {}", config.base_url());
            println!(
                "API key: {}",
                if config.resolved_api_key().is_ok() {
                    "✓"
                } else {
                    "not set"
                }
            );
        }
    }

    Ok(())
}

fn build_agent() -> Result<Agent> {
    let mut config = sam::config::load()?;
    config.api_key = config.resolved_api_key()?;

    let provider = ProviderRegistry::create(&config)?;
    Ok(Agent::with_max_steps(
        provider,
        Box::new(ui::ConsoleSink),
        config.max_steps,
    ))
}

async fn run_once(mut agent: Agent, message: &str) {
    agent.step(message).await;
}

async fn run_interactive(mut agent: Agent) -> Result<()> {
    use std::io::{self, Write};

    let config = sam::config::load()?;
    ui::print_header(&config.model, &config.provider);

    println!("Current memory:");
    ui::print_memory_dump(&agent.memory_dump());
    println!("\nType 'quit' or 'exit' to leave. Commands: /memory, /add_scratchpad, /remove_scratchpad\n");

    loop {
        print!("\x1b[1;34mYou\x1b[0m: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Bye!");
            break;
        }

        if input.is_empty() {
            continue;
        }

        match input {
            "/memory" => {
                ui::print_memory_dump(&agent.memory_dump());
            }
            "/add_scratchpad" => {
                agent.add_memory_block(
                    "scratchpad",
                    "Use this block for temporary thoughts.",
                    500,
                    false,
                );
                ui::print_success("Added 'scratchpad' block.");
            }
            "/remove_scratchpad" => {
                agent.remove_memory_block("scratchpad");
                ui::print_success("Removed 'scratchpad' block.");
            }
            _ => {
                agent.step(input).await;
            }
        }
    }

    Ok(())
}
