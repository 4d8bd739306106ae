use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use signshop::config::ShopConfig;
use signshop::console::{Command, Sandbox, HELP};
use signshop::data::ItemRegistry;
use signshop::message::TemplateFormatter;
use signshop::shop::ShopContext;

const CONFIG_PATH: &str = "signshop.toml";

fn build_sandbox() -> Sandbox {
    let config = match ShopConfig::load(Path::new(CONFIG_PATH)) {
        Ok(config) => config,
        Err(e) => {
            error!("{}, using defaults", e);
            ShopConfig::default()
        }
    };

    // Load item definitions from TOML files
    let data_dir = config.data_dir.clone();
    let mut items = ItemRegistry::new();
    if let Err(e) = items.load_from_directory(&data_dir) {
        error!("Failed to load item registry: {}", e);
    }

    let formatter = match TemplateFormatter::load(&data_dir.join("messages.toml")) {
        Ok(formatter) => formatter,
        Err(e) => {
            warn!("{}, using default templates", e);
            TemplateFormatter::new()
        }
    };

    let ctx = ShopContext::new(config).with_formatter(formatter);
    Sandbox::new(ctx, items)
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("signshop=info")),
        )
        .init();

    let mut sandbox = build_sandbox();
    let tick_ms = sandbox.ctx.config.tick_interval_ms.max(1);
    info!("Sign shop sandbox ready ({} ms ticks), type 'help' for commands", tick_ms);

    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                sandbox.ctx.tick();
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => match sandbox.handle(command) {
                        Ok(output) => output.iter().for_each(|out| println!("{}", out)),
                        Err(e) => println!("error: {}", e),
                    },
                    Err(e) => println!("error: {}\n{}", e, HELP),
                }
            }
        }
    }

    // Flush writes queued by the last command
    let flushed = sandbox.ctx.tick();
    info!("Shutting down ({} pending sign writes applied, {} shops)", flushed, sandbox.registry.len());
}
