//! resplink CLI Client
//!
//! Sends one command to a server and prints the reply.

use clap::Parser;
use resplink::{AsyncClient, Client, Command, Config, SenderTag};
use tracing_subscriber::{fmt, EnvFilter};

/// resplink CLI
#[derive(Parser, Debug)]
#[command(name = "resplink-cli")]
#[command(about = "Send a command to a RESP key-value server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    /// Route the command through the background dispatch client
    #[arg(short = 'a', long = "async")]
    use_async: bool,

    /// Tag the request as belonging to a pub/sub channel (async only)
    #[arg(short, long, requires = "use_async")]
    tag: Option<String>,

    /// Read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Command name followed by its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,resplink=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .addr(&args.server)
        .read_timeout_ms(args.timeout_ms)
        .build();
    let command = Command::from_args(&args.command);

    tracing::debug!("Sending {:?} to {}", args.command, args.server);

    let reply = if args.use_async {
        let tag = args.tag.map(SenderTag::Channel).unwrap_or_default();
        AsyncClient::connect(&config).and_then(|client| {
            let reply = client.submit(&command, tag).and_then(|handle| handle.wait());
            client.shutdown();
            reply
        })
    } else {
        Client::connect(&config).and_then(|mut client| client.execute(&command))
    };

    match reply {
        Ok(value) => println!("{}", value),
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            std::process::exit(1);
        }
    }
}
