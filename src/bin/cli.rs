//! tiny-mp-cache CLI Client
//!
//! Command-line interface for interacting with a cache server.

use clap::{Parser, Subcommand};
use tiny_mp_cache::config::DEFAULT_LISTEN_ADDR;
use tiny_mp_cache::{Client, Endpoint};

/// tiny-mp-cache CLI
#[derive(Parser, Debug)]
#[command(name = "tiny-mp-cache-cli")]
#[command(about = "CLI for the tiny-mp-cache server")]
struct Args {
    /// Server address: host:port, tcp://host:port or unix:///path
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR, value_parser = Endpoint::parse)]
    server: Endpoint,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Read and remove a key
    Pop {
        /// The key to pop
        key: String,
    },

    /// List keys matching a glob pattern
    Keys {
        /// Pattern using * and ?
        #[arg(default_value = "*")]
        pattern: String,
    },

    /// Count entries
    Len,

    /// Ping the server
    Ping,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> tiny_mp_cache::Result<()> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Get { key } => print_value(client.get(&key)?),
        Commands::Set { key, value } => {
            client.set(&key, value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { key } => println!("{}", client.delete(&key)?),
        Commands::Pop { key } => print_value(client.pop(&key)?),
        Commands::Keys { pattern } => {
            for key in client.keys(&pattern)? {
                println!("{}", key);
            }
        }
        Commands::Len => println!("{}", client.len()?),
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }

    Ok(())
}

fn print_value(value: Option<Vec<u8>>) {
    match value {
        Some(v) => println!("{}", String::from_utf8_lossy(&v)),
        None => println!("(nil)"),
    }
}
