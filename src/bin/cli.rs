//! redikv CLI Client
//!
//! Command-line interface for interacting with redikv.

use clap::{Parser, Subcommand};
use redikv::protocol::{Encoding, Value, ValueFraming};
use redikv::{Client, Result};

/// redikv CLI
#[derive(Parser, Debug)]
#[command(name = "redikv-cli")]
#[command(about = "CLI for the redikv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    server: String,

    /// Expect GET payloads without a value-length field
    #[arg(long)]
    legacy_framing: bool,

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

        /// string, array, number or json; inferred from the value if omitted
        #[arg(short, long)]
        encoding: Option<Encoding>,
    },

    /// Delete a key
    #[command(alias = "del")]
    Delete {
        /// The key to delete
        key: String,
    },

    /// List all keys
    Keys,

    /// Ping the server
    Ping,
}

fn main() {
    let args = Args::parse();

    let framing = ValueFraming::from_length_prefixed(!args.legacy_framing);
    let client = Client::new(args.server).with_framing(framing);

    if let Err(e) = run(&client, args.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(client: &Client, command: Commands) -> Result<()> {
    match command {
        Commands::Get { key } => match client.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Commands::Set {
            key,
            value,
            encoding,
        } => {
            let value = match encoding {
                Some(encoding) => Value::decode(value.as_bytes(), encoding)?,
                None => Value::infer(&value),
            };
            client.set(&key, value)?;
            println!("OK");
        }
        Commands::Delete { key } => {
            if client.delete(&key)? {
                println!("1");
            } else {
                println!("0");
            }
        }
        Commands::Keys => {
            for key in client.keys()? {
                println!("{}", key);
            }
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }
    Ok(())
}
