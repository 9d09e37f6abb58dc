use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd_order;
mod cmd_stats;
mod common;

#[derive(Parser, Debug)]
#[command(name = "nodesetctl", version, about = "OPC UA NodeSet inspection CLI")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long, global = true)]
    json: bool,
    /// Bytes read from the file per tokenizer refill
    #[arg(long, default_value_t = nodeset_loader::xml::DEFAULT_CHUNK_SIZE, global = true)]
    chunk_size: usize,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print nodes in creation order
    Order {
        file: PathBuf,
        /// Consumer index for a namespace URI (URI=INDEX); repeatable
        #[arg(long, value_parser = common::parse_remap)]
        remap: Vec<(String, u16)>,
    },
    /// Print counts and timings of a load
    Stats {
        file: PathBuf,
        #[arg(long, value_parser = common::parse_remap)]
        remap: Vec<(String, u16)>,
    },
}

fn main() -> Result<()> {
    let Cli {
        verbose,
        json,
        chunk_size,
        cmd,
    } = Cli::parse();

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cmd {
        Cmd::Order { file, remap } => cmd_order::run(&file, &remap, chunk_size, json)?,
        Cmd::Stats { file, remap } => cmd_stats::run(&file, &remap, chunk_size, json)?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_order_with_remaps() {
        let cli = Cli::parse_from([
            "nodesetctl",
            "order",
            "Opc.Ua.Di.NodeSet2.xml",
            "--remap",
            "http://opcfoundation.org/UA/DI/=2",
            "--remap",
            "urn:acme=7",
            "--json",
        ]);
        assert!(cli.json);
        match cli.cmd {
            Cmd::Order { file, remap } => {
                assert_eq!(file, PathBuf::from("Opc.Ua.Di.NodeSet2.xml"));
                assert_eq!(
                    remap,
                    vec![
                        ("http://opcfoundation.org/UA/DI/".to_string(), 2),
                        ("urn:acme".to_string(), 7),
                    ]
                );
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parse_stats_defaults() {
        let cli = Cli::parse_from(["nodesetctl", "-vv", "stats", "model.xml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.chunk_size, 1024);
        assert!(!cli.json);
        match cli.cmd {
            Cmd::Stats { remap, .. } => assert!(remap.is_empty()),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn malformed_remap_is_rejected() {
        let result = Cli::try_parse_from(["nodesetctl", "order", "m.xml", "--remap", "urn:acme"]);
        assert!(result.is_err());
    }
}
