//! CLI entry point for the crusoe-recommend host risk ranking.
//!
//! `recommend` and `compare` query Neo4j and print for a human operator.
//! `score` reads a JSON scoring input from stdin and writes the scored,
//! ranked hosts as JSON to stdout, without touching the graph.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use regex::Regex;
use tracing_subscriber::{fmt, EnvFilter};

use crusoe_core::config::{load_layered, recommender_config_from};
use crusoe_graph::{GraphClient, GraphConfig};
use crusoe_recommend::output::{self, TableOptions};
use crusoe_recommend::{HostLookup, RecommendRequest, Recommender, ScoringInput};

/// One or more dot-separated labels of letters, digits and inner hyphens.
const DOMAIN_PATTERN: &str =
    r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)*[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.?$";

#[derive(Parser)]
#[command(name = "crusoe-recommend")]
#[command(about = "Rank hosts near an attacked host by how likely they are to be attacked next")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: crusoe).
    #[arg(short, long, default_value = "crusoe", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Rank the hosts around an attacked host.
    Recommend {
        /// IP address of the attacked host.
        #[arg(long, conflicts_with = "domain", required_unless_present = "domain")]
        ip: Option<String>,
        /// Domain name of the attacked host.
        #[arg(long)]
        domain: Option<String>,
        /// Maximum graph distance to search (default: from config).
        #[arg(short = 'd', long)]
        max_distance: Option<u32>,
        /// Display at most this many hosts.
        #[arg(short, long)]
        limit: Option<usize>,
        /// Show the warnings raised for each host.
        #[arg(short, long)]
        verbose: bool,
        /// Export all hosts to a CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Export all hosts to a JSON file.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Score a JSON scoring input (reads JSON from stdin).
    Score,
    /// Compare two hosts directly.
    Compare {
        /// IP address of the first host.
        #[arg(long)]
        first: String,
        /// IP address of the second host.
        #[arg(long)]
        second: String,
        /// Maximum distance for the shortest-path lookup.
        #[arg(short = 'd', long)]
        max_distance: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let cfg = load_layered(&cli.config)?;
    let config = recommender_config_from(&cfg)?;

    match cli.command {
        Command::Score => {
            let input = std::io::read_to_string(std::io::stdin())?;
            let input: ScoringInput = serde_json::from_str(&input).context("invalid scoring input")?;
            let result = crusoe_recommend::score_offline(&config, input)?;
            println!("{}", serde_json::to_string(&result)?);
        }
        Command::Recommend {
            ip,
            domain,
            max_distance,
            limit,
            verbose,
            csv,
            json,
        } => {
            let attacked = resolve_lookup(ip, domain)?;
            validate_max_distance(max_distance)?;
            if limit == Some(0) {
                bail!("--limit must be a positive number");
            }

            let graph = GraphClient::connect(&graph_config(&cfg)).await?;
            let recommender = Recommender::new(graph, config);
            let result = recommender
                .recommend(RecommendRequest {
                    attacked,
                    max_distance,
                })
                .await?;

            print!(
                "{}",
                output::render_report(
                    &result.attacked_host,
                    &result.hosts,
                    result.max_distance,
                    TableOptions { limit, verbose },
                )
            );
            if let Some(path) = csv {
                output::export_csv(&path, &result.hosts)?;
            }
            if let Some(path) = json {
                output::export_json(&path, &result.hosts)?;
            }
        }
        Command::Compare {
            first,
            second,
            max_distance,
        } => {
            validate_ip(&first)?;
            validate_ip(&second)?;
            validate_max_distance(max_distance)?;

            let graph = GraphClient::connect(&graph_config(&cfg)).await?;
            let recommender = Recommender::new(graph, config);
            let result = recommender.compare(&first, &second, max_distance).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn resolve_lookup(ip: Option<String>, domain: Option<String>) -> anyhow::Result<HostLookup> {
    match (ip, domain) {
        (Some(ip), None) => {
            validate_ip(&ip)?;
            Ok(HostLookup::Ip(ip))
        }
        (None, Some(domain)) => {
            validate_domain(&domain)?;
            Ok(HostLookup::Domain(domain))
        }
        _ => bail!("exactly one of --ip or --domain is required"),
    }
}

fn validate_ip(ip: &str) -> anyhow::Result<()> {
    ip.parse::<IpAddr>()
        .with_context(|| format!("invalid IP address: {ip}"))?;
    Ok(())
}

fn validate_domain(domain: &str) -> anyhow::Result<()> {
    if domain.len() > 253 || !Regex::new(DOMAIN_PATTERN)?.is_match(domain) {
        bail!("invalid domain name: {domain}");
    }
    Ok(())
}

fn validate_max_distance(max_distance: Option<u32>) -> anyhow::Result<()> {
    if max_distance == Some(0) {
        bail!("--max-distance must be at least 1");
    }
    Ok(())
}

fn graph_config(cfg: &config::Config) -> GraphConfig {
    let defaults = GraphConfig::default();
    GraphConfig {
        uri: cfg.get_string("neo4j.uri").unwrap_or(defaults.uri),
        user: cfg.get_string("neo4j.user").unwrap_or(defaults.user),
        password: cfg.get_string("neo4j.password").unwrap_or(defaults.password),
        ..GraphConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_recommend_requires_one_lookup() {
        assert!(Cli::try_parse_from(["crusoe-recommend", "recommend"]).is_err());
        assert!(Cli::try_parse_from([
            "crusoe-recommend",
            "recommend",
            "--ip",
            "10.0.0.1",
            "--domain",
            "example.org"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["crusoe-recommend", "recommend", "--ip", "10.0.0.1"]).is_ok());
    }

    #[test]
    fn test_lookup_validation() {
        assert!(matches!(
            resolve_lookup(Some("10.0.0.1".into()), None),
            Ok(HostLookup::Ip(_))
        ));
        assert!(resolve_lookup(Some("10.0.0.300".into()), None).is_err());
        assert!(resolve_lookup(Some("fe80::1".into()), None).is_ok());
        assert!(matches!(
            resolve_lookup(None, Some("mail.example.org".into())),
            Ok(HostLookup::Domain(_))
        ));
        assert!(resolve_lookup(None, Some("-bad-.example.org".into())).is_err());
        assert!(resolve_lookup(None, Some("spaces are.not ok".into())).is_err());
        assert!(resolve_lookup(None, None).is_err());
    }

    #[test]
    fn test_zero_max_distance_rejected() {
        assert!(validate_max_distance(Some(0)).is_err());
        assert!(validate_max_distance(Some(1)).is_ok());
        assert!(validate_max_distance(None).is_ok());
    }
}
