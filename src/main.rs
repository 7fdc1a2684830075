use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use comdao_bindings::{
    config::Config,
    contracts::KnownContract,
    ethereum::{
        contract::{CallVariant, ContractInstance},
        factory::ContractFactory,
        params::{self, TxOptions},
    },
};
use serde_json::{json, Value};
use tracing::{error, info};

fn contract_arg() -> Arg {
    Arg::new("contract")
        .required(true)
        .value_name("CONTRACT")
        .help("Contract name (ComDAO, SGBManager)")
}

fn json_args() -> Arg {
    Arg::new("args")
        .num_args(0..)
        .trailing_var_arg(true)
        .allow_hyphen_values(true)
        .value_name("ARGS")
        .help("Arguments as JSON values; a trailing object is taken as call options")
}

fn invocation(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(contract_arg())
        .arg(
            Arg::new("target")
                .required(true)
                .value_name("ADDRESS")
                .help("Contract address, or 'deployed' for the network's recorded address"),
        )
        .arg(
            Arg::new("method")
                .required(true)
                .value_name("METHOD")
                .help("ABI function name"),
        )
        .arg(json_args())
}

/// Parses each argument as JSON, falling back to a plain string.
fn parse_json_args(matches: &ArgMatches) -> Vec<Value> {
    matches
        .get_many::<String>("args")
        .map(|values| {
            values
                .map(|raw| {
                    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn contract(matches: &ArgMatches) -> Result<KnownContract> {
    matches
        .get_one::<String>("contract")
        .ok_or_else(|| anyhow!("Missing contract name"))?
        .parse()
}

fn configured_factory(config: &Config, contract: KnownContract) -> Result<ContractFactory> {
    let mut factory = contract.factory()?;
    factory.set_provider(config.connect()?)?;
    factory.set_confirmation_policy(config.confirmation_policy())?;
    factory.set_defaults(config.default_options()?)?;
    if let Some(network) = &config.network {
        factory.set_network(network)?;
    }
    Ok(factory)
}

async fn resolve_instance(factory: &mut ContractFactory, target: &str) -> Result<ContractInstance> {
    let instance = if target == "deployed" {
        factory.deployed().await?
    } else {
        factory.at(target)?
    };
    info!(
        "Using {} at 0x{:x}",
        instance.contract_name(),
        instance.address()
    );
    Ok(instance)
}

fn networks(contract: KnownContract) -> Result<Value> {
    let artifact = contract.artifact()?;
    let networks: Vec<Value> = artifact
        .networks
        .iter()
        .map(|(id, network)| {
            json!({
                "network": id,
                "address": network.address.map(|address| format!("0x{:x}", address)),
                "updatedAt": network.updated_at,
                "events": network.events.len(),
                "links": network.links.keys().collect::<Vec<_>>(),
            })
        })
        .collect();
    Ok(json!({ "contract": artifact.contract_name, "networks": networks }))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = Command::new("comdao")
        .version("0.1.0")
        .about("Client for the ComDAO and SGBManager contracts")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file"),
        )
        .arg(
            Arg::new("network")
                .short('n')
                .long("network")
                .value_name("NETWORK")
                .help("Network record to use; detected from the node when omitted"),
        )
        .arg(
            Arg::new("rpc-url")
                .short('r')
                .long("rpc-url")
                .value_name("URL")
                .help("RPC endpoint URL"),
        )
        .arg(
            Arg::new("extended")
                .long("extended")
                .help("Return receipts and decoded events for transactions")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a sample configuration file and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .help("Print the default configuration file path and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("networks")
                .about("List the network records bundled for a contract")
                .arg(contract_arg()),
        )
        .subcommand(invocation("call", "Run a function as a read-only call"))
        .subcommand(invocation("send", "Send a transaction and print its hash"))
        .subcommand(invocation("estimate", "Estimate gas for a function call"))
        .subcommand(invocation(
            "execute",
            "Read constant functions, send and confirm the rest",
        ))
        .subcommand(
            Command::new("deploy")
                .about("Deploy a new instance and wait for its receipt")
                .arg(contract_arg())
                .arg(json_args()),
        )
        .get_matches();

    if matches.get_flag("generate-config") {
        println!("{}", Config::generate_sample());
        return Ok(());
    }

    if matches.get_flag("config-path") {
        match Config::default_config_path() {
            Ok(path) => {
                println!("{}", path.display());
                return Ok(());
            }
            Err(e) => {
                error!("Could not determine default config path: {}", e);
                return Err(e);
            }
        }
    }

    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let mut config = Config::load_or_default(config_path).await;

    if let Some(network) = matches.get_one::<String>("network") {
        config.network = Some(network.clone());
    }
    if let Some(rpc_url) = matches.get_one::<String>("rpc-url") {
        config.rpc.url = Some(rpc_url.clone());
    }
    if matches.get_flag("extended") {
        config.sync.extended_results = true;
    }

    let output = match matches.subcommand() {
        Some(("networks", sub)) => networks(contract(sub)?)?,
        Some(("deploy", sub)) => {
            let contract = contract(sub)?;
            let mut factory = configured_factory(&config, contract)?;
            let (args, options) = params::split_options(parse_json_args(sub), &TxOptions::default())?;
            let args = factory.constructor_args(&args)?;

            info!("Deploying {} to {}", contract, config.rpc_url());
            let instance = factory.deploy(args, options).await?;
            json!({
                "contract": contract.name(),
                "address": format!("0x{:x}", instance.address()),
                "transactionHash": instance.transaction_hash().map(|hash| format!("0x{:x}", hash)),
            })
        }
        Some((name, sub)) => {
            let variant: CallVariant = name.parse()?;
            let contract = contract(sub)?;
            let target = sub
                .get_one::<String>("target")
                .ok_or_else(|| anyhow!("Missing contract address"))?;
            let method = sub
                .get_one::<String>("method")
                .ok_or_else(|| anyhow!("Missing method name"))?;

            let mut factory = configured_factory(&config, contract)?;
            let instance = resolve_instance(&mut factory, target).await?;
            instance
                .invoke_json(method, variant, parse_json_args(sub))
                .await
                .map_err(|e| {
                    error!("{} {} failed: {}", variant, method, e);
                    e
                })?
        }
        None => {
            return Err(anyhow!(
                "No command given. Run with --help to see the available commands"
            ))
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
