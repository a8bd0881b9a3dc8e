//! `orgsd`: runs the org manager and offers admin commands against it

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use orgs_core::{register_org_manager, NullServiceFactory, OrgManager, OrgService};
use orgs_types::{Config, OrgRecord};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

mod logging;

fn cli() -> Command {
    Command::new("orgsd")
        .version(orgs_core::VERSION)
        .about("Org manager daemon")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .env("ORGS_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the root YAML config"),
        )
        .subcommand(Command::new("serve").about("Run the root org and reconcile orgs until interrupted"))
        .subcommand(
            Command::new("list").about("List orgs").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Output as JSON"),
            ),
        )
        .subcommand(
            Command::new("create")
                .about("Create and persist a new org")
                .arg(
                    Arg::new("name")
                        .long("name")
                        .required(true)
                        .help("Display name of the org"),
                )
                .arg(
                    Arg::new("id")
                        .long("id")
                        .help("Explicit org id (generated when omitted)"),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Map a client nonce to its org id")
                .arg(Arg::new("nonce").long("nonce").required(true)),
        )
        .subcommand(
            Command::new("show")
                .about("Print an org's derived config as YAML")
                .arg(
                    Arg::new("org")
                        .long("org")
                        .default_value("root")
                        .help("Org id; `root` for the root org"),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

fn build_manager(config: Config) -> Result<OrgManager> {
    let datastore = config
        .datastore
        .as_ref()
        .map(orgs_datastore::open)
        .transpose()
        .context("opening datastore")?;
    let manager = OrgManager::new(config, Arc::new(NullServiceFactory));
    Ok(match datastore {
        Some(datastore) => manager.with_datastore(datastore),
        None => manager,
    })
}

fn format_records(records: &[OrgRecord], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(records)?);
    }
    let mut out = String::new();
    for record in records {
        writeln!(out, "{}\t{}", record.org_id, record.name)?;
    }
    Ok(out)
}

async fn run(matches: ArgMatches) -> Result<()> {
    let config = load_config(&matches)?;
    logging::init(config.logging.as_ref())?;

    let manager = Arc::new(build_manager(config)?);
    let mut service = OrgService::start(Arc::clone(&manager)).await?;
    register_org_manager(Arc::clone(&manager));

    let outcome = match matches.subcommand() {
        Some(("serve", _)) => {
            tracing::info!(orgs = manager.org_count(), "serving");
            tokio::signal::ctrl_c()
                .await
                .context("waiting for ctrl-c")?;
            tracing::info!("shutting down");
            Ok(())
        }
        Some(("list", args)) => {
            format_records(&manager.list_orgs(), args.get_flag("json")).map(|out| print!("{out}"))
        }
        Some(("create", args)) => {
            let name = args.get_one::<String>("name").map_or("", String::as_str);
            let id = args.get_one::<String>("id").map(String::as_str);
            manager
                .create_new_org(name, id)
                .map_err(anyhow::Error::from)
                .and_then(|record| Ok(serde_json::to_string_pretty(&record)?))
                .map(|out| println!("{out}"))
        }
        Some(("resolve", args)) => {
            let nonce = args.get_one::<String>("nonce").map_or("", String::as_str);
            manager
                .org_id_by_nonce(nonce)
                .map(|org_id| println!("{org_id}"))
                .map_err(anyhow::Error::from)
        }
        Some(("show", args)) => {
            let org = args.get_one::<String>("org").map_or("root", String::as_str);
            manager
                .get_org_config(org)
                .map_err(anyhow::Error::from)
                .and_then(|config| Ok(config.to_yaml()?))
                .map(|out| print!("{out}"))
        }
        _ => Ok(()),
    };

    service.stop().await;
    outcome
}

#[tokio::main]
async fn main() -> Result<()> {
    run(cli().get_matches()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgs_types::OrgId;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn create_args() {
        let matches = cli()
            .try_get_matches_from(["orgsd", "create", "--name", "Acme", "--id", "acme"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "create");
        assert_eq!(args.get_one::<String>("name").unwrap(), "Acme");
        assert_eq!(args.get_one::<String>("id").unwrap(), "acme");
    }

    #[test]
    fn create_requires_name() {
        assert!(cli().try_get_matches_from(["orgsd", "create"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let matches = cli()
            .try_get_matches_from(["orgsd", "list", "--config", "/etc/orgs.yaml"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("config").unwrap(),
            &PathBuf::from("/etc/orgs.yaml")
        );
    }

    #[test]
    fn format_records_text() {
        let records = vec![
            OrgRecord::root(orgs_types::Nonce::empty()),
            OrgRecord::new(OrgId::parse("acme").unwrap(), "Acme"),
        ];
        let out = format_records(&records, false).unwrap();
        assert_eq!(out, "root\t<root org>\nacme\tAcme\n");
        let json = format_records(&records, true).unwrap();
        assert!(json.contains("\"name\": \"Acme\""));
    }

    #[test]
    fn file_datastore_config_builds_persistent_manager() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = format!(
            "datastore:\n  implementation: FileBaseDataStore\n  location: {}\n",
            dir.path().display()
        );
        let manager = build_manager(Config::from_yaml_str(&yaml).unwrap()).unwrap();
        assert!(manager.has_datastore());
        assert!(!build_manager(Config::default()).unwrap().has_datastore());
    }
}
