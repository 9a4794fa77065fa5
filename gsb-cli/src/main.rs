use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::debug;

use gsb_core::{DeprovisionDetails, PlanDetails, ProvisionDetails, ServiceBroker};
use gsb_provider_bigtable::admin::DEFAULT_ENDPOINT;
use gsb_provider_bigtable::{
    AdminConfig, BigtableBroker, BigtableDynamicPlan, RestInstanceAdmin, instance_information,
};
use gsb_state::{InstanceStore, LocalStore};

#[derive(Parser)]
#[command(name = "gsb")]
#[command(about = "Provision Cloud Bigtable instances through the service broker", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Project that owns the instances
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT", global = true)]
    project_id: Option<String>,

    /// Bigtable Admin API endpoint
    #[arg(long, env = "BIGTABLE_ADMIN_ENDPOINT", default_value = DEFAULT_ENDPOINT, global = true)]
    endpoint: String,

    /// OAuth2 access token for the Admin API
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,

    /// Path to the instance state file
    #[arg(long, default_value = LocalStore::DEFAULT_STATE_FILE, global = true)]
    state: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a Bigtable instance and record it
    Provision {
        /// Service instance id (generated when omitted)
        #[arg(long)]
        instance_id: Option<String>,

        /// Instance parameters as JSON (name, cluster_id, zone, display_name)
        #[arg(long, default_value = "")]
        parameters: String,

        /// Plan features as JSON (num_nodes, storage_type)
        #[arg(long)]
        plan_features: String,

        #[arg(long, default_value = "")]
        plan_id: String,

        #[arg(long, default_value = "")]
        service_id: String,
    },
    /// Delete the Bigtable instance recorded under a service instance id
    Deprovision {
        #[arg(long)]
        instance_id: String,
    },
    /// Show a recorded instance
    Show {
        #[arg(long)]
        instance_id: String,
    },
    /// Print the plan features of a dynamic plan definition
    MapPlan {
        /// Dynamic plan definition as JSON
        #[arg(long)]
        plan: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Provision {
            instance_id,
            parameters,
            plan_features,
            plan_id,
            service_id,
        } => {
            let request = ProvisionDetails {
                service_id,
                plan_id,
                raw_parameters: parameters,
                ..Default::default()
            };
            run_provision(&cli.global, instance_id, request, plan_features).await
        }
        Commands::Deprovision { instance_id } => run_deprovision(&cli.global, &instance_id).await,
        Commands::Show { instance_id } => run_show(&cli.global, &instance_id).await,
        Commands::MapPlan { plan } => run_map_plan(&plan),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn admin_config(global: &GlobalArgs) -> AdminConfig {
    AdminConfig {
        endpoint: global.endpoint.clone(),
        access_token: global.access_token.clone(),
        ..Default::default()
    }
}

fn get_broker(global: &GlobalArgs, store: Arc<LocalStore>) -> Result<BigtableBroker, String> {
    let project_id = global
        .project_id
        .clone()
        .ok_or("--project-id (or GOOGLE_CLOUD_PROJECT) is required")?;

    let admin = Arc::new(RestInstanceAdmin::new(admin_config(global)));
    Ok(BigtableBroker::new(project_id, admin, store))
}

async fn run_provision(
    global: &GlobalArgs,
    instance_id: Option<String>,
    request: ProvisionDetails,
    plan_features: String,
) -> Result<(), String> {
    let store = Arc::new(LocalStore::with_path(global.state.clone()));
    let broker = get_broker(global, store.clone())?;

    let instance_id = instance_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let plan = PlanDetails {
        id: request.plan_id.clone(),
        service_id: request.service_id.clone(),
        features: plan_features,
        ..Default::default()
    };

    println!(
        "{} service instance {}",
        "Provisioning".cyan().bold(),
        instance_id
    );

    let details = broker
        .provision(&instance_id, &request, &plan)
        .await
        .map_err(|e| e.to_string())?
        .for_request(&instance_id, &request);

    debug!("storing record for {} in {}", instance_id, global.state.display());
    store
        .save_instance(&details)
        .await
        .map_err(|e| format!("Instance {} was created but not recorded: {}", details.name, e))?;

    println!(
        "  {} {} ({})",
        "+".green().bold(),
        details.name,
        broker.project_id()
    );
    println!();
    println!("{}", "Provision complete.".green().bold());
    Ok(())
}

async fn run_deprovision(global: &GlobalArgs, instance_id: &str) -> Result<(), String> {
    let store = Arc::new(LocalStore::with_path(global.state.clone()));
    let broker = get_broker(global, store.clone())?;

    match broker
        .deprovision(instance_id, &DeprovisionDetails::default())
        .await
    {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            println!(
                "{}",
                format!("No recorded instance for {}.", instance_id).yellow()
            );
            return Ok(());
        }
        Err(e) => return Err(e.to_string()),
    }

    let removed = store
        .delete_instance(instance_id)
        .await
        .map_err(|e| format!("Failed to remove record: {}", e))?;

    if let Some(record) = removed {
        println!("  {} {}", "-".red().bold(), record.name);
    }
    println!();
    println!("{}", "Deprovision complete.".green().bold());
    Ok(())
}

async fn run_show(global: &GlobalArgs, instance_id: &str) -> Result<(), String> {
    let store = LocalStore::with_path(global.state.clone());
    let record = store
        .find_instance(instance_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("No recorded instance for {}", instance_id))?;

    println!("{}", record.id.bold());
    println!("  {}: {}", "name".cyan(), record.name);
    if !record.plan_id.is_empty() {
        println!("  {}: {}", "plan_id".cyan(), record.plan_id);
    }
    if !record.service_id.is_empty() {
        println!("  {}: {}", "service_id".cyan(), record.service_id);
    }

    let info = instance_information(&record).map_err(|e| e.to_string())?;
    println!("  {}: {}", "instance_id".cyan(), info.instance_id);
    Ok(())
}

fn run_map_plan(plan: &str) -> Result<(), String> {
    let plan: BigtableDynamicPlan =
        serde_json::from_str(plan).map_err(|e| format!("Invalid plan definition: {}", e))?;

    let json = plan.features_json().map_err(|e| e.to_string())?;
    println!("{} {}", plan.name.bold(), json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provision() {
        let cli = Cli::try_parse_from([
            "gsb",
            "--project-id",
            "test-project",
            "provision",
            "--parameters",
            r#"{"name":"mytable"}"#,
            "--plan-features",
            r#"{"num_nodes":"3","storage_type":"SSD"}"#,
        ])
        .unwrap();

        assert_eq!(cli.global.project_id.as_deref(), Some("test-project"));
        assert_eq!(cli.global.state, PathBuf::from("gsb.state.json"));
        match cli.command {
            Commands::Provision {
                instance_id,
                parameters,
                ..
            } => {
                assert!(instance_id.is_none());
                assert_eq!(parameters, r#"{"name":"mytable"}"#);
            }
            other => panic!("Expected Provision, got {:?}", other),
        }
    }

    #[test]
    fn test_provision_requires_plan_features() {
        let result = Cli::try_parse_from(["gsb", "provision"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_admin_config_from_args() {
        let cli = Cli::try_parse_from([
            "gsb",
            "deprovision",
            "--instance-id",
            "instance-1",
            "--endpoint",
            "http://localhost:8086",
            "--access-token",
            "token",
        ])
        .unwrap();

        let config = admin_config(&cli.global);
        assert_eq!(config.endpoint, "http://localhost:8086");
        assert_eq!(config.access_token.as_deref(), Some("token"));
        assert_eq!(config.user_agent, "gcp-service-broker");
    }

    #[test]
    fn test_map_plan_reads_dynamic_plan() {
        let plan = r#"{
            "guid": "plan-guid",
            "name": "ssd-3",
            "num_nodes": "3",
            "storage_type": "SSD",
            "service": "bigtable-service"
        }"#;
        assert!(run_map_plan(plan).is_ok());

        // num_nodes must be a string, and the plan must name its service
        let numeric = r#"{"guid":"g","name":"n","num_nodes":3,"storage_type":"SSD","service":"s"}"#;
        assert!(run_map_plan(numeric).is_err());
        assert!(run_map_plan(r#"{"num_nodes":"3","storage_type":"SSD"}"#).is_err());
    }
}
