use anyhow::{bail, Context, Result};
use ephemeral_cluster::artifacts::{ArtifactResolver, ArtifactsApi, Platform, PluginSpec, Product};
use ephemeral_cluster::cli::commands::{
    CheckVersionCommand, ProvisionCommand, ResolveCommand, ValidateCommand,
};
use ephemeral_cluster::cli::output::*;
use ephemeral_cluster::cli::{Cli, Command};
use ephemeral_cluster::cluster::{
    ClusterConfig, CommandRunner, EphemeralCluster, NodeFileSystem, ReqwestHttp,
};
use ephemeral_cluster::tasks::{TaskPipeline, TaskState};
use ephemeral_cluster::version;
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose when set
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder().with_max_level(log_level);
    let installed = match EnvFilter::try_from_default_env() {
        Ok(filter) => tracing::subscriber::set_global_default(builder.with_env_filter(filter).finish()),
        Err(_) => tracing::subscriber::set_global_default(builder.finish()),
    };
    installed.context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Resolve(cmd) => resolve_artifacts(cmd).await?,
        Command::Validate(cmd) => validate_config(cmd)?,
        Command::Provision(cmd) => provision(cmd).await?,
        Command::CheckVersion(cmd) => check_version(cmd).await?,
    }

    Ok(())
}

async fn resolve_artifacts(cmd: &ResolveCommand) -> Result<()> {
    let api = Arc::new(ArtifactsApi::new(Default::default())?);
    let Some(version) = version::parse(&cmd.version, api.as_ref()).await? else {
        bail!("No version given");
    };

    let mut resolver = ArtifactResolver::from_api(api);
    if let Some(platform) = &cmd.platform {
        let platform = Platform::parse(platform)
            .with_context(|| format!("Unknown platform: {}", platform))?;
        resolver = resolver.with_platform(platform);
    }

    println!(
        "{} {} is a {} version",
        INFO,
        style(&version).bold(),
        style(version.provenance()).cyan()
    );

    let mut products = vec![Product::Server(cmd.server_type.into())];
    products.extend(cmd.plugin.iter().map(|p| Product::Plugin(PluginSpec::known(p))));

    let mut descriptors = Vec::with_capacity(products.len());
    for product in &products {
        let descriptor = version
            .artifact(product, &resolver)
            .await
            .with_context(|| format!("Failed to resolve {}", product))?;
        descriptors.push(descriptor);
    }

    if cmd.json {
        let data: Vec<_> = descriptors.iter().map(|d| d.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        for descriptor in &descriptors {
            println!("{}", format_descriptor(descriptor));
        }
    }

    Ok(())
}

fn validate_config(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating cluster configuration...", INFO);

    match ClusterConfig::from_file(&cmd.file) {
        Ok(config) => {
            println!("{} Cluster configuration is valid!", CHECK);
            println!("  Version: {}", style(&config.version).bold());
            println!("  Server: {}", style(config.server_type).cyan());
            println!("  Home: {}", style(config.home.display()).dim());
            println!("  Plugins: {}", style(config.plugins.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

/// Load the config file and assemble the cluster context it describes
async fn load_cluster(file: &str) -> Result<EphemeralCluster> {
    let config = ClusterConfig::from_file(file).context("Failed to load cluster config")?;

    let api = Arc::new(ArtifactsApi::new(config.artifacts.clone())?);
    let Some(version) = version::parse(&config.version, api.as_ref())
        .await
        .context("Failed to parse version")?
    else {
        bail!("No version configured");
    };
    println!(
        "{} {} {} ({})",
        INFO,
        style(config.server_type).bold(),
        style(&version).cyan(),
        version.provenance()
    );

    let file_system = NodeFileSystem::new(config.server_type, config.home.clone(), config.local_folder());
    let http = ReqwestHttp::for_node(config.http_port, config.enable_ssl)?;
    Ok(EphemeralCluster::new(
        config.to_configuration(version),
        file_system,
        ArtifactResolver::from_api(api),
        Arc::new(CommandRunner::new()),
        Arc::new(http),
    ))
}

async fn run_pipeline(mut pipeline: TaskPipeline, cluster: &EphemeralCluster) -> Result<()> {
    pipeline.add_event_handler(|event| println!("{}", format_pipeline_event(&event)));

    match pipeline.run(cluster).await {
        Ok(run) => {
            println!();
            for report in &run.reports {
                println!("  {}", format_task_report(report));
            }
            let skipped = run
                .reports
                .iter()
                .filter(|r| matches!(r.state, TaskState::Skipped { .. }))
                .count();
            println!(
                "\n{} {} {} ({} skipped)",
                CHECK,
                style(pipeline.name()).bold(),
                format_status(run.status),
                skipped
            );
            Ok(())
        }
        Err(e) => {
            println!("\n{} {} {}", CROSS, style(pipeline.name()).bold(), style("failed").red());
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn provision(cmd: &ProvisionCommand) -> Result<()> {
    let cluster = load_cluster(&cmd.file).await?;
    if !cluster.file_system.home.is_dir() {
        bail!(
            "Node home {} does not exist; extract the server distribution there first",
            cluster.file_system.home.display()
        );
    }
    run_pipeline(TaskPipeline::installation(), &cluster).await
}

async fn check_version(cmd: &CheckVersionCommand) -> Result<()> {
    let cluster = load_cluster(&cmd.file).await?;
    run_pipeline(TaskPipeline::validation(), &cluster).await
}
