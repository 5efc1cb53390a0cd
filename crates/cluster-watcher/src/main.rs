use anyhow::Result;
use clap::Parser;
use cluster_watcher::app::ApplicationBuilder;
use cluster_watcher::config::Cli;
use cluster_watcher::config::Commands;
use cluster_watcher::config::DaemonArgs;
use cluster_watcher::config::ShowClustersArgs;
use cluster_watcher::infrastructure::ClusterStore;
use cluster_watcher::infrastructure::FileClusterStore;
use utils::logging;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon(daemon_args) => run_daemon(*daemon_args).await,
        Commands::ShowClusters(show_clusters_args) => run_show_clusters(show_clusters_args).await,
    }
}

async fn run_daemon(daemon_args: DaemonArgs) -> Result<()> {
    let _guard = logging::init();

    tracing::info!("Starting cluster watcher daemon {}", &**version::VERSION);

    let app = ApplicationBuilder::new(daemon_args).build()?;

    app.run().await?;
    app.shutdown().await?;

    Ok(())
}

async fn run_show_clusters(args: ShowClustersArgs) -> Result<()> {
    let _guard = logging::init();

    let store = FileClusterStore::new(args.cluster_store.clone());
    let mut clusters = store
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load clusters: {e:?}"))?;
    for cluster in &mut clusters {
        cluster.token = "<redacted>".to_string();
    }

    tracing::info!(
        "{} clusters registered in {}",
        clusters.len(),
        args.cluster_store.display()
    );
    print!("{}", serde_yaml::to_string(&clusters)?);
    Ok(())
}
