use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use utils::version;

use crate::config::daemon::DaemonArgs;

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the cluster watcher daemon
    Daemon(Box<DaemonArgs>),
    /// Print the clusters the daemon would watch
    #[command(name = "show-clusters")]
    ShowClusters(ShowClustersArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ShowClustersArgs {
    #[arg(
        long,
        env = "CLUSTER_STORE_PATH",
        value_hint = clap::ValueHint::FilePath,
        help = "YAML or JSON file listing the registered clusters"
    )]
    pub cluster_store: PathBuf,
}
