use anyhow::anyhow;
use clap::Parser;
use gridctl::{ControlConfig, ControlError, EXIT_CODE_UNEXPECTED_ERROR, start_control};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gridctl")]
#[command(about = "Cluster activation and baseline topology control")]
#[command(after_help = "Commands:\n  \
    --activate | --deactivate | --state\n  \
    --baseline [add|remove|set <id>[,<id>...]]\n  \
    --baseline version <n>")]
struct Cli {
    /// Directory holding the cluster metastore
    #[arg(long, default_value = "gridctl-work")]
    work_dir: PathBuf,

    /// Number of replaced baseline versions retained for restore
    #[arg(long, default_value_t = gridctl::baseline::DEFAULT_HISTORY_SIZE)]
    history_size: usize,

    /// Consistent IDs of the server nodes currently online (comma-separated).
    /// Remembered nodes missing from the list are treated as offline.
    #[arg(long, value_delimiter = ',')]
    online: Option<Vec<String>>,

    /// Control command and its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 1..
    )]
    command: Vec<String>,
}

fn exit_on_startup_error(err: ControlError, work_dir: &Path) -> ! {
    let message = anyhow!("{}", err.detail())
        .context(format!("Failed to start cluster in '{}'", work_dir.display()));
    eprintln!("Error [{}]: {:#}", err.kind(), message);
    std::process::exit(EXIT_CODE_UNEXPECTED_ERROR);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = ControlConfig::new()
        .work_dir(&cli.work_dir)
        .history_size(cli.history_size);
    let (_cluster, handler) = match start_control(config, cli.online.as_deref()).await {
        Ok(started) => started,
        Err(err) => exit_on_startup_error(err, &cli.work_dir),
    };

    let code = handler.execute(&cli.command[..]).await;
    std::process::exit(code);
}
