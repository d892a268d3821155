use std::process::ExitCode;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use modsync_cli::settings::{default_settings_path, user_data_dir};
use modsync_cli::{console, load_settings, CliError, EXIT_OK};
use modsync_infra::{OsPrivilegeProbe, PrivilegeProbe, SftpTransferClient};
use modsync_pipeline::{EventSink, SyncStats};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Mirror the mod server's directory into the local mods folder.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,
    /// Settings file to use instead of the per-user settings.json
    #[arg(long)]
    config: Option<Utf8PathBuf>,
    /// Server password, overrides the settings file
    #[arg(long, env = "MODSYNC_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Exit without waiting for a keypress
    #[arg(long)]
    no_wait: bool,
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")
}

async fn sync(
    cli: &Cli,
    privileges: &dyn PrivilegeProbe,
    cancel: CancellationToken,
) -> Result<SyncStats, CliError> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => default_settings_path()?,
    };
    let settings = load_settings(&path, cli.password.clone(), privileges)?;

    let req = settings.sync_request(&user_data_dir()?);
    let client = SftpTransferClient::new(settings.sftp_options());
    info!("Using settings {path}, local directory {}", req.local_root);

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = console::spawn_printer(rx);

    let result = modsync_pipeline::run(
        req,
        Box::new(client),
        privileges,
        EventSink::new(tx),
        cancel,
    )
    .await;

    if let Err(e) = printer.await {
        error!("Console printer failed: {e}");
    }
    Ok(result?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{e:#}");
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping sync");
                cancel.cancel();
            }
        });
    }

    let code = match sync(&cli, &OsPrivilegeProbe, cancel).await {
        Ok(stats) => {
            debug!("Finished with {stats:?}");
            EXIT_OK
        }
        Err(e) => {
            debug!("Sync failed: {e:?}");
            println!("{}", e.console_message());
            e.exit_code()
        }
    };

    if cli.no_wait || !console::stdin_is_interactive() {
        println!("Operation completed.");
    } else {
        println!("Operation completed. Press any key to exit.");
        match tokio::task::spawn_blocking(console::wait_for_keypress).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Could not read keypress: {e}"),
            Err(e) => warn!("Keypress task failed: {e}"),
        }
    }

    ExitCode::from(code)
}
