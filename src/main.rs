use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use boot_dashboard::pages::{BackendDate, boot, boot_job, job};
use boot_dashboard::{BackendConfig, Board, Dispatcher, PageContext};

/// bootboard - load build and boot report dashboards from the backend
#[derive(Parser)]
#[command(name = "bootboard", version, about)]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, env = "DASHBOARD_BACKEND_URL", global = true)]
    backend_url: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Boot reports of a job, with PASS/FAIL counts per kernel
    BootJob {
        /// Job (tree) to load, e.g. "mainline"
        #[arg(short, long, env = "DASHBOARD_JOB")]
        job: String,

        /// Only include reports from the last N days
        #[arg(short, long, env = "DASHBOARD_DATE_RANGE")]
        date_range: Option<u32>,
    },
    /// Build and defconfig totals of a job, with its builds
    Job {
        /// Job (tree) to load
        #[arg(short, long, env = "DASHBOARD_JOB")]
        job: String,

        /// Days to cover (default 15)
        #[arg(short, long, env = "DASHBOARD_DATE_RANGE")]
        date_range: Option<u32>,
    },
    /// Detail of one boot report
    Boot {
        #[arg(long)]
        board: String,
        #[arg(short, long)]
        job: String,
        #[arg(short, long)]
        kernel: String,
        #[arg(long)]
        defconfig: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,boot_dashboard=info",
        1 => "info,boot_dashboard=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

fn page_context(job: String, date_range: Option<u32>) -> PageContext {
    let ctx = PageContext::new(job);
    match date_range {
        Some(days) => ctx.with_date_range(days),
        None => ctx,
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = BackendConfig::load(cli.backend_url)?;
    tracing::debug!(backend = %config.backend_url, batch_path = %config.batch_path, "loaded configuration");

    let dispatcher = Dispatcher::from_config(&config)?;
    let board = Board::new();

    match cli.command {
        Command::BootJob { job, date_range } => {
            let ctx = page_context(job, date_range);
            let result = boot_job::load(&dispatcher, &ctx, &board).await;
            print!("{}", board.render());

            let page = result?;
            for (i, kernel) in page.kernels.iter().enumerate() {
                let created = kernel
                    .created_at()
                    .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string());
                let pass = board
                    .get(&boot_job::success_target(i))
                    .map_or_else(String::new, |c| c.text().to_string());
                let fail = board
                    .get(&boot_job::fail_target(i))
                    .map_or_else(String::new, |c| c.text().to_string());
                println!("{:<40} {created:>10} pass {pass:>5} fail {fail:>5}", kernel.kernel);
            }
        }
        Command::Job {
            job: name,
            date_range,
        } => {
            let ctx = page_context(name, date_range);
            let result = job::load(&dispatcher, &ctx, &board).await;
            print!("{}", board.render());

            for build in result?.builds {
                let created = build
                    .created_on
                    .and_then(BackendDate::to_utc)
                    .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string());
                println!(
                    "{:<40} {:<20} {:<12} {created:>10} {}",
                    build.kernel,
                    build.metadata.git_branch.as_deref().unwrap_or("-"),
                    build.metadata.git_commit.as_deref().unwrap_or("-"),
                    build.status.as_deref().unwrap_or("UNKNOWN"),
                );
            }
        }
        Command::Boot {
            board: board_name,
            job,
            kernel,
            defconfig,
        } => {
            let id = boot::BootId::new(board_name, job, kernel, defconfig);
            let result = boot::load(&dispatcher, &id, &board).await;
            print!("{}", board.render());
            result?;
        }
    }

    Ok(())
}
