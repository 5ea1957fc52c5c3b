use anyhow::Result;
use bucket_backup::config::{self, Config, JobConfig};
use bucket_backup::managers::{self, backup::BackupManager};
use bucket_backup::utils::{self, RealExecutor, S3Store};
use bucket_backup::RunOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "bucket-backup")]
#[command(about = "Uploads prior-day logs, directory archives and MongoDB dumps to S3", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/bucket-backup/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload prior-day logs and run all enabled jobs (or a single job)
    Run {
        /// Specific job to run (defaults to all enabled jobs)
        #[arg(short, long)]
        job: Option<String>,

        /// Do not upload prior-day log files
        #[arg(long)]
        skip_logs: bool,

        /// Exit with a non-zero status if anything failed
        #[arg(long)]
        strict: bool,
    },

    /// Upload prior-day log files only
    Logs {
        /// Exit with a non-zero status if anything failed
        #[arg(long)]
        strict: bool,
    },

    /// List configured log sets and jobs
    List,

    /// Validate configuration file and required tools
    Validate,

    /// Install the cron job that runs all backups
    Setup {
        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,

        /// Remove the cron job instead of installing it
        #[arg(long)]
        remove: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let config = match config::load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            managers::logging::init_console_logging();
            eprintln!("✗ Failed to load {}: {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Commands::Run {
        job: None,
        skip_logs: false,
        strict: false,
    });

    match command {
        Commands::Run { job, skip_logs, strict } => {
            let _log_guard = init_file_logging(&config);
            let options = RunOptions {
                job,
                skip_logs,
                skip_jobs: false,
            };
            run_backup(config, &options, strict)?;
        }

        Commands::Logs { strict } => {
            let _log_guard = init_file_logging(&config);
            let options = RunOptions {
                job: None,
                skip_logs: false,
                skip_jobs: true,
            };
            run_backup(config, &options, strict)?;
        }

        Commands::List => {
            print_list(&config);
        }

        Commands::Validate => {
            managers::logging::init_console_logging();
            if !validate_tools(&config) {
                std::process::exit(1);
            }
            println!("✓ Configuration is valid: {}", cli.config.display());
        }

        Commands::Setup { dry_run, remove } => {
            managers::logging::init_console_logging();
            if remove {
                utils::cron::remove_cron_job()?;
                println!("✓ Cron job removed");
            } else {
                let config_path = std::fs::canonicalize(&cli.config).unwrap_or(cli.config.clone());
                let log_dir = config::expand_tilde(&config.global.log_directory);
                utils::cron::install_cron_job(&config.global.schedule, &config_path, &log_dir, dry_run)?;
                if !dry_run {
                    println!("✓ Cron job installed: {}", config.global.schedule);
                }
            }
        }
    }

    Ok(())
}

/// Console plus daily file logging; the caller keeps the guard alive
fn init_file_logging(config: &Config) -> managers::logging::LogGuard {
    let logging_config = managers::logging::LoggingConfig::from_config(
        &config.global.log_directory,
        &config.global.log_level,
        config.global.log_max_files,
    );
    managers::logging::init_logging(&logging_config)
}

fn run_backup(config: Config, options: &RunOptions, strict: bool) -> Result<()> {
    let store = S3Store::from_config(&config.storage)?;
    let manager = BackupManager::new(config, Arc::new(RealExecutor::new()), Arc::new(store));

    let summary = manager.run(options)?;

    println!(
        "Backup finished: {} uploaded, {} failed, {} skipped",
        summary.uploaded, summary.failed, summary.skipped
    );
    for failure in &summary.failures {
        println!("  ✗ {}", failure);
    }

    if strict && summary.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_list(config: &Config) {
    println!("Bucket: {}", config.storage.bucket);
    println!();

    println!("Log sets:");
    for (name, set) in &config.log_sets {
        println!("  {}", name);
        println!("    Enabled: {}", set.enabled);
        println!("    Base: {}", set.base.display());
        println!("    Subdirs: {}", set.subdirs.join(", "));
        println!("    Prefix: {}", set.prefix);
        println!("    Match: {:?}", set.match_mode);
        println!();
    }

    println!("Jobs:");
    for (name, job) in &config.jobs {
        println!("  {} ({})", name, job.kind());
        if !job.description().is_empty() {
            println!("    Description: {}", job.description());
        }
        println!("    Enabled: {}", job.enabled());
        match job {
            JobConfig::Directory(dir) => {
                println!("    Source: {}", dir.source.display());
                if !dir.excludes.is_empty() {
                    println!("    Excludes: {}", dir.excludes.join(", "));
                }
            }
            JobConfig::Mongodb(mongo) => {
                println!("    Server: {}:{} (auth db {})", mongo.host, mongo.port, mongo.auth_database);
            }
        }
        println!("    Prefix: {}", job.prefix());
        println!();
    }
}

/// Check that the external tools required by enabled jobs are on PATH
fn validate_tools(config: &Config) -> bool {
    let mut required: Vec<&str> = Vec::new();
    for job in config.jobs.values().filter(|j| j.enabled()) {
        required.push("tar");
        if matches!(job, JobConfig::Mongodb(_)) {
            required.push("mongosh");
            required.push("mongodump");
        }
    }
    required.sort_unstable();
    required.dedup();

    let mut ok = true;
    for tool in required {
        match which::which(tool) {
            Ok(path) => println!("✓ {} found at {}", tool, path.display()),
            Err(_) => {
                eprintln!("✗ {} not found in PATH", tool);
                ok = false;
            }
        }
    }
    ok
}
