//! MongoDB backup strategy
//!
//! Handles:
//! - Listing accessible databases through `mongosh`
//! - One `mongodump` per database into `mongo_dump_<timestamp>/<db>`
//! - Archiving the dump root and removing the uncompressed copy

use super::{ArchiveContext, ArchiveStrategy};
use crate::config::{expand_tilde, MongoJob};
use crate::utils::archive::{create_tarball, TarRequest};
use crate::utils::cleanup::clean_up;
use crate::utils::dates::run_timestamp;
use crate::utils::executor::CommandExecutor;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// Script printing one accessible database name per line
const LIST_DATABASES_EVAL: &str = "db.adminCommand({listDatabases: 1, nameOnly: true, authorizedDatabases: true}).databases.forEach(d => print(d.name))";

pub struct MongoStrategy<'a> {
    job: &'a MongoJob,
    password: String,
}

impl<'a> MongoStrategy<'a> {
    /// Resolve the password (inline or from file) for a job
    pub fn new(job: &'a MongoJob) -> Result<Self> {
        let password = match (&job.password, &job.password_file) {
            (Some(p), _) => p.clone(),
            (None, Some(file)) => {
                let path = expand_tilde(file);
                fs::read_to_string(&path)
                    .context(format!("Failed to read MongoDB password file: {:?}", path))?
                    .trim()
                    .to_string()
            }
            (None, None) => anyhow::bail!("MongoDB job has no password configured"),
        };

        Ok(Self { job, password })
    }

    fn connection_args(&self) -> Vec<String> {
        vec![
            "--host".to_string(),
            self.job.host.clone(),
            "--port".to_string(),
            self.job.port.to_string(),
            "--username".to_string(),
            self.job.username.clone(),
            "--password".to_string(),
            self.password.clone(),
            "--authenticationDatabase".to_string(),
            self.job.auth_database.clone(),
        ]
    }

    /// List database names visible to the configured user
    pub fn list_databases(
        &self,
        executor: &dyn CommandExecutor,
        timeout: Option<Duration>,
    ) -> Result<Vec<String>> {
        let mut args = vec!["--quiet".to_string()];
        args.extend(self.connection_args());
        args.push("--eval".to_string());
        args.push(LIST_DATABASES_EVAL.to_string());

        let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        let stdout = executor
            .run_command_stdout("mongosh", &arg_refs, None, timeout)
            .context("Failed to list MongoDB databases")?;

        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .filter(|l| !self.job.skip_databases.iter().any(|s| s == l))
            .map(String::from)
            .collect())
    }

    /// Dump one database into `out_dir`
    fn dump_database(
        &self,
        executor: &dyn CommandExecutor,
        db_name: &str,
        out_dir: &std::path::Path,
        timeout: Option<Duration>,
    ) -> Result<()> {
        fs::create_dir_all(out_dir)
            .context(format!("Failed to create dump directory: {:?}", out_dir))?;

        let mut args = self.connection_args();
        args.push("--db".to_string());
        args.push(db_name.to_string());
        args.push("--out".to_string());
        args.push(out_dir.display().to_string());

        let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        executor.run_command("mongodump", &arg_refs, None, timeout)?;
        Ok(())
    }
}

impl ArchiveStrategy for MongoStrategy<'_> {
    fn create_archive(&self, ctx: &ArchiveContext<'_>) -> Option<PathBuf> {
        let databases = match self.list_databases(ctx.executor, ctx.timeout) {
            Ok(dbs) => dbs,
            Err(e) => {
                error!("Cannot list MongoDB databases: {:#}", e);
                return None;
            }
        };

        if databases.is_empty() {
            warn!("No MongoDB databases to dump, nothing to archive");
            return None;
        }

        info!("Accessible MongoDB databases: {:?}", databases);

        let dump_name = format!("mongo_dump_{}", run_timestamp(ctx.now));
        let dump_dir = ctx.backup_dir.join(&dump_name);

        for db_name in &databases {
            info!("Dumping MongoDB database: {}", db_name);
            match self.dump_database(ctx.executor, db_name, &dump_dir.join(db_name), ctx.timeout) {
                Ok(()) => info!("MongoDB database dumped: {}", db_name),
                Err(e) => error!("MongoDB dump failed for '{}': {:#}", db_name, e),
            }
        }

        let archive = ctx.backup_dir.join(format!("{}.tar.gz", dump_name));
        let request = TarRequest {
            archive: &archive,
            working_dir: ctx.backup_dir,
            entry: &dump_name,
            excludes: &[],
            ignore_failed_read: false,
        };

        info!("Archiving MongoDB dump {:?} -> {:?}", dump_dir, archive);
        if let Err(e) = create_tarball(ctx.executor, &request, ctx.timeout) {
            error!("Failed to archive MongoDB dump: {:#}", e);
            return None;
        }

        clean_up(&[&dump_dir]);
        info!("MongoDB backup archive complete: {:?}", archive);

        Some(archive)
    }

    fn name(&self) -> &'static str {
        "mongodb"
    }
}
