//! Directory backup strategy
//!
//! Tars one source directory into the run's backup directory. The archive's
//! internal paths start at the source's base name, and a non-zero tar exit is
//! only a warning: files changing while being read are expected for live data.

use super::{ArchiveContext, ArchiveStrategy};
use crate::config::{expand_tilde, get_effective_excludes, DirectoryJob, GlobalConfig, KeyLayout};
use crate::utils::archive::{archive_file_name, create_tarball, TarRequest};
use crate::utils::dates::PriorDay;
use crate::utils::storage::{join_key, object_key};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub struct DirectoryStrategy<'a> {
    job: &'a DirectoryJob,
    excludes: Vec<String>,
}

impl<'a> DirectoryStrategy<'a> {
    pub fn new(job: &'a DirectoryJob, global: &GlobalConfig) -> Self {
        Self {
            job,
            excludes: get_effective_excludes(job, global),
        }
    }

    /// Base name of the source, ignoring trailing slashes
    fn source_name(&self) -> Option<String> {
        self.source()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }

    fn source(&self) -> PathBuf {
        expand_tilde(&self.job.source)
    }
}

impl ArchiveStrategy for DirectoryStrategy<'_> {
    fn create_archive(&self, ctx: &ArchiveContext<'_>) -> Option<PathBuf> {
        let source = self.source();
        if !source.is_dir() {
            error!("Source directory does not exist: {:?}", source);
            return None;
        }

        let Some(name) = self.source_name() else {
            error!("Cannot derive a name from source directory: {:?}", source);
            return None;
        };
        let parent = source.parent().unwrap_or(Path::new("/"));

        let archive = ctx
            .backup_dir
            .join(archive_file_name(&name, self.job.naming, ctx.now));

        info!("Archiving directory {:?} -> {:?}", source, archive);

        let request = TarRequest {
            archive: &archive,
            working_dir: parent,
            entry: &name,
            excludes: &self.excludes,
            ignore_failed_read: true,
        };

        match create_tarball(ctx.executor, &request, ctx.timeout) {
            Ok(()) => info!("Directory archive complete: {:?}", archive),
            Err(e) => warn!(
                "Archive of {:?} finished with warnings, uploading anyway: {}",
                source, e
            ),
        }

        Some(archive)
    }

    fn object_key(&self, prefix: &str, archive: &Path, now: NaiveDateTime) -> String {
        match (self.job.key_layout, self.source_name()) {
            (KeyLayout::Dated, Some(name)) => {
                let file_name = archive
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let dated = format!("{}/{}/{}", name, PriorDay::before(now).key_path(), file_name);
                join_key(prefix, &dated)
            }
            _ => object_key(prefix, archive),
        }
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}
