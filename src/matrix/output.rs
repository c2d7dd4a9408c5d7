//! Record of completed build jobs.

use super::{Arch, BuildJob};

/// Append-only arena of completed build jobs.
///
/// Jobs are keyed by (platform, arch) and iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    jobs: Vec<BuildJob>,
}

impl BuildOutput {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed job; a repeated key replaces its output directory
    pub fn record(&mut self, job: BuildJob) {
        match self
            .jobs
            .iter_mut()
            .find(|j| j.platform == job.platform && j.arch == job.arch)
        {
            Some(existing) => existing.output_dir = job.output_dir,
            None => self.jobs.push(job),
        }
    }

    /// Look up the job built for (platform, arch)
    pub fn get(&self, platform: &str, arch: &Arch) -> Option<&BuildJob> {
        self.jobs
            .iter()
            .find(|j| j.platform == platform && &j.arch == arch)
    }

    /// Completed jobs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &BuildJob> {
        self.jobs.iter()
    }

    /// Number of recorded jobs
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether nothing was built
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
