use std::fs;
use std::path::PathBuf;

use catapult_core::{CommitStep, CommitTransaction};
use catapult_fq::IndexFile;

use crate::error::RecoveryError;

/// The `commit_step.dat` marker at a data directory's root (§3.3), driving
/// the nine-step sequence of §4.6 and read back by the recovery orchestrator
/// (§4.8 step 1).
pub struct CommitStepMarker {
    index: IndexFile,
}

impl CommitStepMarker {
    pub fn new(data_dir_root: impl Into<PathBuf>) -> Self {
        Self {
            index: IndexFile::new(data_dir_root.into().join("commit_step.dat")),
        }
    }
}

impl CommitTransaction for CommitStepMarker {
    type Error = RecoveryError;

    fn current_step(&self) -> Result<Option<CommitStep>, Self::Error> {
        if !self.index.exists() {
            return Ok(None);
        }
        let value = self.index.get()?;
        CommitStep::from_u64(value)
            .ok_or_else(|| {
                RecoveryError::InvariantViolation(format!(
                    "commit_step.dat holds out-of-range value {value}"
                ))
            })
            .map(Some)
    }

    /// Writes `step`, refusing to move the marker backwards (§4.6: "never
    /// advances the marker backwards"). Absence of a prior marker always
    /// permits the write, matching step 3 of §4.6 where the marker is
    /// created for the first time.
    fn advance_to(&mut self, step: CommitStep) -> Result<(), Self::Error> {
        if let Some(current) = self.current_step()? {
            if step <= current {
                return Err(RecoveryError::InvariantViolation(format!(
                    "commit step cannot move from {current:?} to {step:?}"
                )));
            }
        }
        self.index.set(step.as_u64())?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        if self.index.exists() {
            fs::remove_file(self.index.path())?;
        }
        Ok(())
    }
}
