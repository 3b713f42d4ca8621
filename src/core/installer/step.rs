// ─── Install Steps ───
// The pipeline is a fixed sequence of steps, each reporting one of three
// outcomes. The reduction over the sequence is kept in an explicit little
// state machine so the "skip exactly the next step" semantics stay auditable.

/// Outcome of a single install step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Success,
    /// The following step is not executed; execution resumes after it.
    SkipNext,
    /// All remaining steps are skipped and the run fails.
    Failure,
}

/// Identifiers for the ordered pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    DownloadPack,
    UnpackArchive,
    LoadManifest,
    FetchArtifacts,
    PrepareDirectory,
    InstallLoaders,
    MergeModList,
    ReconcileOverrides,
    SaveInstallation,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StepKind::DownloadPack => "download-pack",
            StepKind::UnpackArchive => "unpack-archive",
            StepKind::LoadManifest => "load-manifest",
            StepKind::FetchArtifacts => "fetch-artifacts",
            StepKind::PrepareDirectory => "prepare-directory",
            StepKind::InstallLoaders => "install-loaders",
            StepKind::MergeModList => "merge-mod-list",
            StepKind::ReconcileOverrides => "reconcile-overrides",
            StepKind::SaveInstallation => "save-installation",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Running,
    /// The next step is suppressed, then execution resumes.
    SkippingOne,
    /// A step failed; nothing else runs.
    Aborted,
}

/// Drives the reduction over the step sequence.
#[derive(Debug)]
pub struct StepSequencer {
    state: EngineState,
    failed: bool,
}

impl StepSequencer {
    pub fn new() -> Self {
        Self {
            state: EngineState::Running,
            failed: false,
        }
    }

    /// Whether the next step should execute. Consumes a pending skip.
    pub fn should_run(&mut self) -> bool {
        match self.state {
            EngineState::Running => true,
            EngineState::SkippingOne => {
                self.state = EngineState::Running;
                false
            }
            EngineState::Aborted => false,
        }
    }

    /// Fold a step's outcome into the engine state.
    pub fn record(&mut self, result: StepResult) {
        match result {
            StepResult::Success => {}
            StepResult::SkipNext => self.state = EngineState::SkippingOne,
            StepResult::Failure => {
                self.state = EngineState::Aborted;
                self.failed = true;
            }
        }
    }

    /// True once any executed step failed.
    pub fn failed(&self) -> bool {
        self.failed
    }
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replay a sequence of outcomes and return which positions executed.
    fn executed_positions(outcomes: &[StepResult]) -> Vec<usize> {
        let mut seq = StepSequencer::new();
        let mut ran = Vec::new();
        for (i, outcome) in outcomes.iter().enumerate() {
            if !seq.should_run() {
                continue;
            }
            ran.push(i);
            seq.record(*outcome);
        }
        ran
    }

    #[test]
    fn all_successes_run_everything() {
        let ran = executed_positions(&[StepResult::Success; 5]);
        assert_eq!(ran, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn failure_short_circuits_the_rest() {
        let ran = executed_positions(&[
            StepResult::Success,
            StepResult::Failure,
            StepResult::Success,
            StepResult::Success,
        ]);
        assert_eq!(ran, vec![0, 1]);

        let mut seq = StepSequencer::new();
        seq.record(StepResult::Failure);
        assert!(seq.failed());
    }

    #[test]
    fn skip_next_suppresses_exactly_one_step() {
        let ran = executed_positions(&[
            StepResult::SkipNext,
            StepResult::Success, // skipped
            StepResult::Success,
            StepResult::Success,
        ]);
        assert_eq!(ran, vec![0, 2, 3]);
    }

    #[test]
    fn skipped_step_counts_as_success() {
        let mut seq = StepSequencer::new();
        seq.record(StepResult::SkipNext);
        assert!(!seq.should_run());
        assert!(!seq.failed());
        // Execution resumes normally afterwards.
        assert!(seq.should_run());
    }

    #[test]
    fn failure_after_a_skip_still_aborts() {
        let ran = executed_positions(&[
            StepResult::SkipNext,
            StepResult::Success, // skipped
            StepResult::Failure,
            StepResult::Success,
        ]);
        assert_eq!(ran, vec![0, 2]);
    }
}
