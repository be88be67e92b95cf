use crate::artifact::ArtifactStore;
use crate::collaborator::{
    parse_ticket_specs, ContentGenerator, IssueTracker, PromptContext, TemplateGenerator, Ticket,
    TicketId,
};
use crate::config::Config;
use crate::error::{Result, WorkflowError};
use crate::io;
use crate::paths;
use crate::rules::ValidationReport;
use crate::stage::StageGraph;
use crate::state::WorkflowState;
use crate::types::{Stage, StageKey, StageStatus};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// StageOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StageOutcome {
    pub key: StageKey,
    pub status: StageStatus,
    pub report: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tickets: Vec<TicketId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_error: Option<String>,
}

// ---------------------------------------------------------------------------
// WorkflowEngine
// ---------------------------------------------------------------------------

/// Orchestrates stage execution: prerequisite resolution, content
/// generation, artifact storage, checklist validation, and the sprint
/// counter. Owns `WorkflowState` exclusively. `run_stage` and
/// `advance_sprint` take `&mut self`, so at most one is in flight per
/// engine instance; across processes the persisted in-progress record
/// rejects interleaved runs.
pub struct WorkflowEngine {
    root: PathBuf,
    state: WorkflowState,
    config: Config,
    store: ArtifactStore,
    graph: StageGraph,
    generator: Box<dyn ContentGenerator>,
    tracker: Option<Box<dyn IssueTracker>>,
}

impl WorkflowEngine {
    /// Scaffold `.prodflow/` with a fresh config and state. Idempotent
    /// unless `force`, which resets both files.
    pub fn init(root: &Path, project: &str, force: bool) -> Result<()> {
        paths::validate_project_name(project)?;
        io::ensure_dir(&paths::prodflow_dir(root))?;
        io::ensure_dir(&paths::docs_dir(root))?;
        io::ensure_dir(&root.join(paths::SPRINTS_DIR))?;

        let config_path = paths::config_path(root);
        let state_path = paths::state_path(root);
        if force {
            Config::new(project).save(root)?;
            WorkflowState::new(project).save(root)?;
        } else {
            if !config_path.exists() {
                Config::new(project).save(root)?;
            }
            if !state_path.exists() {
                WorkflowState::new(project).save(root)?;
            }
        }
        Ok(())
    }

    /// Open an initialized project with the default template generator
    /// and no issue tracker.
    pub fn open(root: &Path) -> Result<Self> {
        let state = WorkflowState::load(root)?;
        let config = Config::load(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            store: ArtifactStore::new(root),
            graph: StageGraph::standard(),
            generator: Box::new(TemplateGenerator),
            tracker: None,
            state,
            config,
        })
    }

    pub fn with_generator(mut self, generator: Box<dyn ContentGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_tracker(mut self, tracker: Box<dyn IssueTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    // ---------------------------------------------------------------------------
    // Key resolution
    // ---------------------------------------------------------------------------

    /// Resolve a stage plus optional sprint override into a concrete
    /// instance key. Sprint-scoped stages default to the current sprint;
    /// future sprint indexes are rejected.
    pub fn resolve_key(&self, stage: Stage, sprint: Option<u32>) -> Result<StageKey> {
        if !stage.is_sprint_scoped() {
            return StageKey::new(stage, sprint);
        }
        let n = sprint.unwrap_or(self.state.sprint);
        if n == 0 {
            return Err(WorkflowError::Sequence(
                "sprint indexes start at 1".to_string(),
            ));
        }
        if n > self.state.sprint {
            return Err(WorkflowError::Sequence(format!(
                "sprint {n} is not yet unlocked (current sprint: {})",
                self.state.sprint
            )));
        }
        StageKey::new(stage, Some(n))
    }

    /// First prerequisite instance of `key` that is not completed, in
    /// declaration order. Sprint-plan additionally requires the previous
    /// sprint's review.
    fn first_missing_prerequisite(&self, key: &StageKey) -> Option<StageKey> {
        let mut required: Vec<StageKey> = self
            .graph
            .transitive_prerequisites(key.stage)
            .into_iter()
            .map(|p| match (p.is_sprint_scoped(), key.sprint) {
                (true, Some(n)) => StageKey::sprint_scoped(p, n),
                _ => StageKey::one_shot(p),
            })
            .collect();
        if key.stage == Stage::SprintPlan {
            if let Some(n) = key.sprint {
                if n > 1 {
                    required.push(StageKey::sprint_scoped(Stage::Review, n - 1));
                }
            }
        }
        required
            .into_iter()
            .find(|k| self.state.status_of(k) != StageStatus::Completed)
    }

    // ---------------------------------------------------------------------------
    // Stage execution
    // ---------------------------------------------------------------------------

    /// Execute one stage instance end to end. Every return path leaves
    /// the persisted state at `Completed` or `Failed`, never `InProgress`.
    pub fn run_stage(
        &mut self,
        stage: Stage,
        sprint: Option<u32>,
        force: bool,
    ) -> Result<StageOutcome> {
        let key = self.resolve_key(stage, sprint)?;
        if let Some(stuck) = self.state.in_progress() {
            return Err(WorkflowError::StageInProgress(stuck.key.to_string()));
        }
        if let Some(missing) = self.first_missing_prerequisite(&key) {
            return Err(WorkflowError::Prerequisite {
                stage: key.to_string(),
                missing: missing.to_string(),
            });
        }

        let prior = self.state.status_of(&key);
        if prior == StageStatus::Completed && self.store.exists(&key) && !force {
            return Err(WorkflowError::ArtifactExists(key.to_string()));
        }

        debug!(stage = %key, "stage started");
        self.state
            .record(key, StageStatus::InProgress, None, "started");
        self.state.save(&self.root)?;

        // A failed run's artifact is superseded, never merged into.
        if prior == StageStatus::Failed {
            if let Err(e) = self.store.discard(&key) {
                self.fail(key, None, &e.to_string());
                return Err(e);
            }
        }

        let ctx = PromptContext {
            stage: key.stage,
            sprint: key.sprint,
            project: &self.state.project,
            config: &self.config,
        };
        let content = match self.generator.generate(&ctx) {
            Ok(content) => content,
            Err(e) => {
                self.fail(key, None, &e.to_string());
                return Err(e);
            }
        };

        if let Err(e) = self.store.put(&key, &content) {
            self.fail(key, None, &e.to_string());
            return Err(e);
        }

        let checklist = match self.graph.definition(key.stage) {
            Some(def) => &def.checklist,
            None => return Err(WorkflowError::InvalidStage(key.stage.to_string())),
        };
        let report = checklist.evaluate(&content);
        if !report.passed() {
            let failures = report.required_failures();
            self.fail(key, Some(report), "validation failed");
            return Err(WorkflowError::Validation {
                stage: key.to_string(),
                failures,
            });
        }

        debug!(stage = %key, "stage completed");
        self.state
            .record(key, StageStatus::Completed, Some(report.clone()), "validated");
        self.state.save(&self.root)?;

        // Ticket sync runs after completion is recorded: a tracker outage
        // never rolls back a validated artifact.
        let mut tickets = Vec::new();
        let mut ticket_error = None;
        if key.stage == Stage::IssueGeneration {
            if let Some(tracker) = &self.tracker {
                for spec in parse_ticket_specs(&content) {
                    match tracker.create_ticket(&spec) {
                        Ok(id) => tickets.push(id),
                        Err(e) => {
                            ticket_error = Some(e.to_string());
                            break;
                        }
                    }
                }
            }
        }

        Ok(StageOutcome {
            key,
            status: StageStatus::Completed,
            report: Some(report),
            tickets,
            ticket_error,
        })
    }

    /// Record a failure and persist it. A save error here is logged
    /// rather than propagated so the caller's original failure stays
    /// intact.
    fn fail(&mut self, key: StageKey, report: Option<ValidationReport>, outcome: &str) {
        debug!(stage = %key, outcome, "stage failed");
        self.state.record(key, StageStatus::Failed, report, outcome);
        if let Err(e) = self.state.save(&self.root) {
            warn!(stage = %key, error = %e, "could not persist failure record");
        }
    }

    /// Caller-driven cancellation of an in-progress stage instance, e.g.
    /// one left behind by an interrupted run.
    pub fn abandon(&mut self, stage: Stage, sprint: Option<u32>) -> Result<()> {
        let key = self.resolve_key(stage, sprint)?;
        if self.state.status_of(&key) != StageStatus::InProgress {
            return Err(WorkflowError::Sequence(format!(
                "stage '{key}' is not in progress"
            )));
        }
        debug!(stage = %key, "stage abandoned");
        self.state.record(key, StageStatus::Failed, None, "abandoned");
        self.state.save(&self.root)
    }

    // ---------------------------------------------------------------------------
    // Ticket sync
    // ---------------------------------------------------------------------------

    /// Re-sync tickets from the stored issue-generation artifact
    /// without regenerating it. The stage instance must already be
    /// completed; tracker failures surface as `Collaborator` and leave
    /// the artifact untouched.
    pub fn sync_tickets(&self, sprint: Option<u32>) -> Result<Vec<TicketId>> {
        let key = self.resolve_key(Stage::IssueGeneration, sprint)?;
        if self.state.status_of(&key) != StageStatus::Completed {
            return Err(WorkflowError::Sequence(format!(
                "cannot sync tickets: {key} is not completed"
            )));
        }
        let tracker = self.tracker.as_deref().ok_or_else(|| {
            WorkflowError::Collaborator("no issue tracker configured".to_string())
        })?;
        let artifact = self.store.get(&key)?;
        let mut tickets = Vec::new();
        for spec in parse_ticket_specs(&artifact.content) {
            tickets.push(tracker.create_ticket(&spec)?);
        }
        debug!(stage = %key, count = tickets.len(), "tickets synced");
        Ok(tickets)
    }

    /// Open tickets from the configured tracker; empty when none is
    /// set.
    pub fn open_tickets(&self) -> Result<Vec<Ticket>> {
        match &self.tracker {
            Some(tracker) => tracker.list_open(),
            None => Ok(Vec::new()),
        }
    }

    // ---------------------------------------------------------------------------
    // Sprint advancement
    // ---------------------------------------------------------------------------

    /// Advance the sprint counter. Only legal once the current sprint's
    /// review is completed; unlocks sprint-plan for the next index.
    pub fn advance_sprint(&mut self) -> Result<u32> {
        let current = self.state.sprint;
        let review = StageKey::sprint_scoped(Stage::Review, current);
        if self.state.status_of(&review) != StageStatus::Completed {
            return Err(WorkflowError::Sequence(format!(
                "cannot advance: {review} is not completed"
            )));
        }
        let next = self.state.advance_sprint();
        self.state.save(&self.root)?;
        self.config.sprints.current = next;
        self.config.save(&self.root)?;
        debug!(sprint = next, "sprint advanced");
        Ok(next)
    }

    // ---------------------------------------------------------------------------
    // Re-validation
    // ---------------------------------------------------------------------------

    /// Re-evaluate a stored artifact against its stage checklist without
    /// touching workflow state.
    pub fn check_stage(&self, stage: Stage, sprint: Option<u32>) -> Result<(StageKey, ValidationReport)> {
        let key = self.resolve_key(stage, sprint)?;
        let artifact = self.store.get(&key)?;
        let checklist = match self.graph.definition(key.stage) {
            Some(def) => &def.checklist,
            None => return Err(WorkflowError::InvalidStage(key.stage.to_string())),
        };
        Ok((key, checklist.evaluate(&artifact.content)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::doubles::{RecordingTracker, StaticGenerator};
    use tempfile::TempDir;

    fn engine(dir: &TempDir) -> WorkflowEngine {
        WorkflowEngine::init(dir.path(), "shop", false).unwrap();
        WorkflowEngine::open(dir.path()).unwrap()
    }

    fn complete_one_shots(engine: &mut WorkflowEngine) {
        for stage in [Stage::Prd, Stage::Architecture, Stage::RepoInit] {
            engine.run_stage(stage, None, false).unwrap();
        }
    }

    fn complete_sprint(engine: &mut WorkflowEngine) {
        for stage in [
            Stage::SprintPlan,
            Stage::SprintTech,
            Stage::IssueGeneration,
            Stage::Implementation,
            Stage::Review,
        ] {
            engine.run_stage(stage, None, false).unwrap();
        }
    }

    #[test]
    fn prd_runs_with_template_generator() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        let outcome = engine.run_stage(Stage::Prd, None, false).unwrap();
        assert_eq!(outcome.status, StageStatus::Completed);
        assert!(engine.store().exists(&StageKey::one_shot(Stage::Prd)));
    }

    #[test]
    fn prerequisite_error_names_first_missing_in_declaration_order() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        engine.run_stage(Stage::Prd, None, false).unwrap();
        engine.run_stage(Stage::Architecture, None, false).unwrap();
        // repo-init deliberately not run
        let err = engine.run_stage(Stage::SprintPlan, None, false).unwrap_err();
        match err {
            WorkflowError::Prerequisite { stage, missing } => {
                assert_eq!(stage, "sprint-plan@1");
                assert_eq!(missing, "repo-init");
            }
            other => panic!("expected Prerequisite, got {other:?}"),
        }
    }

    #[test]
    fn prerequisite_failure_leaves_state_untouched() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        let _ = engine.run_stage(Stage::Review, None, false).unwrap_err();
        let key = StageKey::sprint_scoped(Stage::Review, 1);
        assert_eq!(engine.state().status_of(&key), StageStatus::NotStarted);
    }

    #[test]
    fn validation_failure_reports_full_list_and_records_failed() {
        let dir = TempDir::new().unwrap();
        let mut engine =
            engine(&dir).with_generator(Box::new(StaticGenerator::ok("just prose, no headings")));
        let err = engine.run_stage(Stage::Prd, None, false).unwrap_err();
        match err {
            WorkflowError::Validation { stage, failures } => {
                assert_eq!(stage, "prd");
                let names: Vec<&str> = failures.iter().map(|f| f.rule.as_str()).collect();
                // Both required heading rules failed, declaration-ordered.
                assert_eq!(names, vec!["has-title", "problem-statement"]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        let key = StageKey::one_shot(Stage::Prd);
        assert_eq!(engine.state().status_of(&key), StageStatus::Failed);
        // Never left in_progress on disk.
        let on_disk = WorkflowState::load(dir.path()).unwrap();
        assert_eq!(on_disk.status_of(&key), StageStatus::Failed);
    }

    #[test]
    fn failed_rerun_discards_superseded_artifact() {
        let dir = TempDir::new().unwrap();
        let key = StageKey::one_shot(Stage::Prd);
        {
            let mut engine =
                engine(&dir).with_generator(Box::new(StaticGenerator::ok("first bad draft")));
            let _ = engine.run_stage(Stage::Prd, None, false).unwrap_err();
            assert_eq!(
                engine.store().get(&key).unwrap().content,
                "first bad draft"
            );
        }
        let mut engine = WorkflowEngine::open(dir.path())
            .unwrap()
            .with_generator(Box::new(StaticGenerator::ok("second bad draft")));
        let _ = engine.run_stage(Stage::Prd, None, false).unwrap_err();
        // Replaced wholesale, not merged.
        assert_eq!(
            engine.store().get(&key).unwrap().content,
            "second bad draft"
        );
    }

    #[test]
    fn failed_stage_can_recover_to_completed() {
        let dir = TempDir::new().unwrap();
        let mut engine =
            engine(&dir).with_generator(Box::new(StaticGenerator::ok("bad")));
        let _ = engine.run_stage(Stage::Prd, None, false).unwrap_err();

        let mut engine = WorkflowEngine::open(dir.path()).unwrap();
        let outcome = engine.run_stage(Stage::Prd, None, false).unwrap();
        assert_eq!(outcome.status, StageStatus::Completed);
    }

    #[test]
    fn collaborator_failure_is_recoverable() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        engine.run_stage(Stage::Prd, None, false).unwrap();

        let mut engine = WorkflowEngine::open(dir.path())
            .unwrap()
            .with_generator(Box::new(StaticGenerator::failing()));
        let err = engine.run_stage(Stage::Architecture, None, false).unwrap_err();
        assert!(matches!(err, WorkflowError::Collaborator(_)));
        // Prior completed stage untouched.
        assert_eq!(
            engine.state().status_of(&StageKey::one_shot(Stage::Prd)),
            StageStatus::Completed
        );
        // Retry succeeds.
        let mut engine = WorkflowEngine::open(dir.path()).unwrap();
        engine.run_stage(Stage::Architecture, None, false).unwrap();
    }

    #[test]
    fn completed_stage_requires_force_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        engine.run_stage(Stage::Prd, None, false).unwrap();
        let err = engine.run_stage(Stage::Prd, None, false).unwrap_err();
        assert!(matches!(err, WorkflowError::ArtifactExists(_)));
        engine.run_stage(Stage::Prd, None, true).unwrap();
    }

    #[test]
    fn advance_sprint_requires_completed_review() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        let err = engine.advance_sprint().unwrap_err();
        assert!(matches!(err, WorkflowError::Sequence(_)));
        assert_eq!(engine.state().sprint, 1);
    }

    #[test]
    fn full_cycle_unlocks_next_sprint() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        complete_one_shots(&mut engine);
        complete_sprint(&mut engine);

        assert_eq!(engine.advance_sprint().unwrap(), 2);
        assert_eq!(engine.state().sprint, 2);
        assert_eq!(engine.config().sprints.current, 2);

        // sprint-plan@2 now has no unmet prerequisites.
        let outcome = engine.run_stage(Stage::SprintPlan, None, false).unwrap();
        assert_eq!(outcome.key, StageKey::sprint_scoped(Stage::SprintPlan, 2));
        assert_eq!(outcome.status, StageStatus::Completed);
    }

    #[test]
    fn future_sprint_index_rejected() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        complete_one_shots(&mut engine);
        let err = engine.run_stage(Stage::SprintPlan, Some(2), false).unwrap_err();
        assert!(matches!(err, WorkflowError::Sequence(_)));
    }

    #[test]
    fn ticket_sync_creates_one_ticket_per_issue_entry() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        complete_one_shots(&mut engine);
        engine.run_stage(Stage::SprintPlan, None, false).unwrap();
        engine.run_stage(Stage::SprintTech, None, false).unwrap();

        let content = "# Issues\n\n### Issue: login form\nEstimate: 1d\n\n### Issue: session store\nEstimate: 2d\n";
        let mut engine = WorkflowEngine::open(dir.path())
            .unwrap()
            .with_generator(Box::new(StaticGenerator::ok(content)))
            .with_tracker(Box::new(RecordingTracker::default()));
        let outcome = engine.run_stage(Stage::IssueGeneration, None, false).unwrap();
        assert_eq!(outcome.tickets.len(), 2);
        assert!(outcome.ticket_error.is_none());
    }

    #[test]
    fn tracker_outage_does_not_roll_back_completed_stage() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        complete_one_shots(&mut engine);
        engine.run_stage(Stage::SprintPlan, None, false).unwrap();
        engine.run_stage(Stage::SprintTech, None, false).unwrap();

        let mut engine = WorkflowEngine::open(dir.path())
            .unwrap()
            .with_tracker(Box::new(RecordingTracker {
                fail: true,
                ..Default::default()
            }));
        let outcome = engine.run_stage(Stage::IssueGeneration, None, false).unwrap();
        assert_eq!(outcome.status, StageStatus::Completed);
        assert!(outcome.ticket_error.is_some());
        assert_eq!(
            engine
                .state()
                .status_of(&StageKey::sprint_scoped(Stage::IssueGeneration, 1)),
            StageStatus::Completed
        );
    }

    #[test]
    fn ticket_resync_reads_stored_artifact_without_regenerating() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        complete_one_shots(&mut engine);
        engine.run_stage(Stage::SprintPlan, None, false).unwrap();
        engine.run_stage(Stage::SprintTech, None, false).unwrap();

        let content = "# Issues\n\n### Issue: migrate billing schema\nEstimate: 3d\n";
        let mut engine = WorkflowEngine::open(dir.path())
            .unwrap()
            .with_generator(Box::new(StaticGenerator::ok(content)))
            .with_tracker(Box::new(RecordingTracker {
                fail: true,
                ..Default::default()
            }));
        let outcome = engine.run_stage(Stage::IssueGeneration, None, false).unwrap();
        assert!(outcome.ticket_error.is_some());
        assert!(outcome.tickets.is_empty());

        // Retry with a healthy tracker: tickets come from the stored
        // document, and the document itself is untouched.
        let engine = WorkflowEngine::open(dir.path())
            .unwrap()
            .with_generator(Box::new(StaticGenerator::ok(
                "### Issue: something entirely different\n",
            )))
            .with_tracker(Box::new(RecordingTracker::default()));
        let tickets = engine.sync_tickets(None).unwrap();
        assert_eq!(tickets.len(), 1);

        let key = StageKey::sprint_scoped(Stage::IssueGeneration, 1);
        assert_eq!(engine.store().get(&key).unwrap().content, content);

        let open = engine.open_tickets().unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "migrate billing schema");
        assert!(open[0].open);
    }

    #[test]
    fn sync_tickets_requires_completed_stage() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).with_tracker(Box::new(RecordingTracker::default()));
        assert!(matches!(
            engine.sync_tickets(None),
            Err(WorkflowError::Sequence(_))
        ));
    }

    #[test]
    fn open_tickets_without_tracker_is_empty() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        assert!(engine.open_tickets().unwrap().is_empty());
    }

    /// Swaps the state file for a directory so the next save fails.
    struct StateSabotagingGenerator {
        state_path: PathBuf,
    }

    impl ContentGenerator for StateSabotagingGenerator {
        fn generate(&self, _ctx: &PromptContext<'_>) -> Result<String> {
            std::fs::remove_file(&self.state_path).unwrap();
            std::fs::create_dir(&self.state_path).unwrap();
            Ok("just prose, no headings".to_string())
        }
    }

    #[test]
    fn validation_detail_survives_failed_state_save() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir).with_generator(Box::new(StateSabotagingGenerator {
            state_path: dir.path().join(".prodflow/state.yaml"),
        }));
        // The failure-record save cannot succeed, but the validation
        // detail must still reach the caller.
        let err = engine.run_stage(Stage::Prd, None, false).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { .. }));
        assert_eq!(
            engine.state().status_of(&StageKey::one_shot(Stage::Prd)),
            StageStatus::Failed
        );
    }

    #[test]
    fn stuck_in_progress_blocks_runs_until_abandoned() {
        let dir = TempDir::new().unwrap();
        WorkflowEngine::init(dir.path(), "shop", false).unwrap();
        // Simulate a crashed run that left a stage in progress on disk.
        let mut state = WorkflowState::load(dir.path()).unwrap();
        state.record(
            StageKey::one_shot(Stage::Prd),
            StageStatus::InProgress,
            None,
            "started",
        );
        state.save(dir.path()).unwrap();

        let mut engine = WorkflowEngine::open(dir.path()).unwrap();
        let err = engine.run_stage(Stage::Prd, None, false).unwrap_err();
        assert!(matches!(err, WorkflowError::StageInProgress(_)));

        engine.abandon(Stage::Prd, None).unwrap();
        assert_eq!(
            engine.state().status_of(&StageKey::one_shot(Stage::Prd)),
            StageStatus::Failed
        );
        engine.run_stage(Stage::Prd, None, false).unwrap();
    }

    #[test]
    fn abandon_requires_in_progress() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        assert!(matches!(
            engine.abandon(Stage::Prd, None),
            Err(WorkflowError::Sequence(_))
        ));
    }

    #[test]
    fn check_stage_revalidates_without_mutating_state() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        engine.run_stage(Stage::Prd, None, false).unwrap();
        let key = StageKey::one_shot(Stage::Prd);

        // Simulate a human edit that breaks a required rule.
        let path = engine.store().path_for(&key);
        std::fs::write(&path, "gutted").unwrap();

        let (checked, report) = engine.check_stage(Stage::Prd, None).unwrap();
        assert_eq!(checked, key);
        assert!(!report.passed());
        // State untouched by check.
        assert_eq!(engine.state().status_of(&key), StageStatus::Completed);
    }

    #[test]
    fn sprint_index_defaults_to_current() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let key = engine.resolve_key(Stage::SprintPlan, None).unwrap();
        assert_eq!(key, StageKey::sprint_scoped(Stage::SprintPlan, 1));
    }
}
