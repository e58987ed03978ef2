//! Running tool calls with progress reporting.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::builder::call::ToolCall;
use crate::builder::events::{CallResult, Event, EventSink};
use crate::builder::plan::BuildPlan;
use crate::builder::runner::ToolRunner;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::process::CancelToken;

/// Results of a batch of calls, in submission order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CallResults {
    results: Vec<CallResult>,
}

impl CallResults {
    pub fn new(results: Vec<CallResult>) -> Self {
        CallResults { results }
    }

    pub fn list(&self) -> &[CallResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn extend(&mut self, other: CallResults) {
        self.results.extend(other.results);
    }

    pub fn failures(&self) -> Vec<&CallResult> {
        self.results.iter().filter(|r| !r.is_successful()).collect()
    }

    /// Fail unless every call succeeded.
    ///
    /// A single failure is reported with its full output; several failures
    /// by count plus a numbered list of the failed commands, whose output
    /// the event sink has already reported.
    pub fn require_successful(&self) -> Result<(), ExecutionError> {
        let failures = self.failures();
        let summary = match failures.as_slice() {
            [] => return Ok(()),
            [failure] => failure.report(),
            many => {
                let mut summary = format!(
                    "{} of {} calls failed, their output is logged above:",
                    many.len(),
                    self.results.len()
                );
                for (i, f) in many.iter().enumerate() {
                    summary.push_str(&format!(
                        "\n{}. `{}` (exit code {})",
                        i + 1,
                        f.command(),
                        f.code
                    ));
                }
                summary
            }
        };
        Err(ExecutionError::Failed {
            summary,
            failed: failures.len(),
        })
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("{summary}")]
    Failed { summary: String, failed: usize },

    #[error("execution cancelled after {} call(s)", .completed.len())]
    Cancelled { completed: CallResults },
}

impl ExecutionError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ExecutionError::Failed { summary, failed } => {
                let mut lines = summary.lines();
                let headline = lines.next().unwrap_or_default().to_string();
                let detail: Vec<&str> = lines.collect();
                let mut diag = Diagnostic::error(headline);
                if !detail.is_empty() {
                    diag = diag.with_context(detail.join("\n"));
                }
                if *failed > 1 {
                    diag = diag.with_suggestion(suggestions::BUILD_FAILED);
                }
                diag
            }
            ExecutionError::Cancelled { completed } => {
                Diagnostic::error("build cancelled").with_context(format!(
                    "{} call(s) completed, {} failed",
                    completed.len(),
                    completed.failures().len()
                ))
            }
        }
    }
}

/// Runs batches of tool calls.
pub struct Executor<'a> {
    runner: &'a dyn ToolRunner,
    sink: &'a dyn EventSink,
    parallel: bool,
    progress: bool,
    cancel: CancelToken,
}

impl<'a> Executor<'a> {
    pub fn new(runner: &'a dyn ToolRunner, sink: &'a dyn EventSink) -> Self {
        Executor {
            runner,
            sink,
            parallel: true,
            progress: false,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Show a progress bar for batches of more than one call.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the phases of a plan; a phase starts only after the previous one
    /// succeeded.
    pub fn run_plan(&self, plan: &BuildPlan) -> Result<CallResults, ExecutionError> {
        let mut all = CallResults::default();
        for phase in &plan.phases {
            self.sink.accept(&Event::caption(phase.caption()));
            let results = self.run(&phase.calls, self.parallel && phase.parallel)?;
            results.require_successful()?;
            all.extend(results);
        }
        Ok(all)
    }

    /// Run a batch of calls.
    ///
    /// In sequential mode calls run in list order without overlap. Results
    /// always keep list order. Once cancelled, no further call is started and
    /// the results completed so far are returned in the error.
    pub fn run(&self, calls: &[ToolCall], parallel: bool) -> Result<CallResults, ExecutionError> {
        let pb = self.progress_bar(calls.len());
        let run_one = |call: &ToolCall| {
            if self.cancel.is_cancelled() {
                return None;
            }
            let result = self.execute(call);
            if let Some(pb) = &pb {
                pb.set_message(call.tool.clone());
                pb.inc(1);
            }
            Some(result)
        };
        let outcomes: Vec<Option<CallResult>> = if parallel {
            calls.par_iter().map(run_one).collect()
        } else {
            let mut outcomes = Vec::with_capacity(calls.len());
            for call in calls {
                let outcome = run_one(call);
                let stop = outcome.is_none();
                outcomes.push(outcome);
                if stop {
                    break;
                }
            }
            outcomes
        };
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let complete = outcomes.len() == calls.len() && outcomes.iter().all(Option::is_some);
        let results = CallResults::new(outcomes.into_iter().flatten().collect());
        if complete {
            Ok(results)
        } else {
            Err(ExecutionError::Cancelled { completed: results })
        }
    }

    fn execute(&self, call: &ToolCall) -> CallResult {
        let thread = std::thread::current();
        let thread = thread
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:?}", thread.id()));
        tracing::debug!("{}", call);
        let start = Instant::now();
        let output = self.runner.run_tool(call, &self.cancel);
        let result = CallResult {
            tool: call.tool.clone(),
            args: call.args.clone(),
            thread,
            duration: start.elapsed(),
            code: output.code,
            output: output.output,
            errors: output.errors,
        };
        self.sink.accept(&Event::CallFinished(result.clone()));
        result
    }

    fn progress_bar(&self, total: usize) -> Option<ProgressBar> {
        if !self.progress || total < 2 {
            return None;
        }
        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Some(pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::events::RecordingSink;
    use crate::builder::plan::{Phase, PhaseKind};
    use crate::builder::runner::ToolOutput;
    use crate::core::space::SpaceKind;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Succeeds unless the first argument is scripted to fail.
    #[derive(Default)]
    struct ScriptedRunner {
        exit_codes: BTreeMap<String, i32>,
        delays: BTreeMap<String, u64>,
        cancel_after: Option<String>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn failing(mut self, name: &str, code: i32) -> Self {
            self.exit_codes.insert(name.to_string(), code);
            self
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl ToolRunner for ScriptedRunner {
        fn run_tool(&self, call: &ToolCall, cancel: &CancelToken) -> ToolOutput {
            let name = call.args.first().cloned().unwrap_or_default();
            if let Some(ms) = self.delays.get(&name) {
                std::thread::sleep(Duration::from_millis(*ms));
            }
            self.seen.lock().unwrap().push(name.clone());
            if self.cancel_after.as_deref() == Some(name.as_str()) {
                cancel.cancel();
            }
            match self.exit_codes.get(&name) {
                Some(code) => ToolOutput::failure(*code, format!("{} broke", name)),
                None => ToolOutput::success(format!("{} ok", name)),
            }
        }
    }

    fn calls(names: &[&str]) -> Vec<ToolCall> {
        names.iter().map(|n| ToolCall::new("javac").with(*n)).collect()
    }

    #[test]
    fn test_sequential_runs_in_order() {
        let runner = ScriptedRunner::default();
        let sink = RecordingSink::new();
        let executor = Executor::new(&runner, &sink);
        let results = executor.run(&calls(&["a", "b", "c"]), false).unwrap();
        assert_eq!(runner.seen(), vec!["a", "b", "c"]);
        assert_eq!(results.len(), 3);
        assert!(results.require_successful().is_ok());
        assert_eq!(sink.events().len(), 3);
    }

    #[test]
    fn test_parallel_keeps_result_order() {
        let mut runner = ScriptedRunner::default();
        runner.delays.insert("a".to_string(), 50);
        let sink = RecordingSink::new();
        let results = Executor::new(&runner, &sink)
            .run(&calls(&["a", "b", "c", "d"]), true)
            .unwrap();
        let outputs: Vec<&str> = results.list().iter().map(|r| r.output.as_str()).collect();
        assert_eq!(outputs, vec!["a ok", "b ok", "c ok", "d ok"]);
    }

    #[test]
    fn test_single_failure_reports_detail() {
        let runner = ScriptedRunner::default().failing("b", 2);
        let sink = RecordingSink::new();
        let results = Executor::new(&runner, &sink)
            .run(&calls(&["a", "b", "c"]), true)
            .unwrap();
        let err = results.require_successful().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("`javac b` failed with exit code 2"));
        assert!(message.contains("b broke"));
        // Every call of the batch still ran.
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_many_failures_report_counts() {
        let runner = ScriptedRunner::default().failing("a", 1).failing("c", 3);
        let sink = RecordingSink::new();
        let results = Executor::new(&runner, &sink)
            .run(&calls(&["a", "b", "c"]), false)
            .unwrap();
        let err = results.require_successful().unwrap_err();
        assert!(matches!(err, ExecutionError::Failed { failed: 2, .. }));
        let message = err.to_string();
        assert_eq!(
            message,
            "2 of 3 calls failed, their output is logged above:\n\
             1. `javac a` (exit code 1)\n\
             2. `javac c` (exit code 3)"
        );
        assert!(!message.contains("broke"));

        let rendered = err.to_diagnostic().format(false);
        assert!(rendered.contains("error: 2 of 3 calls failed"));
        assert!(rendered.contains("2. `javac c` (exit code 3)"));
        // Each failed call reached the sink with its own output.
        let reported: Vec<String> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::CallFinished(r) if !r.is_successful() => Some(r.errors),
                _ => None,
            })
            .collect();
        assert_eq!(reported, vec!["a broke", "c broke"]);
    }

    #[test]
    fn test_cancel_keeps_completed_results() {
        let runner = ScriptedRunner {
            cancel_after: Some("b".to_string()),
            ..Default::default()
        };
        let sink = RecordingSink::new();
        let err = Executor::new(&runner, &sink)
            .run(&calls(&["a", "b", "c"]), false)
            .unwrap_err();
        match err {
            ExecutionError::Cancelled { completed } => assert_eq!(completed.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.seen(), vec!["a", "b"]);
    }

    #[test]
    fn test_plan_stops_at_failed_phase() {
        let runner = ScriptedRunner::default().failing("compile", 1);
        let sink = RecordingSink::new();
        let mut plan = BuildPlan::default();
        plan.push(Phase::new(SpaceKind::Main, PhaseKind::Compile, calls(&["compile"])));
        plan.push(Phase::new(SpaceKind::Main, PhaseKind::Archive, calls(&["archive"])));

        let err = Executor::new(&runner, &sink).run_plan(&plan).unwrap_err();
        assert!(matches!(err, ExecutionError::Failed { failed: 1, .. }));
        assert_eq!(runner.seen(), vec!["compile"]);
        assert_eq!(sink.captions(), vec!["Compile main modules"]);
    }

    #[test]
    fn test_plan_runs_all_phases() {
        let runner = ScriptedRunner::default();
        let sink = RecordingSink::new();
        let mut plan = BuildPlan::default();
        plan.push(Phase::new(SpaceKind::Main, PhaseKind::Compile, calls(&["compile"])));
        plan.push(Phase::new(SpaceKind::Main, PhaseKind::Archive, calls(&["a", "b"])).sequential());

        let results = Executor::new(&runner, &sink).run_plan(&plan).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(runner.seen(), vec!["compile", "a", "b"]);
    }
}
