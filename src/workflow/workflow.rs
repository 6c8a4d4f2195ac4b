//! Precondition -> parallel tasks -> postcondition composition, with
//! error-handler-mediated abort/continue (§4.G).

use crate::runtime::controller::{ReconcileContext, ReconcileFn};
use crate::runtime::error::ReconcileError;
use futures::future::BoxFuture;
use std::sync::Arc;

pub type ReconcileClosure<T> = ReconcileFn<T>;

/// `Fn(context, joined_error) -> Option<ReconcileError>`: `None` suppresses
/// the error and the workflow continues; `Some(e)` raises and the workflow
/// aborts with `e` (§4.G).
pub type ErrorHandlerFn<T> =
    Arc<dyn Fn(ReconcileContext<T>, ReconcileError) -> BoxFuture<'static, Option<ReconcileError>> + Send + Sync>;

/// What a [`Workflow::run`] produced: whether every stage ran to
/// completion, or an error handler decided to abort early (§8 invariant
/// "Workflow ordering").
#[derive(Debug)]
pub enum WorkflowOutcome {
    Completed(Option<ReconcileError>),
    Aborted(Option<ReconcileError>),
}

impl WorkflowOutcome {
    pub fn error(&self) -> Option<&ReconcileError> {
        match self {
            WorkflowOutcome::Completed(e) | WorkflowOutcome::Aborted(e) => e.as_ref(),
        }
    }

    pub fn aborted(&self) -> bool {
        matches!(self, WorkflowOutcome::Aborted(_))
    }
}

enum StageOutcome {
    Continue(Option<ReconcileError>),
    Abort(Option<ReconcileError>),
}

/// A composition of reconcile functions: optional precondition, zero or
/// more concurrent tasks, optional postcondition, optional error handler
/// (§4.G).
#[derive(Clone)]
pub struct Workflow<T> {
    precondition: Option<ReconcileClosure<T>>,
    tasks: Vec<ReconcileClosure<T>>,
    postcondition: Option<ReconcileClosure<T>>,
    error_handler: Option<ErrorHandlerFn<T>>,
}

impl<T> Default for Workflow<T> {
    fn default() -> Self {
        Self {
            precondition: None,
            tasks: Vec::new(),
            postcondition: None,
            error_handler: None,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Workflow<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precondition(mut self, f: ReconcileClosure<T>) -> Self {
        self.precondition = Some(f);
        self
    }

    pub fn with_postcondition(mut self, f: ReconcileClosure<T>) -> Self {
        self.postcondition = Some(f);
        self
    }

    pub fn with_error_handler(mut self, f: ErrorHandlerFn<T>) -> Self {
        self.error_handler = Some(f);
        self
    }

    pub fn add_task(mut self, f: ReconcileClosure<T>) -> Self {
        self.tasks.push(f);
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<ReconcileClosure<T>>) -> Self {
        self.tasks = tasks;
        self
    }

    fn clone_ctx(ctx: &ReconcileContext<T>, carryover: Option<ReconcileError>) -> ReconcileContext<T> {
        ReconcileContext {
            events: ctx.events.clone(),
            topology: ctx.topology.clone(),
            carryover,
            state: ctx.state.clone(),
        }
    }

    /// Hand a stage's raised error (if any) to the error handler, joined
    /// with whatever carried over from an earlier stage. No handler present
    /// and an error raised is fail-closed: the workflow aborts.
    async fn guard(&self, ctx: &ReconcileContext<T>, carryover: Option<ReconcileError>, raised: Option<ReconcileError>) -> StageOutcome {
        let Some(joined) = ReconcileError::join(carryover, raised) else {
            return StageOutcome::Continue(None);
        };
        match &self.error_handler {
            Some(handler) => {
                let handler_ctx = Self::clone_ctx(ctx, Some(joined.clone()));
                match handler(handler_ctx, joined).await {
                    None => StageOutcome::Continue(None),
                    Some(e) => StageOutcome::Abort(Some(e)),
                }
            }
            None => StageOutcome::Abort(Some(joined)),
        }
    }

    /// Run precondition, then every task concurrently (all run to
    /// completion regardless of individual failures, §4.G / §5), then
    /// postcondition, threading the error handler's decision between
    /// stages.
    pub async fn run(&self, ctx: ReconcileContext<T>) -> WorkflowOutcome {
        let mut carryover = ctx.carryover.clone();

        if let Some(pre) = &self.precondition {
            let stage_ctx = Self::clone_ctx(&ctx, carryover.clone());
            let raised = pre(stage_ctx).await;
            match self.guard(&ctx, carryover, raised).await {
                StageOutcome::Abort(e) => return WorkflowOutcome::Aborted(e),
                StageOutcome::Continue(c) => carryover = c,
            }
        }

        if !self.tasks.is_empty() {
            let futures = self.tasks.iter().map(|task| {
                let task_ctx = Self::clone_ctx(&ctx, carryover.clone());
                task(task_ctx)
            });
            let results = futures::future::join_all(futures).await;
            let task_errors: Vec<ReconcileError> = results.into_iter().flatten().collect();
            let raised = ReconcileError::join_all(task_errors);
            match self.guard(&ctx, carryover, raised).await {
                StageOutcome::Abort(e) => return WorkflowOutcome::Aborted(e),
                StageOutcome::Continue(c) => carryover = c,
            }
        }

        if let Some(post) = &self.postcondition {
            let stage_ctx = Self::clone_ctx(&ctx, carryover.clone());
            let raised = post(stage_ctx).await;
            match self.guard(&ctx, carryover, raised).await {
                StageOutcome::Abort(e) => return WorkflowOutcome::Aborted(e),
                StageOutcome::Continue(c) => carryover = c,
            }
        }

        WorkflowOutcome::Completed(carryover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Topology, TopologyOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn empty_ctx() -> ReconcileContext<()> {
        let (topo, _) = Topology::build(vec![], vec![], vec![], &[], TopologyOptions::default()).unwrap();
        ReconcileContext {
            events: vec![],
            topology: Arc::new(topo),
            carryover: None,
            state: Arc::new(parking_lot::Mutex::new(std::collections::HashMap::new())),
        }
    }

    fn ok_fn() -> ReconcileClosure<()> {
        Arc::new(|_ctx| Box::pin(async { None }))
    }

    fn failing_fn(msg: &'static str) -> ReconcileClosure<()> {
        Arc::new(move |_ctx| Box::pin(async move { Some(ReconcileError::Task(msg.to_string())) }))
    }

    fn counting_fn(counter: Arc<AtomicUsize>) -> ReconcileClosure<()> {
        Arc::new(move |_ctx| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                None
            })
        })
    }

    fn aborting_handler() -> ErrorHandlerFn<()> {
        Arc::new(|_ctx, err| Box::pin(async move { Some(err) }))
    }

    fn suppressing_handler() -> ErrorHandlerFn<()> {
        Arc::new(|_ctx, _err| Box::pin(async move { None }))
    }

    #[tokio::test]
    async fn precondition_failure_with_aborting_handler_skips_tasks_and_postcondition() {
        let task_calls = Arc::new(AtomicUsize::new(0));
        let post_calls = Arc::new(AtomicUsize::new(0));
        let workflow = Workflow::new()
            .with_precondition(failing_fn("precondition failed"))
            .with_error_handler(aborting_handler())
            .add_task(counting_fn(task_calls.clone()))
            .with_postcondition(counting_fn(post_calls.clone()));
        let outcome = workflow.run(empty_ctx()).await;
        assert!(outcome.aborted());
        assert_eq!(task_calls.load(Ordering::SeqCst), 0);
        assert_eq!(post_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn precondition_failure_with_suppressing_handler_runs_every_task_exactly_once() {
        let task_calls = Arc::new(AtomicUsize::new(0));
        let workflow = Workflow::new()
            .with_precondition(failing_fn("transient"))
            .with_error_handler(suppressing_handler())
            .add_task(counting_fn(task_calls.clone()))
            .add_task(counting_fn(task_calls.clone()))
            .add_task(counting_fn(task_calls.clone()));
        let outcome = workflow.run(empty_ctx()).await;
        assert!(!outcome.aborted());
        assert_eq!(task_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn task_errors_are_joined_and_both_present_matches_scenario_7() {
        let workflow = Workflow::new()
            .add_task(failing_fn("task1 failed"))
            .add_task(failing_fn("task2 failed"))
            .with_error_handler(aborting_handler());
        let outcome = workflow.run(empty_ctx()).await;
        let err = outcome.error().unwrap();
        let rendered = format!("{err:?}");
        assert!(rendered.contains("task1 failed"));
        assert!(rendered.contains("task2 failed"));
    }

    #[tokio::test]
    async fn all_tasks_run_to_completion_even_when_one_fails() {
        let ran = Arc::new(AtomicUsize::new(0));
        let workflow = Workflow::new()
            .add_task(failing_fn("boom"))
            .add_task(counting_fn(ran.clone()))
            .with_error_handler(suppressing_handler());
        workflow.run(empty_ctx()).await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_error_handler_with_raised_error_is_fail_closed() {
        let post_calls = Arc::new(AtomicUsize::new(0));
        let workflow = Workflow::new()
            .with_precondition(failing_fn("no handler configured"))
            .with_postcondition(counting_fn(post_calls.clone()));
        let outcome = workflow.run(empty_ctx()).await;
        assert!(outcome.aborted());
        assert_eq!(post_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clean_run_with_no_errors_completes() {
        let workflow: Workflow<()> = Workflow::new().with_precondition(ok_fn()).add_task(ok_fn()).with_postcondition(ok_fn());
        let outcome = workflow.run(empty_ctx()).await;
        assert!(!outcome.aborted());
        assert!(outcome.error().is_none());
    }
}
