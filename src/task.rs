//! Synchronous task execution boundary.
//!
//! A [`Task`] is a unit of domain work that advances in cooperative steps.
//! [`TaskRunner::run`] drives a task to a terminal state and normalizes every
//! failure it raises, including panics, into a single [`TaskException`]. The
//! wrapped error keeps its concrete type, so callers can catch one error type
//! and still ask whether the cause was, say, a query failure or an I/O failure.

use std::error::Error;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;
use tracing::{debug, warn};

/// Error raised by a task. Boxed so the concrete type survives the boundary.
pub type TaskError = Box<dyn Error + Send + Sync + 'static>;

/// Outcome of one cooperative step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStep {
    Continue,
    Done,
}

/// A unit of domain work.
pub trait Task {
    fn description(&self) -> &str;

    /// Prepare the task. Called once before the first step.
    fn start(&mut self) -> Result<(), TaskError> {
        Ok(())
    }

    /// Perform one slice of work.
    fn step(&mut self) -> Result<TaskStep, TaskError>;

    /// Fraction of work completed, in `0.0..=1.0`, when the task can tell.
    fn progress(&self) -> Option<f64> {
        None
    }
}

/// A panic raised inside a task step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task panicked: {message}")]
pub struct TaskPanicked {
    pub message: String,
}

/// Normalized failure of a task run. Created only by [`TaskRunner`].
#[derive(Debug, Error)]
#[error("{task}: {exception}")]
pub struct TaskException {
    task: String,
    progress: Option<f64>,
    #[source]
    exception: TaskError,
}

impl TaskException {
    fn new(task: &dyn Task, exception: TaskError) -> Self {
        Self {
            task: task.description().to_string(),
            progress: task.progress(),
            exception,
        }
    }

    /// Description of the task that failed.
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Progress the task had reported when it failed.
    pub fn progress(&self) -> Option<f64> {
        self.progress
    }

    /// The captured error, unchanged.
    pub fn exception(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.exception.as_ref()
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.exception.downcast_ref::<E>()
    }

    pub fn is<E: Error + 'static>(&self) -> bool {
        self.exception.is::<E>()
    }

    pub fn into_exception(self) -> TaskError {
        self.exception
    }
}

/// Runs tasks to completion on the calling thread.
pub struct TaskRunner {
    progress_out: Box<dyn Write>,
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner {
    /// Runner that renders verbose progress on stderr.
    pub fn new() -> Self {
        Self {
            progress_out: Box::new(std::io::stderr()),
        }
    }

    /// Runner that renders verbose progress on `out`.
    pub fn with_output(out: impl Write + 'static) -> Self {
        Self {
            progress_out: Box::new(out),
        }
    }

    /// Drive `task` to a terminal state.
    ///
    /// Returns normally on success. Any error the task raises, and any panic
    /// inside it, comes back as a [`TaskException`] wrapping the original
    /// error. `verbose` only controls progress output.
    pub fn run(&mut self, task: &mut dyn Task, verbose: bool) -> Result<(), TaskException> {
        debug!(task = task.description(), "task starting");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.drive(&mut *task, verbose)));

        let result = match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TaskException::new(task, e)),
            Err(payload) => {
                let panicked = TaskPanicked {
                    message: panic_message(payload.as_ref()),
                };
                Err(TaskException::new(task, Box::new(panicked)))
            }
        };

        match &result {
            Ok(()) => debug!(task = task.description(), "task succeeded"),
            Err(e) => warn!(task = task.description(), error = %e.exception(), "task failed"),
        }
        result
    }

    fn drive(&mut self, task: &mut dyn Task, verbose: bool) -> Result<(), TaskError> {
        task.start()?;

        let mut shown: Option<u32> = None;
        loop {
            let step = task.step()?;
            if verbose {
                if let Some(percent) = task.progress().map(to_percent) {
                    if shown != Some(percent) {
                        self.render(task.description(), percent);
                        shown = Some(percent);
                    }
                }
            }
            if step == TaskStep::Done {
                break;
            }
        }

        if verbose && shown.is_some() {
            let _ = writeln!(self.progress_out);
        }
        Ok(())
    }

    fn render(&mut self, description: &str, percent: u32) {
        let _ = write!(self.progress_out, "\r{} {:3} %", description, percent);
        let _ = self.progress_out.flush();
    }
}

fn to_percent(progress: f64) -> u32 {
    (progress.clamp(0.0, 1.0) * 100.0).floor() as u32
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Single-step task around a closure.
pub struct FnTask<F> {
    description: String,
    work: Option<F>,
}

impl<F> FnTask<F>
where
    F: FnOnce() -> Result<(), TaskError>,
{
    pub fn new(description: impl Into<String>, work: F) -> Self {
        Self {
            description: description.into(),
            work: Some(work),
        }
    }
}

impl<F> Task for FnTask<F>
where
    F: FnOnce() -> Result<(), TaskError>,
{
    fn description(&self) -> &str {
        &self.description
    }

    fn step(&mut self) -> Result<TaskStep, TaskError> {
        if let Some(work) = self.work.take() {
            work()?;
        }
        Ok(TaskStep::Done)
    }

    fn progress(&self) -> Option<f64> {
        Some(if self.work.is_some() { 0.0 } else { 1.0 })
    }
}
