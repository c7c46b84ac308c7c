/*
 * Copyright 2019-2020 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Progress, cancellation and logging for long-running operations.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use crate::error::Error;

/// A channel through which a long-running operation reports progress and learns about
/// cancellation.
///
/// The operations in this crate call a monitor from whichever thread they run on, so an
/// implementation which drives a user interface must do its own marshaling to the UI thread.
pub trait TaskMonitor: Send + Sync {
    /// Start the main task `name`, which has `total` units of work to do.
    fn start_task(&self, name: &str, total: u64);

    /// Report that `done` units of the main task are now done.
    fn update_done(&self, done: u64);

    /// End the main task `name`.
    fn end_task(&self, name: &str);

    /// Start the sub-task `name` of the main task, which has `total` units of work to do.
    fn start_sub_task(&self, _name: &str, _total: u64) {}

    /// Report that `done` units of the sub-task `name` are now done.
    fn update_sub_task_done(&self, _name: &str, _done: u64) {}

    /// End the sub-task `name`.
    fn end_sub_task(&self, _name: &str) {}

    /// Append a message to the task log.
    fn log(&self, message: fmt::Arguments<'_>);

    /// Record the error which ended the task.
    fn set_exception(&self, error: &Error);

    /// Return whether the task has been cancelled.
    ///
    /// Operations poll this between units of work and stop with `Error::Cancelled` once it
    /// returns `true`.
    fn is_cancelled(&self) -> bool;
}

/// Append a formatted message to the log of a [`TaskMonitor`].
#[macro_export]
macro_rules! monitor_log {
    ($monitor:expr, $($arg:tt)*) => {
        $crate::TaskMonitor::log($monitor, format_args!($($arg)*))
    };
}

/// Statistics about the progress of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStats {
    /// The name of the task.
    pub name: String,

    /// The number of units of work the task has to do.
    pub todo: u64,

    /// The number of units of work which are done.
    pub done: u64,

    /// When the task started.
    pub started: SystemTime,

    /// When the task ended, if it has.
    pub stopped: Option<SystemTime>,

    /// When `done` was last updated.
    pub last_update: SystemTime,
}

impl TaskStats {
    fn new(name: &str, todo: u64) -> Self {
        let now = SystemTime::now();
        TaskStats {
            name: name.to_string(),
            todo,
            done: 0,
            started: now,
            stopped: None,
            last_update: now,
        }
    }

    fn update_done(&mut self, done: u64) {
        self.done = done;
        self.last_update = SystemTime::now();
    }

    fn mark_end(&mut self) {
        let now = SystemTime::now();
        self.stopped = Some(now);
        self.last_update = now;
    }

    /// Return whether the task has ended.
    pub fn is_done(&self) -> bool {
        self.stopped.is_some()
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    task: Option<TaskStats>,
    sub_tasks: HashMap<String, TaskStats>,
    current_sub_task: Option<String>,
    log: Vec<String>,
    exception: Option<String>,
}

/// A [`TaskMonitor`] which records everything reported to it.
///
/// This is the monitor to use when there is no user interface, such as in a command-line tool
/// or in tests. Log messages are kept in a buffer and also forwarded to the `log` crate at
/// `debug` level.
#[derive(Debug, Default)]
pub struct DefaultTaskMonitor {
    cancelled: AtomicBool,
    state: Mutex<MonitorState>,
}

impl DefaultTaskMonitor {
    /// Create a new monitor.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request cancellation of the task.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// The statistics of the main task, if one was started.
    pub fn task_stats(&self) -> Option<TaskStats> {
        self.state().task.clone()
    }

    /// The statistics of the sub-task `name`, if it was started.
    pub fn sub_task_stats(&self, name: &str) -> Option<TaskStats> {
        self.state().sub_tasks.get(name).cloned()
    }

    /// The name of the sub-task which was started last.
    pub fn current_sub_task(&self) -> Option<String> {
        self.state().current_sub_task.clone()
    }

    /// Return whether the main task has ended.
    pub fn is_done(&self) -> bool {
        self.state().task.as_ref().map_or(false, TaskStats::is_done)
    }

    /// The messages logged so far.
    pub fn log_lines(&self) -> Vec<String> {
        self.state().log.clone()
    }

    /// Return the messages logged since `offset` and the offset to pass next time.
    pub fn log_since(&self, offset: usize) -> (Vec<String>, usize) {
        let state = self.state();
        let start = offset.min(state.log.len());
        (state.log[start..].to_vec(), state.log.len())
    }

    /// Return whether an error was recorded.
    pub fn has_error(&self) -> bool {
        self.state().exception.is_some()
    }

    /// The message of the recorded error, if any.
    pub fn exception(&self) -> Option<String> {
        self.state().exception.clone()
    }
}

impl TaskMonitor for DefaultTaskMonitor {
    fn start_task(&self, name: &str, total: u64) {
        let mut state = self.state();
        state.task = Some(TaskStats::new(name, total));
        state.sub_tasks.clear();
        state.current_sub_task = None;
    }

    fn update_done(&self, done: u64) {
        if let Some(task) = self.state().task.as_mut() {
            task.update_done(done);
        }
    }

    fn end_task(&self, name: &str) {
        let mut state = self.state();
        match state.task.as_mut() {
            Some(task) if task.name == name => task.mark_end(),
            _ => log::warn!("end_task() for a task which was not started: {}", name),
        }
    }

    fn start_sub_task(&self, name: &str, total: u64) {
        let mut state = self.state();
        state
            .sub_tasks
            .insert(name.to_string(), TaskStats::new(name, total));
        state.current_sub_task = Some(name.to_string());
    }

    fn update_sub_task_done(&self, name: &str, done: u64) {
        if let Some(task) = self.state().sub_tasks.get_mut(name) {
            task.update_done(done);
        }
    }

    fn end_sub_task(&self, name: &str) {
        if let Some(task) = self.state().sub_tasks.get_mut(name) {
            task.mark_end();
        }
    }

    fn log(&self, message: fmt::Arguments<'_>) {
        let line = message.to_string();
        log::debug!("{}", line.trim_end());
        self.state().log.push(line);
    }

    fn set_exception(&self, error: &Error) {
        self.state().exception = Some(error.to_string());
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
