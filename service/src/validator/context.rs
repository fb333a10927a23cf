//! Per-call validation state

use crate::schema::AsyncCheck;
use fastschema_core::config::ValidationOptions;
use fastschema_core::issue::{Issue, IssueCode, PathSegment, type_name};
use serde_json::Value;
use std::sync::Arc;

/// Whether async-only nodes may be deferred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Sync,
    Async,
}

/// Deferred async check collected during an async walk
pub(crate) struct PendingCheck {
    pub(crate) path: Vec<PathSegment>,
    pub(crate) value: Value,
    pub(crate) check: Arc<dyn AsyncCheck>,
    pub(crate) message: String,
}

/// Position in the issue and pending-check buffers
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    issues: usize,
    pending: usize,
}

pub(crate) struct ValidationContext<'o> {
    path: Vec<PathSegment>,
    issues: Vec<Issue>,
    pending: Vec<PendingCheck>,
    mode: Mode,
    options: &'o ValidationOptions,
}

impl<'o> ValidationContext<'o> {
    pub(crate) fn new(options: &'o ValidationOptions, mode: Mode) -> Self {
        Self {
            path: Vec::new(),
            issues: Vec::new(),
            pending: Vec::new(),
            mode,
            options,
        }
    }

    pub(crate) fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether container walks may visit another member
    pub(crate) fn should_continue(&self) -> bool {
        self.options.should_continue(self.issues.len())
    }

    /// Issue located at the current path
    pub(crate) fn issue(&self, code: IssueCode, message: impl Into<String>) -> Issue {
        Issue::new(code, self.path.clone(), message)
    }

    pub(crate) fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub(crate) fn type_mismatch(&mut self, expected: &str, value: &Value) {
        let received = type_name(value);
        self.push(
            self.issue(
                IssueCode::TypeMismatch,
                format!("Expected {expected}, received {received}"),
            )
            .with_expected(expected)
            .with_received(received),
        );
    }

    pub(crate) fn defer(&mut self, value: Value, check: Arc<dyn AsyncCheck>, message: &str) {
        self.pending.push(PendingCheck {
            path: self.path.clone(),
            value,
            check,
            message: message.to_string(),
        });
    }

    pub(crate) fn with_key<T>(&mut self, key: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(PathSegment::key(key));
        let result = f(self);
        self.path.pop();
        result
    }

    pub(crate) fn with_index<T>(&mut self, index: usize, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(PathSegment::Index(index));
        let result = f(self);
        self.path.pop();
        result
    }

    pub(crate) fn mark(&self) -> Checkpoint {
        Checkpoint {
            issues: self.issues.len(),
            pending: self.pending.len(),
        }
    }

    pub(crate) fn failed_since(&self, checkpoint: Checkpoint) -> bool {
        self.issues.len() > checkpoint.issues
    }

    /// `Some(output)` unless issues were recorded after `checkpoint`
    pub(crate) fn finish_since(&self, checkpoint: Checkpoint, output: Value) -> Option<Value> {
        (!self.failed_since(checkpoint)).then_some(output)
    }

    /// Remove everything recorded after `checkpoint`, returning the issues
    pub(crate) fn take_since(&mut self, checkpoint: Checkpoint) -> Vec<Issue> {
        self.pending.truncate(checkpoint.pending);
        self.issues.drain(checkpoint.issues..).collect()
    }

    pub(crate) fn extend(&mut self, issues: Vec<Issue>) {
        self.issues.extend(issues);
    }

    pub(crate) fn into_parts(self) -> (Vec<Issue>, Vec<PendingCheck>) {
        (self.issues, self.pending)
    }
}
