//! Orchestration Module
//!
//! Wraps a fallible task in a named flow run. A run that gives up sends one
//! failure notice and hands the original error back to its caller.

mod flow;
mod notify;

pub use flow::{FlowContext, FlowError, FlowRunner};
pub use notify::{FailureNotice, FileNotifier, LogNotifier, Notifier};
