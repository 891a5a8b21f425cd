//! Integration tests for the cdrip command core

mod dispatch;
mod option_precedence;
mod task_failures;
mod test_utils;

pub use test_utils::*;
