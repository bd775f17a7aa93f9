//! Engine run metrics.
//!
//! - `Parser::run` for normal operation.
//! - `Parser::run_with_metrics` for the CLI trace and verbose translation,
//!   which also want to see every hit and what the resolver did with it.

use super::parser::RuleHit;
use crate::{HitStatus, QuerySpec};
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for [`Parser::run_with_metrics`].
    ///
    /// [`Parser::run_with_metrics`]: super::Parser::run_with_metrics
    pub total: Duration,
    /// Time spent running rule regexes and productions.
    pub matching: Duration,
    /// Time spent resolving hits into the spec.
    pub resolve: Duration,
}

/// Parser output bundled with the resolver's decisions and timing.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub spec: QuerySpec,
    /// Every hit in evaluation order, with what the resolver did with it.
    pub decisions: Vec<(RuleHit, HitStatus)>,
    /// Names of the rules that passed gating.
    pub active_rules: Vec<&'static str>,
    pub total_rules: usize,
    pub metrics: RunMetrics,
}
