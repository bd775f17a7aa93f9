//! Matching and resolution engine.
//!
//! This module is the entry point for turning a [`NormalizedQuery`] into a
//! [`QuerySpec`]. It is split into focused submodules under `src/engine/`
//! while keeping public paths stable (`crate::engine::Parser`,
//! `crate::engine::BucketMask`).
//!
//! ## How the parts work together
//!
//! ```text
//! rules (all)  ──┐
//!               │  CompiledRules::new           (compiled_rules.rs)
//!               └───────────────┬──────────────  sorted by category
//!                               │
//! query ── TriggerInfo::scan ───┼─ select active rules (buckets + phrases)
//!         (trigger.rs)          │
//!                               v
//!                     Parser::match_rules (parser.rs)
//!                       - one regex scan per active rule
//!                       - first successful production = one hit
//!                               │
//!                               v
//!                     resolve_hits (resolve.rs)
//!                       - first hit per category wins
//!                       - differing same-category hits -> Ambiguous
//!                       - relative times / caller -> concrete values
//!                       - QuerySpecBuilder -> QuerySpec
//! ```
//!
//! There is no fixpoint iteration: every rule looks at the normalized text
//! exactly once, and categories never feed each other.
//!
//! ## Responsibilities by module
//!
//! - `compiled_rules.rs`: orders rules by category and builds bucket indexes.
//! - `trigger.rs`: scans the normalized query for coarse buckets and phrases.
//! - `parser.rs`: runs active rules and records hits.
//! - `resolve.rs`: the filter resolver (conflicts, relative values, building).
//! - `metrics.rs`: timing for a run.
//!
//! ## Debugging
//!
//! Run with `RUST_LOG=helpdesk_query=trace` to see activation, hits and
//! resolution decisions.
//!
//! [`NormalizedQuery`]: crate::NormalizedQuery
//! [`QuerySpec`]: crate::QuerySpec

#[path = "engine/compiled_rules.rs"]
mod compiled_rules;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/resolve.rs"]
mod resolve;
#[path = "engine/trigger.rs"]
mod trigger;

pub use compiled_rules::BucketMask;
pub use parser::{Parser, RuleHit};
