//! Rule compilation and indexing.
//!
//! Parsing is split into two phases:
//!
//! 1. **Compile/index rules** (this module): order the rule set by category
//!    (the evaluation order) and index it with coarse metadata.
//! 2. **Run** (see `parser.rs`): scan the query for coarse triggers
//!    (`trigger.rs`), select a subset of rules, then match and resolve.
//!
//! ## Extension points
//!
//! - Adding a new bucket:
//!   1. Add a `BucketMask` bit.
//!   2. Add a `BUCKET_*` constant and bump `BUCKET_COUNT`.
//!   3. Teach `CompiledRules::new` to index that bucket.
//!   4. Teach `TriggerInfo::scan` (in `trigger.rs`) to detect it.
//!
//! ## Invariants
//!
//! - `RuleId` is an index into `CompiledRules::rules` and `CompiledRules::metas`.
//!   Those vectors must stay aligned.
//! - `rules` is sorted by `Category`; the sort is stable so declaration order
//!   inside a category is preserved.

use crate::{Category, Rule};

/// Rule identifier (index into the rules vector).
pub(crate) type RuleId = usize;

bitflags::bitflags! {
    /// Coarse buckets for fast input classification.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BucketMask: u32 {
        const HAS_DIGITS = 1 << 0;
        const TIMEISH    = 1 << 1;
        const NAMEISH    = 1 << 2;
    }
}

/// Metadata attached to a rule.
#[derive(Clone, Copy, Debug)]
pub struct RuleMeta {
    pub category: Category,
    pub optional_phrases: &'static [&'static str],
    pub buckets: BucketMask,
}

#[derive(Default, Debug)]
pub struct RuleIndex {
    pub always_on: Vec<RuleId>,
    pub by_bucket: [Vec<RuleId>; BUCKET_COUNT],
}

pub const BUCKET_COUNT: usize = 3;
pub const BUCKET_HAS_DIGITS: usize = 0;
pub const BUCKET_TIMEISH: usize = 1;
pub const BUCKET_NAMEISH: usize = 2;

const BUCKETS: [(BucketMask, usize); BUCKET_COUNT] = [
    (BucketMask::HAS_DIGITS, BUCKET_HAS_DIGITS),
    (BucketMask::TIMEISH, BUCKET_TIMEISH),
    (BucketMask::NAMEISH, BUCKET_NAMEISH),
];

/// Pre-compiled rule set with metadata and indexes.
#[derive(Debug)]
pub struct CompiledRules<'a> {
    pub rules: Vec<&'a Rule>,
    pub metas: Vec<RuleMeta>,
    pub index: RuleIndex,
}

impl<'a> CompiledRules<'a> {
    /// Create a compiled rule set from a slice of rules.
    pub fn new(rules: &'a [Rule]) -> Self {
        let mut rule_refs: Vec<&Rule> = rules.iter().collect();
        rule_refs.sort_by_key(|r| r.category);

        let metas: Vec<RuleMeta> = rule_refs
            .iter()
            .map(|r| RuleMeta {
                category: r.category,
                optional_phrases: r.optional_phrases,
                buckets: BucketMask::from_bits_truncate(r.buckets),
            })
            .collect();

        let mut index = RuleIndex::default();
        for (id, meta) in metas.iter().enumerate() {
            if meta.buckets.is_empty() {
                // No bucket requirements -> always on (phrase filtering happens later)
                index.always_on.push(id);
                continue;
            }
            for (mask, slot) in BUCKETS {
                if meta.buckets.contains(mask) {
                    index.by_bucket[slot].push(id);
                }
            }
        }

        CompiledRules { rules: rule_refs, metas, index }
    }

    /// Ids of rules whose bucket requirements intersect `buckets`, plus the
    /// always-on rules.
    pub fn candidates(&self, buckets: BucketMask) -> Vec<RuleId> {
        let mut ids = self.index.always_on.clone();
        for (mask, slot) in BUCKETS {
            if buckets.contains(mask) {
                ids.extend(&self.index.by_bucket[slot]);
            }
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
