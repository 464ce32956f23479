//! Pure analysis passes over one batch of attempt records.
//!
//! Every function here is synchronous and side-effect free: the same batch
//! always yields the same output, and no state survives between calls.

pub mod classifier;
pub mod concepts;
pub mod error_patterns;
pub mod recommend;
pub mod subjects;
pub mod units;

use std::collections::HashMap;
use std::hash::Hash;

use crate::records::AttemptRecord;

pub use classifier::{correct_rate, trend, weakness_level};
pub use concepts::analyze_concepts;
pub use error_patterns::analyze_error_patterns;
pub use recommend::synthesize_recommendations;
pub use subjects::{analyze_difficulty, analyze_subjects, average_score};
pub use units::analyze_units;

/// Group records by a key, keeping groups in first-seen order.
/// Records whose key function returns `None` are skipped.
pub(crate) fn group_ordered<'a, K, F>(
    records: &'a [AttemptRecord],
    mut key_of: F,
) -> Vec<(K, Vec<&'a AttemptRecord>)>
where
    K: Hash + Eq + Clone,
    F: FnMut(&'a AttemptRecord) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a AttemptRecord>)> = Vec::new();

    for record in records {
        let Some(key) = key_of(record) else {
            continue;
        };
        match index.get(&key) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![record]));
            }
        }
    }
    groups
}

/// Number of records marked correct.
pub(crate) fn count_correct(records: &[&AttemptRecord]) -> u32 {
    records.iter().filter(|r| r.is_correct).count() as u32
}
