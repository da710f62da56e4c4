//! Selection of one image across a prioritized list of tag sets.
//!
//! [`select_across_tag_sets`] tries tag sets in order and stops at the
//! first one that yields any record; [`pick`] applies the quality filter
//! and the randomized choice to one tag set's results.
//!
//! Randomness is always an explicit generator argument. Production
//! callers construct a fresh [`rand::rngs::StdRng`] per call so repeated
//! calls do not correlate; tests pass a seeded one.

use std::future::Future;

use rand::Rng;
use tracing::{debug, warn};

use crate::api::{ImageRecord, SelectionCriteria, TagSet};

/// Try `tag_sets` in priority order and return one record from the
/// first set that yields any.
///
/// `query` is invoked with each tag set merged with
/// `criteria.exclude_terms` and is expected to perform the fetch and
/// parse for that set. A failed query is logged and treated as zero
/// results, so a bad tag cannot prevent the fallbacks from being tried.
/// Later tag sets are never consulted once one yields a record, even
/// when all of its records fail the quality filter (see [`pick`]).
///
/// Returns `None` when every tag set yields nothing. That is a
/// legitimate terminal outcome, not an error.
pub async fn select_across_tag_sets<Q, F, R>(
    tag_sets: &[TagSet],
    criteria: &SelectionCriteria,
    mut query: Q,
    rng: &mut R,
) -> Option<ImageRecord>
where
    Q: FnMut(TagSet) -> F,
    F: Future<Output = anyhow::Result<Vec<ImageRecord>>>,
    R: Rng,
{
    for tag_set in tag_sets {
        let merged = tag_set.with_excludes(&criteria.exclude_terms);
        let records = match query(merged).await {
            Ok(records) => records,
            Err(err) => {
                warn!(tags = %tag_set.joined(), "query failed, trying next tag set: {err:#}");
                continue;
            }
        };
        if records.is_empty() {
            debug!(tags = %tag_set.joined(), "no records, trying next tag set");
            continue;
        }
        debug!(tags = %tag_set.joined(), count = records.len(), "tag set yielded records");
        return pick(records, criteria, rng);
    }
    None
}

/// Choose one record from one tag set's results.
///
/// Uniformly random among the records passing the quality filter of
/// `criteria`; when none pass, uniformly random among all of them.
/// `None` only when `records` is empty.
pub fn pick<R: Rng>(
    mut records: Vec<ImageRecord>,
    criteria: &SelectionCriteria,
    rng: &mut R,
) -> Option<ImageRecord> {
    if records.is_empty() {
        return None;
    }

    let well_sized: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| criteria.is_well_sized(record))
        .map(|(i, _)| i)
        .collect();

    let index = if well_sized.is_empty() {
        debug!(
            count = records.len(),
            "no record passed the quality filter, choosing among all"
        );
        rng.gen_range(0..records.len())
    } else {
        well_sized[rng.gen_range(0..well_sized.len())]
    };

    Some(records.swap_remove(index))
}
