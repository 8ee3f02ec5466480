//! Pure merge of classified records into a registry.
//!
//! A registry is unique by contract id and sorted ascending by ordering key.
//! On a contract id collision the record that came first wins, so existing
//! entries take precedence over incoming ones.

use crate::types::ClassifiedRecord;
use std::collections::HashSet;

/// Merges `incoming` into `existing`. An `existing` list that is not a valid
/// registry (unsorted or with duplicates) is repaired by the general path.
pub fn merge(
    existing: Vec<ClassifiedRecord>,
    incoming: Vec<ClassifiedRecord>,
) -> Vec<ClassifiedRecord> {
    let incoming = normalize(incoming);
    match (existing.last(), incoming.first()) {
        (None, _) => incoming,
        (Some(last), Some(first))
            if last.ordering_key() < first.ordering_key() && is_strictly_ascending(&existing) =>
        {
            append_merge(existing, incoming)
        }
        _ => general_merge(existing, incoming),
    }
}

/// Fast path: every incoming key is above the last existing key, so
/// concatenation keeps the order.
pub fn append_merge(
    existing: Vec<ClassifiedRecord>,
    incoming: Vec<ClassifiedRecord>,
) -> Vec<ClassifiedRecord> {
    let mut merged = existing;
    merged.extend(incoming);
    dedup_by_contract_id(merged)
}

/// Concatenates, deduplicates and stable-sorts by ordering key. Valid for any input.
pub fn general_merge(
    existing: Vec<ClassifiedRecord>,
    incoming: Vec<ClassifiedRecord>,
) -> Vec<ClassifiedRecord> {
    let mut merged = existing;
    merged.extend(incoming);
    let mut merged = dedup_by_contract_id(merged);
    merged.sort_by_key(ClassifiedRecord::ordering_key);
    merged
}

fn is_strictly_ascending(records: &[ClassifiedRecord]) -> bool {
    records
        .windows(2)
        .all(|pair| pair[0].ordering_key() < pair[1].ordering_key())
}

fn normalize(records: Vec<ClassifiedRecord>) -> Vec<ClassifiedRecord> {
    general_merge(Vec::new(), records)
}

fn dedup_by_contract_id(records: Vec<ClassifiedRecord>) -> Vec<ClassifiedRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.contract_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContractId;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn record(num: u64) -> ClassifiedRecord {
        ClassifiedRecord::new(format!("0x{num:040x}"), ContractId::new(0, 0, num))
    }

    fn records(nums: &[u64]) -> Vec<ClassifiedRecord> {
        nums.iter().copied().map(record).collect()
    }

    fn random_batch(rng: &mut StdRng, min: u64, max: u64) -> Vec<ClassifiedRecord> {
        let len = rng.gen_range(0..20);
        (0..len)
            .map(|_| {
                let mut record = record(rng.gen_range(min..=max));
                // collisions with a different address must not replace the first record
                if rng.gen_bool(0.2) {
                    record.address = "0xffffffffffffffffffffffffffffffffffffffff".into();
                }
                record
            })
            .collect()
    }

    fn random_registry(rng: &mut StdRng) -> Vec<ClassifiedRecord> {
        let batch = random_batch(rng, 0, 50);
        normalize(batch)
    }

    fn assert_valid_registry(registry: &[ClassifiedRecord]) {
        let unique: HashSet<_> = registry.iter().map(|r| r.contract_id).collect();
        assert_eq!(unique.len(), registry.len(), "duplicates in {registry:?}");
        assert!(
            registry
                .windows(2)
                .all(|pair| pair[0].ordering_key() <= pair[1].ordering_key()),
            "unsorted registry {registry:?}"
        );
    }

    #[test]
    fn existing_entry_wins_and_new_entry_is_appended() {
        let existing = records(&[10]);
        let mut incoming = records(&[10, 15]);
        incoming[0].address = "0xffffffffffffffffffffffffffffffffffffffff".into();

        assert_eq!(merge(existing, incoming), records(&[10, 15]));
    }

    #[test]
    fn empty_registry_takes_normalized_batch() {
        assert_eq!(merge(vec![], records(&[7, 3, 7, 5])), records(&[3, 5, 7]));
        assert_eq!(merge(records(&[1, 2]), vec![]), records(&[1, 2]));
    }

    #[test]
    fn overlapping_batch_uses_general_path() {
        let merged = merge(records(&[1, 5, 9]), records(&[4, 5, 12]));
        assert_eq!(merged, records(&[1, 4, 5, 9, 12]));
    }

    #[test]
    fn fast_path() {
        let merged = merge(records(&[1, 2]), records(&[5, 3, 3]));
        assert_eq!(merged, records(&[1, 2, 3, 5]));
    }

    #[test]
    fn unsorted_registry_is_repaired_on_append() {
        let merged = merge(records(&[5, 1, 3]), records(&[7, 6]));
        assert_eq!(merged, records(&[1, 3, 5, 6, 7]));

        let mut existing = records(&[1, 2, 2]);
        existing[2].address = "0xffffffffffffffffffffffffffffffffffffffff".into();
        assert_eq!(merge(existing, records(&[4])), records(&[1, 2, 4]));
    }

    #[test]
    fn merge_properties() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let existing = random_registry(&mut rng);
            // half of the batches lie above the registry and hit the fast path
            let min = if rng.gen_bool(0.5) { 51 } else { 0 };
            let incoming = random_batch(&mut rng, min, 100);

            let merged = merge(existing.clone(), incoming.clone());
            assert_valid_registry(&merged);

            let merged_twice = merge(merged.clone(), incoming.clone());
            assert_eq!(merged_twice, merged, "merge is not idempotent");

            let general = general_merge(existing.clone(), incoming.clone());
            assert_eq!(merged, general, "fast and general paths disagree");

            for record in &existing {
                assert!(merged.contains(record), "existing {record:?} was replaced");
            }

            // registries written by other tools may be in any order
            let foreign = random_batch(&mut rng, 0, 50);
            let merged = merge(foreign.clone(), incoming.clone());
            assert_valid_registry(&merged);
            assert_eq!(merged, general_merge(foreign, incoming));
        }
    }
}
