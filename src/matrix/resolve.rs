// src/matrix/resolve.rs
use std::collections::HashSet;
use tracing::{debug, info};

use super::trim::{project, trim};
use super::{CommonLabelSet, MatrixGroup};

/// Labels that appear in the header of every matrix of every group.
///
/// Order is first appearance across the groups, matrices and header cells,
/// in that nesting. No groups or no matrices yields an empty set.
pub fn common_labels(groups: &[MatrixGroup]) -> CommonLabelSet {
    let headers: Vec<HashSet<&str>> = groups
        .iter()
        .flat_map(|g| g.matrices.iter())
        .map(|m| m.labels.iter().map(String::as_str).collect())
        .collect();

    let mut common = CommonLabelSet::new();
    for label in groups
        .iter()
        .flat_map(|g| g.matrices.iter())
        .flat_map(|m| m.labels.iter())
    {
        if common.contains(label) {
            continue;
        }
        if headers.iter().all(|h| h.contains(label.as_str())) {
            common.insert(label.clone());
        }
    }
    common
}

/// Trim every matrix to the labels they all share and return that set.
///
/// Rows are cut to the header intersection and columns to the ones holding the
/// sentinel. A label survives only if its column survived in every matrix;
/// matrices are then projected onto the survivors so each one's value columns
/// line up with the returned set.
pub fn reconcile(groups: &[MatrixGroup], sentinel: &str) -> (Vec<MatrixGroup>, CommonLabelSet) {
    let candidates = common_labels(groups);
    info!(
        candidates = candidates.len(),
        groups = groups.len(),
        "resolved header intersection"
    );

    let trimmed: Vec<MatrixGroup> = groups
        .iter()
        .map(|g| MatrixGroup {
            source: g.source.clone(),
            matrices: g
                .matrices
                .iter()
                .map(|m| trim(m, &candidates, sentinel))
                .collect(),
            entities: g.entities.clone(),
            labels: g.labels.clone(),
        })
        .collect();

    let survivors: CommonLabelSet = candidates
        .iter()
        .filter(|label| {
            trimmed
                .iter()
                .flat_map(|g| g.matrices.iter())
                .all(|m| m.has_label(label))
        })
        .cloned()
        .collect();

    for dropped in candidates.difference(&survivors) {
        debug!(label = %dropped, "label lost its sentinel column in at least one matrix");
    }

    let projected = trimmed
        .into_iter()
        .map(|g| MatrixGroup {
            matrices: g.matrices.iter().map(|m| project(m, &survivors)).collect(),
            ..g
        })
        .collect();

    (projected, survivors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::fixtures::{cells, identity};
    use crate::matrix::{Matrix, Row};

    fn group(source: &str, matrices: Vec<Matrix>) -> MatrixGroup {
        MatrixGroup {
            source: source.into(),
            matrices,
            ..MatrixGroup::default()
        }
    }

    #[test]
    fn keeps_labels_shared_by_every_matrix_in_first_seen_order() {
        let groups = vec![
            group("g1", vec![identity("t", &["C", "A", "B"]), identity("t", &["B", "A", "C"])]),
            group("g2", vec![identity("t", &["A", "D", "C"])]),
        ];
        let common = common_labels(&groups);
        assert_eq!(common.into_iter().collect::<Vec<_>>(), ["C", "A"]);
    }

    #[test]
    fn result_is_subset_of_every_header() {
        let groups = vec![
            group("g1", vec![identity("t", &["A", "B", "C", "D"])]),
            group("g2", vec![identity("t", &["D", "B"]), identity("t", &["B", "X", "D"])]),
        ];
        let common = common_labels(&groups);
        for m in groups.iter().flat_map(|g| g.matrices.iter()) {
            assert!(common.iter().all(|l| m.has_label(l)));
        }
        assert_eq!(common.len(), 2);
    }

    #[test]
    fn no_groups_means_no_labels() {
        assert!(common_labels(&[]).is_empty());
        assert!(common_labels(&[group("empty", Vec::new())]).is_empty());
    }

    #[test]
    fn column_without_sentinel_drops_label_everywhere() {
        // C has no "1.0" anywhere in the first group's matrix
        let g1 = Matrix::new(
            "Average1",
            cells(&["A", "B", "C"]),
            vec![
                Row::new("A", cells(&["1.0", "0.5", "0.2"])),
                Row::new("B", cells(&["0.5", "1.0", "0.1"])),
                Row::new("C", cells(&["0.2", "0.1", "0.9"])),
            ],
        );
        let g2 = identity("Average2", &["A", "B", "C"]);
        let groups = vec![group("g1", vec![g1]), group("g2", vec![g2])];

        let (trimmed, common) = reconcile(&groups, "1.0");
        assert_eq!(common.iter().collect::<Vec<_>>(), ["A", "B"]);
        for m in trimmed.iter().flat_map(|g| g.matrices.iter()) {
            assert_eq!(m.labels(), ["A", "B"]);
            assert!(m.rows.iter().all(|r| r.values.len() == 2));
            assert!(m.rows.iter().all(|r| r.key != "C"));
        }
    }

    #[test]
    fn reconcile_preserves_rosters_and_titles() {
        let mut g = group("g1", vec![identity("Average1", &["A", "B"])]);
        g.entities = cells(&["Average1"]);
        g.labels = cells(&["A", "B"]);
        let (trimmed, _) = reconcile(&[g.clone()], "1.0");
        assert_eq!(trimmed[0].entities, g.entities);
        assert_eq!(trimmed[0].labels, g.labels);
        assert_eq!(trimmed[0].titles(), ["Average1"]);
    }
}
