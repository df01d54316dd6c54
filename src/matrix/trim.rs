// src/matrix/trim.rs
use super::{CommonLabelSet, Matrix, Row};

/// Cut `matrix` down to `labels`, then drop every column that never holds `sentinel`.
///
/// Rows are kept when cell 0 is in `labels` or empty (separators). Columns are
/// tested against the already row-trimmed body only, so a label whose own row
/// was removed usually loses its diagonal sentinel and goes with it. Order of the
/// surviving rows and columns is unchanged. Short rows read as empty cells.
pub fn trim(matrix: &Matrix, labels: &CommonLabelSet, sentinel: &str) -> Matrix {
    let rows: Vec<&Row> = matrix
        .rows
        .iter()
        .filter(|r| r.is_separator() || labels.contains(&r.key))
        .collect();

    let keep: Vec<usize> = (0..matrix.labels.len())
        .filter(|&j| {
            rows.iter()
                .any(|r| r.values.get(j).map(String::as_str) == Some(sentinel))
        })
        .collect();

    select(matrix, rows, &keep)
}

/// Restrict `matrix` to `labels`, reordering its columns to follow `labels`.
///
/// Labels the matrix does not have are skipped. Separator rows are kept.
pub fn project(matrix: &Matrix, labels: &CommonLabelSet) -> Matrix {
    let rows: Vec<&Row> = matrix
        .rows
        .iter()
        .filter(|r| r.is_separator() || labels.contains(&r.key))
        .collect();

    let keep: Vec<usize> = labels
        .iter()
        .filter_map(|l| matrix.labels.iter().position(|h| h == l))
        .collect();

    select(matrix, rows, &keep)
}

fn select(matrix: &Matrix, rows: Vec<&Row>, columns: &[usize]) -> Matrix {
    let pick = |values: &[String]| -> Vec<String> {
        columns
            .iter()
            .map(|&j| values.get(j).cloned().unwrap_or_default())
            .collect()
    };
    Matrix {
        title: matrix.title.clone(),
        labels: pick(&matrix.labels),
        rows: rows
            .into_iter()
            .map(|r| Row::new(r.key.clone(), pick(&r.values)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::fixtures::{cells, identity};

    fn set(items: &[&str]) -> CommonLabelSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Matrix {
        Matrix::new(
            "Average1",
            cells(&["A", "B", "C"]),
            vec![
                Row::new("A", cells(&["1.0", "0.5", "0.2"])),
                Row::new("", cells(&["", "", ""])),
                Row::new("B", cells(&["0.5", "1.0", "0.1"])),
                Row::new("C", cells(&["0.2", "0.1", "1.0"])),
                Row::new("Average1", cells(&["0.9", "0.9", "0.9"])),
            ],
        )
    }

    #[test]
    fn rows_first_then_sentinel_columns() {
        let out = trim(&sample(), &set(&["A", "B"]), "1.0");
        // C's only "1.0" sat in row C, which is gone
        assert_eq!(out.labels(), ["A", "B"]);
        let keys: Vec<_> = out.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["A", "", "B"]);
        assert_eq!(out.rows[2].values, ["0.5", "1.0"]);
        assert_eq!(out.title, "Average1");
    }

    #[test]
    fn sentinel_is_matched_literally() {
        let m = Matrix::new(
            "t",
            cells(&["A", "B"]),
            vec![
                Row::new("A", cells(&["1", "1.00"])),
                Row::new("B", cells(&["1.0", " 1.0"])),
            ],
        );
        let out = trim(&m, &set(&["A", "B"]), "1.0");
        assert_eq!(out.labels(), ["A"]);
        assert_eq!(out.rows[0].values, ["1"]);
    }

    #[test]
    fn empty_label_set_keeps_only_separators() {
        let out = trim(&sample(), &CommonLabelSet::new(), "1.0");
        assert_eq!(out.rows.len(), 1);
        assert!(out.rows[0].is_separator());
        assert!(out.labels.is_empty());
        assert!(out.rows[0].values.is_empty());
    }

    #[test]
    fn trimming_twice_changes_nothing() {
        let labels = set(&["B", "A", "C"]);
        let once = trim(&identity("Average1", &["A", "B", "C", "D"]), &labels, "1.0");
        let twice = trim(&once, &labels, "1.0");
        assert_eq!(once, twice);
        assert_eq!(once.labels(), ["A", "B", "C"]);
    }

    #[test]
    fn input_matrix_is_left_untouched() {
        let m = sample();
        let before = m.clone();
        let _ = trim(&m, &set(&["A"]), "1.0");
        assert_eq!(m, before);
    }

    #[test]
    fn project_follows_label_order() {
        let out = project(&identity("t", &["A", "B", "C"]), &set(&["C", "A"]));
        assert_eq!(out.labels(), ["C", "A"]);
        let keys: Vec<_> = out.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["A", "C"]);
        // row C, columns [C, A]
        assert_eq!(out.rows[1].values, ["1.0", out.rows[0].values[0].as_str()]);
        assert_eq!(out.rows[0].values[1], "1.0");
    }
}
