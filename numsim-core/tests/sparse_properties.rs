use num_complex::Complex64;
use numsim_core::{DenseMatrix, SparseMatrix, Triplet};
use proptest::prelude::*;

const ROWS: usize = 6;
const COLS: usize = 5;

/// Distinct coordinates with non-zero integer-valued entries.
fn entries() -> impl Strategy<Value = Vec<(usize, usize, f64)>> {
    prop::collection::btree_map((0..ROWS, 0..COLS), -50i32..50, 0..20).prop_map(|m| {
        m.into_iter()
            .filter(|&(_, v)| v != 0)
            .map(|((r, c), v)| (r, c, v as f64))
            .collect()
    })
}

fn build(entries: &[(usize, usize, f64)]) -> SparseMatrix<f64> {
    let mut m = SparseMatrix::new(ROWS, COLS);
    for &(r, c, v) in entries {
        m.set(r, c, v);
    }
    m
}

proptest! {
    #[test]
    fn insertion_order_does_not_matter(
        (ordered, shuffled) in entries().prop_flat_map(|e| (Just(e.clone()), Just(e).prop_shuffle()))
    ) {
        let a = build(&ordered);
        let b = build(&shuffled);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.nnz(), ordered.len());

        let triplets = shuffled.iter().map(|&(r, c, v)| Triplet::new(r, c, v)).collect();
        prop_assert_eq!(SparseMatrix::from_triplets(ROWS, COLS, triplets).unwrap(), a);
    }

    #[test]
    fn set_zero_removes_exactly_one_entry(entries in entries(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!entries.is_empty());
        let mut m = build(&entries);
        let (r, c, _) = entries[pick.index(entries.len())];
        let before = m.nnz();
        m.set(r, c, 0.0);
        prop_assert!(!m.has(r, c));
        prop_assert_eq!(m.nnz(), before - 1);
    }

    #[test]
    fn erasing_in_any_order_empties_the_matrix(
        entries in entries(),
        steps in prop::collection::vec(any::<usize>(), 1..8),
    ) {
        let mut m = build(&entries);
        let mut round = 0;
        while !m.is_empty() {
            let skip = steps[round % steps.len()] % m.nnz();
            let mut cursor = m.begin();
            for _ in 0..skip {
                cursor = m.advance(cursor);
            }
            let expected_next = m.entry(m.advance(cursor));
            let next = m.erase(cursor);
            prop_assert_eq!(m.entry(next), expected_next);
            round += 1;
        }
        prop_assert_eq!(round, entries.len());
        prop_assert_eq!(m.nnz(), 0);
        prop_assert_eq!(m.begin(), m.end());
    }

    #[test]
    fn cursor_walk_matches_iterator(entries in entries()) {
        let m = build(&entries);
        let mut cursor = m.begin();
        for expected in m.iter() {
            prop_assert_eq!(m.entry(cursor), Some(expected));
            cursor = m.advance(cursor);
        }
        prop_assert!(cursor.is_end());
    }

    #[test]
    fn double_transpose_is_identity(entries in entries()) {
        let m = build(&entries);
        let t = m.transpose();
        prop_assert_eq!(t.dims(), (COLS, ROWS));
        prop_assert_eq!(t.transpose(), m);
    }

    #[test]
    fn sparse_product_matches_dense(a in entries(), b in entries()) {
        let a = build(&a);
        let b = build(&b).transpose();
        let sparse = DenseMatrix::from(&a.matmul(&b).unwrap());
        let dense = DenseMatrix::from(&a).matmul(&DenseMatrix::from(&b)).unwrap();
        prop_assert_eq!(sparse, dense);
    }
}

#[test]
fn serde_round_trip() {
    let m = SparseMatrix::from([[1.0f64, 0.0, 2.5], [0.0, 0.0, 0.0], [0.0, -3.0, 0.0]]);
    let json = serde_json::to_string(&m).unwrap();
    let back: SparseMatrix<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, m);

    let i = Complex64::new(0.0, 1.0);
    let c = SparseMatrix::from([[i, Complex64::new(0.0, 0.0)], [Complex64::new(2.0, 0.0), -i]]);
    let json = serde_json::to_string(&c).unwrap();
    let back: SparseMatrix<Complex64> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, c);
}

#[test]
fn serde_rejects_malformed_storage() {
    let bad_column = r#"{"rows":2,"cols":2,"values":[1.0],"col_indices":[5],"row_ptr":[0,1,1]}"#;
    let err = serde_json::from_str::<SparseMatrix<f64>>(bad_column).unwrap_err();
    assert!(err.to_string().contains("Column index out of bounds"));

    let stored_zero = r#"{"rows":1,"cols":2,"values":[0.0],"col_indices":[0],"row_ptr":[0,1]}"#;
    assert!(serde_json::from_str::<SparseMatrix<f64>>(stored_zero).is_err());

    let huge_rows = format!(
        r#"{{"rows":{},"cols":1,"values":[],"col_indices":[],"row_ptr":[]}}"#,
        usize::MAX
    );
    let err = serde_json::from_str::<SparseMatrix<f64>>(&huge_rows).unwrap_err();
    assert!(err.to_string().contains("row_ptr length"));
}

#[test]
fn dense_serde_round_trip() {
    let d = DenseMatrix::from([[1.0f64, 2.0], [3.0, 4.0]]);
    let json = serde_json::to_string(&d).unwrap();
    assert_eq!(serde_json::from_str::<DenseMatrix<f64>>(&json).unwrap(), d);
}

#[test]
fn dense_serde_rejects_wrong_data_length() {
    let short = r#"{"rows":2,"cols":2,"data":[1.0]}"#;
    let err = serde_json::from_str::<DenseMatrix<f64>>(short).unwrap_err();
    assert!(err.to_string().contains("does not match dimensions"));

    let overflowing = format!(r#"{{"rows":{},"cols":2,"data":[]}}"#, usize::MAX);
    assert!(serde_json::from_str::<DenseMatrix<f64>>(&overflowing).is_err());
}
