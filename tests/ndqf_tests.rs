//! End-to-end tests for the quadratic-form engine: discriminant groups and
//! correction terms on known forms, serial/parallel agreement, idempotence.

use corrterm::{render_terms, IntMatrix, Ndqf};
use num_rational::Ratio;

fn form(rows: &[Vec<i64>]) -> Ndqf {
    Ndqf::new(&IntMatrix::from_rows(rows).unwrap()).unwrap()
}

#[test]
fn one_by_one_boundary() {
    let q = form(&[vec![-1]]);
    assert_eq!(q.group().to_string(), "1");
    let terms = q.correction_terms(false);
    assert_eq!(terms, vec![Ratio::new(0, 1)]);
    assert_eq!(render_terms(&terms), "0");
}

#[test]
fn negated_identity_is_trivial() {
    let q = form(&[
        vec![-1, 0, 0],
        vec![0, -1, 0],
        vec![0, 0, -1],
    ]);
    assert!(q.group().structure().is_empty());
    let terms = q.correction_terms(false);
    assert_eq!(terms, vec![Ratio::new(0, 1)]);
}

#[test]
fn cyclic_sixteen_form() {
    let q = form(&[vec![-5, -2], vec![-2, -4]]);
    assert_eq!(q.decomposition().diagonal(), vec![1, 16]);
    assert_eq!(q.group().to_string(), "Z/16Z");
    assert_eq!(q.group().order(), 16);

    let terms = q.correction_terms(false);
    assert_eq!(terms.len(), 16);
    for t in &terms {
        assert_eq!(4 % t.denom(), 0, "denominator of {} does not divide 4", t);
    }
}

#[test]
fn five_by_five_plumbing_form() {
    let q = form(&[
        vec![-2, 1, 0, 0, 0],
        vec![1, -3, 1, 1, 0],
        vec![0, 1, -2, 0, 0],
        vec![0, 1, 0, -2, 1],
        vec![0, 0, 0, 1, -2],
    ]);
    assert_eq!(q.decomposition().diagonal(), vec![1, 1, 1, 1, 16]);
    assert_eq!(q.group().to_string(), "Z/16Z");
    assert_eq!(q.correction_terms(false).len(), 16);
}

#[test]
fn tetrahedral_form_has_order_four_group() {
    // det = -4, so the discriminant group is Z/4Z with four cosets.
    let q = form(&[
        vec![-2, -1, -1],
        vec![-1, -2, -1],
        vec![-1, -1, -2],
    ]);
    assert_eq!(q.decomposition().diagonal(), vec![1, 1, 4]);
    assert_eq!(q.group().to_string(), "Z/4Z");
    let terms = q.correction_terms(false);
    assert_eq!(terms.len(), 4);
}

#[test]
fn correction_terms_are_idempotent() {
    let q = form(&[vec![-5, -2], vec![-2, -4]]);
    let first = q.correction_terms(false);
    let second = q.correction_terms(false);
    assert_eq!(first, second);
}

#[test]
fn serial_and_parallel_agree() {
    let cases: Vec<Vec<Vec<i64>>> = vec![
        vec![vec![-1]],
        vec![vec![-2]],
        vec![vec![-5, -2], vec![-2, -4]],
        vec![vec![-2, 1], vec![1, -2]],
        vec![
            vec![-2, -1, -1],
            vec![-1, -2, -1],
            vec![-1, -1, -2],
        ],
        vec![
            vec![-2, 1, 0, 0, 0],
            vec![1, -3, 1, 1, 0],
            vec![0, 1, -2, 0, 0],
            vec![0, 1, 0, -2, 1],
            vec![0, 0, 0, 1, -2],
        ],
    ];
    for rows in cases {
        let q = form(&rows);
        let serial = q.correction_terms(false);
        let parallel = q.correction_terms(true);
        assert_eq!(
            serial, parallel,
            "serial/parallel mismatch for {:?}",
            rows
        );
    }
}

#[test]
fn representatives_cover_all_classes_once() {
    let q = form(&[vec![-2, 1], vec![1, -2]]);
    assert_eq!(q.group().structure(), &[3]);
    let reps = q.representatives();
    assert_eq!(reps.len(), 3);
    for (i, a) in reps.iter().enumerate() {
        for (j, b) in reps.iter().enumerate() {
            assert_eq!(q.same_class(a, b), i == j);
        }
    }
    // every characteristic covector lands in exactly one class
    for alpha in q.characteristic_covectors() {
        let characteristic = alpha
            .iter()
            .zip(q.matrix().diagonal())
            .all(|(a, d)| (a - d) % 2 == 0);
        if !characteristic {
            continue;
        }
        let hits = reps.iter().filter(|rep| q.same_class(&alpha, rep)).count();
        assert_eq!(hits, 1, "covector {:?} hit {} classes", alpha, hits);
    }
}

#[test]
fn engine_is_shareable_across_threads() {
    let q = form(&[vec![-5, -2], vec![-2, -4]]);
    let expected = q.correction_terms(false);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| q.correction_terms(true)))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

#[test]
fn render_terms_formats_integers_and_fractions() {
    let terms = vec![Ratio::new(-3, 2), Ratio::new(2, 1), Ratio::new(0, 1)];
    assert_eq!(render_terms(&terms), "-3/2, 2, 0");
}
