use approx::assert_relative_eq;
use faer::{Mat, MatRef};
use procrustes::{
    align, align_orthogonal, align_permutation, align_rotational, evaluate, preprocess,
    AlignmentConfig, PadMode, Transformation, TransformationFamily,
};
use procrustes_linalg::ops;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Mat<f64> {
    Mat::from_fn(rows, cols, |_, _| rng.random_range(-10.0..10.0))
}

fn single(t: &Transformation) -> &Mat<f64> {
    match t {
        Transformation::Single(t) => t,
        Transformation::Double { .. } => panic!("expected a single transformation"),
    }
}

fn assert_mat_eq(a: MatRef<'_, f64>, b: MatRef<'_, f64>, eps: f64) {
    assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()));
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            assert_relative_eq!(a.read(i, j), b.read(i, j), epsilon = eps);
        }
    }
}

#[test]
fn orthogonal_self_alignment_is_identity() {
    let mut rng = StdRng::seed_from_u64(100);
    for n in 1..6 {
        let a = random_matrix(&mut rng, n, n);
        let res = align_orthogonal(a.as_ref(), a.as_ref(), &AlignmentConfig::default())
            .expect("orthogonal alignment should succeed");
        assert_mat_eq(
            single(&res.transformation).as_ref(),
            Mat::<f64>::identity(n, n).as_ref(),
            1e-8,
        );
        assert_relative_eq!(res.error, 0.0, epsilon = 1e-8);
    }
}

#[test]
fn permutation_roundtrip() {
    let mut rng = StdRng::seed_from_u64(101);
    for n in [2, 4, 7] {
        let a = random_matrix(&mut rng, 5, n);
        let mut perm = (0..n).collect::<Vec<_>>();
        perm.shuffle(&mut rng);
        let p = ops::permutation_matrix(&perm).expect("valid permutation");
        let b = ops::matmul(a.as_ref(), p.as_ref());

        let res = align_permutation(a.as_ref(), b.as_ref(), &AlignmentConfig::default())
            .expect("permutation alignment should succeed");
        assert_eq!(single(&res.transformation), &p);
        assert_relative_eq!(res.error, 0.0, epsilon = 1e-8);
    }
}

#[test]
fn solver_outputs_stay_in_their_family() {
    let mut rng = StdRng::seed_from_u64(102);
    let config = AlignmentConfig::default();
    for _ in 0..10 {
        let a = random_matrix(&mut rng, 6, 4);
        let b = random_matrix(&mut rng, 6, 4);

        let res = align_orthogonal(a.as_ref(), b.as_ref(), &config).expect("orthogonal");
        assert!(evaluate::check_orthogonal(single(&res.transformation).as_ref(), 1e-8).is_ok());

        let res = align_rotational(a.as_ref(), b.as_ref(), &config).expect("rotational");
        let t = single(&res.transformation);
        assert!(evaluate::check_orthogonal(t.as_ref(), 1e-8).is_ok());
        assert_relative_eq!(t.determinant(), 1.0, epsilon = 1e-8);

        let res = align_permutation(a.as_ref(), b.as_ref(), &config).expect("permutation");
        let t = single(&res.transformation);
        for i in 0..4 {
            let row = (0..4).map(|j| t.read(i, j)).sum::<f64>();
            let col = (0..4).map(|j| t.read(j, i)).sum::<f64>();
            assert_eq!(row, 1.0);
            assert_eq!(col, 1.0);
        }
        assert!(evaluate::check_permutation(t.as_ref()).is_ok());
    }
}

#[test]
fn reported_error_matches_transformation() {
    let mut rng = StdRng::seed_from_u64(103);
    let a = random_matrix(&mut rng, 5, 3);
    let b = random_matrix(&mut rng, 5, 3);
    for family in [
        TransformationFamily::Orthogonal,
        TransformationFamily::Rotational,
        TransformationFamily::Permutation,
        TransformationFamily::Generic,
    ] {
        let res = align(a.as_ref(), b.as_ref(), family, &AlignmentConfig::default())
            .expect("alignment should succeed");
        let t = single(&res.transformation);
        let expected = evaluate::one_sided_error(res.new_a.as_ref(), res.new_b.as_ref(), t.as_ref());
        assert_relative_eq!(res.error, expected, epsilon = 1e-9);
    }
}

#[test]
fn preprocess_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(104);
    let mut a = random_matrix(&mut rng, 5, 3);
    let b = random_matrix(&mut rng, 4, 4);
    for j in 0..3 {
        a.write(2, j, 0.0);
    }

    let configs = [
        AlignmentConfig::default(),
        AlignmentConfig::new().with_translate(true).with_scale(true),
        AlignmentConfig::new()
            .with_remove_zero_row(false)
            .with_remove_zero_col(false)
            .with_scale(true),
        AlignmentConfig::new().with_pad_mode(PadMode::Square),
    ];
    for config in configs {
        let (a1, b1) = preprocess(a.as_ref(), b.as_ref(), &config).expect("first pass");
        let (a2, b2) = preprocess(a1.as_ref(), b1.as_ref(), &config).expect("second pass");
        assert_mat_eq(a1.as_ref(), a2.as_ref(), 1e-10);
        assert_mat_eq(b1.as_ref(), b2.as_ref(), 1e-10);
    }
}

#[test]
fn generic_recovers_linear_map() {
    let mut rng = StdRng::seed_from_u64(105);
    let a = random_matrix(&mut rng, 8, 3);
    let t = Mat::<f64>::from_fn(3, 3, |_, _| rng.random_range(-1.0..1.0));
    let b = ops::matmul(a.as_ref(), t.as_ref());

    let res = align(
        a.as_ref(),
        b.as_ref(),
        TransformationFamily::Generic,
        &AlignmentConfig::default(),
    )
    .expect("generic alignment should succeed");
    assert_mat_eq(single(&res.transformation).as_ref(), t.as_ref(), 1e-6);
    assert_relative_eq!(res.error, 0.0, epsilon = 1e-8);
}

#[test]
fn unknown_option_is_rejected() {
    let res = AlignmentConfig::from_json(r#"{"translate": true, "lapack_driver": "gesvd"}"#);
    assert!(matches!(res, Err(procrustes::ProcrustesError::Config(_))));
}
