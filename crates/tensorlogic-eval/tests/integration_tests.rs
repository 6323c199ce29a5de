//! Integration tests for tensorlogic-eval
//!
//! These tests exercise whole evaluation scenarios: incremental feeding, sharded
//! accumulation with merging, masking and time-series splitting.

use approx::assert_abs_diff_eq;
use scirs2_core::ndarray::{array, s, Array, Array2, Array3, Dimension, ShapeBuilder};
use scirs2_core::random::{Rng, SeedableRng, StdRng};
use tensorlogic_eval::{EvalError, RegressionEvaluator, RegressionMetric};

fn create_test_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Array of uniform values in `[0, 1)`.
fn random_array<Sh: ShapeBuilder>(rng: &mut StdRng, shape: Sh) -> Array<f64, Sh::Dim>
where
    Sh::Dim: Dimension,
{
    Array::from_shape_simple_fn(shape, || rng.random::<f64>())
}

/// Test: perfect predictions give zero error and unit correlation
#[test]
fn test_perfect_predictions() -> Result<(), EvalError> {
    let n_cols = 5;
    let mut rng = create_test_rng(12345);
    let mut eval = RegressionEvaluator::with_columns(n_cols)?;

    for _ in 0..100 {
        let batch: Array2<f64> = random_array(&mut rng, (3, n_cols));
        eval.eval(&batch.view(), &batch.view())?;
    }

    for col in 0..n_cols {
        assert_abs_diff_eq!(eval.mean_squared_error(col)?, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(eval.mean_absolute_error(col)?, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(eval.root_mean_squared_error(col)?, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(eval.relative_squared_error(col)?, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(eval.correlation_r2(col)?, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(eval.pearson_correlation(col)?, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(eval.r_squared(col)?, 1.0, epsilon = 1e-6);
    }

    Ok(())
}

/// Test: reference values, reproduced exactly after reset
#[test]
fn test_known_values() -> Result<(), EvalError> {
    let labels = array![[1.0, 2.0, 3.0], [0.1, 0.2, 0.3], [6.0, 5.0, 4.0]];
    let predicted = array![[2.5, 3.2, 3.8], [2.15, 1.3, -1.2], [7.0, 4.5, 3.0]];

    let exp_mse = [2.484166667, 0.966666667, 1.296666667];
    let exp_mae = [1.516666667, 0.933333333, 1.1];
    let exp_rse = [0.368813923, 0.246598639, 0.530937216];
    let exp_corr = [0.997013483, 0.968619605, 0.915603032];
    let exp_r2 = [0.63118608, 0.75340136, 0.46906278];

    let mut eval = RegressionEvaluator::with_columns(3)?;
    let mut runs = Vec::new();

    for _ in 0..2 {
        eval.eval(&labels.view(), &predicted.view())?;

        for col in 0..3 {
            assert_abs_diff_eq!(eval.mean_squared_error(col)?, exp_mse[col], epsilon = 1e-5);
            assert_abs_diff_eq!(eval.mean_absolute_error(col)?, exp_mae[col], epsilon = 1e-5);
            assert_abs_diff_eq!(
                eval.root_mean_squared_error(col)?,
                exp_mse[col].sqrt(),
                epsilon = 1e-5
            );
            assert_abs_diff_eq!(
                eval.relative_squared_error(col)?,
                exp_rse[col],
                epsilon = 1e-5
            );
            assert_abs_diff_eq!(
                eval.pearson_correlation(col)?,
                exp_corr[col],
                epsilon = 1e-5
            );
            assert_abs_diff_eq!(eval.r_squared(col)?, exp_r2[col], epsilon = 1e-5);
        }

        runs.push(eval.reports()?);
        eval.reset();
        assert_eq!(eval.num_columns(), 3);
        assert_eq!(eval.example_count(0)?, 0);
    }

    assert_eq!(runs[0], runs[1]);
    Ok(())
}

/// Test: independently accumulated shards merge to the single-evaluator result
#[test]
fn test_merging_matches_single_evaluator() -> Result<(), EvalError> {
    let mut rng = create_test_rng(12345);
    let (n_rows, n_cols, n_minibatches, n_instances) = (20, 3, 5, 4);

    let mut single = RegressionEvaluator::with_columns(n_cols)?;
    let mut shards = Vec::new();

    for _ in 0..n_instances {
        let mut shard = RegressionEvaluator::with_columns(n_cols)?;
        for _ in 0..n_minibatches {
            let p: Array2<f64> = random_array(&mut rng, (n_rows, n_cols));
            let act: Array2<f64> = random_array(&mut rng, (n_rows, n_cols));
            single.eval(&act.view(), &p.view())?;
            shard.eval(&act.view(), &p.view())?;
        }
        shards.push(shard);
    }

    // Left fold.
    let mut merged = shards[0].clone();
    for shard in &shards[1..] {
        merged.merge(shard)?;
    }

    // Reversed order, pairwise grouping.
    let mut right = shards[3].clone();
    right.merge(&shards[2])?;
    let mut left = shards[1].clone();
    left.merge(&shards[0])?;
    right.merge(&left)?;

    let folded = RegressionEvaluator::merge_all(shards.iter().rev())?;

    for candidate in [&merged, &right, &folded] {
        assert!(candidate.approx_eq(&single));
        for col in 0..n_cols {
            for metric in RegressionMetric::ALL {
                assert_abs_diff_eq!(
                    candidate.metric(metric, col)?,
                    single.metric(metric, col)?,
                    epsilon = 1e-9
                );
            }
        }
    }

    Ok(())
}

/// Test: merge leaves the other evaluator untouched and rejects column conflicts
#[test]
fn test_merge_is_one_directional() -> Result<(), EvalError> {
    let labels = array![[1.0, 2.0], [3.0, 4.0]];
    let preds = array![[0.5, 2.5], [3.0, 3.0]];

    let mut a = RegressionEvaluator::new();
    let mut b = RegressionEvaluator::new();
    a.eval(&labels.view(), &preds.view())?;
    b.eval(&preds.view(), &labels.view())?;

    let b_before = b.clone();
    a.merge(&b)?;
    assert_eq!(b, b_before);
    assert_eq!(a.example_count(1)?, 4);

    let mut three = RegressionEvaluator::with_columns(3)?;
    let three_before = three.clone();
    let a_before = a.clone();
    assert!(matches!(
        three.merge(&a),
        Err(EvalError::InvalidArgument(_))
    ));
    assert!(matches!(
        a.merge(&three_before),
        Err(EvalError::InvalidArgument(_))
    ));
    assert_eq!(three, three_before);
    assert_eq!(a, a_before);

    Ok(())
}

/// Test: masked elements are excluded from every sum, including the count
#[test]
fn test_per_output_masking() -> Result<(), EvalError> {
    let l = array![[1.0, 2.0, 3.0], [10.0, 20.0, 30.0], [-5.0, -10.0, -20.0]];
    let predictions = Array2::<f64>::zeros(l.raw_dim());
    let mask = array![[0.0, 1.0, 1.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];

    let mut re = RegressionEvaluator::new();
    re.eval_masked(&l.view(), &predictions.view(), &mask.view())?;

    let mse = [100.0, (4.0 + 400.0 + 100.0) / 3.0, 9.0];
    let mae = [10.0, (2.0 + 20.0 + 10.0) / 3.0, 3.0];
    let rmse = [10.0, ((4.0 + 400.0 + 100.0) / 3.0_f64).sqrt(), 3.0];
    let counts = [1, 3, 1];

    for i in 0..3 {
        assert_abs_diff_eq!(re.mean_squared_error(i)?, mse[i], epsilon = 1e-6);
        assert_abs_diff_eq!(re.mean_absolute_error(i)?, mae[i], epsilon = 1e-6);
        assert_abs_diff_eq!(re.root_mean_squared_error(i)?, rmse[i], epsilon = 1e-6);
        assert_eq!(re.example_count(i)?, counts[i]);
    }

    Ok(())
}

/// Test: splitting a time series batch along the time axis
#[test]
fn test_time_series_split() -> Result<(), EvalError> {
    let mut rng = create_test_rng(42);
    let out1: Array3<f64> = random_array(&mut rng, (3, 5, 20));
    let label1: Array3<f64> = random_array(&mut rng, (3, 5, 20));

    let mut e1 = RegressionEvaluator::new();
    let mut e2 = RegressionEvaluator::new();

    e1.eval(&label1.view(), &out1.view())?;
    e2.eval(
        &label1.slice(s![.., .., 0..10]),
        &out1.slice(s![.., .., 0..10]),
    )?;
    e2.eval(
        &label1.slice(s![.., .., 10..20]),
        &out1.slice(s![.., .., 10..20]),
    )?;

    assert_eq!(e1.num_columns(), 5);
    assert_eq!(e1.example_count(0)?, 60);
    assert!(e1.approx_eq(&e2));
    Ok(())
}

/// Test: with exactly representable data the split result is bit-identical
#[test]
fn test_time_series_split_exact() -> Result<(), EvalError> {
    let labels = Array3::from_shape_fn((2, 3, 8), |(e, c, t)| (e * 7 + c * 3 + t) as f64);
    let preds = Array3::from_shape_fn((2, 3, 8), |(e, c, t)| ((e + c + t) % 5) as f64);

    let mut whole = RegressionEvaluator::new();
    whole.eval(&labels.view(), &preds.view())?;

    let mut split = RegressionEvaluator::new();
    for (start, end) in [(5, 8), (0, 2), (2, 5)] {
        split.eval(
            &labels.slice(s![.., .., start..end]),
            &preds.slice(s![.., .., start..end]),
        )?;
    }

    assert_eq!(whole, split);
    Ok(())
}

/// Test: fixed column count rejects mismatching batches before mutating anything
#[test]
fn test_eval_parameters() -> Result<(), EvalError> {
    let spec_cols = 5;
    let mut eval = RegressionEvaluator::with_columns(spec_cols)?;
    let fresh = eval.clone();

    let labels = Array2::<f64>::ones((1, 3));
    let preds = Array2::<f64>::ones((1, 6));
    assert!(matches!(
        eval.eval(&labels.view(), &preds.view()),
        Err(EvalError::InvalidArgument(_))
    ));

    let preds = Array2::<f64>::ones((1, 3));
    assert!(matches!(
        eval.eval(&labels.view(), &preds.view()),
        Err(EvalError::InvalidArgument(_))
    ));

    assert_eq!(eval, fresh);
    Ok(())
}

/// Test: shards accumulated on worker threads and merged afterwards
#[test]
fn test_parallel_shards() -> Result<(), EvalError> {
    let mut rng = create_test_rng(7);
    let batches: Vec<(Array2<f64>, Array2<f64>)> = (0..8)
        .map(|_| (random_array(&mut rng, (16, 4)), random_array(&mut rng, (16, 4))))
        .collect();

    let shards: Vec<RegressionEvaluator> = std::thread::scope(|scope| {
        let handles: Vec<_> = batches
            .chunks(2)
            .map(|chunk| {
                scope.spawn(move || -> Result<RegressionEvaluator, EvalError> {
                    let mut shard = RegressionEvaluator::new();
                    for (labels, preds) in chunk {
                        shard.eval(&labels.view(), &preds.view())?;
                    }
                    Ok(shard)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let mut sequential = RegressionEvaluator::new();
    for (labels, preds) in &batches {
        sequential.eval(&labels.view(), &preds.view())?;
    }

    let merged = RegressionEvaluator::merge_all(&shards)?;
    assert!(merged.approx_eq(&sequential));
    assert_abs_diff_eq!(
        merged.average_mean_squared_error()?,
        sequential.average_mean_squared_error()?,
        epsilon = 1e-12
    );
    Ok(())
}

/// Test: column averages and report snapshots
#[test]
fn test_averages_and_reports() -> Result<(), EvalError> {
    let labels = array![[1.0, 2.0], [3.0, 6.0], [5.0, 4.0]];
    let preds = array![[2.0, 2.0], [3.0, 4.0], [4.0, 4.0]];

    let mut eval = RegressionEvaluator::with_column_names(["speed", "load"])?;
    eval.eval(&labels.view(), &preds.view())?;

    let mse0 = eval.mean_squared_error(0)?;
    let mse1 = eval.mean_squared_error(1)?;
    assert_abs_diff_eq!(eval.average_mean_squared_error()?, (mse0 + mse1) / 2.0);
    assert_abs_diff_eq!(
        eval.score_for_metric(RegressionMetric::RSquared)?,
        (eval.r_squared(0)? + eval.r_squared(1)?) / 2.0
    );

    let reports = eval.reports()?;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].name, "load");
    assert_eq!(reports[1].count, 3);
    assert_eq!(reports[0].mean_squared_error, Some(mse0));
    Ok(())
}
