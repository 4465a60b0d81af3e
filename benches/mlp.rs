use criterion::{Criterion, black_box, criterion_group, criterion_main};

use rand::SeedableRng;
use rand::rngs::StdRng;

use mlp_sgd::{
    Activation, BatchSize, Config, Estimator, Init, Loss, Matrix, Mlp, MomentumState, StepParams,
};

const BATCH: usize = 32;

fn network() -> Mlp {
    let mut rng = StdRng::seed_from_u64(0);
    Mlp::new_with_rng(128, &[256, 256], 10, Init::Normal, 0.1, &mut rng).unwrap()
}

fn batch(rows: usize, cols: usize) -> Matrix {
    let data = (0..rows * cols).map(|i| (i % 17) as f64 / 17.0 - 0.5).collect();
    Matrix::from_flat(data, rows, cols).unwrap()
}

fn mlp_forward_bench(c: &mut Criterion) {
    let mlp = network();
    let x = batch(BATCH, mlp.input_dim());

    c.bench_function("mlp_forward_128_256_256_10_batch32", |b| {
        b.iter(|| {
            let cache = mlp
                .forward(black_box(&x), Activation::Relu, Activation::Identity)
                .unwrap();
            black_box(cache);
        })
    });
}

fn mlp_backward_step_bench(c: &mut Criterion) {
    let mut mlp = network();
    let mut state = MomentumState::new(&mlp);
    let x = batch(BATCH, mlp.input_dim());
    let y = batch(BATCH, mlp.output_dim());
    let params = StepParams {
        lr: 1e-3,
        momentum: 0.9,
        alpha: 1e-4,
        batch_fraction: 1.0,
    };

    c.bench_function("mlp_backward_step_128_256_256_10_batch32", |b| {
        b.iter(|| {
            let cache = mlp.forward(&x, Activation::Relu, Activation::Identity).unwrap();
            let grads = mlp
                .backward(
                    &cache,
                    black_box(&y),
                    Activation::Relu,
                    Activation::Identity,
                    Loss::Squared,
                )
                .unwrap();
            state.step(&mut mlp, &grads, params);
        })
    });
}

fn estimator_fit_bench(c: &mut Criterion) {
    let x = batch(256, 16);
    let y = batch(256, 1);

    c.bench_function("estimator_fit_16_64_1_epochs10", |b| {
        b.iter(|| {
            let mut est = Estimator::regressor(Config {
                hidden_layer_sizes: vec![64],
                batch_size: BatchSize::Fixed(32),
                max_iter: 10,
                random_state: Some(0),
                ..Config::default()
            })
            .unwrap();
            black_box(est.fit(&x, &y).unwrap());
        })
    });
}

criterion_group!(
    benches,
    mlp_forward_bench,
    mlp_backward_step_bench,
    estimator_fit_bench
);
criterion_main!(benches);
