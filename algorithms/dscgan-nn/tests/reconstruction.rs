use dscgan_nn::{DscNet, Eqn3Losses};
use ndarray::{array, Array4};

/// Smooth stripes whose orientation and phase vary slightly from image to image
fn toy_faces(n: usize, height: usize, width: usize) -> Array4<f32> {
    Array4::from_shape_fn((n, 1, height, width), |(i, _, h, w)| {
        let phase = i as f32 * 0.1;
        let (y, x) = (h as f32 / height as f32, w as f32 / width as f32);
        0.5 + 0.4 * (6.0 * y + 2.0 * x + phase).sin()
    })
}

fn mean(losses: &[Eqn3Losses<f32>]) -> Eqn3Losses<f32> {
    let n = losses.len() as f32;
    Eqn3Losses {
        reconstruction: losses.iter().map(|l| l.reconstruction).sum::<f32>() / n,
        sparsity: losses.iter().map(|l| l.sparsity).sum::<f32>() / n,
        self_expression: losses.iter().map(|l| l.self_expression).sum::<f32>() / n,
    }
}

/// Mean loss terms over steps 0-19 and over steps 80-99 of 100 warm-up updates
fn windowed_means(net: &mut DscNet<f32>, images: &Array4<f32>) -> (Eqn3Losses<f32>, Eqn3Losses<f32>) {
    let history = (0..100)
        .map(|_| net.partial_fit_eqn3(images).unwrap().losses)
        .collect::<Vec<_>>();
    (mean(&history[..20]), mean(&history[80..]))
}

#[test]
fn reconstruction_loss_decreases() {
    let _ = env_logger::builder().is_test(true).try_init();

    let images = toy_faces(64, 48, 42);
    let mut net = DscNet::<f32>::params(1, 64).build().unwrap();

    let first = net.partial_fit_eqn3(&images).unwrap().cost();
    let mut last = first;
    for _ in 1..100 {
        last = net.partial_fit_eqn3(&images).unwrap().cost();
        assert!(last.is_finite());
    }

    assert!(
        last < first,
        "reconstruction loss did not decrease: {} -> {}",
        first,
        last
    );
    assert_eq!(net.n_steps(), 100);
}

#[test]
fn windowed_reconstruction_and_objective_decrease() {
    let images = toy_faces(64, 48, 42);
    let mut net = DscNet::<f32>::params(1, 64).build().unwrap();
    let (lambda1, lambda2) = (net.hyperparams().lambda1(), net.hyperparams().lambda2());

    let (early, late) = windowed_means(&mut net, &images);
    assert!(
        late.reconstruction < early.reconstruction,
        "{:?} -> {:?}",
        early,
        late
    );
    assert!(late.total(lambda1, lambda2) < early.total(lambda1, lambda2));
}

#[test]
fn windowed_sparsity_decreases_when_it_dominates() {
    let images = toy_faces(16, 24, 20);
    let mut net = DscNet::<f32>::params(1, 16)
        .image_shape(24, 20)
        .coef_init(0.05)
        .lambda1(1e4)
        .build()
        .unwrap();

    let (early, late) = windowed_means(&mut net, &images);
    assert!(late.sparsity < early.sparsity, "{:?} -> {:?}", early, late);
}

#[test]
fn windowed_self_expression_decreases_when_it_dominates() {
    let images = toy_faces(16, 24, 20);
    let mut net = DscNet::<f32>::params(1, 16)
        .image_shape(24, 20)
        .lambda2(1e3)
        .build()
        .unwrap();

    let (early, late) = windowed_means(&mut net, &images);
    assert!(
        late.self_expression < early.self_expression,
        "{:?} -> {:?}",
        early,
        late
    );
}

#[test]
fn critic_step_clips_weights_after_a_large_update() {
    let images = toy_faces(8, 24, 20);
    let mut net = DscNet::<f32>::params(2, 8)
        .image_shape(24, 20)
        .critic_hidden(16, 8)
        .learning_rate(1.0)
        .build()
        .unwrap();
    let labels = array![0, 0, 0, 0, 1, 1, 1, 1];

    for _ in 0..3 {
        let score = net.partial_fit_disc(&images, &labels).unwrap();
        assert!(score.is_finite());

        let weights = net.critic_weights().unwrap();
        assert!(weights.iter().all(|t| t.iter().all(|w| w.abs() <= 0.02)));
        // steps of size ~1 push weights far outside the box
        assert!(weights.iter().any(|t| t.iter().any(|w| w.abs() == 0.02)));
    }
}

#[test]
fn reconstruction_has_input_shape() {
    let images = toy_faces(64, 48, 42);
    let net = DscNet::<f32>::params(1, 64).build().unwrap();

    let reconstruction = net.reconstruct(&images).unwrap();
    assert_eq!(reconstruction.dim(), (64, 1, 48, 42));
    assert!(reconstruction.iter().all(|&v| v >= 0.0));
    assert_eq!(net.transform(&images).unwrap().dim(), (64, 1080));
}
