use dscgan::ParamGuard;
use dscgan_datasets::generate::toy_subjects;
use dscgan_nn::DscNet;
use dscgan_train::{ExperimentParams, TrainError};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::fs;

#[test]
fn runs_all_subsets() {
    let _ = env_logger::builder().is_test(true).try_init();

    let scratch = std::env::temp_dir().join(format!("dscgan-train-experiment-{}", std::process::id()));
    let checkpoint = scratch.join("model.npz");

    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let faces = toy_subjects(3, 6, (12, 10), 2, 0.02, &mut rng).unwrap();

    let report = ExperimentParams::<f32>::new("toy")
        .class_counts(vec![2])
        .per_subject(6)
        .warmup_epochs(Some(4))
        .adversarial_epochs(Some(2))
        .update_interval(Some(2))
        .save(Some(checkpoint.clone()))
        .logs_dir(&scratch)
        .check()
        .unwrap()
        .run(&faces)
        .unwrap();

    assert_eq!(report.name, "toy");
    assert_eq!(report.configurations.len(), 1);
    let configuration = &report.configurations[0];
    assert_eq!(configuration.n_clusters, 2);
    // subjects {0, 1} and {1, 2}
    assert_eq!(configuration.errors.len(), 2);
    assert!(configuration.errors.iter().all(|e| (0.0..=0.5).contains(e)));
    assert!(report.to_string().starts_with("2 subjects:"));

    // three scalars per warm-up step, four per adversarial step, for both subsets
    let scalars = fs::read_to_string(scratch.join("toy").join("scalars.tsv")).unwrap();
    assert_eq!(scalars.lines().count(), 2 * (4 * 3 + 2 * 4));

    let mut net = DscNet::<f32>::params(2, 12).image_shape(12, 10).build().unwrap();
    net.restore(&checkpoint).unwrap();

    fs::remove_dir_all(&scratch).unwrap();
}

#[test]
fn too_many_classes() {
    let scratch = std::env::temp_dir().join(format!("dscgan-train-classes-{}", std::process::id()));
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let faces = toy_subjects(2, 4, (12, 10), 1, 0.0, &mut rng).unwrap();

    let res = ExperimentParams::<f32>::new("too-many")
        .class_counts(vec![3])
        .per_subject(4)
        .update_interval(Some(25))
        .logs_dir(&scratch)
        .check()
        .unwrap()
        .run(&faces);

    assert!(matches!(
        res,
        Err(TrainError::TooFewSubjects {
            n_subjects: 2,
            n_clusters: 3
        })
    ));
    let _ = fs::remove_dir_all(&scratch);
}
