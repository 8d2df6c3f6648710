//! Property-based execution of every built-in operator.
//!
//! Each operator's strategy is derived from its own parameter specs; no
//! test here writes a per-parameter generator by hand. For every sampled
//! assignment on a capability-valid input, `run` must return a valid image
//! and never fail validation for in-domain values (operator-level
//! invariants like kernel parity are assumed, as the schema alone does not
//! encode them).

use opix::core::registry::OperatorFactory;
use opix::prelude::*;
use opix::testkit;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;

fn strategy_for(factory: &OperatorFactory) -> BoxedStrategy<ParameterAssignment> {
    derive_strategy(factory.spec().parameter_specs())
}

fn run_with(
    factory: &OperatorFactory,
    assignment: &ParameterAssignment,
    image: &image::DynamicImage,
) -> OpixResult<image::DynamicImage> {
    let mut op = factory.create();
    assignment.apply_to(op.params_mut())?;
    let mut ctx = PipelineContext::new(image.clone());
    let mut scope = ctx.scope("test");
    op.run(image, &mut scope)
}

fn is_odd(assignment: &ParameterAssignment, name: &str) -> bool {
    assignment
        .get(name)
        .and_then(|v| v.as_integer())
        .is_some_and(|v| v % 2 == 1)
}

proptest! {
    #[test]
    fn gaussian_blur_accepts_all_odd_kernel_assignments(
        assignment in strategy_for(&GaussianBlur::factory()),
        image in testkit::arbitrary_image(),
    ) {
        prop_assume!(is_odd(&assignment, "kernel_size"));
        let out = run_with(&GaussianBlur::factory(), &assignment, &image).unwrap();
        prop_assert!(testkit::is_valid_image(&out));
        prop_assert_eq!(out.color().channel_count(), image.color().channel_count());
    }

    #[test]
    fn clahe_accepts_all_assignments_on_gray_input(
        assignment in strategy_for(&Clahe::factory()),
        image in testkit::arbitrary_gray_image(),
    ) {
        let out = run_with(&Clahe::factory(), &assignment, &image).unwrap();
        prop_assert!(testkit::is_valid_image(&out));
        prop_assert_eq!(out.color().channel_count(), 1);
    }

    #[test]
    fn simple_threshold_accepts_all_assignments_on_gray_input(
        assignment in strategy_for(&SimpleThreshold::factory()),
        image in testkit::arbitrary_gray_image(),
    ) {
        let out = run_with(&SimpleThreshold::factory(), &assignment, &image).unwrap();
        prop_assert!(testkit::is_valid_image(&out));
    }

    #[test]
    fn adaptive_threshold_accepts_odd_block_assignments(
        assignment in strategy_for(&AdaptiveThreshold::factory()),
        image in testkit::arbitrary_gray_image(),
    ) {
        prop_assume!(is_odd(&assignment, "block_size"));
        let out = run_with(&AdaptiveThreshold::factory(), &assignment, &image).unwrap();
        prop_assert!(testkit::is_valid_image(&out));
    }

    #[test]
    fn color_space_change_accepts_matching_src(
        assignment in strategy_for(&ColorSpaceChange::factory()),
        image in testkit::arbitrary_image(),
    ) {
        let src_is_gray = assignment.get("src").and_then(|v| v.as_enum()) == Some("GRAY");
        let image_is_gray = image.color().channel_count() == 1;
        prop_assume!(src_is_gray == image_is_gray);

        let out = run_with(&ColorSpaceChange::factory(), &assignment, &image).unwrap();
        prop_assert!(testkit::is_valid_image(&out));

        let target_is_gray = assignment.get("target").and_then(|v| v.as_enum()) == Some("GRAY");
        prop_assert_eq!(out.color().channel_count(), if target_is_gray { 1 } else { 3 });
    }

    #[test]
    fn find_contours_accepts_all_assignments_on_gray_input(
        assignment in strategy_for(&FindContours::factory()),
        image in testkit::arbitrary_gray_image(),
    ) {
        let mut op = FindContours::factory().create();
        assignment.apply_to(op.params_mut()).unwrap();
        let mut ctx = PipelineContext::new(image.clone());
        let out = op.run(&image, &mut ctx).unwrap();
        prop_assert!(testkit::is_valid_image(&out));
        prop_assert!(ctx.info("contours").is_some());
        prop_assert!(ctx.info("hierarchy").is_some());
        prop_assert!(ctx.info("centroids").is_some());
    }

    #[test]
    fn gray_only_operators_reject_rgb_without_context_writes(
        assignment in strategy_for(&Clahe::factory()),
        image in (4u32..16, 4u32..16).prop_map(|(w, h)| testkit::rgb_test_image(w, h)),
    ) {
        let mut op = Clahe::factory().create();
        assignment.apply_to(op.params_mut()).unwrap();
        let mut ctx = PipelineContext::new(image.clone());
        let err = op.run(&image, &mut ctx).unwrap_err();
        prop_assert!(
            matches!(err, OpixError::Precondition { .. }),
            "expected OpixError::Precondition, got {:?}",
            err
        );
        prop_assert_eq!(ctx.entries().count(), 0);
    }
}

#[test]
fn every_registered_operator_is_fuzzable_from_its_specs() {
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    // Another test in this binary may already have registered the builtins.
    let _ = opix::operators::register_builtins();
    let identities = opix::core::registry::global_identities().unwrap();
    assert_eq!(identities.len(), 6);

    let mut runner = TestRunner::deterministic();
    for identity in identities {
        let factory = opix::core::registry::with_global(|r| r.get(&identity).cloned())
            .unwrap()
            .expect("registered factory");
        let strategy = strategy_for(&factory);
        for _ in 0..16 {
            let assignment = strategy.new_tree(&mut runner).unwrap().current();
            for (name, value) in assignment.iter() {
                let spec = &factory.spec().parameter_specs()[name];
                assert!(spec.validate(value).is_ok(), "{identity}.{name} out of domain");
            }
        }
    }
}

#[test]
fn re_registering_builtins_is_a_configuration_error() {
    // First call may or may not have happened in this process already,
    // depending on test ordering; force it, then assert the duplicate path.
    let _ = opix::operators::register_builtins();
    let err = opix::operators::register_builtins().unwrap_err();
    assert!(matches!(err, OpixError::Config { .. }));
}
