//! Property tests for the fixed-step driver.
//!
//! The driver's observable state after a sequence of frames must depend only
//! on the frames' total, and the tween must stay within one step.

use proptest::prelude::*;
use sblp_engine::prelude::*;

fn driver(step_ms: Millis) -> FixedStepDriver {
    let simulation = Simulation::new(&level_one(), RemovalConfig::default());
    FixedStepDriver::new(
        simulation,
        DriverConfig {
            step_ms,
            ..Default::default()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn ticks_depend_only_on_total_time(
        step_ms in 1i64..40,
        frames in prop::collection::vec(0i64..120, 1..80),
    ) {
        let total: Millis = frames.iter().sum();

        let mut chunked = driver(step_ms);
        let mut ticks = 0u64;
        for &frame in &frames {
            ticks += u64::from(chunked.advance(frame).unwrap());
            let tween_ms = chunked.real_time() - chunked.logical_time();
            prop_assert!((0..=step_ms).contains(&tween_ms));
        }

        let mut whole = driver(step_ms);
        whole.advance(total).unwrap();

        prop_assert_eq!(ticks, chunked.tick_count());
        prop_assert_eq!(whole.tick_count(), chunked.tick_count());
        prop_assert_eq!(whole.logical_time(), chunked.logical_time());
        prop_assert_eq!(whole.state_hash(), chunked.state_hash());
    }

    #[test]
    fn logical_time_is_a_multiple_of_the_step(
        step_ms in 1i64..40,
        frames in prop::collection::vec(0i64..500, 1..20),
    ) {
        let mut d = driver(step_ms);
        for frame in frames {
            let before = d.logical_time();
            let ran = d.advance(frame).unwrap();
            prop_assert_eq!(d.logical_time() - before, i64::from(ran) * step_ms);
            prop_assert_eq!(d.logical_time() % step_ms, 0);
            prop_assert_eq!(d.simulation().time(), d.logical_time());
        }
    }
}
