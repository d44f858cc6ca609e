//! Spin Controller: the highlight-cycling reveal animation as a tick-driven
//! state machine.
//!
//! The controller never reads a clock. Each call to [`SpinController::tick`]
//! is one animation step; the caller decides when steps happen (a tokio
//! interval in [`super::session::WidgetSession::spin`], a plain loop in tests).
//!
//! Elapsed time is accumulated as `step_interval * multiplier`, and the
//! multiplier grows once the run passes 60% of its duration. A "decelerating"
//! run therefore reaches its duration in fewer ticks than a linear one.

use super::model::{clear_highlights, clear_selections, ImageBox, RevealedBox, SpinConfig, SpinResult};
use rand::Rng;
use serde::Serialize;

/// Fraction of the duration after which deceleration kicks in.
pub const DECELERATION_THRESHOLD: f64 = 0.6;
/// Per-tick growth of the speed multiplier while decelerating.
pub const DECELERATION_FACTOR: f64 = 1.15;
pub const MAX_SPEED_MULTIPLIER: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpinError {
    #[error("invalid spin request: {0}")]
    InvalidConfig(String),
    /// No box has an image to reveal.
    #[error("no box has an image to reveal")]
    NoContent,
    #[error("tick called while no spin is running")]
    NotRunning,
    #[error("spin was interrupted before it settled")]
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinPhase {
    Idle,
    Running,
    Settling,
}

/// Outcome of asking the controller to spin.
#[derive(Debug, Clone, PartialEq)]
pub enum SpinStart {
    /// Animation started; drive it with `tick`.
    Started,
    /// A spin is already in progress; the request was dropped.
    Ignored,
    /// Boxes were pre-selected, so they are revealed without animating.
    Revealed(SpinResult),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Continue { highlighted: usize },
    /// The tick that crossed the duration. `highlighted` is where the cycling
    /// pointer was; the result carries the independently drawn winner.
    Finished { highlighted: usize, result: SpinResult },
}

#[derive(Debug, Clone)]
struct RunState {
    config: SpinConfig,
    elapsed_ms: f64,
    cursor: usize,
    multiplier: f64,
    ticks: u32,
}

#[derive(Debug)]
pub struct SpinController {
    phase: SpinPhase,
    run: Option<RunState>,
    last_tick_count: u32,
}

impl Default for SpinController {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinController {
    pub fn new() -> Self {
        Self {
            phase: SpinPhase::Idle,
            run: None,
            last_tick_count: 0,
        }
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn is_spinning(&self) -> bool {
        self.phase != SpinPhase::Idle
    }

    /// Ticks taken by the current run, or by the last finished one.
    pub fn ticks(&self) -> u32 {
        self.run
            .as_ref()
            .map(|r| r.ticks)
            .unwrap_or(self.last_tick_count)
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.run.as_ref().map(|r| r.elapsed_ms).unwrap_or(0.0)
    }

    /// Resolve a spin request. The config is copied; later changes to the
    /// caller's config do not affect this run.
    pub fn begin(
        &mut self,
        boxes: &mut [ImageBox],
        config: &SpinConfig,
    ) -> Result<SpinStart, SpinError> {
        if self.is_spinning() {
            return Ok(SpinStart::Ignored);
        }
        if boxes.is_empty() {
            return Err(SpinError::InvalidConfig("no boxes to spin".into()));
        }
        if config.step_interval_ms == 0 {
            return Err(SpinError::InvalidConfig(
                "step interval must be greater than zero".into(),
            ));
        }

        if boxes.iter().any(|b| b.selected) {
            let picks: Vec<RevealedBox> = boxes
                .iter()
                .filter(|b| b.selected)
                .filter_map(|b| {
                    b.content().map(|c| RevealedBox {
                        index: b.index,
                        content: c.to_string(),
                    })
                })
                .collect();
            clear_selections(boxes);
            self.last_tick_count = 0;
            if picks.is_empty() {
                return Err(SpinError::NoContent);
            }
            return Ok(SpinStart::Revealed(SpinResult::Manual(picks)));
        }

        clear_highlights(boxes);
        self.run = Some(RunState {
            config: *config,
            elapsed_ms: 0.0,
            cursor: 0,
            multiplier: 1.0,
            ticks: 0,
        });
        self.phase = SpinPhase::Running;
        Ok(SpinStart::Started)
    }

    /// Advance the animation by one step.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        boxes: &mut [ImageBox],
        rng: &mut R,
    ) -> Result<TickOutcome, SpinError> {
        if self.phase != SpinPhase::Running || boxes.is_empty() {
            return Err(SpinError::NotRunning);
        }
        let Some(run) = self.run.as_mut() else {
            return Err(SpinError::NotRunning);
        };

        let count = boxes.len();
        let highlighted = run.cursor % count;
        clear_highlights(boxes);
        boxes[highlighted].highlighted = true;

        run.cursor = (highlighted + 1) % count;
        run.elapsed_ms += run.config.step_interval_ms as f64 * run.multiplier;
        run.ticks += 1;

        let duration = run.config.duration_ms as f64;
        if run.config.deceleration && run.elapsed_ms > duration * DECELERATION_THRESHOLD {
            run.multiplier = (run.multiplier * DECELERATION_FACTOR).min(MAX_SPEED_MULTIPLIER);
        }

        if run.elapsed_ms >= duration {
            let result = self.settle(boxes, rng)?;
            return Ok(TickOutcome::Finished { highlighted, result });
        }
        Ok(TickOutcome::Continue { highlighted })
    }

    /// Drop the current run without a result and return to idle.
    pub fn abort(&mut self, boxes: &mut [ImageBox]) {
        self.last_tick_count = self.run.take().map(|r| r.ticks).unwrap_or(0);
        self.phase = SpinPhase::Idle;
        clear_highlights(boxes);
    }

    fn settle<R: Rng + ?Sized>(
        &mut self,
        boxes: &mut [ImageBox],
        rng: &mut R,
    ) -> Result<SpinResult, SpinError> {
        self.phase = SpinPhase::Settling;
        self.last_tick_count = self.run.take().map(|r| r.ticks).unwrap_or(0);

        let candidates: Vec<usize> = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.has_content())
            .map(|(i, _)| i)
            .collect();

        clear_highlights(boxes);
        if candidates.is_empty() {
            self.phase = SpinPhase::Idle;
            return Err(SpinError::NoContent);
        }

        let chosen = candidates[rng.gen_range(0..candidates.len())];
        let winner = &mut boxes[chosen];
        winner.highlighted = true;
        winner.selected = false;
        let revealed = RevealedBox {
            index: winner.index,
            content: winner.content().unwrap_or_default().to_string(),
        };

        self.phase = SpinPhase::Idle;
        Ok(SpinResult::Chosen(revealed))
    }
}

/// Run a spin to completion without any delay between ticks.
pub fn run_to_completion<R: Rng + ?Sized>(
    controller: &mut SpinController,
    boxes: &mut [ImageBox],
    config: &SpinConfig,
    rng: &mut R,
) -> Result<SpinResult, SpinError> {
    match controller.begin(boxes, config)? {
        SpinStart::Revealed(result) => Ok(result),
        SpinStart::Ignored => Err(SpinError::InvalidConfig("spin already running".into())),
        SpinStart::Started => loop {
            if let TickOutcome::Finished { result, .. } = controller.tick(boxes, rng)? {
                return Ok(result);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::model::empty_grid;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stocked_grid(count: usize) -> Vec<ImageBox> {
        (0..count)
            .map(|i| ImageBox::with_image(i, format!("https://cdn.example/{}.png", i)))
            .collect()
    }

    fn linear(duration_ms: u64, step_interval_ms: u64) -> SpinConfig {
        SpinConfig {
            duration_ms,
            step_interval_ms,
            deceleration: false,
        }
    }

    #[test]
    fn linear_run_takes_duration_over_interval_ticks() {
        let mut ctl = SpinController::new();
        let mut boxes = stocked_grid(10);
        let mut rng = StdRng::seed_from_u64(7);

        run_to_completion(&mut ctl, &mut boxes, &linear(1000, 100), &mut rng).unwrap();
        assert_eq!(ctl.ticks(), 10);
        assert_eq!(ctl.phase(), SpinPhase::Idle);
    }

    #[test]
    fn cursor_cycles_through_boxes_in_order() {
        let mut ctl = SpinController::new();
        let mut boxes = stocked_grid(3);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(ctl.begin(&mut boxes, &linear(10_000, 100)).unwrap(), SpinStart::Started);
        let seen: Vec<usize> = (0..5)
            .map(|_| match ctl.tick(&mut boxes, &mut rng).unwrap() {
                TickOutcome::Continue { highlighted } => highlighted,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(seen, vec![0, 1, 2, 0, 1]);
        assert_eq!(boxes.iter().filter(|b| b.highlighted).count(), 1);
    }

    #[test]
    fn deceleration_shortens_the_run() {
        let mut rng = StdRng::seed_from_u64(3);

        let mut linear_ctl = SpinController::new();
        run_to_completion(&mut linear_ctl, &mut stocked_grid(10), &linear(5000, 100), &mut rng)
            .unwrap();

        let mut decel_ctl = SpinController::new();
        run_to_completion(&mut decel_ctl, &mut stocked_grid(10), &SpinConfig::default(), &mut rng)
            .unwrap();

        assert_eq!(linear_ctl.ticks(), 50);
        assert!(
            decel_ctl.ticks() < linear_ctl.ticks(),
            "decelerating run should finish in fewer ticks: {} vs {}",
            decel_ctl.ticks(),
            linear_ctl.ticks()
        );
    }

    #[test]
    fn finished_run_leaves_exactly_one_highlight() {
        let mut ctl = SpinController::new();
        let mut boxes = stocked_grid(10);
        let mut rng = StdRng::seed_from_u64(11);

        let result = run_to_completion(&mut ctl, &mut boxes, &SpinConfig::default(), &mut rng).unwrap();
        let lit: Vec<usize> = boxes.iter().filter(|b| b.highlighted).map(|b| b.index).collect();
        assert_eq!(lit, result.indices());
    }

    #[test]
    fn winner_is_drawn_from_boxes_with_content() {
        let mut boxes = empty_grid(10);
        boxes[7].image = Some("https://cdn.example/7.png".into());

        for seed in 0..20 {
            let mut ctl = SpinController::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let result = run_to_completion(&mut ctl, &mut boxes, &linear(300, 100), &mut rng).unwrap();
            assert_eq!(result.indices(), vec![7]);
        }
    }

    #[test]
    fn all_empty_boxes_fail_and_reset() {
        let mut ctl = SpinController::new();
        let mut boxes = empty_grid(10);
        let mut rng = StdRng::seed_from_u64(5);

        let err = run_to_completion(&mut ctl, &mut boxes, &linear(500, 100), &mut rng).unwrap_err();
        assert_eq!(err, SpinError::NoContent);
        assert_eq!(ctl.phase(), SpinPhase::Idle);
        assert!(boxes.iter().all(|b| !b.highlighted));
    }

    #[test]
    fn preselected_boxes_skip_animation() {
        let mut ctl = SpinController::new();
        let mut boxes = stocked_grid(10);
        boxes[3].selected = true;

        let start = ctl.begin(&mut boxes, &SpinConfig::default()).unwrap();
        match start {
            SpinStart::Revealed(result) => {
                assert_eq!(result.indices(), vec![3]);
                assert_eq!(result.contents(), vec!["https://cdn.example/3.png"]);
            }
            other => panic!("expected reveal, got {:?}", other),
        }
        assert_eq!(ctl.phase(), SpinPhase::Idle);
        assert_eq!(ctl.ticks(), 0);
        assert!(boxes.iter().all(|b| !b.selected && !b.highlighted));
    }

    #[test]
    fn preselected_set_keeps_index_order() {
        let mut ctl = SpinController::new();
        let mut boxes = stocked_grid(10);
        boxes[8].selected = true;
        boxes[2].selected = true;

        let SpinStart::Revealed(result) = ctl.begin(&mut boxes, &SpinConfig::default()).unwrap() else {
            panic!("expected reveal");
        };
        assert_eq!(result.indices(), vec![2, 8]);
    }

    #[test]
    fn request_while_running_is_ignored() {
        let mut ctl = SpinController::new();
        let mut boxes = stocked_grid(10);
        let mut rng = StdRng::seed_from_u64(2);

        assert_eq!(ctl.begin(&mut boxes, &linear(1000, 100)).unwrap(), SpinStart::Started);
        ctl.tick(&mut boxes, &mut rng).unwrap();
        assert_eq!(ctl.begin(&mut boxes, &linear(1000, 100)).unwrap(), SpinStart::Ignored);
        assert_eq!(ctl.phase(), SpinPhase::Running);
        assert_eq!(ctl.ticks(), 1, "ignored request must not restart the run");
    }

    #[test]
    fn zero_interval_and_empty_grid_are_rejected() {
        let mut ctl = SpinController::new();
        assert!(matches!(
            ctl.begin(&mut stocked_grid(3), &linear(1000, 0)),
            Err(SpinError::InvalidConfig(_))
        ));
        assert!(matches!(
            ctl.begin(&mut [], &linear(1000, 100)),
            Err(SpinError::InvalidConfig(_))
        ));
        assert_eq!(ctl.phase(), SpinPhase::Idle);
    }

    #[test]
    fn tick_without_run_is_an_error() {
        let mut ctl = SpinController::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(ctl.tick(&mut stocked_grid(2), &mut rng), Err(SpinError::NotRunning));
    }

    #[test]
    fn abort_returns_to_idle_and_allows_a_new_run() {
        let mut ctl = SpinController::new();
        let mut boxes = stocked_grid(4);
        let mut rng = StdRng::seed_from_u64(5);

        ctl.begin(&mut boxes, &linear(1000, 100)).unwrap();
        ctl.tick(&mut boxes, &mut rng).unwrap();
        ctl.abort(&mut boxes);
        assert_eq!(ctl.phase(), SpinPhase::Idle);
        assert!(boxes.iter().all(|b| !b.highlighted));
        assert_eq!(ctl.tick(&mut boxes, &mut rng), Err(SpinError::NotRunning));
        assert_eq!(ctl.begin(&mut boxes, &linear(1000, 100)).unwrap(), SpinStart::Started);
    }

    proptest! {
        #[test]
        fn run_time_is_bounded_by_duration_plus_one_step(
            duration in 0u64..20_000,
            step in 1u64..500,
            deceleration in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let mut ctl = SpinController::new();
            let mut boxes = stocked_grid(10);
            let mut rng = StdRng::seed_from_u64(seed);
            let config = SpinConfig { duration_ms: duration, step_interval_ms: step, deceleration };

            run_to_completion(&mut ctl, &mut boxes, &config, &mut rng).unwrap();
            let wall_clock = ctl.ticks() as u64 * step;
            prop_assert!(wall_clock <= duration + step, "{} ticks of {}ms for {}ms", ctl.ticks(), step, duration);
            prop_assert_eq!(boxes.iter().filter(|b| b.highlighted).count(), 1);
        }
    }
}
