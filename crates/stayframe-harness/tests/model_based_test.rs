//! Model-based property tests.
//!
//! These tests generate random operation sequences and verify that the real
//! host binding sizes the iframe exactly as the reference model does.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!      ModelFrame     RealFrame       Compare
//!      (reference)    (binding)    ObservableState
//! ```

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use serde_json::json;
use stayframe_harness::{
    ModelFrame, ModelSource, ObservableState, Operation, PageSetup, SimEnv, SimPage, TraceEvent,
};
use stayframe_host::{EmbedBinding, HostAction, HostConfig, HostEvent};

const APP: &str = "https://book.stayframe.io";

/// Real binding wrapper that mirrors `ModelFrame`'s interface.
struct RealFrame {
    binding: EmbedBinding<SimEnv>,
    env: SimEnv,
    applied: u32,
}

impl RealFrame {
    fn new(width: u32) -> Self {
        let env = SimEnv::new();
        let (mut binding, _) =
            EmbedBinding::new(env.clone(), &HostConfig::default(), width).unwrap();
        binding.handle(HostEvent::FrameLoaded);
        Self { binding, env, applied: 0 }
    }

    fn apply(&mut self, op: Operation) {
        let actions = match op {
            Operation::Report { height, source } => self.binding.handle(HostEvent::Inbound {
                origin: APP.to_string(),
                data: json!({
                    "type": "iframe-height",
                    "height": height,
                    "source": source.to_source().as_str(),
                }),
            }),
            Operation::UpdateHeight { height } => self.binding.update_height(f64::from(height)),
            Operation::ViewportResize { width } => {
                self.binding.handle(HostEvent::ViewportResized { width: u32::from(width) })
            },
            Operation::ResetStability => self.binding.reset_stability(),
            Operation::AdvanceTime { millis } => {
                self.env.advance(u64::from(millis));
                self.binding.handle(HostEvent::Tick)
            },
        };

        let applied = actions.iter().filter(|a| matches!(a, HostAction::HeightChanged { .. }));
        self.applied += u32::try_from(applied.count()).unwrap();
    }

    fn observe(&self) -> ObservableState {
        ObservableState {
            height: self.binding.height(),
            min_height: self.binding.min_height(),
            mobile: self.binding.device().is_mobile(),
            stable: self.binding.is_stable(),
            applied: self.applied,
        }
    }
}

fn width_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![320u16..=768, 769u16..=1920]
}

fn source_strategy() -> impl Strategy<Value = ModelSource> {
    prop_oneof![
        Just(ModelSource::PostMessage),
        Just(ModelSource::IframeMessage),
        Just(ModelSource::InitialLoad),
        Just(ModelSource::StateChange),
        Just(ModelSource::ScrollRelated),
    ]
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        // Weight towards reports and time passing
        6 => (0u16..3000, source_strategy())
            .prop_map(|(height, source)| Operation::Report { height, source }),
        2 => (0u16..3000).prop_map(|height| Operation::UpdateHeight { height }),
        2 => width_strategy().prop_map(|width| Operation::ViewportResize { width }),
        1 => Just(Operation::ResetStability),
        5 => (0u16..400).prop_map(|millis| Operation::AdvanceTime { millis }),
    ]
}

/// Small, noise-level report around `base`.
fn jitter_strategy(base: u16) -> impl Strategy<Value = Operation> {
    (0u16..=15, 0u16..=15).prop_map(move |(up, down)| Operation::Report {
        height: base + up - down.min(base),
        source: ModelSource::PostMessage,
    })
}

/// A report landing just before a viewport change takes effect.
fn interleaving_strategy() -> impl Strategy<Value = Vec<Operation>> {
    (width_strategy(), 200u16..260, 1u16..3000, source_strategy(), 0u16..80).prop_map(
        |(width, before, height, source, after)| {
            vec![
                Operation::ViewportResize { width },
                Operation::AdvanceTime { millis: before },
                Operation::Report { height, source },
                Operation::AdvanceTime { millis: after },
                Operation::AdvanceTime { millis: 300 },
            ]
        },
    )
}

fn run_both(width: u32, ops: &[Operation]) -> (ModelFrame, RealFrame) {
    let mut model = ModelFrame::new(width);
    let mut real = RealFrame::new(width);
    for op in ops {
        model.apply(*op);
        real.apply(*op);
        assert_eq!(model.observe(), real.observe(), "divergence after {op:?}");
    }
    (model, real)
}

#[test]
fn report_pending_across_viewport_change_is_applied() {
    let ops = [
        Operation::ViewportResize { width: 600 },
        Operation::AdvanceTime { millis: 230 },
        Operation::Report { height: 900, source: ModelSource::IframeMessage },
        Operation::AdvanceTime { millis: 20 },
        Operation::AdvanceTime { millis: 100 },
    ];
    let (_, real) = run_both(1024, &ops);
    assert_eq!(real.observe().height, 900);
    assert_eq!(real.observe().min_height, 520);
}

#[test]
fn adjustment_applies_when_nothing_is_pending() {
    let ops = [
        Operation::ViewportResize { width: 600 },
        Operation::AdvanceTime { millis: 250 },
        Operation::AdvanceTime { millis: 30 },
    ];
    let (_, real) = run_both(1024, &ops);
    assert_eq!(real.observe().height, 520);
    assert_eq!(real.observe().applied, 1);
}

proptest! {
    /// The core model-based test: after every operation both sides agree on
    /// everything a host page can observe.
    #[test]
    fn prop_model_matches_real(
        width in width_strategy(),
        ops in prop::collection::vec(operation_strategy(), 0..80)
    ) {
        let mut model = ModelFrame::new(u32::from(width));
        let mut real = RealFrame::new(u32::from(width));
        prop_assert_eq!(model.observe(), real.observe());

        for (i, op) in ops.iter().enumerate() {
            model.apply(*op);
            real.apply(*op);
            prop_assert_eq!(
                model.observe(),
                real.observe(),
                "Divergence at operation {}: {:?}",
                i,
                op
            );
        }
    }

    /// A forced report racing a viewport change is never lost to the
    /// minimum adjustment.
    #[test]
    fn prop_forced_report_outlives_viewport_change(
        width in 769u16..=1920,
        ops in interleaving_strategy()
    ) {
        let mut model = ModelFrame::new(u32::from(width));
        let mut real = RealFrame::new(u32::from(width));
        for op in &ops {
            model.apply(*op);
            real.apply(*op);
            prop_assert_eq!(model.observe(), real.observe(), "Divergence after {:?}", op);
        }

        if let Operation::Report { height, source } = ops[2] {
            let state = real.observe();
            if source.forced() {
                let expected = u32::from(height).clamp(state.min_height, 2100);
                prop_assert_eq!(state.height, expected);
            }
            prop_assert!(state.height >= state.min_height);
        }
    }

    /// Applied heights never exceed the maximum.
    #[test]
    fn prop_height_within_bounds(
        width in width_strategy(),
        ops in prop::collection::vec(operation_strategy(), 0..80)
    ) {
        let mut real = RealFrame::new(u32::from(width));
        for op in ops {
            real.apply(op);
            let state = real.observe();
            if state.applied > 0 {
                prop_assert!(state.height <= 2100);
            }
        }
    }

    /// Noise below the desktop threshold never moves a settled frame.
    #[test]
    fn prop_jitter_is_absorbed(
        jitter in prop::collection::vec(jitter_strategy(1000), 1..40)
    ) {
        let mut real = RealFrame::new(1280);
        real.apply(Operation::Report { height: 1000, source: ModelSource::IframeMessage });
        real.apply(Operation::AdvanceTime { millis: 30 });
        prop_assert_eq!(real.observe().height, 1000);

        for op in jitter {
            real.apply(op);
            real.apply(Operation::AdvanceTime { millis: 40 });
        }
        prop_assert_eq!(real.observe().height, 1000);
        prop_assert_eq!(real.observe().applied, 1);
    }

    /// The same inputs replay to the same trace.
    #[test]
    fn prop_simulation_is_deterministic(
        steps in prop::collection::vec((500u16..2500, 320u16..1920, 0u16..600), 1..20)
    ) {
        let run = || {
            let mut page = SimPage::new(PageSetup::default()).unwrap();
            page.load();
            for (content, width, millis) in &steps {
                page.set_content_height(f64::from(*content));
                page.resize_viewport(u32::from(*width));
                page.advance(u64::from(*millis));
            }
            page.advance(5_000);
            page.trace().to_vec()
        };

        let first = run();
        prop_assert_eq!(&first, &run());

        let frame_heights = first.iter().filter_map(|e| match &e.event {
            TraceEvent::Host(HostAction::SetFrameHeight { px }) => Some(*px),
            _ => None,
        });
        for px in frame_heights {
            prop_assert!((420..=2100).contains(&px));
        }
    }
}

#[test]
fn viewport_and_apply_due_in_one_tick() {
    let ops = [
        Operation::ViewportResize { width: 375 },
        Operation::AdvanceTime { millis: 230 },
        Operation::Report { height: 440, source: ModelSource::IframeMessage },
        Operation::AdvanceTime { millis: 100 },
        Operation::AdvanceTime { millis: 30 },
    ];

    let mut model = ModelFrame::new(1280);
    let mut real = RealFrame::new(1280);
    for op in ops {
        model.apply(op);
        real.apply(op);
        assert_eq!(model.observe(), real.observe(), "after {op:?}");
    }
    assert_eq!(real.observe().height, 520);
}
