//! Fuzz target for the host [`EmbedBinding`]
//!
//! Drives one binding through arbitrary host page histories and checks it
//! against the reference model and the DOM-level invariants.
//!
//! # Strategy
//!
//! - Height phase: harness [`Operation`] sequences applied to both the
//!   binding and [`ModelFrame`]
//! - Mixed phase: the same binding then receives modal requests, user
//!   interaction, foreign-origin messages, load failures and reloads
//!
//! # Invariants
//!
//! - Binding and model agree after every height operation
//! - Applied iframe heights stay within [420, 2100]
//! - Foreign-origin messages produce no actions
//! - A modal is only shown once the previous one has been removed
//! - `MODAL_CLOSED` is only posted together with removing the modal
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::json;
use stayframe_harness::{ModelFrame, ObservableState, Operation, SimEnv};
use stayframe_host::{EmbedBinding, HostAction, HostConfig, HostEvent, ModalUiEvent};
use stayframe_proto::{GuestDetails, Message};

const APP: &str = "https://book.stayframe.io";
const MIN_HEIGHT: u32 = 420;
const MAX_HEIGHT: u32 = 2100;

#[derive(Debug, Arbitrary)]
enum FuzzEvent {
    Height(Operation),
    OpenModal { kind: u8, studio: Option<String> },
    CloseRequested,
    Ui(u8),
    Key { escape: bool },
    Foreign { height: u16 },
    FrameLoaded,
    LoadFailed,
    RetryLoad,
    Reload,
    Tick { millis: u16 },
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    width: u16,
    ops: Vec<Operation>,
    events: Vec<FuzzEvent>,
}

struct Checked {
    binding: EmbedBinding<SimEnv>,
    env: SimEnv,
    applied: u32,
    modal_open: bool,
}

impl Checked {
    fn run(&mut self, actions: &[HostAction]) {
        for action in actions {
            match action {
                HostAction::SetFrameHeight { px } => {
                    assert!((MIN_HEIGHT..=MAX_HEIGHT).contains(px), "frame height {px}");
                },
                HostAction::HeightChanged { .. } => self.applied += 1,
                HostAction::RemoveModal => self.modal_open = false,
                HostAction::ShowModal { .. } => {
                    assert!(!self.modal_open, "second modal shown");
                    self.modal_open = true;
                },
                HostAction::PostToFrame { message: Message::ModalClosed } => {
                    assert!(
                        actions.contains(&HostAction::RemoveModal),
                        "MODAL_CLOSED without removing the modal"
                    );
                },
                _ => {},
            }
        }
    }

    fn height_op(&mut self, op: Operation) {
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
        self.run(&actions);
    }

    fn event(&mut self, event: FuzzEvent) {
        let actions = match event {
            FuzzEvent::Height(op) => return self.height_op(op),
            FuzzEvent::OpenModal { kind, studio } => {
                let kind = ["OPEN_GUEST_MODAL", "OPEN_PAYMENT_MODAL", "OPEN_CONFIRMATION_MODAL"]
                    [usize::from(kind % 3)];
                self.inbound(APP, json!({"type": kind, "data": {"studioName": studio}}))
            },
            FuzzEvent::CloseRequested => self.inbound(APP, json!({"type": "CLOSE_MODAL"})),
            FuzzEvent::Ui(which) => {
                let event = match which % 6 {
                    0 => ModalUiEvent::SubmitGuest(GuestDetails::default()),
                    1 => ModalUiEvent::Back,
                    2 => ModalUiEvent::MakeAnotherBooking,
                    3 => ModalUiEvent::CloseButton,
                    4 => ModalUiEvent::BackdropClick,
                    _ => ModalUiEvent::Escape,
                };
                self.binding.handle(HostEvent::Modal(event))
            },
            FuzzEvent::Key { escape } => {
                self.binding.key_down(if escape { "Escape" } else { "Enter" })
            },
            FuzzEvent::Foreign { height } => {
                let actions = self.inbound(
                    "https://evil.example",
                    json!({"type": "iframe-height", "height": height, "source": "iframe-message"}),
                );
                assert!(actions.is_empty(), "foreign message produced {actions:?}");
                actions
            },
            FuzzEvent::FrameLoaded => self.binding.handle(HostEvent::FrameLoaded),
            FuzzEvent::LoadFailed => {
                self.binding.handle(HostEvent::FrameLoadFailed { reason: "fuzz".to_string() })
            },
            FuzzEvent::RetryLoad => self.binding.handle(HostEvent::RetryLoad),
            FuzzEvent::Reload => self.binding.reload(),
            FuzzEvent::Tick { millis } => {
                self.env.advance(u64::from(millis));
                self.binding.handle(HostEvent::Tick)
            },
        };
        self.run(&actions);
    }

    fn inbound(&mut self, origin: &str, data: serde_json::Value) -> Vec<HostAction> {
        self.binding.handle(HostEvent::Inbound { origin: origin.to_string(), data })
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

fuzz_target!(|input: FuzzInput| {
    let width = u32::from(input.width);
    let env = SimEnv::new();
    let Ok((binding, _)) = EmbedBinding::new(env.clone(), &HostConfig::default(), width) else {
        return;
    };

    let mut checked = Checked { binding, env, applied: 0, modal_open: false };
    let loaded = checked.binding.handle(HostEvent::FrameLoaded);
    checked.run(&loaded);

    let mut model = ModelFrame::new(width);
    assert_eq!(model.observe(), checked.observe());

    for op in input.ops {
        model.apply(op);
        checked.height_op(op);
        assert_eq!(model.observe(), checked.observe(), "divergence after {op:?}");
    }

    for event in input.events {
        checked.event(event);
    }
});
