//! Booking step machine.
//!
//! ```text
//! Search -> Results -> GuestDetails -> Payment -> Confirmation
//!                ^          ^             |            |
//!                |          +----back-----+            |
//!                +---modal closed / cancel             |
//! Search <----------- make another booking ------------+
//! ```
//!
//! Guest details, payment and confirmation are modal steps: inside an
//! iframe the host renders them. The flow itself only tracks where the user
//! is and the display payload for the current step.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stayframe_proto::{BookingSummary, EmbedParams, GuestDetails, Message, ModalKind};

/// A booking step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Date and guest search form.
    Search,
    /// Availability list.
    Results,
    /// Guest details form.
    GuestDetails,
    /// Payment.
    Payment,
    /// Booking confirmed.
    Confirmation,
}

impl Step {
    /// Modal kind for modal steps.
    pub const fn modal_kind(self) -> Option<ModalKind> {
        match self {
            Self::GuestDetails => Some(ModalKind::Guest),
            Self::Payment => Some(ModalKind::Payment),
            Self::Confirmation => Some(ModalKind::Confirmation),
            Self::Search | Self::Results => None,
        }
    }
}

/// Where the user is in the booking flow.
#[derive(Debug, Clone)]
pub struct BookingFlow {
    step: Step,
    params: EmbedParams,
    summary: BookingSummary,
}

impl BookingFlow {
    /// Start at the search step, pre-seeded from the iframe URL.
    pub fn new(params: EmbedParams) -> Self {
        let summary = seed_summary(&params);
        Self { step: Step::Search, params, summary }
    }

    /// Current step.
    pub fn step(&self) -> Step {
        self.step
    }

    /// Parameters the iframe was loaded with.
    pub fn params(&self) -> &EmbedParams {
        &self.params
    }

    /// Booking details collected so far.
    pub fn summary(&self) -> &BookingSummary {
        &self.summary
    }

    /// Display payload for the current step.
    pub fn payload(&self) -> Value {
        serde_json::to_value(&self.summary).unwrap_or(Value::Null)
    }

    /// Search submitted.
    pub fn search(
        &mut self,
        check_in: Option<String>,
        check_out: Option<String>,
        guests: Option<u32>,
    ) -> Option<Step> {
        if !matches!(self.step, Step::Search | Step::Results) {
            return self.refuse("search");
        }
        self.summary.check_in = check_in;
        self.summary.check_out = check_out;
        self.summary.guests = guests;
        self.go(Step::Results)
    }

    /// A studio was picked from the results.
    ///
    /// `selection` carries the studio's display fields; dates and guests
    /// from the search are kept where the selection leaves them unset.
    pub fn select_studio(&mut self, selection: BookingSummary) -> Option<Step> {
        if self.step != Step::Results {
            return self.refuse("select studio");
        }
        let previous = std::mem::take(&mut self.summary);
        self.summary = BookingSummary {
            check_in: selection.check_in.or(previous.check_in),
            check_out: selection.check_out.or(previous.check_out),
            guests: selection.guests.or(previous.guests),
            guest_details: selection.guest_details.or(previous.guest_details),
            ..selection
        };
        self.go(Step::GuestDetails)
    }

    /// Guest details entered, either in the local form or the host's.
    pub fn submit_guest_details(&mut self, details: GuestDetails) -> Option<Step> {
        if self.step != Step::GuestDetails {
            return self.refuse("submit guest details");
        }
        self.summary.guest_details = Some(details);
        self.go(Step::Payment)
    }

    /// Back from payment to guest details.
    pub fn back_to_guest_details(&mut self) -> Option<Step> {
        if self.step != Step::Payment {
            return self.refuse("back to guest details");
        }
        self.go(Step::GuestDetails)
    }

    /// The payment collaborator confirmed the booking.
    pub fn payment_completed(&mut self, booking_reference: impl Into<String>) -> Option<Step> {
        if self.step != Step::Payment {
            return self.refuse("complete payment");
        }
        self.summary.booking_reference = Some(booking_reference.into());
        self.go(Step::Confirmation)
    }

    /// Start over after a confirmed booking.
    pub fn make_another_booking(&mut self) -> Option<Step> {
        if self.step != Step::Confirmation {
            return self.refuse("make another booking");
        }
        self.summary = seed_summary(&self.params);
        self.go(Step::Search)
    }

    /// The user dismissed a modal step.
    pub fn modal_closed(&mut self) -> Option<Step> {
        match self.step {
            Step::GuestDetails | Step::Payment => self.go(Step::Results),
            Step::Confirmation => {
                self.summary = seed_summary(&self.params);
                self.go(Step::Search)
            },
            Step::Search | Step::Results => self.refuse("close modal"),
        }
    }

    /// The app abandoned a modal step on its own.
    pub fn cancel(&mut self) -> Option<Step> {
        match self.step {
            Step::GuestDetails | Step::Payment => self.go(Step::Results),
            _ => self.refuse("cancel"),
        }
    }

    /// Apply a host message. Messages that do not drive the flow return
    /// `None`.
    pub fn apply(&mut self, message: &Message) -> Option<Step> {
        match message {
            Message::GuestDetailsSubmitted(details) => self.submit_guest_details(details.clone()),
            Message::GoBackToGuestDetails => self.back_to_guest_details(),
            Message::MakeAnotherBooking => self.make_another_booking(),
            Message::ModalClosed => self.modal_closed(),
            _ => None,
        }
    }

    fn go(&mut self, step: Step) -> Option<Step> {
        tracing::debug!("Booking step {:?} -> {:?}", self.step, step);
        self.step = step;
        Some(step)
    }

    fn refuse(&self, what: &str) -> Option<Step> {
        tracing::debug!("Ignoring {} at step {:?}", what, self.step);
        None
    }
}

fn seed_summary(params: &EmbedParams) -> BookingSummary {
    BookingSummary {
        check_in: params.check_in.clone(),
        check_out: params.check_out.clone(),
        ..BookingSummary::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_payment() -> BookingFlow {
        let mut flow = BookingFlow::new(EmbedParams::default());
        flow.search(Some("2026-11-02".to_string()), Some("2026-11-05".to_string()), Some(2));
        flow.select_studio(BookingSummary {
            studio_name: Some("Loft 3".to_string()),
            total: Some("€420".to_string()),
            ..BookingSummary::default()
        });
        flow.submit_guest_details(GuestDetails {
            first_name: "Ada".to_string(),
            ..GuestDetails::default()
        });
        flow
    }

    #[test]
    fn happy_path() {
        let mut flow = at_payment();
        assert_eq!(flow.step(), Step::Payment);
        assert_eq!(flow.summary().check_in.as_deref(), Some("2026-11-02"));
        assert_eq!(flow.summary().studio_name.as_deref(), Some("Loft 3"));

        assert_eq!(flow.payment_completed("SF-1042"), Some(Step::Confirmation));
        assert_eq!(flow.summary().booking_reference.as_deref(), Some("SF-1042"));
    }

    #[test]
    fn host_messages_drive_the_flow() {
        let mut flow = at_payment();
        assert_eq!(flow.apply(&Message::GoBackToGuestDetails), Some(Step::GuestDetails));
        assert_eq!(flow.apply(&Message::ModalClosed), Some(Step::Results));
        assert_eq!(flow.apply(&Message::ModalClosed), None);
    }

    #[test]
    fn make_another_booking_resets_to_seeded_search() {
        let params =
            EmbedParams { check_in: Some("2026-12-01".to_string()), ..EmbedParams::default() };
        let mut flow = BookingFlow::new(params);
        flow.search(None, None, None);
        flow.select_studio(BookingSummary::default());
        flow.submit_guest_details(GuestDetails::default());
        flow.payment_completed("SF-1");

        assert_eq!(flow.apply(&Message::MakeAnotherBooking), Some(Step::Search));
        assert_eq!(flow.summary().check_in.as_deref(), Some("2026-12-01"));
        assert_eq!(flow.summary().booking_reference, None);
    }

    #[test]
    fn out_of_order_messages_are_ignored() {
        let mut flow = BookingFlow::new(EmbedParams::default());
        assert_eq!(flow.apply(&Message::GuestDetailsSubmitted(GuestDetails::default())), None);
        assert_eq!(flow.apply(&Message::MakeAnotherBooking), None);
        assert_eq!(flow.step(), Step::Search);
    }

    #[test]
    fn modal_steps() {
        assert_eq!(Step::Search.modal_kind(), None);
        assert_eq!(Step::Payment.modal_kind(), Some(ModalKind::Payment));
    }
}
