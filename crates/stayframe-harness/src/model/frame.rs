//! Model of one loaded iframe's height negotiation.

use stayframe_core::policy::{
    MAX_HEIGHT, MIN_HEIGHT_DESKTOP, MIN_HEIGHT_MOBILE, MOBILE_BREAKPOINT, THRESHOLD_DESKTOP,
    THRESHOLD_MOBILE,
};

use super::operation::{ModelSource, Operation};

const APPLY_DELAY_MS: u64 = 30;
const VIEWPORT_DELAY_MS: u64 = 250;

/// What the model and the binding are compared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservableState {
    /// Height on the iframe element.
    pub height: u32,
    /// Minimum height in force.
    pub min_height: u32,
    /// Viewport classified as mobile.
    pub mobile: bool,
    /// An update has been applied since load or the last viewport change.
    pub stable: bool,
    /// Number of updates applied so far.
    pub applied: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Due {
    Apply,
    Viewport,
}

/// Reference model of the host resize controller after the frame loaded.
#[derive(Debug, Clone)]
pub struct ModelFrame {
    now: u64,
    width: u32,
    height: u32,
    stable: bool,
    applied: u32,

    /// Accepted target waiting for its apply deadline.
    pending: Option<u32>,
    apply_at: Option<(u64, u64)>,

    pending_width: Option<u32>,
    viewport_at: Option<(u64, u64)>,

    /// Scheduling order, for timers sharing a deadline.
    seq: u64,
}

impl ModelFrame {
    /// Frame loaded in a viewport `width` pixels wide.
    pub fn new(width: u32) -> Self {
        Self {
            now: 0,
            width,
            height: min_for(width),
            stable: false,
            applied: 0,
            pending: None,
            apply_at: None,
            pending_width: None,
            viewport_at: None,
            seq: 0,
        }
    }

    /// Current observable state.
    pub fn observe(&self) -> ObservableState {
        ObservableState {
            height: self.height,
            min_height: min_for(self.width),
            mobile: self.width <= MOBILE_BREAKPOINT,
            stable: self.stable,
            applied: self.applied,
        }
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: Operation) {
        match op {
            Operation::Report { height, source } => self.report(u32::from(height), source.forced()),
            Operation::UpdateHeight { height } => self.report(u32::from(height), false),
            Operation::ViewportResize { width } => {
                self.pending_width = Some(u32::from(width));
                self.viewport_at = Some((self.now + VIEWPORT_DELAY_MS, self.next_seq()));
            },
            Operation::ResetStability => self.stable = false,
            Operation::AdvanceTime { millis } => self.advance(u64::from(millis)),
        }
    }

    fn report(&mut self, height: u32, forced: bool) {
        if height == 0 {
            return;
        }

        let target = height.clamp(min_for(self.width), MAX_HEIGHT);
        let reference = self.pending.unwrap_or(self.height);
        let threshold =
            if self.width <= MOBILE_BREAKPOINT { THRESHOLD_MOBILE } else { THRESHOLD_DESKTOP };

        if target.abs_diff(reference) <= threshold && !forced {
            return;
        }
        self.pending = Some(target);
        self.apply_at = Some((self.now + APPLY_DELAY_MS, self.next_seq()));
    }

    fn advance(&mut self, millis: u64) {
        self.now += millis;

        let mut due: Vec<(u64, u64, Due)> = Vec::new();
        if let Some((at, seq)) = self.apply_at.filter(|(at, _)| *at <= self.now) {
            due.push((at, seq, Due::Apply));
            self.apply_at = None;
        }
        if let Some((at, seq)) = self.viewport_at.filter(|(at, _)| *at <= self.now) {
            due.push((at, seq, Due::Viewport));
            self.viewport_at = None;
        }
        due.sort_unstable();

        for (_, _, what) in due {
            match what {
                Due::Apply => self.apply_pending(),
                Due::Viewport => self.apply_viewport(),
            }
        }
    }

    fn apply_pending(&mut self) {
        let Some(target) = self.pending.take() else {
            return;
        };
        self.height = target.clamp(min_for(self.width), MAX_HEIGHT);
        self.stable = true;
        self.applied += 1;
    }

    fn apply_viewport(&mut self) {
        let Some(width) = self.pending_width.take() else {
            return;
        };
        self.width = width;
        self.stable = false;

        // Whatever is already on its way lands at or above the new minimum.
        let min = min_for(width);
        if self.pending.is_none() && self.height < min {
            self.pending = Some(min);
            self.apply_at = Some((self.now + APPLY_DELAY_MS, self.next_seq()));
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

fn min_for(width: u32) -> u32 {
    if width <= MOBILE_BREAKPOINT { MIN_HEIGHT_MOBILE } else { MIN_HEIGHT_DESKTOP }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_applies_after_delay() {
        let mut model = ModelFrame::new(1280);
        model.apply(Operation::Report { height: 900, source: ModelSource::PostMessage });
        model.apply(Operation::AdvanceTime { millis: 29 });
        assert_eq!(model.observe().height, 420);

        model.apply(Operation::AdvanceTime { millis: 1 });
        assert_eq!(model.observe().height, 900);
        assert!(model.observe().stable);
    }

    #[test]
    fn shrinking_viewport_raises_height() {
        let mut model = ModelFrame::new(1280);
        model.apply(Operation::ViewportResize { width: 375 });
        model.apply(Operation::AdvanceTime { millis: 250 });
        assert_eq!(model.observe().height, 420);
        assert!(!model.observe().stable);

        model.apply(Operation::AdvanceTime { millis: 30 });
        assert_eq!(model.observe().height, 520);
    }

    #[test]
    fn pending_report_survives_viewport_change() {
        let mut model = ModelFrame::new(1024);
        model.apply(Operation::ViewportResize { width: 600 });
        model.apply(Operation::AdvanceTime { millis: 230 });
        model.apply(Operation::Report { height: 900, source: ModelSource::IframeMessage });
        model.apply(Operation::AdvanceTime { millis: 20 });
        assert_eq!(model.observe().min_height, 520);

        model.apply(Operation::AdvanceTime { millis: 10 });
        assert_eq!(model.observe().height, 900);
        assert_eq!(model.observe().applied, 1);
    }
}
