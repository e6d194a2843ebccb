//! Modal markup.
//!
//! Modals are built as a small node tree by one view function per step.
//! Payload fields are bound explicitly; every text node and attribute value
//! is escaped when rendered, so payload content can never inject markup.
//! Actionable elements carry a `data-action` attribute naming a
//! [`ModalAction`], which is how the driver maps DOM events back to
//! [`crate::ModalUiEvent`]s.

use std::fmt::Write as _;

use stayframe_proto::{BookingSummary, GuestDetails, ModalKind};

/// Elements that never have children or a closing tag.
const VOID_TAGS: &[&str] = &["input", "br", "hr", "img"];

/// Input names of the guest form, in wire order.
pub const GUEST_FIELDS: [&str; 4] = ["firstName", "lastName", "email", "phone"];

/// What an actionable element does when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalAction {
    /// Submit the guest form.
    SubmitGuest,
    /// Back from payment to guest details.
    Back,
    /// Start a new booking after confirmation.
    MakeAnotherBooking,
    /// Close button.
    Close,
    /// The backdrop behind the panel.
    Backdrop,
}

impl ModalAction {
    /// Value of the `data-action` attribute.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubmitGuest => "submit-guest",
            Self::Back => "back",
            Self::MakeAnotherBooking => "make-another-booking",
            Self::Close => "close",
            Self::Backdrop => "backdrop",
        }
    }

    /// Parse a `data-action` value.
    pub fn parse(value: &str) -> Option<Self> {
        [Self::SubmitGuest, Self::Back, Self::MakeAnotherBooking, Self::Close, Self::Backdrop]
            .into_iter()
            .find(|a| a.as_str() == value)
    }
}

/// A node in a modal tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element.
    Element(Element),
    /// Escaped text.
    Text(String),
}

/// An element with attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Start an element.
    pub fn new(tag: &'static str) -> Self {
        Self { tag, attrs: Vec::new(), children: Vec::new() }
    }

    /// Add an attribute.
    #[must_use]
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    /// Shorthand for the `class` attribute.
    #[must_use]
    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    /// Mark the element as actionable.
    #[must_use]
    pub fn action(self, action: ModalAction) -> Self {
        self.attr("data-action", action.as_str())
    }

    /// Append a child element.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append child elements.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children.into_iter().map(Node::Element));
        self
    }

    /// Append a text node.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Tag name.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Value of attribute `name`, if present.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(n, _)| *n == name).map(|(_, v)| v.as_str())
    }

    /// Depth-first walk over this element and its descendants.
    pub fn walk(&self) -> Vec<&Self> {
        let mut out = vec![self];
        for child in &self.children {
            if let Node::Element(element) = child {
                out.extend(element.walk());
            }
        }
        out
    }

    fn render(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        out.push('>');

        if VOID_TAGS.contains(&self.tag) {
            return;
        }

        for child in &self.children {
            match child {
                Node::Element(element) => element.render(out),
                Node::Text(text) => out.push_str(&escape(text)),
            }
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

/// Escape text for use in element content or a quoted attribute value.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// A rendered-on-demand modal for one booking step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalView {
    kind: ModalKind,
    root: Element,
}

impl ModalView {
    /// Build the view for `kind` from its display payload.
    pub fn build(kind: ModalKind, summary: &BookingSummary) -> Self {
        let panel = match kind {
            ModalKind::Guest => guest_panel(summary),
            ModalKind::Payment => payment_panel(summary),
            ModalKind::Confirmation => confirmation_panel(summary),
        };
        Self { kind, root: shell(kind, panel) }
    }

    /// Step this view renders.
    pub fn kind(&self) -> ModalKind {
        self.kind
    }

    /// Root element (backdrop and panel container).
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Render to escaped HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.root.render(&mut out);
        out
    }

    /// Every action reachable from this view, in document order.
    pub fn actions(&self) -> Vec<ModalAction> {
        self.root
            .walk()
            .into_iter()
            .filter_map(|e| e.get_attr("data-action"))
            .filter_map(ModalAction::parse)
            .collect()
    }

    /// Names of the form inputs, in document order.
    pub fn field_names(&self) -> Vec<&str> {
        self.root
            .walk()
            .into_iter()
            .filter(|e| e.tag() == "input")
            .filter_map(|e| e.get_attr("name"))
            .collect()
    }
}

fn modal_name(kind: ModalKind) -> &'static str {
    match kind {
        ModalKind::Guest => "guest",
        ModalKind::Payment => "payment",
        ModalKind::Confirmation => "confirmation",
    }
}

fn shell(kind: ModalKind, panel: Element) -> Element {
    Element::new("div")
        .class("stayframe-modal")
        .attr("data-modal", modal_name(kind))
        .child(Element::new("div").class("stayframe-modal-backdrop").action(ModalAction::Backdrop))
        .child(
            Element::new("div")
                .class("stayframe-modal-panel")
                .attr("role", "dialog")
                .attr("aria-modal", "true")
                .child(
                    Element::new("button")
                        .class("stayframe-modal-close")
                        .attr("type", "button")
                        .attr("aria-label", "Close")
                        .action(ModalAction::Close)
                        .text("\u{d7}"),
                )
                .child(panel),
        )
}

/// Summary lines for whichever display fields the payload carries.
fn summary_list(summary: &BookingSummary) -> Option<Element> {
    let mut rows = Vec::new();
    let mut row = |label: &str, value: String| {
        rows.push(
            Element::new("li")
                .child(Element::new("span").class("label").text(label))
                .child(Element::new("span").class("value").text(value)),
        );
    };

    if let Some(name) = &summary.studio_name {
        row("Studio", name.clone());
    }
    match (&summary.check_in, &summary.check_out) {
        (Some(check_in), Some(check_out)) => row("Dates", format!("{check_in} - {check_out}")),
        (Some(check_in), None) => row("Check-in", check_in.clone()),
        (None, Some(check_out)) => row("Check-out", check_out.clone()),
        (None, None) => {},
    }
    if let Some(guests) = summary.guests {
        row("Guests", guests.to_string());
    }
    if let Some(total) = &summary.total {
        row("Total", total.clone());
    }

    (!rows.is_empty()).then(|| Element::new("ul").class("stayframe-summary").children(rows))
}

fn with_summary(body: Element, summary: &BookingSummary) -> Element {
    match summary_list(summary) {
        Some(list) => body.child(list),
        None => body,
    }
}

fn guest_panel(summary: &BookingSummary) -> Element {
    let prefill = summary.guest_details.clone().unwrap_or_default();
    let GuestDetails { first_name, last_name, email, phone } = prefill;

    let input = |name: &'static str, label: &str, kind: &'static str, value: String| {
        Element::new("label")
            .text(label)
            .child(Element::new("input").attr("type", kind).attr("name", name).attr("value", value))
    };

    let form = Element::new("form")
        .class("stayframe-guest-form")
        .action(ModalAction::SubmitGuest)
        .child(input("firstName", "First name", "text", first_name))
        .child(input("lastName", "Last name", "text", last_name))
        .child(input("email", "Email", "email", email))
        .child(input("phone", "Phone", "tel", phone))
        .child(Element::new("button").attr("type", "submit").text("Continue to payment"));

    let body = Element::new("div").child(Element::new("h2").text("Guest details"));
    with_summary(body, summary).child(form)
}

fn payment_panel(summary: &BookingSummary) -> Element {
    let body = Element::new("div").child(Element::new("h2").text("Payment"));
    let mut body = with_summary(body, summary);

    if let Some(guest) = &summary.guest_details {
        body = body.child(
            Element::new("p")
                .class("stayframe-guest")
                .text(format!("{} {} ({})", guest.first_name, guest.last_name, guest.email)),
        );
    }

    body.child(
        Element::new("div")
            .class("stayframe-spinner")
            .attr("role", "status")
            .text("Processing payment"),
    )
    .child(
        Element::new("button").attr("type", "button").action(ModalAction::Back).text("Back"),
    )
}

fn confirmation_panel(summary: &BookingSummary) -> Element {
    let mut body = Element::new("div").child(Element::new("h2").text("Booking confirmed"));
    if let Some(reference) = &summary.booking_reference {
        body = body.child(
            Element::new("p").class("stayframe-reference").text(format!("Reference: {reference}")),
        );
    }

    with_summary(body, summary).child(
        Element::new("button")
            .attr("type", "button")
            .action(ModalAction::MakeAnotherBooking)
            .text("Make another booking"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_and_attributes() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn payload_cannot_inject_markup() {
        let summary = BookingSummary {
            studio_name: Some("<img src=x onerror=alert(1)>".to_string()),
            ..BookingSummary::default()
        };
        let html = ModalView::build(ModalKind::Guest, &summary).to_html();

        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    }

    #[test]
    fn guest_view_exposes_form_fields() {
        let view = ModalView::build(ModalKind::Guest, &BookingSummary::default());
        assert_eq!(view.field_names(), GUEST_FIELDS.to_vec());
        assert_eq!(
            view.actions(),
            vec![ModalAction::Backdrop, ModalAction::Close, ModalAction::SubmitGuest]
        );
    }

    #[test]
    fn guest_view_prefills_details() {
        let summary = BookingSummary {
            guest_details: Some(GuestDetails {
                first_name: "Ada".to_string(),
                ..GuestDetails::default()
            }),
            ..BookingSummary::default()
        };
        let html = ModalView::build(ModalKind::Guest, &summary).to_html();
        assert!(html.contains(r#"<input type="text" name="firstName" value="Ada">"#));
    }

    #[test]
    fn payment_view_snapshot() {
        let view = ModalView::build(ModalKind::Payment, &BookingSummary::default());
        insta::assert_snapshot!(
            view.to_html(),
            @r#"<div class="stayframe-modal" data-modal="payment"><div class="stayframe-modal-backdrop" data-action="backdrop"></div><div class="stayframe-modal-panel" role="dialog" aria-modal="true"><button class="stayframe-modal-close" type="button" aria-label="Close" data-action="close">×</button><div><h2>Payment</h2><div class="stayframe-spinner" role="status">Processing payment</div><button type="button" data-action="back">Back</button></div></div></div>"#
        );
    }

    #[test]
    fn confirmation_view_snapshot() {
        let summary = BookingSummary {
            studio_name: Some("Loft 3".to_string()),
            guests: Some(2),
            booking_reference: Some("SF-1042".to_string()),
            ..BookingSummary::default()
        };
        let view = ModalView::build(ModalKind::Confirmation, &summary);
        insta::assert_snapshot!(
            view.to_html(),
            @r#"<div class="stayframe-modal" data-modal="confirmation"><div class="stayframe-modal-backdrop" data-action="backdrop"></div><div class="stayframe-modal-panel" role="dialog" aria-modal="true"><button class="stayframe-modal-close" type="button" aria-label="Close" data-action="close">×</button><div><h2>Booking confirmed</h2><p class="stayframe-reference">Reference: SF-1042</p><ul class="stayframe-summary"><li><span class="label">Studio</span><span class="value">Loft 3</span></li><li><span class="label">Guests</span><span class="value">2</span></li></ul><button type="button" data-action="make-another-booking">Make another booking</button></div></div></div>"#
        );
    }

    #[test]
    fn parses_action_names() {
        for action in [ModalAction::SubmitGuest, ModalAction::Back, ModalAction::Close] {
            assert_eq!(ModalAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(ModalAction::parse("submit"), None);
    }
}
