//! End-to-end scenarios: host binding and embedded app on one simulated page.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use stayframe_core::DeviceClass;
use stayframe_embed::Step;
use stayframe_harness::{HostDom, PageSetup, SimPage, TraceEvent};
use stayframe_host::{HostAction, ModalUiEvent, resize::DEFAULT_LOAD_ERROR_MESSAGE};
use stayframe_proto::{BookingSummary, GuestDetails, HeightSource, Message, ModalKind};

const EVIL: &str = "https://evil.example";

fn loaded(setup: PageSetup) -> SimPage {
    let mut page = SimPage::new(setup).unwrap();
    page.load();
    page.advance(100);
    page
}

fn guest() -> GuestDetails {
    GuestDetails {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "+44 20 7946 0000".to_string(),
    }
}

fn at_guest_modal() -> SimPage {
    let mut page = loaded(PageSetup::default());
    page.search(Some("2026-11-02"), Some("2026-11-05"), Some(2));
    page.select_studio(BookingSummary {
        studio_name: Some("Loft 3".to_string()),
        total: Some("€420".to_string()),
        ..BookingSummary::default()
    });
    page
}

fn modal_kind(dom: &HostDom) -> Option<ModalKind> {
    dom.modal.as_ref().map(|(kind, _)| *kind)
}

fn posted_to_frame(page: &SimPage, wanted: &Message) -> usize {
    page.trace()
        .iter()
        .filter(|e| match &e.event {
            TraceEvent::Host(HostAction::PostToFrame { message }) => message == wanted,
            _ => false,
        })
        .count()
}

#[test]
fn load_sizes_frame_to_content() {
    let page = loaded(PageSetup::default());

    assert_eq!(page.dom().frame_height, Some(900));
    assert_eq!(page.dom().container_min_height, Some(900));
    assert!(!page.dom().loading);
    assert!(page.binding().is_stable());
    assert_eq!(page.app().reporter().confirmed_height(), Some(900));
    assert_eq!(page.dom().height_events, vec![(900, HeightSource::IframeMessage)]);
    assert_eq!(page.rendered(), &[Step::Search]);
}

#[test]
fn embed_params_reach_the_app() {
    let setup = PageSetup {
        src: "https://book.stayframe.io/embed?studio=loft-3&checkIn=2026-12-01".to_string(),
        ..PageSetup::default()
    };
    let page = SimPage::new(setup).unwrap();
    assert_eq!(page.app().flow().params().studio.as_deref(), Some("loft-3"));
    assert_eq!(page.app().flow().summary().check_in.as_deref(), Some("2026-12-01"));
    assert_eq!(page.app_origin(), "https://book.stayframe.io");
}

#[test]
fn content_growth_follows_debounce() {
    let mut page = loaded(PageSetup::default());

    page.set_content_height(1_400.0);
    assert_eq!(page.dom().frame_height, Some(900));

    page.advance(30);
    assert_eq!(page.dom().frame_height, Some(1_400));
    assert_eq!(page.dom().height_events.last(), Some(&(1_400, HeightSource::PostMessage)));
}

#[test]
fn content_beyond_maximum_is_clamped() {
    let mut page = loaded(PageSetup::default());
    page.set_content_height(9_000.0);
    page.advance(100);
    assert_eq!(page.dom().frame_height, Some(2_100));
}

#[test]
fn booking_flow_through_host_modals() {
    let mut page = at_guest_modal();
    assert_eq!(page.step(), Step::GuestDetails);
    let (kind, html) = page.dom().modal.clone().unwrap();
    assert_eq!(kind, ModalKind::Guest);
    assert!(html.contains("Loft 3"));

    page.modal_event(ModalUiEvent::SubmitGuest(guest()));
    assert_eq!(page.step(), Step::Payment);
    assert_eq!(modal_kind(page.dom()), Some(ModalKind::Payment));
    assert_eq!(
        page.app().flow().summary().guest_details.as_ref().map(|g| g.first_name.as_str()),
        Some("Ada")
    );

    page.modal_event(ModalUiEvent::Back);
    assert_eq!(page.step(), Step::GuestDetails);
    assert_eq!(modal_kind(page.dom()), Some(ModalKind::Guest));
    assert!(page.dom().modal.as_ref().unwrap().1.contains("value=\"Ada\""));

    page.modal_event(ModalUiEvent::SubmitGuest(guest()));
    page.payment_completed("SF-1042");
    assert_eq!(page.step(), Step::Confirmation);
    let (kind, html) = page.dom().modal.clone().unwrap();
    assert_eq!(kind, ModalKind::Confirmation);
    assert!(html.contains("Reference: SF-1042"));

    page.modal_event(ModalUiEvent::MakeAnotherBooking);
    assert_eq!(page.step(), Step::Search);
    assert_eq!(page.dom().modal, None);
    assert_eq!(page.rendered().last(), Some(&Step::Search));
    assert_eq!(page.dom().modals_shown, 5);
    assert_eq!(posted_to_frame(&page, &Message::ModalClosed), 0);
}

#[test]
fn escape_dismisses_once() {
    let mut page = at_guest_modal();

    page.key_down("Enter");
    assert_eq!(modal_kind(page.dom()), Some(ModalKind::Guest));

    page.key_down("Escape");
    page.key_down("Escape");
    assert_eq!(page.dom().modal, None);
    assert_eq!(page.step(), Step::Results);
    assert_eq!(posted_to_frame(&page, &Message::ModalClosed), 1);
}

#[test]
fn backdrop_click_dismisses_payment() {
    let mut page = at_guest_modal();
    page.modal_event(ModalUiEvent::SubmitGuest(guest()));

    page.modal_event(ModalUiEvent::BackdropClick);
    assert_eq!(page.dom().modal, None);
    assert_eq!(page.step(), Step::Results);
}

#[test]
fn app_cancel_closes_modal_without_echo() {
    let mut page = at_guest_modal();

    page.cancel();
    assert_eq!(page.dom().modal, None);
    assert_eq!(page.step(), Step::Results);
    assert_eq!(posted_to_frame(&page, &Message::ModalClosed), 0);
}

#[test]
fn foreign_origins_change_nothing() {
    let mut page = at_guest_modal();
    let before = page.dom().clone();

    page.post_to_host(
        EVIL,
        json!({"type": "iframe-height", "height": 1800, "source": "iframe-message"}),
    );
    page.post_to_host(EVIL, json!({"type": "CLOSE_MODAL"}));
    page.post_to_host(EVIL, json!({"type": "OPEN_PAYMENT_MODAL", "data": {}}));
    page.post_to_frame(EVIL, json!({"type": "MODAL_CLOSED"}));
    page.advance(100);

    assert_eq!(page.dom().frame_height, before.frame_height);
    assert_eq!(page.dom().modal, before.modal);
    assert_eq!(page.step(), Step::GuestDetails);
}

#[test]
fn mobile_viewport_raises_short_content() {
    let mut page = loaded(PageSetup { content_height: 300.0, ..PageSetup::default() });
    assert_eq!(page.dom().frame_height, Some(420));

    page.resize_viewport(375);
    page.advance(249);
    assert_eq!(page.binding().device(), DeviceClass::Desktop);

    page.advance(31);
    assert_eq!(page.binding().device(), DeviceClass::Mobile);
    assert_eq!(page.dom().frame_height, Some(520));
    assert_eq!(page.dom().container_height, Some(520));
    assert_eq!(page.dom().height_events.last(), Some(&(520, HeightSource::ResizeAdjustment)));
    assert_eq!(page.app().reporter().host_min_height(), Some(520));
}

#[test]
fn missing_frame_is_a_no_op() {
    let mut page = loaded(PageSetup::default());
    page.remove_frame();

    page.update_height(1_500.0);
    page.advance(100);
    assert_eq!(page.binding().height(), 1_500);
    assert_eq!(page.dom().frame_height, Some(900));
}

#[test]
fn registered_frame_id_is_used() {
    let setup = PageSetup {
        host: stayframe_host::HostConfig {
            frame_id: Some("my-booking".to_string()),
            ..stayframe_host::HostConfig::default()
        },
        frame_id: Some("other".to_string()),
        ..PageSetup::default()
    };
    let page = loaded(setup);
    assert_eq!(page.dom().frame_height, None);
}

#[test]
fn load_error_then_retry() {
    let mut page = SimPage::with_defaults().unwrap();
    page.fail_load("net::ERR_CONNECTION_REFUSED");
    assert_eq!(page.dom().load_error.as_deref(), Some(DEFAULT_LOAD_ERROR_MESSAGE));
    assert!(!page.dom().loading);

    page.click_retry();
    assert_eq!(page.dom().load_error, None);
    assert!(page.dom().loading);
    assert_eq!(page.dom().reloads, 1);

    page.load();
    page.advance(100);
    assert_eq!(page.dom().frame_height, Some(900));
}

#[test]
fn reload_restarts_the_app() {
    let mut page = at_guest_modal();
    page.reload();
    assert_eq!(page.step(), Step::Search);
    assert!(page.dom().loading);

    page.load();
    page.advance(100);
    assert!(!page.dom().loading);
    assert_eq!(page.dom().reloads, 1);
}

#[test]
fn debug_overlay_tracks_status() {
    let mut page = loaded(PageSetup::default());
    page.set_debug_mode(true);
    assert_eq!(
        page.dom().overlay.as_deref(),
        Some("height 900px | min 420px | desktop 1280px | stable")
    );

    page.reset_stability();
    assert_eq!(
        page.dom().overlay.as_deref(),
        Some("height 900px | min 420px | desktop 1280px | unstable")
    );

    page.set_debug_mode(false);
    assert_eq!(page.dom().overlay, None);
}

#[test]
fn request_height_round_trip() {
    let mut page = loaded(PageSetup::default());
    page.set_content_height(905.0);
    page.advance(3_000);
    assert_eq!(page.dom().frame_height, Some(900));

    page.request_height();
    page.advance(30);
    assert_eq!(page.dom().frame_height, Some(905));
    assert_eq!(page.dom().height_events.last(), Some(&(905, HeightSource::IframeMessage)));
}
