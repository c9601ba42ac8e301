use kings_landing::effects::capabilities::{Capabilities, PointerKind};
use kings_landing::effects::contact_form::MODAL_ID;
use kings_landing::effects::cosmetic::{ElementRect, TimelineGeometry};
use kings_landing::effects::mascots::{ActivationInput, MascotStatus};
use kings_landing::effects::offer::{MemoryStorage, MockScheduler, OfferStorage, STORAGE_KEY};
use kings_landing::effects::page::{Page, PageConfig, PointerTarget, Surfaces};
use kings_landing::effects::reveal::{Rect, RevealElement, RevealLayout};
use rand::rngs::StdRng;
use rand::SeedableRng;

struct Layout {
    viewport: f64,
    tops: Vec<f64>,
}

impl RevealLayout for Layout {
    fn viewport_height(&self) -> f64 {
        self.viewport
    }

    fn bounding_rect(&self, element: usize) -> Option<Rect> {
        self.tops.get(element).map(|&top| Rect { top, bottom: top + 100.0 })
    }
}

fn surfaces(storage: Option<MemoryStorage>) -> Surfaces<MemoryStorage> {
    Surfaces {
        viewport_width: 1280.0,
        viewport_height: 800.0,
        device_pixel_ratio: 2.0,
        ambient_canvas: true,
        mascot_layer: true,
        rain_layer: true,
        trail_canvas: true,
        reveal_elements: vec![
            RevealElement::from_attributes(None, None),
            RevealElement::from_attributes(None, Some("150")),
        ],
        offer_storage: storage,
        ..Surfaces::default()
    }
}

fn page(layout: &Layout) -> Page<MemoryStorage> {
    Page::init(
        PageConfig::default(),
        Capabilities::default(),
        StdRng::seed_from_u64(42),
        surfaces(None),
        layout,
        0.0,
    )
}

fn catch_every_mascot(page: &mut Page<MemoryStorage>, now: f64) {
    let count = page.mascots().unwrap().mascots().len();
    for id in 0..count {
        for _ in 0..3 {
            page.activate_mascot(id, ActivationInput::PointerDown, now);
        }
    }
}

#[test]
fn catching_every_mascot_starts_exactly_one_rain() {
    let layout = Layout { viewport: 800.0, tops: vec![100.0, 2000.0] };
    let mut page = page(&layout);

    catch_every_mascot(&mut page, 1000.0);
    let frame = page.frame(1400.0).unwrap();
    assert!(!frame.rain_started);

    let frame = page.frame(1480.0).unwrap();
    assert!(frame.rain_started);
    assert!(page.rain().unwrap().is_active());
    assert_eq!(page.rain().unwrap().runs(), 1);
    assert!(frame.mascots.iter().all(|m| m.status == MascotStatus::Hidden && !m.visible));

    // Hidden mascots ignore clicks, and later frames don't retrigger.
    assert!(!page.activate_mascot(0, ActivationInput::Key("Enter"), 2000.0));
    let mut now = 1480.0;
    while now < 10_000.0 {
        now += 16.0;
        let frame = page.frame(now).unwrap();
        assert!(!frame.rain_started);
    }
    assert_eq!(page.rain().unwrap().runs(), 1);
}

#[test]
fn a_second_episode_rains_again_after_everyone_respawns() {
    let layout = Layout { viewport: 800.0, tops: vec![100.0, 2000.0] };
    let mut page = page(&layout);

    catch_every_mascot(&mut page, 0.0);
    assert!(page.frame(480.0).unwrap().rain_started);

    // Respawn timers are due 20 s after hiding.
    page.frame(20_480.0);
    assert!(page
        .mascots()
        .unwrap()
        .mascots()
        .iter()
        .all(|m| m.status() == MascotStatus::Running));
    assert!(!page.mascots().unwrap().rain_locked());

    catch_every_mascot(&mut page, 21_000.0);
    assert!(page.frame(21_480.0).unwrap().rain_started);
    assert_eq!(page.rain().unwrap().runs(), 2);
}

#[test]
fn teardown_stops_everything() {
    let layout = Layout { viewport: 800.0, tops: vec![100.0, 2000.0] };
    let mut page = page(&layout);
    page.pointer_moved(PointerKind::Mouse, 300.0, 300.0, 10.0);
    catch_every_mascot(&mut page, 20.0);
    page.frame(500.0);
    assert!(page.mascots().unwrap().pending_timers() > 0);
    assert!(!page.reveal().unwrap().listeners().is_empty());

    page.teardown();
    assert!(page.is_torn_down());
    assert!(page.frame(600.0).is_none());
    assert!(!page.ambient().unwrap().is_running());
    assert_eq!(page.mascots().unwrap().pending_timers(), 0);
    assert!(!page.rain().unwrap().is_active());
    assert!(page.trail().unwrap().is_empty());
    assert!(page.reveal().unwrap().listeners().is_empty());
    assert!(page.scrolled(&layout, None).is_empty());
}

#[test]
fn reveal_runs_through_the_page() {
    let mut layout = Layout { viewport: 800.0, tops: vec![100.0, 2000.0] };
    let mut page = page(&layout);
    let reveal = page.reveal().unwrap();
    assert!(reveal.is_visible(0));
    assert!(!reveal.is_visible(1));
    assert_eq!(reveal.delay_property(1).as_deref(), Some("150ms"));

    layout.tops[1] = 500.0;
    assert_eq!(page.resized(1280.0, 800.0, 1.0, &layout, None), vec![1]);
    assert!(page.reveal().unwrap().listeners().is_empty());
}

#[test]
fn missing_surfaces_are_skipped() {
    let layout = Layout { viewport: 800.0, tops: vec![] };
    let mut page: Page<MemoryStorage> = Page::init(
        PageConfig::default(),
        Capabilities {
            reduced_motion: true,
            coarse_pointer: true,
            ..Capabilities::default()
        },
        StdRng::seed_from_u64(1),
        Surfaces::default(),
        &layout,
        0.0,
    );
    assert!(page.ambient().is_none());
    assert!(page.mascots().is_none());
    assert!(page.trail().is_none());
    assert!(page.reveal().is_none());
    assert!(page.parallax().is_none());
    assert!(!page.activate_mascot(0, ActivationInput::PointerDown, 0.0));
    let frame = page.frame(16.0).unwrap();
    assert!(frame.scene.is_none());
    assert!(frame.mascots.is_empty());
}

#[test]
fn founder_offer_is_bound_once_and_claims_through_the_page() {
    let layout = Layout { viewport: 800.0, tops: vec![] };
    let mut storage = MemoryStorage::default();
    storage.set_item(STORAGE_KEY, "3").unwrap();
    let mut page = Page::init(
        PageConfig::default(),
        Capabilities::default(),
        StdRng::seed_from_u64(5),
        surfaces(Some(storage)),
        &layout,
        0.0,
    );
    assert!(page.offer().unwrap().is_bound());
    assert_eq!(page.offer().unwrap().label(), "( 3 of 5 left )");

    let mut scheduler = MockScheduler::new();
    scheduler.expect_has_popup_widget().return_const(true);
    scheduler.expect_open_popup().times(1).return_const(());
    assert_eq!(page.claim_offer(&mut scheduler), Some(2));
}

#[test]
fn footer_year_is_current() {
    let config = PageConfig::default();
    assert!(config.footer_year >= 2024);
}

fn card() -> ElementRect {
    ElementRect {
        left: 0.0,
        top: 0.0,
        width: 200.0,
        height: 100.0,
    }
}

fn interactive_surfaces() -> Surfaces<MemoryStorage> {
    Surfaces {
        magnetic_targets: 2,
        tilt_targets: 3,
        glow_targets: 1,
        service_items: 1,
        pops_layer: true,
        contact_modal_triggers: Some(1),
        ..surfaces(Some(MemoryStorage::default()))
    }
}

#[test]
fn reduced_motion_skips_magnetic_and_tilt() {
    let layout = Layout { viewport: 800.0, tops: vec![] };
    let page = Page::init(
        PageConfig::default(),
        Capabilities {
            reduced_motion: true,
            ..Capabilities::default()
        },
        StdRng::seed_from_u64(3),
        interactive_surfaces(),
        &layout,
        0.0,
    );
    assert!(page.magnetic(0).is_none());
    assert!(page.tilt(0).is_none());
    // Glow and hover spots are colour only, so they stay.
    assert!(page.glow(0).is_some());
    assert!(page.service(0).is_some());
}

#[test]
fn element_targets_follow_the_pointer() {
    let layout = Layout { viewport: 800.0, tops: vec![] };
    let mut page = Page::init(
        PageConfig::default(),
        Capabilities::default(),
        StdRng::seed_from_u64(3),
        interactive_surfaces(),
        &layout,
        0.0,
    );
    assert!(page.tilt(2).is_some());
    assert!(page.tilt(3).is_none());

    page.target_pointer_moved(PointerTarget::Magnetic(1), PointerKind::Mouse, card(), 150.0, 25.0);
    assert_eq!(
        page.magnetic(1).unwrap().transform().as_deref(),
        Some("translate(4.50px, -4.50px)")
    );
    assert_eq!(page.magnetic(0).unwrap().transform(), None);

    page.target_pointer_moved(PointerTarget::Tilt(0), PointerKind::Mouse, card(), 200.0, 0.0);
    assert!(page.tilt(0).unwrap().state().active);
    page.target_pointer_up(PointerTarget::Tilt(0), 1000.0);
    page.frame(1100.0);
    assert!(page.tilt(0).unwrap().state().active);
    page.frame(1120.0);
    assert!(!page.tilt(0).unwrap().state().active);

    page.target_pointer_moved(PointerTarget::Glow(0), PointerKind::Mouse, card(), 50.0, 50.0);
    assert!(page.glow(0).unwrap().state().active);
    page.target_blurred(PointerTarget::Glow(0));
    assert!(!page.glow(0).unwrap().state().active);

    page.target_pointer_moved(PointerTarget::Service(0), PointerKind::Mouse, card(), 30.0, 40.0);
    assert!(page.service(0).unwrap().properties().is_some());
    page.target_pointer_left(PointerTarget::Service(0));
    assert!(page.service(0).unwrap().properties().is_none());

    page.target_pointer_left(PointerTarget::Magnetic(1));
    assert_eq!(page.magnetic(1).unwrap().transform(), None);
}

#[test]
fn pops_spawn_from_pointer_and_expire_in_frames() {
    let layout = Layout { viewport: 800.0, tops: vec![] };
    let mut page = Page::init(
        PageConfig::default(),
        Capabilities::default(),
        StdRng::seed_from_u64(8),
        interactive_surfaces(),
        &layout,
        0.0,
    );
    page.pointer_moved(PointerKind::Mouse, 40.0, 60.0, 100.0);
    page.pointer_moved(PointerKind::Mouse, 41.0, 61.0, 150.0);
    let frame = page.frame(200.0).unwrap();
    assert_eq!(frame.pops.len(), 1);
    assert_eq!(frame.pops[0].word, "CPC");

    let frame = page.frame(1800.0).unwrap();
    assert!(frame.pops.is_empty());
}

#[test]
fn contact_modal_opens_and_closes_through_the_page() {
    let layout = Layout { viewport: 800.0, tops: vec![] };
    let mut page = Page::init(
        PageConfig::default(),
        Capabilities::default(),
        StdRng::seed_from_u64(8),
        interactive_surfaces(),
        &layout,
        0.0,
    );
    assert!(page.open_contact_modal());
    assert!(page.contact_modal().unwrap().is_open());
    assert!(page.key_pressed("Escape"));
    assert!(!page.contact_modal().unwrap().is_open());

    page.open_contact_modal();
    assert!(page.contact_modal_clicked(Some(MODAL_ID)));

    page.open_contact_modal();
    page.teardown();
    assert!(!page.contact_modal().unwrap().is_open());
    assert!(!page.open_contact_modal());
}

#[test]
fn timeline_is_measured_at_init_and_on_scroll() {
    let layout = Layout { viewport: 1000.0, tops: vec![] };
    let geometry = |scroll_top: f64| TimelineGeometry {
        timeline: ElementRect { top: 500.0 - scroll_top, height: 2000.0, ..ElementRect::default() },
        steps: vec![
            ElementRect { top: 600.0 - scroll_top, height: 200.0, ..ElementRect::default() },
            ElementRect { top: 1300.0 - scroll_top, height: 200.0, ..ElementRect::default() },
        ],
        viewport_height: 1000.0,
        scroll_top,
    };
    let mut page: Page<MemoryStorage> = Page::init(
        PageConfig::default(),
        Capabilities::default(),
        StdRng::seed_from_u64(2),
        Surfaces {
            timeline: Some(geometry(0.0)),
            ..Surfaces::default()
        },
        &layout,
        0.0,
    );
    let state = page.timeline().unwrap();
    assert_eq!(state.progress, 0.0);
    assert_eq!(state.active_step, Some(0));

    page.scrolled(&layout, Some(&geometry(1000.0)));
    let state = page.timeline().unwrap();
    // start 500, end 2500, focus line at 1450
    assert!((state.progress - 0.475).abs() < 1e-9);
    assert_eq!(state.active_step, Some(1));
}

#[test]
fn nothing_changes_after_teardown() {
    let layout = Layout { viewport: 800.0, tops: vec![100.0, 2000.0] };
    let mut storage = MemoryStorage::default();
    storage.set_item(STORAGE_KEY, "5").unwrap();
    let mut page = Page::init(
        PageConfig::default(),
        Capabilities::default(),
        StdRng::seed_from_u64(4),
        surfaces(Some(storage)),
        &layout,
        0.0,
    );
    let shapes_before = page.ambient().unwrap().shapes().len();
    page.teardown();

    assert!(page.resized(7680.0, 4320.0, 2.0, &layout, None).is_empty());
    assert_eq!(page.ambient().unwrap().shapes().len(), shapes_before);

    let mut scheduler = MockScheduler::new();
    scheduler.expect_has_popup_widget().never();
    scheduler.expect_open_popup().never();
    assert_eq!(page.claim_offer(&mut scheduler), None);
    assert_eq!(page.offer().unwrap().label(), "( 5 of 5 left )");
    assert!(!page.counter_intersected(0, true, 10.0));
    assert!(!page.element_intersected(1, true));
}
