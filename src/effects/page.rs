//! Page bootstrap. Builds every controller once from the surfaces the host
//! found, drives them from a single animation-frame callback and tears them
//! all down together.

use crate::effects::capabilities::{Capabilities, PointerKind};
use crate::effects::contact_form::{ContactForm, ContactModal};
use crate::effects::cosmetic::{
    ElementRect, InteractiveGlow, Magnetic, Marquee, MarqueeClone, MetricCounter, MetricCounters,
    Parallax, ServiceHover, Tilt, TimelineGeometry, TimelineState,
};
use crate::effects::cursor_trail::{CursorPops, CursorTrail, GlyphSprite, Pop};
use crate::effects::mascots::{
    ActivationInput, MascotConfig, MascotController, MascotEvent, MascotSprite,
};
use crate::effects::money_rain::{Bill, MoneyRain, RainConfig};
use crate::effects::offer::{FounderOffer, OfferStorage, Scheduler, BOOKING_URL};
use crate::effects::reveal::{RevealElement, RevealLayout, RevealTracker, WindowListener};
use crate::effects::shapes::{AmbientField, Scene, ShapeConfig};
use chrono::Datelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub shapes: ShapeConfig,
    pub mascots: MascotConfig,
    pub rain: RainConfig,
    pub booking_url: String,
    pub footer_year: i32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            shapes: ShapeConfig::default(),
            mascots: MascotConfig::default(),
            rain: RainConfig::default(),
            booking_url: BOOKING_URL.to_string(),
            footer_year: chrono::Utc::now().year(),
        }
    }
}

/// What the host document actually contains.
#[derive(Default)]
pub struct Surfaces<S: OfferStorage> {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub device_pixel_ratio: f64,
    pub ambient_canvas: bool,
    pub mascot_layer: bool,
    pub rain_layer: bool,
    pub trail_canvas: bool,
    pub pops_layer: bool,
    pub magnetic_targets: usize,
    pub tilt_targets: usize,
    /// `[data-gradient]` elements.
    pub glow_targets: usize,
    pub service_items: usize,
    pub timeline: Option<TimelineGeometry>,
    pub parallax_layers: Vec<Option<String>>,
    pub reveal_elements: Vec<RevealElement>,
    pub counters: Vec<MetricCounter>,
    /// Computed animation duration of the logo track, when present.
    pub marquee: Option<Option<String>>,
    pub contact_fields: Option<Vec<String>>,
    pub message_max: Option<usize>,
    /// Number of `data-open` triggers, when the contact dialog exists.
    pub contact_modal_triggers: Option<usize>,
    /// Storage backing the founder offer, when the offer is on the page.
    pub offer_storage: Option<S>,
}

/// Everything a host needs to paint one frame.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PageFrame {
    pub scene: Option<Scene>,
    pub mascots: Vec<MascotSprite>,
    pub bills: Vec<Bill>,
    pub glyphs: Vec<GlyphSprite>,
    pub pops: Vec<Pop>,
    pub counters: Vec<Option<String>>,
    pub rain_started: bool,
}

/// Element-level pointer targets, by index within their group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    Magnetic(usize),
    Tilt(usize),
    Glow(usize),
    Service(usize),
}

pub struct Page<S: OfferStorage> {
    config: PageConfig,
    capabilities: Capabilities,
    ambient: Option<AmbientField>,
    mascots: Option<MascotController>,
    rain: Option<MoneyRain>,
    trail: Option<CursorTrail>,
    pops: Option<CursorPops>,
    parallax: Option<Parallax>,
    magnetic: Vec<Magnetic>,
    tilts: Vec<Tilt>,
    glows: Vec<InteractiveGlow>,
    services: Vec<ServiceHover>,
    timeline: Option<TimelineState>,
    reveal: Option<RevealTracker>,
    counters: MetricCounters,
    marquee_clone: Option<MarqueeClone>,
    contact: Option<ContactForm>,
    modal: Option<ContactModal>,
    offer: Option<FounderOffer<S>>,
    torn_down: bool,
}

fn child_rng(rng: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(rng.gen())
}

impl<S: OfferStorage> Page<S> {
    pub fn init(
        config: PageConfig,
        capabilities: Capabilities,
        mut rng: StdRng,
        surfaces: Surfaces<S>,
        layout: &impl RevealLayout,
        now: f64,
    ) -> Self {
        let ambient = surfaces.ambient_canvas.then(|| {
            let mut field = AmbientField::new(config.shapes.clone(), child_rng(&mut rng));
            field.start(
                now,
                surfaces.viewport_width,
                surfaces.viewport_height,
                surfaces.device_pixel_ratio,
            );
            field
        });

        let mascots = surfaces.mascot_layer.then(|| {
            let mut controller =
                MascotController::new(config.mascots.clone(), capabilities.reduced_motion, child_rng(&mut rng));
            controller.start(now);
            controller
        });

        let rain = surfaces
            .rain_layer
            .then(|| MoneyRain::new(config.rain.clone(), child_rng(&mut rng)));

        let trail = if surfaces.trail_canvas {
            CursorTrail::new(&capabilities, child_rng(&mut rng))
        } else {
            None
        };

        let pops = surfaces.pops_layer.then(|| CursorPops::new(&capabilities));

        let depths: Vec<Option<&str>> = surfaces.parallax_layers.iter().map(|d| d.as_deref()).collect();
        let parallax = Parallax::new(&depths, &capabilities);

        let magnetic: Vec<Magnetic> = (0..surfaces.magnetic_targets)
            .filter_map(|_| Magnetic::new(&capabilities))
            .collect();
        let tilts: Vec<Tilt> = (0..surfaces.tilt_targets)
            .filter_map(|_| Tilt::new(&capabilities))
            .collect();
        let glows = (0..surfaces.glow_targets).map(|_| InteractiveGlow::default()).collect();
        let services = (0..surfaces.service_items).map(|_| ServiceHover::default()).collect();

        let timeline = surfaces
            .timeline
            .as_ref()
            .filter(|geometry| !geometry.steps.is_empty())
            .map(TimelineGeometry::progress);

        let reveal = (!surfaces.reveal_elements.is_empty())
            .then(|| RevealTracker::init(surfaces.reveal_elements, &capabilities, layout));

        let counters = MetricCounters::init(surfaces.counters, &capabilities, now);

        let marquee_clone = surfaces
            .marquee
            .and_then(|duration| Marquee::default().duplicate(duration.as_deref()));

        let contact = surfaces
            .contact_fields
            .map(|fields| ContactForm::new(fields.iter().map(String::as_str), surfaces.message_max));

        let modal = surfaces.contact_modal_triggers.and_then(ContactModal::new);

        let offer = surfaces.offer_storage.map(|storage| {
            let mut offer = FounderOffer::with_booking_url(storage, &config.booking_url);
            offer.bind();
            offer
        });

        tracing::info!(
            ambient = ambient.is_some(),
            mascots = mascots.is_some(),
            rain = rain.is_some(),
            trail = trail.is_some(),
            tilt_targets = tilts.len(),
            reduced_motion = capabilities.reduced_motion,
            "Page effects initialised"
        );

        Self {
            config,
            capabilities,
            ambient,
            mascots,
            rain,
            trail,
            pops,
            parallax,
            magnetic,
            tilts,
            glows,
            services,
            timeline,
            reveal,
            counters,
            marquee_clone,
            contact,
            modal,
            offer,
            torn_down: false,
        }
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn footer_year(&self) -> i32 {
        self.config.footer_year
    }

    pub fn ambient(&self) -> Option<&AmbientField> {
        self.ambient.as_ref()
    }

    pub fn mascots(&self) -> Option<&MascotController> {
        self.mascots.as_ref()
    }

    pub fn rain(&self) -> Option<&MoneyRain> {
        self.rain.as_ref()
    }

    pub fn trail(&self) -> Option<&CursorTrail> {
        self.trail.as_ref()
    }

    pub fn pops(&self) -> Option<&CursorPops> {
        self.pops.as_ref()
    }

    pub fn parallax(&self) -> Option<&Parallax> {
        self.parallax.as_ref()
    }

    pub fn magnetic(&self, id: usize) -> Option<&Magnetic> {
        self.magnetic.get(id)
    }

    pub fn tilt(&self, id: usize) -> Option<&Tilt> {
        self.tilts.get(id)
    }

    pub fn glow(&self, id: usize) -> Option<&InteractiveGlow> {
        self.glows.get(id)
    }

    pub fn service(&self, id: usize) -> Option<&ServiceHover> {
        self.services.get(id)
    }

    /// Progress line and active step, when the page has a timeline.
    pub fn timeline(&self) -> Option<TimelineState> {
        self.timeline
    }

    pub fn reveal(&self) -> Option<&RevealTracker> {
        self.reveal.as_ref()
    }

    pub fn marquee_clone(&self) -> Option<MarqueeClone> {
        self.marquee_clone
    }

    pub fn contact_mut(&mut self) -> Option<&mut ContactForm> {
        self.contact.as_mut()
    }

    pub fn contact_modal(&self) -> Option<&ContactModal> {
        self.modal.as_ref()
    }

    pub fn offer(&self) -> Option<&FounderOffer<S>> {
        self.offer.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn route(&mut self, events: Vec<MascotEvent>, now: f64) -> bool {
        let mut started = false;
        for event in events {
            if event == MascotEvent::RainRequested {
                if let Some(rain) = self.rain.as_mut() {
                    rain.trigger(now);
                    started = true;
                }
            }
        }
        started
    }

    /// Mascot click or key press. Returns whether a money rain started.
    pub fn activate_mascot(&mut self, id: usize, input: ActivationInput<'_>, now: f64) -> bool {
        if self.torn_down {
            return false;
        }
        let events = match self.mascots.as_mut() {
            Some(mascots) => mascots.activate(id, input, now),
            None => return false,
        };
        self.route(events, now)
    }

    pub fn pointer_moved(&mut self, kind: PointerKind, x: f64, y: f64, now: f64) {
        if self.torn_down {
            return;
        }
        if let Some(ambient) = self.ambient.as_mut() {
            ambient.pointer_moved(x, y, now);
        }
        if let Some(trail) = self.trail.as_mut() {
            trail.pointer_moved(kind, x, y, now);
        }
        if let Some(pops) = self.pops.as_mut() {
            pops.pointer_moved(kind, x, y, now);
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, now: f64) {
        if self.torn_down {
            return;
        }
        if let Some(ambient) = self.ambient.as_mut() {
            ambient.activate(x, y, now);
        }
        if let Some(trail) = self.trail.as_mut() {
            trail.pointer_down(x, y, now);
        }
    }

    /// Pointer over the hero section, used for the parallax layers.
    pub fn hero_pointer_moved(&mut self, kind: PointerKind, hero: ElementRect, x: f64, y: f64) {
        if self.torn_down {
            return;
        }
        if let Some(parallax) = self.parallax.as_mut() {
            parallax.pointer_moved(kind, hero, x, y);
        }
    }

    pub fn pointer_left(&mut self) {
        if self.torn_down {
            return;
        }
        if let Some(ambient) = self.ambient.as_mut() {
            ambient.pointer_left();
        }
        if let Some(parallax) = self.parallax.as_mut() {
            parallax.reset();
        }
    }

    pub fn target_pointer_moved(
        &mut self,
        target: PointerTarget,
        kind: PointerKind,
        rect: ElementRect,
        x: f64,
        y: f64,
    ) {
        if self.torn_down {
            return;
        }
        match target {
            PointerTarget::Magnetic(id) => {
                if let Some(magnetic) = self.magnetic.get_mut(id) {
                    magnetic.pointer_moved(kind, rect, x, y);
                }
            }
            PointerTarget::Tilt(id) => {
                if let Some(tilt) = self.tilts.get_mut(id) {
                    tilt.pointer_moved(kind, rect, x, y);
                }
            }
            PointerTarget::Glow(id) => {
                if let Some(glow) = self.glows.get_mut(id) {
                    glow.pointer_update(kind, rect, x, y);
                }
            }
            PointerTarget::Service(id) => {
                if let Some(service) = self.services.get_mut(id) {
                    service.pointer_moved(kind, rect, x, y);
                }
            }
        }
    }

    pub fn target_pointer_down(
        &mut self,
        target: PointerTarget,
        kind: PointerKind,
        rect: ElementRect,
        x: f64,
        y: f64,
    ) {
        if self.torn_down {
            return;
        }
        match target {
            PointerTarget::Tilt(id) => {
                if let Some(tilt) = self.tilts.get_mut(id) {
                    tilt.pointer_down(kind);
                }
            }
            PointerTarget::Glow(id) => {
                if let Some(glow) = self.glows.get_mut(id) {
                    glow.pointer_update(kind, rect, x, y);
                }
            }
            PointerTarget::Magnetic(_) | PointerTarget::Service(_) => {}
        }
    }

    /// Only tilt cares; it eases back shortly after release.
    pub fn target_pointer_up(&mut self, target: PointerTarget, now: f64) {
        if self.torn_down {
            return;
        }
        if let PointerTarget::Tilt(id) = target {
            if let Some(tilt) = self.tilts.get_mut(id) {
                tilt.pointer_up(now);
            }
        }
    }

    pub fn target_pointer_left(&mut self, target: PointerTarget) {
        if self.torn_down {
            return;
        }
        match target {
            PointerTarget::Magnetic(id) => {
                if let Some(magnetic) = self.magnetic.get_mut(id) {
                    magnetic.reset();
                }
            }
            PointerTarget::Tilt(id) => {
                if let Some(tilt) = self.tilts.get_mut(id) {
                    tilt.pointer_left();
                }
            }
            PointerTarget::Glow(id) => {
                if let Some(glow) = self.glows.get_mut(id) {
                    glow.reset();
                }
            }
            PointerTarget::Service(id) => {
                if let Some(service) = self.services.get_mut(id) {
                    service.pointer_left();
                }
            }
        }
    }

    /// Keyboard focus centres the glow and drops any magnetic pull.
    pub fn target_focused(&mut self, target: PointerTarget) {
        if self.torn_down {
            return;
        }
        match target {
            PointerTarget::Magnetic(id) => {
                if let Some(magnetic) = self.magnetic.get_mut(id) {
                    magnetic.reset();
                }
            }
            PointerTarget::Glow(id) => {
                if let Some(glow) = self.glows.get_mut(id) {
                    glow.focus();
                }
            }
            PointerTarget::Tilt(_) | PointerTarget::Service(_) => {}
        }
    }

    pub fn target_blurred(&mut self, target: PointerTarget) {
        match target {
            PointerTarget::Magnetic(_) | PointerTarget::Glow(_) => self.target_pointer_left(target),
            PointerTarget::Tilt(_) | PointerTarget::Service(_) => {}
        }
    }

    /// Window scroll. Returns the reveal ids that became visible. The
    /// timeline is re-measured when its geometry is given.
    pub fn scrolled(
        &mut self,
        layout: &impl RevealLayout,
        timeline: Option<&TimelineGeometry>,
    ) -> Vec<usize> {
        self.window_event(WindowListener::Scroll, layout, timeline)
    }

    pub fn resized(
        &mut self,
        width: f64,
        height: f64,
        device_pixel_ratio: f64,
        layout: &impl RevealLayout,
        timeline: Option<&TimelineGeometry>,
    ) -> Vec<usize> {
        if self.torn_down {
            return Vec::new();
        }
        if let Some(ambient) = self.ambient.as_mut() {
            ambient.resize(width, height, device_pixel_ratio);
        }
        self.window_event(WindowListener::Resize, layout, timeline)
    }

    fn window_event(
        &mut self,
        listener: WindowListener,
        layout: &impl RevealLayout,
        timeline: Option<&TimelineGeometry>,
    ) -> Vec<usize> {
        if self.torn_down {
            return Vec::new();
        }
        if let (Some(state), Some(geometry)) = (self.timeline.as_mut(), timeline) {
            if !geometry.steps.is_empty() {
                *state = geometry.progress();
            }
        }
        match self.reveal.as_mut() {
            Some(reveal) => reveal.on_window_event(listener, layout),
            None => Vec::new(),
        }
    }

    pub fn element_intersected(&mut self, id: usize, is_intersecting: bool) -> bool {
        if self.torn_down {
            return false;
        }
        self.reveal
            .as_mut()
            .map(|reveal| reveal.on_intersection(id, is_intersecting))
            .unwrap_or(false)
    }

    pub fn counter_intersected(&mut self, id: usize, is_intersecting: bool, now: f64) -> bool {
        if self.torn_down {
            return false;
        }
        self.counters.on_intersection(id, is_intersecting, now)
    }

    pub fn bill_finished(&mut self, id: u64) {
        if self.torn_down {
            return;
        }
        if let Some(rain) = self.rain.as_mut() {
            rain.bill_finished(id);
        }
    }

    pub fn claim_offer(&mut self, scheduler: &mut impl Scheduler) -> Option<u32> {
        if self.torn_down {
            return None;
        }
        self.offer.as_mut().map(|offer| offer.claim(scheduler))
    }

    pub fn open_contact_modal(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        match self.modal.as_mut() {
            Some(modal) => {
                modal.open();
                true
            }
            None => false,
        }
    }

    /// Click inside the dialog. Returns whether it closed.
    pub fn contact_modal_clicked(&mut self, data_close: Option<&str>) -> bool {
        if self.torn_down {
            return false;
        }
        self.modal
            .as_mut()
            .map(|modal| modal.clicked(data_close))
            .unwrap_or(false)
    }

    /// Document keydown. Escape closes the contact dialog.
    pub fn key_pressed(&mut self, key: &str) -> bool {
        if self.torn_down {
            return false;
        }
        self.modal
            .as_mut()
            .map(|modal| modal.key_pressed(key))
            .unwrap_or(false)
    }

    /// The shared animation-frame callback. `None` after teardown.
    pub fn frame(&mut self, now: f64) -> Option<PageFrame> {
        if self.torn_down {
            return None;
        }
        let scene = self.ambient.as_mut().and_then(|ambient| ambient.frame(now));

        let events = self
            .mascots
            .as_mut()
            .map(|mascots| mascots.frame(now))
            .unwrap_or_default();
        let rain_started = self.route(events, now);

        if let Some(rain) = self.rain.as_mut() {
            rain.advance(now);
        }
        let glyphs = self
            .trail
            .as_mut()
            .and_then(|trail| trail.frame(now))
            .unwrap_or_default();
        if let Some(pops) = self.pops.as_mut() {
            pops.advance(now);
        }
        for tilt in &mut self.tilts {
            tilt.tick(now);
        }

        Some(PageFrame {
            scene,
            mascots: self.mascots.as_ref().map(|m| m.render()).unwrap_or_default(),
            bills: self.rain.as_ref().map(|r| r.bills().to_vec()).unwrap_or_default(),
            glyphs,
            pops: self.pops.as_ref().map(|p| p.pops().to_vec()).unwrap_or_default(),
            counters: self.counters.texts(now),
            rain_started,
        })
    }

    /// Cancels every frame loop, timer and listener.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        if let Some(ambient) = self.ambient.as_mut() {
            ambient.stop();
        }
        if let Some(mascots) = self.mascots.as_mut() {
            mascots.stop();
        }
        if let Some(rain) = self.rain.as_mut() {
            rain.stop();
        }
        if let Some(trail) = self.trail.as_mut() {
            trail.stop();
        }
        if let Some(pops) = self.pops.as_mut() {
            pops.stop();
        }
        for tilt in &mut self.tilts {
            tilt.pointer_left();
        }
        if let Some(reveal) = self.reveal.as_mut() {
            reveal.detach();
        }
        if let Some(modal) = self.modal.as_mut() {
            modal.before_unload();
        }
        self.torn_down = true;
        tracing::debug!("Page effects torn down");
    }
}
