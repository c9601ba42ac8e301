//! Small pointer and scroll flourishes: parallax layers, magnetic buttons,
//! card tilt, gradient glow, service hover spots, the logo marquee, metric
//! count-ups and the process timeline.

use crate::effects::capabilities::{Capabilities, PointerKind};
use crate::utils::parse::parse_int_prefix;
use serde::Serialize;

const MAGNETIC_STRENGTH: f64 = 18.0;
const PARALLAX_SPAN: f64 = 16.0;
const TILT_X_DEG: f64 = 12.0;
const TILT_Y_DEG: f64 = 14.0;
const TILT_RESET_DELAY_MS: f64 = 120.0;
const DEFAULT_MARQUEE_SECONDS: f64 = 24.0;
const DEFAULT_COUNT_DURATION_MS: f64 = 1600.0;
const TIMELINE_FOCUS: f64 = 0.45;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ElementRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    /// Pointer position as a fraction of the element, unclamped.
    fn ratio(&self, client_x: f64, client_y: f64) -> Option<(f64, f64)> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some((
            (client_x - self.left) / self.width,
            (client_y - self.top) / self.height,
        ))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Translate {
    pub x: f64,
    pub y: f64,
}

impl Translate {
    pub fn css(&self) -> String {
        format!("translate({:.2}px, {:.2}px)", self.x, self.y)
    }
}

// Parallax

pub struct Parallax {
    depths: Vec<f64>,
    offsets: Vec<Translate>,
}

impl Parallax {
    /// Layers without a readable depth get 0.2. Returns `None` under reduced
    /// motion or when there are no layers.
    pub fn new(layer_depths: &[Option<&str>], capabilities: &Capabilities) -> Option<Self> {
        if capabilities.reduced_motion || layer_depths.is_empty() {
            return None;
        }
        let depths: Vec<f64> = layer_depths
            .iter()
            .map(|d| d.and_then(|d| d.trim().parse::<f64>().ok()).filter(|d| *d != 0.0).unwrap_or(0.2))
            .collect();
        let offsets = vec![Translate::default(); depths.len()];
        Some(Self { depths, offsets })
    }

    pub fn pointer_moved(&mut self, kind: PointerKind, root: ElementRect, client_x: f64, client_y: f64) {
        if kind == PointerKind::Touch {
            return;
        }
        let Some((rx, ry)) = root.ratio(client_x, client_y) else {
            return;
        };
        let (x, y) = ((rx - 0.5) * 2.0, (ry - 0.5) * 2.0);
        for (offset, depth) in self.offsets.iter_mut().zip(&self.depths) {
            *offset = Translate {
                x: -x * depth * PARALLAX_SPAN,
                y: -y * depth * PARALLAX_SPAN,
            };
        }
    }

    pub fn reset(&mut self) {
        self.offsets.iter_mut().for_each(|o| *o = Translate::default());
    }

    pub fn offsets(&self) -> &[Translate] {
        &self.offsets
    }
}

// Magnetic

#[derive(Debug, Default)]
pub struct Magnetic {
    offset: Option<Translate>,
}

impl Magnetic {
    pub fn new(capabilities: &Capabilities) -> Option<Self> {
        if capabilities.reduced_motion {
            return None;
        }
        Some(Self::default())
    }

    pub fn pointer_moved(&mut self, kind: PointerKind, rect: ElementRect, client_x: f64, client_y: f64) {
        if kind == PointerKind::Touch {
            return;
        }
        if let Some((rx, ry)) = rect.ratio(client_x, client_y) {
            self.offset = Some(Translate {
                x: (rx - 0.5) * MAGNETIC_STRENGTH,
                y: (ry - 0.5) * MAGNETIC_STRENGTH,
            });
        }
    }

    /// Pointer leave, focus and blur all drop the transform.
    pub fn reset(&mut self) {
        self.offset = None;
    }

    pub fn transform(&self) -> Option<String> {
        self.offset.map(|o| o.css())
    }
}

// Tilt

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TiltState {
    pub tilt_x_deg: f64,
    pub tilt_y_deg: f64,
    pub pointer_x_percent: f64,
    pub pointer_y_percent: f64,
    pub active: bool,
}

#[derive(Debug, Default)]
pub struct Tilt {
    state: TiltState,
    reset_at: Option<f64>,
}

impl Tilt {
    pub fn new(capabilities: &Capabilities) -> Option<Self> {
        if capabilities.reduced_motion || capabilities.coarse_pointer {
            return None;
        }
        Some(Self::default())
    }

    pub fn pointer_moved(&mut self, kind: PointerKind, rect: ElementRect, client_x: f64, client_y: f64) {
        if kind == PointerKind::Touch {
            return;
        }
        let Some((rx, ry)) = rect.ratio(client_x, client_y) else {
            return;
        };
        let (rx, ry) = (rx.clamp(0.0, 1.0), ry.clamp(0.0, 1.0));
        self.state = TiltState {
            tilt_x_deg: (0.5 - ry) * TILT_X_DEG,
            tilt_y_deg: (rx - 0.5) * TILT_Y_DEG,
            pointer_x_percent: rx * 100.0,
            pointer_y_percent: ry * 100.0,
            active: true,
        };
        self.reset_at = None;
    }

    pub fn pointer_down(&mut self, kind: PointerKind) {
        if kind != PointerKind::Touch {
            self.state.active = true;
        }
    }

    /// Pointer up eases back after a short delay.
    pub fn pointer_up(&mut self, now: f64) {
        self.reset_at = Some(now + TILT_RESET_DELAY_MS);
    }

    pub fn pointer_left(&mut self) {
        self.reset();
    }

    pub fn tick(&mut self, now: f64) {
        if self.reset_at.is_some_and(|at| at <= now) {
            self.reset();
        }
    }

    fn reset(&mut self) {
        self.state.tilt_x_deg = 0.0;
        self.state.tilt_y_deg = 0.0;
        self.state.active = false;
        self.reset_at = None;
    }

    pub fn state(&self) -> TiltState {
        self.state
    }
}

// Glow

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GlowState {
    pub active: bool,
    pub pointer_x_percent: f64,
    pub pointer_y_percent: f64,
    pub opacity: f64,
}

/// Gradient highlight that follows the pointer over `[data-gradient]`
/// elements. Focus centres it.
#[derive(Debug, Default)]
pub struct InteractiveGlow {
    state: GlowState,
}

impl InteractiveGlow {
    /// Enter, move and down all land here.
    pub fn pointer_update(&mut self, kind: PointerKind, rect: ElementRect, client_x: f64, client_y: f64) {
        if kind == PointerKind::Touch {
            return;
        }
        self.state.active = true;
        self.state.opacity = 1.0;
        if let Some((rx, ry)) = rect.ratio(client_x, client_y) {
            self.state.pointer_x_percent = rx * 100.0;
            self.state.pointer_y_percent = ry * 100.0;
        }
    }

    pub fn focus(&mut self) {
        self.state = GlowState {
            active: true,
            pointer_x_percent: 50.0,
            pointer_y_percent: 50.0,
            opacity: 1.0,
        };
    }

    /// Leave and blur. The last position is kept so the fade-out stays put.
    pub fn reset(&mut self) {
        self.state.active = false;
        self.state.opacity = 0.0;
    }

    pub fn state(&self) -> GlowState {
        self.state
    }

    pub fn properties(&self) -> [(&'static str, String); 3] {
        [
            ("--pointer-x", format!("{}%", self.state.pointer_x_percent)),
            ("--pointer-y", format!("{}%", self.state.pointer_y_percent)),
            ("--pointer-opacity", format!("{}", self.state.opacity)),
        ]
    }
}

// Service hover

#[derive(Debug, Default)]
pub struct ServiceHover {
    spot: Option<Translate>,
}

impl ServiceHover {
    pub fn pointer_moved(&mut self, kind: PointerKind, rect: ElementRect, client_x: f64, client_y: f64) {
        if kind == PointerKind::Touch {
            return;
        }
        self.spot = Some(Translate {
            x: client_x - rect.left,
            y: client_y - rect.top,
        });
    }

    pub fn pointer_left(&mut self) {
        self.spot = None;
    }

    /// `--mx`/`--my` in pixels, or nothing once the pointer has left.
    pub fn properties(&self) -> Option<[(&'static str, String); 2]> {
        self.spot
            .map(|s| [("--mx", format!("{}px", s.x)), ("--my", format!("{}px", s.y))])
    }
}

// Marquee

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MarqueeClone {
    /// Negative delay so the clone runs half a loop ahead.
    pub animation_delay_s: f64,
    pub aria_hidden: bool,
}

#[derive(Debug, Default)]
pub struct Marquee {
    duplicated: bool,
}

impl Marquee {
    /// Duplicates the track once; later calls return `None`.
    pub fn duplicate(&mut self, computed_duration: Option<&str>) -> Option<MarqueeClone> {
        if self.duplicated {
            return None;
        }
        self.duplicated = true;
        let seconds = computed_duration
            .map(str::trim)
            .and_then(|d| match d.strip_suffix("ms") {
                Some(ms) => ms.parse::<f64>().ok().map(|ms| ms / 1000.0),
                None => d.trim_end_matches('s').parse::<f64>().ok(),
            })
            .filter(|d| *d > 0.0)
            .unwrap_or(DEFAULT_MARQUEE_SECONDS);
        Some(MarqueeClone {
            animation_delay_s: -seconds / 2.0,
            aria_hidden: true,
        })
    }
}

// Metric counters

pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(3)
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricCounter {
    pub target: f64,
    pub duration_ms: f64,
    pub prefix: String,
    pub suffix: String,
    pub decimals: usize,
    pub start_value: f64,
    started_at: Option<f64>,
}

/// Raw `data-count-*` attributes plus the element's current text.
#[derive(Clone, Debug, Default)]
pub struct CounterAttributes<'a> {
    pub count_to: Option<&'a str>,
    pub duration: Option<&'a str>,
    pub prefix: Option<&'a str>,
    pub suffix: Option<&'a str>,
    pub decimals: Option<&'a str>,
    pub text: &'a str,
}

impl MetricCounter {
    pub fn from_attributes(attrs: &CounterAttributes<'_>) -> Option<Self> {
        let target = attrs.count_to?.trim().parse::<f64>().ok().filter(|t| t.is_finite())?;
        let duration_ms = attrs
            .duration
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| *d > 0.0)
            .unwrap_or(DEFAULT_COUNT_DURATION_MS);
        let decimals = attrs
            .decimals
            .and_then(parse_int_prefix)
            .map(|d| d.clamp(0, 10) as usize)
            .unwrap_or(0);
        let numeric: String = attrs
            .text
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        let start_value = numeric.parse::<f64>().unwrap_or(0.0);
        Some(Self {
            target,
            duration_ms,
            prefix: attrs.prefix.unwrap_or_default().to_string(),
            suffix: attrs.suffix.unwrap_or_default().to_string(),
            decimals,
            start_value,
            started_at: None,
        })
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Starts the count once; later calls are ignored.
    pub fn start(&mut self, now: f64) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    pub fn progress(&self, now: f64) -> f64 {
        match self.started_at {
            Some(start) => ((now - start) / self.duration_ms).clamp(0.0, 1.0),
            None => 0.0,
        }
    }

    pub fn is_done(&self, now: f64) -> bool {
        self.progress(now) >= 1.0
    }

    pub fn text_at(&self, now: f64) -> String {
        let eased = ease_out_cubic(self.progress(now));
        let value = self.start_value + (self.target - self.start_value) * eased;
        format!("{}{:.*}{}", self.prefix, self.decimals, value, self.suffix)
    }
}

pub struct MetricCounters {
    counters: Vec<MetricCounter>,
    observe: bool,
}

impl MetricCounters {
    /// Without an observer (or under reduced motion) every counter starts now.
    pub fn init(counters: Vec<MetricCounter>, capabilities: &Capabilities, now: f64) -> Self {
        let observe = !capabilities.reduced_motion && capabilities.intersection_observer;
        let mut counters = Self { counters, observe };
        if !counters.observe {
            counters.counters.iter_mut().for_each(|c| {
                c.start(now);
            });
        }
        counters
    }

    pub fn is_observing(&self) -> bool {
        self.observe
    }

    pub fn on_intersection(&mut self, id: usize, is_intersecting: bool, now: f64) -> bool {
        if !self.observe || !is_intersecting {
            return false;
        }
        self.counters.get_mut(id).map(|c| c.start(now)).unwrap_or(false)
    }

    /// Counters that still need frames.
    pub fn animating(&self, now: f64) -> usize {
        self.counters
            .iter()
            .filter(|c| c.has_started() && !c.is_done(now))
            .count()
    }

    pub fn texts(&self, now: f64) -> Vec<Option<String>> {
        self.counters
            .iter()
            .map(|c| c.has_started().then(|| c.text_at(now)))
            .collect()
    }
}

// Timeline

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TimelineState {
    pub progress: f64,
    pub active_step: Option<usize>,
}

/// Where the timeline and its steps sit right now, in viewport coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimelineGeometry {
    pub timeline: ElementRect,
    pub steps: Vec<ElementRect>,
    pub viewport_height: f64,
    pub scroll_top: f64,
}

impl TimelineGeometry {
    pub fn progress(&self) -> TimelineState {
        timeline_progress(self.timeline, &self.steps, self.viewport_height, self.scroll_top)
    }
}

/// `timeline` is the container rect in viewport coordinates; `steps` are the
/// step rects likewise.
pub fn timeline_progress(
    timeline: ElementRect,
    steps: &[ElementRect],
    viewport_height: f64,
    scroll_top: f64,
) -> TimelineState {
    let start = timeline.top + scroll_top;
    let end = start + timeline.height;
    let center_scroll = scroll_top + viewport_height * TIMELINE_FOCUS;
    let progress = if end > start {
        ((center_scroll - start) / (end - start)).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let focus = viewport_height * TIMELINE_FOCUS;
    let active_step = steps
        .iter()
        .enumerate()
        .map(|(i, step)| (i, (step.top + step.height / 2.0 - focus).abs()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i);

    TimelineState { progress, active_step }
}
