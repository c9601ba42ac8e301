use crate::effects::capabilities::{Capabilities, PointerKind};
use crate::effects::timers::TimerSet;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;
use std::f64::consts::TAU;

const MAX_GLYPHS: usize = 72;
const MAX_FRAME_DELTA_MS: f64 = 48.0;
const CLICK_BOOST: f64 = 0.6;
const POP_WORDS: [&str; 6] = ["CPC", "CAC", "ROAS", "A/B", "CRM", "SEM"];
const POP_MIN_DELAY_MS: f64 = 120.0;
const POP_MIN_DELAY_COARSE_MS: f64 = 260.0;
const POP_LIFETIME_MS: f64 = 1700.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Keyword {
    pub text: &'static str,
    pub rgb: (u8, u8, u8),
}

pub const KEYWORDS: [Keyword; 5] = [
    Keyword { text: "CPC", rgb: (47, 128, 237) },
    Keyword { text: "SEM", rgb: (14, 165, 233) },
    Keyword { text: "CAC", rgb: (14, 165, 129) },
    Keyword { text: "CRM", rgb: (79, 70, 229) },
    Keyword { text: "ROAS", rgb: (217, 119, 6) },
];

#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub life: f64,
    pub wobble: f64,
    pub boost: f64,
    pub keyword: Keyword,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GlyphSprite {
    pub text: &'static str,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub alpha: f64,
    pub fill: String,
    /// Only ROAS gets an outline.
    pub outlined: bool,
}

/// Marketing keywords that float up from the pointer and fade out.
pub struct CursorTrail {
    rng: StdRng,
    glyphs: VecDeque<Glyph>,
    next_keyword: usize,
    last_frame: Option<f64>,
}

impl CursorTrail {
    /// `None` on touch-first devices.
    pub fn new(capabilities: &Capabilities, rng: StdRng) -> Option<Self> {
        if capabilities.coarse_pointer {
            return None;
        }
        Some(Self {
            rng,
            glyphs: VecDeque::with_capacity(MAX_GLYPHS + 1),
            next_keyword: 0,
            last_frame: None,
        })
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.iter()
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Whether the trail wants another animation frame.
    pub fn is_animating(&self) -> bool {
        self.last_frame.is_some()
    }

    pub fn pointer_moved(&mut self, kind: PointerKind, x: f64, y: f64, now: f64) {
        if kind == PointerKind::Touch {
            return;
        }
        self.add_glyph(x, y, 0.0, now);
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, now: f64) {
        self.add_glyph(x, y, CLICK_BOOST, now);
    }

    fn add_glyph(&mut self, x: f64, y: f64, boost: f64, now: f64) {
        let keyword = KEYWORDS[self.next_keyword];
        self.next_keyword = (self.next_keyword + 1) % KEYWORDS.len();
        self.glyphs.push_back(Glyph {
            x,
            y,
            vx: (self.rng.gen::<f64>() - 0.5) * 0.45,
            vy: -0.25 - self.rng.gen::<f64>() * 0.2,
            life: 1.0,
            wobble: self.rng.gen::<f64>() * TAU,
            boost,
            keyword,
        });
        if self.glyphs.len() > MAX_GLYPHS {
            self.glyphs.pop_front();
        }
        if self.last_frame.is_none() {
            self.last_frame = Some(now);
        }
    }

    /// Ages every glyph by `delta_ms` and drops the dead ones.
    pub fn step(&mut self, delta_ms: f64) {
        let delta = delta_ms.clamp(0.0, MAX_FRAME_DELTA_MS);
        self.glyphs.retain_mut(|glyph| {
            glyph.life -= 0.016 * (delta / 16.0);
            if glyph.life <= 0.0 {
                return false;
            }
            glyph.x += glyph.vx * delta * 0.05;
            glyph.y += glyph.vy * delta * 0.05;
            glyph.wobble += 0.14;
            true
        });
    }

    /// Animation-frame callback. The loop stops itself once the trail is empty.
    pub fn frame(&mut self, timestamp: f64) -> Option<Vec<GlyphSprite>> {
        let last = self.last_frame?;
        let delta = match timestamp - last {
            d if d > 0.0 => d.min(MAX_FRAME_DELTA_MS),
            _ => 16.0,
        };
        self.step(delta);
        self.last_frame = if self.glyphs.is_empty() { None } else { Some(timestamp) };
        Some(self.render())
    }

    pub fn render(&self) -> Vec<GlyphSprite> {
        self.glyphs
            .iter()
            .map(|glyph| {
                let alpha = (glyph.life + glyph.boost * 0.25).clamp(0.0, 1.0);
                let (r, g, b) = glyph.keyword.rgb;
                GlyphSprite {
                    text: glyph.keyword.text,
                    x: glyph.x + glyph.wobble.sin() * 8.0,
                    y: glyph.y + glyph.wobble.cos() * 6.0,
                    font_size: 18.0 + (1.0 - glyph.life) * 16.0 + glyph.boost * 6.0,
                    alpha,
                    fill: format!("rgba({}, {}, {}, {:.3})", r, g, b, alpha),
                    outlined: glyph.keyword.text == "ROAS",
                }
            })
            .collect()
    }

    pub fn stop(&mut self) {
        self.glyphs.clear();
        self.last_frame = None;
    }
}

/// A word dropped at the pointer. ROAS is the gold one.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Pop {
    pub id: u64,
    pub word: &'static str,
    pub gold: bool,
    pub x: f64,
    pub y: f64,
}

/// Throttled word pops that follow the pointer and expire on a timer.
pub struct CursorPops {
    min_delay_ms: f64,
    last_spawn: Option<f64>,
    next_word: usize,
    next_id: u64,
    pops: Vec<Pop>,
    expiries: TimerSet<u64>,
}

impl CursorPops {
    pub fn new(capabilities: &Capabilities) -> Self {
        let min_delay_ms = if capabilities.coarse_pointer {
            POP_MIN_DELAY_COARSE_MS
        } else {
            POP_MIN_DELAY_MS
        };
        Self {
            min_delay_ms,
            last_spawn: None,
            next_word: 0,
            next_id: 0,
            pops: Vec::new(),
            expiries: TimerSet::new(),
        }
    }

    pub fn min_delay_ms(&self) -> f64 {
        self.min_delay_ms
    }

    /// Spawns the next word unless the last one is too recent.
    pub fn pointer_moved(&mut self, kind: PointerKind, x: f64, y: f64, now: f64) -> Option<&Pop> {
        if kind == PointerKind::Touch {
            return None;
        }
        if self.last_spawn.is_some_and(|last| now - last < self.min_delay_ms) {
            return None;
        }
        self.last_spawn = Some(now);

        let word = POP_WORDS[self.next_word % POP_WORDS.len()];
        self.next_word += 1;
        let id = self.next_id;
        self.next_id += 1;
        self.expiries.schedule(now, POP_LIFETIME_MS, id);
        self.pops.push(Pop {
            id,
            word,
            gold: word == "ROAS",
            x,
            y,
        });
        self.pops.last()
    }

    /// Drops expired pops and returns their ids.
    pub fn advance(&mut self, now: f64) -> Vec<u64> {
        let expired: Vec<u64> = self.expiries.take_due(now).into_iter().map(|(_, id)| id).collect();
        self.pops.retain(|pop| !expired.contains(&pop.id));
        expired
    }

    pub fn pops(&self) -> &[Pop] {
        &self.pops
    }

    pub fn pending_timers(&self) -> usize {
        self.expiries.len()
    }

    pub fn stop(&mut self) {
        self.expiries.clear();
        self.pops.clear();
    }
}
