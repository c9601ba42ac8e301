//! The leprechaun mascots: a handful of sprites racing across the viewport
//! that speed up, change heading and finally burst into coins when clicked.
//! Once every mascot is gone the controller asks for the money rain.

use crate::effects::timers::{TimerId, TimerSet};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MascotStatus {
    Running,
    Boosted,
    Exploding,
    Hidden,
}

impl MascotStatus {
    /// The transition table. Anything not listed is rejected and the caller
    /// treats the request as a no-op.
    pub fn can_transition_to(self, next: MascotStatus) -> bool {
        use MascotStatus::*;
        matches!(
            (self, next),
            (Running, Boosted)
                | (Boosted, Boosted)
                | (Running, Exploding)
                | (Boosted, Exploding)
                | (Exploding, Hidden)
                | (Hidden, Running)
        )
    }

    pub fn is_interactive(self) -> bool {
        matches!(self, MascotStatus::Running | MascotStatus::Boosted)
    }

    pub fn is_visible(self) -> bool {
        self != MascotStatus::Hidden
    }
}

/// How the first activation is handled. Older builds of the page exploded the
/// mascot straight away; current ones escalate over three clicks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMode {
    #[default]
    Escalating,
    Instant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MascotConfig {
    pub count: usize,
    pub mode: ActivationMode,
    pub respawn_delay_ms: f64,
    pub explode_delay_ms: f64,
    pub speed_step: f64,
    pub max_speed: f64,
    pub base_speed: f64,
    pub reduced_motion_speed: f64,
    pub burst_coins: usize,
    pub reduced_motion_burst_coins: usize,
    pub max_frame_delta_ms: f64,
}

impl Default for MascotConfig {
    fn default() -> Self {
        Self {
            count: 3,
            mode: ActivationMode::Escalating,
            respawn_delay_ms: 20_000.0,
            explode_delay_ms: 480.0,
            speed_step: 1.25,
            max_speed: 0.055,
            base_speed: 0.033,
            reduced_motion_speed: 0.018,
            burst_coins: 8,
            reduced_motion_burst_coins: 5,
            max_frame_delta_ms: 48.0,
        }
    }
}

// Movement bounds in viewport percent.
const MIN_X: f64 = 4.0;
const MAX_X: f64 = 96.0;
const MIN_Y: f64 = 12.0;
const MAX_Y: f64 = 84.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Mascot {
    pub id: usize,
    /// Viewport width percent.
    pub x: f64,
    /// Viewport height percent.
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub speed: f64,
    pub base_speed: f64,
    pub clicks: u32,
    status: MascotStatus,
    respawn_timer: Option<TimerId>,
}

impl Mascot {
    pub fn status(&self) -> MascotStatus {
        self.status
    }

    fn set_status(&mut self, next: MascotStatus) -> bool {
        if !self.status.can_transition_to(next) {
            tracing::debug!(id = self.id, from = ?self.status, to = ?next, "Ignoring invalid mascot transition");
            return false;
        }
        self.status = next;
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum CoinVariant {
    Fall,
    Burst { dx: f64, dy: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Coin {
    pub x: f64,
    pub y: f64,
    pub delay_ms: f64,
    #[serde(flatten)]
    pub variant: CoinVariant,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum MascotEvent {
    Coin(Coin),
    Exploding { id: usize },
    Hidden { id: usize },
    Respawned { id: usize },
    /// Every mascot is hidden and the rain lock was free.
    RainRequested,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MascotSprite {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub facing: Facing,
    pub status: MascotStatus,
    pub visible: bool,
    pub interactive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MascotTimer {
    FinishExplosion(usize),
    Respawn(usize),
}

/// Keyboard and pointer input that counts as activating a mascot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationInput<'a> {
    PointerDown,
    MouseDown,
    TouchStart,
    Key(&'a str),
}

impl ActivationInput<'_> {
    pub fn is_primary(self) -> bool {
        match self {
            ActivationInput::PointerDown | ActivationInput::MouseDown | ActivationInput::TouchStart => true,
            ActivationInput::Key(key) => key == "Enter" || key == " ",
        }
    }
}

fn random_between(rng: &mut StdRng, min: f64, max: f64) -> f64 {
    min + rng.gen::<f64>() * (max - min)
}

/// A heading for a mascot. Regular headings are near-horizontal; diagonal ones
/// are steep (45° to 90° off the horizontal) in a random quadrant.
fn create_velocity(rng: &mut StdRng, diagonal: bool) -> (f64, f64) {
    let angle = if diagonal {
        let mut angle = random_between(rng, PI / 4.0, PI / 2.0);
        if rng.gen_bool(0.5) {
            angle = -angle;
        }
        if rng.gen_bool(0.5) {
            angle = PI - angle;
        }
        angle
    } else {
        let angle = random_between(rng, -0.35, 0.35);
        if rng.gen_bool(0.5) {
            angle + PI
        } else {
            angle
        }
    };
    (angle.cos(), angle.sin() * 0.75)
}

pub struct MascotController {
    config: MascotConfig,
    rng: StdRng,
    mascots: Vec<Mascot>,
    timers: TimerSet<MascotTimer>,
    rain_locked: bool,
    reduced_motion: bool,
    running: bool,
    last_frame: Option<f64>,
}

impl MascotController {
    pub fn new(config: MascotConfig, reduced_motion: bool, mut rng: StdRng) -> Self {
        let base_speed = if reduced_motion {
            config.reduced_motion_speed
        } else {
            config.base_speed
        };
        let mascots = (0..config.count)
            .map(|id| {
                let x = random_between(&mut rng, 12.0, 88.0);
                let y = random_between(&mut rng, 20.0, 78.0);
                let (vx, vy) = create_velocity(&mut rng, false);
                Mascot {
                    id,
                    x,
                    y,
                    vx,
                    vy,
                    speed: base_speed,
                    base_speed,
                    clicks: 0,
                    status: MascotStatus::Running,
                    respawn_timer: None,
                }
            })
            .collect();

        Self {
            config,
            rng,
            mascots,
            timers: TimerSet::new(),
            rain_locked: false,
            reduced_motion,
            running: false,
            last_frame: None,
        }
    }

    pub fn mascots(&self) -> &[Mascot] {
        &self.mascots
    }

    pub fn rain_locked(&self) -> bool {
        self.rain_locked
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn start(&mut self, now: f64) {
        self.running = true;
        self.last_frame = Some(now);
    }

    /// Page teardown: stops the frame loop and clears every tracked timer.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_frame = None;
        self.timers.clear();
        for mascot in &mut self.mascots {
            mascot.respawn_timer = None;
        }
    }

    /// Handles a pointer or keyboard activation. Exploding and hidden mascots
    /// ignore input, as do unknown ids and non-primary keys.
    pub fn activate(&mut self, id: usize, input: ActivationInput<'_>, now: f64) -> Vec<MascotEvent> {
        let mut events = Vec::new();
        if !input.is_primary() {
            return events;
        }
        let Some(mascot) = self.mascots.get_mut(id) else {
            return events;
        };
        if !mascot.status.is_interactive() {
            return events;
        }

        mascot.clicks += 1;
        events.push(MascotEvent::Coin(Coin {
            x: mascot.x,
            y: mascot.y,
            delay_ms: 0.0,
            variant: CoinVariant::Fall,
        }));

        let clicks = mascot.clicks;
        match (self.config.mode, clicks) {
            (ActivationMode::Escalating, 1) => {
                let mascot = &mut self.mascots[id];
                mascot.speed = (mascot.speed * self.config.speed_step).min(self.config.max_speed);
                mascot.set_status(MascotStatus::Boosted);
            }
            (ActivationMode::Escalating, 2) => {
                let (vx, vy) = create_velocity(&mut self.rng, true);
                let mascot = &mut self.mascots[id];
                mascot.vx = vx;
                mascot.vy = vy;
                mascot.speed = (mascot.speed * self.config.speed_step).min(self.config.max_speed);
                mascot.set_status(MascotStatus::Boosted);
            }
            _ => events.extend(self.explode(id, now)),
        }
        events
    }

    fn explode(&mut self, id: usize, now: f64) -> Vec<MascotEvent> {
        let mut events = Vec::new();
        if !self.mascots[id].set_status(MascotStatus::Exploding) {
            return events;
        }
        events.push(MascotEvent::Exploding { id });

        let bursts = if self.reduced_motion {
            self.config.reduced_motion_burst_coins
        } else {
            self.config.burst_coins
        };
        let (x, y) = (self.mascots[id].x, self.mascots[id].y);
        for i in 0..bursts {
            let angle = (PI * 2.0 * i as f64) / bursts as f64 + random_between(&mut self.rng, -0.4, 0.4);
            let distance = random_between(&mut self.rng, 38.0, 86.0);
            events.push(MascotEvent::Coin(Coin {
                x,
                y,
                delay_ms: i as f64 * 18.0,
                variant: CoinVariant::Burst {
                    dx: angle.cos() * distance,
                    dy: angle.sin() * distance,
                },
            }));
        }

        self.timers
            .schedule(now, self.config.explode_delay_ms, MascotTimer::FinishExplosion(id));
        events
    }

    fn hide(&mut self, id: usize, now: f64) -> Vec<MascotEvent> {
        let mut events = Vec::new();
        if !self.mascots[id].set_status(MascotStatus::Hidden) {
            return events;
        }
        events.push(MascotEvent::Hidden { id });

        let all_hidden = self
            .mascots
            .iter()
            .all(|mascot| mascot.status == MascotStatus::Hidden);
        if all_hidden && !self.rain_locked {
            self.rain_locked = true;
            tracing::info!("All mascots caught, requesting money rain");
            events.push(MascotEvent::RainRequested);
        }

        let timer = self
            .timers
            .schedule(now, self.config.respawn_delay_ms, MascotTimer::Respawn(id));
        self.mascots[id].respawn_timer = Some(timer);
        events
    }

    fn respawn(&mut self, id: usize, timer: TimerId) -> Vec<MascotEvent> {
        let mut events = Vec::new();
        if self.mascots[id].respawn_timer != Some(timer) {
            return events;
        }
        let x = random_between(&mut self.rng, 12.0, 88.0);
        let y = random_between(&mut self.rng, 18.0, 78.0);
        let (vx, vy) = create_velocity(&mut self.rng, false);

        let mascot = &mut self.mascots[id];
        if !mascot.set_status(MascotStatus::Running) {
            return events;
        }
        mascot.respawn_timer = None;
        mascot.x = x;
        mascot.y = y;
        mascot.vx = vx;
        mascot.vy = vy;
        mascot.speed = mascot.base_speed;
        mascot.clicks = 0;
        events.push(MascotEvent::Respawned { id });

        if self
            .mascots
            .iter()
            .all(|mascot| mascot.status != MascotStatus::Hidden)
        {
            self.rain_locked = false;
        }
        events
    }

    /// Fires every timer due at `now`.
    pub fn advance_timers(&mut self, now: f64) -> Vec<MascotEvent> {
        let mut events = Vec::new();
        for (timer, fired) in self.timers.take_due(now) {
            match fired {
                MascotTimer::FinishExplosion(id) => events.extend(self.hide(id, now)),
                MascotTimer::Respawn(id) => events.extend(self.respawn(id, timer)),
            }
        }
        events
    }

    /// Moves running and boosted mascots, bouncing off the viewport bounds.
    pub fn step(&mut self, delta_ms: f64) {
        let delta = delta_ms.clamp(0.0, self.config.max_frame_delta_ms);
        for mascot in &mut self.mascots {
            if !mascot.status.is_interactive() {
                continue;
            }
            let speed_factor = mascot.speed * (delta / 16.0);
            mascot.x += mascot.vx * speed_factor;
            mascot.y += mascot.vy * speed_factor;

            if mascot.x < MIN_X {
                mascot.x = MIN_X;
                mascot.vx = -mascot.vx;
            }
            if mascot.x > MAX_X {
                mascot.x = MAX_X;
                mascot.vx = -mascot.vx;
            }
            if mascot.y < MIN_Y {
                mascot.y = MIN_Y;
                mascot.vy = mascot.vy.abs();
            }
            if mascot.y > MAX_Y {
                mascot.y = MAX_Y;
                mascot.vy = -mascot.vy.abs();
            }
        }
    }

    /// One animation-frame callback.
    pub fn frame(&mut self, timestamp: f64) -> Vec<MascotEvent> {
        if !self.running {
            return Vec::new();
        }
        let events = self.advance_timers(timestamp);
        let delta = match self.last_frame {
            Some(last) if timestamp - last > 0.0 => (timestamp - last).min(self.config.max_frame_delta_ms),
            _ => 16.0,
        };
        self.last_frame = Some(timestamp);
        self.step(delta);
        events
    }

    pub fn render(&self) -> Vec<MascotSprite> {
        self.mascots
            .iter()
            .map(|mascot| MascotSprite {
                id: mascot.id,
                x: mascot.x,
                y: mascot.y,
                facing: if mascot.vx < 0.0 { Facing::Left } else { Facing::Right },
                status: mascot.status,
                visible: mascot.status.is_visible(),
                interactive: mascot.status.is_interactive(),
            })
            .collect()
    }
}
