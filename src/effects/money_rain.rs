use crate::effects::timers::TimerSet;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RainConfig {
    pub duration_ms: f64,
    pub base_interval_ms: f64,
    pub interval_jitter_ms: f64,
    pub fall_base_ms: f64,
    pub fall_jitter_ms: f64,
    /// Extra time after `duration_ms` before stragglers are force-removed.
    pub cleanup_grace_ms: f64,
    pub drift_range_px: f64,
    pub rotate_range_deg: f64,
    pub max_start_delay_ms: f64,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            duration_ms: 7000.0,
            base_interval_ms: 90.0,
            interval_jitter_ms: 140.0,
            fall_base_ms: 4200.0,
            fall_jitter_ms: 2400.0,
            cleanup_grace_ms: 4200.0,
            drift_range_px: 280.0,
            rotate_range_deg: 18.0,
            max_start_delay_ms: 120.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bill {
    pub id: u64,
    /// Horizontal position as a percentage of the layer width.
    pub left_percent: f64,
    pub fall_duration_ms: f64,
    pub drift_px: f64,
    pub rotate_deg: f64,
    pub start_delay_ms: f64,
    pub serial: String,
    pub value: &'static str,
    pub spawned_at: f64,
}

impl Bill {
    fn finishes_at(&self) -> f64 {
        self.spawned_at + self.start_delay_ms + self.fall_duration_ms
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RainTimer {
    Spawn,
    Cleanup,
}

/// Timed stream of falling bills. Only one run is live at a time: triggering
/// again while active restarts the run.
pub struct MoneyRain {
    config: RainConfig,
    rng: StdRng,
    active: bool,
    started_at: f64,
    bills: Vec<Bill>,
    timers: TimerSet<RainTimer>,
    next_bill_id: u64,
    runs: u32,
}

impl MoneyRain {
    pub fn new(config: RainConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            active: false,
            started_at: 0.0,
            bills: Vec::new(),
            timers: TimerSet::new(),
            next_bill_id: 0,
            runs: 0,
        }
    }

    /// Whether the layer carries its active flag.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bills(&self) -> &[Bill] {
        &self.bills
    }

    /// How many runs have been started since creation.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn trigger(&mut self, now: f64) {
        if self.active {
            tracing::debug!("Money rain retriggered, clearing the previous run");
            self.timers.clear();
            self.bills.clear();
        }
        self.active = true;
        self.started_at = now;
        self.runs += 1;
        self.spawn_bill(now);
        self.timers.schedule(
            now,
            self.config.duration_ms + self.config.cleanup_grace_ms,
            RainTimer::Cleanup,
        );
    }

    fn spawn_bill(&mut self, now: f64) {
        if now - self.started_at > self.config.duration_ms {
            return;
        }
        let rng = &mut self.rng;
        let serial = format!(
            "A{}{}",
            rng.gen_range(100_000..1_000_000),
            char::from(b'A' + rng.gen_range(0..26u8))
        );
        let bill = Bill {
            id: self.next_bill_id,
            left_percent: rng.gen::<f64>() * 100.0,
            fall_duration_ms: self.config.fall_base_ms + rng.gen::<f64>() * self.config.fall_jitter_ms,
            drift_px: (rng.gen::<f64>() - 0.5) * self.config.drift_range_px,
            rotate_deg: (rng.gen::<f64>() - 0.5) * self.config.rotate_range_deg,
            start_delay_ms: rng.gen::<f64>() * self.config.max_start_delay_ms,
            serial,
            value: "$100",
            spawned_at: now,
        };
        let interval = self.config.base_interval_ms + rng.gen::<f64>() * self.config.interval_jitter_ms;
        self.next_bill_id += 1;
        self.bills.push(bill);
        self.timers.schedule(now, interval, RainTimer::Spawn);
    }

    /// A bill's fall animation completed.
    pub fn bill_finished(&mut self, id: u64) {
        self.bills.retain(|bill| bill.id != id);
    }

    pub fn advance(&mut self, now: f64) {
        for (_, timer) in self.timers.take_due(now) {
            match timer {
                RainTimer::Spawn => self.spawn_bill(now),
                RainTimer::Cleanup => {
                    self.bills.clear();
                    self.timers.clear();
                    self.active = false;
                    tracing::debug!("Money rain finished");
                }
            }
        }
        self.bills.retain(|bill| bill.finishes_at() > now);
    }

    pub fn stop(&mut self) {
        self.timers.clear();
        self.bills.clear();
        self.active = false;
    }
}
