use serde::{Deserialize, Serialize};

/// What the host environment supports. Probed once at bootstrap and handed to
/// every controller; nothing re-checks these per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// `prefers-reduced-motion: reduce`
    pub reduced_motion: bool,
    /// Constructing an intersection observer succeeded.
    pub intersection_observer: bool,
    /// `pointer: coarse`
    pub coarse_pointer: bool,
    /// Pointer events are available (otherwise mouse + touch fallbacks).
    pub pointer_events: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            intersection_observer: true,
            coarse_pointer: false,
            pointer_events: true,
        }
    }
}

impl Capabilities {
    /// Builds capabilities from a probe. The observer probe may fail (the
    /// constructor throws in some embedded browsers), which counts as absent.
    pub fn probe<E>(
        reduced_motion: bool,
        coarse_pointer: bool,
        pointer_events: bool,
        observer_probe: impl FnOnce() -> Result<(), E>,
    ) -> Self
    where
        E: std::fmt::Display,
    {
        let intersection_observer = match observer_probe() {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Intersection observer unavailable, falling back to polling: {}", e);
                false
            }
        };
        Self {
            reduced_motion,
            intersection_observer,
            coarse_pointer,
            pointer_events,
        }
    }
}

/// Input kind reported with pointer events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Mouse,
    Pen,
    Touch,
}
