//! Scroll reveal: marked elements fade in the first time they reach the
//! viewport and never hide again.

use crate::effects::capabilities::Capabilities;
use serde::Serialize;
use std::collections::BTreeSet;

/// Fraction of the viewport height an element's top must reach to count as seen.
const REVEAL_BAND: f64 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealStrategy {
    /// Reduced motion: everything is shown at once.
    Immediate,
    /// Intersection observer, backed by one manual pass.
    Observer,
    /// Scroll/resize polling only.
    Polling,
}

impl RevealStrategy {
    pub fn select(capabilities: &Capabilities) -> Self {
        if capabilities.reduced_motion {
            RevealStrategy::Immediate
        } else if capabilities.intersection_observer {
            RevealStrategy::Observer
        } else {
            RevealStrategy::Polling
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub bottom: f64,
}

/// Layout queries the tracker needs from its host.
pub trait RevealLayout {
    fn viewport_height(&self) -> f64;
    fn bounding_rect(&self, element: usize) -> Option<Rect>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct RevealElement {
    pub visible: bool,
    pub delay_ms: Option<f64>,
}

impl RevealElement {
    /// Parses the element's marker and delay attributes. A missing marker
    /// means hidden; an unparsable delay is dropped.
    pub fn from_attributes(marker: Option<&str>, delay: Option<&str>) -> Self {
        let delay_ms = match delay.map(str::trim) {
            None | Some("") => Some(0.0),
            Some(d) => d.parse::<f64>().ok().filter(|d| d.is_finite()),
        };
        Self {
            visible: marker == Some("visible"),
            delay_ms,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowListener {
    Scroll,
    Resize,
}

pub struct RevealTracker {
    strategy: RevealStrategy,
    elements: Vec<RevealElement>,
    hidden: BTreeSet<usize>,
    observed: BTreeSet<usize>,
    listeners: Vec<WindowListener>,
}

impl RevealTracker {
    pub fn init(elements: Vec<RevealElement>, capabilities: &Capabilities, layout: &impl RevealLayout) -> Self {
        let strategy = RevealStrategy::select(capabilities);
        let hidden: BTreeSet<usize> = elements
            .iter()
            .enumerate()
            .filter(|(_, element)| !element.visible)
            .map(|(id, _)| id)
            .collect();

        let mut tracker = Self {
            strategy,
            elements,
            hidden,
            observed: BTreeSet::new(),
            listeners: Vec::new(),
        };

        if tracker.elements.is_empty() {
            return tracker;
        }

        if strategy == RevealStrategy::Immediate {
            let ids: Vec<usize> = tracker.hidden.iter().copied().collect();
            for id in ids {
                tracker.reveal(id);
            }
            return tracker;
        }

        if strategy == RevealStrategy::Observer {
            tracker.observed = tracker.hidden.clone();
        }

        tracker.manual_check(layout);
        if !tracker.hidden.is_empty() {
            tracker.listeners = vec![WindowListener::Scroll, WindowListener::Resize];
        }
        tracing::debug!(
            ?strategy,
            hidden = tracker.hidden.len(),
            "Scroll reveal initialised"
        );
        tracker
    }

    pub fn strategy(&self) -> RevealStrategy {
        self.strategy
    }

    pub fn is_visible(&self, id: usize) -> bool {
        self.elements.get(id).map(|e| e.visible).unwrap_or(false)
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    pub fn listeners(&self) -> &[WindowListener] {
        &self.listeners
    }

    pub fn is_observed(&self, id: usize) -> bool {
        self.observed.contains(&id)
    }

    /// The `--reveal-delay` custom property for an element.
    pub fn delay_property(&self, id: usize) -> Option<String> {
        self.elements
            .get(id)
            .and_then(|e| e.delay_ms)
            .map(|delay| format!("{}ms", delay))
    }

    fn reveal(&mut self, id: usize) -> bool {
        if !self.hidden.remove(&id) {
            return false;
        }
        if let Some(element) = self.elements.get_mut(id) {
            element.visible = true;
        }
        true
    }

    /// Observer callback. Revealed elements are unobserved.
    pub fn on_intersection(&mut self, id: usize, is_intersecting: bool) -> bool {
        if !is_intersecting || !self.observed.contains(&id) {
            return false;
        }
        self.observed.remove(&id);
        let revealed = self.reveal(id);
        self.drop_listeners_when_done();
        revealed
    }

    /// Reveals every hidden element intersecting the top 90% of the viewport.
    pub fn manual_check(&mut self, layout: &impl RevealLayout) -> Vec<usize> {
        if self.hidden.is_empty() {
            return Vec::new();
        }
        let band = layout.viewport_height().max(0.0) * REVEAL_BAND;
        let in_view: Vec<usize> = self
            .hidden
            .iter()
            .copied()
            .filter(|id| {
                layout
                    .bounding_rect(*id)
                    .map(|rect| rect.top <= band && rect.bottom >= 0.0)
                    .unwrap_or(false)
            })
            .collect();

        for id in &in_view {
            self.reveal(*id);
            self.observed.remove(id);
        }
        self.drop_listeners_when_done();
        in_view
    }

    /// Scroll or resize event. Ignored once the listeners are gone.
    pub fn on_window_event(&mut self, listener: WindowListener, layout: &impl RevealLayout) -> Vec<usize> {
        if !self.listeners.contains(&listener) {
            return Vec::new();
        }
        self.manual_check(layout)
    }

    /// Page teardown: drops the window listeners and stops observing.
    pub fn detach(&mut self) {
        self.listeners.clear();
        self.observed.clear();
    }

    fn drop_listeners_when_done(&mut self) {
        if self.hidden.is_empty() && !self.listeners.is_empty() {
            self.listeners.clear();
            tracing::debug!("All reveal elements visible, detaching scroll listeners");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Page {
        viewport: f64,
        rects: Vec<Rect>,
    }

    impl RevealLayout for Page {
        fn viewport_height(&self) -> f64 {
            self.viewport
        }

        fn bounding_rect(&self, element: usize) -> Option<Rect> {
            self.rects.get(element).copied()
        }
    }

    fn page(tops: &[f64]) -> Page {
        Page {
            viewport: 1000.0,
            rects: tops.iter().map(|&top| Rect { top, bottom: top + 200.0 }).collect(),
        }
    }

    fn hidden(n: usize) -> Vec<RevealElement> {
        (0..n).map(|_| RevealElement::from_attributes(None, None)).collect()
    }

    #[test]
    fn reduced_motion_reveals_everything_without_listeners() {
        let caps = Capabilities {
            reduced_motion: true,
            ..Capabilities::default()
        };
        let tracker = RevealTracker::init(hidden(4), &caps, &page(&[0.0, 2000.0, 4000.0, 6000.0]));
        assert_eq!(tracker.strategy(), RevealStrategy::Immediate);
        assert_eq!(tracker.hidden_count(), 0);
        assert!(tracker.listeners().is_empty());
        assert!((0..4).all(|id| tracker.is_visible(id)));
    }

    #[test]
    fn manual_band_is_ninety_percent_of_viewport() {
        let caps = Capabilities {
            intersection_observer: false,
            ..Capabilities::default()
        };
        // 900 is on the edge of the band, 901 just outside, -250 already scrolled past.
        let tracker = RevealTracker::init(hidden(3), &caps, &page(&[900.0, 901.0, -250.0]));
        assert_eq!(tracker.strategy(), RevealStrategy::Polling);
        assert!(tracker.is_visible(0));
        assert!(!tracker.is_visible(1));
        assert!(!tracker.is_visible(2));
        assert_eq!(tracker.listeners(), &[WindowListener::Scroll, WindowListener::Resize]);
    }

    #[test]
    fn polling_detaches_listeners_once_everything_is_visible() {
        let caps = Capabilities {
            intersection_observer: false,
            ..Capabilities::default()
        };
        let mut layout = page(&[100.0, 1500.0]);
        let mut tracker = RevealTracker::init(hidden(2), &caps, &layout);
        assert_eq!(tracker.hidden_count(), 1);

        layout.rects[1] = Rect { top: 400.0, bottom: 600.0 };
        let revealed = tracker.on_window_event(WindowListener::Scroll, &layout);
        assert_eq!(revealed, vec![1]);
        assert!(tracker.listeners().is_empty());

        // Scrolling back up never hides anything again.
        layout.rects[1] = Rect { top: 5000.0, bottom: 5200.0 };
        assert!(tracker.on_window_event(WindowListener::Scroll, &layout).is_empty());
        assert!(tracker.is_visible(1));
    }

    #[test]
    fn observer_reveals_once_and_unobserves() {
        let caps = Capabilities::default();
        let mut tracker = RevealTracker::init(hidden(2), &caps, &page(&[3000.0, 5000.0]));
        assert_eq!(tracker.strategy(), RevealStrategy::Observer);
        assert!(tracker.is_observed(0) && tracker.is_observed(1));
        assert!(!tracker.listeners().is_empty());

        assert!(!tracker.on_intersection(0, false));
        assert!(tracker.on_intersection(0, true));
        assert!(!tracker.is_observed(0));
        assert!(!tracker.on_intersection(0, true));

        assert!(tracker.on_intersection(1, true));
        assert!(tracker.listeners().is_empty());
    }

    #[test]
    fn already_visible_elements_are_not_tracked() {
        let elements = vec![
            RevealElement::from_attributes(Some("visible"), None),
            RevealElement::from_attributes(Some("hidden"), Some("120")),
        ];
        let tracker = RevealTracker::init(elements, &Capabilities::default(), &page(&[5000.0, 5000.0]));
        assert_eq!(tracker.hidden_count(), 1);
        assert!(!tracker.is_observed(0));
        assert_eq!(tracker.delay_property(1).as_deref(), Some("120ms"));
    }

    #[test]
    fn bad_delay_is_ignored() {
        let element = RevealElement::from_attributes(None, Some("soon"));
        assert_eq!(element.delay_ms, None);
        assert!(!element.visible);
    }
}
