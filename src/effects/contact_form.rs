use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_MESSAGE_MAX: usize = 600;
pub const HONEYPOT_FIELD: &str = "bot-field";
pub const SUBMIT_STATUS: &str = "Transmitting...";
pub const MODAL_ID: &str = "contact-modal";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldState {
    pub filled: bool,
    pub focused: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CharCounter {
    pub remaining: usize,
    pub warn: bool,
}

pub struct ContactForm {
    fields: BTreeMap<String, FieldState>,
    honeypot: String,
    message_max: usize,
    message_len: usize,
    status: Option<&'static str>,
}

impl ContactForm {
    /// `message_max` is the textarea's `maxLength`; zero or missing means 600.
    pub fn new<'a>(field_names: impl IntoIterator<Item = &'a str>, message_max: Option<usize>) -> Self {
        Self {
            fields: field_names
                .into_iter()
                .map(|name| (name.to_string(), FieldState::default()))
                .collect(),
            honeypot: String::new(),
            message_max: message_max.filter(|m| *m > 0).unwrap_or(DEFAULT_MESSAGE_MAX),
            message_len: 0,
            status: None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields.get(name)
    }

    pub fn focus(&mut self, name: &str) {
        if let Some(field) = self.fields.get_mut(name) {
            field.focused = true;
        }
    }

    pub fn blur(&mut self, name: &str) {
        if let Some(field) = self.fields.get_mut(name) {
            field.focused = false;
        }
    }

    pub fn input(&mut self, name: &str, value: &str) {
        if name == HONEYPOT_FIELD {
            self.honeypot = value.to_string();
            return;
        }
        if name == "message" {
            // maxLength counts UTF-16 code units.
            self.message_len = value.encode_utf16().count();
        }
        if let Some(field) = self.fields.get_mut(name) {
            field.filled = !value.trim().is_empty();
        }
    }

    pub fn char_counter(&self) -> CharCounter {
        let remaining = self.message_max.saturating_sub(self.message_len);
        let threshold = (self.message_max as f64 * 0.2).round() as usize;
        CharCounter {
            remaining,
            warn: remaining <= threshold,
        }
    }

    /// Bots fill the hidden field; people never see it.
    pub fn is_spam(&self) -> bool {
        !self.honeypot.trim().is_empty()
    }

    /// Marks the form as sending. Spam submissions are dropped silently.
    pub fn submit(&mut self) -> bool {
        if self.is_spam() {
            tracing::debug!("Dropping contact form submission with honeypot filled");
            return false;
        }
        self.status = Some(SUBMIT_STATUS);
        true
    }

    pub fn status(&self) -> Option<&'static str> {
        self.status
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ModalState {
    pub open: bool,
    pub aria_hidden: bool,
    /// The page body stops scrolling while the modal is open.
    pub body_scroll_locked: bool,
}

/// The contact dialog. Triggers open it; the backdrop, the close button and
/// Escape close it.
#[derive(Debug)]
pub struct ContactModal {
    state: ModalState,
}

impl Default for ContactModal {
    fn default() -> Self {
        Self {
            state: ModalState {
                open: false,
                aria_hidden: true,
                body_scroll_locked: false,
            },
        }
    }
}

impl ContactModal {
    /// `None` unless the page has both the dialog and something that opens it.
    pub fn new(trigger_count: usize) -> Option<Self> {
        (trigger_count > 0).then(Self::default)
    }

    pub fn open(&mut self) {
        self.state = ModalState {
            open: true,
            aria_hidden: false,
            body_scroll_locked: true,
        };
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Click inside the modal. `data_close` is the target's `data-close`
    /// attribute; only ours closes it.
    pub fn clicked(&mut self, data_close: Option<&str>) -> bool {
        if data_close != Some(MODAL_ID) {
            return false;
        }
        self.close();
        true
    }

    pub fn key_pressed(&mut self, key: &str) -> bool {
        if key != "Escape" || !self.state.open {
            return false;
        }
        self.close();
        true
    }

    /// A restored page must not come back with the dialog open.
    pub fn before_unload(&mut self) {
        self.state.open = false;
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.open
    }
}
