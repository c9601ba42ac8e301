use crate::utils::parse::parse_int_prefix;
use serde_json::Value;

pub const DEFAULT_COUNT: usize = 5;
pub const MAX_COUNT: usize = 10;
pub const MAX_PROMPT_CHARS: usize = 400;

/// Served when no model key is configured or the model call fails.
pub const FALLBACK_IDEAS: [&str; MAX_COUNT] = [
    "AI-Optimized Launch: 48\u{2011}Hour Conversion Sprint",
    "Smart Budget: Double Leads, Same Spend",
    "Blue Steel Creative: Scroll\u{2011}Stopping Visuals",
    "Hyperlocal Targeting: Own Your Postal Codes",
    "Test \u{2192} Learn \u{2192} Scale: Weekly Iterations",
    "Retarget the Browsers: Turn Visits Into Bookings",
    "Founder Offer: Five Spots, One Bold Guarantee",
    "Review Flywheel: Every Happy Client Becomes an Ad",
    "Landing Page Glow\u{2011}Up: Cut Bounce in Half",
    "Lead Magnet Drop: Free Audit, Instant Pipeline",
];

/// Shown by the idea client when our endpoint can't be reached.
pub const CLIENT_FALLBACK_IDEAS: [&str; 5] = [
    "Quick Launch Offer: 2 weeks for $20",
    "Buddy Pass Friday: bring a friend free",
    "Morning Rush Class Pack",
    "Local Heroes Discount",
    "AI-Tuned Workout Plan with free trial",
];

pub fn fallback_ideas(n: usize) -> Vec<String> {
    FALLBACK_IDEAS.iter().take(n).map(|s| s.to_string()).collect()
}

/// Reads the requested count from a number or numeric string. Zero, missing
/// or unreadable values mean 5; the result is clamped to `1..=10`.
pub fn parse_count(value: Option<&Value>) -> usize {
    let requested = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => parse_int_prefix(s),
        _ => None,
    };
    match requested {
        None | Some(0) => DEFAULT_COUNT,
        Some(n) => n.clamp(1, MAX_COUNT as i64) as usize,
    }
}

/// Turns the `prompt` field into text and cuts it to 400 characters.
pub fn sanitize_prompt(value: Option<&Value>) -> String {
    let text = match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    text.chars().take(MAX_PROMPT_CHARS).collect()
}

/// Strips a leading run of list markers: dashes, bullets, digits, dots, spaces.
fn strip_list_marker(line: &str) -> &str {
    line.trim_start_matches(|c: char| matches!(c, '-' | '*' | '.') || c.is_ascii_digit() || c.is_whitespace())
}

/// Reads ideas out of a model reply: a JSON array of strings if the reply is
/// one, otherwise one idea per non-empty line. Capped at `n`.
pub fn parse_model_reply(text: &str, n: usize) -> Vec<String> {
    let ideas: Vec<String> = match serde_json::from_str::<Vec<Value>>(text.trim()) {
        Ok(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Err(_) => text
            .lines()
            .map(|line| strip_list_marker(line).trim().to_string())
            .collect(),
    };
    ideas.into_iter().filter(|idea| !idea.is_empty()).take(n).collect()
}
