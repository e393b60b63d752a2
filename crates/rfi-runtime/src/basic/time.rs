use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

fn time_part_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)([a-z]*)").expect("time regex should compile"))
}

/// Parse a time string: `1.5`, `90s`, `1 minute 30 seconds`, `2h 5min`,
/// `100 milliseconds` or `01:02:03`.
///
/// Returns `None` for unparseable input, and for `NONE` or an empty string.
pub fn parse_time(text: &str) -> Option<Duration> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if normalized.is_empty() || normalized == "none" || normalized.starts_with('-') {
        return None;
    }
    let body = normalized.as_str();

    if let Ok(secs) = body.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).ok();
    }

    if body.contains(':') {
        let mut secs = 0.0;
        for part in body.split(':') {
            secs = secs * 60.0 + part.parse::<f64>().ok()?;
        }
        return Duration::try_from_secs_f64(secs).ok();
    }

    let mut secs = 0.0;
    let mut consumed = 0;
    for cap in time_part_regex().captures_iter(body) {
        let whole = cap.get(0)?;
        if whole.start() != consumed {
            return None;
        }
        consumed = whole.end();
        let amount: f64 = cap[1].parse().ok()?;
        let unit = match &cap[2] {
            "d" | "day" | "days" => 86_400.0,
            "h" | "hour" | "hours" => 3_600.0,
            "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
            "" | "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
            "ms" | "millis" | "millisecond" | "milliseconds" => 0.001,
            _ => return None,
        };
        secs += amount * unit;
    }
    if consumed != body.len() {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}
