//! Prefixed chat command parsing

use super::action::Action;

/// Result of parsing a prefixed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Action(Action),
    /// Known command with a missing or malformed argument
    Usage(String),
}

/// Parse `content` as a command; `None` for plain chat and unknown commands
pub fn parse_command(prefix: &str, content: &str) -> Option<Parsed> {
    let body = content.trim().strip_prefix(prefix)?;
    let (name, arg) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };

    let parsed = match name.to_lowercase().as_str() {
        "join" => Parsed::Action(Action::Join),
        "leave" => Parsed::Action(Action::Leave),
        "play" | "p" => {
            if arg.is_empty() {
                usage(prefix, "play <url or search terms>")
            } else {
                Parsed::Action(Action::Play {
                    query: arg.to_string(),
                })
            }
        }
        "skip" | "s" => Parsed::Action(Action::Skip),
        "queue" | "q" => Parsed::Action(Action::ShowQueue),
        "loop" => Parsed::Action(Action::ToggleLoop),
        "volume" | "vol" => match parse_percent(arg) {
            Some(percent) => Parsed::Action(Action::SetVolume { percent }),
            None => usage(prefix, "volume <0-200>"),
        },
        "search" => {
            if arg.is_empty() {
                usage(prefix, "search <terms>")
            } else {
                Parsed::Action(Action::Search {
                    query: arg.to_string(),
                })
            }
        }
        _ => return None,
    };

    Some(parsed)
}

fn usage(prefix: &str, form: &str) -> Parsed {
    Parsed::Usage(format!("Usage: `{}{}`", prefix, form))
}

/// Accepts "150", "150%" and "62.5"; out-of-range values are clamped later
fn parse_percent(arg: &str) -> Option<i64> {
    let arg = arg.trim().trim_end_matches('%');
    if arg.is_empty() {
        return None;
    }
    if let Ok(v) = arg.parse::<i64>() {
        return Some(v);
    }
    arg.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.round() as i64)
}
