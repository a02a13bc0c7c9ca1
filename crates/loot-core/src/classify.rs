//! Line classifier: raw chat line to typed [`Event`].

use crate::envelope::{Channel, LogEnvelope};
use crate::error::ParseError;
use crate::event::Event;
use crate::patterns::PatternRegistry;

/// Outcome of classifying one line, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// A rule matched and built an event.
    Event(Event),
    /// A `System` or `Globals` line that no rule recognised, or whose captures
    /// could not be converted.
    Unmatched {
        channel: Channel,
        message: String,
        reason: Option<String>,
    },
    /// Not a chat line, or a channel that is never classified.
    Ignored,
}

/// Classifies a raw line, returning the event it describes if any.
///
/// Malformed lines, other channels and unknown messages all yield `None`.
pub fn classify(line: &str) -> Option<Event> {
    match classify_detailed(line) {
        Classification::Event(event) => Some(event),
        Classification::Unmatched { .. } | Classification::Ignored => None,
    }
}

/// Like [`classify`] but reports why a line produced no event.
pub fn classify_detailed(line: &str) -> Classification {
    let envelope = LogEnvelope::parse(line);
    if envelope.is_empty() {
        return Classification::Ignored;
    }

    let channel = envelope.channel();
    let Some(registry) = PatternRegistry::for_channel(channel) else {
        return Classification::Ignored;
    };

    let built = registry
        .first_match(&envelope.message)
        .map(|kind| -> Result<Event, ParseError> {
            let time = envelope.time()?;
            Ok(Event::new(time, kind?))
        });

    match built {
        Some(Ok(event)) => Classification::Event(event),
        Some(Err(e)) => {
            tracing::debug!(%channel, message = %envelope.message, error = %e, "failed to build event");
            unmatched(channel, envelope.message, Some(e.to_string()))
        }
        None => {
            tracing::debug!(%channel, message = %envelope.message, "no pattern matched");
            unmatched(channel, envelope.message, None)
        }
    }
}

const fn unmatched(channel: Channel, message: String, reason: Option<String>) -> Classification {
    Classification::Unmatched {
        channel,
        message,
        reason,
    }
}
