//! Chat log line envelope.
//!
//! Every line of the client chat log shares one grammar:
//!
//! ```text
//! 2021-09-21 09:42:35 [System] [] You inflicted 519.1 points of damage
//! <timestamp>          <channel> <speaker> <message>
//! ```
//!
//! Parsing is lenient: a line that does not fit the grammar yields an empty
//! envelope instead of an error.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::ParseError;

/// Calendar format of envelope timestamps (second resolution, local clock).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static LOG_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\d\-]+ [\d:]+) \[(\w+)\] \[(.*)\] (.*)").unwrap());

/// Chat channel a line was posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Messages about the player's own actions (combat, loot, skills).
    System,
    /// Server-wide broadcast of notable loot.
    Globals,
    /// Any other channel; never classified.
    Other,
}

impl Channel {
    fn from_name(name: &str) -> Self {
        match name {
            "System" => Self::System,
            "Globals" => Self::Globals,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::System => "System",
            Self::Globals => "Globals",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// One log line split into its envelope fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEnvelope {
    pub timestamp: String,
    pub channel: String,
    pub speaker: String,
    pub message: String,
}

impl LogEnvelope {
    /// Splits a raw line into envelope fields.
    ///
    /// Trailing line terminators are ignored. Lines outside the grammar return
    /// an envelope whose fields are all empty.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(caps) = LOG_LINE_RE.captures(line) else {
            return Self::default();
        };
        Self {
            timestamp: caps[1].to_string(),
            channel: caps[2].to_string(),
            speaker: caps[3].to_string(),
            message: caps[4].to_string(),
        }
    }

    /// Returns true when the line did not match the envelope grammar.
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
            && self.channel.is_empty()
            && self.speaker.is_empty()
            && self.message.is_empty()
    }

    pub fn channel(&self) -> Channel {
        Channel::from_name(&self.channel)
    }

    /// Parses the envelope timestamp.
    pub fn time(&self) -> Result<NaiveDateTime, ParseError> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .map_err(|_| ParseError::Timestamp(self.timestamp.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(timestamp: &str, channel: &str, speaker: &str, message: &str) -> LogEnvelope {
        LogEnvelope {
            timestamp: timestamp.to_string(),
            channel: channel.to_string(),
            speaker: speaker.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn parses_system_message() {
        let line = "2021-09-21 09:42:35 [System] [] Critical hit - Additional damage! You inflicted 519.1 points of damage";
        assert_eq!(
            LogEnvelope::parse(line),
            envelope(
                "2021-09-21 09:42:35",
                "System",
                "",
                "Critical hit - Additional damage! You inflicted 519.1 points of damage",
            )
        );
    }

    #[test]
    fn parses_global_message() {
        let line = "2021-09-21 09:46:31 [Globals] [] Nanashana Nana Itsanai killed a creature (Desert Crawler Provider) with a value of 416 PED!";
        let parsed = LogEnvelope::parse(line);
        assert_eq!(parsed.channel(), Channel::Globals);
        assert_eq!(
            parsed.message,
            "Nanashana Nana Itsanai killed a creature (Desert Crawler Provider) with a value of 416 PED!"
        );
    }

    #[test]
    fn parses_global_with_comma_in_creature() {
        let line = "2021-09-21 09:46:31 [Globals] [] Nanashana Nana Itsanai killed a creature (Disecter, Brood of Bram) with a value of 91 PED!";
        assert_eq!(
            LogEnvelope::parse(line).message,
            "Nanashana Nana Itsanai killed a creature (Disecter, Brood of Bram) with a value of 91 PED!"
        );
    }

    #[test]
    fn parses_global_with_apostrophe_name() {
        let line = "2021-09-21 09:46:31 [Globals] [] Na'na'sha'na Na'na It'san'ai killed a creature (Desert Crawler Provider) with a value of 416 PED!";
        assert_eq!(
            LogEnvelope::parse(line),
            envelope(
                "2021-09-21 09:46:31",
                "Globals",
                "",
                "Na'na'sha'na Na'na It'san'ai killed a creature (Desert Crawler Provider) with a value of 416 PED!",
            )
        );
    }

    #[test]
    fn keeps_speaker_and_strips_crlf() {
        let line = "2021-09-21 10:00:00 [Rookie] [Some Player] hello there\r\n";
        let parsed = LogEnvelope::parse(line);
        assert_eq!(parsed.channel(), Channel::Other);
        assert_eq!(parsed.speaker, "Some Player");
        assert_eq!(parsed.message, "hello there");
    }

    #[test]
    fn malformed_line_yields_empty_envelope() {
        for line in ["", "garbage", "[System] [] You missed", "2021-09-21 [System] You missed"] {
            let parsed = LogEnvelope::parse(line);
            assert!(parsed.is_empty(), "expected empty envelope for {line:?}");
            assert_eq!(parsed.channel(), Channel::Other);
        }
    }

    #[test]
    fn parses_timestamp() {
        let parsed = LogEnvelope::parse("2021-09-21 09:42:35 [System] [] You missed");
        let time = parsed.time().unwrap();
        assert_eq!(time.to_string(), "2021-09-21 09:42:35");
    }

    #[test]
    fn rejects_invalid_timestamp() {
        let parsed = LogEnvelope::parse("2021-99-21 09:42:35 [System] [] You missed");
        assert!(!parsed.is_empty());
        assert!(matches!(parsed.time(), Err(ParseError::Timestamp(_))));
    }
}
