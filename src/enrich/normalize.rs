use serde_json::Value;
use thiserror::Error;

use crate::types::{AudioFeatures, RawAnalysis};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("analysis is missing the '{0}' field")]
    MissingField(&'static str),

    #[error("duration '{0}' is not in M:SS form")]
    MalformedDuration(String),

    #[error("loudness '{0}' is not in '<integer> dB' form")]
    MalformedLoudness(String),
}

const LOUDNESS_SUFFIX: &str = " dB";

/// Maps a raw analysis payload onto [`AudioFeatures`].
///
/// Every field must be present. `duration` and `loudness` are parsed, the
/// rest is copied as-is.
pub fn normalize(raw: &RawAnalysis) -> Result<AudioFeatures, NormalizationError> {
    let field = |name: &'static str| {
        raw.get(name)
            .cloned()
            .ok_or(NormalizationError::MissingField(name))
    };

    let key = field("key")?;
    let mode = field("mode")?;
    let camelot = field("camelot")?;
    let tempo = field("tempo")?;

    let duration = field("duration")?;
    let duration_seconds = match &duration {
        Value::String(text) => parse_duration(text)?,
        other => return Err(NormalizationError::MalformedDuration(other.to_string())),
    };

    Ok(AudioFeatures {
        key,
        mode,
        camelot,
        tempo,
        duration_seconds,
        popularity: field("popularity")?,
        energy: field("energy")?,
        danceability: field("danceability")?,
        happiness: field("happiness")?,
        acousticness: field("acousticness")?,
        instrumentalness: field("instrumentalness")?,
        liveness: field("liveness")?,
        speechiness: field("speechiness")?,
        loudness_db: match field("loudness")? {
            Value::String(text) => parse_loudness(&text)?,
            other => return Err(NormalizationError::MalformedLoudness(other.to_string())),
        },
    })
}

/// `"3:45"` -> `225`
pub fn parse_duration(text: &str) -> Result<u64, NormalizationError> {
    let malformed = || NormalizationError::MalformedDuration(text.to_string());

    let mut parts = text.split(':');
    let (Some(minutes), Some(seconds), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };

    // Parts are unsigned, so a sign on either one is malformed.
    let minutes: u64 = minutes.parse().map_err(|_| malformed())?;
    let seconds: u64 = seconds.parse().map_err(|_| malformed())?;
    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(malformed)
}

/// `"-7 dB"` -> `-7`
pub fn parse_loudness(text: &str) -> Result<i64, NormalizationError> {
    text.strip_suffix(LOUDNESS_SUFFIX)
        .and_then(|number| number.parse().ok())
        .ok_or_else(|| NormalizationError::MalformedLoudness(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_accepts_one_and_two_digit_minutes() {
        assert_eq!(parse_duration("3:45"), Ok(225));
        assert_eq!(parse_duration("12:05"), Ok(725));
        assert_eq!(parse_duration("0:00"), Ok(0));
    }

    #[test]
    fn duration_rejects_other_shapes() {
        for text in [
            "345",
            "1:02:03",
            ":45",
            "3:",
            "a:45",
            "3:4x",
            "-1:30",
            "1:-30",
            "",
            "307445734561825861:00",
            "307445734561825860:18446744073709551615",
        ] {
            assert_eq!(
                parse_duration(text),
                Err(NormalizationError::MalformedDuration(text.to_string())),
                "{text}"
            );
        }
    }

    #[test]
    fn loudness_strips_suffix() {
        assert_eq!(parse_loudness("-7 dB"), Ok(-7));
        assert_eq!(parse_loudness("0 dB"), Ok(0));
        assert_eq!(parse_loudness("3 dB"), Ok(3));
    }

    #[test]
    fn loudness_rejects_missing_suffix_or_bad_number() {
        for text in ["-7", "-7dB", "-7 db", "-7.5 dB", "loud dB", " dB"] {
            assert!(parse_loudness(text).is_err(), "{text}");
        }
    }
}
