use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dose sequence number as reported by the feed (`status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dose {
    First,
    Second,
}

impl Dose {
    pub const ALL: [Dose; 2] = [Dose::First, Dose::Second];

    /// Position of this dose in per-dose `[first, second]` arrays.
    pub fn index(self) -> usize {
        match self {
            Dose::First => 0,
            Dose::Second => 1,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Dose::First => "1st dose",
            Dose::Second => "2nd dose",
        }
    }
}

impl TryFrom<i64> for Dose {
    type Error = i64;

    fn try_from(status: i64) -> Result<Self, Self::Error> {
        match status {
            1 => Ok(Dose::First),
            2 => Ok(Dose::Second),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaccinationRecord {
    pub date: NaiveDate,
    pub entity_id: String,
    pub dose: Dose,
    pub count: u64,
}

impl VaccinationRecord {
    pub fn new(date: NaiveDate, entity_id: impl Into<String>, dose: Dose, count: u64) -> Self {
        Self {
            date,
            entity_id: entity_id.into(),
            dose,
            count,
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("feed is not a JSON array of records: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("record {index}: {problem}")]
    Invalid { index: usize, problem: String },
}

/// Wire shape of a feed entry. Every field is optional here so that a missing
/// field is reported against its record instead of failing the whole parse
/// with a position-only serde message.
#[derive(Deserialize)]
struct RawRecord {
    date: Option<serde_json::Value>,
    prefecture: Option<serde_json::Value>,
    status: Option<serde_json::Value>,
    count: Option<serde_json::Value>,
}

/// Decode and validate a time-series feed body.
///
/// Any bad record rejects the whole batch.
pub fn decode_records(body: &[u8]) -> Result<Vec<VaccinationRecord>, RecordError> {
    let raw: Vec<RawRecord> = serde_json::from_slice(body).map_err(RecordError::Malformed)?;
    raw.into_iter()
        .enumerate()
        .map(|(index, record)| {
            validate(record).map_err(|problem| RecordError::Invalid { index, problem })
        })
        .collect()
}

fn validate(raw: RawRecord) -> Result<VaccinationRecord, String> {
    let date = match raw.date {
        Some(serde_json::Value::String(s)) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| format!("invalid date {s:?}: {e}"))?,
        Some(other) => return Err(format!("date must be a string, got {other}")),
        None => return Err("missing field `date`".to_owned()),
    };

    // Prefecture codes are usually strings ("13") but tolerate bare numbers.
    let entity_id = match raw.prefecture {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(other) => return Err(format!("invalid prefecture {other}")),
        None => return Err("missing field `prefecture`".to_owned()),
    };

    let status = integer_field("status", raw.status)?;
    let dose = Dose::try_from(status).map_err(|s| format!("status must be 1 or 2, got {s}"))?;

    let count = integer_field("count", raw.count)?;
    let count = u64::try_from(count).map_err(|_| format!("count must be >= 0, got {count}"))?;

    Ok(VaccinationRecord {
        date,
        entity_id,
        dose,
        count,
    })
}

fn integer_field(name: &str, value: Option<serde_json::Value>) -> Result<i64, String> {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| format!("{name} must be an integer, got {n}")),
        Some(other) => Err(format!("{name} must be numeric, got {other}")),
        None => Err(format!("missing field `{name}`")),
    }
}
