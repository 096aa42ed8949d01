use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A camp session. Session ID in format: "session::epoch_millis"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    pub created_at: String, // RFC 3339 timestamp
}

impl Session {
    /// Generate a session ID based on timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("session::{}", epoch_millis)
    }

    /// Parse a session ID to extract the timestamp
    pub fn parse_id(id: &str) -> Result<u64, SessionIdError> {
        let parts: Vec<&str> = id.split("::").collect();
        if parts.len() != 2 || parts[0] != "session" {
            return Err(SessionIdError::InvalidFormat);
        }

        parts[1].parse::<u64>().map_err(|_| SessionIdError::InvalidTimestamp)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionIdError {
    InvalidFormat,
    InvalidTimestamp,
}

impl fmt::Display for SessionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionIdError::InvalidFormat => write!(f, "Invalid session ID format"),
            SessionIdError::InvalidTimestamp => write!(f, "Invalid timestamp in session ID"),
        }
    }
}

impl std::error::Error for SessionIdError {}

/// Participant gender as written in the roster.
///
/// Anything that is not clearly male or female is kept as `Unspecified`
/// rather than folded into one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unspecified,
}

impl From<String> for Gender {
    fn from(raw: String) -> Self {
        Gender::from_code(&raw)
    }
}

impl From<Gender> for String {
    fn from(gender: Gender) -> Self {
        gender.code().to_string()
    }
}

impl Gender {
    /// Interpret a free-text gender cell
    pub fn from_code(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "m" | "masculin" | "garçon" | "garcon" | "g" => Gender::Male,
            "f" | "féminin" | "feminin" | "fille" => Gender::Female,
            _ => Gender::Unspecified,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Unspecified => "U",
        }
    }
}

/// A youngster attending a camp session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Full address cell, kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl Participant {
    /// Generate a participant ID. Random so bulk imports never collide.
    pub fn generate_id() -> String {
        format!("jeune::{}", uuid::Uuid::new_v4())
    }

    /// "LAST First", or just the last name when no first name is known
    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() {
            self.last_name.clone()
        } else {
            format!("{} {}", self.last_name, self.first_name)
        }
    }

    /// Age in whole years on `today`, from the birth date
    pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> u32 {
        let mut age = today.year() - birth_date.year();
        if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
            age -= 1;
        }
        age.max(0) as u32
    }
}

/// Request for creating a new session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
}

/// Request for switching the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchSessionRequest {
    pub session_id: String,
}

/// Response after creating or switching a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session: Session,
    pub success_message: String,
}

/// Response containing every session and the current pointer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
    pub current_session_id: Option<String>,
}

/// Response for the current session; `None` means onboarding is needed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSessionResponse {
    pub current_session: Option<Session>,
}

/// Response after a batch save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSaveResponse {
    pub saved: usize,
    pub success_message: String,
}

/// A spreadsheet row that could not be turned into a participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// 1-based row number as shown by spreadsheet software
    pub row: usize,
    pub reason: String,
}

/// Response after importing a roster spreadsheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportParticipantsResponse {
    pub imported: Vec<Participant>,
    pub rejected: Vec<RejectedRow>,
    pub success_message: String,
}

/// Response containing participants of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantListResponse {
    pub participants: Vec<Participant>,
}

/// Response after restoring a full-database export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoreResponse {
    /// Number of records written per collection
    pub collections: BTreeMap<String, usize>,
    pub success_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_session_id() {
        let id = Session::generate_id(1702516122000);
        assert_eq!(id, "session::1702516122000");
        assert_eq!(Session::parse_id(&id).unwrap(), 1702516122000);
    }

    #[test]
    fn test_parse_invalid_session_id() {
        assert_eq!(Session::parse_id("child::12"), Err(SessionIdError::InvalidFormat));
        assert_eq!(Session::parse_id("session"), Err(SessionIdError::InvalidFormat));
        assert_eq!(Session::parse_id("session::abc"), Err(SessionIdError::InvalidTimestamp));
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let session = Session {
            id: "session::1".to_string(),
            name: "Été 2024".to_string(),
            created_at: "2024-07-01T08:00:00Z".to_string(),
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["createdAt"], "2024-07-01T08:00:00Z");
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_gender_from_code() {
        assert_eq!(Gender::from_code("M"), Gender::Male);
        assert_eq!(Gender::from_code(" f "), Gender::Female);
        assert_eq!(Gender::from_code("Fille"), Gender::Female);
        assert_eq!(Gender::from_code(""), Gender::Unspecified);
        assert_eq!(Gender::from_code("?"), Gender::Unspecified);
    }

    #[test]
    fn test_gender_unknown_code_deserializes_as_unspecified() {
        let gender: Gender = serde_json::from_str("\"X\"").unwrap();
        assert_eq!(gender, Gender::Unspecified);
        let gender: Gender = serde_json::from_str("\"F\"").unwrap();
        assert_eq!(gender, Gender::Female);
    }

    #[test]
    fn test_participant_age_on() {
        let birth = NaiveDate::from_ymd_opt(2010, 7, 15).unwrap();
        assert_eq!(Participant::age_on(birth, NaiveDate::from_ymd_opt(2024, 7, 14).unwrap()), 13);
        assert_eq!(Participant::age_on(birth, NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()), 14);
    }

    #[test]
    fn test_participant_json_uses_session_id_key() {
        let participant = Participant {
            id: "jeune::1".to_string(),
            session_id: Some("session::1".to_string()),
            last_name: "DUPONT".to_string(),
            first_name: "Jean".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&participant).unwrap();
        assert_eq!(json["sessionId"], "session::1");
        assert_eq!(json["lastName"], "DUPONT");
        assert_eq!(participant.display_name(), "DUPONT Jean");
    }
}
