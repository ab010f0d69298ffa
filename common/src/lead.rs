use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use serde_json::Value;
use validator::{ValidationError, ValidationErrors};

use crate::utils::{
    parse_choice, parse_integer, required, text_input, validate_email_address,
    validate_optional_text, validate_required_text, TEXT_MAX_LENGTH,
};
use crate::LeadInput;

pub const DEFAULT_CONTACT_PERSON: &str = "unknown";

/// Returned when a stored or submitted value is not one of an enumeration's members.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidChoice(pub String);

/// Where a lead is in the sales pipeline. Any status may move to any other.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    #[serde(alias = "in-progress")]
    InProgress,
    Lost,
    Won,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::InProgress,
        LeadStatus::Lost,
        LeadStatus::Won,
    ];

    /// The value stored in the database and used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::InProgress => "inprogress",
            LeadStatus::Lost => "lost",
            LeadStatus::Won => "won",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::InProgress => "In Progress",
            LeadStatus::Lost => "Lost",
            LeadStatus::Won => "Won",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "inprogress" | "in-progress" => Ok(LeadStatus::InProgress),
            "lost" => Ok(LeadStatus::Lost),
            "won" => Ok(LeadStatus::Won),
            other => Err(InvalidChoice(other.to_string())),
        }
    }
}

impl TryFrom<String> for LeadStatus {
    type Error = InvalidChoice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl LeadPriority {
    pub const ALL: [LeadPriority; 3] = [LeadPriority::Low, LeadPriority::Medium, LeadPriority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadPriority::Low => "low",
            LeadPriority::Medium => "medium",
            LeadPriority::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LeadPriority::Low => "Low",
            LeadPriority::Medium => "Medium",
            LeadPriority::High => "High",
        }
    }
}

impl FromStr for LeadPriority {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(LeadPriority::Low),
            "medium" => Ok(LeadPriority::Medium),
            "high" => Ok(LeadPriority::High),
            other => Err(InvalidChoice(other.to_string())),
        }
    }
}

impl TryFrom<String> for LeadPriority {
    type Error = InvalidChoice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for LeadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The client-writable columns of a lead, fully validated.
#[derive(Clone, Debug, PartialEq)]
pub struct LeadFields {
    pub company: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub website: Option<String>,
    pub confidence: Option<i32>,
    pub estimated_value: Option<i32>,
    pub status: LeadStatus,
    pub priority: LeadPriority,
}

impl Default for LeadFields {
    fn default() -> Self {
        Self {
            company: String::new(),
            contact_person: DEFAULT_CONTACT_PERSON.to_string(),
            email: String::new(),
            phone: String::new(),
            website: None,
            confidence: None,
            estimated_value: None,
            status: LeadStatus::default(),
            priority: LeadPriority::default(),
        }
    }
}

/// A validated set of changes. `None` leaves the column as it is; for the
/// nullable columns `Some(None)` clears it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeadChanges {
    pub company: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<Option<String>>,
    pub confidence: Option<Option<i32>>,
    pub estimated_value: Option<Option<i32>>,
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
}

impl LeadChanges {
    pub fn apply(self, fields: &mut LeadFields) {
        if let Some(company) = self.company {
            fields.company = company;
        }
        if let Some(contact_person) = self.contact_person {
            fields.contact_person = contact_person;
        }
        if let Some(email) = self.email {
            fields.email = email;
        }
        if let Some(phone) = self.phone {
            fields.phone = phone;
        }
        if let Some(website) = self.website {
            fields.website = website;
        }
        if let Some(confidence) = self.confidence {
            fields.confidence = confidence;
        }
        if let Some(estimated_value) = self.estimated_value {
            fields.estimated_value = estimated_value;
        }
        if let Some(status) = self.status {
            fields.status = status;
        }
        if let Some(priority) = self.priority {
            fields.priority = priority;
        }
    }
}

// Validates one non-nullable text column. Missing values are only an error
// when `required_here` is set.
fn text_change(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&Value>,
    required_here: bool,
    validate: impl Fn(&str) -> Result<(), ValidationError>,
) -> Option<String> {
    let Some(raw) = raw else {
        if required_here {
            errors.add(field, required());
        }
        return None;
    };
    match text_input(raw).and_then(|text| validate(&text).map(|()| text)) {
        Ok(text) => Some(text),
        Err(e) => {
            errors.add(field, e);
            None
        }
    }
}

// Validates one nullable column, where `null` clears the stored value.
fn nullable_change<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&Value>,
    parse: impl Fn(&Value) -> Result<T, ValidationError>,
) -> Option<Option<T>> {
    match raw? {
        Value::Null => Some(None),
        value => match parse(value) {
            Ok(parsed) => Some(Some(parsed)),
            Err(e) => {
                errors.add(field, e);
                None
            }
        },
    }
}

fn choice_change<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&Value>,
) -> Option<T>
where
    T: FromStr,
    T::Err: ToString,
{
    match parse_choice(raw?) {
        Ok(choice) => Some(choice),
        Err(e) => {
            errors.add(field, e);
            None
        }
    }
}

impl LeadInput {
    /// Validates every submitted field and collects all failures.
    ///
    /// With `partial == false` the columns without a default (`company`,
    /// `email`, `phone`) must be present, as for a create or a full update.
    /// Text is trimmed before it is checked and stored.
    pub fn to_changes(&self, partial: bool) -> Result<LeadChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let required_text = |text: &str| validate_required_text(text, TEXT_MAX_LENGTH);
        let optional_text = |raw: &Value| -> Result<String, ValidationError> {
            let text = text_input(raw)?;
            validate_optional_text(&text, TEXT_MAX_LENGTH)?;
            Ok(text)
        };

        let changes = LeadChanges {
            company: text_change(
                &mut errors,
                "company",
                self.company.as_ref(),
                !partial,
                required_text,
            ),
            contact_person: text_change(
                &mut errors,
                "contact_person",
                self.contact_person.as_ref(),
                false,
                required_text,
            ),
            email: text_change(
                &mut errors,
                "email",
                self.email.as_ref(),
                !partial,
                validate_email_address,
            ),
            phone: text_change(&mut errors, "phone", self.phone.as_ref(), !partial, required_text),
            website: nullable_change(&mut errors, "website", self.website.as_ref(), optional_text),
            confidence: nullable_change(
                &mut errors,
                "confidence",
                self.confidence.as_ref(),
                parse_integer,
            ),
            estimated_value: nullable_change(
                &mut errors,
                "estimated_value",
                self.estimated_value.as_ref(),
                parse_integer,
            ),
            status: choice_change(&mut errors, "status", self.status.as_ref()),
            priority: choice_change(&mut errors, "priority", self.priority.as_ref()),
        };

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(errors)
        }
    }

    /// Validates the input for a create, filling in the column defaults.
    pub fn to_new_lead(&self) -> Result<LeadFields, ValidationErrors> {
        let changes = self.to_changes(false)?;
        let mut fields = LeadFields::default();
        changes.apply(&mut fields);
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn acme() -> LeadInput {
        LeadInput {
            company: Some(json!("Acme")),
            email: Some(json!("a@x.com")),
            phone: Some(json!("555-0100")),
            ..Default::default()
        }
    }

    fn codes(errors: &ValidationErrors, field: &str) -> Vec<String> {
        errors
            .field_errors()
            .into_iter()
            .filter(|(name, _)| name.to_string() == field)
            .flat_map(|(_, errs)| errs.iter().map(|e| e.code.to_string()))
            .collect()
    }

    #[test]
    fn status_wire_values_round_trip_through_from_str() {
        for status in LeadStatus::ALL {
            assert_eq!(status.as_str().parse::<LeadStatus>(), Ok(status));
        }
        for priority in LeadPriority::ALL {
            assert_eq!(priority.as_str().parse::<LeadPriority>(), Ok(priority));
        }
    }

    #[test]
    fn in_progress_accepts_both_spellings() {
        assert_eq!("in-progress".parse::<LeadStatus>(), Ok(LeadStatus::InProgress));
        assert_eq!("inprogress".parse::<LeadStatus>(), Ok(LeadStatus::InProgress));
        let parsed: LeadStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(parsed, LeadStatus::InProgress);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"inprogress\"");
    }

    #[test]
    fn labels_cover_every_member() {
        let labels: Vec<_> = LeadStatus::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, ["New", "Contacted", "In Progress", "Lost", "Won"]);
        let labels: Vec<_> = LeadPriority::ALL.iter().map(|p| p.label()).collect();
        assert_eq!(labels, ["Low", "Medium", "High"]);
    }

    #[test]
    fn unknown_choice_is_rejected() {
        assert_eq!(
            "archived".parse::<LeadStatus>(),
            Err(InvalidChoice("archived".to_string()))
        );
        assert!("urgent".parse::<LeadPriority>().is_err());
    }

    #[test]
    fn new_lead_gets_defaults() {
        let fields = acme().to_new_lead().unwrap();
        assert_eq!(fields.company, "Acme");
        assert_eq!(fields.contact_person, DEFAULT_CONTACT_PERSON);
        assert_eq!(fields.status, LeadStatus::New);
        assert_eq!(fields.priority, LeadPriority::Medium);
        assert_eq!(fields.website, None);
        assert_eq!(fields.confidence, None);
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let errors = LeadInput::default().to_new_lead().unwrap_err();
        assert_eq!(codes(&errors, "company"), ["required"]);
        assert_eq!(codes(&errors, "email"), ["required"]);
        assert_eq!(codes(&errors, "phone"), ["required"]);
        assert!(codes(&errors, "status").is_empty());
    }

    #[test]
    fn partial_changes_do_not_require_anything() {
        let input = LeadInput {
            status: Some(json!("won")),
            ..Default::default()
        };
        let changes = input.to_changes(true).unwrap();
        assert_eq!(changes.status, Some(LeadStatus::Won));
        assert_eq!(changes.company, None);
    }

    #[test]
    fn every_bad_field_is_collected() {
        let input = LeadInput {
            company: Some(json!("  ")),
            email: Some(json!("not-an-email")),
            status: Some(json!("archived")),
            priority: Some(json!("urgent")),
            confidence: Some(json!("lots")),
            estimated_value: Some(json!(5_000_000_000_i64)),
            ..acme()
        };
        let errors = input.to_changes(false).unwrap_err();
        assert_eq!(codes(&errors, "company"), ["blank"]);
        assert_eq!(codes(&errors, "email"), ["invalid"]);
        assert_eq!(codes(&errors, "status"), ["invalid_choice"]);
        assert_eq!(codes(&errors, "priority"), ["invalid_choice"]);
        assert_eq!(codes(&errors, "confidence"), ["invalid"]);
        assert_eq!(codes(&errors, "estimated_value"), ["max_value"]);
    }

    #[test]
    fn nullable_columns_can_be_cleared() {
        let mut fields = acme().to_new_lead().unwrap();
        fields.website = Some("acme.test".to_string());
        fields.confidence = Some(40);

        let input = LeadInput {
            website: Some(Value::Null),
            confidence: Some(Value::Null),
            estimated_value: Some(json!("1200")),
            ..Default::default()
        };
        input.to_changes(true).unwrap().apply(&mut fields);

        assert_eq!(fields.website, None);
        assert_eq!(fields.confidence, None);
        assert_eq!(fields.estimated_value, Some(1200));
        assert_eq!(fields.company, "Acme");
    }

    #[test]
    fn wrong_json_types_are_reported_per_field() {
        let input: LeadInput = serde_json::from_value(json!({
            "company": "Acme",
            "email": "a@x.com",
            "phone": "555-0100",
            "status": 5,
            "confidence": true,
            "website": ["acme.test"],
        }))
        .unwrap();
        let errors = input.to_changes(false).unwrap_err();
        assert_eq!(codes(&errors, "status"), ["invalid_choice"]);
        assert_eq!(codes(&errors, "confidence"), ["invalid"]);
        assert_eq!(codes(&errors, "website"), ["invalid"]);
        assert!(codes(&errors, "company").is_empty());
    }

    #[test]
    fn null_is_rejected_for_columns_that_cannot_be_empty() {
        let input: LeadInput =
            serde_json::from_value(json!({ "company": null, "status": null })).unwrap();
        assert_eq!(input.company, Some(Value::Null));

        let errors = input.to_changes(true).unwrap_err();
        assert_eq!(codes(&errors, "company"), ["null"]);
        assert_eq!(codes(&errors, "status"), ["null"]);
    }

    #[test]
    fn text_is_trimmed_before_validation() {
        let input = LeadInput {
            company: Some(json!("  Acme Corp ")),
            email: Some(json!(" a@x.com ")),
            ..acme()
        };
        let fields = input.to_new_lead().unwrap();
        assert_eq!(fields.company, "Acme Corp");
        assert_eq!(fields.email, "a@x.com");
    }
}
