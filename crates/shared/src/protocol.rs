use serde::{Deserialize, Serialize};

pub const REGISTER_ROUTE: &str = "/api/register";
pub const REGISTRATION_SUCCESSFUL: &str = "Registration successful";

/// Body posted by the form. Every field is optional on the wire so the
/// handler can answer a missing field with its own 400 instead of a decode
/// rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

impl RegistrationResponse {
    pub fn created(email: &EmailStatus) -> Self {
        let (email_sent, email_error) = email.to_wire();
        Self {
            message: REGISTRATION_SUCCESSFUL.to_string(),
            email_sent,
            email_error,
        }
    }

    pub fn email_status(&self) -> EmailStatus {
        EmailStatus::from_wire(self.email_sent, self.email_error.clone())
    }
}

/// Outcome of the confirmation email for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EmailStatus {
    Sent,
    Failed {
        error: Option<String>,
    },
    #[default]
    Unknown,
}

impl EmailStatus {
    /// Reads the `emailSent`/`emailError` pair. An absent flag is `Unknown`.
    pub fn from_wire(email_sent: Option<bool>, email_error: Option<String>) -> Self {
        match email_sent {
            Some(true) => EmailStatus::Sent,
            Some(false) => EmailStatus::Failed { error: email_error },
            None => EmailStatus::Unknown,
        }
    }

    pub fn to_wire(&self) -> (Option<bool>, Option<String>) {
        match self {
            EmailStatus::Sent => (Some(true), None),
            EmailStatus::Failed { error } => (Some(false), error.clone()),
            EmailStatus::Unknown => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_and_tolerates_missing_fields() {
        let raw = serde_json::json!({
            "fullName": "Asha Roy",
            "whatsappNumber": "9876543210",
            "email": "asha@example.com",
        });
        let request: RegistrationRequest = serde_json::from_value(raw).expect("decode");
        assert_eq!(request.full_name.as_deref(), Some("Asha Roy"));
        assert_eq!(request.interest, None);
        assert_eq!(request.message, None);
    }

    #[test]
    fn created_response_carries_email_failure() {
        let response = RegistrationResponse::created(&EmailStatus::Failed {
            error: Some("timed out".into()),
        });
        let raw = serde_json::to_value(&response).expect("encode");
        assert_eq!(
            raw,
            serde_json::json!({
                "message": "Registration successful",
                "emailSent": false,
                "emailError": "timed out",
            })
        );
    }

    #[test]
    fn wire_pair_maps_both_ways() {
        for status in [
            EmailStatus::Sent,
            EmailStatus::Failed {
                error: Some("rejected".into()),
            },
            EmailStatus::Failed { error: None },
            EmailStatus::Unknown,
        ] {
            let (sent, error) = status.to_wire();
            assert_eq!(EmailStatus::from_wire(sent, error), status);
        }
        assert_eq!(
            EmailStatus::from_wire(None, Some("ignored".into())),
            EmailStatus::Unknown
        );
        assert_eq!(EmailStatus::from_wire(Some(true), None), EmailStatus::Sent);
    }

    #[test]
    fn absent_email_flag_is_unknown() {
        let response: RegistrationResponse =
            serde_json::from_str(r#"{"message":"Registration successful"}"#).expect("decode");
        assert_eq!(response.email_status(), EmailStatus::Unknown);

        let response: RegistrationResponse =
            serde_json::from_str(r#"{"message":"ok","emailSent":true}"#).expect("decode");
        assert_eq!(response.email_status(), EmailStatus::Sent);
    }
}
