use std::collections::BTreeMap;

use shared::{domain::Interest, protocol::RegistrationRequest};

pub const MIN_WHATSAPP_DIGITS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    FullName,
    WhatsappNumber,
    Email,
    Interest,
    Message,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::FullName,
        FormField::WhatsappNumber,
        FormField::Email,
        FormField::Interest,
        FormField::Message,
    ];

    /// Wire name of the field.
    pub fn name(self) -> &'static str {
        match self {
            FormField::FullName => "fullName",
            FormField::WhatsappNumber => "whatsappNumber",
            FormField::Email => "email",
            FormField::Interest => "interest",
            FormField::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub full_name: String,
    pub whatsapp_number: String,
    pub email: String,
    /// Raw interest code as picked in the form; checked against [`Interest`].
    pub interest: String,
    pub message: String,
}

impl RegistrationForm {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::FullName => &self.full_name,
            FormField::WhatsappNumber => &self.whatsapp_number,
            FormField::Email => &self.email,
            FormField::Interest => &self.interest,
            FormField::Message => &self.message,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::FullName => self.full_name = value,
            FormField::WhatsappNumber => self.whatsapp_number = value,
            FormField::Email => self.email = value,
            FormField::Interest => self.interest = value,
            FormField::Message => self.message = value,
        }
    }

    pub fn select_interest(&mut self, interest: Interest) {
        self.interest = interest.code().to_string();
    }

    /// Checks every field and reports all failures together.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();

        if self.full_name.trim().is_empty() {
            errors.insert(FormField::FullName, "Full Name is required");
        }

        if self.whatsapp_number.trim().is_empty() {
            errors.insert(FormField::WhatsappNumber, "WhatsApp Number is required");
        } else if !is_valid_whatsapp_number(&self.whatsapp_number) {
            errors.insert(FormField::WhatsappNumber, "Enter a valid 10-digit number");
        }

        if self.email.trim().is_empty() {
            errors.insert(FormField::Email, "Email Address is required");
        } else if !is_valid_email(&self.email) {
            errors.insert(FormField::Email, "Enter a valid email address");
        }

        if self.interest.parse::<Interest>().is_err() {
            errors.insert(FormField::Interest, "Please select an option");
        }

        errors
    }

    pub fn to_request(&self) -> RegistrationRequest {
        let message = Some(self.message.clone()).filter(|m| !m.trim().is_empty());
        RegistrationRequest {
            full_name: Some(self.full_name.clone()),
            whatsapp_number: Some(self.whatsapp_number.clone()),
            email: Some(self.email.clone()),
            interest: Some(self.interest.clone()),
            message,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<FormField, String>);

impl ValidationErrors {
    fn insert(&mut self, field: FormField, message: &str) {
        self.0.insert(field, message.to_string());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn clear_field(&mut self, field: FormField) {
        self.0.remove(&field);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

pub fn whatsapp_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn is_valid_whatsapp_number(raw: &str) -> bool {
    whatsapp_digits(raw).len() >= MIN_WHATSAPP_DIGITS
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, ch)| ch == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RegistrationForm {
        RegistrationForm {
            full_name: "Asha Roy".to_string(),
            whatsapp_number: "9876543210".to_string(),
            email: "asha@example.com".to_string(),
            interest: "general".to_string(),
            message: String::new(),
        }
    }

    #[test]
    fn filled_form_is_valid() {
        assert!(filled().validate().is_empty());
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let errors = RegistrationForm::default().validate();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get(FormField::FullName), Some("Full Name is required"));
        assert_eq!(
            errors.get(FormField::WhatsappNumber),
            Some("WhatsApp Number is required")
        );
        assert_eq!(errors.get(FormField::Email), Some("Email Address is required"));
        assert_eq!(errors.get(FormField::Interest), Some("Please select an option"));
        assert!(!errors.contains(FormField::Message));
    }

    #[test]
    fn whitespace_only_name_is_blank() {
        let mut form = filled();
        form.full_name = "   ".to_string();
        let errors = form.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(FormField::FullName));
    }

    #[test]
    fn whatsapp_validity_depends_only_on_digit_count() {
        for ok in [
            "9876543210",
            "+91 98765 43210",
            "98-765-432-10",
            "(987) 654 3210",
            "+1 (555) 010-99999",
        ] {
            assert!(is_valid_whatsapp_number(ok), "{ok} rejected");
        }
        for bad in ["987654321", "+91 98765", "phone: 12-34", "----------"] {
            assert!(!is_valid_whatsapp_number(bad), "{bad} accepted");
        }

        let mut form = filled();
        form.whatsapp_number = "+91 1234".to_string();
        assert_eq!(
            form.validate().get(FormField::WhatsappNumber),
            Some("Enter a valid 10-digit number")
        );
    }

    #[test]
    fn email_shape_check() {
        for ok in ["asha@example.com", "a.b+c@mail.example.co.in", "x@y.z"] {
            assert!(is_valid_email(ok), "{ok} rejected");
        }
        for bad in [
            "asha",
            "asha@example",
            "@example.com",
            "asha@.com",
            "asha@example.",
            "asha@@example.com",
            "as ha@example.com",
            " asha@example.com",
        ] {
            assert!(!is_valid_email(bad), "{bad} accepted");
        }
    }

    #[test]
    fn interest_must_be_a_known_code() {
        let mut form = filled();
        form.interest = "walk_in".to_string();
        assert!(form.validate().contains(FormField::Interest));

        form.select_interest(Interest::Sponsor);
        assert_eq!(form.interest, "sponsor");
        assert!(form.validate().is_empty());
    }

    #[test]
    fn request_omits_blank_message() {
        let mut form = filled();
        let request = form.to_request();
        assert_eq!(request.message, None);
        assert_eq!(request.interest.as_deref(), Some("general"));

        form.set(FormField::Message, "See you there");
        assert_eq!(form.to_request().message.as_deref(), Some("See you there"));
        assert_eq!(form.get(FormField::Message), "See you there");
    }
}
