use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationId(pub Uuid);

impl RegistrationId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Booking type a registrant picks on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interest {
    VipTable,
    General,
    Group,
    Corporate,
    Sponsor,
    ListEvent,
}

impl Interest {
    pub const ALL: [Interest; 6] = [
        Interest::VipTable,
        Interest::General,
        Interest::Group,
        Interest::Corporate,
        Interest::Sponsor,
        Interest::ListEvent,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Interest::VipTable => "vip_table",
            Interest::General => "general",
            Interest::Group => "group",
            Interest::Corporate => "corporate",
            Interest::Sponsor => "sponsor",
            Interest::ListEvent => "list_event",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Interest::VipTable => "VIP Table Reservation",
            Interest::General => "General Admission",
            Interest::Group => "Group Booking (>5 people)",
            Interest::Corporate => "Corporate Event",
            Interest::Sponsor => "Sponsorship Inquiry",
            Interest::ListEvent => "List your events",
        }
    }

    /// Display label for a raw code, falling back to the code itself.
    pub fn label_for_code(code: &str) -> &str {
        match code.parse::<Interest>() {
            Ok(interest) => interest.label(),
            Err(_) => code,
        }
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown interest code '{0}'")]
pub struct UnknownInterest(pub String);

impl FromStr for Interest {
    type Err = UnknownInterest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interest::ALL
            .into_iter()
            .find(|interest| interest.code() == s)
            .ok_or_else(|| UnknownInterest(s.to_string()))
    }
}
