use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(RequestId);

/// The signed-in alumnus as returned by `/api/alumni/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
    pub graduation: i32,
    pub role: String,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl Profile {
    pub fn draft(&self) -> ProfileDraft {
        ProfileDraft {
            name: self.name.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
        }
    }

    pub fn photo_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.photo
            .as_deref()
            .filter(|uri| !uri.trim().is_empty())
            .unwrap_or(placeholder)
    }

    pub fn graduation_label(&self) -> String {
        format!("Lulusan {}", self.graduation)
    }
}

/// Locally editable copy of the mutable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub name: String,
    pub address: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Address,
    Phone,
}

impl ProfileDraft {
    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let slot = match field {
            DraftField::Name => &mut self.name,
            DraftField::Address => &mut self.address,
            DraftField::Phone => &mut self.phone,
        };
        *slot = value.into();
    }
}

/// Mentorship request status as reported by the server.
///
/// Only `approved` and `rejected` are terminal. Anything else, including
/// values this client does not know, keeps the request actionable; the raw
/// value is preserved in `Unrecognized` so callers can log or display it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Unrecognized(String),
}

impl RequestStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Label shown in place of the action buttons once terminal.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Approved => Some("Approved"),
            Self::Rejected => Some("Rejected"),
            Self::Pending | Self::Unrecognized(_) => None,
        }
    }
}

impl Serialize for RequestStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for RequestStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

/// Snapshot of a mentee's request, owned by the parent list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorshipRequest {
    pub request_id: RequestId,
    pub mentee_name: String,
    pub mentor_name: String,
    pub status: RequestStatus,
    pub question: String,
    pub graduation: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}
