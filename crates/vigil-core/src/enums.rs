//! Closed vocabularies stored as text columns and sent as JSON strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(CoreError::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum! {
    /// Access level of a platform user.
    Role ("role") {
        Admin => "admin",
        Clinician => "clinician",
        Viewer => "viewer",
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Viewer
    }
}

text_enum! {
    Gender ("gender") {
        Male => "M",
        Female => "F",
        Other => "Other",
    }
}

text_enum! {
    LabStatus ("lab status") {
        Pending => "pending",
        Completed => "completed",
        Reviewed => "reviewed",
    }
}

impl Default for LabStatus {
    fn default() -> Self {
        LabStatus::Pending
    }
}

text_enum! {
    RiskCategory ("risk category") {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

text_enum! {
    AlertType ("alert type") {
        Critical => "critical",
        Warning => "warning",
        Info => "info",
    }
}

text_enum! {
    Severity ("severity") {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

text_enum! {
    /// Lifecycle of a clinical alert.
    ///
    /// `active → acknowledged → resolved`, and `active → resolved` directly.
    /// Resolved is terminal.
    AlertStatus ("alert status") {
        Active => "active",
        Acknowledged => "acknowledged",
        Resolved => "resolved",
    }
}

impl Default for AlertStatus {
    fn default() -> Self {
        AlertStatus::Active
    }
}

impl AlertStatus {
    pub fn can_transition_to(self, next: AlertStatus) -> bool {
        matches!(
            (self, next),
            (AlertStatus::Active, AlertStatus::Acknowledged)
                | (AlertStatus::Active, AlertStatus::Resolved)
                | (AlertStatus::Acknowledged, AlertStatus::Resolved)
        )
    }

    /// Check a transition, naming both ends on failure.
    pub fn transition_to(self, next: AlertStatus) -> Result<AlertStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                entity: "alert",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

text_enum! {
    InterventionOutcome ("intervention outcome") {
        Successful => "successful",
        Unsuccessful => "unsuccessful",
        Ongoing => "ongoing",
    }
}
