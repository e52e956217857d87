use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(DocumentKind {
    Consultation => "consultation",
    Prescription => "prescription",
});

str_enum!(DocumentStatus {
    Active => "active",
    Terminated => "terminated",
    Cancelled => "cancelled",
    RenewalPending => "renewal_pending",
});

str_enum!(MonitoringType {
    Hepatic => "hepatic",
    Renal => "renal",
    Mixed => "mixed",
    Other => "other",
});

str_enum!(MonitoringStatus {
    Active => "active",
    Pending => "pending",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(MonitoringPriority {
    Low => "low",
    Normal => "normal",
    High => "high",
    Urgent => "urgent",
});

impl DocumentKind {
    /// Sequence code prefix for this kind of document.
    pub fn sequence_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Consultation => crate::config::CONSULTATION_PREFIX,
            DocumentKind::Prescription => crate::config::PRESCRIPTION_PREFIX,
        }
    }
}

impl DocumentStatus {
    /// Terminated and cancelled documents accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Terminated | DocumentStatus::Cancelled)
    }
}
