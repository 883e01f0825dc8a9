use std::fmt;

/// Charger status as reported in the `stat` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargerStatus {
    CommunicationError,
    Waiting,
    Charging,
    OutOfService,
    UnderInspection,
    Unknown,
    Undefined(String),
}

impl ChargerStatus {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Self::CommunicationError,
            "2" => Self::Waiting,
            "3" => Self::Charging,
            "4" => Self::OutOfService,
            "5" => Self::UnderInspection,
            "9" => Self::Unknown,
            other => Self::Undefined(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::CommunicationError => "1",
            Self::Waiting => "2",
            Self::Charging => "3",
            Self::OutOfService => "4",
            Self::UnderInspection => "5",
            Self::Unknown => "9",
            Self::Undefined(code) => code,
        }
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, Self::Undefined(_))
    }
}

impl fmt::Display for ChargerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommunicationError => f.write_str("통신이상"),
            Self::Waiting => f.write_str("충전대기"),
            Self::Charging => f.write_str("충전중"),
            Self::OutOfService => f.write_str("운영중지"),
            Self::UnderInspection => f.write_str("점검중"),
            Self::Unknown => f.write_str("상태미확인"),
            Self::Undefined(code) => write!(f, "미정의({code})"),
        }
    }
}

pub fn status_text(code: &str) -> String {
    ChargerStatus::from_code(code).to_string()
}
