//! Exit statuses understood by the check scheduler.

use std::fmt;
use std::process;
use std::str::FromStr;

use serde::Deserialize;

/// The result of a check, as reported to the scheduler through the exit code.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
        }
    }

    pub fn exit(self) -> ! {
        process::exit(self.code())
    }

    pub fn str_values() -> [&'static str; 4] {
        ["ok", "warning", "critical", "unknown"]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ok" => Ok(Self::Ok),
            "warning" | "warn" => Ok(Self::Warning),
            "critical" | "crit" => Ok(Self::Critical),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!(
                "unexpected status {:?}, expected one of {:?}",
                other,
                Self::str_values()
            )),
        }
    }
}

impl TryFrom<String> for Status {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod test {
    use super::Status;

    #[test]
    fn exit_codes_follow_scheduler_convention() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::Warning.code(), 1);
        assert_eq!(Status::Critical.code(), 2);
        assert_eq!(Status::Unknown.code(), 3);
    }

    #[test]
    fn parses_names() {
        assert_eq!("ok".parse::<Status>(), Ok(Status::Ok));
        assert_eq!("WARN".parse::<Status>(), Ok(Status::Warning));
        assert_eq!("critical".parse::<Status>(), Ok(Status::Critical));
        assert_eq!("Unknown".parse::<Status>(), Ok(Status::Unknown));
        assert!("fine".parse::<Status>().is_err());
    }

    #[test]
    fn displays_uppercase() {
        assert_eq!(Status::Critical.to_string(), "CRITICAL");
    }
}
