//! Closed vocabularies of the command model.
//!
//! Every enumerated field is a tagged enum with its stored spelling pinned by
//! serde, so an unknown value fails at decode time instead of reaching the
//! store as an arbitrary string.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use cmdindex_core::DomainError;

/// Origin of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "Users/Services")]
    Services,
    #[serde(rename = "Engine")]
    Engine,
    #[serde(rename = "Content manager")]
    ContentManager,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Services, Source::Engine, Source::ContentManager];

    /// Stored spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Services => "Users/Services",
            Source::Engine => "Engine",
            Source::ContentManager => "Content manager",
        }
    }

    fn short_name(&self) -> &'static str {
        match self {
            Source::Services => "services",
            Source::Engine => "engine",
            Source::ContentManager => "content_manager",
        }
    }
}

/// Kind of recipient a command is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Agent,
    Group,
    Server,
}

impl TargetType {
    pub const ALL: [TargetType; 3] = [TargetType::Agent, TargetType::Group, TargetType::Server];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Agent => "agent",
            TargetType::Group => "group",
            TargetType::Server => "server",
        }
    }

    fn short_name(&self) -> &'static str {
        self.as_str()
    }
}

/// Command lifecycle.
///
/// ```text
/// Pending ──► Sent ──► Success
///    │          ├────► Failure
///    │          └────► Timeout
///    ├────────────────► Failure
///    └────────────────► Timeout
/// ```
///
/// Transitions are strictly forward; terminal states have no successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Stored, not yet delivered to the target.
    #[default]
    Pending,
    /// Delivered to the target, outcome unknown.
    Sent,
    Success,
    Failure,
    /// Expired before the target reported an outcome.
    Timeout,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Pending,
        Status::Sent,
        Status::Success,
        Status::Failure,
        Status::Timeout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Sent => "sent",
            Status::Success => "success",
            Status::Failure => "failure",
            Status::Timeout => "timeout",
        }
    }

    fn short_name(&self) -> &'static str {
        self.as_str()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Success | Status::Failure | Status::Timeout)
    }

    /// Whether moving from `self` to `next` keeps the lifecycle strictly forward.
    pub fn can_transition_to(&self, next: Status) -> bool {
        match (self, next) {
            (Status::Pending, Status::Sent | Status::Failure | Status::Timeout) => true,
            (Status::Sent, Status::Success | Status::Failure | Status::Timeout) => true,
            _ => false,
        }
    }
}

macro_rules! impl_vocabulary {
    ($t:ty, $name:literal) => {
        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        /// Accepts the stored spelling or the short snake_case name, ignoring case.
        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                <$t>::ALL
                    .into_iter()
                    .find(|v| {
                        v.as_str().eq_ignore_ascii_case(needle)
                            || v.short_name().eq_ignore_ascii_case(needle)
                    })
                    .ok_or_else(|| {
                        DomainError::validation(format!("unknown {}: '{}'", $name, s))
                    })
            }
        }
    };
}

impl_vocabulary!(Source, "source");
impl_vocabulary!(TargetType, "target type");
impl_vocabulary!(Status, "status");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_spelling_round_trips_through_serde() {
        for source in Source::ALL {
            let encoded = serde_json::to_value(source).unwrap();
            assert_eq!(encoded, serde_json::json!(source.as_str()));
        }
        assert_eq!(serde_json::to_value(Status::Pending).unwrap(), "pending");
        assert_eq!(serde_json::to_value(TargetType::Agent).unwrap(), "agent");
    }

    #[test]
    fn parses_short_names_and_stored_spelling() {
        assert_eq!("engine".parse::<Source>().unwrap(), Source::Engine);
        assert_eq!("Content manager".parse::<Source>().unwrap(), Source::ContentManager);
        assert_eq!("content_manager".parse::<Source>().unwrap(), Source::ContentManager);
        assert_eq!("PENDING".parse::<Status>().unwrap(), Status::Pending);
        assert_eq!("Agent".parse::<TargetType>().unwrap(), TargetType::Agent);
        assert!(matches!("robot".parse::<TargetType>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn lifecycle_is_strictly_forward() {
        assert!(Status::Pending.can_transition_to(Status::Sent));
        assert!(Status::Pending.can_transition_to(Status::Timeout));
        assert!(Status::Sent.can_transition_to(Status::Success));
        assert!(!Status::Pending.can_transition_to(Status::Success));
        assert!(!Status::Sent.can_transition_to(Status::Pending));

        for status in Status::ALL {
            assert!(!status.can_transition_to(status), "{status} must not self-loop");
            if status.is_terminal() {
                assert!(Status::ALL.iter().all(|next| !status.can_transition_to(*next)));
            }
        }
    }
}
