//! Monitored resources and the health of their members.

/// Health state reported for a single member of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberState {
    InService,
    OutOfService,
    /// Any other provider-specific value, e.g. `Unknown`.
    Other(String),
}

impl MemberState {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::InService)
    }
}

impl From<&str> for MemberState {
    fn from(value: &str) -> Self {
        match value {
            "InService" => Self::InService,
            "OutOfService" => Self::OutOfService,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<Option<&str>> for MemberState {
    fn from(value: Option<&str>) -> Self {
        value.unwrap_or("Unknown").into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// provider id of the member, when the provider reports one
    pub id: Option<String>,
    pub state: MemberState,
}

impl Member {
    pub fn new(state: impl Into<MemberState>) -> Self {
        Self {
            id: None,
            state: state.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, state: impl Into<MemberState>) -> Self {
        Self {
            id: Some(id.into()),
            state: state.into(),
        }
    }
}

/// A monitored unit, e.g. a load balancer, and its members in provider order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub identifier: String,
    pub members: Vec<Member>,
}

impl Resource {
    pub fn new(identifier: impl Into<String>, members: impl IntoIterator<Item = Member>) -> Self {
        Self {
            identifier: identifier.into(),
            members: members.into_iter().collect(),
        }
    }

    pub fn unhealthy_count(&self) -> usize {
        self.members
            .iter()
            .filter(|member| !member.state.is_healthy())
            .count()
    }
}

#[cfg(test)]
mod test {
    use super::{Member, MemberState, Resource};

    #[test]
    fn states_match_exactly() {
        assert_eq!(MemberState::from("InService"), MemberState::InService);
        assert_eq!(MemberState::from("OutOfService"), MemberState::OutOfService);
        assert_eq!(
            MemberState::from("inservice"),
            MemberState::Other("inservice".to_string())
        );
        assert_eq!(
            MemberState::from(None),
            MemberState::Other("Unknown".to_string())
        );
    }

    #[test]
    fn counts_everything_but_in_service() {
        let lb = Resource::new(
            "app",
            [
                Member::new("InService"),
                Member::new("OutOfService"),
                Member::new("Unknown"),
                Member::with_id("i-0abc", "InService"),
            ],
        );
        assert_eq!(lb.unhealthy_count(), 2);
    }

    #[test]
    fn no_members_is_healthy() {
        assert_eq!(Resource::new("empty", []).unhealthy_count(), 0);
    }
}
