use std::time::SystemTime;

use serde::{Deserialize, Serialize};

pub trait TimeLimited {
    fn set_validity(&mut self, until: SystemTime);
    fn check_validity(&self) -> bool;
}

/// Claim carried in API bearer tokens, `sub` is the user id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiClaim {
    pub sub: String,
    pub name: String,
    pub exp: u64,
}

impl ApiClaim {
    /// Creates claim with expiry unset, it's filled in when token is issued
    pub fn new_expired(user_id: i64, name: impl Into<String>) -> Self {
        ApiClaim {
            sub: user_id.to_string(),
            name: name.into(),
            exp: 0,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl TimeLimited for ApiClaim {
    fn set_validity(&mut self, until: SystemTime) {
        self.exp = unix_secs(until);
    }

    fn check_validity(&self) -> bool {
        self.exp > unix_secs(SystemTime::now())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_claim_validity() {
        let mut claim = ApiClaim::new_expired(42, "olivia");
        assert!(!claim.check_validity());
        assert_eq!(claim.user_id(), Some(42));

        claim.set_validity(SystemTime::now() + Duration::from_secs(60));
        assert!(claim.check_validity());

        claim.set_validity(SystemTime::now() - Duration::from_secs(60));
        assert!(!claim.check_validity());
    }

    #[test]
    fn test_invalid_subject() {
        let claim = ApiClaim {
            sub: "not-a-number".to_string(),
            name: "x".to_string(),
            exp: 0,
        };
        assert_eq!(claim.user_id(), None);
    }
}
