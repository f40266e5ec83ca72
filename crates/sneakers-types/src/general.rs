use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};

/// E-mail address used as login name, always stored trimmed and lowercased
#[derive(Debug, Clone, PartialEq, Eq, Validate, Hash, Serialize, Deserialize)]
#[garde(transparent)]
#[serde(try_from = "String")]
pub struct ValidEmail(#[garde(email, length(max = 255))] String);

#[cfg(feature = "e2e-tests")]
impl ValidEmail {
    pub fn cheat(email: String) -> Self {
        ValidEmail(email)
    }
}

impl TryFrom<String> for ValidEmail {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(ValidEmail(value.trim().to_lowercase()))
    }
}

impl FromStr for ValidEmail {
    type Err = garde::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let email = ValidEmail(s.trim().to_lowercase());
        email.validate()?;
        Ok(email)
    }
}

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ValidEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use fake::Fake as _;
    use quickcheck::Arbitrary;
    use quickcheck_macros::quickcheck;

    use super::*;

    impl Arbitrary for ValidEmail {
        fn arbitrary(_g: &mut quickcheck::Gen) -> Self {
            let email: String = fake::faker::internet::en::SafeEmail().fake();
            ValidEmail(email)
        }
    }

    #[quickcheck]
    fn test_valid_email_arbitrary(valid_email: ValidEmail) {
        assert!(valid_email.validate().is_ok());
    }

    #[test]
    fn test_email_normalized() {
        let email = ValidEmail::from_str("  Olivia@Example.COM ").unwrap();
        assert_eq!(email.as_ref(), "olivia@example.com");
        assert_eq!(email.to_string(), "olivia@example.com");
    }

    #[test]
    fn test_deserialize_normalizes() {
        let email: ValidEmail = serde_json::from_str("\"Admin@Localhost\"").unwrap();
        assert_eq!(email.as_ref(), "admin@localhost");
    }

    #[test]
    fn test_invalid_email() {
        assert!(ValidEmail::from_str("admin").is_err());

        let email: ValidEmail = serde_json::from_str("\"admin\"").unwrap();
        assert!(email.validate().is_err());
    }
}
