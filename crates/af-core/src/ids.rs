//! Identifiers for apps and jobs.
//!
//! Both are random v4 UUIDs behind distinct newtypes, so a `JobId` can never
//! be passed where an `AppId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(Uuid);

            impl $name {
                #[must_use]
                pub fn new() -> Self {
                    Self(Uuid::new_v4())
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            // `{}` prints the first 8 hex digits, `{:#}` the full hyphenated form.
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    if f.alternate() {
                        write!(f, "{}", self.0)
                    } else {
                        let simple = self.0.simple().to_string();
                        f.write_str(&simple[..8])
                    }
                }
            }

            impl FromStr for $name {
                type Err = uuid::Error;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    s.parse().map(Self)
                }
            }

            impl From<Uuid> for $name {
                fn from(uuid: Uuid) -> Self {
                    Self(uuid)
                }
            }
        )+
    };
}

typed_id! {
    /// Identity of an app.
    AppId,
    /// Identity of a job, used to correlate its log lines.
    JobId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(AppId::new(), AppId::new());
        assert_ne!(JobId::new(), JobId::new());
    }

    #[test]
    fn display_is_short_unless_alternate() {
        let uuid = Uuid::new_v4();
        let id = JobId::from(uuid);
        assert_eq!(id.to_string().len(), 8);
        assert!(uuid.simple().to_string().starts_with(&id.to_string()));
        assert_eq!(format!("{id:#}"), uuid.to_string());
    }

    #[test]
    fn parses_full_uuid() {
        let id = AppId::new();
        let parsed: AppId = format!("{id:#}").parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<JobId>().is_err());
    }

    #[test]
    fn serde_is_transparent() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&JobId::from(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
