use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Who a user is to the system. Every permission check matches on this.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Employee,
    Hr,
    Admin,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Employee => "Employee",
            Role::Hr => "HR Manager",
            Role::Admin => "Administrator",
        }
    }

    /// HR and Admin share every leave/attendance management permission.
    pub fn is_manager(&self) -> bool {
        match self {
            Role::Hr | Role::Admin => true,
            Role::Employee => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Role::from_str("HR").unwrap(), Role::Hr);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert!(Role::from_str("manager").is_err());
    }

    #[test]
    fn only_hr_and_admin_manage() {
        let managers: Vec<Role> = Role::iter().filter(|r| r.is_manager()).collect();
        assert_eq!(managers, vec![Role::Hr, Role::Admin]);
    }
}
