use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_PHONE_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::Internal(format!("unknown role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A user together with the stored password hash, used only for login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewAccount {
    pub fn validated(self) -> Result<Self, DomainError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::invalid("name", "name is required"));
        }
        at_most("name", &name, MAX_NAME_LEN)?;
        let email = normalize_email(&self.email);
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(DomainError::invalid("email", "a valid email is required"));
        }
        at_most("email", &email, MAX_EMAIL_LEN)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::invalid(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        let phone = blank_to_none(self.phone);
        if let Some(phone) = &phone {
            at_most("phone", phone, MAX_PHONE_LEN)?;
        }
        Ok(NewAccount {
            name,
            email,
            password: self.password,
            phone,
            address: blank_to_none(self.address),
        })
    }
}

/// Column widths are counted in characters, as Postgres does for VARCHAR.
fn at_most(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::invalid(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> NewAccount {
        NewAccount {
            name: "Ram".to_string(),
            email: "  Ram@Example.COM ".to_string(),
            password: "correct horse".to_string(),
            phone: Some("  ".to_string()),
            address: None,
        }
    }

    #[test]
    fn email_is_normalized_and_blank_phone_dropped() {
        let account = account().validated().expect("valid account");
        assert_eq!(account.email, "ram@example.com");
        assert_eq!(account.phone, None);
    }

    #[test]
    fn short_password_is_rejected() {
        let mut raw = account();
        raw.password = "short".to_string();
        let err = raw.validated().expect_err("short password");
        assert!(matches!(err, DomainError::InvalidRequest { field, .. } if field == "password"));
    }

    #[test]
    fn email_without_at_sign_is_rejected() {
        let mut raw = account();
        raw.email = "ram.example.com".to_string();
        let err = raw.validated().expect_err("bad email");
        assert!(matches!(err, DomainError::InvalidRequest { field, .. } if field == "email"));
    }

    #[test]
    fn over_long_fields_name_the_column() {
        let mut raw = account();
        raw.name = "n".repeat(MAX_NAME_LEN + 1);
        let err = raw.validated().expect_err("long name");
        assert!(matches!(err, DomainError::InvalidRequest { field, .. } if field == "name"));

        let mut raw = account();
        raw.email = format!("{}@example.com", "e".repeat(MAX_EMAIL_LEN));
        let err = raw.validated().expect_err("long email");
        assert!(matches!(err, DomainError::InvalidRequest { field, .. } if field == "email"));

        let mut raw = account();
        raw.phone = Some("9".repeat(MAX_PHONE_LEN + 1));
        let err = raw.validated().expect_err("long phone");
        assert!(matches!(err, DomainError::InvalidRequest { field, .. } if field == "phone"));

        let mut raw = account();
        raw.phone = Some(format!("  {}  ", "9".repeat(MAX_PHONE_LEN)));
        assert!(raw.validated().is_ok(), "surrounding blanks are trimmed first");
    }

    #[test]
    fn role_parses_from_column() {
        assert_eq!("admin".parse::<Role>().ok(), Some(Role::Admin));
        assert!("vendor".parse::<Role>().is_err());
    }
}
