//! Input rules for login and account registration.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AccountConfig;
use crate::database::models::Role;
use crate::error::FieldError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

static RM_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^RM\d{3}$").expect("rm number pattern is valid"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn is_valid_rm_number(rm_number: &str) -> bool {
    RM_NUMBER.is_match(rm_number)
}

/// `RMddd@<domain>`, exact case, as issued to relationship managers
fn is_rm_email(email: &str, accounts: &AccountConfig) -> bool {
    email
        .strip_suffix(&accounts.email_domain)
        .and_then(|local| local.strip_suffix('@'))
        .map(is_valid_rm_number)
        .unwrap_or(false)
}

pub fn expected_rm_email(rm_number: &str, accounts: &AccountConfig) -> String {
    format!("{}@{}", rm_number, accounts.email_domain)
}

fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {} characters long", MIN_PASSWORD_LENGTH),
        ));
    }
}

pub fn validate_login(email: &str, password: &str, accounts: &AccountConfig) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Invalid email format"));
    } else if email != accounts.admin_email && !is_rm_email(email, accounts) {
        errors.push(FieldError::new(
            "email",
            format!(
                "Email must be in format RMXXX@{} where XXX is your RM number",
                accounts.email_domain
            ),
        ));
    }

    check_password(password, &mut errors);
    errors
}

pub fn validate_register(
    email: &str,
    password: &str,
    rm_number: Option<&str>,
    role: Role,
    accounts: &AccountConfig,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let rm_number = rm_number.map(str::trim).filter(|s| !s.is_empty());

    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Invalid email format"));
    } else if !(email == accounts.admin_email && role == Role::Admin) {
        match rm_number {
            None => errors.push(FieldError::new("email", "RM number is required")),
            Some(rm_number) => {
                let expected = expected_rm_email(rm_number, accounts);
                if !email.eq_ignore_ascii_case(&expected) {
                    errors.push(FieldError::new("email", format!("Email must be {}", expected)));
                }
            }
        }
    }

    check_password(password, &mut errors);

    if !rm_number.map(is_valid_rm_number).unwrap_or(false) {
        errors.push(FieldError::new(
            "rm_number",
            "RM number must be in format RMXXX where XXX is a 3-digit number",
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> AccountConfig {
        AccountConfig::default()
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn login_accepts_rm_and_admin_emails() {
        assert!(validate_login("RM001@batiinvestasi.ai", "secret1", &accounts()).is_empty());
        assert!(validate_login("admin@batiinvestasi.ai", "secret1", &accounts()).is_empty());
    }

    #[test]
    fn login_rejects_foreign_or_malformed_emails() {
        let errors = validate_login("someone@example.com", "secret1", &accounts());
        assert_eq!(fields(&errors), vec!["email"]);
        assert!(errors[0].msg.contains("RMXXX@batiinvestasi.ai"));

        let errors = validate_login("RM1@batiinvestasi.ai", "secret1", &accounts());
        assert_eq!(fields(&errors), vec!["email"]);

        let errors = validate_login("not-an-email", "secret1", &accounts());
        assert_eq!(errors[0].msg, "Invalid email format");
    }

    #[test]
    fn login_requires_six_character_password() {
        let errors = validate_login("RM001@batiinvestasi.ai", "12345", &accounts());
        assert_eq!(fields(&errors), vec!["password"]);
    }

    #[test]
    fn register_requires_email_to_match_rm_number() {
        assert!(validate_register(
            "RM010@batiinvestasi.ai",
            "secret1",
            Some("RM010"),
            Role::User,
            &accounts()
        )
        .is_empty());

        assert!(validate_register(
            "rm010@BatiInvestasi.ai",
            "secret1",
            Some("RM010"),
            Role::User,
            &accounts()
        )
        .is_empty());

        let errors = validate_register(
            "RM011@batiinvestasi.ai",
            "secret1",
            Some("RM010"),
            Role::User,
            &accounts(),
        );
        assert_eq!(fields(&errors), vec!["email"]);
        assert_eq!(errors[0].msg, "Email must be RM010@batiinvestasi.ai");
    }

    #[test]
    fn register_validates_rm_number_format() {
        let errors = validate_register(
            "RM10@batiinvestasi.ai",
            "secret1",
            Some("RM10"),
            Role::User,
            &accounts(),
        );
        assert_eq!(fields(&errors), vec!["rm_number"]);

        let errors = validate_register("RM010@batiinvestasi.ai", "secret1", None, Role::User, &accounts());
        assert_eq!(fields(&errors), vec!["email", "rm_number"]);
    }

    #[test]
    fn admin_email_registers_only_as_admin() {
        assert!(validate_register(
            "admin@batiinvestasi.ai",
            "secret1",
            Some("RM000"),
            Role::Admin,
            &accounts()
        )
        .is_empty());

        let errors = validate_register(
            "admin@batiinvestasi.ai",
            "secret1",
            Some("RM000"),
            Role::User,
            &accounts(),
        );
        assert_eq!(fields(&errors), vec!["email"]);
    }
}
