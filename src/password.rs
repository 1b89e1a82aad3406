//! Password strength rules shared by signup and profile edits.

use std::fmt;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const SPECIAL_CHARACTERS: &str = "#?!@$%^&*-";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Requirement {
    MinLength(usize),
    HasDigit,
    HasLower,
    HasUpper,
    HasSpecial,
}

impl Requirement {
    /// Every rule, in reporting order.
    pub const ALL: [Requirement; 5] = [
        Requirement::MinLength(MIN_PASSWORD_LENGTH),
        Requirement::HasDigit,
        Requirement::HasLower,
        Requirement::HasUpper,
        Requirement::HasSpecial,
    ];

    pub fn is_met_by(&self, password: &str) -> bool {
        match self {
            Requirement::MinLength(min) => password.chars().count() >= *min,
            Requirement::HasDigit => password.chars().any(|c| c.is_ascii_digit()),
            Requirement::HasLower => password.chars().any(|c| c.is_ascii_lowercase()),
            Requirement::HasUpper => password.chars().any(|c| c.is_ascii_uppercase()),
            Requirement::HasSpecial => password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::MinLength(min) => write!(f, "At least {} characters", min),
            Requirement::HasDigit => write!(f, "At least one digit"),
            Requirement::HasLower => write!(f, "At least one lowercase letter"),
            Requirement::HasUpper => write!(f, "At least one uppercase letter"),
            Requirement::HasSpecial => write!(f, "At least one special character ({})", SPECIAL_CHARACTERS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordReport {
    pub satisfied: bool,
    pub unmet: Vec<Requirement>,
}

impl PasswordReport {
    /// One line listing what is missing, empty when satisfied.
    pub fn summary(&self) -> String {
        self.unmet
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Check `password` against every rule.
///
/// An empty password passes: on a profile edit it means the password is not
/// being changed. Signup forms reject the empty case before calling this.
pub fn evaluate(password: &str) -> PasswordReport {
    if password.is_empty() {
        return PasswordReport {
            satisfied: true,
            unmet: Vec::new(),
        };
    }

    let unmet: Vec<Requirement> = Requirement::ALL
        .iter()
        .copied()
        .filter(|r| !r.is_met_by(password))
        .collect();

    PasswordReport {
        satisfied: unmet.is_empty(),
        unmet,
    }
}

pub fn is_strong(password: &str) -> bool {
    evaluate(password).satisfied
}
