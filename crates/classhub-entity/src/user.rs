//! User role enumeration.

use serde::{Deserialize, Serialize};

/// Roles available in a classroom session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates polls/quizzes and receives presence telemetry.
    Teacher,
    /// Responds to polls/quizzes and emits presence signals.
    Student,
}

impl Role {
    /// Check if this role is a teacher.
    pub fn is_teacher(&self) -> bool {
        matches!(self, Self::Teacher)
    }

    /// Check if this role is a student.
    pub fn is_student(&self) -> bool {
        matches!(self, Self::Student)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Role::Student).expect("serialize");
        assert_eq!(json, "\"student\"");
        let role: Role = serde_json::from_str("\"teacher\"").expect("deserialize");
        assert_eq!(role, Role::Teacher);
    }
}
