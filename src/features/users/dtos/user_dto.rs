use serde::{Deserialize, Serialize};

/// Admin edit form for a user
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EditUserForm {
    #[serde(default)]
    pub username: String,
    /// Empty clears the department
    #[serde(default)]
    pub department_id: String,
}

/// Inline errors shown next to the edit form fields
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct EditUserErrors {
    pub username: Option<String>,
    pub department: Option<String>,
}

impl EditUserErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.department.is_none()
    }
}

/// Department picked in a form's `department_id` select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentSelection {
    /// Nothing selected
    Unassigned,
    Department(i64),
    /// Not a number
    Invalid,
}

impl DepartmentSelection {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return DepartmentSelection::Unassigned;
        }
        match raw.parse::<i64>() {
            Ok(id) => DepartmentSelection::Department(id),
            Err(_) => DepartmentSelection::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_department_selection() {
        assert_eq!(DepartmentSelection::parse(""), DepartmentSelection::Unassigned);
        assert_eq!(DepartmentSelection::parse("  "), DepartmentSelection::Unassigned);
        assert_eq!(DepartmentSelection::parse(" 4 "), DepartmentSelection::Department(4));
        assert_eq!(DepartmentSelection::parse("four"), DepartmentSelection::Invalid);
    }
}
