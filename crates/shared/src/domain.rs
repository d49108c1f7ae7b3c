use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal used by front doors to mean "no department constraint".
pub const ANY_DEPARTMENT: &str = "Any";

pub const REGISTER_DEPARTMENTS: [&str; 4] = ["Sales", "Marketing", "Engineering", "Intelligence"];
pub const FILTER_DEPARTMENTS: [&str; 4] = ["Sales", "Marketing", "Engineering", "Finance"];

/// Union of the departments offered for registration and for filtering.
pub fn default_departments() -> Vec<String> {
    let mut departments: Vec<String> = Vec::new();
    for department in REGISTER_DEPARTMENTS.iter().chain(FILTER_DEPARTMENTS.iter()) {
        if !departments.iter().any(|known| known == department) {
            departments.push((*department).to_string());
        }
    }
    departments
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonKey {
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub surname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl Person {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        department: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            department,
        }
    }

    pub fn has_key(&self, name: &str, surname: &str) -> bool {
        self.name == name && self.surname == surname
    }

    /// Renders the candidate string shown to users, e.g. `Ada Lovelace (Engineering)`.
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.department {
            Some(department) => write!(f, "{} {} ({department})", self.name, self.surname),
            None => write!(f, "{} {}", self.name, self.surname),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DepartmentFilter {
    #[default]
    Any,
    Only(String),
}

impl DepartmentFilter {
    /// `None`, a blank value and the exact literal `Any` mean no constraint;
    /// anything else is matched verbatim.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Any,
            Some(department) if department.trim().is_empty() => Self::Any,
            Some(ANY_DEPARTMENT) => Self::Any,
            Some(department) => Self::Only(department.to_string()),
        }
    }

    pub fn matches(&self, department: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Only(wanted) => department == Some(wanted.as_str()),
        }
    }

    pub fn as_department(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::Only(department) => Some(department),
        }
    }
}

impl fmt::Display for DepartmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(ANY_DEPARTMENT),
            Self::Only(department) => f.write_str(department),
        }
    }
}
