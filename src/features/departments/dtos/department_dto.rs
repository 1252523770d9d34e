use serde::Deserialize;

/// Add-department form
#[derive(Debug, Default, Deserialize)]
pub struct CreateDepartmentForm {
    #[serde(default)]
    pub name: String,
}
