use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller identity as handed over by the upstream identity collaborator.
/// The booking core trusts it and performs no authentication of its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub role: Option<String>,
}

impl User {
    pub fn new(id: Uuid) -> Self {
        Self { id, role: None }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }
}
