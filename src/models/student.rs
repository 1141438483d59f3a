use serde::{Deserialize, Serialize};

/// Row identity of a student in the roster snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub i32);

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A student eligible for project assignment.
///
/// Partnerships are stored as identities, never as owning back-pointers;
/// when `partner_id` is set on one side the dataset expects it mirrored on
/// the other side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Student {
    pub id: StudentId,
    /// Registrar-issued identifier, e.g. a matriculation number.
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
    /// Grade point average on the 0.00..=4.00 scale.
    pub gpa: f64,
    pub partner_id: Option<StudentId>,
}

impl Student {
    pub fn new(id: StudentId, external_id: &str, name: &str, gpa: f64) -> Self {
        Self {
            id,
            external_id: external_id.to_string(),
            name: name.to_string(),
            email: None,
            gpa,
            partner_id: None,
        }
    }

    pub fn with_partner(mut self, partner_id: StudentId) -> Self {
        self.partner_id = Some(partner_id);
        self
    }

    pub fn has_partner(&self) -> bool {
        self.partner_id.is_some()
    }
}
