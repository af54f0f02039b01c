// Credential domain model

/// Validation state of the operator secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialStatus {
    #[default]
    Unknown,
    Checking,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credential {
    pub secret: String,
    pub status: CredentialStatus,
}

impl Credential {
    pub fn is_authenticated(&self) -> bool {
        self.status == CredentialStatus::Valid
    }
}
