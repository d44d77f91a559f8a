use uuid::Uuid;

/// The caller as vouched for by the authentication gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: String,
}
