/// The authenticated user, passed explicitly into every component that acts
/// on their behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }

    pub fn is_self(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
