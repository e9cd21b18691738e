use serde::{Deserialize, Serialize};

use super::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

impl From<&Session> for User {
    fn from(session: &Session) -> Self {
        Self {
            id: session.user_id.clone(),
            username: session.username.clone(),
        }
    }
}
