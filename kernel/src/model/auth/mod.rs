use crate::model::id::UserId;

pub mod event;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity change pushed to whoever follows the auth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStateChanged {
    SignedIn(UserId),
    SignedOut(UserId),
}

