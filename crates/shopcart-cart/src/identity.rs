//! Shopper identity used to locate the open cart.

use uuid::Uuid;

/// The `(user_id?, session_id?)` pair a request carries.
///
/// With neither set, every resolution creates a fresh anonymous cart that
/// no later request can find again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartIdentity {
    pub user_id: Option<Uuid>,
    pub session_id: Option<String>,
}

impl CartIdentity {
    pub fn new(user_id: Option<Uuid>, session_id: Option<String>) -> Self {
        Self {
            user_id,
            session_id,
        }
    }

    pub fn anonymous(session_id: impl Into<String>) -> Self {
        Self::new(None, Some(session_id.into()))
    }

    pub fn is_resolvable(&self) -> bool {
        self.user_id.is_some() || self.session_id.is_some()
    }
}
