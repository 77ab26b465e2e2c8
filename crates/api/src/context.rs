use counterpos_core::SessionId;

/// The session a request belongs to; owns one cart.
///
/// Inserted by the session middleware for every request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session_id: SessionId,
    minted: bool,
}

impl SessionContext {
    /// A session presented by the client.
    pub fn existing(session_id: SessionId) -> Self {
        Self {
            session_id,
            minted: false,
        }
    }

    /// A session created for this request.
    pub fn minted() -> Self {
        Self {
            session_id: SessionId::new(),
            minted: true,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn is_minted(&self) -> bool {
        self.minted
    }
}
