//! Ticket state for one logical session.
//!
//! A `Session` is a plain value owned by the client instance that uses it.
//! It moves `Unset -> Active` when a ticket is acquired and back to `Unset`
//! when the ticket is destroyed or an acquire attempt fails.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    ticket: Option<String>,
}

impl Session {
    /// A session resumed from a ticket obtained elsewhere.
    pub fn with_ticket(ticket: impl Into<String>) -> Self {
        Self {
            ticket: Some(ticket.into()),
        }
    }

    pub fn ticket(&self) -> Option<&str> {
        self.ticket.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.ticket.is_some()
    }

    pub fn activate(&mut self, ticket: String) {
        self.ticket = Some(ticket);
    }

    pub fn clear(&mut self) {
        self.ticket = None;
    }
}
