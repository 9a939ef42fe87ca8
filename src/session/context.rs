use crate::session::{jar::Jar, ticket::SessionTicket};

/// Pending change to the session cookie, applied when the response is built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionUpdate {
    #[default]
    Unchanged,
    Set(SessionTicket),
    Cleared,
}

/// Per-request state shared by the login flows
///
/// Built from the incoming cookies and headers, mutated by the flow, then
/// turned back into `Set-Cookie` headers by the session manager.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub jar: Jar,
    pub session: Option<SessionTicket>,
    pub user_agent: Option<String>,
    update: SessionUpdate,
}

impl RequestContext {
    #[must_use]
    pub fn new(jar: Jar, session: Option<SessionTicket>, user_agent: Option<String>) -> Self {
        Self {
            jar,
            session,
            user_agent,
            update: SessionUpdate::Unchanged,
        }
    }

    /// Whether the request carries a valid session (link mode for providers)
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Id of the signed-in user, if any
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|ticket| ticket.user.as_str())
    }

    pub(crate) fn replace_session(&mut self, ticket: SessionTicket) {
        self.session = Some(ticket.clone());
        self.update = SessionUpdate::Set(ticket);
    }

    pub(crate) fn drop_session(&mut self) {
        self.session = None;
        self.update = SessionUpdate::Cleared;
    }

    #[must_use]
    pub fn session_update(&self) -> &SessionUpdate {
        &self.update
    }
}
