//! Ticket login: turn an inbound ticket into the identity of a scope.

use std::sync::Arc;

use modkit_identity::{AuthenticationDiagnostic, AuthorityResolver, ContextManager, Identity};
use ticket_store_sdk::{TICKET_PREFIX, TicketStoreClient, TicketStoreError, ticket_key};
use tracing::{debug, warn};

use super::service::TicketStore;

pub const STEP_TICKET_LOOKUP: &str = "ticket.lookup";
pub const STEP_TICKET_EXPIRY: &str = "ticket.expiry";
pub const STEP_CONTEXT_AUTHENTICATE: &str = "context.authenticate";

/// Login flow for requests that carry a ticket instead of credentials.
///
/// Every step is recorded in the caller's [`AuthenticationDiagnostic`]. The
/// ticket itself is never recorded or logged; steps carry the user name once
/// it is known.
pub struct TicketLogin {
    tickets: Arc<dyn TicketStoreClient>,
    authorities: Arc<dyn AuthorityResolver>,
    one_off: bool,
}

impl TicketLogin {
    #[must_use]
    pub fn new(
        tickets: Arc<dyn TicketStoreClient>,
        authorities: Arc<dyn AuthorityResolver>,
    ) -> Self {
        Self {
            tickets,
            authorities,
            one_off: false,
        }
    }

    /// Login over `store`, following its `one_off` setting.
    #[must_use]
    pub fn for_store(store: Arc<TicketStore>, authorities: Arc<dyn AuthorityResolver>) -> Self {
        let one_off = store.config().one_off;
        Self::new(store, authorities).with_one_off(one_off)
    }

    /// Whether validation consumes tickets. A consumed ticket is never kept
    /// as the scope's current ticket.
    #[must_use]
    pub fn with_one_off(mut self, one_off: bool) -> Self {
        self.one_off = one_off;
        self
    }

    /// Validate `ticket`, authenticate `scope` as its user and make the
    /// ticket the scope's current ticket, unless tickets are one-off.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `Expired` if the ticket does not validate
    /// - `Identity` if the scope rejects the resolved identity
    #[tracing::instrument(skip_all)]
    pub fn authenticate(
        &self,
        scope: &mut ContextManager,
        ticket: &str,
        diagnostic: &mut AuthenticationDiagnostic,
    ) -> Result<Identity, TicketStoreError> {
        let user_name = match self.tickets.validate(ticket) {
            Ok(user_name) => {
                diagnostic.add_step(STEP_TICKET_LOOKUP, true, [user_name.as_str()]);
                diagnostic.add_step(STEP_TICKET_EXPIRY, true, [user_name.as_str()]);
                user_name
            }
            Err(TicketStoreError::Expired) => {
                diagnostic.add_step(STEP_TICKET_LOOKUP, true, None::<String>);
                diagnostic.add_step(STEP_TICKET_EXPIRY, false, None::<String>);
                debug!("ticket login rejected: expired");
                return Err(TicketStoreError::Expired);
            }
            Err(e) => {
                diagnostic.add_step(STEP_TICKET_LOOKUP, false, None::<String>);
                debug!(error = %e, "ticket login rejected");
                return Err(e);
            }
        };

        let identity = self.authorities.identity_for(&user_name);
        match scope.authenticate(identity) {
            Ok(identity) => {
                diagnostic.add_step(STEP_CONTEXT_AUTHENTICATE, true, [user_name.as_str()]);
                if self.one_off {
                    scope.clear_current_ticket();
                } else {
                    scope.set_current_ticket(format!("{TICKET_PREFIX}{}", ticket_key(ticket)));
                }
                debug!(user = %user_name, "ticket login succeeded");
                Ok(identity)
            }
            Err(e) => {
                diagnostic.add_step(STEP_CONTEXT_AUTHENTICATE, false, [user_name.as_str()]);
                warn!(user = %user_name, error = %e, "ticket login could not authenticate scope");
                Err(e.into())
            }
        }
    }
}
