use crate::use_cases::AuthorityHandle;

/// Shared by the admin HTTP router; the TCP game listener talks to the
/// authority directly through its own `AuthorityHandle` clone.
#[derive(Clone)]
pub struct AppState {
    pub authority: AuthorityHandle,
    pub admin_token: Option<String>,
}
