// Interface adapters: wire protocol, TCP transport, and the admin HTTP
// façade. Everything here talks to the rest of the system only through an
// `AuthorityHandle`.

pub mod http;
pub mod net;
pub mod protocol;
pub mod state;
