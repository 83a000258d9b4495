//! REST endpoints under `/rest/core` and the special views under `/apps/core`

pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;
