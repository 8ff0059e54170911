//! # API Module
//!
//! HTTP endpoints of the short-lived local server that `spotharvest auth`
//! starts while the user logs in.
//!
//! - [`callback`] - target of the Spotify redirect. Exchanges the
//!   authorization code (with the PKCE verifier kept in shared state) for
//!   an access token.
//! - [`health`] - reports status and version, handy to check that the
//!   redirect URI points at the right address.
//!
//! The routes are assembled in [`crate::server::router`].

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
