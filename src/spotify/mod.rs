//! # Spotify Integration Module
//!
//! The music-streaming side of spotharvest. It is deliberately thin: the
//! enrichment pipeline only needs a list of [`TrackDescriptor`]s, and this
//! module is where that list comes from.
//!
//! ```text
//! CLI (auth, tracks, harvest)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (OAuth 2.0 authorization code + PKCE)
//!     ├── Profile (GET /me)
//!     └── Top Tracks (GET /me/top/tracks)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Authentication
//!
//! [`auth`] runs the PKCE flow: a code verifier/challenge pair is generated,
//! the local callback server from [`crate::server`] is started, the browser
//! is pointed at the consent page, and the code delivered to `/callback` is
//! exchanged for an access token. Tokens are cached by
//! [`crate::management::TokenManager`] and refreshed four minutes before
//! they expire. Only the `user-top-read` scope is needed.
//!
//! [`user::get_current_user`] reads the logged-in profile so `auth` can
//! confirm which account was connected.
//!
//! ## Top Tracks
//!
//! [`tracks::get_top_tracks`] reads up to 50 of the user's most played
//! tracks for a time range and maps each to a [`TrackDescriptor`] (uri,
//! name, first artist).
//!
//! ## Errors
//!
//! Functions return [`crate::Res`]; HTTP errors, missing configuration and
//! token problems all surface as boxed errors with a readable message.
//!
//! [`TrackDescriptor`]: crate::types::TrackDescriptor

pub mod auth;
pub mod tracks;
pub mod user;
