//! # Nexus Schema
//!
//! Document shapes stored by the Nexus server and the codec used to turn them
//! into bytes.
//!
//! A [`User`] is keyed by the player's account id (a `SteamID`) and points at
//! up to three [`Character`] documents by slot. Characters are keyed by their
//! UUID and embed their save payload as [`CharacterData`].
//!
//! ```
//! use nexus_schema::{decode, encode, User};
//!
//! let user = User::new("76561198000000001");
//! let bytes = encode(&user).unwrap();
//! let back: User = decode(&bytes).unwrap();
//! assert_eq!(back, user);
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod document;
mod format;

pub use codec::{decode, encode, CodecError};
pub use document::{Character, CharacterData, User, MAX_SLOTS};
