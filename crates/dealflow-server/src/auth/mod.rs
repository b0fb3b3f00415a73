//! Magic-link authentication
//!
//! - [`credential`]: secret generation and argon2id hashing
//! - [`store`]: pending-credential storage
//! - [`magic_link`]: issue / verify state machine
//! - [`purge`]: periodic removal of expired links
//! - [`token`]: session token codec
//! - [`extractor`]: `Authorization: Bearer` guard for handlers

pub mod credential;
pub mod extractor;
pub mod magic_link;
pub mod purge;
pub mod store;
pub mod token;

pub use credential::{CredentialHasher, PendingCredential};
pub use extractor::AuthenticatedUser;
pub use magic_link::{CredentialError, IssuedCredential, MagicLinkService};
pub use purge::spawn_purge_task;
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError};
pub use token::{SessionTokenCodec, TokenError};
