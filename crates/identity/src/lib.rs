//! Identity & session: the JWT/TOTP half of Crypto (C3), AuthSession (C7),
//! MagicLink (C8), OAuthBroker (C9), PATManager (C10), Invitations (C11).

pub mod auth_session;
pub mod crypto;
pub mod invitations;
pub mod magic_link;
pub mod notifier;
pub mod oauth_broker;
pub mod pat_manager;
pub mod repositories;
pub mod tasks;

pub use auth_session::{AuthSession, BearerCredential, UserProfile};
pub use invitations::Invitations;
pub use magic_link::MagicLink;
pub use notifier::{Notification, Notifier};
pub use oauth_broker::OAuthBroker;
pub use pat_manager::PatManager;
pub use tasks::TaskSupervisor;
