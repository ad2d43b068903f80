mod blacklist;
mod invitation;
mod oauth;
mod pat;
mod user;

pub use blacklist::BlacklistRepository;
pub use invitation::InvitationRepository;
pub use oauth::OAuthCredentialRepository;
pub use pat::PatRepository;
pub use user::UserRepository;
