mod client;
mod provider;
mod session;
mod watcher;

pub use client::HttpAuthProvider;
pub use provider::{AuthError, AuthProvider, AuthResult, Listener, Notifier, Subscription};
pub use session::{
    AppMetadata, AuthEvent, OAuthProvider, OnboardingStatus, Session, Token, TokenNewError,
    TokenNewResult, UnknownProvider, User, UserMetadata,
};
pub use watcher::{route_for, AuthState, AuthWatcher, Route};
