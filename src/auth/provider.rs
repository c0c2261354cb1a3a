use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use log::debug;
use reqwest::Url;

use super::session::{AuthEvent, OAuthProvider, Session, TokenNewError};

/// Обработчик изменений сессии.
pub type Listener = Box<dyn FnMut(AuthEvent, Option<&Session>) + Send>;

/// Провайдер аутентификации.
///
/// Все вызовы это обычные удалённые запросы: ошибки отдаются как есть,
/// без повторов.
pub trait AuthProvider {
    /// Текущая сессия, если пользователь вошёл.
    fn get_session(&self) -> AuthResult<Option<Session>>;

    /// Регистрирует пользователя.
    /// `None` если провайдер требует подтвердить почту перед входом.
    fn sign_up(&self, email: &str, password: &str) -> AuthResult<Option<Session>>;

    fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session>;

    /// Адрес, на который нужно отправить пользователя для входа через
    /// внешнего провайдера.
    fn sign_in_with_oauth(&self, provider: OAuthProvider, redirect_to: &str) -> AuthResult<Url>;

    fn sign_out(&self) -> AuthResult<()>;

    fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> AuthResult<()>;

    /// Подписывает обработчик на изменения сессии.
    fn on_auth_state_change(&self, listener: Listener) -> Subscription;
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    items: BTreeMap<u64, Listener>,
}

/// Рассылает события подписчикам в порядке подписки.
///
/// Обработчики вызываются под блокировкой, поэтому изнутри обработчика нельзя
/// подписываться, отписываться или вызывать методы провайдера, которые
/// рассылают события.
#[derive(Default, Clone)]
pub struct Notifier {
    listeners: Arc<Mutex<Listeners>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let mut listeners = lock(&self.listeners);

        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.items.insert(id, listener);

        debug!("Auth listener {} subscribed", id);

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn notify(&self, event: AuthEvent, session: Option<&Session>) {
        let mut listeners = lock(&self.listeners);

        debug!(
            "Notify {} auth listeners about {}",
            listeners.items.len(),
            event
        );

        for listener in listeners.items.values_mut() {
            listener(event, session);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.listeners).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Подписка на изменения сессии.
/// Обработчик отключается при вызове `unsubscribe` или при удалении подписки.
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Отключает обработчик. То же самое происходит при удалении подписки.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).items.remove(&self.id);
            debug!("Auth listener {} unsubscribed", self.id);
        }
    }
}

/// Берёт блокировку, даже если другой поток упал с ней.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("request auth api")]
    Transport(#[from] reqwest::Error),

    #[error("auth api responded with {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid url \"{0}\"")]
    InvalidUrl(String),

    #[error("deserialize")]
    Deserialize(#[from] serde_json::Error),

    #[error("oauth callback: {0}")]
    OAuthCallback(String),

    #[error("bad token")]
    Token(#[from] TokenNewError),

    #[error("no active session")]
    NoSession,
}
