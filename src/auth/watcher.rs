use std::sync::{Arc, Mutex};

use log::{debug, warn};

use super::{
    provider::{lock, AuthProvider, Subscription},
    session::{AuthEvent, OnboardingStatus, Session, User},
};

/// Куда отправить пользователя после изменения сессии.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Route {
    #[display(fmt = "/auth/onboarding/step-1")]
    Onboarding,
    #[display(fmt = "/profile")]
    Profile,
    #[display(fmt = "/")]
    Home,
}

/// Маршрут для события.
/// Только вход и выход куда-то ведут, остальные события ничего не меняют.
pub fn route_for(event: AuthEvent, session: Option<&Session>) -> Option<Route> {
    match event {
        AuthEvent::SignedIn => {
            let status = session
                .map(|s| s.user.onboarding_status())
                .unwrap_or(OnboardingStatus::Completed);

            Some(match status {
                OnboardingStatus::Required => Route::Onboarding,
                OnboardingStatus::Completed => Route::Profile,
            })
        }
        AuthEvent::SignedOut => Some(Route::Home),
        _ => None,
    }
}

/// Состояние аутентификации.
///
/// Создаётся в состоянии загрузки, заполняется из провайдера при старте
/// и дальше меняется только событиями провайдера.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    session: Option<Session>,
    loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
        }
    }
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Берёт начальную сессию у провайдера.
    /// Ошибка провайдера означает, что сессии нет.
    pub fn initialize(&mut self, provider: &dyn AuthProvider) {
        let session = match provider.get_session() {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to get initial session: {}", e);
                None
            }
        };

        self.restore(session);
    }

    fn restore(&mut self, session: Option<Session>) {
        debug!("Initial session present: {}", session.is_some());

        self.session = session;
        self.loading = false;
    }

    /// Применяет событие провайдера и возвращает маршрут, если он нужен.
    pub fn handle(&mut self, event: AuthEvent, session: Option<&Session>) -> Option<Route> {
        debug!("Handle auth event {}", event);

        self.session = session.cloned();
        self.loading = false;

        route_for(event, session)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

/// Держит состояние аутентификации в актуальном виде, пока подписан на
/// провайдера, и переводит пользователя по маршрутам.
pub struct AuthWatcher {
    state: Arc<Mutex<AuthState>>,
    subscription: Option<Subscription>,
}

impl AuthWatcher {
    /// Подписывается на провайдера и загружает начальную сессию.
    /// `navigate` вызывается из обработчика событий провайдера.
    pub fn start<N>(provider: &dyn AuthProvider, mut navigate: N) -> Self
    where
        N: FnMut(Route) + Send + 'static,
    {
        let state = Arc::new(Mutex::new(AuthState::new()));

        let handler_state = state.clone();
        let subscription = provider.on_auth_state_change(Box::new(move |event, session| {
            let route = lock(&handler_state).handle(event, session);

            if let Some(r) = route {
                debug!("Navigate to {}", r);
                navigate(r);
            }
        }));

        let session = match provider.get_session() {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to get initial session: {}", e);
                None
            }
        };

        lock(&state).restore(session);

        Self {
            state,
            subscription: Some(subscription),
        }
    }

    /// Копия текущего состояния.
    pub fn snapshot(&self) -> AuthState {
        lock(&self.state).clone()
    }

    /// Отписывается от провайдера. Состояние больше не меняется.
    pub fn stop(mut self) -> AuthState {
        if let Some(s) = self.subscription.take() {
            s.unsubscribe();
        }

        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use reqwest::Url;

    use super::*;
    use crate::auth::{
        provider::{AuthError, AuthResult, Listener, Notifier},
        session::{AppMetadata, OAuthProvider, Token, UserMetadata},
    };

    fn session(provider: &str, onboarding_completed: bool) -> Session {
        Session {
            access_token: Token::new("at".to_owned(), None).unwrap(),
            refresh_token: Token::new("rt".to_owned(), None).unwrap(),
            user: User {
                id: "u1".to_owned(),
                email: Some("alex@example.com".to_owned()),
                app_metadata: AppMetadata {
                    provider: Some(provider.to_owned()),
                },
                user_metadata: UserMetadata {
                    onboarding_completed,
                },
            },
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        session: Mutex<Option<Session>>,
        next_sign_in: Mutex<Option<Session>>,
        notifier: Notifier,
    }

    impl FakeProvider {
        fn signed_in(session: Session) -> Self {
            let p = Self::default();
            *p.session.lock().unwrap() = Some(session);
            p
        }

        fn will_sign_in_as(&self, session: Session) {
            *self.next_sign_in.lock().unwrap() = Some(session);
        }
    }

    impl AuthProvider for FakeProvider {
        fn get_session(&self) -> AuthResult<Option<Session>> {
            Ok(self.session.lock().unwrap().clone())
        }

        fn sign_up(&self, _email: &str, _password: &str) -> AuthResult<Option<Session>> {
            Ok(None)
        }

        fn sign_in(&self, _email: &str, _password: &str) -> AuthResult<Session> {
            let session = self
                .next_sign_in
                .lock()
                .unwrap()
                .take()
                .ok_or(AuthError::Api {
                    status: 400,
                    message: "Invalid login credentials".to_owned(),
                })?;

            *self.session.lock().unwrap() = Some(session.clone());
            self.notifier.notify(AuthEvent::SignedIn, Some(&session));

            Ok(session)
        }

        fn sign_in_with_oauth(
            &self,
            provider: OAuthProvider,
            redirect_to: &str,
        ) -> AuthResult<Url> {
            Url::parse(&format!("https://auth.test/{}?redirect_to={}", provider, redirect_to))
                .map_err(|_| AuthError::InvalidUrl(redirect_to.to_owned()))
        }

        fn sign_out(&self) -> AuthResult<()> {
            *self.session.lock().unwrap() = None;
            self.notifier.notify(AuthEvent::SignedOut, None);
            Ok(())
        }

        fn reset_password_for_email(&self, _email: &str, _redirect_to: &str) -> AuthResult<()> {
            Ok(())
        }

        fn on_auth_state_change(&self, listener: Listener) -> Subscription {
            self.notifier.subscribe(listener)
        }
    }

    struct BrokenProvider(FakeProvider);

    impl AuthProvider for BrokenProvider {
        fn get_session(&self) -> AuthResult<Option<Session>> {
            Err(AuthError::NoSession)
        }

        fn sign_up(&self, email: &str, password: &str) -> AuthResult<Option<Session>> {
            self.0.sign_up(email, password)
        }

        fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
            self.0.sign_in(email, password)
        }

        fn sign_in_with_oauth(
            &self,
            provider: OAuthProvider,
            redirect_to: &str,
        ) -> AuthResult<Url> {
            self.0.sign_in_with_oauth(provider, redirect_to)
        }

        fn sign_out(&self) -> AuthResult<()> {
            self.0.sign_out()
        }

        fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> AuthResult<()> {
            self.0.reset_password_for_email(email, redirect_to)
        }

        fn on_auth_state_change(&self, listener: Listener) -> Subscription {
            self.0.on_auth_state_change(listener)
        }
    }

    fn routes() -> (Arc<Mutex<Vec<Route>>>, impl FnMut(Route) + Send + 'static) {
        let routes = Arc::new(Mutex::new(Vec::new()));
        let sink = routes.clone();
        (routes, move |r: Route| sink.lock().unwrap().push(r))
    }

    #[test]
    fn routes_for_events() {
        let new_oauth = session("google", false);
        let done_oauth = session("google", true);
        let password = session("email", false);

        assert_eq!(
            Some(Route::Onboarding),
            route_for(AuthEvent::SignedIn, Some(&new_oauth))
        );
        assert_eq!(
            Some(Route::Profile),
            route_for(AuthEvent::SignedIn, Some(&done_oauth))
        );
        assert_eq!(
            Some(Route::Profile),
            route_for(AuthEvent::SignedIn, Some(&password))
        );
        assert_eq!(Some(Route::Home), route_for(AuthEvent::SignedOut, None));
        assert_eq!(None, route_for(AuthEvent::TokenRefreshed, Some(&password)));
        assert_eq!(None, route_for(AuthEvent::UserUpdated, Some(&password)));
    }

    #[test]
    fn route_paths() {
        assert_eq!("/auth/onboarding/step-1", Route::Onboarding.to_string());
        assert_eq!("/profile", Route::Profile.to_string());
        assert_eq!("/", Route::Home.to_string());
    }

    #[test]
    fn state_lifecycle() {
        let mut state = AuthState::new();
        assert!(state.is_loading());
        assert!(!state.is_authenticated());

        state.initialize(&FakeProvider::signed_in(session("email", false)));
        assert!(!state.is_loading());
        assert_eq!(Some("u1"), state.user().map(|u| u.id.as_str()));

        assert_eq!(Some(Route::Home), state.handle(AuthEvent::SignedOut, None));
        assert!(state.session().is_none());
    }

    #[test]
    fn initialize_with_failing_provider() {
        let mut state = AuthState::new();

        state.initialize(&BrokenProvider(FakeProvider::default()));

        assert!(!state.is_loading());
        assert!(!state.is_authenticated());
    }

    #[test]
    fn watcher_follows_provider() {
        let provider = FakeProvider::default();
        let (routes, navigate) = routes();

        let watcher = AuthWatcher::start(&provider, navigate);
        assert!(!watcher.snapshot().is_loading());
        assert!(!watcher.snapshot().is_authenticated());

        provider.will_sign_in_as(session("google", false));
        provider.sign_in("alex@example.com", "Secret123").unwrap();
        assert!(watcher.snapshot().is_authenticated());

        provider.sign_out().unwrap();
        assert!(!watcher.snapshot().is_authenticated());

        provider.will_sign_in_as(session("google", true));
        provider.sign_in("alex@example.com", "Secret123").unwrap();

        assert_eq!(
            vec![Route::Onboarding, Route::Home, Route::Profile],
            *routes.lock().unwrap()
        );
    }

    #[test]
    fn failed_sign_in_changes_nothing() {
        let provider = FakeProvider::default();
        let (routes, navigate) = routes();

        let watcher = AuthWatcher::start(&provider, navigate);

        assert!(provider.sign_in("alex@example.com", "wrong").is_err());

        assert!(routes.lock().unwrap().is_empty());
        assert!(!watcher.snapshot().is_authenticated());
    }

    #[test]
    fn stopped_watcher_ignores_events() {
        let provider = FakeProvider::signed_in(session("email", false));
        let (routes, navigate) = routes();

        let watcher = AuthWatcher::start(&provider, navigate);
        let last = watcher.stop();
        assert!(last.is_authenticated());

        provider.sign_out().unwrap();

        assert!(routes.lock().unwrap().is_empty());
        assert!(provider.notifier.is_empty());
    }
}
