use std::{collections::HashMap, sync::Mutex, time::Duration};

use chrono::Utc;
use log::{debug, warn};
use reqwest::{header::AUTHORIZATION, Method, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{
    provider::{lock, AuthError, AuthProvider, AuthResult, Listener, Notifier, Subscription},
    session::{AuthEvent, OAuthProvider, Session, Token, User},
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// За сколько секунд до истечения access токена сессия обновляется.
const REFRESH_MARGIN_SECS: i64 = 30;

/// Провайдер аутентификации поверх REST API в стиле GoTrue.
pub struct HttpAuthProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    session: Mutex<Option<Session>>,
    notifier: Notifier,
}

impl HttpAuthProvider {
    /// Создаёт новый инстанс провайдера.
    pub fn new(base_url: &str, api_key: &str) -> AuthResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();

        Url::parse(&base_url).map_err(|_| AuthError::InvalidUrl(base_url.clone()))?;

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_owned(),
            session: Mutex::new(None),
            notifier: Notifier::new(),
        })
    }

    /// Восстанавливает сохранённую ранее сессию.
    pub fn with_session(self, session: Option<Session>) -> Self {
        *lock(&self.session) = session;
        self
    }

    /// Текущая сессия без обращения к API.
    pub fn session(&self) -> Option<Session> {
        lock(&self.session).clone()
    }

    /// Обновляет access токен через refresh токен.
    pub fn refresh_session(&self) -> AuthResult<Session> {
        let refresh_token = self
            .session()
            .ok_or(AuthError::NoSession)?
            .refresh_token;

        let url = self.build_url("token", &[("grant_type", "refresh_token")])?;

        let payload = RefreshRequest {
            refresh_token: refresh_token.value(),
        };

        let resp: TokenResponse = self.request(Method::POST, url, Some(&payload), None)?;

        let session = self.store(resp.try_into()?);

        self.notifier.notify(AuthEvent::TokenRefreshed, Some(&session));

        Ok(session)
    }

    /// Завершает вход через внешнего провайдера.
    /// `callback_url` это адрес, на который провайдер вернул пользователя.
    pub fn complete_oauth(&self, callback_url: &str) -> AuthResult<Session> {
        let params = callback_params(callback_url)?;

        if let Some(error) = params.get("error") {
            let description = params
                .get("error_description")
                .cloned()
                .unwrap_or_else(|| error.clone());
            return Err(AuthError::OAuthCallback(description));
        }

        let access_token = params
            .get("access_token")
            .cloned()
            .ok_or_else(|| AuthError::OAuthCallback("no access token".to_owned()))?;
        let refresh_token = params.get("refresh_token").cloned().unwrap_or_default();
        let expires_in = params.get("expires_in").and_then(|v| v.parse().ok());

        let access_token = Token::new(access_token, expire_at(expires_in))?;

        let user: User = self.request::<(), _>(
            Method::GET,
            self.build_url("user", &[])?,
            None,
            Some(&access_token),
        )?;

        let session = self.store(Session {
            access_token,
            refresh_token: Token::new(refresh_token, None)?,
            user,
        });

        self.notifier.notify(AuthEvent::SignedIn, Some(&session));

        Ok(session)
    }

    /// Подтверждает почту кодом из письма и входит.
    pub fn verify_email(&self, email: &str, code: &str) -> AuthResult<Session> {
        let url = self.build_url("verify", &[])?;

        let payload = VerifyRequest {
            kind: "email",
            email,
            token: code,
        };

        let resp: TokenResponse = self.request(Method::POST, url, Some(&payload), None)?;

        let session = self.store(resp.try_into()?);

        self.notifier.notify(AuthEvent::SignedIn, Some(&session));

        Ok(session)
    }

    fn store(&self, session: Session) -> Session {
        *lock(&self.session) = Some(session.clone());
        session
    }

    fn request<B: Serialize, R: DeserializeOwned>(
        &self,
        http_method: Method,
        url: Url,
        payload: Option<&B>,
        access_token: Option<&Token>,
    ) -> AuthResult<R> {
        let body = self.send(http_method, url, payload, access_token)?;

        Ok(serde_json::from_str(&body)?)
    }

    fn send<B: Serialize>(
        &self,
        http_method: Method,
        url: Url,
        payload: Option<&B>,
        access_token: Option<&Token>,
    ) -> AuthResult<String> {
        debug!("Auth API request: {} {}", http_method, url);

        let bearer = access_token.map(Token::value).unwrap_or(self.api_key.as_str());

        let mut req_builder = self
            .client
            .request(http_method, url.clone())
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", bearer));

        if let Some(b) = payload {
            req_builder = req_builder.json(b);
        }

        let resp = req_builder.send()?;
        let status = resp.status();
        let body = resp.text()?;

        if !status.is_success() {
            return Err(AuthError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        debug!("Auth API response {} on {}", status, url.path());

        Ok(body)
    }

    fn build_url(&self, method: &str, query: &[(&str, &str)]) -> AuthResult<Url> {
        let raw = format!(
            "{}/auth/v1/{}",
            self.base_url,
            method.trim_start_matches('/')
        );

        let mut url = Url::parse(&raw).map_err(|_| AuthError::InvalidUrl(raw))?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }
}

impl AuthProvider for HttpAuthProvider {
    fn get_session(&self) -> AuthResult<Option<Session>> {
        match self.session() {
            Some(s)
                if s
                    .access_token
                    .expires_within(chrono::Duration::seconds(REFRESH_MARGIN_SECS)) =>
            {
                debug!("Access token expires soon, refresh session");
                self.refresh_session().map(Some)
            }
            s => Ok(s),
        }
    }

    fn sign_up(&self, email: &str, password: &str) -> AuthResult<Option<Session>> {
        let url = self.build_url("signup", &[])?;

        let resp: SignUpResponse = self.request(
            Method::POST,
            url,
            Some(&Credentials { email, password }),
            None,
        )?;

        match resp {
            SignUpResponse::Session(t) => {
                let session = self.store(t.try_into()?);
                self.notifier.notify(AuthEvent::SignedIn, Some(&session));
                Ok(Some(session))
            }
            SignUpResponse::User(u) => {
                debug!("User {} registered, email confirmation required", u.id);
                Ok(None)
            }
        }
    }

    fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        let url = self.build_url("token", &[("grant_type", "password")])?;

        let resp: TokenResponse = self.request(
            Method::POST,
            url,
            Some(&Credentials { email, password }),
            None,
        )?;

        let session = self.store(resp.try_into()?);

        self.notifier.notify(AuthEvent::SignedIn, Some(&session));

        Ok(session)
    }

    fn sign_in_with_oauth(&self, provider: OAuthProvider, redirect_to: &str) -> AuthResult<Url> {
        let provider = provider.to_string();

        self.build_url(
            "authorize",
            &[
                ("provider", provider.as_str()),
                ("redirect_to", redirect_to),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
    }

    fn sign_out(&self) -> AuthResult<()> {
        let session = lock(&self.session).take();

        let result = match session {
            Some(s) => self
                .send::<()>(
                    Method::POST,
                    self.build_url("logout", &[])?,
                    None,
                    Some(&s.access_token),
                )
                .map(|_| ()),
            None => Ok(()),
        };

        if let Err(e) = &result {
            warn!("Remote sign out failed: {}", e);
        }

        self.notifier.notify(AuthEvent::SignedOut, None);

        result
    }

    fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> AuthResult<()> {
        let url = self.build_url("recover", &[("redirect_to", redirect_to)])?;

        self.send(Method::POST, url, Some(&RecoverRequest { email }), None)?;

        Ok(())
    }

    fn on_auth_state_change(&self, listener: Listener) -> Subscription {
        self.notifier.subscribe(listener)
    }
}

#[derive(Serialize, Debug)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize, Debug)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize, Debug)]
struct RecoverRequest<'a> {
    email: &'a str,
}

#[derive(Serialize, Debug)]
struct VerifyRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    email: &'a str,
    token: &'a str,
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    user: User,
}

impl TryFrom<TokenResponse> for Session {
    type Error = AuthError;

    fn try_from(resp: TokenResponse) -> AuthResult<Self> {
        Ok(Session {
            access_token: Token::new(resp.access_token, expire_at(resp.expires_in))?,
            refresh_token: Token::new(resp.refresh_token, None)?,
            user: resp.user,
        })
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(User),
}

fn expire_at(expires_in: Option<i64>) -> Option<chrono::DateTime<Utc>> {
    expires_in.map(|s| Utc::now() + chrono::Duration::seconds(s))
}

/// Достаёт человекочитаемое сообщение из тела ответа с ошибкой.
fn error_message(body: &str) -> String {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct ErrorBody {
        msg: Option<String>,
        message: Option<String>,
        error_description: Option<String>,
        error: Option<String>,
    }

    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return body.trim().to_owned();
    };

    parsed
        .msg
        .or(parsed.message)
        .or(parsed.error_description)
        .or(parsed.error)
        .unwrap_or_else(|| body.trim().to_owned())
}

/// Параметры из фрагмента и строки запроса адреса возврата.
fn callback_params(callback_url: &str) -> AuthResult<HashMap<String, String>> {
    let url =
        Url::parse(callback_url).map_err(|_| AuthError::InvalidUrl(callback_url.to_owned()))?;

    let mut params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    if let Some(fragment) = url.fragment() {
        let fragment = Url::parse(&format!("http://localhost/?{}", fragment))
            .map_err(|_| AuthError::InvalidUrl(callback_url.to_owned()))?;
        params.extend(fragment.query_pairs().into_owned());
    }

    Ok(params)
}
