use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access или refresh токен провайдера аутентификации.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Token {
    value: String,

    /// `None` для токенов без срока жизни, например refresh.
    expire_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Пробелы по краям отбрасываются, пустой или уже протухший токен не принимается.
    pub fn new(value: String, expire_at: Option<DateTime<Utc>>) -> TokenNewResult {
        if value.trim().is_empty() {
            return Err(TokenNewError::EmptyValue);
        }

        let token = Self {
            value: value.trim().to_owned(),
            expire_at,
        };

        if token.is_expired() {
            Err(TokenNewError::AlreadyExpired)
        } else {
            Ok(token)
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expire_at(&self) -> Option<DateTime<Utc>> {
        self.expire_at
    }

    pub fn is_expired(&self) -> bool {
        self.expires_within(Duration::zero())
    }

    /// Протухнет ли токен в ближайшие `margin`.
    pub fn expires_within(&self, margin: Duration) -> bool {
        matches!(self.expire_at, Some(at) if at <= Utc::now() + margin)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

pub type TokenNewResult = std::result::Result<Token, TokenNewError>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenNewError {
    #[error("token is empty")]
    EmptyValue,

    #[error("token has already expired")]
    AlreadyExpired,
}

/// Внешние провайдеры, через которых можно войти.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    enum_iterator::Sequence,
)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    #[display(fmt = "google")]
    Google,
}

impl FromStr for OAuthProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        enum_iterator::all::<OAuthProvider>()
            .find(|p| p.to_string() == s)
            .ok_or_else(|| UnknownProvider(s.to_owned()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown oauth provider \"{0}\"")]
pub struct UnknownProvider(pub String);

/// Нужно ли пользователю пройти онбординг.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStatus {
    Required,
    Completed,
}

impl From<bool> for OnboardingStatus {
    /// Из флага `onboarding_completed`.
    fn from(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::Required
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppMetadata {
    /// Через кого пользователь вошёл: `email`, `google` и т.п.
    pub provider: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UserMetadata {
    pub onboarding_completed: bool,
}

/// Пользователь, как его отдаёт провайдер аутентификации.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub app_metadata: AppMetadata,

    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl User {
    /// Внешний провайдер, если пользователь вошёл через него.
    pub fn oauth_provider(&self) -> Option<OAuthProvider> {
        self.app_metadata.provider.as_deref()?.parse().ok()
    }

    /// Онбординг нужен только тем, кто пришёл через внешнего провайдера
    /// и ещё его не закончил.
    pub fn onboarding_status(&self) -> OnboardingStatus {
        if self.oauth_provider().is_none() {
            return OnboardingStatus::Completed;
        }

        OnboardingStatus::from(self.user_metadata.onboarding_completed)
    }
}

/// Сессия аутентифицированного пользователя.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: Token,
    pub refresh_token: Token,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.access_token.is_expired()
    }
}

/// События, о которых провайдер сообщает подписчикам.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum AuthEvent {
    #[display(fmt = "INITIAL_SESSION")]
    InitialSession,
    #[display(fmt = "SIGNED_IN")]
    SignedIn,
    #[display(fmt = "SIGNED_OUT")]
    SignedOut,
    #[display(fmt = "TOKEN_REFRESHED")]
    TokenRefreshed,
    #[display(fmt = "USER_UPDATED")]
    UserUpdated,
    #[display(fmt = "PASSWORD_RECOVERY")]
    PasswordRecovery,
}
