use std::path::PathBuf;

use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};

use crate::auth::OAuthProvider;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Путь до файла с сохранённой сессией.
    pub session_path: PathBuf,

    /// Куда сохранять сгенерированные договоры.
    pub contracts_dir: PathBuf,

    /// Свой шаблон договора вместо стандартного.
    pub contract_template: Option<PathBuf>,

    /// Комиссия платформы в процентах, если в форме она не указана.
    pub platform_fee_percentage: Option<f64>,

    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_path: PathBuf::from("./session.json"),
            contracts_dir: PathBuf::from("./contracts"),
            contract_template: None,
            platform_fee_percentage: None,
            auth: AuthConfig::default(),
        }
    }
}

/// Настройки провайдера аутентификации.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AuthConfig {
    /// Базовый адрес API.
    pub url: String,

    pub api_key: String,

    /// Адрес сайта, на который провайдер возвращает пользователя.
    pub site_url: String,

    pub oauth_provider: OAuthProvider,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_owned(),
            api_key: String::new(),
            site_url: "http://localhost:3000".to_owned(),
            oauth_provider: OAuthProvider::Google,
        }
    }
}

impl AuthConfig {
    pub fn oauth_redirect(&self) -> String {
        format!("{}/auth/callback", self.site_url.trim_end_matches('/'))
    }

    pub fn reset_password_redirect(&self) -> String {
        format!("{}/auth/reset-password", self.site_url.trim_end_matches('/'))
    }
}

/// Загружает конфигурацию.
/// Если файла нет, он будет создан со значениями по-умолчанию.
pub fn load(path: PathBuf) -> anyhow::Result<Config> {
    let mut cfg: Config = confy::load_path(path)?;

    normalize(&mut cfg)?;

    Ok(cfg)
}

pub fn normalize(cfg: &mut Config) -> anyhow::Result<()> {
    // Чтобы правильно обработать относительные пути.
    cfg.session_path = cfg.session_path.try_resolve()?.into_owned();
    cfg.contracts_dir = cfg.contracts_dir.try_resolve()?.into_owned();

    if let Some(p) = &cfg.contract_template {
        cfg.contract_template = Some(p.try_resolve()?.into_owned());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::*;

    #[test]
    fn redirects() {
        let auth = AuthConfig {
            site_url: "https://flatswap.example/".to_owned(),
            ..Default::default()
        };

        assert_eq!("https://flatswap.example/auth/callback", auth.oauth_redirect());
        assert_eq!(
            "https://flatswap.example/auth/reset-password",
            auth.reset_password_redirect()
        );
    }

    #[test]
    fn partial_file_uses_defaults() {
        let path = env::temp_dir().join("flatswap-config-test.toml");
        fs::write(
            &path,
            "platform_fee_percentage = 3.0\n\n[auth]\napi_key = \"anon\"\n",
        )
        .unwrap();

        let cfg = load(path).unwrap();

        assert_eq!(Some(3.0), cfg.platform_fee_percentage);
        assert_eq!("anon", cfg.auth.api_key);
        assert_eq!("http://localhost:3000", cfg.auth.site_url);
        assert_eq!(OAuthProvider::Google, cfg.auth.oauth_provider);
        assert!(cfg.session_path.is_absolute());
        assert!(cfg.session_path.ends_with("session.json"));
    }
}
