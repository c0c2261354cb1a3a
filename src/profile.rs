use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

pub const DEFAULT_NAME: &str = "User";
pub const NO_LOCATION: &str = "Location not set";

pub const DEFAULT_RATING: f64 = 4.8;
pub const DEFAULT_RESPONSE_RATE: u8 = 95;

/// Профиль в том виде, в котором он хранится на бэкенде.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Profile {
    pub user_id: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub languages: Option<Vec<String>>,
    pub employment_type: Option<String>,
    pub income_range: Option<String>,
    pub income: Option<f64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Профиль, готовый к показу.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayProfile {
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub location: String,
    pub bio: String,
    pub phone: String,
    pub languages: Vec<String>,
    pub employment_type: String,
    pub income_range: String,
    pub income: Option<f64>,
    pub verified: bool,
    pub rating: f64,
    pub review_count: u32,
    pub member_since: String,
    pub response_rate: u8,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl DisplayProfile {
    /// Превращает профиль с бэкенда в профиль для показа.
    /// `auth_email` используется, когда в профиле нет ни имени, ни почты.
    pub fn from_profile(profile: &Profile, auth_email: Option<&str>, clock: &dyn Clock) -> Self {
        let email = non_empty(&profile.email)
            .or(auth_email)
            .unwrap_or_default()
            .to_owned();

        let member_since = match non_empty(&profile.created_at) {
            Some(created_at) => created_at.to_owned(),
            None => timestamp(clock),
        };

        Self {
            name: display_name(Some(profile), auth_email),
            first_name: profile.firstname.clone().unwrap_or_default(),
            last_name: profile.lastname.clone().unwrap_or_default(),
            email,
            location: non_empty(&profile.location)
                .unwrap_or(NO_LOCATION)
                .to_owned(),
            bio: profile.bio.clone().unwrap_or_default(),
            phone: profile.phone.clone().unwrap_or_default(),
            languages: profile.languages.clone().unwrap_or_default(),
            employment_type: profile.employment_type.clone().unwrap_or_default(),
            income_range: profile.income_range.clone().unwrap_or_default(),
            income: profile.income,
            verified: true,
            rating: DEFAULT_RATING,
            review_count: 0,
            member_since,
            response_rate: DEFAULT_RESPONSE_RATE,
        }
    }

    pub fn initials(&self) -> String {
        initials(&self.name)
    }
}

/// Изменения профиля для отправки на бэкенд.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone: String,
    pub bio: String,
    pub location: String,
    pub employment_type: String,
    pub income_range: String,
    pub languages: Vec<String>,
    pub updated_at: String,
}

impl ProfileUpdate {
    pub fn from_display(profile: &DisplayProfile, clock: &dyn Clock) -> Self {
        Self {
            firstname: profile.first_name.clone(),
            lastname: profile.last_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            bio: profile.bio.clone(),
            location: profile.location.clone(),
            employment_type: profile.employment_type.clone(),
            income_range: profile.income_range.clone(),
            languages: profile.languages.clone(),
            updated_at: timestamp(clock),
        }
    }
}

fn timestamp(clock: &dyn Clock) -> String {
    clock
        .now()
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Имя для показа: имя и фамилия, затем часть почты до `@`, затем "User".
pub fn display_name(profile: Option<&Profile>, email: Option<&str>) -> String {
    if let Some(p) = profile {
        let full = format!(
            "{} {}",
            p.firstname.as_deref().unwrap_or_default(),
            p.lastname.as_deref().unwrap_or_default()
        );
        let full = full.trim();
        if !full.is_empty() {
            return full.to_owned();
        }
    }

    match email.and_then(|e| e.split('@').next()) {
        Some(local) if !local.is_empty() => local.to_owned(),
        _ => DEFAULT_NAME.to_owned(),
    }
}

/// Первые буквы не более чем двух слов, заглавные.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}
