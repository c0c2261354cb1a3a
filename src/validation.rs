use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref FULL_NAME: Regex = Regex::new(r"^[a-zA-ZÀ-ÿ\s'-]+$").unwrap();
    static ref PHONE_SEPARATORS: Regex = Regex::new(r"[\s\-()]").unwrap();
    static ref PHONE: Regex = Regex::new(r"^\+?[1-9][0-9]{0,15}$").unwrap();
    static ref VERIFICATION_CODE: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
}

const PASSWORD_MIN_LEN: usize = 8;
const FULL_NAME_MIN_LEN: usize = 2;
const BIO_MAX_LEN: usize = 500;

/// Ошибка валидации одного поля.
/// Текст ошибки предназначен для показа пользователю как есть.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,

    #[error("Please enter a valid email address")]
    EmailFormat,

    #[error("Password is required")]
    PasswordRequired,

    #[error("Password must be at least 8 characters")]
    PasswordTooShort,

    #[error("Password must contain at least one lowercase letter")]
    PasswordMissingLowercase,

    #[error("Password must contain at least one uppercase letter")]
    PasswordMissingUppercase,

    #[error("Password must contain at least one number")]
    PasswordMissingDigit,

    #[error("Full name is required")]
    FullNameRequired,

    #[error("Name must be at least 2 characters")]
    FullNameTooShort,

    #[error("Name contains invalid characters")]
    FullNameInvalidCharacters,

    #[error("Please enter your full name (first and last name)")]
    FullNameIncomplete,

    #[error("Please enter a valid phone number")]
    PhoneFormat,

    #[error("Bio must be less than 500 characters")]
    BioTooLong,

    #[error("City is required")]
    CityRequired,

    #[error("Country is required")]
    CountryRequired,

    #[error("You must accept the terms and conditions")]
    TermsNotAccepted,

    #[error("Please select at least one language")]
    LanguagesRequired,

    #[error("Verification code is required")]
    VerificationCodeRequired,

    #[error("Verification code must be 6 digits")]
    VerificationCodeFormat,
}

impl Serialize for ValidationError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

pub type Result = std::result::Result<(), ValidationError>;

/// Поля форм, для которых собираются ошибки.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    std::hash::Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    #[display(fmt = "fullName")]
    FullName,
    #[display(fmt = "email")]
    Email,
    #[display(fmt = "password")]
    Password,
    #[display(fmt = "acceptTerms")]
    AcceptTerms,
    #[display(fmt = "phone")]
    Phone,
    #[display(fmt = "city")]
    City,
    #[display(fmt = "country")]
    Country,
    #[display(fmt = "bio")]
    Bio,
    #[display(fmt = "languages")]
    Languages,
}

/// Ошибки формы по полям.
/// Если поля нет в списке, значит оно валидно.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<Field, ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<ValidationError> {
        self.0.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn insert(&mut self, field: Field, error: ValidationError) {
        self.0.insert(field, error);
    }

    /// Запоминает ошибку поля, если она есть.
    pub fn check(&mut self, field: Field, result: Result) {
        if let Err(e) = result {
            self.insert(field, e);
        }
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, ValidationError)> + '_ {
        self.0.iter().map(|(f, e)| (*f, *e))
    }
}

pub fn validate_email(email: &str) -> Result {
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }

    if !EMAIL.is_match(email) {
        return Err(ValidationError::EmailFormat);
    }

    Ok(())
}

/// Проверяет пароль. Спецсимволы не требуются.
pub fn validate_password(password: &str) -> Result {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }

    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(ValidationError::PasswordTooShort);
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::PasswordMissingLowercase);
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::PasswordMissingUppercase);
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingDigit);
    }

    Ok(())
}

/// Проверяет полное имя: нужны как минимум имя и фамилия.
pub fn validate_full_name(name: &str) -> Result {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::FullNameRequired);
    }

    if trimmed.chars().count() < FULL_NAME_MIN_LEN {
        return Err(ValidationError::FullNameTooShort);
    }

    if !FULL_NAME.is_match(name) {
        return Err(ValidationError::FullNameInvalidCharacters);
    }

    if trimmed.split_whitespace().count() < 2 {
        return Err(ValidationError::FullNameIncomplete);
    }

    Ok(())
}

/// Телефон не обязателен, пустое значение валидно.
pub fn validate_phone_number(phone: &str) -> Result {
    if phone.is_empty() {
        return Ok(());
    }

    let digits = PHONE_SEPARATORS.replace_all(phone, "");

    if !PHONE.is_match(&digits) {
        return Err(ValidationError::PhoneFormat);
    }

    Ok(())
}

pub fn validate_bio(bio: &str) -> Result {
    if bio.chars().count() > BIO_MAX_LEN {
        return Err(ValidationError::BioTooLong);
    }

    Ok(())
}

/// Город и страна обязательны вместе, ошибки возвращаются для каждого поля.
pub fn validate_location(city: &str, country: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if city.trim().is_empty() {
        errors.insert(Field::City, ValidationError::CityRequired);
    }

    if country.trim().is_empty() {
        errors.insert(Field::Country, ValidationError::CountryRequired);
    }

    errors
}

pub fn validate_verification_code(code: &str) -> Result {
    if code.is_empty() {
        return Err(ValidationError::VerificationCodeRequired);
    }

    if !VERIFICATION_CODE.is_match(code) {
        return Err(ValidationError::VerificationCodeFormat);
    }

    Ok(())
}

/// Оценка надёжности пароля.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    /// От 0 до 4.
    pub score: u8,

    pub tier: StrengthTier,
}

impl PasswordStrength {
    /// Подпись для пользователя.
    pub fn feedback(&self) -> String {
        self.tier.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "kebab-case")]
pub enum StrengthTier {
    #[display(fmt = "Very weak")]
    VeryWeak,
    #[display(fmt = "Weak")]
    Weak,
    #[display(fmt = "Fair")]
    Fair,
    #[display(fmt = "Strong")]
    Strong,
}

impl From<u8> for StrengthTier {
    fn from(score: u8) -> Self {
        match score {
            0 | 1 => Self::VeryWeak,
            2 => Self::Weak,
            3 => Self::Fair,
            _ => Self::Strong,
        }
    }
}

pub fn password_strength(password: &str) -> PasswordStrength {
    let checks = [
        password.chars().count() >= PASSWORD_MIN_LEN,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
    ];

    let score = checks.iter().filter(|passed| **passed).count() as u8;

    PasswordStrength {
        score,
        tier: score.into(),
    }
}

/// Данные формы регистрации.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignUpForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub accept_terms: bool,
}

pub fn validate_sign_up_form(form: &SignUpForm) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    errors.check(Field::FullName, validate_full_name(&form.full_name));
    errors.check(Field::Email, validate_email(&form.email));
    errors.check(Field::Password, validate_password(&form.password));

    if !form.accept_terms {
        errors.insert(Field::AcceptTerms, ValidationError::TermsNotAccepted);
    }

    errors
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub city: String,
    pub country: String,
}

/// Данные шага онбординга с профилем.
/// Отсутствующие в JSON поля считаются пустыми и ловятся валидацией.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub location: Location,
    pub bio: String,
    pub languages: Vec<String>,
}

pub fn validate_profile_form(form: &ProfileForm) -> ValidationErrors {
    let mut errors = validate_location(&form.location.city, &form.location.country);

    errors.check(Field::Bio, validate_bio(&form.bio));

    if form.languages.is_empty() {
        errors.insert(Field::Languages, ValidationError::LanguagesRequired);
    }

    errors
}
