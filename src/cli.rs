use enum_iterator::all;
use inquire::{
    validator::Validation, Confirm, CustomUserError, DateSelect, Password, PasswordDisplayMode,
    Text,
};

use flatswap::{
    contract::{swap_duration, ContractFormData, FieldName},
    validation::{
        self, password_strength, validate_email, validate_full_name, validate_password,
        validate_phone_number, validate_verification_code, SignUpForm,
    },
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Превращает проверку поля в валидатор для inquire.
fn validator(
    check: fn(&str) -> validation::Result,
) -> impl Fn(&str) -> Result<Validation, CustomUserError> + Clone {
    move |s: &str| {
        Ok(match check(s) {
            Ok(()) => Validation::Valid,
            Err(e) => Validation::Invalid(e.to_string().into()),
        })
    }
}

fn required(s: &str) -> Result<Validation, CustomUserError> {
    if s.trim().is_empty() {
        return Ok(Validation::Invalid("required".into()));
    }
    Ok(Validation::Valid)
}

fn rent(s: &str) -> Result<Validation, CustomUserError> {
    match s.trim().parse::<f64>() {
        Ok(v) if v > 0.0 => Ok(Validation::Valid),
        _ => Ok(Validation::Invalid("Please enter a valid rent amount".into())),
    }
}

/// Запрашивает у пользователя поля договора, которые используются в шаблоне.
/// Уже заполненные поля не запрашиваются.
pub fn ask_contract(fields: &[FieldName], form: &mut ContractFormData) -> anyhow::Result<()> {
    for name in all::<FieldName>().filter(|f| fields.contains(f)) {
        if !form.value(name).is_empty() {
            continue;
        }

        let value = ask_contract_field(name, form)?;
        form.set(name, value);
    }

    Ok(())
}

fn ask_contract_field(name: FieldName, form: &ContractFormData) -> anyhow::Result<String> {
    let label = name.label();

    let value = match name {
        FieldName::StartDate | FieldName::EndDate => DateSelect::new(label)
            .prompt()?
            .format(DATE_FORMAT)
            .to_string(),
        FieldName::Duration => match swap_duration(&form.start_date, &form.end_date) {
            Some(d) => d,
            None => Text::new(label).with_validator(required).prompt()?,
        },
        FieldName::Tenant1Name | FieldName::Tenant2Name => Text::new(label)
            .with_validator(validator(validate_full_name))
            .prompt()?,
        FieldName::Tenant1Email | FieldName::Tenant2Email => Text::new(label)
            .with_validator(validator(validate_email))
            .prompt()?,
        FieldName::Tenant1Phone | FieldName::Tenant2Phone => Text::new(label)
            .with_validator(validator(validate_phone_number))
            .with_help_message("Optional")
            .prompt()?,
        FieldName::Property1Rent | FieldName::Property2Rent => {
            Text::new(label).with_validator(rent).prompt()?
        }
        FieldName::SpecialTerms => Text::new(label)
            .with_help_message("Leave empty if there are none")
            .prompt()?,
        _ => Text::new(label).with_validator(required).prompt()?,
    };

    Ok(value)
}

pub fn ask_email() -> anyhow::Result<String> {
    let email = Text::new("Email")
        .with_validator(validator(validate_email))
        .prompt()?;

    Ok(email)
}

/// Пароль для входа, сложность не проверяется.
pub fn ask_password() -> anyhow::Result<String> {
    let password = Password::new("Password")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_validator(required)
        .prompt()?;

    Ok(password)
}

fn ask_new_password() -> anyhow::Result<String> {
    let password = Password::new("Password")
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_validator(|s: &str| {
            Ok(match validate_password(s) {
                Ok(()) => Validation::Valid,
                Err(e) => Validation::Invalid(
                    format!("{} (strength: {})", e, password_strength(s).feedback()).into(),
                ),
            })
        })
        .with_help_message("At least 8 characters with upper and lower case letters and a number")
        .prompt()?;

    Ok(password)
}

pub fn ask_sign_up() -> anyhow::Result<SignUpForm> {
    let full_name = Text::new("Full name")
        .with_validator(validator(validate_full_name))
        .prompt()?;

    let email = ask_email()?;

    let password = ask_new_password()?;

    let accept_terms = Confirm::new("Do you accept the terms and conditions?")
        .with_default(false)
        .prompt()?;

    Ok(SignUpForm {
        full_name,
        email,
        password,
        accept_terms,
    })
}

pub fn ask_verification_code() -> anyhow::Result<String> {
    let code = Text::new("Verification code from the email")
        .with_validator(validator(validate_verification_code))
        .prompt()?;

    Ok(code)
}

pub fn ask_callback_url() -> anyhow::Result<String> {
    let url = Text::new("URL you were redirected to")
        .with_validator(required)
        .prompt()?;

    Ok(url)
}
