use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use enum_iterator::all;

/// Функции, которые можно вызвать из шаблона договора.
/// Значение вычисляется в момент формирования документа.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, enum_iterator::Sequence)]
pub enum Function {
    /// Идентификатор договора вида `FS-123456`.
    #[display(fmt = "contract_id")]
    ContractId,

    /// Текущая дата в формате `DD/MM/YYYY`.
    #[display(fmt = "today")]
    Today,

    /// Текущий год.
    #[display(fmt = "year")]
    Year,
}

impl Function {
    /// Исполняет функцию относительно указанного момента времени.
    pub fn execute(&self, now: &DateTime<FixedOffset>) -> String {
        match self {
            Self::ContractId => contract_id(now),
            Self::Today => now.format("%d/%m/%Y").to_string(),
            Self::Year => now.format("%Y").to_string(),
        }
    }
}

impl FromStr for Function {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all::<Function>()
            .find(|f| f.to_string() == s)
            .ok_or_else(|| Error::UnknownFunction(s.to_owned()))
    }
}

/// Последние 6 цифр unix-времени в миллисекундах.
/// Два договора, созданные с разницей кратной 1000 секунд, получат одинаковый ID.
pub fn contract_id(now: &DateTime<FixedOffset>) -> String {
    format!("FS-{:06}", now.timestamp_millis().rem_euclid(1_000_000))
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("unknown function \"{0}\"")]
    UnknownFunction(String),
}
