use std::str::FromStr;

use enum_iterator::all;
use serde::{Deserialize, Serialize};

/// Данные формы договора.
/// Генератор ничего не проверяет: пустые значения попадут в документ как есть.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractFormData {
    pub tenant1_name: String,
    pub tenant1_email: String,
    pub tenant1_phone: String,

    pub tenant2_name: String,
    pub tenant2_email: String,
    pub tenant2_phone: String,

    pub property1_address: String,
    pub property1_rent: String,
    pub property1_description: String,

    pub property2_address: String,
    pub property2_rent: String,
    pub property2_description: String,

    pub start_date: String,
    pub end_date: String,
    pub duration: String,

    pub special_terms: String,

    /// Комиссия платформы в процентах, учитывается только при расчёте цены.
    pub platform_fee_percentage: Option<f64>,
}

impl ContractFormData {
    pub fn value(&self, name: FieldName) -> &str {
        match name {
            FieldName::Tenant1Name => &self.tenant1_name,
            FieldName::Tenant1Email => &self.tenant1_email,
            FieldName::Tenant1Phone => &self.tenant1_phone,
            FieldName::Tenant2Name => &self.tenant2_name,
            FieldName::Tenant2Email => &self.tenant2_email,
            FieldName::Tenant2Phone => &self.tenant2_phone,
            FieldName::Property1Address => &self.property1_address,
            FieldName::Property1Rent => &self.property1_rent,
            FieldName::Property1Description => &self.property1_description,
            FieldName::Property2Address => &self.property2_address,
            FieldName::Property2Rent => &self.property2_rent,
            FieldName::Property2Description => &self.property2_description,
            FieldName::StartDate => &self.start_date,
            FieldName::EndDate => &self.end_date,
            FieldName::Duration => &self.duration,
            FieldName::SpecialTerms => &self.special_terms,
        }
    }

    pub fn set(&mut self, name: FieldName, value: String) {
        let slot = match name {
            FieldName::Tenant1Name => &mut self.tenant1_name,
            FieldName::Tenant1Email => &mut self.tenant1_email,
            FieldName::Tenant1Phone => &mut self.tenant1_phone,
            FieldName::Tenant2Name => &mut self.tenant2_name,
            FieldName::Tenant2Email => &mut self.tenant2_email,
            FieldName::Tenant2Phone => &mut self.tenant2_phone,
            FieldName::Property1Address => &mut self.property1_address,
            FieldName::Property1Rent => &mut self.property1_rent,
            FieldName::Property1Description => &mut self.property1_description,
            FieldName::Property2Address => &mut self.property2_address,
            FieldName::Property2Rent => &mut self.property2_rent,
            FieldName::Property2Description => &mut self.property2_description,
            FieldName::StartDate => &mut self.start_date,
            FieldName::EndDate => &mut self.end_date,
            FieldName::Duration => &mut self.duration,
            FieldName::SpecialTerms => &mut self.special_terms,
        };
        *slot = value;
    }
}

/// Все поля формы, которые можно подставить в шаблон.
/// Отображаемое значение совпадает с именем переменной в шаблоне.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    std::hash::Hash,
    derive_more::Display,
    enum_iterator::Sequence,
)]
pub enum FieldName {
    #[display(fmt = "tenant1_name")]
    Tenant1Name,
    #[display(fmt = "tenant1_email")]
    Tenant1Email,
    #[display(fmt = "tenant1_phone")]
    Tenant1Phone,
    #[display(fmt = "tenant2_name")]
    Tenant2Name,
    #[display(fmt = "tenant2_email")]
    Tenant2Email,
    #[display(fmt = "tenant2_phone")]
    Tenant2Phone,
    #[display(fmt = "property1_address")]
    Property1Address,
    #[display(fmt = "property1_rent")]
    Property1Rent,
    #[display(fmt = "property1_description")]
    Property1Description,
    #[display(fmt = "property2_address")]
    Property2Address,
    #[display(fmt = "property2_rent")]
    Property2Rent,
    #[display(fmt = "property2_description")]
    Property2Description,
    #[display(fmt = "start_date")]
    StartDate,
    #[display(fmt = "end_date")]
    EndDate,
    #[display(fmt = "duration")]
    Duration,
    #[display(fmt = "special_terms")]
    SpecialTerms,
}

impl FieldName {
    /// Человекочитаемое название поля для запроса у пользователя.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tenant1Name => "Party A full name",
            Self::Tenant1Email => "Party A email",
            Self::Tenant1Phone => "Party A phone",
            Self::Tenant2Name => "Party B full name",
            Self::Tenant2Email => "Party B email",
            Self::Tenant2Phone => "Party B phone",
            Self::Property1Address => "Party A property address",
            Self::Property1Rent => "Party A monthly rent (EUR)",
            Self::Property1Description => "Party A property description",
            Self::Property2Address => "Party B property address",
            Self::Property2Rent => "Party B monthly rent (EUR)",
            Self::Property2Description => "Party B property description",
            Self::StartDate => "Swap start date",
            Self::EndDate => "Swap end date",
            Self::Duration => "Swap duration",
            Self::SpecialTerms => "Special terms",
        }
    }
}

impl FromStr for FieldName {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all::<FieldName>()
            .find(|f| f.to_string() == s)
            .ok_or_else(|| UnknownField(s.to_owned()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown contract field \"{0}\"")]
pub struct UnknownField(pub String);
