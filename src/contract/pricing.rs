use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::form::ContractFormData;

lazy_static! {
    static ref LEADING_NUMBER: Regex = Regex::new(r"^\s*[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?").unwrap();
}

/// Комиссия платформы по-умолчанию, в процентах.
pub const DEFAULT_PLATFORM_FEE_PERCENTAGE: f64 = 4.5;

/// Ежемесячная стоимость для каждой из сторон с учётом комиссии.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub fee_percentage: f64,

    pub property1_rent: f64,
    pub property1_platform_fee: f64,
    pub property1_total: f64,

    pub property2_rent: f64,
    pub property2_platform_fee: f64,
    pub property2_total: f64,
}

impl PricingBreakdown {
    pub fn calculate(form: &ContractFormData) -> Self {
        let fee_percentage = form
            .platform_fee_percentage
            .filter(|p| *p != 0.0 && !p.is_nan())
            .unwrap_or(DEFAULT_PLATFORM_FEE_PERCENTAGE);

        let property1_rent = parse_rent(&form.property1_rent);
        let property2_rent = parse_rent(&form.property2_rent);

        let property1_platform_fee = property1_rent * fee_percentage / 100.0;
        let property2_platform_fee = property2_rent * fee_percentage / 100.0;

        Self {
            fee_percentage,
            property1_rent,
            property1_platform_fee,
            property1_total: property1_rent + property1_platform_fee,
            property2_rent,
            property2_platform_fee,
            property2_total: property2_rent + property2_platform_fee,
        }
    }
}

/// Берёт число из начала строки, как это делают формы ввода: "1200 EUR" это 1200.
/// Если числа нет, аренда считается нулевой.
fn parse_rent(value: &str) -> f64 {
    LEADING_NUMBER
        .find(value)
        .and_then(|m| m.as_str().trim().parse().ok())
        .unwrap_or(0.0)
}
