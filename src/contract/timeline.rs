use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DAYS_IN_MONTH: i64 = 30;

/// Длительность свопа между датами `YYYY-MM-DD` в человекочитаемом виде.
/// Месяц считается равным 30 дням. Порядок дат не важен.
pub fn swap_duration(start: &str, end: &str) -> Option<String> {
    let start = NaiveDate::parse_from_str(start.trim(), DATE_FORMAT).ok()?;
    let end = NaiveDate::parse_from_str(end.trim(), DATE_FORMAT).ok()?;

    let days = (end - start).num_days().abs();

    let months = days / DAYS_IN_MONTH;
    let rest = days % DAYS_IN_MONTH;

    let duration = match (months, rest) {
        (0, d) => plural(d, "day", "days"),
        (m, 0) => plural(m, "month", "months"),
        (m, d) => format!(
            "{} and {}",
            plural(m, "month", "months"),
            plural(d, "day", "days")
        ),
    };

    Some(duration)
}

fn plural(n: i64, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}
