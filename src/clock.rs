use chrono::{DateTime, FixedOffset, Local};

/// Источник текущего времени.
/// Всё, что зависит от "сейчас", получает время только через него.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Системные часы в локальной временной зоне.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().into()
    }
}

/// Часы, которые всегда показывают одно и то же время.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
