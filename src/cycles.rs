use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::{Deserialize, Serialize};

/// Максимальное количество участников в одной цепочке обмена.
pub const MAX_CYCLE_LEN: usize = 4;

/// Поиск пользователя в компактном виде.
/// Удобства задаются битовой маской.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SearchEntry {
    pub user_id: String,
    pub city_id: u8,
    pub property_bits: u8,
    pub min_rooms: u8,
    pub max_price: u32,
    pub amenities: u64,
    pub date_start: u32,
    pub date_end: u32,
}

impl SearchEntry {
    /// Подходит ли квартира под этот поиск.
    /// Город должен совпадать, все запрошенные удобства должны быть в наличии.
    pub fn is_satisfied_by(&self, property: &PropertyEntry) -> bool {
        self.city_id == property.city_id
            && property.rooms >= self.min_rooms
            && property.price <= self.max_price
            && self.amenities & property.amenities == self.amenities
    }
}

/// Квартира, которую пользователь готов отдать в обмен.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PropertyEntry {
    pub user_id: String,
    pub city_id: u8,
    pub rooms: u8,
    pub price: u32,
    pub amenities: u64,
}

/// Снимок доски в виде, в котором он хранится в файле.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct BoardSnapshot {
    pub searches: Vec<SearchEntry>,
    pub properties: Vec<PropertyEntry>,
}

/// Поиски и квартиры пользователей.
/// У каждого пользователя не больше одного поиска и одной квартиры, новые записи заменяют старые.
#[derive(Debug, Default, Clone)]
pub struct SwapBoard {
    searches: BTreeMap<String, SearchEntry>,
    properties: BTreeMap<String, PropertyEntry>,
}

/// Замкнутая цепочка: первый пользователь повторяется в конце.
pub type Cycle = Vec<String>;

impl SwapBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_search(&mut self, entry: SearchEntry) {
        self.searches.insert(entry.user_id.clone(), entry);
    }

    pub fn add_property(&mut self, entry: PropertyEntry) {
        self.properties.insert(entry.user_id.clone(), entry);
    }

    /// Для каждого пользователя список тех, чья квартира подходит под его поиск.
    fn adjacency(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut adj: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for (u, search) in self.searches.iter() {
            for (v, property) in self.properties.iter() {
                if u == v {
                    continue;
                }
                if search.is_satisfied_by(property) {
                    adj.entry(u.as_str()).or_default().push(v.as_str());
                }
            }
        }

        adj
    }

    /// Находит все цепочки обмена длиной от 2 до 4 участников.
    /// Цепочки, отличающиеся только точкой старта, считаются одной.
    pub fn find_cycles(&self) -> Vec<Cycle> {
        let adj = self.adjacency();

        debug!(
            "Search cycles among {} users with matching properties",
            adj.len()
        );

        let mut seen = BTreeSet::new();
        let mut cycles = Vec::new();

        for start in adj.keys() {
            let mut path = vec![*start];
            walk(&adj, &mut path, &mut seen, &mut cycles);
        }

        cycles
    }
}

fn walk<'a>(
    adj: &BTreeMap<&'a str, Vec<&'a str>>,
    path: &mut Vec<&'a str>,
    seen: &mut BTreeSet<String>,
    cycles: &mut Vec<Cycle>,
) {
    if path.len() > MAX_CYCLE_LEN {
        return;
    }

    let start = path[0];
    let last = path[path.len() - 1];

    let Some(next) = adj.get(last) else {
        return;
    };

    for &n in next.iter() {
        if n == start && path.len() >= 2 {
            let mut cycle: Cycle = path.iter().map(|u| u.to_string()).collect();
            cycle.push(start.to_owned());

            if seen.insert(canonical_key(&cycle)) {
                cycles.push(cycle);
            }
        } else if !path.contains(&n) {
            path.push(n);
            walk(adj, path, seen, cycles);
            path.pop();
        }
    }
}

/// Ключ цепочки, не зависящий от того, с кого она начинается.
fn canonical_key(cycle: &[String]) -> String {
    if cycle.is_empty() {
        return String::new();
    }

    let open = &cycle[..cycle.len() - 1];

    let idx = open
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or_default();

    let mut rotated = open[idx..].to_vec();
    rotated.extend_from_slice(&open[..idx]);

    rotated.join("->")
}

impl From<BoardSnapshot> for SwapBoard {
    fn from(snapshot: BoardSnapshot) -> Self {
        let mut board = SwapBoard::new();

        for s in snapshot.searches {
            board.add_search(s);
        }

        for p in snapshot.properties {
            board.add_property(p);
        }

        board
    }
}
