use std::path::Path;

use anyhow::Context;

use crate::roster::Student;

pub const DEFAULT_COUNT: usize = 14;
pub const MAX_COUNT: usize = 500;

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Clara", "Daniel", "Esme", "Felix", "Grace", "Hugo", "Isla", "Jack", "Mia",
    "Noah", "Olive", "Priya", "Quinn", "Rosa", "Sam", "Tara",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Jones", "Nguyen", "Brown", "Khan", "Wilson", "Taylor", "Chen", "Garcia", "Patel",
    "Murphy", "Singh", "Lopez", "White",
];

pub fn builtin_name_pool() -> Vec<(String, String)> {
    FIRST_NAMES
        .iter()
        .enumerate()
        .map(|(i, first)| {
            (
                (*first).to_string(),
                LAST_NAMES[i % LAST_NAMES.len()].to_string(),
            )
        })
        .collect()
}

/// Deterministic roster for driving the board without a gateway. Ids start
/// at 1 in list order, matching what the homeboard endpoint returns. When
/// `count` exceeds the pool, later passes shift the first/last pairing so
/// the combinations keep varying.
pub fn generate(pool: &[(String, String)], count: usize) -> Vec<Student> {
    (0..count)
        .map(|i| {
            let pass = i / pool.len();
            let (first, _) = &pool[i % pool.len()];
            let (_, last) = &pool[(i + pass) % pool.len()];
            Student {
                id: (i + 1) as i64,
                first_name: first.clone(),
                last_name: last.clone(),
                photo_url: None,
                roll_state: None,
            }
        })
        .collect()
}

/// Parses a name-pool file: one "First Last" per line, blank lines and `#`
/// comments skipped.
pub fn parse_name_pool(path: &Path) -> anyhow::Result<Vec<(String, String)>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read name pool {}", path.display()))?;
    let mut pool = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((first, last)) = trimmed.split_once(char::is_whitespace) else {
            anyhow::bail!("line {}: expected \"First Last\", got {:?}", idx + 1, trimmed);
        };
        let last = last.trim();
        if last.is_empty() {
            anyhow::bail!("line {}: missing last name", idx + 1);
        }
        pool.push((first.to_string(), last.to_string()));
    }
    if pool.is_empty() {
        anyhow::bail!("name pool {} has no usable lines", path.display());
    }
    Ok(pool)
}
