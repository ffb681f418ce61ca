//! Keyed joins with cardinality checks

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::error::{LifeTableError, Result};
use crate::series::{GroupKey, Label};

/// (group, age) join key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct AgeKey {
    pub group: GroupKey,
    pub age: u32,
}

impl AgeKey {
    pub fn new(group: GroupKey, age: u32) -> Self {
        Self { group, age }
    }
}

impl fmt::Display for AgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} age {}", self.group, self.age)
    }
}

/// (group, age, cause) join key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct CauseKey {
    pub age_key: AgeKey,
    pub cause: Label,
}

impl fmt::Display for CauseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cause {}", self.age_key, self.cause)
    }
}

/// Index entries by key, failing on the first repeated key
pub(crate) fn index_unique<K, V, I>(
    entries: I,
    stage: &'static str,
) -> Result<HashMap<K, V>>
where
    K: Hash + Eq + fmt::Display,
    I: IntoIterator<Item = (K, V)>,
{
    let mut index = HashMap::new();
    for (key, value) in entries {
        if index.contains_key(&key) {
            return Err(LifeTableError::JoinCardinality {
                stage,
                key: key.to_string(),
            });
        }
        index.insert(key, value);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_unique_rejects_repeats() {
        let entries = vec![
            (AgeKey::new(GroupKey::default(), 0), 1),
            (AgeKey::new(GroupKey::default(), 1), 2),
            (AgeKey::new(GroupKey::default(), 0), 3),
        ];
        let err = index_unique(entries, "age").unwrap_err();
        match err {
            LifeTableError::JoinCardinality { stage, key } => {
                assert_eq!(stage, "age");
                assert_eq!(key, "{} age 0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_index_unique_accepts_distinct_keys() {
        let index = index_unique(
            [
                (AgeKey::new(GroupKey::default(), 0), "a"),
                (AgeKey::new(GroupKey::default(), 1), "b"),
            ],
            "age",
        )
        .unwrap();
        assert_eq!(index.len(), 2);
    }
}
