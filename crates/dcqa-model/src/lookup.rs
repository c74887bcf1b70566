use std::collections::HashMap;

/// Header positions keyed by exact name with an ASCII case-insensitive fallback.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    exact: HashMap<String, usize>,
    folded: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exact = HashMap::new();
        let mut folded = HashMap::new();
        for (idx, name) in names.into_iter().enumerate() {
            let name = name.as_ref();
            exact.entry(name.to_string()).or_insert(idx);
            folded.entry(name.to_ascii_uppercase()).or_insert(idx);
        }
        Self { exact, folded }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.exact
            .get(name)
            .or_else(|| self.folded.get(&name.to_ascii_uppercase()))
            .copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
