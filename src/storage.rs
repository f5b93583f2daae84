use std::collections::HashMap;

use crate::error::Result;
use crate::todo::TodoItem;

const KEY_TODOS: &str = "todos";

/// String key-value storage that outlives the page, such as `localStorage`.
pub trait PersistentStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store for host use and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub fn load_todos<S: PersistentStore>(store: &S) -> Result<Vec<TodoItem>> {
    match store.get(KEY_TODOS)? {
        Some(raw) => {
            let items: Option<Vec<TodoItem>> = serde_json::from_str(&raw)?;
            Ok(items.unwrap_or_default())
        }
        None => Ok(Vec::new()),
    }
}

/// Rewrite the whole list under its key.
pub fn save_todos<S: PersistentStore>(store: &mut S, items: &[TodoItem]) -> Result<()> {
    let raw = serde_json::to_string(items)?;
    store.set(KEY_TODOS, &raw)?;
    log::debug!("saved {} todos", items.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn missing_key_is_empty() {
        let store = MemoryStore::new();
        assert!(load_todos(&store).unwrap().is_empty());
    }

    #[test]
    fn null_is_empty() {
        let mut store = MemoryStore::new();
        store.set(KEY_TODOS, "null").unwrap();
        assert!(load_todos(&store).unwrap().is_empty());
    }

    #[test]
    fn writes_text_completed_records() {
        let mut store = MemoryStore::new();
        let items = vec![
            TodoItem::new("buy milk"),
            TodoItem {
                text: "write report".to_string(),
                completed: true,
            },
        ];
        save_todos(&mut store, &items).unwrap();
        assert_eq!(
            store.get(KEY_TODOS).unwrap().as_deref(),
            Some(r#"[{"text":"buy milk","completed":false},{"text":"write report","completed":true}]"#)
        );
        assert_eq!(load_todos(&store).unwrap(), items);
    }

    #[test]
    fn corrupt_list_is_surfaced() {
        let mut store = MemoryStore::new();
        store.set(KEY_TODOS, "[{\"text\":").unwrap();
        assert!(matches!(load_todos(&store), Err(Error::Serialization(_))));
    }
}
