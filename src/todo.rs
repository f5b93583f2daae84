use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{load_todos, save_todos, PersistentStore};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub text: String,
    pub completed: bool,
}

impl TodoItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
        }
    }
}

/// Ordered to-do list, rewritten to `store` after every change.
pub struct TodoList<S: PersistentStore> {
    store: S,
    items: Vec<TodoItem>,
}

impl<S: PersistentStore> TodoList<S> {
    /// Read the saved list once; a store without one starts empty.
    pub fn load(store: S) -> Result<Self> {
        let items = load_todos(&store)?;
        log::debug!("loaded {} todos", items.len());
        Ok(Self { store, items })
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    /// Append an open item. Empty text is ignored and returns `false`.
    pub fn add(&mut self, text: &str) -> Result<bool> {
        if text.is_empty() {
            return Ok(false);
        }
        self.items.push(TodoItem::new(text));
        self.save()?;
        Ok(true)
    }

    /// Flip the completed mark. Out-of-range indexes return `false`.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        match self.items.get_mut(index) {
            Some(item) => {
                item.completed = !item.completed;
                self.save()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove(&mut self, index: usize) -> Result<Option<TodoItem>> {
        if index >= self.items.len() {
            return Ok(None);
        }
        let removed = self.items.remove(index);
        self.save()?;
        Ok(Some(removed))
    }

    fn save(&mut self) -> Result<()> {
        save_todos(&mut self.store, &self.items)
    }
}
