use std::cmp::Ordering;
use std::sync::RwLock;

use serde_json::Value;

use super::query::{Filter, FindOptions, Sort, SortOrder};
use super::{Document, DocumentStore, StoreError, Stored, new_id, to_json};

struct Entry<D: Document> {
    id: D::Id,
    json: Value,
    document: D,
}

impl<D: Document> Entry<D> {
    fn stored(&self) -> Stored<D> {
        Stored::new(self.id, self.document.clone())
    }
}

/// In-memory document store.
///
/// Intended for tests/dev. Keeps insertion order, which is also the
/// tie-break order for sorted queries.
pub struct InMemoryDocumentStore<D: Document> {
    entries: RwLock<Vec<Entry<D>>>,
}

impl<D: Document> InMemoryDocumentStore<D> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Entry<D>>>, StoreError> {
        self.entries
            .read()
            .map_err(|_| StoreError::Backend(format!("{} lock poisoned", D::COLLECTION)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Entry<D>>>, StoreError> {
        self.entries
            .write()
            .map_err(|_| StoreError::Backend(format!("{} lock poisoned", D::COLLECTION)))
    }
}

impl<D: Document> Default for InMemoryDocumentStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> std::fmt::Debug for InMemoryDocumentStore<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("collection", &D::COLLECTION)
            .finish_non_exhaustive()
    }
}

/// Fails when `json` collides with an entry (other than `except`) on a unique field.
fn check_unique<D: Document>(entries: &[Entry<D>], json: &Value, except: Option<D::Id>) -> Result<(), StoreError> {
    for field in D::UNIQUE_FIELDS {
        let Some(value) = json.get(*field) else { continue };
        let taken = entries
            .iter()
            .filter(|e| Some(e.id) != except)
            .any(|e| e.json.get(*field) == Some(value));
        if taken {
            return Err(StoreError::Duplicate((*field).to_string()));
        }
    }
    Ok(())
}

/// Total order over JSON values: missing/null < string < number < bool.
/// Strings compare bytewise.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::String(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => x.as_bytes().cmp(y.as_bytes()),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn sort_entries<D: Document>(selected: &mut [&Entry<D>], sort: Sort) {
    selected.sort_by(|a, b| {
        let ord = compare_values(a.json.get(sort.field), b.json.get(sort.field));
        match sort.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

#[async_trait::async_trait]
impl<D: Document> DocumentStore<D> for InMemoryDocumentStore<D> {
    async fn find_one(&self, filter: &Filter) -> Result<Option<Stored<D>>, StoreError> {
        let entries = self.read()?;
        Ok(entries.iter().find(|e| filter.matches(&e.json)).map(Entry::stored))
    }

    async fn find(&self, options: &FindOptions) -> Result<Vec<Stored<D>>, StoreError> {
        let entries = self.read()?;
        let mut selected: Vec<&Entry<D>> = entries.iter().filter(|e| options.filter.matches(&e.json)).collect();
        if let Some(sort) = options.sort {
            sort_entries(&mut selected, sort);
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        Ok(selected.into_iter().skip(skip).take(limit).map(Entry::stored).collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let entries = self.read()?;
        Ok(entries.iter().filter(|e| filter.matches(&e.json)).count() as u64)
    }

    async fn get(&self, id: D::Id) -> Result<Option<Stored<D>>, StoreError> {
        let entries = self.read()?;
        Ok(entries.iter().find(|e| e.id == id).map(Entry::stored))
    }

    async fn insert_one(&self, document: D) -> Result<Stored<D>, StoreError> {
        let json = to_json(&document)?;
        let mut entries = self.write()?;
        check_unique(&entries, &json, None)?;

        let entry = Entry {
            id: new_id::<D>(),
            json,
            document,
        };
        let stored = entry.stored();
        entries.push(entry);
        Ok(stored)
    }

    async fn insert_many(&self, documents: Vec<D>) -> Result<Vec<Stored<D>>, StoreError> {
        let mut pending: Vec<Entry<D>> = Vec::with_capacity(documents.len());
        let mut entries = self.write()?;

        for document in documents {
            let json = to_json(&document)?;
            check_unique(&entries, &json, None)?;
            check_unique(&pending, &json, None)?;
            pending.push(Entry {
                id: new_id::<D>(),
                json,
                document,
            });
        }

        let stored = pending.iter().map(Entry::stored).collect();
        entries.extend(pending);
        Ok(stored)
    }

    async fn update_by_id(&self, id: D::Id, document: D) -> Result<Option<Stored<D>>, StoreError> {
        let json = to_json(&document)?;
        let mut entries = self.write()?;
        if !entries.iter().any(|e| e.id == id) {
            return Ok(None);
        }
        check_unique(&entries, &json, Some(id))?;

        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        entry.json = json;
        entry.document = document;
        Ok(Some(entry.stored()))
    }

    async fn delete_by_id(&self, id: D::Id) -> Result<Option<Stored<D>>, StoreError> {
        let mut entries = self.write()?;
        let Some(pos) = entries.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        let entry = entries.remove(pos);
        Ok(Some(Stored::new(entry.id, entry.document)))
    }
}
