use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub mod seed;

pub type ServiceResult<T> = Result<T, StudioError>;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("incorrect password")]
    Authentication,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("load failed: {0}")]
    Load(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Debug, Default)]
pub struct DataBag {
    inner: HashMap<String, Value>,
}

impl DataBag {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        self.inner.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
    }

    pub fn remove(&mut self, key: &str) {
        self.inner.remove(key);
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.inner
            .get(key)
            .and_then(|value| value.as_str().map(|s| s.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn to_map(&self) -> Map<String, Value> {
        self.inner
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Per-tab session state handed to the admin shell.
///
/// `session` outlives navigation inside one client tab (the access flag lives
/// there); `context` carries per-request output such as the rendered screen,
/// inline errors and the action log.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    pub session: DataBag,
    pub context: DataBag,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tab closed: drop everything, including the access flag.
    pub fn close(&mut self) {
        self.session.clear();
        self.context.clear();
    }
}

/// Appends to the array under `key` in place, keeping at most `limit`
/// entries (oldest dropped first).
pub fn push_to_array<T: Serialize>(bag: &mut DataBag, key: &str, value: T, limit: usize) {
    let value = serde_json::to_value(value).unwrap_or(Value::Null);
    let slot = bag
        .inner
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    if let Value::Array(items) = slot {
        items.push(value);
        if items.len() > limit {
            let excess = items.len() - limit;
            items.drain(..excess);
        }
    }
}

pub fn ensure(condition: bool, error: StudioError) -> ServiceResult<()> {
    if condition { Ok(()) } else { Err(error) }
}

/// A flat content record with a list-unique numeric id.
///
/// `FIELDS` are the names the draft form edits, in form order; `REQUIRED` is
/// the subset that must be non-empty on commit.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: &'static str;
    const FIELDS: &'static [&'static str];
    const REQUIRED: &'static [&'static str];

    fn id(&self) -> i64;
}

#[async_trait]
pub trait RecordSource<R: Record>: Send + Sync {
    async fn fetch(&self) -> ServiceResult<Vec<R>>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Timestamp id, bumped past `existing` when the clock would collide.
pub fn fresh_id(existing: impl IntoIterator<Item = i64>) -> i64 {
    let now = Utc::now().timestamp_millis();
    let max = existing.into_iter().max().unwrap_or(0);
    if now > max { now } else { max + 1 }
}

fn merge_fields<R: Record>(target: &mut Map<String, Value>, fields: &Map<String, Value>) {
    for (key, value) in fields {
        if key == "id" {
            continue;
        }
        let blank = value.is_null() || value.as_str().is_some_and(str::is_empty);
        if blank && !R::REQUIRED.contains(&key.as_str()) {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
}

pub(crate) fn build_record<R: Record>(id: i64, fields: &Map<String, Value>) -> ServiceResult<R> {
    let mut object = Map::new();
    merge_fields::<R>(&mut object, fields);
    object.insert("id".into(), Value::from(id));
    serde_json::from_value(Value::Object(object))
        .map_err(|err| StudioError::Validation(format!("{}: {err}", R::KIND)))
}

struct StoreState<R> {
    records: Vec<R>,
    load_state: LoadState,
}

/// In-memory ordered list of one content type, loaded from a [`RecordSource`].
///
/// Clones share the same list. Mutations are synchronous; only `load` awaits.
pub struct RecordStore<R: Record> {
    state: Arc<Mutex<StoreState<R>>>,
    source: Arc<dyn RecordSource<R>>,
}

impl<R: Record> Clone for RecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            source: Arc::clone(&self.source),
        }
    }
}

impl<R: Record> RecordStore<R> {
    pub fn new(source: Arc<dyn RecordSource<R>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                records: Vec::new(),
                load_state: LoadState::Idle,
            })),
            source,
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the whole list with what the source yields. A failed fetch
    /// keeps the previous list and records the failure.
    pub async fn load(&self) -> ServiceResult<Vec<R>> {
        self.state().load_state = LoadState::Loading;
        match self.source.fetch().await {
            Ok(records) => {
                let mut state = self.state();
                state.records = records.clone();
                state.load_state = LoadState::Ready;
                Ok(records)
            }
            Err(err) => {
                self.state().load_state = LoadState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    pub fn load_state(&self) -> LoadState {
        self.state().load_state.clone()
    }

    pub fn list(&self) -> Vec<R> {
        self.state().records.clone()
    }

    pub fn len(&self) -> usize {
        self.state().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().records.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<R> {
        self.state().records.iter().find(|r| r.id() == id).cloned()
    }

    pub fn add(&self, fields: &Map<String, Value>) -> ServiceResult<R> {
        let mut state = self.state();
        let id = fresh_id(state.records.iter().map(Record::id));
        let record = build_record::<R>(id, fields)?;
        state.records.push(record.clone());
        Ok(record)
    }

    /// Overwrites exactly the given fields. `Ok(None)` when `id` is unknown.
    pub fn update(&self, id: i64, fields: &Map<String, Value>) -> ServiceResult<Option<R>> {
        let mut state = self.state();
        let Some(slot) = state.records.iter_mut().find(|r| r.id() == id) else {
            return Ok(None);
        };
        let mut object = match serde_json::to_value(&*slot) {
            Ok(Value::Object(object)) => object,
            Ok(_) => return Err(StudioError::Internal(format!("{} is not an object", R::KIND))),
            Err(err) => return Err(StudioError::Internal(err.to_string())),
        };
        merge_fields::<R>(&mut object, fields);
        object.insert("id".into(), Value::from(id));
        let updated: R = serde_json::from_value(Value::Object(object))
            .map_err(|err| StudioError::Validation(format!("{}: {err}", R::KIND)))?;
        *slot = updated.clone();
        Ok(Some(updated))
    }

    /// Typed in-place mutation; `None` when `id` is unknown.
    pub fn modify(&self, id: i64, apply: impl FnOnce(&mut R)) -> Option<R> {
        let mut state = self.state();
        let slot = state.records.iter_mut().find(|r| r.id() == id)?;
        apply(slot);
        Some(slot.clone())
    }

    pub fn remove(&self, id: i64) -> bool {
        let mut state = self.state();
        let before = state.records.len();
        state.records.retain(|r| r.id() != id);
        state.records.len() != before
    }

    /// Unmount: drop every record and return to `Idle`.
    pub fn clear(&self) {
        let mut state = self.state();
        state.records.clear();
        state.load_state = LoadState::Idle;
    }
}
