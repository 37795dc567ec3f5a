use crate::services::{ensure, DataBag, Record, RecordStore, ServiceResult, StudioError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// Uncommitted field values for one record of type `R`.
#[derive(Clone, Debug)]
pub struct Draft<R: Record> {
    fields: DataBag,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Draft<R> {
    pub fn empty() -> Self {
        let mut fields = DataBag::new();
        for name in R::FIELDS {
            fields.set(name, "");
        }
        Self {
            fields,
            _record: PhantomData,
        }
    }

    /// Shallow copy of the editable fields of `record`; absent optionals
    /// become empty strings.
    pub fn from_record(record: &R) -> ServiceResult<Self> {
        let value =
            serde_json::to_value(record).map_err(|err| StudioError::Internal(err.to_string()))?;
        let mut draft = Self::empty();
        for name in R::FIELDS {
            if let Some(text) = value.get(*name).and_then(Value::as_str) {
                draft.fields.set(name, text);
            }
        }
        Ok(draft)
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> ServiceResult<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    fn set(&mut self, name: &str, value: impl Into<String>) -> ServiceResult<()> {
        if !R::FIELDS.contains(&name) {
            return Err(StudioError::Validation(format!("unknown_field_{name}")));
        }
        self.fields.set(name, value.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.fields.string(name)
    }

    /// First required field that is still an empty string.
    pub fn missing_required(&self) -> Option<&'static str> {
        R::REQUIRED
            .iter()
            .copied()
            .find(|name| self.get(name).map_or(true, |value| value.is_empty()))
    }

    pub fn validate(&self) -> ServiceResult<()> {
        match self.missing_required() {
            Some(name) => Err(StudioError::Validation(format!("{name}_required"))),
            None => Ok(()),
        }
    }

    pub fn fields(&self) -> Map<String, Value> {
        self.fields.to_map()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "id", rename_all = "lowercase")]
pub enum DraftMode {
    #[default]
    Create,
    Edit(i64),
}

/// What a successful commit did to the store.
#[derive(Clone, Debug, PartialEq)]
pub enum Committed<R> {
    Created(R),
    Updated(R),
    /// The record being edited was removed before the commit landed.
    Stale { id: i64 },
}

impl<R: Serialize> Committed<R> {
    pub fn outcome(&self) -> &'static str {
        match self {
            Committed::Created(_) => "created",
            Committed::Updated(_) => "updated",
            Committed::Stale { .. } => "stale",
        }
    }

    pub fn record(&self) -> Option<&R> {
        match self {
            Committed::Created(record) | Committed::Updated(record) => Some(record),
            Committed::Stale { .. } => None,
        }
    }
}

/// Dialog-backed editor for one record type: begin, edit fields, then
/// commit into a [`RecordStore`] or cancel.
#[derive(Clone, Debug)]
pub struct DraftForm<R: Record> {
    draft: Draft<R>,
    mode: DraftMode,
    open: bool,
}

impl<R: Record> Default for DraftForm<R> {
    fn default() -> Self {
        Self {
            draft: Draft::empty(),
            mode: DraftMode::Create,
            open: false,
        }
    }
}

impl<R: Record> DraftForm<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> DraftMode {
        self.mode
    }

    pub fn draft(&self) -> &Draft<R> {
        &self.draft
    }

    pub fn begin(&mut self, record: Option<&R>) -> ServiceResult<&Draft<R>> {
        match record {
            Some(existing) => {
                self.draft = Draft::from_record(existing)?;
                self.mode = DraftMode::Edit(existing.id());
            }
            None => {
                self.draft = Draft::empty();
                self.mode = DraftMode::Create;
            }
        }
        self.open = true;
        Ok(&self.draft)
    }

    pub fn field(&mut self, name: &str, value: impl Into<String>) -> ServiceResult<&Draft<R>> {
        self.draft.set(name, value)?;
        Ok(&self.draft)
    }

    /// Blocked (form left untouched) while a required field is empty.
    pub fn commit(&mut self, store: &RecordStore<R>) -> ServiceResult<Committed<R>> {
        ensure(self.open, StudioError::Validation("form_closed".into()))?;
        self.draft.validate()?;
        let fields = self.draft.fields();
        let committed = match self.mode {
            DraftMode::Create => Committed::Created(store.add(&fields)?),
            DraftMode::Edit(id) => match store.update(id, &fields)? {
                Some(record) => Committed::Updated(record),
                None => Committed::Stale { id },
            },
        };
        self.reset();
        Ok(committed)
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.draft = Draft::empty();
        self.mode = DraftMode::Create;
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BlogPost, PortfolioItem, TeamMember};
    use crate::services::seed::seed_source;

    async fn store<R: crate::services::seed::Seeded>() -> RecordStore<R> {
        let store = RecordStore::new(seed_source::<R>());
        store.load().await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_commit_appends_and_closes() {
        let posts = store::<BlogPost>().await;
        let mut form = DraftForm::<BlogPost>::new();
        form.begin(None).unwrap();
        assert!(form.is_open());
        form.field("title", "A").unwrap();
        form.field("excerpt", "e").unwrap();
        form.field("content", "c").unwrap();
        form.field("publish_date", "2024-02-01").unwrap();
        form.field("author", "X").unwrap();

        let committed = form.commit(&posts).unwrap();
        let post = committed.record().unwrap();
        assert_eq!(committed.outcome(), "created");
        assert_eq!(post.title, "A");
        assert_eq!(post.publish_date, "2024-02-01");
        assert_eq!(posts.len(), 3);
        assert!(!form.is_open());
        assert_eq!(form.draft().get("title").unwrap(), "");
    }

    #[tokio::test]
    async fn missing_required_field_blocks_submit() {
        let posts = store::<BlogPost>().await;
        let mut form = DraftForm::<BlogPost>::new();
        form.begin(None).unwrap();
        form.field("title", "Only a title").unwrap();

        let err = form.commit(&posts).unwrap_err();
        assert!(matches!(err, StudioError::Validation(ref key) if key == "excerpt_required"));
        assert!(form.is_open());
        assert_eq!(form.draft().get("title").unwrap(), "Only a title");
        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn edit_prefills_and_updates_in_place() {
        let members = store::<TeamMember>().await;
        let existing = members.get(2).unwrap();
        let mut form = DraftForm::<TeamMember>::new();
        let draft = form.begin(Some(&existing)).unwrap();
        assert_eq!(draft.get("name").unwrap(), "Дмитрий Соколов");
        assert_eq!(form.mode(), DraftMode::Edit(2));

        form.field("role", "Арт-директор").unwrap();
        let committed = form.commit(&members).unwrap();
        assert_eq!(committed.outcome(), "updated");
        let updated = members.get(2).unwrap();
        assert_eq!(updated.role, "Арт-директор");
        assert_eq!(updated.experience, existing.experience);
        assert_eq!(members.list()[1].id, 2);
    }

    #[tokio::test]
    async fn editing_portfolio_item_keeps_attachments() {
        let items = store::<PortfolioItem>().await;
        let first = items.get(1).unwrap();
        let mut form = DraftForm::<PortfolioItem>::new();
        form.begin(Some(&first)).unwrap();
        form.field("client", "TechCorp Global").unwrap();
        form.commit(&items).unwrap();
        assert_eq!(items.get(1).unwrap().attachments.len(), 2);
    }

    #[tokio::test]
    async fn edit_of_removed_record_is_stale() {
        let posts = store::<BlogPost>().await;
        let mut form = DraftForm::<BlogPost>::new();
        form.begin(posts.get(1).as_ref()).unwrap();
        posts.remove(1);
        assert_eq!(form.commit(&posts).unwrap(), Committed::Stale { id: 1 });
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn cancel_discards_without_mutation() {
        let posts = store::<BlogPost>().await;
        let mut form = DraftForm::<BlogPost>::new();
        form.begin(posts.get(1).as_ref()).unwrap();
        form.field("title", "Never saved").unwrap();
        form.cancel();
        assert!(!form.is_open());
        assert_ne!(posts.get(1).unwrap().title, "Never saved");
        assert!(form.commit(&posts).is_err());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut form = DraftForm::<BlogPost>::new();
        form.begin(None).unwrap();
        assert!(form.field("id", "5").is_err());
        assert!(Draft::<BlogPost>::empty().with("tags", "x").is_err());
    }
}
