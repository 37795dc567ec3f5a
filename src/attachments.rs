use crate::drafts::Draft;
use crate::records::{PortfolioAttachment, PortfolioItem};
use crate::services::{build_record, fresh_id, RecordStore, ServiceResult, StudioError};

/// Nested draft form that adds files to one portfolio item at a time.
#[derive(Clone, Debug)]
pub struct AttachmentForm {
    parent: Option<i64>,
    draft: Draft<PortfolioAttachment>,
}

impl Default for AttachmentForm {
    fn default() -> Self {
        Self {
            parent: None,
            draft: Draft::empty(),
        }
    }
}

impl AttachmentForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parent(&self) -> Option<i64> {
        self.parent
    }

    pub fn is_open(&self) -> bool {
        self.parent.is_some()
    }

    pub fn draft(&self) -> &Draft<PortfolioAttachment> {
        &self.draft
    }

    pub fn begin(
        &mut self,
        items: &RecordStore<PortfolioItem>,
        item_id: i64,
    ) -> ServiceResult<&Draft<PortfolioAttachment>> {
        if items.get(item_id).is_none() {
            return Err(StudioError::NotFound(format!("portfolio_item_{item_id}")));
        }
        self.parent = Some(item_id);
        self.draft = Draft::empty();
        Ok(&self.draft)
    }

    pub fn field(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> ServiceResult<&Draft<PortfolioAttachment>> {
        self.draft = self.draft.clone().with(name, value)?;
        Ok(&self.draft)
    }

    /// Appends the attachment to the parent item only; ids are unique among
    /// that item's attachments.
    pub fn commit(
        &mut self,
        items: &RecordStore<PortfolioItem>,
    ) -> ServiceResult<PortfolioAttachment> {
        let item_id = self
            .parent
            .ok_or_else(|| StudioError::Validation("form_closed".into()))?;
        self.draft.validate()?;
        let fields = self.draft.fields();

        let mut outcome: ServiceResult<PortfolioAttachment> =
            Err(StudioError::NotFound(format!("portfolio_item_{item_id}")));
        items.modify(item_id, |item| {
            let id = fresh_id(item.attachments.iter().map(|a| a.id));
            outcome = build_record::<PortfolioAttachment>(id, &fields).map(|attachment| {
                item.attachments.push(attachment.clone());
                attachment
            });
        });
        let attachment = outcome?;
        self.cancel();
        Ok(attachment)
    }

    pub fn cancel(&mut self) {
        self.parent = None;
        self.draft = Draft::empty();
    }
}

pub fn attachments_of(items: &RecordStore<PortfolioItem>, item_id: i64) -> Vec<PortfolioAttachment> {
    items
        .get(item_id)
        .map(|item| item.attachments)
        .unwrap_or_default()
}

/// Drops one attachment from one item; `false` when either id is unknown.
pub fn remove_attachment(
    items: &RecordStore<PortfolioItem>,
    item_id: i64,
    attachment_id: i64,
) -> bool {
    let mut removed = false;
    items.modify(item_id, |item| {
        let before = item.attachments.len();
        item.attachments.retain(|a| a.id != attachment_id);
        removed = item.attachments.len() != before;
    });
    removed
}
