use crate::attachments::{self, AttachmentForm};
use crate::drafts::{Committed, DraftForm};
use crate::logging::log_action;
use crate::manage_contacts::{self, Clipboard};
use crate::records::{
    BlogPost, ContactRequest, ContactStatus, PortfolioAttachment, PortfolioItem, Service,
    TeamMember,
};
use crate::security::AccessGate;
use crate::services::seed::seed_source;
use crate::services::{Record, RecordSource, RecordStore, ServiceResult, SessionContext, StudioError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const SCREEN_KEY: &str = "admin_screen";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminTab {
    #[default]
    Portfolio,
    Blog,
    Team,
    Services,
    Contacts,
}

impl AdminTab {
    pub const ALL: [AdminTab; 5] = [
        AdminTab::Portfolio,
        AdminTab::Blog,
        AdminTab::Team,
        AdminTab::Services,
        AdminTab::Contacts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AdminTab::Portfolio => "portfolio",
            AdminTab::Blog => "blog",
            AdminTab::Team => "team",
            AdminTab::Services => "services",
            AdminTab::Contacts => "contacts",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            AdminTab::Portfolio => "Портфолио",
            AdminTab::Blog => "Блог",
            AdminTab::Team => "Команда",
            AdminTab::Services => "Услуги",
            AdminTab::Contacts => "Заявки",
        }
    }
}

impl fmt::Display for AdminTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminTab {
    type Err = StudioError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AdminTab::ALL
            .into_iter()
            .find(|tab| tab.as_str() == value)
            .ok_or_else(|| StudioError::NotFound(format!("tab_{value}")))
    }
}

/// One content screen: the store it renders, its edit dialog and the record
/// currently open in the detail view.
pub struct Screen<R: Record> {
    pub store: RecordStore<R>,
    pub form: DraftForm<R>,
    detail: Option<i64>,
}

impl<R: Record> Screen<R> {
    pub fn new(source: Arc<dyn RecordSource<R>>) -> Self {
        Self {
            store: RecordStore::new(source),
            form: DraftForm::new(),
            detail: None,
        }
    }

    pub async fn mount(&mut self) -> ServiceResult<usize> {
        self.store.load().await.map(|records| records.len())
    }

    pub fn unmount(&mut self) {
        self.store.clear();
        self.form.cancel();
        self.detail = None;
    }

    pub fn detail(&self) -> Option<R> {
        self.detail.and_then(|id| self.store.get(id))
    }

    pub fn open_detail(&mut self, id: i64) -> ServiceResult<R> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| StudioError::NotFound(format!("{}_{id}", R::KIND)))?;
        self.detail = Some(id);
        Ok(record)
    }

    /// Closes the detail view if it shows record `id`.
    pub fn close_detail(&mut self, id: i64) -> bool {
        if self.detail != Some(id) {
            return false;
        }
        self.detail = None;
        true
    }

    /// Runs one full dialog round: begin (create when `id` is `None`), set
    /// every field, commit.
    pub fn submit(
        &mut self,
        id: Option<i64>,
        fields: &Map<String, Value>,
    ) -> ServiceResult<Committed<R>> {
        let existing = match id {
            Some(id) => Some(
                self.store
                    .get(id)
                    .ok_or_else(|| StudioError::NotFound(format!("{}_{id}", R::KIND)))?,
            ),
            None => None,
        };
        self.form.begin(existing.as_ref())?;
        for (name, value) in fields {
            let text = match value {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                _ => return Err(StudioError::Validation(format!("{name}_not_text"))),
            };
            self.form.field(name, text)?;
        }
        self.form.commit(&self.store)
    }

    pub fn view(&self) -> Value {
        json!({
            "kind": R::KIND,
            "load_state": self.store.load_state(),
            "count": self.store.len(),
            "records": self.store.list(),
            "form": {
                "open": self.form.is_open(),
                "mode": self.form.mode(),
                "draft": self.form.draft().fields(),
            },
            "detail": self.detail(),
        })
    }
}

/// Type-erased access to a [`Screen`] so the shell can route by tab.
#[async_trait]
trait ScreenOps: Send {
    async fn mount_screen(&mut self) -> ServiceResult<usize>;
    fn unmount_screen(&mut self);
    fn kind(&self) -> &'static str;
    fn records_json(&self) -> Vec<Value>;
    fn submit_json(
        &mut self,
        id: Option<i64>,
        fields: &Map<String, Value>,
    ) -> ServiceResult<(&'static str, Value)>;
    fn remove_record(&mut self, id: i64) -> bool;
    fn open_detail_json(&mut self, id: i64) -> ServiceResult<Value>;
    fn close_detail_view(&mut self, id: i64) -> bool;
    fn record_count(&self) -> usize;
    fn render(&self) -> Value;
}

#[async_trait]
impl<R: Record> ScreenOps for Screen<R> {
    async fn mount_screen(&mut self) -> ServiceResult<usize> {
        self.mount().await
    }

    fn unmount_screen(&mut self) {
        self.unmount();
    }

    fn kind(&self) -> &'static str {
        R::KIND
    }

    fn records_json(&self) -> Vec<Value> {
        self.store
            .list()
            .iter()
            .map(|record| serde_json::to_value(record).unwrap_or(Value::Null))
            .collect()
    }

    fn submit_json(
        &mut self,
        id: Option<i64>,
        fields: &Map<String, Value>,
    ) -> ServiceResult<(&'static str, Value)> {
        let committed = self.submit(id, fields)?;
        let record = serde_json::to_value(committed.record())
            .map_err(|err| StudioError::Internal(err.to_string()))?;
        Ok((committed.outcome(), record))
    }

    fn remove_record(&mut self, id: i64) -> bool {
        if self.detail == Some(id) {
            self.detail = None;
        }
        self.store.remove(id)
    }

    fn open_detail_json(&mut self, id: i64) -> ServiceResult<Value> {
        let record = self.open_detail(id)?;
        serde_json::to_value(record).map_err(|err| StudioError::Internal(err.to_string()))
    }

    fn close_detail_view(&mut self, id: i64) -> bool {
        self.close_detail(id)
    }

    fn record_count(&self) -> usize {
        self.store.len()
    }

    fn render(&self) -> Value {
        self.view()
    }
}

/// Admin area: one selected tab, exactly one mounted screen.
///
/// Every operation checks the access gate against the caller's
/// [`SessionContext`]. Switching tabs unmounts the previous screen, so its
/// unsaved and saved edits are gone and the next visit reloads the seed.
pub struct AdminShell {
    gate: AccessGate,
    selected: AdminTab,
    mounted: bool,
    pub portfolio: Screen<PortfolioItem>,
    pub attachments: AttachmentForm,
    pub blog: Screen<BlogPost>,
    pub team: Screen<TeamMember>,
    pub services: Screen<Service>,
    pub contacts: Screen<ContactRequest>,
}

impl AdminShell {
    pub fn new(gate: AccessGate) -> Self {
        Self {
            gate,
            selected: AdminTab::default(),
            mounted: false,
            portfolio: Screen::new(seed_source()),
            attachments: AttachmentForm::new(),
            blog: Screen::new(seed_source()),
            team: Screen::new(seed_source()),
            services: Screen::new(seed_source()),
            contacts: Screen::new(seed_source()),
        }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn selected(&self) -> AdminTab {
        self.selected
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn screen(&self, tab: AdminTab) -> &dyn ScreenOps {
        match tab {
            AdminTab::Portfolio => &self.portfolio,
            AdminTab::Blog => &self.blog,
            AdminTab::Team => &self.team,
            AdminTab::Services => &self.services,
            AdminTab::Contacts => &self.contacts,
        }
    }

    fn screen_mut(&mut self, tab: AdminTab) -> &mut dyn ScreenOps {
        match tab {
            AdminTab::Portfolio => &mut self.portfolio,
            AdminTab::Blog => &mut self.blog,
            AdminTab::Team => &mut self.team,
            AdminTab::Services => &mut self.services,
            AdminTab::Contacts => &mut self.contacts,
        }
    }

    fn unmount_current(&mut self) {
        if !self.mounted {
            return;
        }
        let current = self.selected;
        self.screen_mut(current).unmount_screen();
        if current == AdminTab::Portfolio {
            self.attachments.cancel();
        }
        self.mounted = false;
    }

    /// Re-selecting the mounted tab is a no-op; only a real switch unmounts.
    pub async fn select(&mut self, ctx: &mut SessionContext, tab: AdminTab) -> ServiceResult<usize> {
        self.gate.ensure_unlocked(ctx)?;
        if self.mounted && self.selected == tab {
            return Ok(self.screen(tab).record_count());
        }
        self.unmount_current();
        self.selected = tab;
        self.mounted = true;
        let count = self.screen_mut(tab).mount_screen().await?;
        log_action(ctx, "tab_selected", json!({ "tab": tab, "records": count }));
        Ok(count)
    }

    /// Selects `tab` unless it is already the mounted one.
    pub async fn focus(&mut self, ctx: &mut SessionContext, tab: AdminTab) -> ServiceResult<()> {
        self.select(ctx, tab).await.map(|_| ())
    }

    pub fn render(&self, ctx: &mut SessionContext) -> ServiceResult<Value> {
        self.gate.ensure_unlocked(ctx)?;
        let tab = self.selected;
        let tabs: Vec<Value> = AdminTab::ALL
            .iter()
            .map(|t| json!({ "id": t, "heading": t.heading(), "active": *t == tab }))
            .collect();
        let screen = if self.mounted {
            self.screen(tab).render()
        } else {
            Value::Null
        };
        let mut view = json!({
            "tab": tab,
            "heading": tab.heading(),
            "tabs": tabs,
            "screen": screen,
        });
        if self.mounted && tab == AdminTab::Contacts {
            view["counts"] = json!(manage_contacts::counts(&self.contacts.store));
        }
        if self.mounted && tab == AdminTab::Portfolio {
            view["attachment_form"] = json!({
                "open": self.attachments.is_open(),
                "parent": self.attachments.parent(),
                "draft": self.attachments.draft().fields(),
            });
        }
        ctx.context.set(SCREEN_KEY, &view);
        Ok(view)
    }

    pub async fn list(&mut self, ctx: &mut SessionContext, tab: AdminTab) -> ServiceResult<Vec<Value>> {
        self.focus(ctx, tab).await?;
        Ok(self.screen(tab).records_json())
    }

    pub async fn submit(
        &mut self,
        ctx: &mut SessionContext,
        tab: AdminTab,
        id: Option<i64>,
        fields: &Map<String, Value>,
    ) -> ServiceResult<Value> {
        self.focus(ctx, tab).await?;
        if tab == AdminTab::Contacts {
            return Err(StudioError::PermissionDenied("contact_requests_read_only".into()));
        }
        let screen = self.screen_mut(tab);
        let kind = screen.kind();
        let (outcome, record) = screen.submit_json(id, fields)?;
        log_action(
            ctx,
            &format!("{kind}_{outcome}"),
            json!({ "id": record.get("id").cloned().or(id.map(Value::from)) }),
        );
        Ok(json!({ "outcome": outcome, "record": record }))
    }

    pub async fn delete(&mut self, ctx: &mut SessionContext, tab: AdminTab, id: i64) -> ServiceResult<bool> {
        self.focus(ctx, tab).await?;
        let screen = self.screen_mut(tab);
        let kind = screen.kind();
        let removed = screen.remove_record(id);
        if removed {
            if tab == AdminTab::Portfolio && self.attachments.parent() == Some(id) {
                self.attachments.cancel();
            }
            log_action(ctx, &format!("{kind}_removed"), json!({ "id": id }));
        }
        Ok(removed)
    }

    /// Opens the detail view; for contact requests this is also what marks a
    /// new request as read.
    pub async fn open_detail(&mut self, ctx: &mut SessionContext, tab: AdminTab, id: i64) -> ServiceResult<Value> {
        self.focus(ctx, tab).await?;
        if tab == AdminTab::Contacts {
            let before = self.contacts.store.get(id).map(|request| request.status);
            let request = manage_contacts::view_request(&self.contacts.store, id)?;
            self.contacts.open_detail(id)?;
            if before == Some(ContactStatus::New) {
                log_action(ctx, "contact_request_read", json!({ "id": id }));
            }
            return serde_json::to_value(request).map_err(|err| StudioError::Internal(err.to_string()));
        }
        self.screen_mut(tab).open_detail_json(id)
    }

    pub async fn close_detail(&mut self, ctx: &mut SessionContext, tab: AdminTab, id: i64) -> ServiceResult<bool> {
        self.focus(ctx, tab).await?;
        Ok(self.screen_mut(tab).close_detail_view(id))
    }

    pub async fn set_contact_status(
        &mut self,
        ctx: &mut SessionContext,
        id: i64,
        status: ContactStatus,
    ) -> ServiceResult<ContactRequest> {
        self.focus(ctx, AdminTab::Contacts).await?;
        let request = manage_contacts::set_status(&self.contacts.store, id, status)?;
        log_action(ctx, "contact_request_status", json!({ "id": id, "status": status }));
        Ok(request)
    }

    pub async fn copy_contact_email<C: Clipboard + Sync>(
        &mut self,
        ctx: &mut SessionContext,
        id: i64,
        clipboard: &C,
    ) -> ServiceResult<String> {
        self.focus(ctx, AdminTab::Contacts).await?;
        manage_contacts::copy_email(&self.contacts.store, id, clipboard)
    }

    pub async fn add_attachment(
        &mut self,
        ctx: &mut SessionContext,
        item_id: i64,
        fields: &Map<String, Value>,
    ) -> ServiceResult<PortfolioAttachment> {
        self.focus(ctx, AdminTab::Portfolio).await?;
        self.attachments.begin(&self.portfolio.store, item_id)?;
        for (name, value) in fields {
            let text = match value {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                _ => return Err(StudioError::Validation(format!("{name}_not_text"))),
            };
            self.attachments.field(name, text)?;
        }
        let attachment = self.attachments.commit(&self.portfolio.store)?;
        log_action(
            ctx,
            "portfolio_attachment_created",
            json!({ "item": item_id, "id": attachment.id }),
        );
        Ok(attachment)
    }

    pub async fn remove_attachment(
        &mut self,
        ctx: &mut SessionContext,
        item_id: i64,
        attachment_id: i64,
    ) -> ServiceResult<bool> {
        self.focus(ctx, AdminTab::Portfolio).await?;
        let removed = attachments::remove_attachment(&self.portfolio.store, item_id, attachment_id);
        if removed {
            log_action(
                ctx,
                "portfolio_attachment_removed",
                json!({ "item": item_id, "id": attachment_id }),
            );
        }
        Ok(removed)
    }

    /// Session teardown: every screen is unmounted.
    pub fn close(&mut self) {
        self.unmount_current();
        for tab in AdminTab::ALL {
            self.screen_mut(tab).unmount_screen();
        }
        self.attachments.cancel();
        self.selected = AdminTab::default();
    }
}
