use crate::records::{ContactRequest, ContactStatus};
use crate::services::{RecordStore, ServiceResult, StudioError};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Destination for "copy email" in the request detail view.
pub trait Clipboard {
    fn write_text(&self, text: &str) -> ServiceResult<()>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryClipboard {
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> ServiceResult<()> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ContactCounts {
    pub total: usize,
    pub new: usize,
}

fn missing(id: i64) -> StudioError {
    StudioError::NotFound(format!("contact_request_{id}"))
}

/// Opens a request; a `new` request becomes `read`, anything else is left
/// as it is.
pub fn view_request(
    requests: &RecordStore<ContactRequest>,
    id: i64,
) -> ServiceResult<ContactRequest> {
    let request = requests.get(id).ok_or_else(|| missing(id))?;
    if request.status != ContactStatus::New {
        return Ok(request);
    }
    requests
        .modify(id, |request| request.status = ContactStatus::Read)
        .ok_or_else(|| missing(id))
}

pub fn set_status(
    requests: &RecordStore<ContactRequest>,
    id: i64,
    status: ContactStatus,
) -> ServiceResult<ContactRequest> {
    requests
        .modify(id, |request| request.status = status)
        .ok_or_else(|| missing(id))
}

pub fn counts(requests: &RecordStore<ContactRequest>) -> ContactCounts {
    let list = requests.list();
    ContactCounts {
        total: list.len(),
        new: list
            .iter()
            .filter(|request| request.status == ContactStatus::New)
            .count(),
    }
}

pub fn copy_email<C: Clipboard>(
    requests: &RecordStore<ContactRequest>,
    id: i64,
    clipboard: &C,
) -> ServiceResult<String> {
    let request = requests.get(id).ok_or_else(|| missing(id))?;
    clipboard.write_text(&request.email)?;
    Ok(request.email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::seed::seed_source;

    async fn requests() -> RecordStore<ContactRequest> {
        let store = RecordStore::new(seed_source::<ContactRequest>());
        store.load().await.unwrap();
        store
    }

    #[tokio::test]
    async fn viewing_new_request_marks_it_read_once() {
        let store = requests().await;
        assert_eq!(counts(&store), ContactCounts { total: 3, new: 1 });
        assert_eq!(view_request(&store, 1).unwrap().status, ContactStatus::Read);
        assert_eq!(view_request(&store, 1).unwrap().status, ContactStatus::Read);
        assert_eq!(counts(&store).new, 0);
    }

    #[tokio::test]
    async fn viewing_replied_request_keeps_status() {
        let store = requests().await;
        assert_eq!(view_request(&store, 3).unwrap().status, ContactStatus::Replied);
    }

    #[tokio::test]
    async fn explicit_status_can_go_back_to_new() {
        let store = requests().await;
        set_status(&store, 2, ContactStatus::New).unwrap();
        assert_eq!(counts(&store).new, 2);
        assert!(matches!(
            set_status(&store, 99, ContactStatus::Read),
            Err(StudioError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn copy_email_writes_clipboard() {
        let store = requests().await;
        let clipboard = MemoryClipboard::default();
        assert_eq!(copy_email(&store, 2, &clipboard).unwrap(), "maria@example.com");
        assert_eq!(clipboard.contents().as_deref(), Some("maria@example.com"));
        assert!(copy_email(&store, 99, &clipboard).is_err());
    }

    #[tokio::test]
    async fn view_of_unknown_request_is_not_found() {
        let store = requests().await;
        assert!(matches!(view_request(&store, 99), Err(StudioError::NotFound(_))));
    }
}
