use crate::services::{push_to_array, SessionContext};
use chrono::Utc;
use serde_json::json;
use tracing::info;

pub const ACTION_LOG_KEY: &str = "action_log";

/// Entries kept per session; older ones fall off the front.
pub const ACTION_LOG_LIMIT: usize = 100;

pub fn log_action(ctx: &mut SessionContext, action: &str, details: serde_json::Value) {
    info!(action, %details, "admin action");
    push_to_array(
        &mut ctx.context,
        ACTION_LOG_KEY,
        json!({ "action": action, "details": details, "at": Utc::now() }),
        ACTION_LOG_LIMIT,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_action_appends_entry() {
        let mut ctx = SessionContext::new();
        log_action(&mut ctx, "blog_post_created", json!({"id": 5}));
        let log = ctx.context.get(ACTION_LOG_KEY).unwrap().as_array().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0]["action"], "blog_post_created");
    }

    #[test]
    fn action_log_keeps_latest_entries_only() {
        let mut ctx = SessionContext::new();
        for id in 0..(ACTION_LOG_LIMIT as i64 + 25) {
            log_action(&mut ctx, "blog_post_removed", json!({ "id": id }));
        }
        let log = ctx.context.get(ACTION_LOG_KEY).unwrap().as_array().unwrap();
        assert_eq!(log.len(), ACTION_LOG_LIMIT);
        assert_eq!(log[0]["details"]["id"], 25);
        assert_eq!(log[ACTION_LOG_LIMIT - 1]["details"]["id"], ACTION_LOG_LIMIT as i64 + 24);
    }
}
