use crate::services::{ServiceResult, SessionContext, StudioError};
use serde::Serialize;
use tracing::{info, warn};

/// Session key holding `"true"` while the admin area is unlocked.
pub const SESSION_FLAG: &str = "admin_authenticated";

pub const AUTH_ERROR_KEY: &str = "auth_error";

pub const AUTH_ERROR_MESSAGE: &str = "Неверный пароль";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateState {
    Locked,
    Unlocked,
}

/// Shared-password lock in front of the admin screens.
///
/// The secret is compared verbatim: no trimming, no case folding, no hashing.
#[derive(Clone)]
pub struct AccessGate {
    secret: String,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate").finish_non_exhaustive()
    }
}

impl AccessGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn state(&self, ctx: &SessionContext) -> GateState {
        match ctx.session.string(SESSION_FLAG).as_deref() {
            Some("true") => GateState::Unlocked,
            _ => GateState::Locked,
        }
    }

    pub fn is_unlocked(&self, ctx: &SessionContext) -> bool {
        self.state(ctx) == GateState::Unlocked
    }

    /// On mismatch the gate stays locked, the inline error is set and the
    /// typed password is cleared.
    pub fn unlock(&self, ctx: &mut SessionContext, input: &str) -> ServiceResult<GateState> {
        ctx.context.set("password_input", "");
        if input == self.secret {
            ctx.session.set(SESSION_FLAG, "true");
            ctx.context.remove(AUTH_ERROR_KEY);
            info!("admin area unlocked");
            Ok(GateState::Unlocked)
        } else {
            ctx.context.set(AUTH_ERROR_KEY, AUTH_ERROR_MESSAGE);
            warn!("rejected admin password");
            Err(StudioError::Authentication)
        }
    }

    pub fn logout(&self, ctx: &mut SessionContext) -> GateState {
        ctx.session.remove(SESSION_FLAG);
        info!("admin area locked");
        GateState::Locked
    }

    pub fn ensure_unlocked(&self, ctx: &SessionContext) -> ServiceResult<()> {
        if self.is_unlocked(ctx) {
            Ok(())
        } else {
            Err(StudioError::PermissionDenied("admin_locked".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AccessGate {
        AccessGate::new("studio-admin")
    }

    #[test]
    fn new_session_starts_locked() {
        let ctx = SessionContext::new();
        assert_eq!(gate().state(&ctx), GateState::Locked);
        assert!(gate().ensure_unlocked(&ctx).is_err());
    }

    #[test]
    fn exact_secret_unlocks() {
        let mut ctx = SessionContext::new();
        assert_eq!(gate().unlock(&mut ctx, "studio-admin").unwrap(), GateState::Unlocked);
        assert_eq!(ctx.session.string(SESSION_FLAG).unwrap(), "true");
        assert!(gate().ensure_unlocked(&ctx).is_ok());
    }

    #[test]
    fn near_misses_stay_locked_with_error() {
        for attempt in ["", "Studio-Admin", "studio", "studio-admin ", " studio-admin"] {
            let mut ctx = SessionContext::new();
            ctx.context.set("password_input", attempt);
            let result = gate().unlock(&mut ctx, attempt);
            assert!(matches!(result, Err(StudioError::Authentication)), "{attempt:?}");
            assert_eq!(gate().state(&ctx), GateState::Locked);
            assert_eq!(ctx.context.string(AUTH_ERROR_KEY).unwrap(), AUTH_ERROR_MESSAGE);
            assert_eq!(ctx.context.string("password_input").unwrap(), "");
        }
    }

    #[test]
    fn successful_unlock_clears_previous_error() {
        let mut ctx = SessionContext::new();
        let _ = gate().unlock(&mut ctx, "wrong");
        gate().unlock(&mut ctx, "studio-admin").unwrap();
        assert!(!ctx.context.contains(AUTH_ERROR_KEY));
    }

    #[test]
    fn flag_with_other_value_is_locked() {
        let mut ctx = SessionContext::new();
        ctx.session.set(SESSION_FLAG, "yes");
        assert_eq!(gate().state(&ctx), GateState::Locked);
    }

    #[test]
    fn logout_relocks() {
        let mut ctx = SessionContext::new();
        gate().unlock(&mut ctx, "studio-admin").unwrap();
        assert_eq!(gate().logout(&mut ctx), GateState::Locked);
        assert!(gate().ensure_unlocked(&ctx).is_err());
    }

    #[test]
    fn closing_session_relocks() {
        let mut ctx = SessionContext::new();
        gate().unlock(&mut ctx, "studio-admin").unwrap();
        ctx.close();
        assert_eq!(gate().state(&ctx), GateState::Locked);
    }
}
