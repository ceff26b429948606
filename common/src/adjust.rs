use std::collections::HashMap;

use crate::{
    commit::Commit,
    config::AdjustmentConfig,
    types::{Celsius, OperationMode, SessionId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdjustment {
    pub base_temp: i32,
    pub delta: i32,
    pub deadline_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AdjustmentController {
    config: AdjustmentConfig,
    operation_mode: OperationMode,
    pending: HashMap<SessionId, PendingAdjustment>,
}

impl AdjustmentController {
    pub fn new(mut config: AdjustmentConfig, operation_mode: OperationMode) -> Self {
        config.sanitize();
        Self {
            config,
            operation_mode,
            pending: HashMap::new(),
        }
    }

    pub fn is_pending(&self, session: &SessionId) -> bool {
        self.pending.contains_key(session)
    }

    pub fn submit_adjustment(
        &mut self,
        session: &SessionId,
        delta_steps: i32,
        display_target: Celsius,
        now_ms: u64,
    ) -> Celsius {
        let deadline_ms = now_ms.saturating_add(self.config.debounce_ms);
        let pending = self
            .pending
            .entry(session.clone())
            .or_insert(PendingAdjustment {
                base_temp: display_target.whole_degrees(),
                delta: 0,
                deadline_ms,
            });

        pending.delta = pending.delta.saturating_add(delta_steps);
        pending.deadline_ms = deadline_ms;

        let pending = *pending;
        self.candidate(&pending)
    }

    pub fn on_debounce_expiry(&mut self, session: &SessionId, now_ms: u64) -> Option<Commit> {
        let pending = *self.pending.get(session)?;
        if now_ms < pending.deadline_ms {
            return None;
        }

        self.pending.remove(session);
        Some(Commit {
            tempt: self.candidate(&pending),
            operation_mode: self.operation_mode,
        })
    }

    pub fn expired_sessions(&self, now_ms: u64) -> Vec<SessionId> {
        self.pending
            .iter()
            .filter(|(_, pending)| now_ms >= pending.deadline_ms)
            .map(|(session, _)| session.clone())
            .collect()
    }

    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.pending.values().map(|pending| pending.deadline_ms).min()
    }

    pub fn end_session(&mut self, session: &SessionId) -> bool {
        self.pending.remove(session).is_some()
    }

    fn candidate(&self, pending: &PendingAdjustment) -> Celsius {
        let target = pending
            .base_temp
            .saturating_add(pending.delta)
            .clamp(self.config.min_target_c, self.config.max_target_c);
        Celsius::from(target)
    }
}
