//! Attempt sequencing for one parse call.
//!
//! `primary` -> on an availability failure, the same request against the
//! fallback model; on any other failure, the same model again with the
//! JSON-only directive. Each substitution happens at most once, so a call
//! makes three requests at most.

use super::error::AttemptError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptPlan {
    pub model: String,
    pub json_only: bool,
}

impl AttemptPlan {
    pub fn initial(model: &str) -> Self {
        Self {
            model: model.to_string(),
            json_only: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct RetryBudget {
    fallback_used: bool,
    retried: bool,
}

impl RetryBudget {
    /// Next attempt after `plan` failed with `err`, or `None` to give up.
    pub fn next(
        &mut self,
        plan: &AttemptPlan,
        err: &AttemptError,
        fallback_model: &str,
    ) -> Option<AttemptPlan> {
        if err.is_fatal() {
            return None;
        }
        if err.is_model_unavailable() {
            if self.fallback_used || plan.model == fallback_model {
                return None;
            }
            self.fallback_used = true;
            return Some(AttemptPlan {
                model: fallback_model.to_string(),
                json_only: plan.json_only,
            });
        }
        if self.retried {
            return None;
        }
        self.retried = true;
        Some(AttemptPlan {
            model: plan.model.clone(),
            json_only: true,
        })
    }
}
