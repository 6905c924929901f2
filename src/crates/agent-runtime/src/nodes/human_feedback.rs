//! `human_feedback`: the plan-review pause between a `base` turn and `END`
//! (spec §4.1 "Human-in-the-loop", "Valid decisions").
//!
//! With `auto_accepted_plan` set, this node never pauses: it behaves as if
//! an `Approve` had already arrived. Otherwise it raises a `plan_review`
//! interrupt and waits; the next call into this node must carry the
//! resulting [`Decision`].

use langgraph_core::messages::Message;

use crate::config::GraphConfig;
use crate::error::{ExecutorError, Result};
use crate::hitl::{Decision, InterruptRequest};
use crate::state::{ExtKey, GraphState};

pub enum HumanFeedbackOutcome {
    Interrupted(InterruptRequest),
    /// Either `"base"` (send back for another turn) or `"__end__"`.
    Goto(&'static str),
}

pub fn run(
    state: &mut GraphState,
    config: &GraphConfig,
    decision: Option<Decision>,
) -> Result<HumanFeedbackOutcome> {
    if config.auto_accepted_plan {
        return Ok(HumanFeedbackOutcome::Goto("__end__"));
    }

    let Some(decision) = decision else {
        return Ok(HumanFeedbackOutcome::Interrupted(InterruptRequest::plan_review()));
    };

    match decision {
        Decision::Approve => Ok(HumanFeedbackOutcome::Goto("__end__")),
        Decision::Reject { .. } => Ok(HumanFeedbackOutcome::Goto("__end__")),
        Decision::Edit { feedback, answers } => {
            fold_feedback_into_messages(state, &feedback, answers.as_ref());
            state.set_ext(
                ExtKey::InterruptFeedback,
                serde_json::Value::String(feedback),
            );
            Ok(HumanFeedbackOutcome::Goto("base"))
        }
    }
}

/// Folds an `edit` decision's feedback text (and any structured answers to
/// `questions`) into the conversation as a new human message, so the next
/// `base` turn sees it as ordinary input rather than out-of-band state
/// (spec Open Question 2).
fn fold_feedback_into_messages(
    state: &mut GraphState,
    feedback: &str,
    answers: Option<&serde_json::Value>,
) {
    let mut text = feedback.to_string();
    if let Some(answers) = answers {
        text.push_str("\n\n");
        text.push_str(&answers.to_string());
    }
    state.messages.push(Message::human(text));
}

/// Validates that a resumed decision is one the raised interrupt actually
/// allows (spec §4.1: a decision kind that doesn't match what the suspended
/// node is waiting on is an error, not a silent no-op).
pub fn validate_decision(request: &InterruptRequest, decision: &Decision) -> Result<()> {
    if request.allows(decision) {
        Ok(())
    } else {
        Err(ExecutorError::InvalidResume(format!(
            "decision not permitted for this interrupt: {decision:?}"
        )))
    }
}
