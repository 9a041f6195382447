//! The runtime: rule tables, contexts, and the dispatch engine.

mod action;
mod context;
mod engine;
mod transition;

pub use action::{
    action_fn, fallible_action_fn, proxy_fn, ActionError, ActionFn, ActionProxy,
    PredicatedTransitionAction, TracingActionProxy, TransitionAction,
};
pub use context::{ActionContext, FsmContext};
pub use engine::StrictMachine;
pub(crate) use engine::MachineParts;
pub use transition::{PredicatedTransition, Transition};
