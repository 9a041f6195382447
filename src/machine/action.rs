//! Transition actions and the action proxy.

use crate::core::{Event, Predicate, State};
use crate::machine::context::ActionContext;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

/// Why a single action did not complete.
///
/// Reported through the machine's log sink; never propagated to producers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    #[error("Action failed: {0}")]
    Failed(String),

    #[error("Action panicked: {0}")]
    Panicked(String),
}

impl ActionError {
    /// Wrap any displayable error as a failure.
    pub fn failed(err: impl Display) -> Self {
        Self::Failed(err.to_string())
    }
}

/// Shared action body.
pub type ActionFn<S, E> =
    Arc<dyn Fn(&mut ActionContext<'_, S, E>) -> Result<(), ActionError> + Send + Sync>;

/// Wrap an infallible closure as an action body.
pub fn action_fn<S, E, F>(f: F) -> ActionFn<S, E>
where
    S: State,
    E: Event,
    F: Fn(&mut ActionContext<'_, S, E>) + Send + Sync + 'static,
{
    fallible_action_fn(move |ctx| {
        f(ctx);
        Ok(())
    })
}

/// Wrap a fallible closure as an action body.
pub fn fallible_action_fn<S, E, F>(f: F) -> ActionFn<S, E>
where
    S: State,
    E: Event,
    F: Fn(&mut ActionContext<'_, S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Side effect attached to every completed transition whose
/// `(from, to, event)` triple it matches.
///
/// Matching ignores whether a transition rule actually fired, so an action
/// on `(S, S, e)` also runs for unhandled events in `S`.
pub trait TransitionAction<S, E>: Send + Sync {
    fn matches(&self, from: &S, to: &S, event: &E) -> bool;

    fn execute(&self, ctx: &mut ActionContext<'_, S, E>) -> Result<(), ActionError>;
}

/// Action selected by predicates on the source state, target state, and event.
pub struct PredicatedTransitionAction<S, E> {
    from: Predicate<S>,
    to: Predicate<S>,
    via: Predicate<E>,
    action: ActionFn<S, E>,
}

impl<S: State, E: Event> PredicatedTransitionAction<S, E> {
    pub fn new(
        from: Predicate<S>,
        to: Predicate<S>,
        via: Predicate<E>,
        action: ActionFn<S, E>,
    ) -> Self {
        Self {
            from,
            to,
            via,
            action,
        }
    }
}

impl<S: State, E: Event> TransitionAction<S, E> for PredicatedTransitionAction<S, E> {
    fn matches(&self, from: &S, to: &S, event: &E) -> bool {
        self.from.test(from) && self.to.test(to) && self.via.test(event)
    }

    fn execute(&self, ctx: &mut ActionContext<'_, S, E>) -> Result<(), ActionError> {
        (self.action)(ctx)
    }
}

/// Interception point around every action invocation.
///
/// A proxy decides how (and whether) to run `action`, e.g. inside a tracing
/// span or with timing. Without a proxy the engine calls actions directly.
pub trait ActionProxy<S, E>: Send + Sync {
    fn execute(
        &self,
        ctx: &mut ActionContext<'_, S, E>,
        action: &dyn TransitionAction<S, E>,
    ) -> Result<(), ActionError>;
}

/// Build a proxy from a closure.
pub fn proxy_fn<S, E, F>(f: F) -> impl ActionProxy<S, E>
where
    S: State,
    E: Event,
    F: Fn(&mut ActionContext<'_, S, E>, &dyn TransitionAction<S, E>) -> Result<(), ActionError>
        + Send
        + Sync
        + 'static,
{
    FnProxy(f)
}

struct FnProxy<F>(F);

impl<S, E, F> ActionProxy<S, E> for FnProxy<F>
where
    S: State,
    E: Event,
    F: Fn(&mut ActionContext<'_, S, E>, &dyn TransitionAction<S, E>) -> Result<(), ActionError>
        + Send
        + Sync
        + 'static,
{
    fn execute(
        &self,
        ctx: &mut ActionContext<'_, S, E>,
        action: &dyn TransitionAction<S, E>,
    ) -> Result<(), ActionError> {
        (self.0)(ctx, action)
    }
}

/// Proxy that runs each action inside a `fsm_action` debug span.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingActionProxy;

impl<S: State, E: Event> ActionProxy<S, E> for TracingActionProxy {
    fn execute(
        &self,
        ctx: &mut ActionContext<'_, S, E>,
        action: &dyn TransitionAction<S, E>,
    ) -> Result<(), ActionError> {
        let span = tracing::debug_span!(
            "fsm_action",
            instance = %ctx.instance_id(),
            from = ctx.from().name(),
            to = ctx.to().name(),
            event = ?ctx.event(),
        );
        let _entered = span.enter();
        action.execute(ctx)
    }
}
