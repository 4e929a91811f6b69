#![allow(unused_variables)]
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::{
    actor::{
        actor_cell::Context,
        actor_ref::{BasicActorRef, Sender},
    },
    Message,
};

pub trait Actor: Send + 'static {
    type Msg: Message;

    /// Invoked before an actor processes its first message.
    ///
    /// Any initialization inherent to the actor's role should be
    /// performed here. It is guaranteed to run before any `recv`.
    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {}

    /// Invoked when the actor begins stopping, before its children
    /// are asked to stop.
    fn will_stop(&mut self, ctx: &Context<Self::Msg>) {}

    /// Invoked after an actor has been stopped and all of its
    /// children have terminated.
    fn post_stop(&mut self) {}

    /// Invoked each time a child of this actor terminates, before
    /// the child is removed from the children table.
    fn child_terminated(&mut self, ctx: &Context<Self::Msg>, child: &BasicActorRef) {}

    /// Return the supervision strategy for a fault.
    ///
    /// The strategy is consulted for faults signalled by the actor
    /// itself and for faults escalated by a child, in which case it
    /// is applied to that child.
    fn supervisor_strategy(&self, fault: &ActorError) -> Strategy {
        Strategy::Ignore
    }

    /// Invoked when an actor receives a message.
    ///
    /// It is guaranteed that only one message in the actor's mailbox
    /// is processed at any one time.
    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender);
}

impl<A: Actor + ?Sized> Actor for Box<A> {
    type Msg = A::Msg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        (**self).pre_start(ctx);
    }

    fn will_stop(&mut self, ctx: &Context<Self::Msg>) {
        (**self).will_stop(ctx);
    }

    fn post_stop(&mut self) {
        (**self).post_stop();
    }

    fn child_terminated(&mut self, ctx: &Context<Self::Msg>, child: &BasicActorRef) {
        (**self).child_terminated(ctx, child);
    }

    fn supervisor_strategy(&self, fault: &ActorError) -> Strategy {
        (**self).supervisor_strategy(fault)
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        (**self).recv(ctx, msg, sender);
    }
}

/// The actor trait object
pub type BoxActor<Msg> = Box<dyn Actor<Msg = Msg> + Send>;

/// Supervision strategy
///
/// Returned by `Actor::supervisor_strategy`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Take no action
    Ignore,

    /// Stop the faulted actor
    Stop,

    /// Rebuild the faulted actor from its producer
    Restart,

    /// Escalate the fault to the parent
    Escalate,
}

/// A cloneable, shareable actor fault cause.
///
/// Faults travel inside system messages, which are cloned on their
/// way through the tree, so the underlying error is reference counted.
#[derive(Clone)]
pub struct ActorError {
    inner: Arc<dyn Error + Send + Sync>,
}

impl ActorError {
    pub fn new<E>(err: E) -> ActorError
    where
        E: Error + Send + Sync + 'static,
    {
        ActorError {
            inner: Arc::new(err),
        }
    }

    pub fn from_msg(msg: impl Into<String>) -> ActorError {
        ActorError {
            inner: Arc::new(PlainError(msg.into())),
        }
    }
}

impl fmt::Display for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ActorError({})", self.inner)
    }
}

struct PlainError(String);

impl Error for PlainError {}

impl fmt::Display for PlainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PlainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An actor fault travelling through the supervision tree.
///
/// `actor` is `None` while the fault is local to the actor that
/// signalled it; escalation fills in the origin so the parent can
/// apply its strategy to the right child.
#[derive(Clone, Debug)]
pub struct Fault {
    pub actor: Option<BasicActorRef>,
    pub error: ActorError,
}

impl Fault {
    pub fn new(error: ActorError) -> Fault {
        Fault { actor: None, error }
    }

    pub fn escalated(actor: BasicActorRef, error: ActorError) -> Fault {
        Fault {
            actor: Some(actor),
            error,
        }
    }
}
