use std::fmt;
use std::marker::PhantomData;

use log::debug;

use crate::{
    actor::{
        actor_cell::{ActorCell, CellSlot},
        ActorPath,
    },
    system::{ActorCmd, DeadLetter, SystemMsg},
    AnyMessage, Message,
};

pub type Sender = Option<BasicActorRef>;

pub trait ActorReference {
    /// Actor name.
    ///
    /// Unique among siblings.
    fn name(&self) -> &str;

    /// Actor path.
    ///
    /// e.g. `/user/actor_a/actor_b`
    fn path(&self) -> &ActorPath;

    /// Parent reference, `None` at the user root.
    fn parent(&self) -> Option<BasicActorRef>;

    /// Snapshot of the current children references.
    fn children(&self) -> Vec<BasicActorRef>;

    fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    /// True once the underlying actor has stopped and been reaped.
    ///
    /// References outlive their actors; a dead reference keeps its
    /// path but drops every message sent through it.
    fn is_dead(&self) -> bool;

    /// Send a system message to this actor
    fn sys_tell(&self, msg: SystemMsg);

    /// Ask the actor to stop.
    ///
    /// Stopping is cooperative: messages already queued ahead of the
    /// stop command are processed first, and the actor waits for all
    /// of its children to terminate before stopping itself.
    fn stop(&self) {
        self.sys_tell(SystemMsg::Command(ActorCmd::Stop));
    }
}

/// A lightweight, un-typed reference to interact with its underlying
/// actor instance through concurrent messaging.
///
/// `BasicActorRef` can be derived from an original `ActorRef<Msg>`.
///
/// `BasicActorRef` allows for un-typed messaging using `try_tell`,
/// that will return a `Result`. If the message type was not supported,
/// the result will contain an `Error`.
///
/// `BasicActorRef` can be used when the original `ActorRef` isn't
/// available, when you need to use collections to store references
/// from different actor types, or when walking the actor hierarchy.
///
/// In general, it is better to use `ActorRef` where possible.
#[derive(Clone)]
pub struct BasicActorRef {
    pub(crate) path: ActorPath,
    pub(crate) cell: CellSlot,
}

impl BasicActorRef {
    pub(crate) fn new(path: ActorPath, cell: CellSlot) -> BasicActorRef {
        BasicActorRef { path, cell }
    }

    /// A reference that was never backed by a cell. Everything sent
    /// through it is dropped.
    pub(crate) fn dead(path: ActorPath) -> BasicActorRef {
        BasicActorRef {
            path,
            cell: CellSlot::default(),
        }
    }

    pub(crate) fn cell(&self) -> Option<ActorCell> {
        self.cell.read().unwrap().clone()
    }

    /// Nulls the link to the cell, invalidating every clone of this
    /// reference at once. Called by the parent when the actor is
    /// reaped.
    pub(crate) fn release_cell(&self) {
        *self.cell.write().unwrap() = None;
    }

    /// Send a message to this actor.
    ///
    /// Returns `Err` if the actor has stopped or does not accept
    /// messages of this type.
    pub fn try_tell<Msg>(&self, msg: Msg, sender: impl Into<Sender>) -> Result<(), ()>
    where
        Msg: Message,
    {
        match self.cell() {
            Some(cell) => cell.send_user_msg(AnyMessage::new(msg), sender.into()),
            None => {
                debug!(
                    "{}",
                    DeadLetter::new(
                        format!("{:?}", msg),
                        sender.into().map(|s| s.path.clone()),
                        self.path.clone(),
                    )
                );
                Err(())
            }
        }
    }

    /// Resolves a path to a reference, or `None` if no actor lives
    /// at that location.
    ///
    /// Absolute paths (`/user/a/b`) resolve from the system root;
    /// anything else resolves relative to this actor. The special
    /// segments `.` and `..` select the current actor and its parent.
    pub fn find(&self, path: &str) -> Option<BasicActorRef> {
        if path.is_empty() {
            return None;
        }

        if path.starts_with('/') {
            let cell = self.cell()?;
            cell.system().find(path)
        } else {
            resolve(self.clone(), path.split_terminator('/'))
        }
    }
}

/// Walks `segments` down from `anchor`, one lookup per segment.
pub(crate) fn resolve<'a, I>(anchor: BasicActorRef, mut segments: I) -> Option<BasicActorRef>
where
    I: Iterator<Item = &'a str>,
{
    match segments.next() {
        None => Some(anchor),
        Some(".") => resolve(anchor, segments),
        Some("..") => {
            let parent = anchor.parent()?;
            resolve(parent, segments)
        }
        Some(name) => {
            let child = anchor.cell()?.child(name)?;
            resolve(child, segments)
        }
    }
}

impl ActorReference for BasicActorRef {
    fn name(&self) -> &str {
        self.path.name()
    }

    fn path(&self) -> &ActorPath {
        &self.path
    }

    fn parent(&self) -> Option<BasicActorRef> {
        self.cell().and_then(|cell| cell.parent())
    }

    fn children(&self) -> Vec<BasicActorRef> {
        self.cell().map(|cell| cell.children()).unwrap_or_default()
    }

    fn is_dead(&self) -> bool {
        self.cell().is_none()
    }

    fn sys_tell(&self, msg: SystemMsg) {
        match self.cell() {
            Some(cell) => cell.send_sys_msg(msg),
            None => debug!(
                "system message {:?} for stopped actor {} dropped",
                msg, self.path
            ),
        }
    }
}

impl fmt::Debug for BasicActorRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BasicActorRef[{}]", self.path)
    }
}

impl fmt::Display for BasicActorRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BasicActorRef[{}]", self.path)
    }
}

impl PartialEq for BasicActorRef {
    fn eq(&self, other: &BasicActorRef) -> bool {
        self.path == other.path
    }
}

/// A lightweight, typed reference to interact with its underlying
/// actor instance through concurrent messaging.
///
/// All `ActorRef`s are products of `system.actor_of` or
/// `context.actor_of`. When an actor is created using `actor_of` an
/// `ActorRef<Msg>` is returned, where `Msg` is the mailbox message
/// type for the actor.
///
/// Actor references are lightweight and can be cloned without concern
/// for memory use.
///
/// Messages sent to an actor are processed one at a time, in the
/// order they entered the actor's queue.
///
/// In the event that the underlying actor has terminated, messages
/// sent to the actor are dropped and logged as dead letters.
pub struct ActorRef<Msg: Message> {
    pub(crate) inner: BasicActorRef,
    _marker: PhantomData<fn() -> Msg>,
}

impl<Msg: Message> ActorRef<Msg> {
    pub(crate) fn new(inner: BasicActorRef) -> ActorRef<Msg> {
        ActorRef {
            inner,
            _marker: PhantomData,
        }
    }

    /// Send a message to this actor.
    pub fn tell<T>(&self, msg: T, sender: impl Into<Sender>)
    where
        T: Into<Msg>,
    {
        let msg = msg.into();
        match self.inner.cell() {
            Some(cell) => {
                let _ = cell.send_user_msg(AnyMessage::new(msg), sender.into());
            }
            None => debug!(
                "{}",
                DeadLetter::new(
                    format!("{:?}", msg),
                    sender.into().map(|s| s.path.clone()),
                    self.inner.path.clone(),
                )
            ),
        }
    }

    /// See [`BasicActorRef::find`].
    pub fn find(&self, path: &str) -> Option<BasicActorRef> {
        self.inner.find(path)
    }
}

impl<Msg: Message> ActorReference for ActorRef<Msg> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn path(&self) -> &ActorPath {
        self.inner.path()
    }

    fn parent(&self) -> Option<BasicActorRef> {
        self.inner.parent()
    }

    fn children(&self) -> Vec<BasicActorRef> {
        self.inner.children()
    }

    fn is_dead(&self) -> bool {
        self.inner.is_dead()
    }

    fn sys_tell(&self, msg: SystemMsg) {
        self.inner.sys_tell(msg)
    }
}

impl<Msg: Message> Clone for ActorRef<Msg> {
    fn clone(&self) -> Self {
        ActorRef {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<Msg: Message> fmt::Debug for ActorRef<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ActorRef[{}]", self.inner.path)
    }
}

impl<Msg: Message> fmt::Display for ActorRef<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ActorRef[{}]", self.inner.path)
    }
}

impl<Msg: Message> PartialEq for ActorRef<Msg> {
    fn eq(&self, other: &ActorRef<Msg>) -> bool {
        self.inner == other.inner
    }
}

impl<Msg: Message> From<ActorRef<Msg>> for BasicActorRef {
    fn from(actor: ActorRef<Msg>) -> BasicActorRef {
        actor.inner
    }
}

impl<Msg: Message> From<ActorRef<Msg>> for Option<BasicActorRef> {
    fn from(actor: ActorRef<Msg>) -> Option<BasicActorRef> {
        Some(actor.inner)
    }
}

impl<'a, Msg: Message> From<&'a ActorRef<Msg>> for Option<BasicActorRef> {
    fn from(actor: &ActorRef<Msg>) -> Option<BasicActorRef> {
        Some(actor.inner.clone())
    }
}
