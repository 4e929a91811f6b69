pub(crate) mod logger;
pub(crate) mod system;

use std::error::Error;
use std::fmt;

pub use self::system::{ActorSystem, SystemBuilder, WaitTimeout};

use crate::actor::{ActorPath, BasicActorRef, Fault};

/// Runtime control messages. Every variant is interpreted by the
/// receiving cell on its own queue, in order with user messages.
#[derive(Clone, Debug)]
pub enum SystemMsg {
    /// Runs `pre_start`; always the first task of a new cell
    ActorInit,

    /// Lifecycle command for the receiving actor
    Command(ActorCmd),

    /// Event notification from elsewhere in the tree
    Event(SystemEvent),

    /// An actor fault, signalled locally or escalated by a child
    Failed(Fault),

    /// Undeliverable message notification
    DeadLetter(Box<DeadLetter>),
}

#[derive(Clone, Copy, Debug)]
pub enum ActorCmd {
    /// Stop the actor after its children have stopped. Cooperative:
    /// messages queued ahead of the command are still processed.
    Stop,

    /// Rebuild the actor in place from its producer.
    Restart,
}

#[derive(Clone, Debug)]
pub enum SystemEvent {
    /// Sent by a child to its parent once the child has fully
    /// stopped. Exactly one per actor, ever.
    ActorTerminated(BasicActorRef),
}

/// A message that could not be delivered.
#[derive(Clone, Debug)]
pub struct DeadLetter {
    pub msg: String,
    pub sender: Option<ActorPath>,
    pub recipient: ActorPath,
}

impl DeadLetter {
    pub(crate) fn new(msg: String, sender: Option<ActorPath>, recipient: ActorPath) -> DeadLetter {
        DeadLetter {
            msg,
            sender,
            recipient,
        }
    }
}

impl fmt::Display for DeadLetter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.sender {
            Some(sender) => write!(
                f,
                "DeadLetter: {} => {} ({})",
                sender, self.recipient, self.msg
            ),
            None => write!(f, "DeadLetter: {} ({})", self.recipient, self.msg),
        }
    }
}

pub enum SystemError {
    InvalidName(String),
}

impl Error for SystemError {}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SystemError::InvalidName(name) => write!(
                f,
                "Failed to create actor system. Cause: Invalid actor system name ({})",
                name
            ),
        }
    }
}

impl fmt::Debug for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
