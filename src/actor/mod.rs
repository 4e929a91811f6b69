pub(crate) mod actor;
pub(crate) mod actor_cell;
pub(crate) mod actor_ref;
pub(crate) mod path;
pub(crate) mod props;

pub use self::actor::{Actor, ActorError, BoxActor, Fault, Strategy};
pub use self::actor_cell::Context;
pub use self::actor_ref::{ActorRef, ActorReference, BasicActorRef, Sender};
pub use self::path::ActorPath;
pub use self::props::{ActorArgs, ActorProducer, BoxActorProd, Props};

pub(crate) use self::actor_ref::resolve;
