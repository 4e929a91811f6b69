use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::actor::Actor;

/// Provides instances of `ActorProducer` for use when creating actors
/// (`actor_of`).
///
/// Actors are not created directly. Instead you provide an
/// `ActorProducer` that allows the system to start an actor when
/// `actor_of` is used, and to rebuild the actor in place when a
/// supervisor requests a restart.
pub struct Props;

impl Props {
    /// Creates an `ActorProducer` with no factory method parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use canopy::actors::*;
    ///
    /// struct User;
    ///
    /// impl User {
    ///     fn actor() -> Self {
    ///         User
    ///     }
    /// }
    ///
    /// impl Actor for User {
    ///     type Msg = String;
    ///     fn recv(&mut self, _ctx: &Context<String>, _msg: String, _sender: Sender) {}
    /// }
    ///
    /// // main
    /// let system = ActorSystem::new().unwrap();
    ///
    /// let props = Props::new(User::actor);
    ///
    /// // start the actor and get an `ActorRef`
    /// let actor = system.actor_of(props, "user");
    /// ```
    pub fn new<A, F>(creator: F) -> BoxActorProd<A>
    where
        A: Actor,
        F: Fn() -> A + Send + Sync + 'static,
    {
        Arc::new(ActorProps {
            creator,
            marker: PhantomData,
        })
    }

    /// Creates an `ActorProducer` with one or more factory method
    /// parameters. The parameters are cloned for each produced
    /// instance, including restarts.
    ///
    /// # Examples
    ///
    /// ```
    /// use canopy::actors::*;
    ///
    /// struct BankAccount {
    ///     name: String,
    ///     number: String,
    /// }
    ///
    /// impl BankAccount {
    ///     fn actor((name, number): (String, String)) -> Self {
    ///         BankAccount { name, number }
    ///     }
    /// }
    ///
    /// impl Actor for BankAccount {
    ///     type Msg = String;
    ///     fn recv(&mut self, _ctx: &Context<String>, _msg: String, _sender: Sender) {}
    /// }
    ///
    /// // main
    /// let system = ActorSystem::new().unwrap();
    ///
    /// let props = Props::new_args(BankAccount::actor,
    ///                             ("James Holden".into(), "12345678".into()));
    ///
    /// let actor = system.actor_of(props, "bank_account");
    /// ```
    pub fn new_args<A, Args, F>(creator: F, args: Args) -> BoxActorProd<A>
    where
        A: Actor,
        Args: ActorArgs,
        F: Fn(Args) -> A + Send + Sync + 'static,
    {
        Arc::new(ActorPropsWithArgs {
            creator,
            args,
            marker: PhantomData,
        })
    }
}

/// A `Clone`, `Send` and `Sync` `ActorProducer`
pub type BoxActorProd<A> = Arc<dyn ActorProducer<Actor = A>>;

/// The underlying factory for creating instances of an `Actor`.
pub trait ActorProducer: Send + Sync {
    type Actor: Actor;

    /// Produces an instance of an `Actor`.
    ///
    /// Invoked when the actor is first created and again on every
    /// restart, with any captured `Args` cloned each time.
    fn produce(&self) -> Self::Actor;
}

struct ActorProps<A, F>
where
    A: Actor,
    F: Fn() -> A + Send + Sync,
{
    creator: F,
    marker: PhantomData<fn() -> A>,
}

impl<A, F> ActorProducer for ActorProps<A, F>
where
    A: Actor,
    F: Fn() -> A + Send + Sync + 'static,
{
    type Actor = A;

    fn produce(&self) -> A {
        (self.creator)()
    }
}

struct ActorPropsWithArgs<A, Args, F>
where
    A: Actor,
    Args: ActorArgs,
    F: Fn(Args) -> A + Send + Sync,
{
    creator: F,
    args: Args,
    marker: PhantomData<fn() -> A>,
}

impl<A, Args, F> ActorProducer for ActorPropsWithArgs<A, Args, F>
where
    A: Actor,
    Args: ActorArgs,
    F: Fn(Args) -> A + Send + Sync + 'static,
{
    type Actor = A;

    fn produce(&self) -> A {
        (self.creator)(self.args.clone())
    }
}

impl<A: Actor> fmt::Debug for dyn ActorProducer<Actor = A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Props")
    }
}

pub trait ActorArgs: Clone + Send + Sync + 'static {}
impl<T: Clone + Send + Sync + 'static> ActorArgs for T {}
