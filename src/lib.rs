#![crate_name = "canopy"]
#![deny(clippy::all)]
#![allow(clippy::new_ret_no_self)]

mod validate;

pub mod actor;
pub mod kernel;
pub mod system;

use std::any::Any;
use std::env;
use std::fmt;
use std::fmt::Debug;

use config::{Config, File};

pub fn load_config() -> Config {
    let mut cfg = Config::new();

    cfg.set_default("debug", true).unwrap();
    cfg.set_default("log.level", "debug").unwrap();
    cfg.set_default("log.date_format", "%Y-%m-%d").unwrap();
    cfg.set_default("log.time_format", "%H:%M:%S%:z").unwrap();
    cfg.set_default("dispatcher.pool_size", (num_cpus::get() * 2) as i64)
        .unwrap();

    // load the system config
    // canopy.toml contains settings for anything related to the actor runtime
    let path = env::var("CANOPY_CONF").unwrap_or_else(|_| "config/canopy.toml".into());
    cfg.merge(File::with_name(&path).required(false)).unwrap();

    // load the user application config
    // app.toml or app.yaml contains settings specific to the user application
    let path = env::var("APP_CONF").unwrap_or_else(|_| "config/app".into());
    cfg.merge(File::with_name(&path).required(false)).unwrap();
    cfg
}

pub trait Message: Debug + Clone + Send + 'static {}
impl<T: Debug + Clone + Send + 'static> Message for T {}

/// A type-erased user message.
///
/// Typed references wrap the payload on the way in; the receiving
/// cell takes it back out with the concrete message type of its actor.
pub struct AnyMessage {
    msg: Option<Box<dyn Any + Send>>,
}

pub struct DowncastAnyMessageError;

impl AnyMessage {
    pub fn new<T>(msg: T) -> Self
    where
        T: Any + Message,
    {
        Self {
            msg: Some(Box::new(msg)),
        }
    }

    pub fn take<T>(&mut self) -> Result<T, DowncastAnyMessageError>
    where
        T: Any + Message,
    {
        match self.msg.take() {
            Some(m) if m.is::<T>() => Ok(*m.downcast::<T>().unwrap()),
            Some(m) => {
                self.msg = Some(m);
                Err(DowncastAnyMessageError)
            }
            None => Err(DowncastAnyMessageError),
        }
    }
}

impl Debug for AnyMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("AnyMessage")
    }
}

pub mod actors {
    pub use crate::actor::*;
    pub use crate::kernel::{Dispatcher, PoolDispatcher, SerialExecutor, ThreadDispatcher};
    pub use crate::system::*;
    pub use crate::{load_config, AnyMessage, Message};
}
