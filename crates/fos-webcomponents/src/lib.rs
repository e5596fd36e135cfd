//! fOS Web Components
//!
//! Mutation observers and custom element upgrades on top of the fOS DOM.
//!
//! # Overview
//! - [`MutationObserver`]: per-node bindings, coalesced records and
//!   batched delivery in observer creation order
//! - [`Realm::register_element`]: custom element types that upgrade plain
//!   tags, with `created`, `attached`, `detached` and `attributeChanged`
//!   callbacks
//! - [`Realm`]: the context object owning a document, its observers, the
//!   task queue driving delivery, and the element registry
//!
//! # Example
//! ```rust,ignore
//! use fos_webcomponents::{ElementOptions, Lifecycle, Realm, ReadyState};
//!
//! let mut realm = Realm::default();
//! realm.register_element("x-hello", ElementOptions::new().lifecycle(
//!     Lifecycle::new().on_attached(|_, el| { println!("{el:?} attached"); Ok(()) }),
//! ))?;
//! realm.set_ready_state(ReadyState::Complete);
//! realm.run_until_idle();
//! ```

mod bootstrap;
mod config;
mod error;
mod realm;
mod scheduler;

pub mod elements;
pub mod observer;

pub use bootstrap::{ReadyListener, ReadyState};
pub use config::{HostCapabilities, RealmConfig};
pub use elements::{
    AttributeChange, ElementConstructor, ElementDefinition, ElementOptions, ElementRegistry, Lifecycle, Prototype,
};
pub use error::{CallbackSource, Error, ObserveError, RegistrationError, Result, UnhandledError};
pub use observer::{MutationObserver, MutationObserverInit, MutationRecord, MutationType, ObserverId};
pub use realm::Realm;
pub use scheduler::{DeliveryScheduler, TaskId, TaskQueue, TickStrategy};

pub use fos_dom::{DomError, NodeId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
