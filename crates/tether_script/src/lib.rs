//! Tether Scripting Boundary
//!
//! The script side of the native/script boundary:
//!
//! - **World:** identity and validity queries, always answered by the native host
//! - **Components:** typed proxies bound to (owner, kind), re-validated on every use
//! - **Dispatcher:** the per-frame update signal with snapshot iteration
//! - **Runtime:** script lifecycle (create, start, update, destroy) and driver hooks
//! - **Marshal:** fixed-layout records decoded from native byte buffers
//!
//! The native engine itself sits behind [`NativeHost`]. [`headless::HeadlessHost`]
//! is an in-memory implementation for tools and tests.

pub mod component;
pub mod components;
pub mod context;
pub mod dispatch;
mod error;
pub mod headless;
pub mod host;
pub mod marshal;
pub mod physics;
pub mod runtime;
pub mod script;
pub mod settings;
pub mod world;

pub use component::ComponentHandle;
pub use context::{Commands, ScriptContext};
pub use dispatch::{DispatchReport, Dispatcher, SubscriptionToken};
pub use error::{BoundaryError, ScriptResult};
pub use host::NativeHost;
pub use marshal::{Collision, ContactPoint, PayloadError, Ray, RaycastHit};
pub use physics::RaycastOptions;
pub use runtime::ScriptRuntime;
pub use script::{LifecycleState, Script, ScriptId};
pub use settings::RuntimeSettings;
pub use world::World;
