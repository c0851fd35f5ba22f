//! Taxonode execution engine.
//!
//! The engine turns input items into HTTP requests for a node operation:
//! parameter visibility is resolved through the registry, each item is
//! compiled into a [`RequestPlan`](taxonode_types::RequestPlan) by the
//! [`RequestCompiler`], and plans are sent through a [`Transport`].

pub mod coerce;
pub mod compiler;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod transport;

pub use compiler::{RequestCompiler, compile};
pub use credentials::{CredentialProvider, EnvCredentialProvider, StaticCredentials};
pub use error::{CompileError, EngineError};
pub use executor::Executor;
pub use transport::{HttpTransport, Transport};
