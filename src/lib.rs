//! Beescope: dirty-checking scopes. Watch derived values, digest until stable.
//!
//! # Architecture
//!
//! ```text
//! Scope (fields + watcher registry)
//!   │
//!   ├── watch(Watch)   register evaluate / listener / equality strategy
//!   │
//!   └── digest()       passes until clean, at most `ttl` dirty passes
//!         └── run_once()   evaluate in order, notify, short-circuit
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use beescope::{Scope, Value, Watch};
//!
//! let mut scope: Scope = Scope::new();
//! scope.set("first", "Ada");
//! scope.watch(
//!     Watch::new(|s: &mut Scope| s.field("first"))
//!         .with_listener(|new, _old, s| { s.set("greeting", format!("Hello, {:?}", new)); }),
//! );
//! scope.digest()?;
//! ```
//!
//! # Features
//!
//! - `native` - logging subscriber and the `beescope` CLI

pub mod config;
pub mod error;
pub mod scope;
pub mod value;

#[cfg(feature = "native")]
pub mod logging;

pub use config::DigestConfig;
pub use error::DigestError;
pub use scope::{Scope, Watch};
pub use value::{Value, WatchValue};
