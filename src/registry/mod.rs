//! Session registry
//!
//! The registry owns every ingestion session and hands out shared handles to
//! request handlers. Repeated opens of the same source address share one
//! session, so a camera is pulled once no matter how many viewers ask for it.
//!
//! # Architecture
//!
//! ```text
//!                     Arc<SessionRegistry>
//!              ┌──────────────────────────────────┐
//!              │ sessions:  DashMap<Id, Session>  │
//!              │ addresses: DashMap<Url, Id>      │
//!              │ gates:     DashMap<Url, Mutex>   │
//!              │ events:    broadcast::Sender     │
//!              └────────────────┬─────────────────┘
//!                               │
//!         ┌─────────────────────┼──────────────────────┐
//!         │                     │                      │
//!         ▼                     ▼                      ▼
//!   open(url)             get(id).playlist()     subscribe()
//!   get-or-create         get(id).segment()      Stopped | Error
//!   + start
//! ```
//!
//! The registry is an ordinary value: create one, wrap it in an `Arc` and pass
//! it to whatever serves the playlists.

pub mod config;
pub mod error;
pub mod store;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use store::SessionRegistry;
