//! Stand-in implementations of the capability traits `dispatch`/`identity`
//! depend on (`ModelProvider`, `CommandRegistry`, `MemoryStore`, `Notifier`).
//! A production deployment plugs in a real model backend, extension
//! registry, memory/embedding store, and mail/SMS transport behind these
//! same traits; wiring a concrete one is out of scope here.

mod logging_notifier;
mod stub_memory;
mod stub_provider;
mod stub_registry;

pub use logging_notifier::LoggingNotifier;
pub use stub_memory::StubMemoryStore;
pub use stub_provider::StubModelProvider;
pub use stub_registry::StubCommandRegistry;
