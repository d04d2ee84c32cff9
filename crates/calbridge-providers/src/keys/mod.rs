//! Key chain of the encrypted provider.
//!
//! ```text
//! passphrase ──unlock──▶ address keyring
//!                             │ decrypt member passphrase
//!                             ▼
//!                     calendar passphrase ──unlock──▶ calendar keyring
//! ```
//!
//! [`KeyUnlocker`] produces the address keyring. [`CalendarKeyResolver`]
//! memoizes it and derives, then caches, one keyring per calendar.

mod resolver;
mod unlock;

pub use resolver::CalendarKeyResolver;
pub use unlock::{KeyUnlocker, UnlockOutcome};
