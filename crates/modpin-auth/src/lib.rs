//! Credential lookup for authenticated downloads.
//!
//! Credentials come from a netrc-format file: `machine <host> login <user>
//! password <secret>` entries plus an optional `default` entry. The file is
//! parsed once and queried by host; an exact match wins over the default.
//!
//! ```
//! use modpin_auth::CredentialStore;
//!
//! let store = CredentialStore::parse("machine git.example.com login ci password s3cret");
//! let cred = store.lookup("git.example.com").unwrap();
//! assert_eq!(cred.login, "ci");
//! ```

pub use self::error::{AuthError, Result};
pub use self::store::{Credential, CredentialStore};

mod error;
mod parse;
mod store;
