//! Where to download a module from.
//!
//! Given a [`PackageRef`] and whether it is private, [`SourceResolver`] produces an
//! ordered list of [`SourceCandidate`]s across three addressing schemes: a shared
//! module proxy, archives served by a version-control host, and path-based module
//! registries. Version-control metadata ([`Origin`]) is gathered through an ordered
//! chain of [`OriginProvider`]s; the first one with an answer wins.

pub use self::candidate::{SourceCandidate, StrategyKind};
pub use self::error::{ProviderError, ResolveError, Result};
pub use self::escape::{escape_path, escape_version};
pub use self::origin::{ModuleInfo, Origin, OriginChain, OriginProvider, ToolLookup, VersionInference};
pub use self::package::PackageRef;
pub use self::privacy::PrivacyMatcher;
pub use self::resolver::{DEFAULT_VCS_HOST, Resolution, SCHEMA_REGISTRY_INFIX, SourceResolver};

mod candidate;
mod error;
mod escape;
mod origin;
mod package;
mod privacy;
mod resolver;
