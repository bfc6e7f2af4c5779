//! A client library for resolving and installing packages from NuGet-style feeds.

#![deny(missing_docs)]

mod config;
pub mod feed;
mod feed_url;
pub mod log;
pub mod manifest;
pub mod range;
pub mod restore;
pub mod version;

pub use self::config::*;
pub use self::feed_url::*;
pub use self::log::{LogCode, LogEvent, LogLevel, RestoreLogger};
pub use self::range::{FloatBehavior, FloatRange, RangeError, VersionRange};
pub use self::restore::{
    FeedRestoreEngine, LockFileLibrary, RestoreEngine, RestoreError, RestoreOutcome,
    RestoreRequest, UnresolvedRequest,
};
pub use self::version::{NuGetVersion, VersionError};
