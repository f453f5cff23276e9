//! S-expression event format and plist helpers.
//!
//! Actions leave the process as IPC-style event s-expressions; the same
//! plist conventions are used for the config file.

pub mod sexp;
