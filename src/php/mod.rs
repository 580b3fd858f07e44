//! PHP source introspection.
//!
//! A small token scanner ([`lexer`]), the namespace/class locator built on
//! it ([`locate`]), and the signature extractor recovering a
//! [`introspect::ClassDescriptor`] from a file's token stream
//! ([`introspect`]). This is deliberately not a full PHP parser: it recovers
//! exactly the facts needed to generate calling stubs.

pub mod introspect;
pub mod lexer;
pub mod locate;
