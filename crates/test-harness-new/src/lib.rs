//! Cross-crate scenario and property tests (§8) driven through the flat
//! command API rather than the `Engine` methods directly, so these tests
//! exercise the same surface a real client would.

pub mod helpers;

#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;
