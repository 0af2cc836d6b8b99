// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared, cloneable function values attached to node types and ports.

use std::fmt;
use std::sync::Arc;

/// A reference-counted callback.
///
/// Node types and port templates carry their policy hooks as plain data
/// (`Callback<dyn Fn(..)>`) so registries stay cheap to clone and can be
/// shared between the layout pass and the interaction loop.
pub struct Callback<F: ?Sized>(Arc<F>);

impl<F: ?Sized> Callback<F> {
    /// Borrow the underlying function
    pub fn get(&self) -> &F {
        &self.0
    }
}

impl<F: ?Sized> From<Arc<F>> for Callback<F> {
    fn from(f: Arc<F>) -> Self {
        Self(f)
    }
}

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}
