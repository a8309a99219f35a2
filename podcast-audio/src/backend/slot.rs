//! Single "current handle" slot
//!
//! Holds zero or one live handle. Installing a new handle always releases the
//! previous one first, so two live handles never coexist in a slot.

use super::Releasable;
use tracing::debug;

pub struct HandleSlot<H: ?Sized> {
    current: Option<Box<H>>,
    label: &'static str,
}

impl<H: ?Sized + Releasable> HandleSlot<H> {
    pub fn new(label: &'static str) -> Self {
        Self { current: None, label }
    }

    pub fn is_live(&self) -> bool {
        self.current.is_some()
    }

    pub fn get(&self) -> Option<&H> {
        self.current.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut H> {
        self.current.as_deref_mut()
    }

    /// Install `handle`, releasing the previous one first
    pub async fn replace(&mut self, handle: Box<H>) {
        self.release().await;
        self.current = Some(handle);
        debug!("{} handle installed", self.label);
    }

    /// Detach the current handle without releasing it
    pub fn take(&mut self) -> Option<Box<H>> {
        self.current.take()
    }

    /// Release the current handle, if any. Returns true if one was released.
    pub async fn release(&mut self) -> bool {
        match self.current.take() {
            Some(handle) => {
                handle.release().await;
                debug!("{} handle released", self.label);
                true
            }
            None => false,
        }
    }
}

impl<H: ?Sized> std::fmt::Debug for HandleSlot<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleSlot")
            .field("label", &self.label)
            .field("live", &self.current.is_some())
            .finish()
    }
}
