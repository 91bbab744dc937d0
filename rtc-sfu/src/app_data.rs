use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque application data attached to a transport or endpoint.
///
/// The transport stores and hands it back without ever inspecting it.
#[derive(Clone)]
pub struct AppData(Arc<dyn Any + Send + Sync>);

impl AppData {
    pub fn new<T: Any + Send + Sync>(app_data: T) -> Self {
        Self(Arc::new(app_data))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl Default for AppData {
    fn default() -> Self {
        Self::new(())
    }
}

impl fmt::Debug for AppData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppData").finish_non_exhaustive()
    }
}
