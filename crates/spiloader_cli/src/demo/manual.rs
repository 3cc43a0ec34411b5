//! Hand-registered provider for `example.Service`.

use super::{ManualService, MANUAL_CONTRACT};
use spiloader_core::{erase, ErasedInstance, ProviderEntry};

pub struct SomeImpl;

impl ManualService for SomeImpl {
    fn describe(&self) -> String {
        "SomeImpl (manual manifest)".to_string()
    }
}

fn construct() -> Result<ErasedInstance, String> {
    Ok(erase::<dyn ManualService>(Box::new(SomeImpl)))
}

pub(super) fn entry() -> ProviderEntry {
    ProviderEntry::new(MANUAL_CONTRACT, "impl.SomeImpl", module_path!(), construct)
}
