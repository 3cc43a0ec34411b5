use super::AutoService;

#[derive(Default)]
pub struct AutoAlpha;

impl AutoService for AutoAlpha {
    fn describe(&self) -> String {
        "AutoAlpha (generated manifest)".to_string()
    }
}

spiloader_core::submit_provider!(dyn AutoService, "impl.AutoAlpha", AutoAlpha::default);
