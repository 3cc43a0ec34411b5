use super::AutoService;

pub struct AutoBeta {
    greeting: &'static str,
}

impl AutoBeta {
    fn new() -> Self {
        Self { greeting: "hello" }
    }
}

impl AutoService for AutoBeta {
    fn describe(&self) -> String {
        format!("AutoBeta says {} (generated manifest)", self.greeting)
    }
}

spiloader_core::submit_provider!(dyn AutoService, "impl.AutoBeta", AutoBeta::new);
