/// Hardware execution providers to try for the face models, best first.
///
/// ONNX Runtime falls back to the CPU provider when none of these register.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    fn test_cpu_only_platforms_register_nothing_extra() {
        assert!(preferred_execution_providers().is_empty());
    }
}
