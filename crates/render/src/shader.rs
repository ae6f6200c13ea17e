use crate::ShaderError;
use std::collections::BTreeMap;

/// Provides shader source text by logical name.
pub trait ShaderSource {
    fn load_shader(&self, name: &str) -> Result<String, ShaderError>;
}

/// In-memory sources keyed by name.
impl ShaderSource for BTreeMap<String, String> {
    fn load_shader(&self, name: &str) -> Result<String, ShaderError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| ShaderError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_source_reports_missing_names() {
        let mut sources = BTreeMap::new();
        sources.insert("base".to_string(), "// wgsl".to_string());
        assert_eq!(sources.load_shader("base").unwrap(), "// wgsl");
        assert!(matches!(
            sources.load_shader("fancy"),
            Err(ShaderError::NotFound(name)) if name == "fancy"
        ));
    }
}
