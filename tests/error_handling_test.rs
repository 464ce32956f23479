#[cfg(test)]
mod tests {
    use crate::error::EngineError;

    #[test]
    fn test_error_creation() {
        let error = EngineError::new("Config unreadable", "config");
        assert_eq!(error.message, "Config unreadable");
        assert_eq!(error.stage, "config");
        assert!(error.model.is_none());
    }

    #[test]
    fn test_error_builders() {
        let error = EngineError::new("Request failed", "http")
            .with_model("qwen2.5:7b-instruct")
            .with_context("student s1")
            .with_source("reqwest");
        assert_eq!(error.model.as_deref(), Some("qwen2.5:7b-instruct"));
        assert_eq!(error.context.as_deref(), Some("student s1"));
        assert_eq!(error.source.as_deref(), Some("reqwest"));
    }

    #[test]
    fn test_error_display() {
        let error = EngineError::new("Request failed", "http")
            .with_context("student s1")
            .with_model("m");
        let display = format!("{}", error);
        assert!(display.starts_with("[http] Request failed"));
        assert!(display.contains("(model: m)"));
        assert!(display.contains("(context: student s1)"));
    }

    #[test]
    fn test_conversions_pick_stage() {
        let io: EngineError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(io.stage, "io");

        let json: EngineError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(json.stage, "json_parse");

        let toml: EngineError = toml::from_str::<toml::Value>("a = ").unwrap_err().into();
        assert_eq!(toml.stage, "config");

        let any: EngineError = anyhow::anyhow!("inner").context("outer").into();
        assert_eq!(any.stage, "unknown");
        assert!(any.message.contains("outer: inner"));
    }

    #[tokio::test]
    async fn test_elapsed_is_timeout() {
        let elapsed = tokio::time::timeout(
            std::time::Duration::from_millis(1),
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();
        let error: EngineError = elapsed.into();
        assert_eq!(error.stage, "timeout");
    }

    #[test]
    fn test_error_serializes() {
        let error = EngineError::new("x", "io");
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["stage"], "io");
    }
}
