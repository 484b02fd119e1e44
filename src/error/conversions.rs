//! 错误类型转换实现

use super::EntrypointError;

impl From<toml::de::Error> for EntrypointError {
    fn from(err: toml::de::Error) -> Self {
        EntrypointError::config(format!("TOML 解析错误: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn toml_errors_become_config_errors() {
        let err: EntrypointError = toml::from_str::<toml::Value>("port = ")
            .unwrap_err()
            .into();
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_retryable());
    }

    #[test]
    fn io_errors_keep_their_message() {
        let err: EntrypointError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.category(), ErrorCategory::Io);
        assert!(err.to_string().contains("missing"));
    }
}
