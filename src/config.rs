#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub addr: String,
    pub cors_allowed_origins: Vec<String>,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3050".to_owned(),
            cors_allowed_origins: vec!["*".to_owned()],
            limits: LimitsConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("SERVICE_ADDR") {
            config.addr = addr;
        }
        if let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
            config.cors_allowed_origins = origins.split(',').map(|s| s.trim().to_owned()).collect();
        }
        config
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LimitsConfig {
    pub input_payload_max_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            input_payload_max_size: 10 * 1024 * 1024,
        }
    }
}

pub fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => matches!(value.as_str(), "1" | "true" | "TRUE" | "yes"),
        Err(_) => default,
    }
}
