use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_upload_mb: u64,
    pub max_image_dimension: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            port: env::var("EXIF_SCOPE_PORT")
                .unwrap_or_else(|_| "19280".to_string())
                .parse()?,
            max_upload_mb: env::var("EXIF_SCOPE_MAX_UPLOAD_MB")
                .unwrap_or_else(|_| "25".to_string())
                .parse()?,
            max_image_dimension: env::var("EXIF_SCOPE_MAX_IMAGE_DIMENSION")
                .unwrap_or_else(|_| "20000".to_string())
                .parse()?,
        })
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_upload_bytes() {
        let config = Config {
            port: 19280,
            max_upload_mb: 2,
            max_image_dimension: 20000,
        };
        assert_eq!(config.max_upload_bytes(), 2 * 1024 * 1024);
    }
}
