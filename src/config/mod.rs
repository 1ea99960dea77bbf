use std::env;
use std::path::PathBuf;

/// Runtime configuration for the report server
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection string (default: "sqlite://users.db?mode=rwc")
    pub database_url: String,

    /// Directory receiving uploaded scans (default: "./uploads")
    pub upload_dir: PathBuf,

    /// Directory receiving generated PDF reports (default: "./static/reports")
    pub report_dir: PathBuf,

    /// ONNX export of the tumor classifier
    pub model_path: PathBuf,

    /// Square input resolution expected by the model (default: 128)
    pub model_input_size: u32,

    /// Maximum accepted upload size in bytes (default: 16 MB)
    pub max_file_size: usize,

    /// Optional account created at startup when absent
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,

    pub report: ReportConfig,
}

/// Fixed assets and boilerplate printed on every report
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Banner drawn behind the title; the whole header is skipped when missing
    pub header_image_path: PathBuf,
    /// Signature block image; the whole block is skipped when missing
    pub signature_image_path: PathBuf,
    pub doctor_name: String,
    pub doctor_title: String,
    pub contact: String,
    pub disclaimer: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            header_image_path: PathBuf::from("./static/images/hospital_image.jpg"),
            signature_image_path: PathBuf::from("./static/images/doctor signature.png"),
            doctor_name: "Dr. Sourendranath Roy".to_string(),
            doctor_title: "Chief Radiologist".to_string(),
            contact: "Contact: +91-9876543210 | Lifecare Diagnostics, Kolkata".to_string(),
            disclaimer:
                "Disclaimer: This is an AI-generated report. Please consult a certified doctor."
                    .to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://users.db?mode=rwc".to_string(),
            upload_dir: PathBuf::from("./uploads"),
            report_dir: PathBuf::from("./static/reports"),
            model_path: PathBuf::from("./models/brain_tumor.onnx"),
            model_input_size: 128,
            max_file_size: 16 * 1024 * 1024, // 16 MB
            admin_username: None,
            admin_password: None,
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();
        let report = default.report.clone();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            report_dir: env::var("REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.report_dir),

            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.model_path),

            model_input_size: env::var("MODEL_INPUT_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&v: &u32| v > 0)
                .unwrap_or(default.model_input_size),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            admin_username: env::var("ADMIN_USERNAME").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),

            report: ReportConfig {
                header_image_path: env::var("HEADER_IMAGE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(report.header_image_path),
                signature_image_path: env::var("SIGNATURE_IMAGE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(report.signature_image_path),
                doctor_name: env::var("REPORT_DOCTOR_NAME").unwrap_or(report.doctor_name),
                doctor_title: env::var("REPORT_DOCTOR_TITLE").unwrap_or(report.doctor_title),
                contact: env::var("REPORT_CONTACT").unwrap_or(report.contact),
                disclaimer: env::var("REPORT_DISCLAIMER").unwrap_or(report.disclaimer),
            },
        }
    }

    /// Seed credentials, present only when both halves are configured
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}
