//! 提交给 S3 的配置文档。
//!
//! 存储桶策略、CORS 规则和网站配置都由固定模板加上存储桶名称生成，
//! 在提交前不做额外校验。

use serde::Serialize;

/// 策略语言版本
const POLICY_VERSION: &str = "2012-10-17";

/// 计算静态网站的访问端点。
///
/// # 示例
///
/// ```
/// use static_site_setup::s3::website_endpoint;
///
/// assert_eq!(
///     website_endpoint("my-site", "eu-west-1"),
///     "http://my-site.s3-website.eu-west-1.amazonaws.com"
/// );
/// ```
pub fn website_endpoint(bucket: &str, region: &str) -> String {
    format!("http://{bucket}.s3-website.{region}.amazonaws.com")
}

/// 存储桶策略。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketPolicy {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub sid: String,
    pub effect: String,
    pub principal: String,
    pub action: String,
    pub resource: String,
}

impl BucketPolicy {
    /// 允许任何人读取存储桶内对象的策略。
    pub fn public_read(bucket: &str) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![PolicyStatement {
                sid: "PublicReadGetObject".to_string(),
                effect: "Allow".to_string(),
                principal: "*".to_string(),
                action: "s3:GetObject".to_string(),
                resource: format!("arn:aws:s3:::{bucket}/*"),
            }],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// CORS 配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorsDocument {
    #[serde(rename = "CORSRules")]
    pub cors_rules: Vec<CorsRuleDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CorsRuleDocument {
    pub allowed_headers: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_origins: Vec<String>,
    pub expose_headers: Vec<String>,
}

impl CorsDocument {
    /// 允许任意来源通过 GET 和 HEAD 读取内容。
    pub fn permissive() -> Self {
        Self {
            cors_rules: vec![CorsRuleDocument {
                allowed_headers: vec!["*".to_string()],
                allowed_methods: vec!["GET".to_string(), "HEAD".to_string()],
                allowed_origins: vec!["*".to_string()],
                expose_headers: Vec::new(),
            }],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// 网站托管配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebsiteDocuments {
    pub index_document: IndexDocument,
    pub error_document: ErrorDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexDocument {
    pub suffix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorDocument {
    pub key: String,
}

impl WebsiteDocuments {
    pub fn new(index: &str, error: &str) -> Self {
        Self {
            index_document: IndexDocument {
                suffix: index.to_string(),
            },
            error_document: ErrorDocument {
                key: error.to_string(),
            },
        }
    }

    pub fn index(&self) -> &str {
        &self.index_document.suffix
    }

    pub fn error(&self) -> &str {
        &self.error_document.key
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
