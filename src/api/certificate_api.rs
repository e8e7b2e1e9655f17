// ==========================================
// 培训机构门户后台 - 证书管理API
// ==========================================
// 职责: 封装后台证书 CRUD / 批量导入 与 公开验证查询
// 鉴权: 除 verify 外全部要求管理员 token
// ==========================================

use crate::api::auth::{require_admin, TokenVerifier};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::certificate::{CertificateInput, CertificateRecord, ImportOutcome};
use crate::importer::CertificateImporter;
use crate::repository::CertificateRepository;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// 批量创建响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateResponse {
    /// 落库后的完整记录
    pub certificates: Vec<CertificateRecord>,
    /// 提交行数
    pub attempted: usize,
    /// 批次ID
    pub batch_id: String,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

impl From<ImportOutcome> for BulkCreateResponse {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            certificates: outcome.created,
            attempted: outcome.attempted,
            batch_id: outcome.batch_id,
            elapsed_ms: outcome.elapsed_ms,
        }
    }
}

/// 公开验证响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    pub certificate: CertificateRecord,
}

// ==========================================
// CertificateApi
// ==========================================
pub struct CertificateApi {
    repo: Arc<dyn CertificateRepository>,
    importer: CertificateImporter,
    verifier: Arc<dyn TokenVerifier>,
}

impl CertificateApi {
    pub fn new(repo: Arc<dyn CertificateRepository>, verifier: Arc<dyn TokenVerifier>) -> Self {
        let importer = CertificateImporter::new(repo.clone());
        Self {
            repo,
            importer,
            verifier,
        }
    }

    /// 列出全部证书（后台列表页）
    pub async fn list(&self, authorization: Option<&str>) -> ApiResult<Vec<CertificateRecord>> {
        require_admin(self.verifier.as_ref(), authorization)?;
        Ok(self.repo.list_all().await?)
    }

    /// 单条创建
    #[instrument(skip(self, authorization, input))]
    pub async fn create(
        &self,
        authorization: Option<&str>,
        input: CertificateInput,
    ) -> ApiResult<CertificateRecord> {
        require_admin(self.verifier.as_ref(), authorization)?;
        Ok(self.importer.create_single(input).await?)
    }

    /// 批量创建（JSON 数组载荷）
    ///
    /// 行号按电子表格习惯展示：数组下标 + 2（首行留给表头）
    #[instrument(skip(self, authorization, inputs), fields(rows = inputs.len()))]
    pub async fn bulk_create(
        &self,
        authorization: Option<&str>,
        inputs: Vec<CertificateInput>,
    ) -> ApiResult<BulkCreateResponse> {
        require_admin(self.verifier.as_ref(), authorization)?;

        let rows = inputs
            .into_iter()
            .enumerate()
            .map(|(idx, input)| {
                let mut row = input.into_raw_row();
                row.row_number = idx + 2;
                row
            })
            .collect();
        let outcome = self.importer.import_rows(rows).await?;
        Ok(outcome.into())
    }

    /// 从上传文件批量导入（.xlsx/.xls/.csv）
    #[instrument(skip(self, authorization, file_path))]
    pub async fn import_from_file<P: AsRef<Path>>(
        &self,
        authorization: Option<&str>,
        file_path: P,
    ) -> ApiResult<BulkCreateResponse> {
        require_admin(self.verifier.as_ref(), authorization)?;
        let outcome = self.importer.import_file(file_path).await?;
        Ok(outcome.into())
    }

    /// 编辑证书（查重排除自身）
    #[instrument(skip(self, authorization, input))]
    pub async fn update(
        &self,
        authorization: Option<&str>,
        id: i64,
        input: CertificateInput,
    ) -> ApiResult<CertificateRecord> {
        require_admin(self.verifier.as_ref(), authorization)?;
        Ok(self.importer.update_single(id, input).await?)
    }

    /// 删除证书（物理删除）
    #[instrument(skip(self, authorization))]
    pub async fn delete(&self, authorization: Option<&str>, id: i64) -> ApiResult<()> {
        require_admin(self.verifier.as_ref(), authorization)?;
        self.repo.delete(id).await?;
        info!(id, "证书已删除");
        Ok(())
    }

    /// 公开验证查询（无鉴权）
    ///
    /// # 参数
    /// - certificate_no: 证书编号（前后空白会被剔除）
    pub async fn verify_certificate(&self, certificate_no: &str) -> ApiResult<VerifyResponse> {
        let certificate_no = certificate_no.trim();
        if certificate_no.is_empty() {
            return Err(ApiError::ValidationError(
                "Certificate number is required".to_string(),
            ));
        }

        let found = self.repo.find_by_certificate_no(certificate_no).await?;
        match found {
            Some(certificate) => Ok(VerifyResponse {
                valid: true,
                certificate,
            }),
            None => Err(ApiError::NotFound("Certificate not found".to_string())),
        }
    }
}
