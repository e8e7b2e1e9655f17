// ==========================================
// 培训机构门户后台 - 证书导入编排器
// ==========================================
// 职责: 整合导入流程，从上传文件到数据库
// 流程: 解析 → 逐行校验/归一化 → 存储层查重 → 事务化落库 → 回读
// 状态机: Validating → CheckingDuplicates → Writing → Done，
//         任一阶段可中止（错误即 Aborted 终态）
// ==========================================

use crate::domain::certificate::{CertificateInput, CertificateRecord, ImportOutcome, RawImportRow};
use crate::importer::duplicate_checker::partition_against_store;
use crate::importer::error::ImportError;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::field_validator::validate_row;
use crate::importer::row_processor::process_rows;
use crate::repository::certificate_repo::CertificateRepository;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 导入阶段（tracing 标注用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Validating,
    CheckingDuplicates,
    Writing,
    Done,
}

impl ImportStage {
    fn as_str(&self) -> &'static str {
        match self {
            ImportStage::Validating => "validating",
            ImportStage::CheckingDuplicates => "checking_duplicates",
            ImportStage::Writing => "writing",
            ImportStage::Done => "done",
        }
    }
}

// ==========================================
// CertificateImporter - 导入编排器
// ==========================================
pub struct CertificateImporter {
    // 数据访问层（显式注入，不用进程级单例）
    repo: Arc<dyn CertificateRepository>,
}

impl CertificateImporter {
    /// 创建新的导入编排器
    ///
    /// # 参数
    /// - repo: 证书仓储（按请求注入）
    pub fn new(repo: Arc<dyn CertificateRepository>) -> Self {
        Self { repo }
    }

    /// 从上传文件批量导入证书
    ///
    /// # 参数
    /// - file_path: 上传文件路径（.xlsx/.xls/.csv，仅第一个工作表）
    #[instrument(skip(self, file_path), fields(batch_id))]
    pub async fn import_file<P: AsRef<Path>>(
        &self,
        file_path: P,
    ) -> Result<ImportOutcome, ImportError> {
        let path = file_path.as_ref();
        debug!(file = %path.display(), "解析上传文件");
        let rows = UniversalFileParser.parse(path)?;
        self.import_rows(rows).await
    }

    /// 批量导入已提取的行（JSON 批量载荷与文件路径共用）
    ///
    /// # 契约
    /// - 任一行校验失败 → 整批中止，返回完整逐行错误（不落库）
    /// - 任一标识符与已存记录冲突 → 整批中止（全有或全无）
    /// - 落库为单事务；提交后按唯一键回读作为响应载荷
    pub async fn import_rows(
        &self,
        rows: Vec<RawImportRow>,
    ) -> Result<ImportOutcome, ImportError> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let attempted = rows.len();
        info!(batch_id = %batch_id, rows = attempted, "开始批量导入证书");

        // === 阶段 1: Validating ===
        debug!(stage = ImportStage::Validating.as_str(), "逐行校验与归一化");
        let outcome = process_rows(&rows);
        if !outcome.errors.is_empty() {
            warn!(
                batch_id = %batch_id,
                failed = outcome.errors.len(),
                valid = outcome.valid.len(),
                "校验失败，整批中止"
            );
            return Err(ImportError::InvalidRecords {
                errors: outcome.errors,
            });
        }
        if outcome.valid.is_empty() {
            warn!(batch_id = %batch_id, "上传不含有效数据行");
            return Err(ImportError::NoValidRecords);
        }

        // === 阶段 2: CheckingDuplicates ===
        debug!(
            stage = ImportStage::CheckingDuplicates.as_str(),
            candidates = outcome.valid.len(),
            "存储层查重"
        );
        let partition = partition_against_store(self.repo.as_ref(), outcome.valid).await?;
        if !partition.conflicts.is_empty() {
            warn!(
                batch_id = %batch_id,
                conflicts = partition.conflicts.len(),
                "发现重复标识符，整批中止"
            );
            return Err(ImportError::DuplicateEntries {
                identifiers: partition.conflicts,
            });
        }

        // === 阶段 3: Writing ===
        debug!(
            stage = ImportStage::Writing.as_str(),
            count = partition.unique.len(),
            "事务化批量写入"
        );
        // 预查通过后仍可能被 UNIQUE 约束拒绝（并发窗口）；
        // From<RepositoryError> 把约束违反折算回重复键错误
        let created = self.repo.batch_insert(partition.unique).await?;

        // === 阶段 4: Done ===
        let elapsed_ms = start_time.elapsed().as_millis() as i64;
        info!(
            batch_id = %batch_id,
            stage = ImportStage::Done.as_str(),
            created = created.len(),
            attempted,
            elapsed_ms,
            "批量导入完成"
        );

        Ok(ImportOutcome {
            batch_id,
            created,
            errors: Vec::new(),
            attempted,
            elapsed_ms,
        })
    }

    /// 单条创建路径：同一三阶段契约收缩到基数 1
    ///
    /// 校验一条 → 两个唯一键各自查重 → 单条写入并返回
    #[instrument(skip(self, input))]
    pub async fn create_single(
        &self,
        input: CertificateInput,
    ) -> Result<CertificateRecord, ImportError> {
        // Validating（单条路径错误不带行号前缀）
        let row = input.into_raw_row();
        let issued_at = validate_row(&row).map_err(ImportError::ValidationFailed)?;
        let candidate = crate::importer::row_processor::process_rows(std::slice::from_ref(&row))
            .valid
            .into_iter()
            .next()
            .ok_or_else(|| {
                // validate_row 已通过，此分支不可达；兜底而不 panic
                ImportError::ValidationFailed("Request payload is empty".to_string())
            })?;
        debug_assert_eq!(candidate.issued_at, issued_at);

        // CheckingDuplicates
        let conflict = self
            .repo
            .has_conflicting_keys(&candidate.certificate_no, &candidate.registration_no, None)
            .await?;
        if conflict {
            return Err(ImportError::DuplicateKey);
        }

        // Writing（约束兜底同批量路径）
        let created = self.repo.insert_one(candidate).await?;
        info!(id = created.id, certificate_no = %created.certificate_no, "证书创建完成");
        Ok(created)
    }

    /// 编辑路径：同样的校验规则，查重时排除记录自身
    #[instrument(skip(self, input))]
    pub async fn update_single(
        &self,
        id: i64,
        input: CertificateInput,
    ) -> Result<CertificateRecord, ImportError> {
        let row = input.into_raw_row();
        validate_row(&row).map_err(ImportError::ValidationFailed)?;
        let candidate = crate::importer::row_processor::process_rows(std::slice::from_ref(&row))
            .valid
            .into_iter()
            .next()
            .ok_or_else(|| {
                ImportError::ValidationFailed("Request payload is empty".to_string())
            })?;

        let conflict = self
            .repo
            .has_conflicting_keys(
                &candidate.certificate_no,
                &candidate.registration_no,
                Some(id),
            )
            .await?;
        if conflict {
            return Err(ImportError::DuplicateKey);
        }

        let updated = self.repo.update(id, candidate).await?;
        info!(id = updated.id, "证书更新完成");
        Ok(updated)
    }
}
