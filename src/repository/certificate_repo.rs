// ==========================================
// 培训机构门户后台 - 证书 Repository Trait
// ==========================================
// 职责: 定义证书数据访问接口（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::certificate::{CertificateRecord, NewCertificate};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// CertificateRepository Trait
// ==========================================
// 用途: 证书数据访问
// 实现者: CertificateRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// 列出全部证书（后台列表页）
    async fn list_all(&self) -> RepositoryResult<Vec<CertificateRecord>>;

    /// 按主键查询
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<CertificateRecord>>;

    /// 按证书编号查询（公开核验页）
    async fn find_by_certificate_no(
        &self,
        certificate_no: &str,
    ) -> RepositoryResult<Option<CertificateRecord>>;

    /// 存在性查询（查重预查，单次执行）
    ///
    /// # 参数
    /// - certificate_nos: 候选批次的证书编号集合
    /// - registration_nos: 候选批次的注册编号集合
    ///
    /// # 返回
    /// - 已存记录中 certificate_no 命中第一个集合 **或**
    ///   registration_no 命中第二个集合 的 (certificate_no, registration_no) 对
    async fn find_existing_keys(
        &self,
        certificate_nos: &[String],
        registration_nos: &[String],
    ) -> RepositoryResult<Vec<(String, String)>>;

    /// 单条记录的唯一键冲突检查
    ///
    /// # 参数
    /// - exclude_id: 编辑路径排除记录自身
    async fn has_conflicting_keys(
        &self,
        certificate_no: &str,
        registration_no: &str,
        exclude_id: Option<i64>,
    ) -> RepositoryResult<bool>;

    /// 单条插入并按唯一键回读
    ///
    /// # 返回
    /// - 含存储层主键与时间戳的完整记录
    /// - Err(UniqueConstraintViolation): 唯一键冲突（约束兜底）
    async fn insert_one(&self, certificate: NewCertificate)
        -> RepositoryResult<CertificateRecord>;

    /// 批量插入（单事务，全有或全无）
    ///
    /// # 契约
    /// - 事务内任一条失败（含 UNIQUE 约束命中）→ 整体回滚并报错
    /// - 提交成功后按 certificate_no/registration_no 回读，
    ///   返回含主键与时间戳的完整记录（不信任写入调用的生成值）
    async fn batch_insert(
        &self,
        certificates: Vec<NewCertificate>,
    ) -> RepositoryResult<Vec<CertificateRecord>>;

    /// 原地更新（校验规则与创建一致，由调用方保证）
    async fn update(
        &self,
        id: i64,
        certificate: NewCertificate,
    ) -> RepositoryResult<CertificateRecord>;

    /// 物理删除（无软删除）
    async fn delete(&self, id: i64) -> RepositoryResult<()>;

    /// 记录总数（后台统计 / 测试断言）
    async fn count(&self) -> RepositoryResult<i64>;
}
