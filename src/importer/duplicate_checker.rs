// ==========================================
// 培训机构门户后台 - 重复检查器
// ==========================================
// 职责: 对候选批次做一次存在性查询，按两个唯一键
//       （certificate_no / registration_no）切分 冲突 vs 唯一
// 红线: 预查只为给出可读的错误消息；并发窗口下的正确性
//       由存储层 UNIQUE 约束兜底，不由本组件保证
// ==========================================

use crate::domain::certificate::NewCertificate;
use crate::repository::certificate_repo::CertificateRepository;
use crate::repository::error::RepositoryError;
use std::collections::HashSet;

/// 查重切分结果
#[derive(Debug, Clone)]
pub struct DuplicatePartition {
    /// 与已存记录冲突的标识符全集（两键并集，去重，保持首见顺序）
    pub conflicts: Vec<String>,
    /// 两个唯一键都不与已存记录冲突的候选子集
    pub unique: Vec<NewCertificate>,
}

/// 对候选批次执行存储层查重
///
/// 单次查询：已存记录的 certificate_no 命中批次证书号集合，
/// 或 registration_no 命中批次注册号集合，均计入冲突
pub async fn partition_against_store(
    repo: &dyn CertificateRepository,
    candidates: Vec<NewCertificate>,
) -> Result<DuplicatePartition, RepositoryError> {
    let certificate_nos: Vec<String> = candidates
        .iter()
        .map(|c| c.certificate_no.clone())
        .collect();
    let registration_nos: Vec<String> = candidates
        .iter()
        .map(|c| c.registration_no.clone())
        .collect();

    let existing = repo
        .find_existing_keys(&certificate_nos, &registration_nos)
        .await?;

    let existing_cert_nos: HashSet<&str> =
        existing.iter().map(|(cert_no, _)| cert_no.as_str()).collect();
    let existing_reg_nos: HashSet<&str> =
        existing.iter().map(|(_, reg_no)| reg_no.as_str()).collect();

    let mut conflicts = Vec::new();
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for candidate in candidates {
        let cert_conflict = existing_cert_nos.contains(candidate.certificate_no.as_str());
        let reg_conflict = existing_reg_nos.contains(candidate.registration_no.as_str());

        if cert_conflict && seen.insert(candidate.certificate_no.clone()) {
            conflicts.push(candidate.certificate_no.clone());
        }
        if reg_conflict && seen.insert(candidate.registration_no.clone()) {
            conflicts.push(candidate.registration_no.clone());
        }

        if !cert_conflict && !reg_conflict {
            unique.push(candidate);
        }
    }

    Ok(DuplicatePartition { conflicts, unique })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::certificate_repo_impl::CertificateRepositoryImpl;
    use chrono::{TimeZone, Utc};

    fn candidate(cert_no: &str, reg_no: &str) -> NewCertificate {
        NewCertificate {
            student_name: "Amit Kumar".to_string(),
            course_name: "Web Development".to_string(),
            duration: "6 Months".to_string(),
            certificate_no: cert_no.to_string(),
            fathers_name: "Raj Kumar".to_string(),
            institute: "NKB Institute".to_string(),
            registration_no: reg_no.to_string(),
            issued_at: Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap(),
        }
    }

    async fn seeded_repo() -> CertificateRepositoryImpl {
        let repo = CertificateRepositoryImpl::new_in_memory().unwrap();
        repo.insert_one(candidate("CERT-EXISTING", "REG-EXISTING"))
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_clean_batch_has_no_conflicts() {
        let repo = seeded_repo().await;
        let partition = partition_against_store(
            &repo,
            vec![candidate("CERT-1", "REG-1"), candidate("CERT-2", "REG-2")],
        )
        .await
        .unwrap();

        assert!(partition.conflicts.is_empty());
        assert_eq!(partition.unique.len(), 2);
    }

    #[tokio::test]
    async fn test_existing_certificate_no_flagged() {
        let repo = seeded_repo().await;
        let partition = partition_against_store(
            &repo,
            vec![
                candidate("CERT-EXISTING", "REG-1"),
                candidate("CERT-2", "REG-2"),
            ],
        )
        .await
        .unwrap();

        assert_eq!(partition.conflicts, vec!["CERT-EXISTING".to_string()]);
        // 唯一子集只剩两键都干净的候选
        assert_eq!(partition.unique.len(), 1);
        assert_eq!(partition.unique[0].certificate_no, "CERT-2");
    }

    #[tokio::test]
    async fn test_both_keys_conflict_deduplicated_union() {
        let repo = seeded_repo().await;
        let partition = partition_against_store(
            &repo,
            vec![candidate("CERT-EXISTING", "REG-EXISTING")],
        )
        .await
        .unwrap();

        // 两个键都冲突：并集包含两个标识符，各一次
        assert_eq!(
            partition.conflicts,
            vec!["CERT-EXISTING".to_string(), "REG-EXISTING".to_string()]
        );
        assert!(partition.unique.is_empty());
    }

    #[tokio::test]
    async fn test_registration_no_alone_conflicts() {
        let repo = seeded_repo().await;
        let partition = partition_against_store(
            &repo,
            vec![candidate("CERT-NEW", "REG-EXISTING")],
        )
        .await
        .unwrap();

        assert_eq!(partition.conflicts, vec!["REG-EXISTING".to_string()]);
        assert!(partition.unique.is_empty());
    }
}
