// ==========================================
// 批量导入管道集成测试
// ==========================================
// 测试目标: 文件解析 → 校验 → 查重 → 事务写入 全链路
// ==========================================

mod test_helpers;

use institute_portal::domain::certificate::CertificateInput;
use institute_portal::importer::{CertificateImporter, ImportError};
use institute_portal::logging;
use institute_portal::repository::{CertificateRepository, CertificateRepositoryImpl};
use std::sync::Arc;
use test_helpers::{create_test_db, sample_row, write_certificate_csv};

fn create_importer(db_path: &str) -> (CertificateImporter, Arc<CertificateRepositoryImpl>) {
    let repo =
        Arc::new(CertificateRepositoryImpl::new(db_path).expect("Failed to create repo"));
    (CertificateImporter::new(repo.clone()), repo)
}

#[tokio::test]
async fn test_csv_import_end_to_end() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (importer, repo) = create_importer(&db_path);

    let csv = write_certificate_csv(&[
        sample_row("CERT-001", "REG-001"),
        sample_row("CERT-002", "REG-002"),
        sample_row("CERT-003", "REG-003"),
    ])
    .expect("Failed to write csv");

    let outcome = importer.import_file(csv.path()).await.expect("import failed");

    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.created.len(), 3);
    assert!(outcome.errors.is_empty());
    assert!(!outcome.batch_id.is_empty());
    assert_eq!(repo.count().await.unwrap(), 3);

    // 回读记录含主键与归一化日期
    let found = repo
        .find_by_certificate_no("CERT-002")
        .await
        .unwrap()
        .expect("missing record");
    assert_eq!(found.registration_no, "REG-002");
    assert_eq!(found.issued_at.format("%Y-%m-%d").to_string(), "2024-07-15");
}

#[tokio::test]
async fn test_invalid_row_aborts_whole_file_with_row_number() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (importer, repo) = create_importer(&db_path);

    // 第 2 个数据行（展示行号 3）缺证书编号
    let mut bad = sample_row("", "REG-002");
    bad[3] = String::new();
    let csv = write_certificate_csv(&[
        sample_row("CERT-001", "REG-001"),
        bad,
        sample_row("CERT-003", "REG-003"),
    ])
    .expect("Failed to write csv");

    let err = importer.import_file(csv.path()).await.unwrap_err();
    match &err {
        ImportError::InvalidRecords { errors } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0], "Row 3: Missing required fields: certificateNo");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().starts_with("Invalid records:\n"));

    // 有效行也不得落库
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_identifiers_abort_with_zero_written() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (importer, repo) = create_importer(&db_path);

    // 预置一条已有证书
    importer
        .create_single(CertificateInput {
            student_name: "Seed".to_string(),
            course_name: "DCA".to_string(),
            duration: "6 Months".to_string(),
            certificate_no: "CERT-TAKEN".to_string(),
            fathers_name: "F".to_string(),
            institute: "NKB Institute".to_string(),
            registration_no: "REG-TAKEN".to_string(),
            issued_at: "2024-01-01".to_string(),
        })
        .await
        .expect("seed failed");

    let csv = write_certificate_csv(&[
        sample_row("CERT-NEW", "REG-NEW"),
        sample_row("CERT-TAKEN", "REG-OTHER"),
    ])
    .expect("Failed to write csv");

    let err = importer.import_file(csv.path()).await.unwrap_err();
    assert_eq!(err.to_string(), "Duplicate entries found: CERT-TAKEN");

    // 全有或全无：新行也不落库
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_header_only_file_is_no_valid_records() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (importer, _repo) = create_importer(&db_path);

    let csv = write_certificate_csv(&[]).expect("Failed to write csv");
    let err = importer.import_file(csv.path()).await.unwrap_err();
    assert_eq!(err.to_string(), "No valid records provided");
}

#[tokio::test]
async fn test_csv_serial_date_is_normalized() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (importer, repo) = create_importer(&db_path);

    // CSV 里日期以序列号文本出现（从电子表格导出常见）
    let mut row = sample_row("CERT-SER", "REG-SER");
    row[7] = "45488".to_string();
    let csv = write_certificate_csv(&[row]).expect("Failed to write csv");

    importer.import_file(csv.path()).await.expect("import failed");
    let found = repo
        .find_by_certificate_no("CERT-SER")
        .await
        .unwrap()
        .expect("missing record");
    assert_eq!(found.issued_at.format("%Y-%m-%d").to_string(), "2024-07-15");
}

#[tokio::test]
async fn test_unsupported_extension_rejected() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let (importer, _repo) = create_importer(&db_path);

    let file = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .expect("Failed to create temp file");
    let err = importer.import_file(file.path()).await.unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(_)));
}
