// ==========================================
// 并发创建测试
// ==========================================
// 测试目标: 查重预检通过后的并发窗口由 UNIQUE 约束兜底，
//           竞争失败方得到与预检重复一致的错误
// ==========================================

mod test_helpers;

use institute_portal::domain::certificate::CertificateInput;
use institute_portal::importer::CertificateImporter;
use institute_portal::logging;
use institute_portal::repository::{CertificateRepository, CertificateRepositoryImpl};
use std::sync::Arc;
use test_helpers::create_test_db;

fn input(student: &str) -> CertificateInput {
    CertificateInput {
        student_name: student.to_string(),
        course_name: "Web Development".to_string(),
        duration: "6 Months".to_string(),
        certificate_no: "CERT-RACE".to_string(),
        fathers_name: "Raj Kumar".to_string(),
        institute: "NKB Institute".to_string(),
        registration_no: "REG-RACE".to_string(),
        issued_at: "2024-07-15".to_string(),
    }
}

#[tokio::test]
async fn test_concurrent_same_key_creates_keep_one() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo =
        Arc::new(CertificateRepositoryImpl::new(&db_path).expect("Failed to create repo"));

    let importer_a = CertificateImporter::new(repo.clone());
    let importer_b = CertificateImporter::new(repo.clone());

    let (result_a, result_b) = tokio::join!(
        importer_a.create_single(input("Writer A")),
        importer_b.create_single(input("Writer B")),
    );

    let successes = [&result_a, &result_b]
        .iter()
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(successes, 1, "exactly one writer must win");

    let loser = if result_a.is_err() {
        result_a.unwrap_err()
    } else {
        result_b.unwrap_err()
    };
    assert_eq!(
        loser.to_string(),
        "Certificate number or registration number already exists"
    );

    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_batch_imports_disjoint_keys_all_land() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo =
        Arc::new(CertificateRepositoryImpl::new(&db_path).expect("Failed to create repo"));

    let importer = Arc::new(CertificateImporter::new(repo.clone()));
    let mut handles = Vec::new();
    for batch in 0..4 {
        let importer = importer.clone();
        handles.push(tokio::spawn(async move {
            let inputs: Vec<CertificateInput> = (0..25)
                .map(|i| CertificateInput {
                    student_name: format!("Student {}-{}", batch, i),
                    course_name: "DCA".to_string(),
                    duration: "6 Months".to_string(),
                    certificate_no: format!("CERT-{}-{}", batch, i),
                    fathers_name: "F".to_string(),
                    institute: "NKB Institute".to_string(),
                    registration_no: format!("REG-{}-{}", batch, i),
                    issued_at: "2024-07-15".to_string(),
                })
                .collect();
            let rows = inputs
                .into_iter()
                .enumerate()
                .map(|(idx, input)| {
                    let mut row = input.into_raw_row();
                    row.row_number = idx + 2;
                    row
                })
                .collect();
            importer.import_rows(rows).await
        }));
    }

    for handle in handles {
        let outcome = handle.await.expect("task panicked").expect("import failed");
        assert_eq!(outcome.created.len(), 25);
    }
    assert_eq!(repo.count().await.unwrap(), 100);
}
