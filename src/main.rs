// ==========================================
// 培训机构门户后台 - 命令行入口
// ==========================================
// 用途: 批量导入与验证的运维入口
// 命令:
//   institute-portal import <file>    批量导入证书文件
//   institute-portal verify <certNo>  验证证书编号
// ==========================================

use std::sync::Arc;

use institute_portal::api::auth::{AdminClaims, TokenVerifier, ADMIN_ROLE};
use institute_portal::api::CertificateApi;
use institute_portal::config::default_db_path;
use institute_portal::repository::CertificateRepositoryImpl;

/// 本地运维入口的验签器：INSTITUTE_PORTAL_ADMIN_TOKEN 环境变量即管理员 token
struct EnvTokenVerifier {
    token: String,
}

impl TokenVerifier for EnvTokenVerifier {
    fn verify(&self, token: &str) -> Option<AdminClaims> {
        if !self.token.is_empty() && token == self.token {
            Some(AdminClaims {
                subject: "cli".to_string(),
                role: ADMIN_ROLE.to_string(),
            })
        } else {
            None
        }
    }
}

#[tokio::main]
async fn main() {
    institute_portal::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", institute_portal::APP_NAME);
    tracing::info!("系统版本: {}", institute_portal::VERSION);
    tracing::info!("==================================================");

    let db_path = default_db_path();
    if let Some(parent) = db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!(error = %e, "无法创建数据目录");
            std::process::exit(1);
        }
    }
    tracing::info!("使用数据库: {}", db_path.display());

    let repo = match CertificateRepositoryImpl::new(&db_path.to_string_lossy()) {
        Ok(repo) => Arc::new(repo),
        Err(e) => {
            tracing::error!(error = %e, "数据库初始化失败");
            std::process::exit(1);
        }
    };

    let admin_token = std::env::var("INSTITUTE_PORTAL_ADMIN_TOKEN").unwrap_or_default();
    let verifier = Arc::new(EnvTokenVerifier {
        token: admin_token.clone(),
    });
    let api = CertificateApi::new(repo, verifier);
    let authorization = format!("Bearer {}", admin_token);

    let args: Vec<String> = std::env::args().collect();
    let exit_code = match args.get(1).map(String::as_str) {
        Some("import") => match args.get(2) {
            Some(file) => run_import(&api, &authorization, file).await,
            None => {
                eprintln!("用法: institute-portal import <file>");
                2
            }
        },
        Some("verify") => match args.get(2) {
            Some(cert_no) => run_verify(&api, cert_no).await,
            None => {
                eprintln!("用法: institute-portal verify <certNo>");
                2
            }
        },
        _ => {
            eprintln!("用法: institute-portal <import|verify> ...");
            eprintln!("  import <file>    批量导入证书文件 (.xlsx/.xls/.csv)");
            eprintln!("  verify <certNo>  验证证书编号");
            2
        }
    };
    std::process::exit(exit_code);
}

async fn run_import(api: &CertificateApi, authorization: &str, file: &str) -> i32 {
    match api.import_from_file(Some(authorization), file).await {
        Ok(response) => {
            tracing::info!(
                batch_id = %response.batch_id,
                created = response.certificates.len(),
                attempted = response.attempted,
                elapsed_ms = response.elapsed_ms,
                "导入完成"
            );
            println!(
                "Imported {} of {} records (batch {})",
                response.certificates.len(),
                response.attempted,
                response.batch_id
            );
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    }
}

async fn run_verify(api: &CertificateApi, cert_no: &str) -> i32 {
    match api.verify_certificate(cert_no).await {
        Ok(response) => {
            let c = &response.certificate;
            println!("VALID  {}  {}  {}", c.certificate_no, c.student_name, c.course_name);
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    }
}
