use super::StageHandler;
use crate::constants::layout;
use crate::orchestration::context::StageContext;
use crate::orchestration::errors::StageResult;
use crate::orchestration::task_logger::TaskLogger;
use crate::state_machine::Stage;
use crate::storage::find_dir_case_insensitive;
use std::path::Path;
use std::sync::Arc;

/// Verifies the structure of the extracted package and the file sizes its
/// descriptor declares
#[derive(Debug, Default)]
pub struct SipValidationHandler;

#[async_trait::async_trait]
impl StageHandler for SipValidationHandler {
    fn stage(&self) -> Stage {
        Stage::SipValidation
    }

    async fn run(&self, ctx: &mut StageContext) -> StageResult<()> {
        let package_dir = ctx.layout.package_dir();
        ctx.logger
            .add_info(format!("Validating package {}", package_dir.display()));

        let descriptor = ctx.layout.package_descriptor();
        let descriptor_found = check_file(&mut ctx.logger, "SIP METS file", &descriptor);
        check_dir(&mut ctx.logger, "Content directory", &package_dir, layout::CONTENT_DIR);
        check_dir(
            &mut ctx.logger,
            "Metadata directory",
            &package_dir,
            layout::PACKAGE_METADATA_DIR,
        );
        ctx.progress.report(40);

        if descriptor_found {
            let validator = Arc::clone(&ctx.services.validator);
            let report =
                tokio::task::spawn_blocking(move || validator.validate_file_sizes(&package_dir))
                    .await??;
            ctx.logger.append(&report.log, &report.err);
        }
        ctx.progress.report(90);
        Ok(())
    }
}

fn check_file(logger: &mut TaskLogger, description: &str, path: &Path) -> bool {
    if path.is_file() {
        logger.add_info(format!("{description} found: {}", path.display()));
        true
    } else {
        logger.add_error(format!("{description} missing: {}", path.display()));
        false
    }
}

fn check_dir(logger: &mut TaskLogger, description: &str, parent: &Path, name: &str) {
    match find_dir_case_insensitive(parent, name) {
        Ok(Some(found)) => logger.add_info(format!("{description} found: {}", found.display())),
        Ok(None) | Err(_) => logger.add_error(format!(
            "{description} missing: {}",
            parent.join(name).display()
        )),
    }
}
