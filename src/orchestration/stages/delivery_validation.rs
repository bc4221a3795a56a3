use super::StageHandler;
use crate::config::IngestConfig;
use crate::models::InformationPackage;
use crate::orchestration::context::StageContext;
use crate::orchestration::errors::StageResult;
use crate::state_machine::{collect_violations, PathExistsGuard, Stage};
use crate::storage::PackageLayout;
use std::sync::Arc;

/// Checks a delivery before anything is extracted: descriptor structure,
/// checksum and declared size of the submitted archive
#[derive(Debug, Default)]
pub struct DeliveryValidationHandler;

#[async_trait::async_trait]
impl StageHandler for DeliveryValidationHandler {
    fn stage(&self) -> Stage {
        Stage::DeliveryValidation
    }

    fn check_inputs(
        &self,
        record: &InformationPackage,
        _layout: &PackageLayout,
        config: &IngestConfig,
    ) -> Vec<String> {
        let delivery = PathExistsGuard::new("Delivery file", record.delivery_descriptor());
        let schema = PathExistsGuard::new("Schema file", config.schema_path());
        let package = PathExistsGuard::new("Package file", record.package_file());
        collect_violations(record, &[&delivery, &schema, &package])
    }

    async fn run(&self, ctx: &mut StageContext) -> StageResult<()> {
        ctx.record.packagename = ctx.record.derived_packagename();
        ctx.refresh_layout();
        ctx.progress.report(10);

        let validator = Arc::clone(&ctx.services.validator);
        let delivery_descriptor = ctx.record.delivery_descriptor();
        let schema_file = ctx.config.schema_path();
        let package_file = ctx.record.package_file().to_path_buf();
        let report = tokio::task::spawn_blocking(move || {
            validator.validate_delivery(&delivery_descriptor, &schema_file, &package_file)
        })
        .await??;
        ctx.progress.report(50);

        ctx.logger.append(&report.log, &report.err);
        ctx.logger.add_info(format!(
            "Delivery validation result (xml/file size/checksum): {}",
            report.valid()
        ));
        ctx.progress.report(90);
        Ok(())
    }
}
