use super::StageHandler;
use crate::config::IngestConfig;
use crate::models::InformationPackage;
use crate::orchestration::context::StageContext;
use crate::orchestration::errors::{StageError, StageResult};
use crate::state_machine::{collect_violations, IdentifierUnassignedGuard, Stage};
use crate::storage::PackageLayout;

#[derive(Debug, Default)]
pub struct IdentifierAssignmentHandler;

#[async_trait::async_trait]
impl StageHandler for IdentifierAssignmentHandler {
    fn stage(&self) -> Stage {
        Stage::IdentifierAssignment
    }

    fn check_preconditions(
        &self,
        record: &InformationPackage,
        _layout: &PackageLayout,
        _config: &IngestConfig,
    ) -> Vec<String> {
        collect_violations(record, &[&IdentifierUnassignedGuard])
    }

    async fn run(&self, ctx: &mut StageContext) -> StageResult<()> {
        let identifier = ctx.services.identifiers.generate();
        if identifier.is_empty() {
            return Err(StageError::failed("Identifier generator returned an empty identifier"));
        }
        ctx.logger.add_info(format!(
            "Identifier {identifier} assigned to package {}",
            ctx.record.path
        ));
        ctx.record.identifier = identifier;
        ctx.progress.report(90);
        Ok(())
    }
}
