use super::StageHandler;
use crate::orchestration::context::StageContext;
use crate::orchestration::errors::StageResult;
use crate::state_machine::Stage;

/// Extension point for validating a created AIP; currently accepts every AIP
#[derive(Debug, Default)]
pub struct AipValidationHandler;

#[async_trait::async_trait]
impl StageHandler for AipValidationHandler {
    fn stage(&self) -> Stage {
        Stage::AipValidation
    }

    async fn run(&self, ctx: &mut StageContext) -> StageResult<()> {
        ctx.logger
            .add_info("AIP always validates, this task is not implemented yet");
        Ok(())
    }
}
