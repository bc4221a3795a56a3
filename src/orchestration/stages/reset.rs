use super::StageHandler;
use crate::orchestration::context::StageContext;
use crate::orchestration::errors::{StageError, StageResult};
use crate::state_machine::Stage;
use tokio::fs;

/// Returns a package to `NEW`: removes its working directory and clears the
/// naming fields so the next delivery validation starts from scratch
#[derive(Debug, Default)]
pub struct ResetHandler;

#[async_trait::async_trait]
impl StageHandler for ResetHandler {
    fn stage(&self) -> Stage {
        Stage::Reset
    }

    fn needs_working_directory(&self) -> bool {
        false
    }

    fn log_file_name(&self) -> Option<&'static str> {
        None
    }

    async fn run(&self, ctx: &mut StageContext) -> StageResult<()> {
        if ctx.record.has_uuid() {
            let working_dir = ctx.layout.working_dir();
            if working_dir.exists() {
                fs::remove_dir_all(&working_dir)
                    .await
                    .map_err(|e| StageError::io("removing working directory", e))?;
                ctx.logger.add_info(format!(
                    "Working directory deleted: {}",
                    working_dir.display()
                ));
            } else {
                ctx.logger.add_info(format!(
                    "Working directory not present: {}",
                    working_dir.display()
                ));
            }
        }
        ctx.progress.report(50);

        for (field, value) in [
            ("uuid", &mut ctx.record.uuid),
            ("identifier", &mut ctx.record.identifier),
            ("packagename", &mut ctx.record.packagename),
        ] {
            ctx.logger
                .add_info(format!("Setting {field} to empty string"));
            value.clear();
        }
        ctx.refresh_layout();
        Ok(())
    }
}
