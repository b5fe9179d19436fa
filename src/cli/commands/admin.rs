use crate::config::Config;
use crate::services::{IdentityError, NewIdentity};
use crate::state::SharedState;

pub async fn cmd_create_admin(config: Config, input: NewIdentity) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    match state.identity_service.create_admin(input).await {
        Ok(admin) => {
            println!("✓ Created admin '{}' ({})", admin.username(), admin.id());
            Ok(())
        }
        Err(IdentityError::Validation(report)) => {
            println!("Admin not created:");
            for err in report.errors() {
                println!("  {}: {}", err.field, err.message);
            }
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Failed to create admin: {e}")),
    }
}
