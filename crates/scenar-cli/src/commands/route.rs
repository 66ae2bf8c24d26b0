use anyhow::Result;
use scenar_application::{AppContext, ScenarioRouter};

/// Routes `text` without creating a session.
pub async fn run(context: &AppContext, text: &str) -> Result<()> {
    let router = ScenarioRouter::from_config(context.oracle()?, &context.config);
    let catalog = context.catalog.snapshot().await;
    let decision = router.route(&catalog, text).await?;
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
