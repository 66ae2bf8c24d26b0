use anyhow::{Context, Result};
use scenar_application::AppContext;

pub async fn list(context: &AppContext) -> Result<()> {
    let mut sessions = context.sessions.list_all().await?;
    if sessions.is_empty() {
        println!("No sessions in {}", context.paths.sessions_dir().display());
        return Ok(());
    }
    // RFC 3339 timestamps sort lexically.
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    for session in sessions {
        let heuristic = session
            .phase
            .decision()
            .map(|d| d.heuristic.as_str())
            .unwrap_or("-");
        println!(
            "{}  {:<22} {:<14} {:>3} messages  {}",
            session.id,
            session.phase.name(),
            heuristic,
            session.conversation.len(),
            session.updated_at
        );
    }
    Ok(())
}

pub async fn delete(context: &AppContext, id: &str) -> Result<()> {
    context
        .sessions
        .find_by_id(id)
        .await?
        .with_context(|| format!("No session '{id}'"))?;
    context.sessions.delete(id).await?;
    println!("Deleted session {id}");
    Ok(())
}
