use anyhow::Result;
use scenar_application::AppContext;
use scenar_core::heuristic::HeuristicDefinition;

pub async fn list(context: &AppContext) -> Result<()> {
    let catalog = context.catalog.snapshot().await;
    let width = catalog.ids().map(str::len).max().unwrap_or(0);
    for (id, description) in catalog.all() {
        println!("/{id:<width$}  {description}");
    }
    Ok(())
}

pub async fn show(context: &AppContext, id: &str) -> Result<()> {
    let catalog = context.catalog.snapshot().await;
    let definition = catalog.lookup(&id.to_lowercase())?;
    print!("{}", describe(definition));
    Ok(())
}

fn describe(definition: &HeuristicDefinition) -> String {
    let mut out = format!(
        "{} (/{})\n\n{}\n\nReasoning prompt:\n{}\n",
        definition.display_name(),
        definition.id,
        definition.description,
        definition.prompt.trim_end()
    );
    if let Some(rules) = definition.rules.as_ref().filter(|r| !r.is_empty()) {
        out.push('\n');
        out.push_str(&rules.render());
        out.push('\n');
    }
    out
}
