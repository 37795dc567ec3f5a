use serde_json::{json, Map, Value};
use studio_site::{
    admin::{AdminShell, AdminTab},
    config::StudioConfig,
    services::SessionContext,
};

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = match StudioConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("config -> {error}");
            return;
        }
    };
    let gate = config.gate();
    let mut shell = AdminShell::new(gate.clone());
    let mut ctx = SessionContext::new();

    if let Err(error) = gate.unlock(&mut ctx, "wrong") {
        eprintln!("unlock(wrong) -> {error}");
    }
    if let Err(error) = gate.unlock(&mut ctx, &config.admin_password) {
        eprintln!("unlock -> {error}");
        return;
    }

    match shell.select(&mut ctx, AdminTab::Blog).await {
        Ok(count) => println!("blog: {count} posts loaded"),
        Err(error) => eprintln!("select(blog) -> {error}"),
    }
    let post = fields(json!({
        "title": "Новый пост",
        "excerpt": "Коротко о главном",
        "content": "Текст статьи",
        "author": "Студия",
        "publish_date": "2024-03-01"
    }));
    match shell.submit(&mut ctx, AdminTab::Blog, None, &post).await {
        Ok(result) => println!("submit -> {result}"),
        Err(error) => eprintln!("submit -> {error}"),
    }

    match shell.open_detail(&mut ctx, AdminTab::Contacts, 1).await {
        Ok(request) => println!("contact 1 -> {request}"),
        Err(error) => eprintln!("open_detail(contacts) -> {error}"),
    }
    match shell.render(&mut ctx) {
        Ok(view) => println!("{view:#}"),
        Err(error) => eprintln!("render -> {error}"),
    }

    shell.close();
    ctx.close();
}
