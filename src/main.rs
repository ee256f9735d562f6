use anyhow::Result;

use scaffold::app::App;
use scaffold::interact::Question;
use scaffold::logging::{self, Log};

fn main() -> Result<()> {
    // Diagnostics go to stderr; program output goes through the app log
    logging::init_tracing()?;

    let mut app = App::from_env();
    app.run(std::env::args().skip(1));

    let started = format!("{} started at {}", app.name(), app.date.datetime());
    app.log.print(started);

    let files: Vec<String> = app
        .config
        .get("files")
        .as_list()
        .unwrap_or_default()
        .iter()
        .map(|file| file.to_string())
        .collect();
    if !files.is_empty() {
        app.log.notice(format!("Files supplied: {}", files.join(", ")));
    }

    if let Some(answer) = app.ask(&Question::new("continue").suggest("yes").reference("continue")) {
        app.log.debug(format!("Answer: {}", answer));
    }
    app.log.flush();
    Ok(())
}
