use serde::Serialize;

/// How the CLI reports results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn from_flag(json: bool) -> Self {
        if json { OutputMode::Json } else { OutputMode::Human }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

/// Pretty JSON envelope `{ "command": ..., "data": ... }`
pub fn render_json<T: Serialize>(command: &str, data: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "command": command,
        "data": data,
    }))
}

pub fn emit_json<T: Serialize>(command: &str, data: &T) -> anyhow::Result<()> {
    println!("{}", render_json(command, data)?);
    Ok(())
}
