// Config error types with helpful error messages
// Provides line/column info, a source excerpt and suggestions for common mistakes

use std::fmt;

/// Detailed configuration error with location and context
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Line number (1-indexed, 0 when not tied to a location)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Surrounding source lines
    pub context: String,
    /// Optional suggestion for fixing the error
    pub suggestion: Option<String>,
    pub kind: ConfigErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// YAML syntax error
    YamlSyntax,
    /// Wrong types or missing fields
    InvalidSchema,
    /// A field parsed but its value is unusable
    InvalidValue,
    /// No config file could be found
    NotFound,
    /// File could not be read
    IoError,
}

impl ConfigError {
    pub fn new(message: impl Into<String>, kind: ConfigErrorKind) -> Self {
        Self {
            message: message.into(),
            line: 0,
            column: 0,
            context: String::new(),
            suggestion: None,
            kind,
        }
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(message, ConfigErrorKind::InvalidValue)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, ConfigErrorKind::NotFound)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(message, ConfigErrorKind::IoError)
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    fn with_suggestion_opt(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }

    /// Create context from source content
    pub fn with_source_context(mut self, source: &str, context_lines: usize) -> Self {
        if self.line == 0 {
            return self;
        }

        let lines: Vec<&str> = source.lines().collect();
        let start = self.line.saturating_sub(context_lines + 1);
        let end = (self.line + context_lines).min(lines.len());

        let mut context = String::new();
        for (i, line) in lines.iter().enumerate().take(end).skip(start) {
            let line_num = i + 1;
            let prefix = if line_num == self.line { ">" } else { " " };
            context.push_str(&format!("{} {:4} | {}\n", prefix, line_num, line));

            if line_num == self.line && self.column > 0 {
                let indicator = " ".repeat(self.column + 7) + "^";
                context.push_str(&format!("       | {}\n", indicator));
            }
        }

        self.context = context;
        self
    }

    /// Create from serde_yaml error
    pub fn from_yaml_error(err: &serde_yaml::Error, source: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let msg = err.to_string();
        let kind = if msg.contains("missing field")
            || msg.contains("unknown field")
            || msg.contains("invalid type")
        {
            ConfigErrorKind::InvalidSchema
        } else {
            ConfigErrorKind::YamlSyntax
        };

        ConfigError::new(format_yaml_error_message(&msg), kind)
            .at(line, column)
            .with_source_context(source, 2)
            .with_suggestion_opt(suggest_fix(&msg))
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if self.line > 0 {
            write!(f, " (line {}:{})", self.line, self.column)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            write!(f, "{}", self.context)?;
        }

        if let Some(suggestion) = &self.suggestion {
            writeln!(f)?;
            write!(f, "help: {}", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for ConfigError {}

fn format_yaml_error_message(msg: &str) -> String {
    if let Some(field) = extract_between(msg, "missing field `", "`") {
        return format!("missing required field '{}'", field);
    }

    if let Some(field) = extract_between(msg, "unknown field `", "`") {
        return format!("unknown field '{}'", field);
    }

    // Drop serde_yaml's trailing location, it is reported separately
    match msg.find(" at line ") {
        Some(idx) => msg[..idx].to_string(),
        None => msg.to_string(),
    }
}

fn suggest_fix(msg: &str) -> Option<String> {
    let field = extract_between(msg, "missing field `", "`")?;
    let hint = match field.as_str() {
        "project" | "domain" | "version" => format!("add a top-level '{}: <value>' entry", field),
        "image_config" => {
            "add 'image_config: {default_image: {name: default, fqn: <repo>, tag: <tag>}}'"
                .to_string()
        }
        "default_image" => "image_config needs a 'default_image' with name, fqn and tag".to_string(),
        other => format!("add the '{}' field", other),
    };
    Some(hint)
}

fn extract_between(msg: &str, prefix: &str, suffix: &str) -> Option<String> {
    let start = msg.find(prefix)? + prefix.len();
    let end = msg[start..].find(suffix)? + start;
    Some(msg[start..end].to_string())
}
