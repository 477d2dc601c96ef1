//! Spawn form: four text fields edited in place on the dashboard.

use crate::spawn::{SpawnRequest, validate_agent_id};

/// Mask character for the Discord token field.
const MASK: char = '\u{2022}'; // "•"

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    AgentId,
    Role,
    Description,
    DiscordToken,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::AgentId,
        FormField::Role,
        FormField::Description,
        FormField::DiscordToken,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::AgentId => "Agent ID",
            FormField::Role => "Role",
            FormField::Description => "Description",
            FormField::DiscordToken => "Discord token",
        }
    }

    fn index(self) -> usize {
        match self {
            FormField::AgentId => 0,
            FormField::Role => 1,
            FormField::Description => 2,
            FormField::DiscordToken => 3,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnForm {
    pub agent_id: String,
    pub role: String,
    pub description: String,
    pub discord_token: String,
    /// Field receiving keystrokes.
    pub active: FormField,
    /// Last validation error, cleared on the next edit.
    pub error: Option<String>,
}

impl Default for SpawnForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SpawnForm {
    pub fn new() -> Self {
        Self {
            agent_id: String::new(),
            role: String::new(),
            description: String::new(),
            discord_token: String::new(),
            active: FormField::AgentId,
            error: None,
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::AgentId => &self.agent_id,
            FormField::Role => &self.role,
            FormField::Description => &self.description,
            FormField::DiscordToken => &self.discord_token,
        }
    }

    fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::AgentId => &mut self.agent_id,
            FormField::Role => &mut self.role,
            FormField::Description => &mut self.description,
            FormField::DiscordToken => &mut self.discord_token,
        }
    }

    /// Text to draw for a field. The token is never shown in clear.
    pub fn display_value(&self, field: FormField) -> String {
        let value = self.value(field);
        match field {
            FormField::DiscordToken => std::iter::repeat_n(MASK, value.chars().count()).collect(),
            _ => value.to_string(),
        }
    }

    pub fn push_char(&mut self, c: char) {
        let field = self.active;
        self.value_mut(field).push(c);
        self.error = None;
    }

    pub fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
        self.error = None;
    }

    pub fn next_field(&mut self) {
        self.active = self.active.next();
    }

    pub fn prev_field(&mut self) {
        self.active = self.active.prev();
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Validate and build the request. All four fields are required, and the
    /// agent id must satisfy the bridge's id rule.
    pub fn to_request(&self) -> Result<SpawnRequest, String> {
        let missing: Vec<&str> = FormField::ALL
            .iter()
            .filter(|f| self.value(**f).trim().is_empty())
            .map(|f| f.label())
            .collect();
        if !missing.is_empty() {
            return Err(format!("Missing required fields: {}", missing.join(", ")));
        }

        let agent_id = validate_agent_id(&self.agent_id)?;
        Ok(SpawnRequest::new(
            agent_id,
            &self.role,
            &self.description,
            &self.discord_token,
        ))
    }
}
