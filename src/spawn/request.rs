use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Agent id rule enforced by the bridge: lowercase alphanumerics and
/// hyphens, 2-31 characters, not starting with a hyphen.
static AGENT_ID: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]{1,30}$"));

/// Body of `POST /spawn-agent`. Every field is trimmed on construction.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SpawnRequest {
    pub agent_id: String,
    pub role: String,
    pub description: String,
    pub discord_token: String,
}

impl SpawnRequest {
    pub fn new(
        agent_id: impl AsRef<str>,
        role: impl AsRef<str>,
        description: impl AsRef<str>,
        discord_token: impl AsRef<str>,
    ) -> Self {
        Self {
            agent_id: agent_id.as_ref().trim().to_string(),
            role: role.as_ref().trim().to_string(),
            description: description.as_ref().trim().to_string(),
            discord_token: discord_token.as_ref().trim().to_string(),
        }
    }
}

// The Discord token never reaches logs.
impl fmt::Debug for SpawnRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnRequest")
            .field("agent_id", &self.agent_id)
            .field("role", &self.role)
            .field("description", &self.description)
            .field("discord_token", &"***redacted***")
            .finish()
    }
}

/// Normalize and check an agent id the way the bridge will.
///
/// Returns the trimmed, lowercased id, or a message suitable for a CLI
/// argument error or a dashboard notice.
pub fn validate_agent_id(raw: &str) -> Result<String, String> {
    let id = raw.trim().to_lowercase();
    let re = AGENT_ID
        .as_ref()
        .map_err(|e| format!("agent id pattern: {e}"))?;
    if re.is_match(&id) {
        Ok(id)
    } else {
        Err(format!(
            "invalid agent id `{}`; use lowercase letters, numbers, hyphen (2-31 chars)",
            raw.trim()
        ))
    }
}
