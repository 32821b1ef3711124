use serde::{ Deserialize, Serialize };
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Client,
    Seller,
    Other(String),
    Unknown,
}

impl Role {
    pub fn from_sender(sender: Option<&str>) -> Self {
        match sender {
            Some("client") => Role::Client,
            Some("seller") => Role::Seller,
            Some(other) if !other.is_empty() => Role::Other(other.to_string()),
            _ => Role::Unknown,
        }
    }

    /// Name shown when the event carries no usable client name.
    pub fn display_name(&self) -> String {
        match self {
            Role::Client => "Client".to_string(),
            Role::Seller => "Seller".to_string(),
            Role::Other(raw) => capitalize(raw),
            Role::Unknown => "Unknown".to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Seller => write!(f, "seller"),
            Role::Other(raw) => write!(f, "{}", raw),
            Role::Unknown => write!(f, "unknown"),
        }
    }
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialogueMessage {
    pub sender: Role,
    pub name: String,
    pub text: String,
    pub timestamp: i64,
}
